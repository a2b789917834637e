//! Waveform Context - 波形限界上下文
//!
//! 职责:
//! - 缩放级别与三档命名
//! - PCM → (min, max) 包络归约
//! - 包络负载的序列化与压缩

mod envelope;
mod errors;
mod payload;
mod zoom;

pub use envelope::{reduce, Envelope, Peak};
pub use errors::{PayloadCodecError, WaveformError};
pub use payload::{compress, decode_payload, decompress, encode_payload};
pub use zoom::{ZoomLevel, ZoomTier};
