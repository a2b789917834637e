//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod waveform_handlers;

pub use waveform_handlers::*;
