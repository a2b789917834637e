//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod waveform_handlers;

pub use waveform_handlers::*;
