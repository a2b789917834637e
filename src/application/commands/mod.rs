//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod waveform_commands;

pub mod handlers;

pub use waveform_commands::*;
