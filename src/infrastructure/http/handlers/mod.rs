//! HTTP Handlers

mod ping;
mod waveform;

pub use ping::*;
pub use waveform::*;
