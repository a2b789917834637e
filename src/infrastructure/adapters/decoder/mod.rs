//! Audio Decoder Adapters

mod symphonia_decoder;

#[cfg(test)]
pub(crate) mod fixtures;

pub use symphonia_decoder::SymphoniaAudioDecoder;
