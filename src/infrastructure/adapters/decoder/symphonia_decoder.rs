//! Symphonia Decoder - 基于 symphonia 的音频解码器
//!
//! 支持 WAV / MP3 / FLAC / OGG Vorbis，按声道拆分为 f32 PCM

use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioDecoderPort, DecodeError, DecodedAudio};

/// Symphonia 音频解码器
///
/// 解码在阻塞线程池中执行，不占用异步运行时
#[derive(Debug, Default, Clone)]
pub struct SymphoniaAudioDecoder;

impl SymphoniaAudioDecoder {
    pub fn new() -> Self {
        Self
    }

    fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
        let file = File::open(path)
            .map_err(|e| DecodeError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::UnsupportedFormat(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| DecodeError::UnsupportedFormat("No audio track found".to_string()))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channel_count = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedFormat(format!("Decoder creation failed: {}", e)))?;

        let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(e) => {
                    return Err(DecodeError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(path = %path.display(), "Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::DecodingError(format!(
                        "Fatal decode error: {}",
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }

            // 部分格式在首个包解码后才给出采样率与声道数
            if sample_rate == 0 {
                sample_rate = spec.rate;
            }
            if channel_count == 0 {
                channel_count = spec.channels.count();
                channels = vec![Vec::new(); channel_count];
            }

            let mut sample_buf = SampleBuffer::<f32>::new(frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let interleaved = &sample_buf.samples()[..frames * spec.channels.count()];

            for frame in interleaved.chunks_exact(spec.channels.count()) {
                for (channel, sample) in channels.iter_mut().zip(frame) {
                    channel.push(*sample);
                }
            }
        }

        if channels.first().map(Vec::is_empty).unwrap_or(true) {
            return Err(DecodeError::EmptyStream);
        }
        if sample_rate == 0 {
            return Err(DecodeError::DecodingError("Unknown sample rate".to_string()));
        }

        Ok(DecodedAudio {
            channels,
            sample_rate,
        })
    }
}

#[async_trait]
impl AudioDecoderPort for SymphoniaAudioDecoder {
    async fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
        let path: PathBuf = path.to_path_buf();
        let started = std::time::Instant::now();

        let audio = tokio::task::spawn_blocking({
            let path = path.clone();
            move || Self::decode_file(&path)
        })
        .await
        .map_err(|e| DecodeError::DecodingError(format!("Decode task failed: {}", e)))??;

        tracing::debug!(
            path = %path.display(),
            sample_rate = audio.sample_rate,
            channels = audio.channel_count(),
            frames = audio.frame_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Audio decoded"
        );

        Ok(audio)
    }
}
