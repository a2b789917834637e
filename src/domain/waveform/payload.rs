//! 波形负载编解码
//!
//! 包络先序列化为扁平 JSON 数组，再做 zlib 压缩

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use super::{Envelope, PayloadCodecError};

/// 序列化并压缩波形包络
pub fn compress(envelope: &Envelope) -> Result<Vec<u8>, PayloadCodecError> {
    let json = to_json(envelope)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| PayloadCodecError::Compress(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PayloadCodecError::Compress(e.to_string()))
}

/// 解压并反序列化波形包络
pub fn decompress(payload: &[u8]) -> Result<Envelope, PayloadCodecError> {
    let mut json = Vec::new();
    ZlibDecoder::new(payload)
        .read_to_end(&mut json)
        .map_err(|e| PayloadCodecError::Decompress(e.to_string()))?;
    from_json(&json)
}

/// 按缓存条目的压缩标记编码
pub fn encode_payload(envelope: &Envelope, compressed: bool) -> Result<Vec<u8>, PayloadCodecError> {
    if compressed {
        compress(envelope)
    } else {
        to_json(envelope)
    }
}

/// 按缓存条目的压缩标记解码，未压缩的旧条目直接解析 JSON
pub fn decode_payload(payload: &[u8], is_compressed: bool) -> Result<Envelope, PayloadCodecError> {
    if is_compressed {
        decompress(payload)
    } else {
        from_json(payload)
    }
}

fn to_json(envelope: &Envelope) -> Result<Vec<u8>, PayloadCodecError> {
    let flat = envelope.to_flat();
    // JSON 无法表示非有限值，写入后将永远无法读回
    if let Some(value) = flat.iter().find(|v| !v.is_finite()) {
        return Err(PayloadCodecError::Serialize(format!(
            "non-finite sample value: {}",
            value
        )));
    }
    serde_json::to_vec(&flat).map_err(|e| PayloadCodecError::Serialize(e.to_string()))
}

fn from_json(json: &[u8]) -> Result<Envelope, PayloadCodecError> {
    let values: Vec<f32> =
        serde_json::from_slice(json).map_err(|e| PayloadCodecError::Parse(e.to_string()))?;
    Envelope::from_flat(&values)
}
