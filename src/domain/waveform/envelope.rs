//! 波形包络生成
//!
//! 将 PCM 采样按每像素采样点数归约为 (min, max) 对

use super::{PayloadCodecError, ZoomLevel};

/// 单个像素的振幅区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

impl Peak {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// 波形包络：每个输出像素一个 (min, max)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    peaks: Vec<Peak>,
}

impl Envelope {
    pub fn from_peaks(peaks: Vec<Peak>) -> Self {
        Self { peaks }
    }

    /// 从扁平数组 `[min0, max0, min1, max1, ...]` 还原
    pub fn from_flat(values: &[f32]) -> Result<Self, PayloadCodecError> {
        if values.len() % 2 != 0 {
            return Err(PayloadCodecError::OddLength(values.len()));
        }
        let peaks = values
            .chunks_exact(2)
            .map(|pair| Peak::new(pair[0], pair[1]))
            .collect();
        Ok(Self { peaks })
    }

    /// 转换为扁平数组 `[min0, max0, min1, max1, ...]`
    pub fn to_flat(&self) -> Vec<f32> {
        self.peaks.iter().flat_map(|p| [p.min, p.max]).collect()
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

/// 生成波形包络
///
/// 多声道输入只使用第 0 声道，不做混音。
/// 输出长度为 `ceil(采样数 / 每像素采样点数)`。
/// NaN 与无穷大采样被忽略。
pub fn reduce(channel_data: &[Vec<f32>], zoom: ZoomLevel) -> Envelope {
    let Some(samples) = channel_data.first() else {
        return Envelope::default();
    };

    let samples_per_pixel = zoom.samples_per_pixel() as usize;
    let data_points = samples.len().div_ceil(samples_per_pixel);
    let mut peaks = Vec::with_capacity(data_points);

    for i in 0..data_points {
        let start = i * samples_per_pixel;
        let end = (start + samples_per_pixel).min(samples.len());

        let mut min = 1.0f32;
        let mut max = -1.0f32;
        let mut seen = false;
        for &sample in samples[start..end].iter().filter(|s| s.is_finite()) {
            seen = true;
            if sample < min {
                min = sample;
            }
            if sample > max {
                max = sample;
            }
        }

        // 空区间不暴露哨兵初始值
        if !seen {
            min = 0.0;
            max = 0.0;
        }

        peaks.push(Peak::new(min, max));
    }

    Envelope { peaks }
}
