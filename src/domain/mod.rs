//! Domain Layer - 领域层
//!
//! Waveform Context: 波形包络的计算与载荷编码

pub mod waveform;
