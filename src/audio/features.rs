use serde::Serialize;

use crate::error::{Error, Result};

/// Header fields the guard and the report care about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
}

/// How sample values relate to full scale (the 0 dB reference).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleDomain {
    /// Floating-point samples in [-1, 1].
    Normalized,
    /// Raw signed integers, full scale 2^(bit_depth - 1).
    #[allow(dead_code)]
    Integer { bit_depth: u16 },
}

impl SampleDomain {
    pub fn full_scale(self) -> f64 {
        match self {
            SampleDomain::Normalized => 1.0,
            SampleDomain::Integer { bit_depth } => 2f64.powi(i32::from(bit_depth) - 1),
        }
    }
}

/// Non-empty, all-finite mono PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f64>,
    domain: SampleDomain,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f64>, domain: SampleDomain) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::invalid("sample buffer is empty"));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(Error::invalid(format!("non-finite sample at index {}", pos)));
        }
        if let SampleDomain::Integer { bit_depth } = domain {
            if bit_depth == 0 || bit_depth > 32 {
                return Err(Error::invalid(format!("unsupported bit depth {}", bit_depth)));
            }
        }
        Ok(Self { samples, domain })
    }

    pub fn normalized(samples: Vec<f64>) -> Result<Self> {
        Self::new(samples, SampleDomain::Normalized)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn domain(&self) -> SampleDomain {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Same domain, new values. Used by gain stages, which keep length and
    /// finiteness as long as the scale factor is finite.
    pub(crate) fn with_samples(&self, samples: Vec<f64>) -> Result<Self> {
        Self::new(samples, self.domain)
    }

    /// Samples mapped to [-1, 1] regardless of the source domain.
    pub fn to_unit(&self) -> Vec<f64> {
        let fs = self.domain.full_scale();
        self.samples.iter().map(|&s| s / fs).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LevelMetrics {
    pub rms_db: f64,
    pub peak_db: f64,
}

/// Magnitude spectrum of one N-point transform: N/2 bins, bin i at
/// i * sample_rate / N Hz.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub magnitudes: Vec<f64>,
    pub sample_rate: u32,
    pub fft_size: usize,
}

impl Spectrum {
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate as f64 / self.fft_size as f64
    }

    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.magnitudes.len()).map(|i| self.bin_frequency(i)).collect()
    }

    /// Index of the strongest bin. Ties go to the lowest index.
    pub fn peak_bin(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &m) in self.magnitudes.iter().enumerate() {
            match best {
                Some((_, b)) if m <= b => {}
                _ => best = Some((i, m)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// 20*log10 of every bin. Empty bins map to negative infinity.
    pub fn to_db(&self) -> Vec<f64> {
        self.magnitudes.iter().map(|&m| 20.0 * m.log10()).collect()
    }
}
