//! RMS and peak levels in dB relative to full scale.
//!
//! Both metrics divide by the same full-scale reference (1.0 for normalized
//! buffers, 2^(bit_depth - 1) for integer ones) and use 20 * log10.

use crate::audio::features::{LevelMetrics, SampleBuffer};

/// Linear amplitude to dB. Zero maps to negative infinity.
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    20.0 * amplitude.log10()
}

pub fn db_to_amplitude(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// A `SampleBuffer` is never empty and never holds NaN or infinity, so both
/// measurements are total.
pub fn rms(buffer: &SampleBuffer) -> f64 {
    let fs = buffer.domain().full_scale();
    let sum_sq: f64 = buffer
        .samples()
        .iter()
        .map(|&s| {
            let x = s / fs;
            x * x
        })
        .sum();
    amplitude_to_db((sum_sq / buffer.len() as f64).sqrt())
}

pub fn peak(buffer: &SampleBuffer) -> f64 {
    let fs = buffer.domain().full_scale();
    let max = buffer
        .samples()
        .iter()
        .map(|s| (s / fs).abs())
        .fold(0.0f64, f64::max);
    amplitude_to_db(max)
}

pub fn measure(buffer: &SampleBuffer) -> LevelMetrics {
    LevelMetrics {
        rms_db: rms(buffer),
        peak_db: peak(buffer),
    }
}
