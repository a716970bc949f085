use crate::audio::features::SampleBuffer;
use crate::dsp::level::{self, db_to_amplitude};
use crate::error::{Error, Result};

/// Default RMS target applied on load.
pub const DEFAULT_TARGET_RMS_DB: f64 = -25.0;

/// Scale `buffer` so its RMS lands on `target_db`.
pub fn normalize_to_rms(buffer: &SampleBuffer, target_db: f64) -> Result<SampleBuffer> {
    if !target_db.is_finite() {
        return Err(Error::invalid(format!("target level must be finite, got {}", target_db)));
    }
    let current_db = level::rms(buffer);
    if !current_db.is_finite() {
        return Err(Error::invalid("cannot normalize a silent buffer"));
    }
    let scale = db_to_amplitude(target_db) / db_to_amplitude(current_db);
    log::debug!(
        "normalize: current={:.3} dB target={:.3} dB scale={:.6}",
        current_db,
        target_db,
        scale
    );
    scale_by(buffer, scale)
}

/// Multiply every sample by 10^(delta_db / 20).
pub fn attenuate(buffer: &SampleBuffer, delta_db: f64) -> Result<SampleBuffer> {
    if !delta_db.is_finite() {
        return Err(Error::invalid(format!("gain change must be finite, got {}", delta_db)));
    }
    scale_by(buffer, db_to_amplitude(delta_db))
}

fn scale_by(buffer: &SampleBuffer, scale: f64) -> Result<SampleBuffer> {
    if !scale.is_finite() {
        return Err(Error::invalid(format!("gain factor {} is not finite", scale)));
    }
    buffer.with_samples(buffer.samples().iter().map(|&s| s * scale).collect())
}
