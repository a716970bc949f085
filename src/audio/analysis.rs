use super::features::{LevelMetrics, SampleBuffer, Spectrum};
use crate::dsp::fft::SpectralAnalyzer;
use crate::dsp::level;
use crate::error::Result;

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_PREVIEW_SAMPLES: usize = 1000;

/// Everything the front end draws for one buffer. Recomputed on every load
/// and every gain change.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub levels: LevelMetrics,
    pub spectrum: Spectrum,
    /// Leading samples of the buffer, unit scaled.
    pub preview: Vec<f64>,
}

/// The analysis window: the first N samples, zero-padded when the buffer is
/// shorter.
pub fn leading_window(buffer: &SampleBuffer, size: usize) -> Vec<f64> {
    let unit = buffer.to_unit();
    let mut window = vec![0.0; size];
    let n = unit.len().min(size);
    window[..n].copy_from_slice(&unit[..n]);
    window
}

pub fn analyze(
    buffer: &SampleBuffer,
    sample_rate: u32,
    fft: &SpectralAnalyzer,
    preview_len: usize,
) -> Result<Analysis> {
    log::info!("Levels...");
    let levels = level::measure(buffer);

    log::info!("Spectrum ({} points)...", fft.size());
    let window = leading_window(buffer, fft.size());
    if buffer.len() < fft.size() {
        log::debug!("Zero-padded {} samples into a {}-point window", buffer.len(), fft.size());
    }
    let spectrum = fft.transform(&window, sample_rate)?;

    let preview_len = preview_len.min(buffer.len());
    let preview = buffer.to_unit()[..preview_len].to_vec();

    log::info!(
        "Levels: rms={:.2} dB, peak={:.2} dB, spectral peak={:.1} Hz",
        levels.rms_db,
        levels.peak_db,
        spectrum.peak_bin().map_or(0.0, |b| spectrum.bin_frequency(b))
    );

    Ok(Analysis {
        levels,
        spectrum,
        preview,
    })
}
