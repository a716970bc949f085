use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::analysis::{DEFAULT_FFT_SIZE, DEFAULT_PREVIEW_SAMPLES};
use crate::dsp::gain::DEFAULT_TARGET_RMS_DB;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub gain: GainConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_preview_samples")]
    pub preview_samples: usize,
}

#[derive(Debug, Deserialize)]
pub struct GainConfig {
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    #[serde(default = "default_target_rms_db")]
    pub target_rms_db: f64,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            preview_samples: default_preview_samples(),
        }
    }
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            normalize: default_normalize(),
            target_rms_db: default_target_rms_db(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            dir: None,
        }
    }
}

fn default_fft_size() -> usize { DEFAULT_FFT_SIZE }
fn default_preview_samples() -> usize { DEFAULT_PREVIEW_SAMPLES }
fn default_normalize() -> bool { true }
fn default_target_rms_db() -> f64 { DEFAULT_TARGET_RMS_DB }
fn default_suffix() -> String { "_clean".into() }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("Invalid config {}: {}", path.display(), e);
            None
        }
    }
}

/// `wavcheck.toml` in the working directory, then the per-user config dir.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("wavcheck.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("wavcheck").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("wavcheck").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
