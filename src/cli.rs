use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wavcheck", about = "Check, analyze and level 24-bit / 48 kHz mono WAV files")]
pub struct Cli {
    /// Input WAV files, processed one at a time
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Config file (defaults to ./wavcheck.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// FFT size for the spectrum (power of two)
    #[arg(long, default_value_t = 2048)]
    pub fft_size: usize,

    /// RMS target in dB relative to full scale
    #[arg(long, default_value_t = -25.0, allow_hyphen_values = true)]
    pub target_rms: f64,

    /// Keep the original level instead of normalizing
    #[arg(long)]
    pub no_normalize: bool,

    /// Volume preset in dB, added to the RMS target
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset: f64,

    /// Extra fixed gain change in dB, applied after normalization
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub attenuate: f64,

    /// Write a clean copy of every accepted file
    #[arg(short, long)]
    pub save: bool,

    /// Directory for clean copies (defaults to next to the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print reports as JSON, including spectrum and waveform preview
    #[arg(long)]
    pub json: bool,
}
