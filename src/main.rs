mod audio;
mod cli;
mod config;
mod dsp;
mod error;
mod pipeline;
mod report;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use dsp::fft::SpectralAnalyzer;
use pipeline::{process_file, Settings};
use session::{GainSettings, Session};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::find_config);
    let mut preview_samples = audio::analysis::DEFAULT_PREVIEW_SAMPLES;
    let mut suffix = "_clean".to_string();
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Config values apply only when the CLI is at its default
            if cli.fft_size == 2048 { cli.fft_size = cfg.analysis.fft_size; }
            if cli.target_rms == -25.0 { cli.target_rms = cfg.gain.target_rms_db; }
            if !cli.no_normalize { cli.no_normalize = !cfg.gain.normalize; }
            if cli.output_dir.is_none() { cli.output_dir = cfg.output.dir; }
            preview_samples = cfg.analysis.preview_samples;
            suffix = cfg.output.suffix;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let fft = SpectralAnalyzer::new(cli.fft_size).context("Invalid --fft-size")?;
    let settings = Settings {
        gain: GainSettings {
            target_rms_db: (!cli.no_normalize).then_some(cli.target_rms),
            offset_db: cli.offset,
            attenuation_db: cli.attenuate,
        },
        preview_samples,
        save: cli.save,
        suffix,
        output_dir: cli.output_dir.clone(),
    };

    log::info!("wavcheck - {} file(s), FFT size {}", cli.inputs.len(), fft.size());

    let pb = if cli.inputs.len() > 1 && !cli.json {
        let pb = ProgressBar::new(cli.inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress template")?
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    // One file in flight at a time: each selection is a full synchronous
    // pass, and starting the next one resets the session.
    let mut session = Session::new();
    let mut failed = 0usize;
    for input in &cli.inputs {
        pb.set_message(input.display().to_string());
        match process_file(&mut session, input, &fft, &settings) {
            Ok(report) => {
                let rendered = if cli.json {
                    report.to_json().context("Failed to serialize report")?
                } else {
                    report.to_text()
                };
                pb.suspend(|| println!("{}", rendered));
            }
            Err(e) => {
                failed += 1;
                log::error!("{}: {:#}", input.display(), e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", failed, cli.inputs.len());
    }
    Ok(())
}
