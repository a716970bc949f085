//! One synchronous pass over one input file: load, guard, gain, analysis,
//! optional clean save. Produces the report the front end prints.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::audio::decode::decode_file;
use crate::audio::encode::{clean_output_path, write_clean};
use crate::dsp::fft::SpectralAnalyzer;
use crate::dsp::level;
use crate::error::Error;
use crate::report::FileReport;
use crate::session::{Completion, GainSettings, Session};

pub struct Settings {
    pub gain: GainSettings,
    pub preview_samples: usize,
    pub save: bool,
    pub suffix: String,
    pub output_dir: Option<PathBuf>,
}

/// Rejected files still get a report but never reach gain, analysis or save.
/// A gain failure (e.g. silence) is logged and the pass continues on the
/// original buffer.
pub fn process_file(
    session: &mut Session,
    input: &Path,
    fft: &SpectralAnalyzer,
    settings: &Settings,
) -> Result<FileReport> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let token = session.begin_load(name);
    let decoded = decode_file(input).map_err(|e| Error::DecodeFailure(format!("{:#}", e)));
    match session.complete_load(token, decoded)? {
        Completion::Applied(verdict) => log::debug!("Verdict: {:?}", verdict),
        Completion::Stale => anyhow::bail!("load superseded"),
    }
    log::debug!("Session state: {:?}", session.state());
    let file = session.current().context("session lost the loaded file")?;
    let mut report = FileReport::new(&file);

    if !file.verdict.is_accepted() {
        if settings.save {
            log::warn!("{}: not saving, format outside 24-bit / 48 kHz / mono", file.name);
        }
        return Ok(report);
    }

    report.original_levels = Some(level::measure(file.original()?));

    match session.set_gain(settings.gain) {
        Ok(_) => report.gain = session.gain(),
        Err(e) => log::warn!("{}: gain not applied: {}", file.name, e),
    }

    let analysis = session.analyze(fft, settings.preview_samples)?;
    report = report.with_analysis(&analysis, file.audio.format.sample_rate);

    if settings.save {
        let buffer = session.adjusted()?;
        let path = clean_output_path(input, &settings.suffix, settings.output_dir.as_deref());
        write_clean(&path, &buffer)?;
        report.saved_to = Some(path.display().to_string());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::container::{inspect_header, tests::wav_bytes, HeaderLength, Verdict};
    use crate::audio::features::SampleBuffer;
    use crate::dsp::gain::DEFAULT_TARGET_RMS_DB;
    use crate::session::SessionState;

    /// Fresh scratch directory per test, under the system temp dir.
    fn scratch(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wavcheck-pipeline-{}-{}", std::process::id(), tag));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn settings(save: bool, out: &Path) -> Settings {
        Settings {
            gain: GainSettings::default(),
            preview_samples: 100,
            save,
            suffix: "_clean".into(),
            output_dir: Some(out.to_path_buf()),
        }
    }

    fn accepted_take(path: &Path, amplitude: f64) {
        let samples = (0..4800)
            .map(|n| amplitude * (2.0 * std::f64::consts::PI * 440.0 * n as f64 / 48000.0).sin())
            .collect();
        write_clean(path, &SampleBuffer::normalized(samples).unwrap()).unwrap();
    }

    fn cd_take(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..441i16 {
            writer.write_sample(i * 50).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn fft() -> SpectralAnalyzer {
        SpectralAnalyzer::new(1024).unwrap()
    }

    #[test]
    fn accepted_file_is_normalized_analyzed_and_saved() {
        let dir = scratch("accepted");
        let input = dir.join("vocal take.wav");
        accepted_take(&input, 0.5);

        let mut session = Session::new();
        let report = process_file(&mut session, &input, &fft(), &settings(true, &dir)).unwrap();

        assert_eq!(report.verdict, Verdict::Accepted);
        assert_eq!(report.sample_count, 4800);
        assert_eq!(report.header_length, HeaderLength::Short);
        assert!(report.original_levels.is_some());
        assert_eq!(report.gain, Some(GainSettings::default()));
        let rms = report.levels.unwrap().rms_db;
        assert!((rms - DEFAULT_TARGET_RMS_DB).abs() < 1e-3, "rms {}", rms);
        assert_eq!(report.preview.as_ref().unwrap().len(), 100);

        let saved = dir.join("vocal_take_clean.wav");
        assert_eq!(report.saved_to.as_deref(), Some(saved.display().to_string().as_str()));
        let info = inspect_header(&std::fs::read(&saved).unwrap()).unwrap();
        assert_eq!(info.header_length, HeaderLength::Short);
        assert!(!info.has_metadata);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejected_file_is_reported_but_never_saved() {
        let dir = scratch("rejected");
        let input = dir.join("cd.wav");
        cd_take(&input);

        let mut session = Session::new();
        let report = process_file(&mut session, &input, &fft(), &settings(true, &dir)).unwrap();

        match &report.verdict {
            Verdict::Rejected(reason) => {
                assert!(reason.contains("sample rate"));
                assert!(reason.contains("bit depth"));
            }
            Verdict::Accepted => panic!("44.1 kHz file accepted"),
        }
        assert_eq!(report.sample_count, 441);
        assert!(report.levels.is_none());
        assert!(report.original_levels.is_none());
        assert!(report.gain.is_none());
        assert!(report.saved_to.is_none());
        assert!(!dir.join("cd_clean.wav").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn silent_file_skips_gain_and_continues() {
        let dir = scratch("silent");
        let input = dir.join("silence.wav");
        accepted_take(&input, 0.0);

        let mut session = Session::new();
        let report = process_file(&mut session, &input, &fft(), &settings(true, &dir)).unwrap();

        assert_eq!(report.verdict, Verdict::Accepted);
        assert!(report.gain.is_none());
        assert_eq!(report.levels.unwrap().rms_db, f64::NEG_INFINITY);
        assert!(report.spectrum.is_some());
        assert!(dir.join("silence_clean.wav").exists());
        assert!(report.saved_to.is_some());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn decode_failure_only_fails_that_file() {
        let dir = scratch("garbage");
        let garbage = dir.join("garbage.wav");
        std::fs::write(&garbage, b"this is not a wav file").unwrap();
        let good = dir.join("good.wav");
        accepted_take(&good, 0.25);

        let mut session = Session::new();
        let s = settings(false, &dir);
        assert!(process_file(&mut session, &garbage, &fft(), &s).is_err());
        assert_eq!(session.state(), SessionState::Unloaded);

        let report = process_file(&mut session, &good, &fft(), &s).unwrap();
        assert_eq!(report.name, "good.wav");
        assert_eq!(session.state(), SessionState::Accepted);
        assert!(report.saved_to.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_data_chunk_still_reports_header() {
        let dir = scratch("empty");
        let input = dir.join("empty.wav");
        std::fs::write(&input, wav_bytes(16, 0, None)).unwrap();

        let mut session = Session::new();
        let report = process_file(&mut session, &input, &fft(), &settings(true, &dir)).unwrap();

        assert_eq!(report.sample_count, 0);
        assert_eq!(report.sample_rate, 48_000);
        assert_eq!(report.header_length, HeaderLength::Short);
        assert!(matches!(&report.verdict, Verdict::Rejected(r) if r.contains("no samples")));
        assert!(report.saved_to.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }
}
