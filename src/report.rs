use serde::Serialize;
use std::fmt::Write as _;

use crate::audio::analysis::Analysis;
use crate::audio::container::{HeaderLength, Verdict};
use crate::audio::features::LevelMetrics;
use crate::session::{GainSettings, LoadedFile};

#[derive(Debug, Serialize)]
pub struct SpectrumPoint {
    pub frequency_hz: f64,
    pub magnitude_db: f64,
}

#[derive(Debug, Serialize)]
pub struct PreviewPoint {
    pub time_s: f64,
    pub amplitude: f64,
}

/// Composite validity report for one file. Levels, spectrum and preview are
/// only present for accepted files. Infinite dB values serialize as null.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub name: String,
    pub channels: u16,
    pub bit_depth: u16,
    pub sample_rate: u32,
    pub has_metadata: bool,
    pub header_length: HeaderLength,
    /// Chunks other than fmt and data, e.g. LIST or bext.
    pub extra_chunks: Vec<String>,
    pub sample_count: usize,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_levels: Option<LevelMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<GainSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<LevelMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectrum: Option<Vec<SpectrumPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<PreviewPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

impl FileReport {
    pub fn new(file: &LoadedFile) -> Self {
        let audio = &file.audio;
        Self {
            name: file.name.clone(),
            channels: audio.format.channels,
            bit_depth: audio.format.bit_depth,
            sample_rate: audio.format.sample_rate,
            has_metadata: audio.header.has_metadata,
            header_length: audio.header.header_length,
            extra_chunks: audio.header.extra_chunks.clone(),
            sample_count: audio.sample_count(),
            verdict: file.verdict.clone(),
            original_levels: None,
            gain: None,
            levels: None,
            spectrum: None,
            preview: None,
            saved_to: None,
        }
    }

    pub fn with_analysis(mut self, analysis: &Analysis, sample_rate: u32) -> Self {
        self.levels = Some(analysis.levels);
        let db = analysis.spectrum.to_db();
        self.spectrum = Some(
            analysis
                .spectrum
                .frequencies()
                .into_iter()
                .zip(db)
                .map(|(frequency_hz, magnitude_db)| SpectrumPoint {
                    frequency_hz,
                    magnitude_db,
                })
                .collect(),
        );
        self.preview = Some(
            analysis
                .preview
                .iter()
                .enumerate()
                .map(|(i, &amplitude)| PreviewPoint {
                    time_s: i as f64 / sample_rate as f64,
                    amplitude,
                })
                .collect(),
        );
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text summary, one field per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "File: {}", self.name);
        let _ = writeln!(out, "Channels: {}", self.channels);
        let _ = writeln!(out, "Bit depth: {}", self.bit_depth);
        let _ = writeln!(out, "Sample rate: {}", self.sample_rate);
        let _ = writeln!(out, "Metadata: {}", if self.has_metadata { "YES" } else { "no" });
        let _ = match self.header_length {
            HeaderLength::Short => writeln!(out, "Header length: 16 bytes (short)"),
            HeaderLength::Long(n) => writeln!(out, "Header length: {} bytes (long)", n),
        };
        if !self.extra_chunks.is_empty() {
            let _ = writeln!(out, "Extra chunks: {}", self.extra_chunks.join(", "));
        }
        let _ = writeln!(out, "Samples: {}", self.sample_count);
        if let Some(levels) = &self.original_levels {
            let _ = writeln!(
                out,
                "Original RMS: {} / peak: {}",
                fmt_db(levels.rms_db),
                fmt_db(levels.peak_db)
            );
        }
        if let Some(levels) = &self.levels {
            let _ = writeln!(out, "RMS: {}", fmt_db(levels.rms_db));
            let _ = writeln!(out, "Peak: {}", fmt_db(levels.peak_db));
        }
        if let Some(spectrum) = &self.spectrum {
            if let Some(p) = spectrum
                .iter()
                .filter(|p| p.magnitude_db.is_finite())
                .max_by(|a, b| a.magnitude_db.total_cmp(&b.magnitude_db))
            {
                let _ = writeln!(
                    out,
                    "Spectral peak: {:.1} Hz at {}",
                    p.frequency_hz,
                    fmt_db(p.magnitude_db)
                );
            }
        }
        match &self.verdict {
            Verdict::Accepted => {
                let _ = writeln!(out, "Format: OK");
            }
            Verdict::Rejected(reason) => {
                let _ = writeln!(out, "Format: not 24-bit / 48 kHz / mono ({})", reason);
            }
        }
        if let Some(path) = &self.saved_to {
            let _ = writeln!(out, "Saved: {}", path);
        }
        out
    }
}

fn fmt_db(db: f64) -> String {
    if db.is_finite() {
        format!("{:.2} dB", db)
    } else {
        "-inf dB".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::container::HeaderInfo;
    use crate::audio::decode::DecodedAudio;
    use crate::audio::features::{AudioFormat, SampleBuffer, Spectrum};

    fn file(verdict: Verdict, header_length: HeaderLength, has_metadata: bool) -> LoadedFile {
        let format = AudioFormat {
            channels: 1,
            sample_rate: 48000,
            bit_depth: 24,
        };
        let extra_chunks = if has_metadata { vec!["LIST".to_string()] } else { Vec::new() };
        LoadedFile {
            name: "take.wav".into(),
            audio: DecodedAudio {
                format,
                header: HeaderInfo {
                    format,
                    fmt_size: 16,
                    data_size: 0,
                    has_metadata,
                    header_length,
                    extra_chunks,
                },
                samples: Some(SampleBuffer::normalized(vec![0.1; 3]).unwrap()),
            },
            verdict,
        }
    }

    fn analysis() -> Analysis {
        Analysis {
            levels: LevelMetrics {
                rms_db: -20.0,
                peak_db: f64::NEG_INFINITY,
            },
            spectrum: Spectrum {
                magnitudes: vec![0.0, 0.5],
                sample_rate: 48000,
                fft_size: 4,
            },
            preview: vec![0.1, 0.2],
        }
    }

    #[test]
    fn text_lists_every_field() {
        let report = FileReport::new(&file(Verdict::Accepted, HeaderLength::Short, false))
            .with_analysis(&analysis(), 48000);
        let text = report.to_text();
        for line in [
            "Channels: 1",
            "Bit depth: 24",
            "Sample rate: 48000",
            "Metadata: no",
            "Header length: 16 bytes (short)",
            "Samples: 3",
            "RMS: -20.00 dB",
            "Peak: -inf dB",
            "Spectral peak: 12000.0 Hz",
            "Format: OK",
        ] {
            assert!(text.contains(line), "missing {:?} in\n{}", line, text);
        }
    }

    #[test]
    fn rejected_report_has_no_levels() {
        let report = FileReport::new(&file(
            Verdict::Rejected("bit depth is 16 (expected 24)".into()),
            HeaderLength::Long(18),
            true,
        ));
        let text = report.to_text();
        assert!(text.contains("Metadata: YES"));
        assert!(text.contains("Extra chunks: LIST"));
        assert!(text.contains("Header length: 18 bytes (long)"));
        assert!(text.contains("bit depth is 16"));
        assert!(!text.contains("RMS"));
    }

    #[test]
    fn json_shape() {
        let report = FileReport::new(&file(Verdict::Accepted, HeaderLength::Short, false))
            .with_analysis(&analysis(), 48000);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["verdict"]["status"], "accepted");
        assert_eq!(value["header_length"]["kind"], "short");
        assert_eq!(value["levels"]["rms_db"], -20.0);
        assert!(value["levels"]["peak_db"].is_null());
        assert_eq!(value["spectrum"][1]["frequency_hz"], 12000.0);
        assert_eq!(value["preview"].as_array().unwrap().len(), 2);
        assert!(value.get("saved_to").is_none());
        assert_eq!(value["extra_chunks"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn empty_file_reports_zero_samples() {
        let mut loaded = file(
            Verdict::Rejected("data chunk holds no samples".into()),
            HeaderLength::Short,
            false,
        );
        loaded.audio.samples = None;
        let text = FileReport::new(&loaded).to_text();
        assert!(text.contains("Samples: 0"));
        assert!(text.contains("Header length: 16 bytes (short)"));
        assert!(text.contains("no samples"));
    }
}
