//! Accepted-profile check and RIFF header inspection.

use serde::Serialize;

use super::features::AudioFormat;
use crate::error::{Error, Result};

pub const ACCEPTED_CHANNELS: u16 = 1;
pub const ACCEPTED_SAMPLE_RATE: u32 = 48_000;
pub const ACCEPTED_BIT_DEPTH: u16 = 24;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// `Err(ContainerRejected)` for a rejected file, for stages that must not
    /// run on one.
    pub fn require_accepted(&self) -> Result<()> {
        match self {
            Verdict::Accepted => Ok(()),
            Verdict::Rejected(reason) => Err(Error::ContainerRejected(reason.clone())),
        }
    }
}

/// Classify `format` against mono / 48 kHz / 24-bit. Every failing field is
/// named in the reason.
pub fn validate(format: &AudioFormat) -> Verdict {
    verdict(format_problems(format))
}

/// `validate`, plus a well-formed file with an empty data chunk is rejected:
/// its header can be reported but there is nothing to measure.
pub fn validate_decoded(format: &AudioFormat, sample_count: usize) -> Verdict {
    if sample_count > 0 {
        return validate(format);
    }
    let mut problems = format_problems(format);
    problems.push("data chunk holds no samples".to_string());
    verdict(problems)
}

fn format_problems(format: &AudioFormat) -> Vec<String> {
    let mut problems = Vec::new();
    if format.channels != ACCEPTED_CHANNELS {
        problems.push(format!(
            "channels is {} (expected {})",
            format.channels, ACCEPTED_CHANNELS
        ));
    }
    if format.sample_rate != ACCEPTED_SAMPLE_RATE {
        problems.push(format!(
            "sample rate is {} Hz (expected {} Hz)",
            format.sample_rate, ACCEPTED_SAMPLE_RATE
        ));
    }
    if format.bit_depth != ACCEPTED_BIT_DEPTH {
        problems.push(format!(
            "bit depth is {} (expected {})",
            format.bit_depth, ACCEPTED_BIT_DEPTH
        ));
    }
    problems
}

fn verdict(problems: Vec<String>) -> Verdict {
    if problems.is_empty() {
        Verdict::Accepted
    } else {
        Verdict::Rejected(problems.join("; "))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "bytes", rename_all = "lowercase")]
pub enum HeaderLength {
    /// Plain 16-byte PCM fmt chunk.
    Short,
    Long(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Fields as declared in the fmt chunk.
    pub format: AudioFormat,
    pub fmt_size: u32,
    pub data_size: u32,
    /// RIFF size disagrees with a bare fmt + data layout, so some other
    /// chunk (LIST, bext, ...) is present.
    pub has_metadata: bool,
    pub header_length: HeaderLength,
    /// Ids of every top-level chunk other than fmt and data, in file order.
    pub extra_chunks: Vec<String>,
}

/// Walk the top-level RIFF chunks of a WAV file.
pub fn inspect_header(bytes: &[u8]) -> Result<HeaderInfo> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(Error::DecodeFailure("not a RIFF/WAVE file".into()));
    }
    let riff_size = read_u32(bytes, 4)?;

    let mut fmt = None;
    let mut data_size = None;
    let mut extra_chunks = Vec::new();

    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = read_u32(bytes, pos + 4)?;
        match id {
            b"fmt " => fmt = Some((size, read_fmt(bytes, pos + 8, size)?)),
            b"data" => data_size = Some(size),
            other => extra_chunks.push(String::from_utf8_lossy(other).into_owned()),
        }
        // Chunks are word aligned.
        let padded = size as usize + (size as usize & 1);
        pos = match pos.checked_add(8 + padded) {
            Some(next) => next,
            None => break,
        };
    }

    let (fmt_size, format) = fmt.ok_or_else(|| Error::DecodeFailure("missing fmt chunk".into()))?;
    let data_size = data_size.ok_or_else(|| Error::DecodeFailure("missing data chunk".into()))?;

    // "WAVE" + two chunk headers, with or without the data pad byte.
    let bare_size = u64::from(data_size) + u64::from(fmt_size) + 20;
    let riff_size = u64::from(riff_size);
    let has_metadata = riff_size != bare_size && riff_size != bare_size + u64::from(data_size & 1);

    let header_length = if fmt_size == 16 {
        HeaderLength::Short
    } else {
        HeaderLength::Long(fmt_size)
    };

    Ok(HeaderInfo {
        format,
        fmt_size,
        data_size,
        has_metadata,
        header_length,
        extra_chunks,
    })
}

fn read_fmt(bytes: &[u8], body: usize, size: u32) -> Result<AudioFormat> {
    if size < 16 {
        return Err(Error::DecodeFailure(format!("fmt chunk too short ({} bytes)", size)));
    }
    Ok(AudioFormat {
        channels: read_u16(bytes, body + 2)?,
        sample_rate: read_u32(bytes, body + 4)?,
        bit_depth: read_u16(bytes, body + 14)?,
    })
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| Error::DecodeFailure(format!("truncated header at byte {}", at)))
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| Error::DecodeFailure(format!("truncated header at byte {}", at)))
}
