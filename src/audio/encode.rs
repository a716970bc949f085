//! Re-encoding of an accepted buffer as a bare 24-bit / 48 kHz / mono WAV:
//! RIFF, a 16-byte PCM fmt chunk, data. No other chunks.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::container::{ACCEPTED_BIT_DEPTH, ACCEPTED_CHANNELS, ACCEPTED_SAMPLE_RATE};
use super::features::SampleBuffer;

const WAVE_FORMAT_PCM: u16 = 1;
const BYTES_PER_SAMPLE: u32 = (ACCEPTED_BIT_DEPTH / 8) as u32;

/// Quantize to signed 24-bit, clipping anything beyond full scale.
pub fn to_pcm24(buffer: &SampleBuffer) -> Vec<i32> {
    let full_scale = f64::from(1i32 << (ACCEPTED_BIT_DEPTH - 1));
    buffer
        .to_unit()
        .iter()
        .map(|&x| (x * full_scale).round().clamp(-full_scale, full_scale - 1.0) as i32)
        .collect()
}

/// The canonical 44-byte header for `data_size` bytes of clean PCM.
fn clean_header(data_size: u32) -> Vec<u8> {
    let block_align = u32::from(ACCEPTED_CHANNELS) * BYTES_PER_SAMPLE;
    let byte_rate = ACCEPTED_SAMPLE_RATE * block_align;
    let pad = data_size & 1;

    let mut buf = Vec::with_capacity(44);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size + pad).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    buf.extend_from_slice(&ACCEPTED_CHANNELS.to_le_bytes());
    buf.extend_from_slice(&ACCEPTED_SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&(block_align as u16).to_le_bytes());
    buf.extend_from_slice(&ACCEPTED_BIT_DEPTH.to_le_bytes());
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    buf
}

pub fn encode_clean<W: Write>(mut writer: W, buffer: &SampleBuffer) -> Result<()> {
    let frames = to_pcm24(buffer);
    let data_size = u32::try_from(frames.len() as u64 * u64::from(BYTES_PER_SAMPLE))
        .ok()
        .filter(|&n| n <= u32::MAX - 37)
        .context("Buffer too long for a WAV file")?;

    writer
        .write_all(&clean_header(data_size))
        .context("Failed to write WAV header")?;
    let mut data = Vec::with_capacity(data_size as usize + 1);
    for sample in frames {
        data.extend_from_slice(&sample.to_le_bytes()[..3]);
    }
    if data_size & 1 == 1 {
        data.push(0);
    }
    writer.write_all(&data).context("Failed to write samples")?;
    writer.flush().context("Failed to flush WAV stream")?;
    Ok(())
}

pub fn write_clean(path: &Path, buffer: &SampleBuffer) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    encode_clean(std::io::BufWriter::new(file), buffer)?;
    log::info!("Wrote {} samples to {}", buffer.len(), path.display());
    Ok(())
}

/// `<stem><suffix>.wav` with every non-alphanumeric character of the name
/// replaced by `_`.
pub fn clean_file_name(input: &Path, suffix: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = format!("{}{}", stem, suffix)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.wav", name)
}

pub fn clean_output_path(input: &Path, suffix: &str, dir: Option<&Path>) -> PathBuf {
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(clean_file_name(input, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::container::{inspect_header, validate, HeaderLength, Verdict};
    use crate::audio::decode::decode_bytes;
    use crate::audio::features::SampleDomain;
    use std::io::Cursor;

    fn ramp() -> SampleBuffer {
        SampleBuffer::normalized((0..480).map(|i| (i as f64 / 240.0) - 1.0).collect()).unwrap()
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(clean_file_name(Path::new("/tmp/my take (2).wav"), "_clean"), "my_take__2__clean.wav");
        assert_eq!(clean_file_name(Path::new("vox.WAV"), "_clean"), "vox_clean.wav");
    }

    #[test]
    fn output_goes_next_to_input_by_default() {
        let p = clean_output_path(Path::new("/data/in/a.wav"), "_clean", None);
        assert_eq!(p, PathBuf::from("/data/in/a_clean.wav"));
        let p = clean_output_path(Path::new("/data/in/a.wav"), "_clean", Some(Path::new("/out")));
        assert_eq!(p, PathBuf::from("/out/a_clean.wav"));
    }

    #[test]
    fn quantization_clips_at_full_scale() {
        let buf = SampleBuffer::normalized(vec![1.0, -1.0, 2.0, 0.5]).unwrap();
        assert_eq!(to_pcm24(&buf), vec![8_388_607, -8_388_608, 8_388_607, 4_194_304]);

        let ints = SampleBuffer::new(vec![1000.0], SampleDomain::Integer { bit_depth: 16 }).unwrap();
        assert_eq!(to_pcm24(&ints), vec![1000 * 256]);
    }

    #[test]
    fn clean_header_is_short_and_bare() {
        let buf = SampleBuffer::normalized(vec![0.25; 48]).unwrap();
        let mut bytes = Vec::new();
        encode_clean(&mut bytes, &buf).unwrap();

        assert_eq!(bytes.len(), 44 + 48 * 3);
        let info = inspect_header(&bytes).unwrap();
        assert_eq!(info.header_length, HeaderLength::Short);
        assert_eq!(info.fmt_size, 16);
        assert_eq!(info.data_size, 48 * 3);
        assert!(!info.has_metadata);
        assert!(info.extra_chunks.is_empty());
        assert_eq!(validate(&info.format), Verdict::Accepted);
    }

    #[test]
    fn odd_sample_count_is_padded() {
        let buf = SampleBuffer::normalized(vec![0.5; 5]).unwrap();
        let mut bytes = Vec::new();
        encode_clean(&mut bytes, &buf).unwrap();

        assert_eq!(bytes.len(), 44 + 15 + 1);
        let info = inspect_header(&bytes).unwrap();
        assert_eq!(info.data_size, 15);
        assert!(!info.has_metadata);
        assert_eq!(&bytes[44..47], &4_194_304i32.to_le_bytes()[..3]);
    }

    #[test]
    fn clean_stream_reads_back_with_hound() {
        let mut bytes = Vec::new();
        encode_clean(&mut bytes, &ramp()).unwrap();

        let reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.spec().bits_per_sample, 24);
        assert_eq!(reader.len(), 480);
    }

    #[test]
    fn clean_stream_decodes_to_same_samples() {
        let input = ramp();
        let mut bytes = Vec::new();
        encode_clean(&mut bytes, &input).unwrap();

        let decoded = decode_bytes(bytes).unwrap();
        assert_eq!(decoded.format.channels, 1);
        assert_eq!(decoded.format.sample_rate, 48_000);
        assert_eq!(decoded.format.bit_depth, 24);
        assert!(!decoded.header.has_metadata);
        assert_eq!(decoded.header.header_length, HeaderLength::Short);
        let samples = decoded.samples.unwrap();
        assert_eq!(samples.len(), input.len());
        let step = 1.0 / 8_388_608.0;
        for (a, b) in samples.samples().iter().zip(input.samples()) {
            assert!((a - b).abs() <= step, "{} vs {}", a, b);
        }
    }

    #[test]
    fn writes_to_disk() {
        let path = std::env::temp_dir().join(format!("wavcheck-encode-{}.wav", std::process::id()));
        write_clean(&path, &ramp()).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 480);
        std::fs::remove_file(&path).ok();
    }
}
