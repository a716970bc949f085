use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::container::{inspect_header, HeaderInfo};
use super::features::{AudioFormat, SampleBuffer};
use crate::error::Error;

/// One decoded upload: header fields plus the first channel as normalized
/// float PCM. `samples` is `None` for a well-formed file whose data chunk is
/// empty.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    pub format: AudioFormat,
    pub header: HeaderInfo,
    pub samples: Option<SampleBuffer>,
}

impl DecodedAudio {
    pub fn sample_count(&self) -> usize {
        self.samples.as_ref().map_or(0, SampleBuffer::len)
    }
}

pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let audio = decode_bytes(bytes)
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    log::info!(
        "Decoded audio: {} samples, {}Hz, {}-bit, {} ch, {:.2}s",
        audio.sample_count(),
        audio.format.sample_rate,
        audio.format.bit_depth,
        audio.format.channels,
        audio.sample_count() as f64 / audio.format.sample_rate as f64
    );
    Ok(audio)
}

pub fn decode_bytes(bytes: Vec<u8>) -> crate::error::Result<DecodedAudio> {
    let header = inspect_header(&bytes)?;
    if header.data_size == 0 {
        log::debug!("Empty data chunk, skipping decode");
        return Ok(DecodedAudio {
            format: header.format,
            header,
            samples: None,
        });
    }

    let fail = |what: &str, e: symphonia::core::errors::Error| {
        Error::DecodeFailure(format!("{}: {}", what, e))
    };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| fail("Failed to probe audio format", e))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| Error::DecodeFailure("No audio tracks found".into()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let channels = params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| Error::DecodeFailure("Unknown channel layout".into()))?;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| Error::DecodeFailure("Unknown sample rate".into()))?;
    let bit_depth = params
        .bits_per_sample
        .or(params.bits_per_coded_sample)
        .ok_or_else(|| Error::DecodeFailure("Unknown bit depth".into()))?;

    let format = AudioFormat {
        channels: channels as u16,
        sample_rate,
        bit_depth: bit_depth as u16,
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| fail("Failed to create audio decoder", e))?;

    let mut first_channel: Vec<f64> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(fail("Failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                log::warn!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(fail("Failed to decode packet", e)),
        };

        let spec = *decoded.spec();
        let mut buf = DecodeBuffer::<f64>::new(decoded.frames() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        // Only channel 0 is analyzed; other layouts are rejected downstream.
        first_channel.extend(buf.samples().chunks(channels).map(|frame| frame[0]));
    }

    let samples = if first_channel.is_empty() {
        None
    } else {
        Some(
            SampleBuffer::normalized(first_channel)
                .map_err(|e| Error::DecodeFailure(format!("decoded stream unusable: {}", e)))?,
        )
    };

    Ok(DecodedAudio {
        format,
        header,
        samples,
    })
}
