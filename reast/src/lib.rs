//! reast - converter library for the AST streaming audio container
//!
//! Wraps libast-audio with file-level conversion: encode any
//! symphonia-supported audio file to AST, decode AST back to WAV, and the
//! two maintenance passes the asset pipeline wants (ADPCM re-encode of
//! PCM16 streams, resampling with loop-point correction).

pub mod audio;

use anyhow::{bail, Context, Result};
use libast_audio::{AstStream, AudioInfo, Encoding, StreamReader, StreamWriter};
use std::fs;
use std::path::Path;

/// Options for encoding audio into an ast stream
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub encoding: Encoding,
    /// loop start sample; enables looping together with `loop_end`
    pub loop_start: Option<u32>,
    /// loop end sample, defaults to the stream length
    pub loop_end: Option<u32>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Adpcm,
            loop_start: None,
            loop_end: None,
        }
    }
}

impl EncodeOptions {
    pub fn adpcm() -> Self {
        Self::default()
    }

    pub fn pcm16() -> Self {
        Self {
            encoding: Encoding::Pcm16,
            ..Default::default()
        }
    }

    /// loop over [start, end), end defaulting to the stream length
    pub fn with_loop(mut self, start: u32, end: Option<u32>) -> Self {
        self.loop_start = Some(start);
        self.loop_end = end;
        self
    }
}

/// Encode an audio file to an ast stream
pub fn encode_file(input: &Path, output: &Path, options: &EncodeOptions) -> Result<AudioInfo> {
    let (channels, sample_rate) =
        audio::read_audio_file(input).context("Failed to read audio file")?;
    if channels.is_empty() {
        bail!("Input has no audio channels");
    }

    let mut stream = AstStream::new(options.encoding, sample_rate, channels);
    if let Some(start) = options.loop_start {
        let end = options.loop_end.unwrap_or(stream.sample_count);
        stream = stream.with_loop(start, end);
    }

    let data = encode_stream(&stream)?;
    fs::write(output, &data).context("Failed to write output file")?;

    stream_info(&data)
}

/// Decode an ast stream to a 16-bit WAV file
pub fn decode_file(input: &Path, output: &Path) -> Result<AudioInfo> {
    let data = fs::read(input).context("Failed to read input file")?;
    let stream = decode_stream(&data)?;

    audio::write_wav(output, &stream.channels, stream.sample_rate)?;
    stream_info(&data)
}

/// Re-encode a PCM16 ast stream as ADPCM (the pipeline's size optimization)
pub fn reencode_file(input: &Path, output: &Path) -> Result<AudioInfo> {
    let data = fs::read(input).context("Failed to read input file")?;
    let mut stream = decode_stream(&data)?;

    if stream.encoding != Encoding::Pcm16 {
        bail!("Input is already ADPCM encoded");
    }
    stream.encoding = Encoding::Adpcm;

    let encoded = encode_stream(&stream)?;
    fs::write(output, &encoded).context("Failed to write output file")?;
    stream_info(&encoded)
}

/// Resample an ast stream, scaling loop points by the rate ratio
pub fn resample_file(input: &Path, output: &Path, target_rate: u32) -> Result<AudioInfo> {
    let data = fs::read(input).context("Failed to read input file")?;
    let stream = decode_stream(&data)?;

    let ratio = target_rate as f64 / stream.sample_rate as f64;
    let channels = audio::resample_linear(&stream.channels, stream.sample_rate, target_rate);

    let mut resampled = AstStream::new(stream.encoding, target_rate, channels);
    resampled.bits_per_sample = stream.bits_per_sample;
    if stream.looped {
        // loop points move with the rate; the writer re-aligns them to
        // frame boundaries as needed
        let loop_start = (stream.loop_start as f64 * ratio).round() as u32;
        let loop_end = (stream.loop_end as f64 * ratio).round() as u32;
        let sample_count = resampled.sample_count;
        resampled = resampled.with_loop(loop_start, loop_end.min(sample_count));
    }

    let encoded = encode_stream(&resampled)?;
    fs::write(output, &encoded).context("Failed to write output file")?;
    stream_info(&encoded)
}

/// Header info for an ast file on disk
pub fn info_file(input: &Path) -> Result<AudioInfo> {
    let data = fs::read(input).context("Failed to read input file")?;
    stream_info(&data)
}

/// Header info for ast bytes
pub fn stream_info(data: &[u8]) -> Result<AudioInfo> {
    StreamReader::new()
        .read_info(data)
        .map_err(|e| anyhow::anyhow!("Failed to read AST header: {}", e))
}

fn decode_stream(data: &[u8]) -> Result<AstStream> {
    StreamReader::new()
        .read(data)
        .map_err(|e| anyhow::anyhow!("Failed to decode AST stream: {}", e))
}

fn encode_stream(stream: &AstStream) -> Result<Vec<u8>> {
    let mut writer = StreamWriter::new();
    let data = writer
        .write(stream)
        .map_err(|e| anyhow::anyhow!("Failed to encode AST stream: {}", e))?;
    log::debug!("total sample error {}", writer.total_error());
    Ok(data)
}
