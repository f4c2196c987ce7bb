use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Read an audio file and return (planar channels, sample_rate)
///
/// Samples are converted to i16 regardless of the source bit depth.
pub fn read_audio_file(path: &Path) -> Result<(Vec<Vec<i16>>, u32)> {
    let file = std::fs::File::open(path).context("Failed to open audio file")?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create hint from file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    // Probe the format
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported audio format")?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Unknown sample rate")?;
    let channel_count = track
        .codec_params
        .channels
        .context("Unknown channel count")?
        .count();

    // Create decoder
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut channels: Vec<Vec<i16>> = vec![Vec::new(); channel_count];

    // Decode all packets
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(e).context("Error reading packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Error decoding packet"),
        };

        append_samples(&decoded, &mut channels);
    }

    Ok((channels, sample_rate))
}

fn append_samples(buffer: &AudioBufferRef, channels: &mut [Vec<i16>]) {
    match buffer {
        AudioBufferRef::S16(buf) => {
            for (ch, out) in channels.iter_mut().enumerate() {
                out.extend_from_slice(buf.chan(ch));
            }
        }
        AudioBufferRef::S32(buf) => {
            for (ch, out) in channels.iter_mut().enumerate() {
                out.extend(buf.chan(ch).iter().map(|&s| (s >> 16) as i16));
            }
        }
        AudioBufferRef::F32(buf) => {
            for (ch, out) in channels.iter_mut().enumerate() {
                out.extend(buf.chan(ch).iter().map(|&s| f32_to_i16(s)));
            }
        }
        AudioBufferRef::U8(buf) => {
            for (ch, out) in channels.iter_mut().enumerate() {
                out.extend(
                    buf.chan(ch)
                        .iter()
                        .map(|&s| (((s as i16) - 128) << 8) as i16),
                );
            }
        }
        _ => {
            // other representations are rare enough to ignore
        }
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Write planar i16 channels to a 16-bit PCM WAV file
pub fn write_wav(path: &Path, channels: &[Vec<i16>], sample_rate: u32) -> Result<()> {
    let bytes = write_wav_to_bytes(channels, sample_rate)?;
    std::fs::write(path, bytes).context("Failed to write WAV file")
}

/// Write planar i16 channels to 16-bit PCM WAV format in memory
pub fn write_wav_to_bytes(channels: &[Vec<i16>], sample_rate: u32) -> Result<Vec<u8>> {
    // WAV file format (RIFF)
    let mut buffer = Vec::new();

    let channel_count = channels.len();
    let sample_count = channels.first().map_or(0, |c| c.len());
    let bytes_per_sample = 2;
    let data_size = sample_count * channel_count * bytes_per_sample;
    let file_size = 36 + data_size;

    // RIFF header
    buffer.write_all(b"RIFF")?;
    buffer.write_all(&(file_size as u32).to_le_bytes())?;
    buffer.write_all(b"WAVE")?;

    // fmt chunk
    buffer.write_all(b"fmt ")?;
    buffer.write_all(&16u32.to_le_bytes())?; // chunk size
    buffer.write_all(&1u16.to_le_bytes())?; // format = integer PCM
    buffer.write_all(&(channel_count as u16).to_le_bytes())?;
    buffer.write_all(&sample_rate.to_le_bytes())?;
    let byte_rate = sample_rate * (channel_count * bytes_per_sample) as u32;
    buffer.write_all(&byte_rate.to_le_bytes())?;
    let block_align = (channel_count * bytes_per_sample) as u16;
    buffer.write_all(&block_align.to_le_bytes())?;
    buffer.write_all(&16u16.to_le_bytes())?; // bits per sample

    // data chunk, interleaved
    buffer.write_all(b"data")?;
    buffer.write_all(&(data_size as u32).to_le_bytes())?;
    for i in 0..sample_count {
        for channel in channels {
            buffer.write_all(&channel[i].to_le_bytes())?;
        }
    }

    Ok(buffer)
}

/// Linear-interpolation resample of planar channels to a new rate
pub fn resample_linear(channels: &[Vec<i16>], from_rate: u32, to_rate: u32) -> Vec<Vec<i16>> {
    if from_rate == to_rate {
        return channels.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let src_len = channels.first().map_or(0, |c| c.len());
    let out_len = (src_len as f64 / ratio).round() as usize;

    channels
        .iter()
        .map(|channel| {
            (0..out_len)
                .map(|i| {
                    let pos = i as f64 * ratio;
                    let base = pos as usize;
                    let frac = pos - base as f64;
                    let a = channel.get(base).copied().unwrap_or(0) as f64;
                    let b = channel.get(base + 1).copied().unwrap_or(0) as f64;
                    (a + (b - a) * frac).round() as i16
                })
                .collect()
        })
        .collect()
}
