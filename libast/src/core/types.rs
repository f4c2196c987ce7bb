//! common types for the ast codec

use crate::core::afc;

// constants

/// stream header magic "STRM"
pub const STREAM_MAGIC: u32 = 0x5354_524D;

/// stream header size in bytes
pub const STREAM_HEADER_SIZE: usize = 0x40;

/// block header magic "BLCK"
pub const BLOCK_MAGIC: u32 = 0x424C_434B;

/// block header size in bytes (tag + size + reserved + leadout)
pub const BLOCK_HEADER_SIZE: usize = 0x20;

/// per-channel payload size of a full block
pub const BLOCK_SIZE: usize = 0x2760;

/// hardware channel limit of the target format
pub const MAX_CHANNELS: usize = 6;

/// emitted block payloads are padded to a multiple of this
pub const BLOCK_ALIGN: usize = 32;

// types

/// sample encoding tag
///
/// | Value | Encoding | Frame           |
/// |-------|----------|-----------------|
/// | 0     | Adpcm    | 16 samples / 9B |
/// | 1     | Pcm16    | 1 sample / 2B   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Encoding {
    /// 4-bit adaptive predictive coding
    Adpcm = 0,
    /// linear 16-bit big-endian pcm
    Pcm16 = 1,
}

impl Encoding {
    /// on-wire bytes per frame
    pub fn bytes_per_frame(self) -> usize {
        match self {
            Encoding::Adpcm => afc::BYTES_PER_FRAME,
            Encoding::Pcm16 => 2,
        }
    }

    /// linear samples per frame
    pub fn samples_per_frame(self) -> usize {
        match self {
            Encoding::Adpcm => afc::SAMPLES_PER_FRAME,
            Encoding::Pcm16 => 1,
        }
    }

    /// encoding from its header tag
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Encoding::Adpcm),
            1 => Some(Encoding::Pcm16),
            _ => None,
        }
    }
}

// data structures

/// a fully decoded stream
///
/// Channel buffers are planar, one `Vec<i16>` per channel, all of logical
/// length `sample_count`.
#[derive(Debug, Clone)]
pub struct AstStream {
    pub encoding: Encoding,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
    /// total samples per channel
    pub sample_count: u32,
    pub looped: bool,
    /// sample index where playback restarts
    pub loop_start: u32,
    /// sample index where playback jumps back
    pub loop_end: u32,
    pub channels: Vec<Vec<i16>>,
}

impl AstStream {
    /// new non-looping stream over planar channel buffers
    pub fn new(encoding: Encoding, sample_rate: u32, channels: Vec<Vec<i16>>) -> Self {
        let sample_count = channels.first().map_or(0, |c| c.len()) as u32;
        AstStream {
            encoding,
            bits_per_sample: 16,
            sample_rate,
            sample_count,
            looped: false,
            loop_start: 0,
            loop_end: sample_count,
            channels,
        }
    }

    /// mark the stream as looping over [start, end)
    pub fn with_loop(mut self, start: u32, end: u32) -> Self {
        self.looped = true;
        self.loop_start = start;
        self.loop_end = end;
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }
}

/// header-level info about an ast stream
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub encoding: Encoding,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub sample_count: u32,
    pub looped: bool,
    pub loop_start: u32,
    pub loop_end: u32,
    /// byte count following the stream header, as declared
    pub total_size: u32,
}

impl AudioInfo {
    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }
}
