use crate::core::{
    afc, AfcCodec, AstStream, Encoding, FrameCodec, PredictorState, BLOCK_ALIGN,
    BLOCK_HEADER_SIZE, BLOCK_MAGIC, BLOCK_SIZE, MAX_CHANNELS, STREAM_HEADER_SIZE, STREAM_MAGIC,
};
use crate::error::{AstResult, FormatError};
use log::{debug, warn};

/// binary writer for the ast format
///
/// Builds the whole stream in memory; the header's total-size field is
/// backpatched once every block has been emitted, since the compressed
/// size is not known up front for the adaptive encoding.
pub struct StreamWriter<C: FrameCodec = AfcCodec> {
    codec: C,
    buffer: Vec<u8>,
    predictors: Vec<PredictorState>,
    sample_offset: usize,
    written_blocks: usize,
    total_blocks: usize,
    total_error: u64,
}

impl StreamWriter<AfcCodec> {
    /// new writer using the production transform
    pub fn new() -> Self {
        Self::with_codec(AfcCodec)
    }
}

impl Default for StreamWriter<AfcCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: FrameCodec> StreamWriter<C> {
    /// new writer with an injected frame transform
    pub fn with_codec(codec: C) -> Self {
        StreamWriter {
            codec,
            buffer: Vec::new(),
            predictors: Vec::new(),
            sample_offset: 0,
            written_blocks: 0,
            total_blocks: 0,
            total_error: 0,
        }
    }

    /// summed squared quantization error of the last write
    pub fn total_error(&self) -> u64 {
        self.total_error
    }

    /// blocks emitted by the last write
    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    /// encode a complete stream to ast bytes
    pub fn write(&mut self, stream: &AstStream) -> AstResult<Vec<u8>> {
        let channel_count = stream.channel_count();
        if channel_count == 0 || channel_count > MAX_CHANNELS {
            return Err(FormatError::InvalidChannelCount(channel_count as u16));
        }

        let samples_per_frame = stream.encoding.samples_per_frame();
        let bytes_per_frame = stream.encoding.bytes_per_frame();

        // the adaptive encoding needs the loop point on a frame boundary;
        // recover by rounding up rather than rejecting
        let mut loop_start = stream.loop_start;
        if stream.encoding == Encoding::Adpcm && loop_start % 16 != 0 {
            let corrected = loop_start + (16 - loop_start % 16);
            warn!(
                "loop start {} is not divisible by 16, corrected to {}",
                loop_start, corrected
            );
            loop_start = corrected;
        }

        // nothing after the loop end is audible, drop it
        let mut sample_count = stream.sample_count;
        if stream.looped && sample_count > stream.loop_end {
            sample_count = stream.loop_end;
        }

        self.buffer.clear();
        self.predictors = vec![PredictorState::default(); channel_count];
        self.sample_offset = 0;
        self.written_blocks = 0;
        self.total_error = 0;

        self.write_header(stream, sample_count, loop_start);

        if stream.looped {
            debug!(
                "loop point sits at {:#x}",
                loop_point_offset(
                    loop_start as usize,
                    channel_count,
                    channel_count,
                    stream.encoding
                )
            );
        }

        let total_frames = (sample_count as usize).div_ceil(samples_per_frame);
        self.total_blocks = (total_frames * bytes_per_frame).div_ceil(BLOCK_SIZE);

        for i in 0..self.total_blocks {
            self.write_block(
                stream,
                sample_count as usize,
                loop_start as usize,
                i + 1 == self.total_blocks,
            );
        }

        // backpatch the byte count following the header
        let total_size = (self.buffer.len() - STREAM_HEADER_SIZE) as u32;
        self.buffer[4..8].copy_from_slice(&total_size.to_be_bytes());

        Ok(std::mem::take(&mut self.buffer))
    }

    fn write_header(&mut self, stream: &AstStream, sample_count: u32, loop_start: u32) {
        self.buffer.extend_from_slice(&STREAM_MAGIC.to_be_bytes());
        self.buffer.extend_from_slice(&0u32.to_be_bytes()); // total size placeholder
        self.buffer
            .extend_from_slice(&(stream.encoding as u16).to_be_bytes());
        self.buffer
            .extend_from_slice(&stream.bits_per_sample.to_be_bytes());
        self.buffer
            .extend_from_slice(&(stream.channel_count() as u16).to_be_bytes());
        let loop_flag: u16 = if stream.looped { 0xFFFF } else { 0x0000 };
        self.buffer.extend_from_slice(&loop_flag.to_be_bytes());
        self.buffer
            .extend_from_slice(&stream.sample_rate.to_be_bytes());
        self.buffer.extend_from_slice(&sample_count.to_be_bytes());
        self.buffer.extend_from_slice(&loop_start.to_be_bytes());
        let loop_end = if stream.looped {
            stream.loop_end
        } else {
            sample_count
        };
        self.buffer.extend_from_slice(&loop_end.to_be_bytes());
        self.buffer
            .extend_from_slice(&(BLOCK_SIZE as u32).to_be_bytes());
        self.buffer.extend_from_slice(&0u32.to_be_bytes());
        self.buffer.extend_from_slice(&0x7F00_0000u32.to_be_bytes());
        self.buffer.extend_from_slice(&[0u8; 0x14]);

        debug_assert_eq!(self.buffer.len(), STREAM_HEADER_SIZE);
    }

    /// emit one block: header, zeroed leadout, per-channel payload and
    /// padding, then the leadout overwrite
    fn write_block(
        &mut self,
        stream: &AstStream,
        sample_count: usize,
        loop_start: usize,
        last_block: bool,
    ) {
        let samples_per_frame = stream.encoding.samples_per_frame();
        let bytes_per_frame = stream.encoding.bytes_per_frame();

        let frames_left = (sample_count - self.sample_offset).div_ceil(samples_per_frame);
        let payload_len = (frames_left * bytes_per_frame).min(BLOCK_SIZE);
        let samples_this_block = payload_len / bytes_per_frame * samples_per_frame;
        let padding = (BLOCK_ALIGN - payload_len % BLOCK_ALIGN) % BLOCK_ALIGN;

        self.buffer.extend_from_slice(&BLOCK_MAGIC.to_be_bytes());
        self.buffer
            .extend_from_slice(&((payload_len + padding) as u32).to_be_bytes());

        debug!(
            "block {}/{}: offset={:#x} samples={} size={:#x}+{:#x}",
            self.written_blocks + 1,
            self.total_blocks,
            self.buffer.len(),
            samples_this_block,
            payload_len,
            padding
        );

        // leadout: one carry pair per channel slot, zeroed until the block
        // body is known
        let leadout_pos = self.buffer.len();
        self.buffer.extend_from_slice(&[0u8; 4 * MAX_CHANNELS]);
        debug_assert_eq!(self.buffer.len() - leadout_pos + 8, BLOCK_HEADER_SIZE);

        for (channel, state) in stream.channels.iter().zip(self.predictors.iter_mut()) {
            let slice = slice_samples(channel, self.sample_offset, samples_this_block);

            match stream.encoding {
                Encoding::Pcm16 => {
                    self.buffer.extend_from_slice(&afc::pcm16_to_be_bytes(&slice));
                }
                Encoding::Adpcm => {
                    let frame_count = samples_this_block / 16;
                    for f in 0..frame_count {
                        let mut pcm = [0i16; 16];
                        pcm.copy_from_slice(&slice[f * 16..(f + 1) * 16]);

                        // at the loop seam the coefficients must be zero so
                        // the decoder's history is deterministic there
                        let force_coef = (stream.looped
                            && self.sample_offset + f * 16 == loop_start)
                            .then_some(0);

                        let (frame, error) = self.codec.encode_frame(&pcm, state, force_coef);
                        self.total_error += error;
                        self.buffer.extend_from_slice(&frame);
                    }
                }
            }

            if padding > 0 {
                self.buffer.resize(self.buffer.len() + padding, 0);
            }
        }

        // now that the block has been rendered, push the carry pairs into
        // the leadout; a looping stream's final block restarts from
        // silence-equivalent history
        for slot in 0..MAX_CHANNELS {
            let state = if last_block && stream.looped {
                PredictorState::default()
            } else {
                self.predictors.get(slot).copied().unwrap_or_default()
            };
            let at = leadout_pos + slot * 4;
            self.buffer[at..at + 2].copy_from_slice(&(state.last as i16).to_be_bytes());
            self.buffer[at + 2..at + 4].copy_from_slice(&(state.penult as i16).to_be_bytes());
        }

        self.written_blocks += 1;
        self.sample_offset += samples_this_block;
    }
}

/// slice `count` samples starting at `start`, zero-filling past the end of
/// the source buffer (only happens on the final partial block)
fn slice_samples(samples: &[i16], start: usize, count: usize) -> Vec<i16> {
    let mut out = vec![0i16; count];
    if start < samples.len() {
        let available = (samples.len() - start).min(count);
        out[..available].copy_from_slice(&samples[start..start + available]);
    }
    out
}

/// absolute byte offset of a sample within the encoded stream
///
/// Pure arithmetic over the fixed header and block sizes; used to report
/// where the loop point physically lands, never to drive decode or encode.
/// `channel` is 1-based.
pub fn loop_point_offset(
    sample: usize,
    channel: usize,
    channel_count: usize,
    encoding: Encoding,
) -> usize {
    let bytes_per_frame = encoding.bytes_per_frame();
    let samples_per_frame = encoding.samples_per_frame();
    let samples_per_block = BLOCK_SIZE / bytes_per_frame * samples_per_frame;
    let block_number = sample / samples_per_block;

    // every skipped block header and payload
    let mut offset = STREAM_HEADER_SIZE
        + BLOCK_HEADER_SIZE * (block_number + 1)
        + block_number * BLOCK_SIZE * channel_count
        + channel.saturating_sub(1) * BLOCK_SIZE;

    // the frame this sample sits in
    let into_block = sample as isize - 1 - (block_number * samples_per_block) as isize;
    offset = (offset as isize + into_block / samples_per_frame as isize * bytes_per_frame as isize)
        as usize;
    offset
}
