use crate::core::{
    AfcCodec, AstStream, AudioInfo, Encoding, FrameCodec, PredictorState, BLOCK_HEADER_SIZE,
    BLOCK_MAGIC, MAX_CHANNELS, STREAM_MAGIC,
};
use crate::error::{AstResult, FormatError};

/// binary reader for the ast format
pub struct StreamReader;

impl StreamReader {
    /// new reader
    pub fn new() -> Self {
        StreamReader
    }

    /// read and decode a complete stream using the production transform
    pub fn read(&self, data: &[u8]) -> AstResult<AstStream> {
        self.read_with_codec(data, &AfcCodec)
    }

    /// read and decode a complete stream with an injected frame transform
    pub fn read_with_codec(&self, data: &[u8], codec: &impl FrameCodec) -> AstResult<AstStream> {
        let mut cursor = Cursor::new(data);
        let info = self.parse_header(&mut cursor)?;

        let total = info.sample_count as usize;
        let channel_count = info.channels as usize;

        // guard padding past the declared count keeps tail-frame copies simple
        let mut channels = vec![vec![0i16; total + 32]; channel_count];
        let mut predictors = vec![PredictorState::default(); channel_count];

        let mut offset = 0usize;
        while offset < total {
            offset += self.read_block(
                &mut cursor,
                &info,
                codec,
                &mut channels,
                &mut predictors,
                offset,
            )?;
        }

        for channel in &mut channels {
            channel.truncate(total);
        }

        Ok(AstStream {
            encoding: info.encoding,
            bits_per_sample: info.bits_per_sample,
            sample_rate: info.sample_rate,
            sample_count: info.sample_count,
            looped: info.looped,
            loop_start: info.loop_start,
            loop_end: info.loop_end,
            channels,
        })
    }

    /// parse just the stream header
    pub fn read_info(&self, data: &[u8]) -> AstResult<AudioInfo> {
        self.parse_header(&mut Cursor::new(data))
    }

    fn parse_header(&self, cursor: &mut Cursor) -> AstResult<AudioInfo> {
        if cursor.read_u32()? != STREAM_MAGIC {
            return Err(FormatError::BadMagic { offset: 0 });
        }

        let total_size = cursor.read_u32()?;

        let encoding_tag = cursor.read_u16()?;
        let encoding = Encoding::from_tag(encoding_tag)
            .ok_or(FormatError::UnsupportedEncoding(encoding_tag))?;

        let bits_per_sample = cursor.read_u16()?;

        let channels = cursor.read_u16()?;
        if channels == 0 || channels as usize > MAX_CHANNELS {
            return Err(FormatError::InvalidChannelCount(channels));
        }

        let looped = cursor.read_u16()? == 0xFFFF;
        let sample_rate = cursor.read_u32()?;
        let sample_count = cursor.read_u32()?;
        let loop_start = cursor.read_u32()?;
        let loop_end = cursor.read_u32()?;

        // block size field, reserved fields and header padding
        cursor.skip(0x20)?;

        Ok(AudioInfo {
            encoding,
            bits_per_sample,
            channels,
            sample_rate,
            sample_count,
            looped,
            loop_start,
            loop_end,
            total_size,
        })
    }

    /// consume one block, appending decoded samples to every channel
    ///
    /// Returns the number of samples the block contributes towards the
    /// declared total (the tail block usually carries fewer than its
    /// frame-aligned capacity).
    fn read_block(
        &self,
        cursor: &mut Cursor,
        info: &AudioInfo,
        codec: &impl FrameCodec,
        channels: &mut [Vec<i16>],
        predictors: &mut [PredictorState],
        offset: usize,
    ) -> AstResult<usize> {
        let block_start = cursor.pos;
        if cursor.read_u32()? != BLOCK_MAGIC {
            return Err(FormatError::UnexpectedBlock {
                offset: block_start,
            });
        }

        let block_size = cursor.read_u32()? as usize;
        cursor.skip(BLOCK_HEADER_SIZE - 8)?;

        let (frames_in_block, samples_in_block, bytes_of_audio) = match info.encoding {
            Encoding::Adpcm => {
                let frames = block_size / 9;
                (frames, frames * 16, frames * 9)
            }
            Encoding::Pcm16 => {
                let samples = block_size / 2;
                (samples, samples, samples * 2)
            }
        };
        if samples_in_block == 0 {
            // an empty block cannot make progress towards the sample count
            return Err(FormatError::TruncatedInput);
        }

        let padding_to_skip = block_size - bytes_of_audio;
        let total = info.sample_count as usize;

        for (channel, state) in channels.iter_mut().zip(predictors.iter_mut()) {
            match info.encoding {
                Encoding::Pcm16 => {
                    for i in 0..samples_in_block {
                        let sample = cursor.read_i16()?;
                        if offset + i < total {
                            channel[offset + i] = sample;
                        }
                    }
                }
                Encoding::Adpcm => {
                    for f in 0..frames_in_block {
                        let raw = cursor.read_bytes(9)?;
                        let mut frame = [0u8; 9];
                        frame.copy_from_slice(raw);

                        let pcm = codec.decode_frame(&frame, state);

                        let write_pos = offset + f * 16;
                        if write_pos < total {
                            let copy_len = 16.min(total - write_pos);
                            channel[write_pos..write_pos + copy_len]
                                .copy_from_slice(&pcm[..copy_len]);
                        }
                    }
                }
            }

            cursor.skip(padding_to_skip)?;
        }

        Ok(samples_in_block.min(total - offset))
    }
}

impl Default for StreamReader {
    fn default() -> Self {
        Self::new()
    }
}

// cursor helper

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    fn read_bytes(&mut self, count: usize) -> AstResult<&'a [u8]> {
        if self.pos + count > self.data.len() {
            return Err(FormatError::TruncatedInput);
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    fn skip(&mut self, count: usize) -> AstResult<()> {
        if self.pos + count > self.data.len() {
            return Err(FormatError::TruncatedInput);
        }
        self.pos += count;
        Ok(())
    }

    fn read_u16(&mut self) -> AstResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_i16(&mut self) -> AstResult<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> AstResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
