//! encoder/decoder for the AST (STRM) streaming audio container
//!
//! The format is a block-structured, multi-channel stream: a fixed 0x40
//! byte header followed by `BLCK` chunks that each hold one run of frames
//! per channel plus alignment padding. Two sample encodings are carried,
//! linear big-endian PCM16 and a 4-bit adaptive predictive coding whose
//! per-channel history must survive block boundaries.

pub mod core;
pub mod error;

mod reader;
mod writer;

pub use crate::core::{
    afc, AfcCodec, AstStream, AudioInfo, Encoding, FrameCodec, PredictorState, BLOCK_ALIGN,
    BLOCK_HEADER_SIZE, BLOCK_MAGIC, BLOCK_SIZE, MAX_CHANNELS, STREAM_HEADER_SIZE, STREAM_MAGIC,
};
pub use error::{AstResult, FormatError};
pub use reader::StreamReader;
pub use writer::{loop_point_offset, StreamWriter};

// api functions

/// decode a complete ast stream
pub fn decode(data: &[u8]) -> AstResult<AstStream> {
    StreamReader::new().read(data)
}

/// encode a stream to ast bytes
pub fn encode(stream: &AstStream) -> AstResult<Vec<u8>> {
    StreamWriter::new().write(stream)
}

/// header-only info about an ast stream
pub fn info(data: &[u8]) -> AstResult<AudioInfo> {
    StreamReader::new().read_info(data)
}
