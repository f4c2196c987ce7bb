use thiserror::Error;

/// failures while parsing or emitting an ast stream
///
/// Loop-start misalignment is not listed here: the writer recovers by
/// rounding up to the next frame boundary and surfaces a warning instead
/// of aborting.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    #[error("not an AST stream: bad magic at offset {offset:#x}")]
    BadMagic { offset: usize },
    #[error("expected BLCK header at offset {offset:#x}")]
    UnexpectedBlock { offset: usize },
    #[error("unexpected end of stream")]
    TruncatedInput,
    #[error("unknown encoding tag {0:#06x}")]
    UnsupportedEncoding(u16),
    #[error("channel count {0} outside 1..=6")]
    InvalidChannelCount(u16),
}

/// result type for ast stuff
pub type AstResult<T> = Result<T, FormatError>;
