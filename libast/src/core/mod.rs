pub mod afc;
pub mod types;

pub use afc::{AfcCodec, FrameCodec, PredictorState};

pub use types::*;
