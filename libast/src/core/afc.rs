//! 4-bit adaptive predictive frame transform
//!
//! One frame packs 16 linear samples into 9 bytes: a control byte carrying
//! the scale shift (high nibble) and coefficient index (low nibble), then
//! 8 bytes of 4-bit residuals. Prediction runs over the two most recent
//! decoded samples, so the caller must thread [`PredictorState`] through
//! consecutive frames of a channel in order.

/// linear samples per adaptive frame
pub const SAMPLES_PER_FRAME: usize = 16;

/// on-wire bytes per adaptive frame
pub const BYTES_PER_FRAME: usize = 9;

/// predictor coefficient pairs, 4.11 fixed point
const COEFFICIENTS: [(i32, i32); 16] = [
    (0, 0),
    (2048, 0),
    (0, 2048),
    (1024, 1024),
    (4096, -2048),
    (3584, -1536),
    (3072, -1024),
    (4608, -2560),
    (4200, -2248),
    (4800, -2300),
    (5120, -3072),
    (2048, -2048),
    (1024, -1024),
    (-1024, 1024),
    (-1024, 0),
    (-2048, 0),
];

/// per-channel carry: the two most recently produced linear samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictorState {
    pub last: i32,
    pub penult: i32,
}

impl PredictorState {
    pub fn reset(&mut self) {
        *self = PredictorState::default();
    }
}

/// frame-level transform used by the container codec
///
/// Implementations must be deterministic and pure with respect to the
/// explicit state parameter, and decode must reproduce the encoded input
/// within the transform's quantization error.
pub trait FrameCodec {
    /// encode one frame, returning the wire bytes and the summed squared
    /// quantization error
    ///
    /// `force_coef` pins the coefficient selection (the container forces
    /// index 0 at a loop seam so decoder history is deterministic there).
    fn encode_frame(
        &self,
        pcm: &[i16; SAMPLES_PER_FRAME],
        state: &mut PredictorState,
        force_coef: Option<usize>,
    ) -> ([u8; BYTES_PER_FRAME], u64);

    /// decode one frame to linear samples
    fn decode_frame(
        &self,
        frame: &[u8; BYTES_PER_FRAME],
        state: &mut PredictorState,
    ) -> [i16; SAMPLES_PER_FRAME];
}

/// the production adaptive transform
#[derive(Debug, Clone, Copy, Default)]
pub struct AfcCodec;

impl FrameCodec for AfcCodec {
    fn encode_frame(
        &self,
        pcm: &[i16; SAMPLES_PER_FRAME],
        state: &mut PredictorState,
        force_coef: Option<usize>,
    ) -> ([u8; BYTES_PER_FRAME], u64) {
        let mut best_error = u64::MAX;
        let mut best_control = 0u8;
        let mut best_deltas = [0i32; SAMPLES_PER_FRAME];
        let mut best_state = *state;

        // exhaustive search over coefficient pairs and scale shifts,
        // simulating the decoder exactly
        for coef in 0..COEFFICIENTS.len() {
            if let Some(forced) = force_coef {
                if coef != forced & 0x0F {
                    continue;
                }
            }
            for shift in 0..16u32 {
                let (deltas, end_state, error) = quantize(pcm, *state, coef, shift);
                if error < best_error {
                    best_error = error;
                    best_control = ((shift as u8) << 4) | coef as u8;
                    best_deltas = deltas;
                    best_state = end_state;
                }
            }
        }

        let mut frame = [0u8; BYTES_PER_FRAME];
        frame[0] = best_control;
        for (i, &delta) in best_deltas.iter().enumerate() {
            let nibble = (delta & 0x0F) as u8;
            if i % 2 == 0 {
                frame[1 + i / 2] |= nibble << 4;
            } else {
                frame[1 + i / 2] |= nibble;
            }
        }

        *state = best_state;
        (frame, best_error)
    }

    fn decode_frame(
        &self,
        frame: &[u8; BYTES_PER_FRAME],
        state: &mut PredictorState,
    ) -> [i16; SAMPLES_PER_FRAME] {
        let scale = 1i32 << (frame[0] >> 4);
        let (c1, c2) = COEFFICIENTS[(frame[0] & 0x0F) as usize];

        let mut out = [0i16; SAMPLES_PER_FRAME];
        for (i, slot) in out.iter_mut().enumerate() {
            let byte = frame[1 + i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            let delta = sign_extend_nibble(nibble);
            let sample = reconstruct(delta, scale, c1, c2, state);
            state.penult = state.last;
            state.last = sample;
            *slot = sample as i16;
        }
        out
    }
}

// helpers

/// quantize one frame against a fixed coefficient pair and scale shift
fn quantize(
    pcm: &[i16; SAMPLES_PER_FRAME],
    start: PredictorState,
    coef: usize,
    shift: u32,
) -> ([i32; SAMPLES_PER_FRAME], PredictorState, u64) {
    let (c1, c2) = COEFFICIENTS[coef];
    let scale = 1i32 << shift;

    let mut state = start;
    let mut deltas = [0i32; SAMPLES_PER_FRAME];
    let mut error = 0u64;

    for (i, &sample) in pcm.iter().enumerate() {
        let predicted = (c1 * state.last + c2 * state.penult) >> 11;
        let residual = sample as i32 - predicted;
        let delta = round_div(residual, scale).clamp(-8, 7);
        let rebuilt = reconstruct(delta, scale, c1, c2, &state);

        let diff = (sample as i32 - rebuilt) as i64;
        error += (diff * diff) as u64;

        state.penult = state.last;
        state.last = rebuilt;
        deltas[i] = delta;
    }

    (deltas, state, error)
}

/// decoder reconstruction of one sample
fn reconstruct(delta: i32, scale: i32, c1: i32, c2: i32, state: &PredictorState) -> i32 {
    let acc = ((delta * scale) << 11) + c1 * state.last + c2 * state.penult;
    (acc >> 11).clamp(i16::MIN as i32, i16::MAX as i32)
}

fn sign_extend_nibble(nibble: u8) -> i32 {
    ((nibble as i32) << 28) >> 28
}

/// division rounding to nearest, away from zero on ties
fn round_div(n: i32, d: i32) -> i32 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}

/// convert linear samples to big-endian wire bytes
pub fn pcm16_to_be_bytes(pcm: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pcm.len() * 2);
    for &sample in pcm {
        out.extend_from_slice(&sample.to_be_bytes());
    }
    out
}
