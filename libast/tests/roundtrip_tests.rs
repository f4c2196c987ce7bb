//! End-to-end round-trip tests for libast

use libast_audio::afc::{FrameCodec, PredictorState, BYTES_PER_FRAME, SAMPLES_PER_FRAME};
use libast_audio::{
    decode, encode, AstStream, Encoding, StreamReader, StreamWriter, BLOCK_HEADER_SIZE,
    STREAM_HEADER_SIZE,
};

fn sine(count: usize, freq: f64, amplitude: f64) -> Vec<i16> {
    (0..count)
        .map(|i| {
            let t = i as f64 * 2.0 * std::f64::consts::PI * freq / 32000.0;
            (t.sin() * amplitude) as i16
        })
        .collect()
}

fn max_abs_diff(a: &[i16], b: &[i16]) -> i32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as i32 - y as i32).abs())
        .max()
        .unwrap_or(0)
}

// ============================================================================
// Linear PCM16
// ============================================================================

#[test]
fn test_pcm16_scenario_2ch_32khz_1600_samples() {
    let left = sine(1600, 440.0, 9000.0);
    let right = sine(1600, 660.0, 9000.0);
    let stream = AstStream::new(Encoding::Pcm16, 32000, vec![left.clone(), right.clone()]);

    let data = encode(&stream).unwrap();
    let decoded = decode(&data).unwrap();

    assert_eq!(decoded.sample_count, 1600);
    assert_eq!(decoded.sample_rate, 32000);
    assert_eq!(decoded.channel_count(), 2);
    assert!(!decoded.looped);
    assert_eq!(decoded.channels[0], left);
    assert_eq!(decoded.channels[1], right);
}

#[test]
fn test_pcm16_multi_block_roundtrip_is_exact() {
    // 12000 samples spans three 5040-sample blocks
    let left: Vec<i16> = (0..12000).map(|i| (i % 3001) as i16 - 1500).collect();
    let right: Vec<i16> = (0..12000).map(|i| -((i % 997) as i16)).collect();
    let stream = AstStream::new(Encoding::Pcm16, 48000, vec![left.clone(), right.clone()]);

    let decoded = decode(&encode(&stream).unwrap()).unwrap();
    assert_eq!(decoded.channels[0], left);
    assert_eq!(decoded.channels[1], right);
}

// ============================================================================
// Adaptive Differential
// ============================================================================

#[test]
fn test_adpcm_roundtrip_error_is_bounded() {
    let source = sine(4800, 440.0, 8000.0);
    let stream = AstStream::new(Encoding::Adpcm, 32000, vec![source.clone()]);

    let decoded = decode(&encode(&stream).unwrap()).unwrap();
    assert_eq!(decoded.channels[0].len(), source.len());

    let max_diff = max_abs_diff(&source, &decoded.channels[0]);
    assert!(max_diff <= 512, "max quantization error {}", max_diff);

    let mean: f64 = source
        .iter()
        .zip(decoded.channels[0].iter())
        .map(|(&x, &y)| (x as f64 - y as f64).abs())
        .sum::<f64>()
        / source.len() as f64;
    assert!(mean <= 32.0, "mean quantization error {}", mean);
}

#[test]
fn test_adpcm_multichannel_channels_stay_independent() {
    let channels: Vec<Vec<i16>> = (0..4)
        .map(|c| sine(2000, 200.0 * (c + 1) as f64, 6000.0))
        .collect();
    let stream = AstStream::new(Encoding::Adpcm, 32000, channels.clone());

    let decoded = decode(&encode(&stream).unwrap()).unwrap();
    assert_eq!(decoded.channel_count(), 4);
    for (source, out) in channels.iter().zip(decoded.channels.iter()) {
        assert!(max_abs_diff(source, out) <= 512);
    }
}

#[test]
fn test_adpcm_loop_clamp_survives_roundtrip() {
    let stream = AstStream::new(Encoding::Adpcm, 32000, vec![sine(4000, 440.0, 5000.0)])
        .with_loop(0, 3200);

    let decoded = decode(&encode(&stream).unwrap()).unwrap();
    assert_eq!(decoded.sample_count, 3200);
    assert_eq!(decoded.channels[0].len(), 3200);
    assert!(decoded.looped);
}

#[test]
fn test_loop_seam_frame_uses_zero_coefficient() {
    // the writer rounds loop start 100 up to 112 and must force the
    // identity coefficient on the frame starting there
    let stream = AstStream::new(Encoding::Adpcm, 32000, vec![sine(1600, 440.0, 8000.0)])
        .with_loop(100, 1600);
    let data = encode(&stream).unwrap();

    assert_eq!(
        StreamReader::new().read_info(&data).unwrap().loop_start,
        112
    );

    // frame 7 of block 0, channel 0
    let frame_offset = STREAM_HEADER_SIZE + BLOCK_HEADER_SIZE + (112 / 16) * 9;
    assert_eq!(data[frame_offset] & 0x0F, 0);
}

// ============================================================================
// Injected Reference Transform
// ============================================================================

/// trivial delta coder: 4-bit steps from the previous sample, no scale,
/// exact for signals whose slope stays within [-8, 7]
struct DeltaCodec;

impl FrameCodec for DeltaCodec {
    fn encode_frame(
        &self,
        pcm: &[i16; SAMPLES_PER_FRAME],
        state: &mut PredictorState,
        _force_coef: Option<usize>,
    ) -> ([u8; BYTES_PER_FRAME], u64) {
        let mut frame = [0u8; BYTES_PER_FRAME];
        let mut error = 0u64;
        for (i, &sample) in pcm.iter().enumerate() {
            let delta = (sample as i32 - state.last).clamp(-8, 7);
            let rebuilt = state.last + delta;
            let diff = (sample as i32 - rebuilt) as i64;
            error += (diff * diff) as u64;
            state.penult = state.last;
            state.last = rebuilt;

            let nibble = (delta & 0x0F) as u8;
            if i % 2 == 0 {
                frame[1 + i / 2] |= nibble << 4;
            } else {
                frame[1 + i / 2] |= nibble;
            }
        }
        (frame, error)
    }

    fn decode_frame(
        &self,
        frame: &[u8; BYTES_PER_FRAME],
        state: &mut PredictorState,
    ) -> [i16; SAMPLES_PER_FRAME] {
        let mut out = [0i16; SAMPLES_PER_FRAME];
        for (i, slot) in out.iter_mut().enumerate() {
            let byte = frame[1 + i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            let delta = ((nibble as i32) << 28) >> 28;
            let sample = state.last + delta;
            state.penult = state.last;
            state.last = sample;
            *slot = sample as i16;
        }
        out
    }
}

#[test]
fn test_container_roundtrip_with_reference_transform() {
    // triangle wave with slope 4, exactly representable by the delta coder
    let source: Vec<i16> = (0..2000)
        .map(|i| {
            let phase = i % 200;
            if phase < 100 {
                (phase * 4) as i16
            } else {
                ((200 - phase) * 4) as i16
            }
        })
        .collect();

    let stream = AstStream::new(Encoding::Adpcm, 32000, vec![source.clone()]);
    let data = StreamWriter::with_codec(DeltaCodec).write(&stream).unwrap();
    let decoded = StreamReader::new()
        .read_with_codec(&data, &DeltaCodec)
        .unwrap();

    assert_eq!(decoded.channels[0], source);
}
