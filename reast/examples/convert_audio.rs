//! Example: Convert an audio file to AST and decode it back
//!
//! Run with: cargo run --example convert_audio input.wav output.ast

use reast::EncodeOptions;
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <input-audio> <output-ast>", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let output_path = PathBuf::from(&args[2]);

    println!("Encoding {} as ADPCM...", input_path.display());
    let info = reast::encode_file(&input_path, &output_path, &EncodeOptions::adpcm())?;

    println!("  Sample rate: {} Hz", info.sample_rate);
    println!("  Channels: {}", info.channels);
    println!("  Samples: {}", info.sample_count);
    println!("  Duration: {:.2}s", info.duration_secs());

    // Show compression stats
    let original_size = fs::metadata(&input_path)?.len();
    let compressed_size = fs::metadata(&output_path)?.len();
    let ratio = original_size as f32 / compressed_size as f32;

    println!("  Original: {} bytes", original_size);
    println!("  Compressed: {} bytes", compressed_size);
    println!("  Ratio: {:.1}x", ratio);

    // Decode back to WAV for verification
    println!("\nDecoding back to WAV for verification...");
    let wav_path = output_path.with_extension("decoded.wav");
    reast::decode_file(&output_path, &wav_path)?;
    println!("Wrote decoded WAV to {}", wav_path.display());

    Ok(())
}
