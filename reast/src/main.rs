use anyhow::Result;
use clap::{Parser, Subcommand};
use libast_audio::Encoding;
use reast::EncodeOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reast")]
#[command(version = "0.1.0")]
#[command(about = "AST streaming audio converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode an audio file (wav, flac, mp3, ogg, ...) to AST
    Encode {
        /// Input audio file
        input: PathBuf,
        /// Output AST file
        output: PathBuf,
        /// Store linear PCM16 instead of ADPCM
        #[arg(long)]
        pcm16: bool,
        /// Loop start sample (enables looping)
        #[arg(long)]
        loop_start: Option<u32>,
        /// Loop end sample (defaults to the stream length)
        #[arg(long)]
        loop_end: Option<u32>,
    },
    /// Decode an AST file to 16-bit WAV
    Decode {
        /// Input AST file
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
    },
    /// Show information about an AST file
    Info {
        /// Input AST file
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-encode a PCM16 AST as ADPCM
    Reencode {
        /// Input AST file
        input: PathBuf,
        /// Output AST file (defaults to rewriting the input)
        output: Option<PathBuf>,
    },
    /// Resample an AST stream, fixing up loop points
    Resample {
        /// Input AST file
        input: PathBuf,
        /// Output AST file (defaults to rewriting the input)
        output: Option<PathBuf>,
        /// Target sample rate in Hz
        #[arg(long, default_value = "32000")]
        rate: u32,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            input,
            output,
            pcm16,
            loop_start,
            loop_end,
        } => {
            let mut options = if pcm16 {
                EncodeOptions::pcm16()
            } else {
                EncodeOptions::adpcm()
            };
            if let Some(start) = loop_start {
                options = options.with_loop(start, loop_end);
            }

            println!("Encoding {}...", input.display());
            let info = reast::encode_file(&input, &output, &options)?;
            print_info(&info);
            println!("Wrote {}", output.display());
        }
        Commands::Decode { input, output } => {
            println!("Decoding {}...", input.display());
            let info = reast::decode_file(&input, &output)?;
            print_info(&info);
            println!("Wrote {}", output.display());
        }
        Commands::Info { input, json } => {
            let info = reast::info_file(&input)?;
            if json {
                println!("{}", info_json(&info));
            } else {
                print_info(&info);
            }
        }
        Commands::Reencode { input, output } => {
            let output = output.unwrap_or_else(|| input.clone());
            println!("Re-encoding {} as ADPCM...", input.display());
            let info = reast::reencode_file(&input, &output)?;
            print_info(&info);
            println!("Wrote {}", output.display());
        }
        Commands::Resample {
            input,
            output,
            rate,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            println!("Resampling {} to {} Hz...", input.display(), rate);
            let info = reast::resample_file(&input, &output, rate)?;
            print_info(&info);
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

fn print_info(info: &libast_audio::AudioInfo) {
    let encoding = match info.encoding {
        Encoding::Adpcm => "ADPCM",
        Encoding::Pcm16 => "PCM16",
    };
    println!("  Encoding: {}", encoding);
    println!("  Sample rate: {} Hz", info.sample_rate);
    println!("  Channels: {}", info.channels);
    println!("  Samples: {}", info.sample_count);
    println!("  Duration: {:.2}s", info.duration_secs());
    if info.looped {
        println!("  Loop: {}..{}", info.loop_start, info.loop_end);
    }
}

fn info_json(info: &libast_audio::AudioInfo) -> String {
    serde_json::json!({
        "encoding": match info.encoding {
            Encoding::Adpcm => "adpcm",
            Encoding::Pcm16 => "pcm16",
        },
        "bits_per_sample": info.bits_per_sample,
        "sample_rate": info.sample_rate,
        "channels": info.channels,
        "sample_count": info.sample_count,
        "duration_secs": info.duration_secs(),
        "looped": info.looped,
        "loop_start": info.loop_start,
        "loop_end": info.loop_end,
        "total_size": info.total_size,
    })
    .to_string()
}
