#[cfg(test)]
mod tests {
    use libast_audio::Encoding;
    use reast::audio::{read_audio_file, write_wav};
    use reast::EncodeOptions;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("reast-test-{}-{}", std::process::id(), name));
        path
    }

    fn sine_channels(count: usize, channels: usize, sample_rate: u32) -> Vec<Vec<i16>> {
        (0..channels)
            .map(|c| {
                (0..count)
                    .map(|i| {
                        let freq = 440.0 * (c + 1) as f32;
                        let t = i as f32 / sample_rate as f32;
                        ((t * freq * 2.0 * std::f32::consts::PI).sin() * 12000.0) as i16
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_wav_to_pcm16_ast_and_back_is_exact() {
        let wav_in = temp_path("pcm16-in.wav");
        let ast = temp_path("pcm16.ast");
        let wav_out = temp_path("pcm16-out.wav");

        let channels = sine_channels(4800, 2, 32000);
        write_wav(&wav_in, &channels, 32000).unwrap();

        let info = reast::encode_file(&wav_in, &ast, &EncodeOptions::pcm16()).unwrap();
        assert_eq!(info.encoding, Encoding::Pcm16);
        assert_eq!(info.sample_rate, 32000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_count, 4800);

        reast::decode_file(&ast, &wav_out).unwrap();
        let (decoded, rate) = read_audio_file(&wav_out).unwrap();
        assert_eq!(rate, 32000);
        assert_eq!(decoded, channels);

        for path in [wav_in, ast, wav_out] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn test_wav_to_adpcm_ast_is_close() {
        let wav_in = temp_path("adpcm-in.wav");
        let ast = temp_path("adpcm.ast");
        let wav_out = temp_path("adpcm-out.wav");

        let channels = sine_channels(4800, 1, 32000);
        write_wav(&wav_in, &channels, 32000).unwrap();

        let info = reast::encode_file(&wav_in, &ast, &EncodeOptions::adpcm()).unwrap();
        assert_eq!(info.encoding, Encoding::Adpcm);
        assert_eq!(info.sample_count, 4800);

        reast::decode_file(&ast, &wav_out).unwrap();
        let (decoded, _) = read_audio_file(&wav_out).unwrap();
        assert_eq!(decoded[0].len(), channels[0].len());
        for (original, out) in channels[0].iter().zip(decoded[0].iter()) {
            assert!((*original as i32 - *out as i32).abs() <= 512);
        }

        for path in [wav_in, ast, wav_out] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn test_reencode_converts_pcm16_to_adpcm() {
        let wav_in = temp_path("reencode-in.wav");
        let pcm_ast = temp_path("reencode-pcm.ast");
        let adpcm_ast = temp_path("reencode-adpcm.ast");

        write_wav(&wav_in, &sine_channels(3200, 2, 32000), 32000).unwrap();
        reast::encode_file(&wav_in, &pcm_ast, &EncodeOptions::pcm16()).unwrap();

        let info = reast::reencode_file(&pcm_ast, &adpcm_ast).unwrap();
        assert_eq!(info.encoding, Encoding::Adpcm);
        assert_eq!(info.sample_count, 3200);

        // the adpcm stream must be smaller than the pcm16 one
        let pcm_size = std::fs::metadata(&pcm_ast).unwrap().len();
        let adpcm_size = std::fs::metadata(&adpcm_ast).unwrap().len();
        assert!(adpcm_size < pcm_size);

        // re-encoding again has nothing to do
        assert!(reast::reencode_file(&adpcm_ast, &adpcm_ast).is_err());

        for path in [wav_in, pcm_ast, adpcm_ast] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn test_resample_scales_rate_and_loop_points() {
        let wav_in = temp_path("resample-in.wav");
        let ast = temp_path("resample.ast");
        let out = temp_path("resample-out.ast");

        write_wav(&wav_in, &sine_channels(4800, 1, 48000), 48000).unwrap();
        let options = EncodeOptions::pcm16().with_loop(1200, Some(4800));
        reast::encode_file(&wav_in, &ast, &options).unwrap();

        let info = reast::resample_file(&ast, &out, 32000).unwrap();
        assert_eq!(info.sample_rate, 32000);
        assert!(info.looped);
        assert_eq!(info.loop_start, 800);
        assert_eq!(info.loop_end, 3200);

        for path in [wav_in, ast, out] {
            let _ = std::fs::remove_file(path);
        }
    }
}
