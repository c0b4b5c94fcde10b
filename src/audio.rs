//! WAV loading shared by the model backends.

use anyhow::{Context, Result};
use std::path::Path;

/// Read a WAV file as f32 samples, downmixing multi-channel audio by
/// averaging. Returns the samples and the file's sample rate; the caller
/// decides whether that rate is acceptable.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to decode {}", path.display()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?
        }
    };

    let samples = if spec.channels > 1 {
        downmix(&samples, spec.channels as usize)
    } else {
        samples
    };

    Ok((samples, spec.sample_rate))
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_mono_wav() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("waveform.wav");
        write_wav(&path, 1, &[0, 16384, -16384, 32767]);

        let (samples, rate) = read_wav(&path).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(samples.len(), 4);
        assert!((samples[1] - 0.5).abs() < 1e-3);
        assert!((samples[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_stereo_downmix() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("waveform.wav");
        write_wav(&path, 2, &[16384, -16384, 16384, 16384]);

        let (samples, _) = read_wav(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].abs() < 1e-3);
        assert!((samples[1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = read_wav(&temp.path().join("nope.wav"));
        assert!(result.is_err());
    }
}
