//! WAV container helpers.
//!
//! The upstream backend streams raw PCM16 deltas; callers need a
//! self-describing container so their audio engine can decode without
//! out-of-band format knowledge.

use std::io::Cursor;

use super::TtsError;

/// Wrap little-endian PCM16 mono samples in a WAV container.
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, TtsError> {
    if pcm.len() % 2 != 0 {
        return Err(TtsError::Decode(format!(
            "PCM16 payload has odd length {}",
            pcm.len()
        )));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buf = Vec::with_capacity(pcm.len() + 44);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buf), spec)
            .map_err(|e| TtsError::Decode(format!("failed to create WAV writer: {}", e)))?;
        for chunk in pcm.chunks_exact(2) {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            writer
                .write_sample(sample)
                .map_err(|e| TtsError::Decode(format!("failed to write WAV sample: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| TtsError::Decode(format!("failed to finalize WAV: {}", e)))?;
    }
    Ok(buf)
}

/// Validate a WAV container and return its duration in milliseconds.
///
/// Used both to sanity-check freshly fetched audio and to distrust
/// corrupt cache entries (a failed decode demotes a hit to a miss).
pub fn wav_duration_ms(wav: &[u8]) -> Result<f64, TtsError> {
    let reader = hound::WavReader::new(Cursor::new(wav))
        .map_err(|e| TtsError::Decode(format!("invalid WAV container: {}", e)))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(TtsError::Decode("WAV declares zero sample rate".into()));
    }
    let frames = reader.duration() as f64;
    Ok(frames / spec.sample_rate as f64 * 1000.0)
}
