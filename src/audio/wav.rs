//! WAV serialization for audio buffers
//!
//! Capture output and synthesis fallback output both use a standard
//! RIFF/WAV container (mono, 16-bit signed PCM) so the transcription
//! engine and host playback tools can read either.

use std::io::Cursor;
use std::path::Path;

use crate::audio::AudioBuffer;
use crate::{Error, Result};

fn spec_for(buffer: &AudioBuffer) -> hound::WavSpec {
    hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Encode a buffer as WAV bytes
///
/// # Errors
///
/// Returns [`Error::Capture`] if WAV encoding fails.
pub fn encode(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec_for(buffer))
            .map_err(|e| Error::Capture(format!("WAV encoding failed: {e}")))?;

        for &sample in buffer.samples() {
            writer
                .write_sample(sample)
                .map_err(|e| Error::Capture(format!("WAV encoding failed: {e}")))?;
        }

        writer
            .finalize()
            .map_err(|e| Error::Capture(format!("WAV encoding failed: {e}")))?;
    }

    Ok(cursor.into_inner())
}

/// Write a buffer to a WAV file
///
/// # Errors
///
/// Returns [`Error::Capture`] if the file cannot be written.
pub fn write_file(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, spec_for(buffer))
        .map_err(|e| Error::Capture(format!("cannot write {}: {e}", path.display())))?;

    for &sample in buffer.samples() {
        writer
            .write_sample(sample)
            .map_err(|e| Error::Capture(format!("cannot write {}: {e}", path.display())))?;
    }

    writer
        .finalize()
        .map_err(|e| Error::Capture(format!("cannot write {}: {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;

    #[test]
    fn encoded_wav_carries_riff_header() {
        let buf = AudioBuffer::mono(vec![0, 100, -100]);
        let bytes = encode(&buf).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header plus two bytes per sample
        assert_eq!(bytes.len(), 44 + buf.len() * 2);
    }

    #[test]
    fn written_file_round_trips_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let buf = AudioBuffer::mono(vec![0, 1, -1, i16::MAX, i16::MIN]);

        write_file(&buf, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, buf.samples());
    }

    #[test]
    fn unwritable_path_is_a_capture_error() {
        let buf = AudioBuffer::mono(vec![0; 16]);
        let err = write_file(&buf, Path::new("/nonexistent/dir/out.wav")).unwrap_err();
        assert!(matches!(err, Error::Capture(_)));
    }
}
