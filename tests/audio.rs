//! Audio buffer and WAV interchange tests
//!
//! No audio hardware required.

use voxlate::audio::{AudioBuffer, SAMPLE_RATE, wav};

/// Generate sine wave samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

#[test]
fn encoded_wav_has_riff_header() {
    let buffer = AudioBuffer::from_f32(&generate_sine_samples(440.0, 0.1, 0.5));
    let wav_data = wav::encode(&buffer).unwrap();

    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
    assert!(wav_data.len() > 44);
}

#[test]
fn wav_roundtrip_preserves_format_and_samples() {
    let buffer = AudioBuffer::mono(vec![0, 16_384, -16_384, 32_767, -32_768, 8_192]);
    let wav_data = wav::encode(&buffer).unwrap();

    let cursor = std::io::Cursor::new(wav_data);
    let mut reader = hound::WavReader::new(cursor).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples, buffer.samples());
}

#[test]
fn file_written_by_capture_side_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.wav");

    let buffer = AudioBuffer::from_f32(&generate_sine_samples(220.0, 0.25, 0.3));
    wav::write_file(&buffer, &path).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
    assert_eq!(reader.len() as usize, buffer.len());
}

#[test]
fn one_second_of_sine_has_one_second_of_samples() {
    let buffer = AudioBuffer::from_f32(&generate_sine_samples(440.0, 1.0, 0.5));
    assert_eq!(buffer.len(), SAMPLE_RATE as usize);
    assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
}

#[test]
fn f32_samples_out_of_range_are_clamped_not_wrapped() {
    let buffer = AudioBuffer::from_f32(&[1.5, -1.5]);
    assert_eq!(buffer.samples(), &[32_767, -32_768]);
}
