//! Audio capture and PCM handling
//!
//! All audio in the pipeline is mono 16-bit signed PCM at 16 kHz, the
//! interchange format expected by the transcription engine.

mod buffer;
mod capture;
pub mod wav;

pub use buffer::AudioBuffer;
pub use capture::{
    AudioSource, CapturePolicy, CapturePort, CpalSource, MicrophoneCapture, CHUNK_FRAMES,
    chunk_interval, record,
};

/// Sample rate for capture and synthesis output (16 kHz for speech)
pub const SAMPLE_RATE: u32 = 16_000;
