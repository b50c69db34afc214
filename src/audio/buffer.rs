//! In-memory PCM sample container

use crate::audio::SAMPLE_RATE;

/// Captured audio: mono 16-bit signed PCM samples
///
/// Buffers are immutable once built; each stage hands the buffer to the
/// next by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Build a mono buffer at the pipeline sample rate
    #[must_use]
    pub fn mono(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: SAMPLE_RATE,
            channels: 1,
        }
    }

    /// Build a mono buffer from f32 samples in [-1.0, 1.0]
    #[must_use]
    pub fn from_f32(samples: &[f32]) -> Self {
        Self::mono(samples.iter().map(|&s| f32_to_i16(s)).collect())
    }

    /// PCM samples
    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Samples per second
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count (always 1)
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recorded duration in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Convert an f32 sample in [-1.0, 1.0] to i16
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}
