//! Audio capture from the default input device
//!
//! Capture runs as a cooperative read loop over fixed-size chunks pulled
//! from the device stream, with two termination policies: a fixed sample
//! budget, or an interactive stop signal (any line on stdin). The chunk
//! size is the documented bound on how long interactive termination can
//! lag the stop signal.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::audio::buffer::f32_to_i16;
use crate::audio::{AudioBuffer, SAMPLE_RATE, wav};
use crate::{Error, Result};

/// Frames per chunk pulled from the input stream (64 ms at 16 kHz)
///
/// Interactive capture checks for a stop signal once per chunk, so a stop
/// request takes effect within one chunk interval.
pub const CHUNK_FRAMES: usize = 1024;

/// Consecutive empty chunk intervals tolerated before concluding the
/// device is not delivering audio (~3 s)
const SILENT_STREAM_CHUNKS: u32 = 50;

/// Duration of one chunk at the capture sample rate
#[must_use]
pub const fn chunk_interval() -> Duration {
    Duration::from_millis(1000 * CHUNK_FRAMES as u64 / SAMPLE_RATE as u64)
}

/// How a recording terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePolicy {
    /// Record exactly this many seconds, then stop unconditionally
    Fixed(u64),
    /// Record until the stop signal fires
    Interactive,
}

/// An audio input delivering PCM chunks as the device produces them
///
/// Implementations release the device when dropped, which is what
/// guarantees cleanup on every exit path of the record loop.
pub trait AudioSource {
    /// Open the device stream and start delivering chunks
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if the device cannot be opened.
    fn start(&mut self) -> Result<()>;

    /// Wait up to `timeout` for the next chunk; an empty vec means the
    /// interval elapsed without data
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if the stream has failed.
    fn read_chunk(&mut self, timeout: Duration) -> Result<Vec<i16>>;

    /// Stop delivering chunks (also implied by drop)
    fn stop(&mut self);
}

/// Record from `source` until the policy terminates
///
/// Fixed-duration capture accumulates exactly `duration × SAMPLE_RATE`
/// samples and truncates any excess from the final chunk. Interactive
/// capture appends whole chunks and checks `stop` (non-blocking) after
/// each one; it also stops if the stop channel disconnects, so a closed
/// stdin cannot leave the loop unreachable.
///
/// # Errors
///
/// Returns [`Error::Capture`] if the device fails, stops delivering
/// audio, or the recording ends empty.
pub fn record(
    source: &mut dyn AudioSource,
    policy: CapturePolicy,
    stop: &Receiver<()>,
) -> Result<AudioBuffer> {
    source.start()?;

    let mut samples: Vec<i16> = Vec::new();
    let mut idle_chunks: u32 = 0;

    let target = match policy {
        CapturePolicy::Fixed(secs) => Some(secs as usize * SAMPLE_RATE as usize),
        CapturePolicy::Interactive => None,
    };

    loop {
        let chunk = source.read_chunk(chunk_interval())?;

        if chunk.is_empty() && samples.is_empty() {
            idle_chunks += 1;
            if idle_chunks > SILENT_STREAM_CHUNKS {
                return Err(Error::Capture(
                    "input stream delivered no audio".to_string(),
                ));
            }
        } else {
            samples.extend_from_slice(&chunk);
        }

        match target {
            Some(target) => {
                if samples.len() >= target {
                    samples.truncate(target);
                    break;
                }
            }
            None => match stop.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            },
        }
    }

    source.stop();

    if samples.is_empty() {
        return Err(Error::Capture("recording ended with no audio".to_string()));
    }

    Ok(AudioBuffer::mono(samples))
}

/// Capture source backed by the default cpal input device
///
/// The cpal callback forwards each data slice over an mpsc channel; the
/// record loop drains it chunk by chunk. The stream handle lives in this
/// value, so dropping the source releases the device.
pub struct CpalSource {
    device: cpal::Device,
    config: StreamConfig,
    stream: Option<cpal::Stream>,
    rx: Option<Receiver<Vec<i16>>>,
}

impl CpalSource {
    /// Bind the default input device at 16 kHz mono
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if no input device is available or no
    /// suitable stream configuration exists.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Capture("no input device available".to_string()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::Capture(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Capture("no suitable input config found".to_string()))?;

        let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            stream: None,
            rx: None,
        })
    }

    /// Build an input stream, preferring i16 and converting from f32 for
    /// devices that only expose float formats
    fn build_stream(&self, tx: mpsc::Sender<Vec<i16>>) -> Result<cpal::Stream> {
        let err_callback = |err| {
            tracing::error!(error = %err, "audio capture error");
        };

        let tx_i16 = tx.clone();
        if let Ok(stream) = self.device.build_input_stream(
            &self.config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let _ = tx_i16.send(data.to_vec());
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        self.device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(data.iter().map(|&s| f32_to_i16(s)).collect());
                },
                err_callback,
                None,
            )
            .map_err(|e| Error::Capture(e.to_string()))
    }
}

impl AudioSource for CpalSource {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        let stream = self.build_stream(tx)?;
        stream.play().map_err(|e| Error::Capture(e.to_string()))?;

        self.stream = Some(stream);
        self.rx = Some(rx);

        tracing::debug!("audio capture started");
        Ok(())
    }

    fn read_chunk(&mut self, timeout: Duration) -> Result<Vec<i16>> {
        let rx = self
            .rx
            .as_ref()
            .ok_or_else(|| Error::Capture("capture not started".to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(chunk) => Ok(chunk),
            Err(RecvTimeoutError::Timeout) => Ok(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Capture("input stream closed".to_string()))
            }
        }
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            self.rx = None;
            tracing::debug!("audio capture stopped");
        }
    }
}

/// Capture port consumed by the pipeline
///
/// Records (or fails) and writes the captured buffer to the given WAV
/// path before returning, so downstream stages can use either the buffer
/// or the file.
#[async_trait]
pub trait CapturePort: Send + Sync {
    /// Record under `policy` and persist the result to `out_path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] on device or write failure.
    async fn record(&self, policy: CapturePolicy, out_path: &Path) -> Result<AudioBuffer>;
}

/// Production capture port: default microphone via cpal
///
/// The device stream is created, drained, and dropped inside one blocking
/// task, so it never outlives the recording and is released on every exit
/// path including errors.
pub struct MicrophoneCapture;

#[async_trait]
impl CapturePort for MicrophoneCapture {
    async fn record(&self, policy: CapturePolicy, out_path: &Path) -> Result<AudioBuffer> {
        let out: PathBuf = out_path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let stop = match policy {
                CapturePolicy::Interactive => {
                    println!("Press Enter to start recording...");
                    wait_for_line()?;
                    println!("Recording... press Enter to stop.");
                    stdin_stop_channel()
                }
                CapturePolicy::Fixed(secs) => {
                    println!("Recording {secs}s...");
                    // never fires; fixed capture stops on its sample budget
                    mpsc::channel().1
                }
            };

            let mut source = CpalSource::new()?;
            let buffer = record(&mut source, policy, &stop)?;
            wav::write_file(&buffer, &out)?;

            tracing::info!(
                samples = buffer.len(),
                secs = buffer.duration_secs(),
                path = %out.display(),
                "recording saved"
            );
            Ok(buffer)
        })
        .await
        .map_err(|e| Error::Capture(format!("capture task failed: {e}")))?
    }
}

/// Block until one line arrives on stdin
fn wait_for_line() -> Result<()> {
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| Error::Capture(format!("stdin unavailable: {e}")))?;
    Ok(())
}

/// Stop channel fed by a detached stdin reader thread
///
/// The thread fires once on the next line (or disconnects the channel on
/// EOF, which the record loop also treats as a stop). It is never joined;
/// it exits with the process.
fn stdin_stop_channel() -> Receiver<()> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_ok() {
            let _ = tx.send(());
        }
    });
    rx
}
