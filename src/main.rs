use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voxlate::audio::{AudioSource, CapturePolicy, CpalSource, MicrophoneCapture, chunk_interval};
use voxlate::playback::HostPlayer;
use voxlate::stt::WhisperTranscriber;
use voxlate::translate::ChatTranslator;
use voxlate::tts::SpeechSynthesizer;
use voxlate::{AudioInput, Error, Interpreter, RunRequest, Settings};

/// Voxlate - record speech, translate it, speak it back
#[derive(Parser)]
#[command(name = "voxlate", version, about)]
struct Cli {
    /// Language spoken in the recording (advisory hint to the engine)
    #[arg(short = 's', long, default_value = "en", env = "VOXLATE_SRC_LANG")]
    src_lang: String,

    /// Language to translate into
    #[arg(short = 't', long, default_value = "fr", env = "VOXLATE_TGT_LANG")]
    tgt_lang: String,

    /// Recording duration in seconds (fixed-duration capture)
    #[arg(short, long, default_value = "6")]
    duration: u64,

    /// Record until Enter is pressed instead of for a fixed duration
    #[arg(long)]
    interactive: bool,

    /// Existing audio file to interpret; skips recording entirely
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for the recorded and synthesized audio files
    #[arg(short, long, default_value = "outputs", env = "VOXLATE_OUTDIR")]
    outdir: PathBuf,

    /// Skip playing the synthesized audio back
    #[arg(long)]
    no_playback: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input without calling any engine
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,voxlate=info",
        1 => "info,voxlate=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> voxlate::Result<()> {
    if let Some(Command::TestMic { duration }) = cli.command {
        return test_mic(duration).await;
    }

    // Credential and engine settings are resolved before any stage runs;
    // a missing key aborts here.
    let settings = Settings::resolve()?;

    std::fs::create_dir_all(&cli.outdir)?;
    let input_wav = cli.outdir.join("input.wav");
    let output_wav = cli.outdir.join("output_translated.wav");

    let input = match cli.input {
        Some(path) => AudioInput::File(path),
        None if cli.interactive => AudioInput::Record(CapturePolicy::Interactive),
        None => AudioInput::Record(CapturePolicy::Fixed(cli.duration)),
    };

    let request = RunRequest {
        input,
        source_lang: cli.src_lang,
        target_lang: cli.tgt_lang,
        input_wav,
        output_wav,
        playback: !cli.no_playback,
    };

    let interpreter = Interpreter::new(
        Arc::new(MicrophoneCapture),
        Arc::new(WhisperTranscriber::new(
            settings.api_key.clone(),
            settings.stt_model.clone(),
        )?),
        Arc::new(ChatTranslator::new(
            settings.api_key.clone(),
            settings.translate_model.clone(),
        )?),
        SpeechSynthesizer::standard(
            settings.api_key,
            settings.tts_model,
            settings.tts_voice,
        ),
        Arc::new(HostPlayer::detect()),
    );

    let report = interpreter.run(&request).await?;
    println!("\n{report}");

    Ok(())
}

/// Capture from the default device and print a level meter
async fn test_mic(duration: u64) -> voxlate::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    tokio::task::spawn_blocking(move || {
        let mut source = CpalSource::new()?;
        source.start()?;

        for i in 0..duration {
            let deadline = Instant::now() + Duration::from_secs(1);
            let mut samples: Vec<i16> = Vec::new();
            while Instant::now() < deadline {
                samples.extend(source.read_chunk(chunk_interval())?);
            }

            let rms = calculate_rms(&samples);
            let peak = f32::from(samples.iter().map(|s| s.saturating_abs()).max().unwrap_or(0))
                / f32::from(i16::MAX);

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let meter_len = (rms * 100.0).min(50.0) as usize;
            let meter = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

            println!("[{:2}s] RMS: {rms:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
        }

        source.stop();

        println!("\n---");
        println!("If you saw movement in the meter, your mic is working.");
        println!("If RMS stayed near 0, check your input device and levels.");
        Ok(())
    })
    .await
    .map_err(|e| Error::Capture(format!("mic test task failed: {e}")))?
}

/// RMS energy of i16 samples, normalized to [0, 1]
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples
        .iter()
        .map(|&s| {
            let s = f32::from(s) / f32::from(i16::MAX);
            s * s
        })
        .sum();
    (sum_squares / samples.len() as f32).sqrt()
}
