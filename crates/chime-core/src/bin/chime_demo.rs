//! Chime demo - plays a few synthesized tones through the default output
//!
//! ## Command line flags
//!
//! - `--list-devices`: Print available output devices and exit
//! - `--config <path>`: Load the mixer config from `<path>` instead of the default location

use std::f32::consts::TAU;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use chime_core::audio::{get_output_devices, start_audio_system};
use chime_core::config::{default_config_path, load_mixer_config};
use chime_core::engine::{mixer_channel_with_queue, SoundController};
use chime_core::{SoundHandle, SoundStream};

/// Peak amplitude of the synthesized tones
///
/// Several tones at this level sum past full scale, which exercises the
/// saturating mix.
const TONE_AMPLITUDE: f32 = 12000.0;

/// Interleaved stereo sine tone, `seconds` long at `sample_rate`
fn sine_tone(frequency: f32, seconds: f32, sample_rate: u32) -> SoundStream {
    let frames = (seconds * sample_rate as f32) as usize;
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let phase = TAU * frequency * i as f32 / sample_rate as f32;
        let value = (phase.sin() * TONE_AMPLITUDE) as i16;
        samples.push(value);
        samples.push(value);
    }
    SoundStream::from_interleaved(samples)
}

fn print_devices() -> Result<()> {
    let devices = get_output_devices().context("Failed to enumerate audio devices")?;
    for device in devices {
        println!(
            "{}  ({} ch, rates {:?}, 16-bit: {})",
            device,
            device.max_channels,
            device.sample_rates,
            if device.supports_i16 { "yes" } else { "converted" }
        );
    }
    Ok(())
}

fn parse_config_path(args: &[String]) -> Result<PathBuf> {
    match args.iter().position(|arg| arg == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Ok(PathBuf::from(path)),
            None => bail!("--config requires a path"),
        },
        None => Ok(default_config_path()),
    }
}

fn pause(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

fn log_status(controller: &SoundController) {
    let atomics = controller.atomics();
    log::info!(
        "{} channels used, {} playing, {} quanta rendered{}",
        atomics.channels_used(),
        atomics.channels_playing(),
        atomics.quanta_rendered(),
        if atomics.take_clip() { ", clipped" } else { "" }
    );
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if args.iter().any(|arg| arg == "--list-devices") {
        return print_devices();
    }

    let config_path = parse_config_path(&args)?;
    let config = load_mixer_config(&config_path);
    log::info!(
        "chime-demo starting with {} channels, queue of {}",
        config.max_channels,
        config.command_queue_capacity
    );

    let (mut controller, engine) =
        mixer_channel_with_queue(config.max_channels, config.command_queue_capacity);
    let audio = start_audio_system(&config.audio, engine).context("Failed to start audio")?;
    let rate = audio.sample_rate;
    log::info!(
        "Output running at {}Hz, ~{:.1}ms latency",
        rate,
        audio.latency_ms
    );

    // One-shot chord
    let mut chord: Vec<SoundHandle> = [261.63, 329.63, 392.0]
        .into_iter()
        .map(|freq| controller.add(sine_tone(freq, 0.8, rate), true, false))
        .collect::<Result<_, _>>()?;
    pause(1000);
    log_status(&controller);

    // The finished one-shots are rewound and stopped but still allocated
    controller.restart(chord[0])?;
    controller.play(chord[0])?;
    pause(1000);

    for handle in chord.iter_mut() {
        controller.remove(handle)?;
    }

    // Looping drone, paused and resumed
    let mut drone = controller.add(sine_tone(110.0, 0.25, rate), true, true)?;
    pause(1000);
    controller.pause(drone)?;
    log_status(&controller);
    pause(500);
    controller.play(drone)?;
    pause(1000);
    controller.remove(&mut drone)?;
    debug_assert!(!drone.is_valid());

    controller.shutdown()?;
    pause(100);
    controller.reclaim();
    log_status(&controller);

    drop(audio.handle);
    log::info!("chime-demo finished");
    Ok(())
}
