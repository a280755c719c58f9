//! CPAL audio backend
//!
//! Opens one output stream and moves the [`MixerEngine`] into its data
//! callback, so the audio thread owns the live pool exclusively.
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  Control Thread  │───push()───────────►│   Command Queue     │
//! │ (SoundController)│                     │  (lock-free SPSC)   │
//! └──────────────────┘                     └──────────┬──────────┘
//!         ▲                                           │ pop()
//!         │ Retired storage                           ▼
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │   Retire Queue   │◄────────────────────│  CPAL Audio Thread  │
//! │ (lock-free SPSC) │                     │  (owns MixerEngine) │
//! └──────────────────┘                     └─────────────────────┘
//! ```

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig,
    SupportedStreamConfigRange,
};

use super::backend::{AudioHandle, AudioSystemResult};
use super::config::{AudioConfig, MAX_BUFFER_SIZE};
use super::device::{default_output_device, find_device_by_id};
use super::error::{AudioError, AudioResult};
use crate::engine::MixerEngine;
use crate::types::{FrameBuffer, StereoFrame};

/// Sample formats the callback can write, most preferred first
///
/// The mixer produces 16-bit samples, so I16 needs no conversion at all.
const FORMAT_PREFERENCE: [SampleFormat; 3] = [SampleFormat::I16, SampleFormat::F32, SampleFormat::U16];

/// Start the audio output with the given configuration
///
/// The engine is moved into the stream callback; keep the returned
/// [`AudioHandle`] alive for as long as sound should play.
pub fn start_audio_system(
    config: &AudioConfig,
    engine: MixerEngine,
) -> AudioResult<AudioSystemResult> {
    let device = match &config.device {
        Some(id) => find_device_by_id(id)?,
        None => default_output_device()?,
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();
    let supported_config = choose_config(&supported_configs, config.target_sample_rate())?;

    let sample_rate = supported_config.sample_rate().0;
    let sample_format = supported_config.sample_format();
    let buffer_size = config.buffer_size.frames();

    let stream_config = StreamConfig {
        channels: supported_config.channels(),
        sample_rate: supported_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(buffer_size),
    };

    let latency_ms = config.buffer_size.latency_ms(sample_rate);

    log::info!(
        "Audio config: {} channels, {}Hz, {:?}, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        sample_format,
        buffer_size,
        latency_ms
    );

    let atomics = engine.atomics();
    let state = CallbackState::new(engine);

    let stream = match sample_format {
        SampleFormat::I16 => build_output_stream::<i16>(&device, &stream_config, state)?,
        SampleFormat::F32 => build_output_stream::<f32>(&device, &stream_config, state)?,
        SampleFormat::U16 => build_output_stream::<u16>(&device, &stream_config, state)?,
        other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    };
    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started");

    Ok(AudioSystemResult {
        handle: AudioHandle::new(stream, sample_rate, buffer_size),
        atomics,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

/// Pick the best output configuration for the requested sample rate
///
/// Prefers a supported sample format in [`FORMAT_PREFERENCE`] order, then at
/// least two channels, then a range containing `target_rate`. If no usable
/// range contains the target rate, the chosen range's maximum rate is used.
fn choose_config(
    configs: &[SupportedStreamConfigRange],
    target_rate: u32,
) -> AudioResult<SupportedStreamConfig> {
    if configs.is_empty() {
        return Err(AudioError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let supports_rate = |c: &SupportedStreamConfigRange| {
        target_rate >= c.min_sample_rate().0 && target_rate <= c.max_sample_rate().0
    };

    let best = find_config(configs, |c| c.channels() >= 2 && supports_rate(c))
        .or_else(|| find_config(configs, |c| supports_rate(c)))
        .or_else(|| find_config(configs, |c| c.channels() >= 2))
        .or_else(|| find_config(configs, |_| true))
        .ok_or_else(|| {
            let offered: Vec<String> = configs
                .iter()
                .map(|c| format!("{:?}", c.sample_format()))
                .collect();
            AudioError::UnsupportedFormat(offered.join(", "))
        })?;

    let sample_rate = if supports_rate(best) {
        cpal::SampleRate(target_rate)
    } else {
        let fallback = best.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz (sounds will play at the wrong pitch)",
            target_rate,
            fallback.0
        );
        fallback
    };

    Ok(best.clone().with_sample_rate(sample_rate))
}

/// First range matching `pred`, trying formats in preference order
fn find_config(
    configs: &[SupportedStreamConfigRange],
    pred: impl Fn(&SupportedStreamConfigRange) -> bool,
) -> Option<&SupportedStreamConfigRange> {
    FORMAT_PREFERENCE.iter().find_map(|format| {
        configs
            .iter()
            .find(|c| c.sample_format() == *format && pred(c))
    })
}

/// State moved into the stream callback
///
/// The scratch buffer is allocated once here; the callback renders device
/// buffers through it in chunks of at most [`MAX_BUFFER_SIZE`] frames.
struct CallbackState {
    engine: MixerEngine,
    scratch: FrameBuffer,
}

impl CallbackState {
    fn new(engine: MixerEngine) -> Self {
        Self {
            engine,
            scratch: FrameBuffer::silence(MAX_BUFFER_SIZE),
        }
    }

    /// Render into an interleaved device buffer with `channels` channels
    fn fill<T>(&mut self, data: &mut [T], channels: usize)
    where
        T: Sample + FromSample<i16>,
    {
        for chunk in data.chunks_mut(MAX_BUFFER_SIZE * channels) {
            let frames = chunk.len() / channels;
            let out = &mut self.scratch.as_mut_slice()[..frames];
            self.engine.process(out);
            write_frames(out, chunk, channels);
        }
    }
}

/// Copy mixed frames into an interleaved device buffer
///
/// Mono devices get the downmix; channels past the first two are silent.
/// Device frames with no source frame are filled with silence.
fn write_frames<T>(src: &[StereoFrame], dst: &mut [T], channels: usize)
where
    T: Sample + FromSample<i16>,
{
    for (i, frame) in dst.chunks_mut(channels).enumerate() {
        let Some(sample) = src.get(i) else {
            frame.fill(T::EQUILIBRIUM);
            continue;
        };

        if frame.len() == 1 {
            frame[0] = T::from_sample(sample.downmix());
            continue;
        }

        frame[0] = T::from_sample(sample.left);
        frame[1] = T::from_sample(sample.right);
        for ch in frame.iter_mut().skip(2) {
            *ch = T::EQUILIBRIUM;
        }
    }
}

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut state: CallbackState,
) -> AudioResult<Stream>
where
    T: SizedSample + FromSample<i16>,
{
    let channels = (config.channels as usize).max(1);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
                state.fill(data, channels);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None, // No timeout (blocking)
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mixer_channel;
    use crate::types::SoundStream;
    use cpal::{SampleRate, SupportedBufferSize};

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn test_prefers_i16_stereo() {
        let configs = [
            range(2, 8000, 96000, SampleFormat::F32),
            range(1, 8000, 96000, SampleFormat::I16),
            range(2, 8000, 96000, SampleFormat::I16),
        ];
        let chosen = choose_config(&configs, 44100).unwrap();
        assert_eq!(chosen.sample_format(), SampleFormat::I16);
        assert_eq!(chosen.channels(), 2);
        assert_eq!(chosen.sample_rate().0, 44100);
    }

    #[test]
    fn test_falls_back_to_f32() {
        let configs = [
            range(2, 8000, 96000, SampleFormat::I32),
            range(2, 8000, 96000, SampleFormat::F32),
        ];
        let chosen = choose_config(&configs, 48000).unwrap();
        assert_eq!(chosen.sample_format(), SampleFormat::F32);
    }

    #[test]
    fn test_rate_fallback_uses_device_maximum() {
        let configs = [range(2, 8000, 32000, SampleFormat::I16)];
        let chosen = choose_config(&configs, 44100).unwrap();
        assert_eq!(chosen.sample_rate().0, 32000);
    }

    #[test]
    fn test_unsupported_formats_rejected() {
        let configs = [range(2, 8000, 96000, SampleFormat::I32)];
        assert!(matches!(
            choose_config(&configs, 44100),
            Err(AudioError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            choose_config(&[], 44100),
            Err(AudioError::ConfigError(_))
        ));
    }

    #[test]
    fn test_write_frames_layouts() {
        let src = [StereoFrame::new(100, -100), StereoFrame::new(7, 9)];

        let mut stereo = [1i16; 4];
        write_frames(&src, &mut stereo, 2);
        assert_eq!(stereo, [100, -100, 7, 9]);

        let mut mono = [1i16; 2];
        write_frames(&src, &mut mono, 1);
        assert_eq!(mono, [0, 8]);

        let mut quad = [1i16; 8];
        write_frames(&src, &mut quad, 4);
        assert_eq!(quad, [100, -100, 0, 0, 7, 9, 0, 0]);

        // Device frames beyond the source are silent
        let mut long = [1i16; 6];
        write_frames(&src, &mut long, 2);
        assert_eq!(&long[4..], &[0, 0]);
    }

    #[test]
    fn test_write_frames_converts_to_float() {
        let src = [StereoFrame::new(i16::MIN, 0)];
        let mut out = [1.0f32; 2];
        write_frames(&src, &mut out, 2);
        assert_eq!(out[0], -1.0);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn test_callback_renders_in_chunks() {
        let (mut controller, engine) = mixer_channel(4);
        let mut state = CallbackState::new(engine);

        let frames = vec![StereoFrame::mono(5); 8];
        controller
            .add(SoundStream::from_frames(&frames), true, true)
            .unwrap();

        // Larger than one scratch chunk
        let mut data = vec![0i16; (MAX_BUFFER_SIZE + 10) * 2];
        state.fill(&mut data, 2);

        assert!(data.iter().all(|&s| s == 5));
        assert_eq!(controller.atomics().quanta_rendered(), 2);
    }
}
