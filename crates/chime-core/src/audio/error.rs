//! Errors from opening the output stream

use thiserror::Error;

/// Why the mixer's output stream could not be opened or started
///
/// All of these happen on the control thread during
/// [`start_audio_system`](super::start_audio_system); once the stream runs,
/// device errors only reach the log.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No host reported a usable output device
    #[error("No audio output devices found")]
    NoDevices,

    /// The default host has no default output
    #[error("No default output device: {0}")]
    NoDefaultDevice(String),

    /// The configured [`DeviceId`](super::DeviceId) matched nothing
    #[error("Output device not found: {0}")]
    DeviceNotFound(String),

    /// The device's stream configurations could not be queried or were empty
    #[error("Could not configure output device: {0}")]
    ConfigError(String),

    #[error("Could not open output stream: {0}")]
    StreamBuildError(String),

    #[error("Could not start output stream: {0}")]
    StreamPlayError(String),

    /// The device offers none of i16, f32 or u16 samples
    #[error("No supported sample format (device offers: {0})")]
    UnsupportedFormat(String),
}

pub type AudioResult<T> = Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_detail() {
        let err = AudioError::UnsupportedFormat("I32, F64".to_string());
        assert_eq!(err.to_string(), "No supported sample format (device offers: I32, F64)");
        assert_eq!(
            AudioError::DeviceNotFound("[ALSA] hw:9".to_string()).to_string(),
            "Output device not found: [ALSA] hw:9"
        );
    }
}
