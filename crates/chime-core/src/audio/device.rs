//! Output device enumeration
//!
//! Devices are collected from every available host so a device can be
//! picked under a specific backend (e.g. ALSA next to PulseAudio on Linux).

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId, SampleFormat};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Sample rates reported when they fall inside a device's supported range
const COMMON_SAMPLE_RATES: [u32; 4] = [22050, 44100, 48000, 96000];

/// Human-readable name for a host ID
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

fn get_host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|id| host_name(*id) == name)
        .and_then(|id| cpal::host_from_id(id).ok())
}

/// Information about an audio output device
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Identifier to put in the configuration
    pub id: DeviceId,
    pub name: String,
    pub host: String,
    /// Whether this is the default device of its host
    pub is_default: bool,
    /// Common sample rates the device supports
    pub sample_rates: Vec<u32>,
    pub max_channels: u16,
    /// Whether the device accepts 16-bit samples without conversion
    pub supports_i16: bool,
}

impl std::fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.host, self.name)?;
        if self.is_default {
            write!(f, " (default)")?;
        }
        Ok(())
    }
}

/// All output devices from all hosts, default devices first
pub fn get_output_devices() -> AudioResult<Vec<AudioDevice>> {
    let mut devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_label = host_name(host_id);
        let default_name = host
            .default_output_device()
            .and_then(|d: cpal::Device| d.name().ok());

        let outputs = match host.output_devices() {
            Ok(d) => d,
            Err(e) => {
                log::debug!("Could not enumerate devices for {:?}: {}", host_id, e);
                continue;
            }
        };

        for device in outputs {
            let Ok(name) = device.name() else { continue };
            let Ok(configs) = device.supported_output_configs() else {
                continue;
            };
            let configs: Vec<_> = configs.collect();
            if configs.is_empty() {
                continue;
            }

            let max_channels = configs.iter().map(|c| c.channels()).max().unwrap_or(0);
            let supports_i16 = configs
                .iter()
                .any(|c| c.sample_format() == SampleFormat::I16);
            let sample_rates = COMMON_SAMPLE_RATES
                .into_iter()
                .filter(|rate| {
                    configs.iter().any(|c| {
                        *rate >= c.min_sample_rate().0 && *rate <= c.max_sample_rate().0
                    })
                })
                .collect();

            devices.push(AudioDevice {
                id: DeviceId::with_host(&name, &host_label),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                host: host_label.clone(),
                sample_rates,
                max_channels,
                supports_i16,
            });
        }
    }

    if devices.is_empty() {
        return Err(AudioError::NoDevices);
    }

    devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.host.cmp(&b.host))
            .then_with(|| a.name.cmp(&b.name))
    });

    log::debug!("Enumerated {} audio output devices", devices.len());
    Ok(devices)
}

/// The default output device, or the first one found
pub fn get_default_device() -> AudioResult<AudioDevice> {
    get_output_devices()?
        .into_iter()
        .next()
        .ok_or_else(|| AudioError::NoDefaultDevice("No output devices available".to_string()))
}

/// Find a device by its ID
///
/// Uses the host named in the ID when it exists, otherwise searches all
/// hosts by device name.
pub fn find_device_by_id(id: &DeviceId) -> AudioResult<cpal::Device> {
    if let Some(host) = id.host.as_deref().and_then(get_host_by_name) {
        return host
            .output_devices()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?
            .find(|d: &cpal::Device| d.name().ok().as_ref() == Some(&id.name))
            .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()));
    }

    cpal::available_hosts()
        .into_iter()
        .filter_map(|host_id| cpal::host_from_id(host_id).ok())
        .filter_map(|host| host.output_devices().ok())
        .flatten()
        .find(|d: &cpal::Device| d.name().ok().as_ref() == Some(&id.name))
        .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()))
}

/// The default output device of the default host
pub fn default_output_device() -> AudioResult<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::NoDefaultDevice("No default output device".to_string()))
}
