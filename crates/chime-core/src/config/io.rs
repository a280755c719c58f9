//! Reading and writing the YAML config file
//!
//! A missing or broken file never keeps the mixer from starting: the loader
//! logs what went wrong and falls back to defaults. [`load_mixer_config`]
//! also clamps values the mixer cannot run with.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::mixer::MixerConfig;

/// Load a YAML config, or `T::default()` if the file is missing or invalid
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match read_yaml(path) {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Ok(None) => {
            log::info!("No config at {}, using defaults", path.display());
            T::default()
        }
        Err(e) => {
            log::warn!("Ignoring config at {}: {:#}", path.display(), e);
            T::default()
        }
    }
}

/// `Ok(None)` when the file does not exist
fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context("Failed to read config file"),
    };
    serde_yaml::from_str(&contents)
        .map(Some)
        .context("Failed to parse config YAML")
}

/// Load the mixer config and clamp it to values the mixer accepts
///
/// Every adjusted field is logged at `warn!`; see [`MixerConfig::sanitize`].
pub fn load_mixer_config(path: &Path) -> MixerConfig {
    let mut config: MixerConfig = load_config(path);
    config.sanitize();
    config
}

/// Write `config` as YAML, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;

    log::debug!("Saved config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BufferSize;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_mixer_config(&dir.path().join("absent.yaml"));
        assert_eq!(config, MixerConfig::default());
    }

    #[test]
    fn test_unparsable_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "max_channels: [8").unwrap();

        assert_eq!(load_mixer_config(&path), MixerConfig::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "max_channels: 0\ncommand_queue_capacity: 0\naudio:\n  buffer_size: !Fixed 8\n  sample_rate: 0\n",
        )
        .unwrap();

        let config = load_mixer_config(&path);
        assert_eq!(config.max_channels, 1);
        assert_eq!(config.command_queue_capacity, 1);
        assert_eq!(config.audio.buffer_size, BufferSize::Fixed(64));
        assert_eq!(config.audio.sample_rate, None);

        // The generic loader leaves values as written
        let raw: MixerConfig = load_config(&path);
        assert_eq!(raw.max_channels, 0);
    }

    #[test]
    fn test_save_creates_directories_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chime").join("config.yaml");

        let config = MixerConfig {
            max_channels: 12,
            ..MixerConfig::default()
        };
        save_config(&config, &path).unwrap();

        assert_eq!(load_mixer_config(&path), config);
    }
}
