//! Standard location of the mixer configuration file

use std::path::PathBuf;

/// Directory name under the platform config directory
const APP_DIR: &str = "chime";

/// Get the default config file path
///
/// Returns `<config dir>/chime/config.yaml`, e.g. `~/.config/chime/config.yaml`
/// on Linux. Falls back to the working directory when the platform has no
/// config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.yaml")
}
