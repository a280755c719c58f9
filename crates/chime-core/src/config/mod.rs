//! Configuration for the mixer
//!
//! - YAML loading/saving with fallback to defaults
//! - [`MixerConfig`]: pool capacity, command queue size and audio output,
//!   clamped to usable values on load
//! - The default config file location
//!
//! # Usage
//!
//! ```ignore
//! use chime_core::config::{default_config_path, load_mixer_config, save_config};
//!
//! let path = default_config_path();
//! let config = load_mixer_config(&path);
//! save_config(&config, &path)?;
//! ```

mod io;
mod mixer;
mod paths;

pub use io::{load_config, load_mixer_config, save_config};
pub use mixer::{MixerConfig, MAX_CHANNELS_LIMIT, MAX_COMMAND_QUEUE_CAPACITY};
pub use paths::default_config_path;
