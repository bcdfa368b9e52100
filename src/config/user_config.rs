//! User-level configuration
//!
//! Read from `<config_dir>/shipready/config.toml` (for example
//! `~/.config/shipready/config.toml` on Linux). Uses the same schema as a
//! project config and sits just above the built-in defaults.

use super::project_config::{load_config_file, ConfigFile};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Get the user config file path
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("shipready").join("config.toml"))
}

/// Load the user config, if there is one and it parses
pub fn load_user_config() -> Option<ConfigFile> {
    let path = user_config_path().filter(|p| p.is_file())?;
    match load_config_file(&path) {
        Ok(config) => {
            debug!("Loaded user config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            warn!("Ignoring user config: {}", e);
            None
        }
    }
}
