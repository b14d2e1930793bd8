//! Path management for Circle Wallet
//!
//! ## Path Resolution Order
//!
//! 1. `CIRCLE_WALLET_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/circle-wallet` or `~/.config/circle-wallet`
//! 3. Windows: `%APPDATA%\circle-wallet`

use std::path::PathBuf;

use crate::error::CircleError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "CIRCLE_WALLET_DATA_DIR";

/// Manages all paths used by Circle Wallet
#[derive(Debug, Clone)]
pub struct CirclePaths {
    base_dir: PathBuf,
}

impl CirclePaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home/config directory can be determined.
    pub fn new() -> Result<Self, CircleError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Use an explicit base directory (tests, `--data-dir`)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// `<base>/data/`
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn groups_file(&self) -> PathBuf {
        self.data_dir().join("groups.json")
    }

    pub fn families_file(&self) -> PathBuf {
        self.data_dir().join("families.json")
    }

    pub fn members_file(&self) -> PathBuf {
        self.data_dir().join("members.json")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    /// Advisory lock file serializing writers across processes
    pub fn lock_file(&self) -> PathBuf {
        self.data_dir().join(".lock")
    }

    /// Create the base and data directories
    pub fn ensure_directories(&self) -> Result<(), CircleError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| CircleError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| CircleError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// `circle init` has been run (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, CircleError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                CircleError::Config(format!(
                    "HOME is not set; set {} to choose a data directory",
                    DATA_DIR_ENV
                ))
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("circle-wallet"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, CircleError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| CircleError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("circle-wallet"))
}
