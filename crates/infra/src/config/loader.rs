//! Configuration loader
//!
//! Reads a [`PortalConfig`] from a YAML file.
//!
//! ## File Locations
//! With no explicit path the loader probes, in order:
//! 1. `./qcportal_config.yaml` (current working directory)
//! 2. `~/.qca/qcportal_config.yaml`
//!
//! An explicit path may name the file itself or a directory containing
//! `qcportal_config.yaml`. A leading `~` is expanded to the home directory.

use std::path::{Path, PathBuf};

use qcportal_domain::constants::{CONFIG_FILE_NAME, CONFIG_HOME_DIR};
use qcportal_domain::{PortalConfig, PortalError, Result};

/// Load configuration from a file
///
/// # Errors
/// Returns `PortalError::Config` if:
/// - The given path (or its `qcportal_config.yaml`) does not exist
/// - No config file exists in any probed location; the message lists them
/// - The YAML is invalid or `address` is missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<PortalConfig> {
    let config_path = match path {
        Some(p) => {
            let p = expand_home(&p, dirs::home_dir().as_deref());
            let p = if p.is_dir() { p.join(CONFIG_FILE_NAME) } else { p };
            if !p.exists() {
                return Err(PortalError::Config(format!("config file not found: {}", p.display())));
            }
            p
        }
        None => {
            let candidates = default_candidates();
            candidates.iter().find(|p| p.exists()).cloned().ok_or_else(|| {
                let searched: Vec<String> =
                    candidates.iter().map(|p| p.display().to_string()).collect();
                PortalError::Config(format!(
                    "no {CONFIG_FILE_NAME} found; searched: {}",
                    searched.join(", ")
                ))
            })?
        }
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| {
            PortalError::Config(format!("failed to read {}: {e}", config_path.display()))
        })?;

    parse_config(&contents, &config_path)
}

/// Parse YAML configuration
///
/// `path` is only used in error messages.
pub fn parse_config(contents: &str, path: &Path) -> Result<PortalConfig> {
    serde_yaml::from_str(contents).map_err(|e| {
        PortalError::Config(format!("invalid configuration in {}: {e}", path.display()))
    })
}

/// Locations probed when no path is given, in priority order
pub fn candidate_paths(cwd: Option<&Path>, home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(cwd) = cwd {
        candidates.push(cwd.join(CONFIG_FILE_NAME));
    }
    if let Some(home) = home {
        candidates.push(home.join(CONFIG_HOME_DIR).join(CONFIG_FILE_NAME));
    }
    candidates
}

/// Replace a leading `~` component with `home`
///
/// Paths without one, or any path when `home` is unknown, are returned
/// unchanged.
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let cwd = std::env::current_dir().ok();
    let home = dirs::home_dir();
    candidate_paths(cwd.as_deref(), home.as_deref())
}
