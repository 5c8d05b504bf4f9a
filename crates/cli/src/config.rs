//! Activation config lookup for the CLI

use anyhow::{bail, Context, Result};
use ddu_lib::{ActivationConfig, ConfigError, EndpointConfig};
use std::path::{Path, PathBuf};

/// Resolve the activation document path
///
/// An explicit path wins, otherwise `~/.config/ddu/activation.json`.
pub fn activation_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }

    let home = dirs_next::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("ddu").join("activation.json"))
}

/// Load every endpoint entry, valid or not
pub fn load_entries(path: &Path) -> Result<Vec<Result<EndpointConfig, ConfigError>>> {
    let activation = ActivationConfig::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(activation.endpoints())
}

/// Valid endpoints, optionally narrowed to one index
pub fn select_endpoints(
    entries: Vec<Result<EndpointConfig, ConfigError>>,
    only: Option<usize>,
) -> Result<Vec<EndpointConfig>> {
    if let Some(index) = only {
        return match entries.into_iter().nth(index) {
            Some(Ok(endpoint)) => Ok(vec![endpoint]),
            Some(Err(e)) => Err(e.into()),
            None => bail!("No endpoint with index {}", index),
        };
    }

    let endpoints: Vec<EndpointConfig> = entries.into_iter().filter_map(Result::ok).collect();
    if endpoints.is_empty() {
        bail!("No valid endpoints configured");
    }
    Ok(endpoints)
}
