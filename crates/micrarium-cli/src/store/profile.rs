//! Saved CLI configuration.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored connection settings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Slide store URL.
    pub store: Option<String>,
    /// Service API key (hosted stores).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Bearer access token for members-only slides (hosted stores).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Storage bucket serving slide media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

/// Get the config file path.
fn profile_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "micrarium").context("Could not determine config directory")?;

    let config_dir = dirs.config_dir();
    fs::create_dir_all(config_dir).context("Failed to create config directory")?;

    Ok(config_dir.join("config.json"))
}

/// Save the configuration to disk.
pub fn save(profile: &Profile) -> Result<()> {
    let path = profile_path()?;
    let json = serde_json::to_string_pretty(profile)?;

    fs::write(&path, &json).context("Failed to write config file")?;

    // The file may hold an API key; restrict permissions (Unix only)
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}

/// Load the saved configuration from disk.
pub fn load() -> Result<Option<Profile>> {
    let path = profile_path()?;

    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(&path).context("Failed to read config file")?;
    let profile: Profile = serde_json::from_str(&json).context("Invalid config file")?;

    Ok(Some(profile))
}

/// Delete the saved configuration.
pub fn clear() -> Result<()> {
    let path = profile_path()?;

    if path.exists() {
        fs::remove_file(&path).context("Failed to remove config file")?;
    }

    Ok(())
}
