//! Configuration and path resolution for the CLI.
//!
//! Everything privileged or deployment-specific comes from the environment:
//! - `FLARE_PASSCODE_SHA256` / `FLARE_SECRET`: the shared passcode
//! - `FLARE_NOMINATIM_URL`: geocoding service root
//! - `FLARE_PHONE_FORMAT`: `ten-digits` (default) or `north-american`

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use flare_core::form::PhoneFormat;
use flare_core::geocoding::NominatimConfig;
use flare_core::access::{AccessGate, Passcode};
use std::path::PathBuf;

/// Hex SHA-256 digest of the passcode. Takes precedence over the plaintext.
pub const PASSCODE_DIGEST_ENV: &str = "FLARE_PASSCODE_SHA256";

/// Plaintext passcode, hashed at startup.
pub const SECRET_ENV: &str = "FLARE_SECRET";

pub const NOMINATIM_URL_ENV: &str = "FLARE_NOMINATIM_URL";

pub const PHONE_FORMAT_ENV: &str = "FLARE_PHONE_FORMAT";

/// Returns the data directory holding the report file.
///
/// - macOS: `~/Library/Application Support/org.flare.Flare/`
/// - Linux: `~/.local/share/flare/`
/// - Windows: `%APPDATA%\flare\Flare\data\`
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    ProjectDirs::from("org", "flare", "Flare")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Builds the passcode gate from a digest or a plaintext secret.
///
/// Returns `None` when neither is set; privileged commands then fail with a
/// "not configured" error.
pub fn access_gate(digest_hex: Option<String>, secret: Option<String>) -> Result<Option<AccessGate>> {
    if let Some(digest) = non_empty(digest_hex) {
        let gate = AccessGate::from_digest_hex(&digest)
            .with_context(|| format!("Invalid {}", PASSCODE_DIGEST_ENV))?;
        return Ok(Some(gate));
    }
    Ok(non_empty(secret).map(|secret| AccessGate::from_secret(Passcode::new(secret))))
}

pub fn access_gate_from_env() -> Result<Option<AccessGate>> {
    access_gate(
        std::env::var(PASSCODE_DIGEST_ENV).ok(),
        std::env::var(SECRET_ENV).ok(),
    )
}

pub fn nominatim_config(base_url: Option<String>) -> NominatimConfig {
    match non_empty(base_url) {
        Some(base_url) => NominatimConfig {
            base_url,
            ..Default::default()
        },
        None => NominatimConfig::default(),
    }
}

pub fn nominatim_config_from_env() -> NominatimConfig {
    nominatim_config(std::env::var(NOMINATIM_URL_ENV).ok())
}

pub fn phone_format(value: Option<String>) -> Result<PhoneFormat> {
    match non_empty(value) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid {}", PHONE_FORMAT_ENV)),
        None => Ok(PhoneFormat::default()),
    }
}

pub fn phone_format_from_env() -> Result<PhoneFormat> {
    phone_format(std::env::var(PHONE_FORMAT_ENV).ok())
}
