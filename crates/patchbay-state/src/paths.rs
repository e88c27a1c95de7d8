//! Platform-specific paths for persisted workspace state.
//!
//! The on-disk key-value store ([`FsStore`](crate::FsStore)) defaults to a
//! per-user directory here:
//!
//! - Linux: `~/.config/patchbay/`
//! - macOS: `~/Library/Application Support/patchbay/`
//! - Windows: `%APPDATA%\patchbay\`

use std::path::PathBuf;

use crate::error::StateError;

/// Application name used for directory paths.
const APP_NAME: &str = "patchbay";

/// Returns the user-specific state directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_state_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Ensure the user state directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_state_dir() -> Result<PathBuf, StateError> {
    let dir = user_state_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| StateError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dir_is_under_the_app_name() {
        let dir = user_state_dir();
        assert!(dir.to_string_lossy().contains("patchbay"));
    }
}
