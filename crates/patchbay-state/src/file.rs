//! File export/import channel.
//!
//! The write side produces the pretty-printed JSON the export download
//! contains; the read side parses a user-selected file. Both carry the
//! path in their errors.

use std::path::Path;

use crate::error::StateError;
use crate::snapshot::WorkspaceSnapshot;

/// Default name for an exported workspace file.
pub const DEFAULT_EXPORT_NAME: &str = "workspace_state.json";

/// Writes a snapshot to a file as pretty-printed JSON.
pub fn save_to_file(path: impl AsRef<Path>, snapshot: &WorkspaceSnapshot) -> Result<(), StateError> {
    let path = path.as_ref();
    let json = snapshot.to_json_pretty()?;
    std::fs::write(path, json).map_err(|err| StateError::write_file(path, err))
}

/// Reads and parses a snapshot from a file.
///
/// # Errors
///
/// [`StateError::ReadFile`] when the file cannot be read, a decode error
/// when its contents do not parse.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<WorkspaceSnapshot, StateError> {
    let path = path.as_ref();
    let json =
        std::fs::read_to_string(path).map_err(|err| StateError::read_file(path, err))?;
    WorkspaceSnapshot::from_json(&json)
}
