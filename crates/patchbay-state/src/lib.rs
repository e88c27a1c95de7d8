//! Workspace snapshot codec and persistence channels for patchbay.
//!
//! This crate turns a live [`Workspace`](patchbay_core::Workspace) into a
//! portable [`WorkspaceSnapshot`] and back:
//!
//! - **Capture** — [`WorkspaceSnapshot::capture`] reads devices, positions,
//!   control text, and connections into a pure JSON-serializable value;
//!   live routing handles are stripped by construction.
//! - **Restore** — [`restore`] re-creates devices in record order through a
//!   [`DeviceFactory`](patchbay_core::DeviceFactory), then replays every
//!   connection as if the wires were drawn by hand. The outcome, including
//!   any partial failure, comes back as a [`RestoreReport`].
//! - **Channels** — three transports feed the codec: a key-value
//!   [`StorageChannel`] (with [`MemoryStore`] and [`FsStore`]), file
//!   export/import ([`save_to_file`]/[`load_from_file`]), and a compressed
//!   URL parameter for shareable links ([`state_from_query`]).
//! - **Autosave** — an interval-gated [`Autosave`] ticker the host event
//!   loop drives.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::Workspace;
//! use patchbay_core::mock::{MockFactory, MockRouting};
//! use patchbay_state::{WorkspaceSnapshot, restore};
//!
//! let mut factory = MockFactory::default();
//! let mut workspace = Workspace::new(Box::new(MockRouting::default()));
//! workspace.add_device(&mut factory, "outputnode").unwrap();
//!
//! let snapshot = WorkspaceSnapshot::capture(&workspace);
//!
//! let mut rebuilt = Workspace::new(Box::new(MockRouting::default()));
//! let report = restore(&mut rebuilt, &mut factory, &snapshot);
//! assert!(report.is_complete());
//! assert_eq!(rebuilt.device_count(), 1);
//! ```

/// Periodic autosave driver.
pub mod autosave;
mod error;
/// File export/import channel.
pub mod file;
/// Platform-specific state paths.
pub mod paths;
mod restore;
mod snapshot;
/// Key-value storage channel.
pub mod store;
/// Compressed URL parameter channel.
pub mod url;

pub use autosave::{AUTOSAVE_INTERVAL, Autosave};
pub use error::StateError;
pub use file::{DEFAULT_EXPORT_NAME, load_from_file, save_to_file};
pub use paths::{ensure_user_state_dir, user_state_dir};
pub use restore::{RestoreFailure, RestoreReport, restore};
pub use snapshot::{ConnectionRecord, DeviceRecord, WorkspaceSnapshot};
pub use store::{FsStore, MemoryStore, STORAGE_KEY, StateStore, StorageChannel};
pub use url::{STATE_PARAM, decode_state_param, encode_state_param, state_from_query};
