//! Snapshot replay: rebuilding a live workspace from records.
//!
//! Restore re-creates devices strictly in record order (kind recovered from
//! each record id's prefix), re-applies position and control text, and maps
//! old ids to the freshly minted ones. Connections are replayed only after
//! every device exists, by driving the same `start_connection` /
//! `finish_connection` path a user gesture takes, so forward references to
//! not-yet-created targets never occur.
//!
//! Restore is deliberately not transactional. On a device-creation failure
//! it stops: devices created so far stay registered, the remaining records
//! and the connection replay are skipped, and the whole outcome is returned
//! as a [`RestoreReport`] so the host can decide what to tell the user.

use std::collections::HashMap;

use thiserror::Error;

use patchbay_core::{DeviceError, DeviceFactory, DeviceId, Workspace, kind_prefix};

use crate::snapshot::{ConnectionRecord, WorkspaceSnapshot};

/// The first device-creation failure of a restore.
#[derive(Debug, Error)]
#[error("failed to restore device '{record}': {source}")]
pub struct RestoreFailure {
    /// Id of the record whose device could not be created.
    pub record: String,
    /// The factory error.
    #[source]
    pub source: DeviceError,
}

/// Outcome of a restore: what was rebuilt and what was not.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Devices created, in record order, with their fresh ids.
    pub devices: Vec<DeviceId>,
    /// Connections successfully replayed.
    pub connections: usize,
    /// Record ids skipped after a failure, in record order.
    pub skipped: Vec<String>,
    /// The failure that stopped device creation, if any.
    pub failure: Option<RestoreFailure>,
}

impl RestoreReport {
    /// Whether every record was restored.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.skipped.is_empty()
    }
}

/// Replays a snapshot into a workspace.
///
/// Devices are created one at a time, in record order; the factory call for
/// the next record starts only after the previous one returned, so the
/// old-to-new id correspondence is complete before any connection is
/// replayed. Restoring into a non-empty workspace adds to it, exactly as
/// replaying the gestures by hand would.
pub fn restore(
    workspace: &mut Workspace,
    factory: &mut dyn DeviceFactory,
    snapshot: &WorkspaceSnapshot,
) -> RestoreReport {
    let mut report = RestoreReport::default();
    let mut id_map: HashMap<&str, DeviceId> = HashMap::new();
    let mut edges: Vec<(&str, &ConnectionRecord)> = Vec::new();

    for (position, record) in snapshot.devices().iter().enumerate() {
        let kind = kind_prefix(&record.id);
        match workspace.add_device(factory, kind) {
            Ok(id) => {
                workspace.set_position(&id, &record.left, &record.top);
                for (control, text) in &record.inputs {
                    // Unparseable control text is logged by the workspace
                    // and kept as raw state; it must not stop the restore.
                    let _ = workspace.set_control(&id, control, text);
                }
                id_map.insert(record.id.as_str(), id.clone());
                edges.extend(
                    record
                        .connections
                        .iter()
                        .map(|conn| (record.id.as_str(), conn)),
                );
                report.devices.push(id);
            }
            Err(source) => {
                tracing::error!(record = %record.id, error = %source, "device re-creation failed, restore stopped");
                report.failure = Some(RestoreFailure {
                    record: record.id.clone(),
                    source,
                });
                report.skipped = snapshot.devices()[position..]
                    .iter()
                    .map(|r| r.id.clone())
                    .collect();
                // Devices created so far stay registered; the connection
                // replay is skipped along with the remaining records.
                return report;
            }
        }
    }

    for (source_old, conn) in edges {
        let (Some(source), Some(target)) = (
            id_map.get(source_old),
            id_map.get(conn.target.as_str()),
        ) else {
            tracing::warn!(
                source = source_old,
                target = %conn.target,
                "connection record with dangling endpoint skipped"
            );
            continue;
        };
        workspace.start_connection(source, conn.output);
        if workspace.finish_connection(target, conn.input).is_some() {
            report.connections += 1;
        }
    }

    report
}
