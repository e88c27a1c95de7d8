//! Snapshot wire format and workspace capture.
//!
//! A snapshot is a pure value: the full topology (devices, positions,
//! control text, connections) with every live handle stripped, so it
//! round-trips through JSON with no audio or canvas context. The field
//! layout is the persisted format and is pinned by tests; in particular a
//! connection's fan-out splitter is a live routing handle and must never
//! appear in the serialized form, which the record types guarantee by
//! simply not carrying it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use patchbay_core::Workspace;

use crate::error::StateError;

/// One persisted connection: the edge tuple minus the routing handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// The connection's unique token at save time. Restored workspaces mint
    /// fresh tokens; this one is informational.
    pub id: u64,
    /// Target device id at save time.
    pub target: String,
    /// Source outlet index.
    pub output: usize,
    /// Target inlet index.
    pub input: usize,
}

/// One persisted device: identity, position, outgoing edges, control text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device id at save time; its prefix names the kind to re-create.
    pub id: String,
    /// Canvas position, left style string.
    pub left: String,
    /// Canvas position, top style string.
    pub top: String,
    /// Outgoing connections, in creation order.
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    /// Raw control text per control name.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

/// A serializable snapshot of an entire workspace.
///
/// Device records appear in registration order; connections appear on their
/// source device in creation order. No global connection ordering across
/// devices is guaranteed, or needed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceSnapshot(pub Vec<DeviceRecord>);

impl WorkspaceSnapshot {
    /// Captures the committed state of a workspace. Pure read: no mutation,
    /// and the transient connection gesture is never included.
    pub fn capture(workspace: &Workspace) -> Self {
        let records = workspace
            .devices()
            .map(|device| {
                let (left, top) = device.position();
                DeviceRecord {
                    id: device.id().to_string(),
                    left: left.to_string(),
                    top: top.to_string(),
                    connections: device
                        .connections()
                        .iter()
                        .map(|conn| ConnectionRecord {
                            id: conn.id().value(),
                            target: conn.target().to_string(),
                            output: conn.output(),
                            input: conn.input(),
                        })
                        .collect(),
                    inputs: device.controls().clone(),
                }
            })
            .collect();
        Self(records)
    }

    /// The device records, in registration order.
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.0
    }

    /// Number of device records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot holds no devices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes to the compact JSON wire form.
    pub fn to_json(&self) -> Result<String, StateError> {
        serde_json::to_string(self).map_err(StateError::Serialize)
    }

    /// Serializes to pretty-printed JSON (the file-channel form).
    pub fn to_json_pretty(&self) -> Result<String, StateError> {
        serde_json::to_string_pretty(self).map_err(StateError::Serialize)
    }

    /// Parses a snapshot from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        serde_json::from_str(json).map_err(StateError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_core::mock::{MockFactory, MockRouting};
    use patchbay_core::{ModuleDescriptor, PortDescriptor};

    fn built_workspace() -> Workspace {
        let mut factory = MockFactory::default();
        factory.add_module(ModuleDescriptor {
            name: "osc".to_string(),
            outlets: vec![PortDescriptor::new(0, "out")],
            inlets: vec![PortDescriptor::new(0, "in")],
            output_channels: 1,
            data_buffer: None,
        });
        let mut ws = Workspace::new(Box::new(MockRouting::default()));
        let osc = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();
        ws.set_position(&osc, "100px", "60px");
        ws.set_control(&osc, "frequency", "440").unwrap();
        ws.start_connection(&osc, 0);
        ws.finish_connection(&sink, 2).unwrap();
        ws
    }

    #[test]
    fn capture_reflects_topology() {
        let ws = built_workspace();
        let snapshot = WorkspaceSnapshot::capture(&ws);

        assert_eq!(snapshot.len(), 2);
        let osc = &snapshot.devices()[0];
        assert_eq!(osc.id, "osc-0");
        assert_eq!(osc.left, "100px");
        assert_eq!(osc.top, "60px");
        assert_eq!(osc.inputs.get("frequency").map(String::as_str), Some("440"));
        assert_eq!(osc.connections.len(), 1);
        assert_eq!(osc.connections[0].target, "outputnode-0");
        assert_eq!(osc.connections[0].output, 0);
        assert_eq!(osc.connections[0].input, 2);

        let sink = &snapshot.devices()[1];
        assert_eq!(sink.id, "outputnode-0");
        assert!(sink.connections.is_empty());
        assert_eq!(
            sink.inputs.get("output_channel").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn wire_format_field_names_are_pinned() {
        let ws = built_workspace();
        let json = WorkspaceSnapshot::capture(&ws).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let devices = value.as_array().unwrap();
        let osc = &devices[0];
        for field in ["id", "left", "top", "connections", "inputs"] {
            assert!(osc.get(field).is_some(), "missing field {field}");
        }
        let conn = &osc["connections"][0];
        for field in ["id", "target", "output", "input"] {
            assert!(conn.get(field).is_some(), "missing field {field}");
        }
        assert!(conn["id"].is_number());
        assert!(conn["target"].is_string());
    }

    #[test]
    fn splitter_never_appears_in_serialized_form() {
        let ws = built_workspace();
        let json = WorkspaceSnapshot::capture(&ws).to_json().unwrap();
        assert!(!json.contains("splitter"));
    }

    #[test]
    fn json_roundtrip_preserves_records() {
        let ws = built_workspace();
        let snapshot = WorkspaceSnapshot::capture(&ws);
        let parsed = WorkspaceSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn missing_optional_fields_default() {
        let parsed =
            WorkspaceSnapshot::from_json(r#"[{"id":"osc-0","left":"0px","top":"0px"}]"#).unwrap();
        assert!(parsed.devices()[0].connections.is_empty());
        assert!(parsed.devices()[0].inputs.is_empty());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(
            WorkspaceSnapshot::from_json("{nope"),
            Err(StateError::Decode(_))
        ));
    }
}
