//! Visualization collaborator contract.
//!
//! The canvas draws nodes and wires; it never originates graph truth. The
//! workspace notifies it after each committed mutation. Hosts that render
//! nothing (headless tools, tests) use [`NullView`].

use crate::connection::ConnectionId;
use crate::device::DeviceId;

/// A drawn wire, as handed to the visualization collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireInfo {
    /// The connection behind the wire.
    pub id: ConnectionId,
    /// Source device id.
    pub source: DeviceId,
    /// Target device id.
    pub target: DeviceId,
    /// Wire label, `"<outlet label> -> <inlet label>"`.
    pub label: String,
}

/// Visualization collaborator.
pub trait CanvasView {
    /// A device was registered; draw its node.
    fn device_added(&mut self, id: &DeviceId, label: &str);

    /// A device was removed; remove its node.
    fn device_removed(&mut self, id: &DeviceId);

    /// A connection was recorded; draw its wire.
    fn wire_drawn(&mut self, wire: &WireInfo);

    /// A connection was removed; remove its wire.
    fn wire_removed(&mut self, id: ConnectionId);
}

/// View that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullView;

impl CanvasView for NullView {
    fn device_added(&mut self, _id: &DeviceId, _label: &str) {}
    fn device_removed(&mut self, _id: &DeviceId) {}
    fn wire_drawn(&mut self, _wire: &WireInfo) {}
    fn wire_removed(&mut self, _id: ConnectionId) {}
}
