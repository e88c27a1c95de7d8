//! Workspace: the connection graph over the device registry.
//!
//! A [`Workspace`] owns the registry and drives the two collaborators (the
//! signal-routing backend and the visualization canvas). All mutations are
//! synchronous and atomic with respect to the host's single event loop;
//! there is no interleaving hazard within one call.
//!
//! Wiring follows the two-step gesture the canvas produces: the host arms a
//! source outlet with [`start_connection`](Workspace::start_connection) and
//! lands it with [`finish_connection`](Workspace::finish_connection). At
//! most one gesture is armed at a time; arming again overwrites. Malformed
//! gestures (no armed source, vanished endpoint) are dropped silently, not
//! surfaced as errors. That leniency is carried over deliberately from the
//! canvas interaction model; harden it only with a product decision.

use crate::connection::{Connection, ConnectionId, ConnectionInfo, DeviceConnections};
use crate::device::{
    CreatedDevice, Device, DeviceError, DeviceFactory, DeviceId, DeviceKind, PATTERN_BUFFER,
};
use crate::expr::{self, ExprError};
use crate::registry::DeviceRegistry;
use crate::routing::{RouteTarget, SignalRouting};
use crate::view::{CanvasView, NullView, WireInfo};

/// The armed half of a wire drag.
#[derive(Clone, Debug)]
struct Pending {
    source: DeviceId,
    output: usize,
}

/// A patching workspace: device registry plus connection graph.
pub struct Workspace {
    registry: DeviceRegistry,
    routing: Box<dyn SignalRouting>,
    view: Box<dyn CanvasView>,
    pending: Option<Pending>,
    next_connection: u64,
}

impl Workspace {
    /// Creates a workspace over a routing collaborator, with no canvas.
    pub fn new(routing: Box<dyn SignalRouting>) -> Self {
        Self::with_view(routing, Box::new(NullView))
    }

    /// Creates a workspace with a visualization collaborator attached.
    pub fn with_view(routing: Box<dyn SignalRouting>, view: Box<dyn CanvasView>) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            routing,
            view,
            pending: None,
            next_connection: 0,
        }
    }

    // --- Device lifecycle ---

    /// Creates a device of the given kind through the factory and registers
    /// it. Returns the assigned id.
    ///
    /// # Errors
    ///
    /// Returns the factory's [`DeviceError`]; the workspace is unchanged.
    pub fn add_device(
        &mut self,
        factory: &mut dyn DeviceFactory,
        kind: &str,
    ) -> Result<DeviceId, DeviceError> {
        let created = factory.create(kind)?;
        let label = match &created {
            CreatedDevice::Module { descriptor, .. } => descriptor.name.clone(),
            CreatedDevice::Microphone { .. } => DeviceKind::Microphone.display_label().to_string(),
            CreatedDevice::Speaker => DeviceKind::Speaker.display_label().to_string(),
        };
        let id = self.registry.register(created);
        tracing::debug!(device = %id, "device registered");
        self.view.device_added(&id, &label);
        Ok(id)
    }

    /// Removes a device and all its incident connections, incoming and
    /// outgoing. Removing an unknown id is a no-op.
    ///
    /// Edge cleanup always precedes device removal: every incident
    /// connection is severed (tearing down its splitter and wire) before
    /// the device leaves the registry.
    pub fn remove_device(&mut self, id: &DeviceId) {
        if !self.registry.contains(id) {
            tracing::warn!(device = %id, "remove of unknown device ignored");
            return;
        }

        let incident: Vec<ConnectionId> = self
            .registry
            .devices()
            .flat_map(|device| {
                device
                    .connections
                    .iter()
                    .filter(|conn| device.id() == id || conn.target == *id)
                    .map(Connection::id)
            })
            .collect();
        for connection in incident {
            self.remove_connection(connection);
        }

        if let Some(device) = self.registry.unregister(id) {
            if let Some(unit) = device.unit {
                self.routing.remove_unit(unit);
            }
            self.view.device_removed(id);
            tracing::debug!(device = %id, "device removed");
        }
    }

    // --- Wiring gestures ---

    /// Arms a connection gesture at a source outlet, overwriting any gesture
    /// already armed. Index bounds are not validated here; validation is
    /// deferred to [`finish_connection`](Self::finish_connection).
    pub fn start_connection(&mut self, source: &DeviceId, output: usize) {
        self.pending = Some(Pending {
            source: source.clone(),
            output,
        });
    }

    /// Lands the armed gesture on a target inlet, recording a connection
    /// and wiring its fan-out splitter.
    ///
    /// With no gesture armed, or with either endpoint missing, this is a
    /// silent no-op that drops the gesture. Returns the new connection's id
    /// when one was recorded.
    pub fn finish_connection(&mut self, target: &DeviceId, input: usize) -> Option<ConnectionId> {
        let Pending { source, output } = self.pending.take()?;

        let Some(source_device) = self.registry.lookup(&source) else {
            tracing::warn!(source = %source, "gesture dropped: source no longer exists");
            return None;
        };
        let Some(source_unit) = source_device.unit else {
            tracing::warn!(source = %source, "gesture dropped: source has no audio output");
            return None;
        };
        let channels = source_device.output_channels;
        let outlet_label = source_device.outlet_label(output);

        let Some(target_device) = self.registry.lookup(target) else {
            tracing::warn!(target = %target, "gesture dropped: target does not exist");
            return None;
        };
        let route = match target_device.unit {
            Some(unit) => RouteTarget::Unit(unit),
            // The speaker sink is the shared merge bus.
            None => RouteTarget::SpeakerBus,
        };
        let inlet_label = target_device.inlet_label(input);

        // One splitter per connection, sized to the source's full channel
        // count, torn down with the connection.
        let splitter = self.routing.create_splitter(source_unit, channels);
        self.routing.connect(splitter, output, route, input);

        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;

        let wire = WireInfo {
            id,
            source: source.clone(),
            target: target.clone(),
            label: format!("{outlet_label} -> {inlet_label}"),
        };

        if let Some(device) = self.registry.lookup_mut(&source) {
            device.connections.push(Connection {
                id,
                target: target.clone(),
                output,
                input,
                splitter,
            });
        }
        self.view.wire_drawn(&wire);
        tracing::debug!(connection = %id, source = %source, target = %target, "connection recorded");
        Some(id)
    }

    /// Removes a connection, disconnecting its splitter from source and
    /// target. Removing an id that is already gone is a no-op.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        let mut located = None;
        for device in self.registry.devices() {
            if let Some(position) = device.connections.iter().position(|conn| conn.id == id) {
                located = Some((device.id().clone(), position));
                break;
            }
        }
        let Some((source, position)) = located else {
            tracing::debug!(connection = %id, "remove of unknown connection ignored");
            return;
        };

        let Some(device) = self.registry.lookup_mut(&source) else {
            return;
        };
        let connection = device.connections.remove(position);
        let source_unit = device.unit;

        let route = match self.registry.lookup(&connection.target) {
            Some(target) => target
                .unit
                .map_or(RouteTarget::SpeakerBus, RouteTarget::Unit),
            None => RouteTarget::SpeakerBus,
        };
        if let Some(unit) = source_unit {
            self.routing.disconnect(
                unit,
                connection.splitter,
                connection.output,
                route,
                connection.input,
            );
        }
        self.view.wire_removed(id);
        tracing::debug!(connection = %id, "connection removed");
    }

    /// Edges incident to a device. Outgoing edges come from the device's
    /// own list; incoming edges are found by scanning every other device's
    /// outgoing list. No reverse index is maintained, which is fine at
    /// workspace scale; a target-indexed adjacency map would be the first
    /// change if graphs grow large.
    pub fn connections_for_device(&self, id: &DeviceId) -> DeviceConnections {
        let mut result = DeviceConnections::default();
        for device in self.registry.devices() {
            for conn in &device.connections {
                let info = ConnectionInfo {
                    id: conn.id,
                    source: device.id().clone(),
                    target: conn.target.clone(),
                    output: conn.output,
                    input: conn.input,
                };
                if device.id() == id {
                    result.outgoing.push(info.clone());
                }
                if conn.target == *id {
                    result.incoming.push(info);
                }
            }
        }
        result
    }

    // --- Position and controls ---

    /// Moves a device to a new canvas position. Unknown ids are ignored.
    pub fn set_position(&mut self, id: &DeviceId, left: &str, top: &str) {
        if let Some(device) = self.registry.lookup_mut(id) {
            device.left = left.to_string();
            device.top = top.to_string();
        } else {
            tracing::warn!(device = %id, "position change for unknown device ignored");
        }
    }

    /// Stores control text on a device and applies it: the text is parsed
    /// through the restricted expression grammar and the values delivered to
    /// the device's unit.
    ///
    /// The raw text is stored even when parsing fails, matching the canvas
    /// behavior where the input keeps whatever was typed; the parse error is
    /// logged and returned. Controls on unit-less devices (the speaker's
    /// channel selector) are stored without delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError`] when the text does not parse.
    pub fn set_control(&mut self, id: &DeviceId, control: &str, text: &str) -> Result<(), ExprError> {
        let Some(device) = self.registry.lookup_mut(id) else {
            tracing::warn!(device = %id, "control change for unknown device ignored");
            return Ok(());
        };
        device.controls.insert(control.to_string(), text.to_string());
        self.apply_control(id, control)
    }

    /// Re-applies every stored control value on a device, triggering the
    /// same delivery a fresh edit would. This is the "regen" path, and how
    /// restore replays saved control values.
    pub fn refresh_controls(&mut self, id: &DeviceId) {
        let Some(device) = self.registry.lookup(id) else {
            return;
        };
        let controls: Vec<String> = device.controls.keys().cloned().collect();
        for control in controls {
            // Unparseable text was already logged when it was set.
            let _ = self.apply_control(id, &control);
        }
    }

    fn apply_control(&mut self, id: &DeviceId, control: &str) -> Result<(), ExprError> {
        let Some(device) = self.registry.lookup(id) else {
            return Ok(());
        };
        let (Some(unit), DeviceKind::Module { .. }) = (device.unit, &device.kind) else {
            // Synthetic kinds have no control inports; the value is state only.
            return Ok(());
        };
        let Some(text) = device.controls.get(control) else {
            return Ok(());
        };
        let prepend_len = device.data_buffer.as_deref() == Some(PATTERN_BUFFER);

        let mut values = match expr::parse_values(text) {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(device = %id, control, %err, "control value did not parse");
                return Err(err);
            }
        };
        if prepend_len {
            // Pattern modules reallocate their wavetable buffer from the
            // leading element, so the data is length-prefixed.
            values.insert(0, values.len() as f32);
        }
        self.routing.send_control(unit, control, &values);
        Ok(())
    }

    // --- Accessors ---

    /// The underlying registry.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Looks up a device by id.
    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.registry.lookup(id)
    }

    /// Live devices, in registration order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.registry.devices()
    }

    /// Number of live devices.
    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of live connections across all devices.
    pub fn connection_count(&self) -> usize {
        self.registry.devices().map(|d| d.connections.len()).sum()
    }

    /// Whether a connection gesture is currently armed.
    pub fn has_pending_connection(&self) -> bool {
        self.pending.is_some()
    }

    /// Channel count of the speaker merge bus, from the routing collaborator.
    pub fn speaker_channels(&self) -> usize {
        self.routing.speaker_channels()
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("devices", &self.registry.len())
            .field("connections", &self.connection_count())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ModuleDescriptor, PortDescriptor};
    use crate::mock::{MockFactory, MockRouting, MockView};

    fn workspace() -> (Workspace, MockFactory, MockRouting) {
        let routing = MockRouting::default();
        let ws = Workspace::new(Box::new(routing.clone()));
        (ws, MockFactory::default(), routing)
    }

    fn osc() -> ModuleDescriptor {
        ModuleDescriptor {
            name: "osc".to_string(),
            outlets: vec![PortDescriptor::new(0, "out")],
            inlets: vec![PortDescriptor::new(0, "in")],
            output_channels: 1,
            data_buffer: None,
        }
    }

    #[test]
    fn connect_module_to_speaker() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());

        let source = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();
        assert_eq!(source.as_str(), "osc-0");
        assert_eq!(sink.as_str(), "outputnode-0");

        ws.start_connection(&source, 0);
        let id = ws.finish_connection(&sink, 2).unwrap();

        let device = ws.device(&source).unwrap();
        assert_eq!(device.connections().len(), 1);
        let conn = &device.connections()[0];
        assert_eq!(conn.id(), id);
        assert_eq!(conn.target(), &sink);
        assert_eq!(conn.output(), 0);
        assert_eq!(conn.input(), 2);

        // The splitter exists iff the edge exists, routed onto the bus.
        assert_eq!(routing.live_splitters(), 1);
        assert!(routing.connected_to_bus(2));
    }

    #[test]
    fn finish_without_gesture_is_noop() {
        let (mut ws, mut factory, _routing) = workspace();
        factory.add_module(osc());
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();
        assert!(ws.finish_connection(&sink, 0).is_none());
        assert_eq!(ws.connection_count(), 0);
    }

    #[test]
    fn gesture_exclusivity_last_arm_wins() {
        let (mut ws, mut factory, _routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();
        let b = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();

        ws.start_connection(&a, 0);
        ws.start_connection(&b, 0);
        ws.finish_connection(&sink, 0).unwrap();

        assert_eq!(ws.device(&a).unwrap().connections().len(), 0);
        assert_eq!(ws.device(&b).unwrap().connections().len(), 1);
    }

    #[test]
    fn gesture_is_consumed_by_finish() {
        let (mut ws, mut factory, _routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();

        ws.start_connection(&a, 0);
        assert!(ws.has_pending_connection());
        ws.finish_connection(&sink, 0).unwrap();
        assert!(!ws.has_pending_connection());
        // A second finish with no armed gesture records nothing.
        assert!(ws.finish_connection(&sink, 0).is_none());
        assert_eq!(ws.connection_count(), 1);
    }

    #[test]
    fn gesture_to_missing_target_is_dropped() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();
        ws.start_connection(&a, 0);
        assert!(ws
            .finish_connection(&DeviceId::from_raw("outputnode-9"), 0)
            .is_none());
        assert!(!ws.has_pending_connection());
        assert_eq!(routing.live_splitters(), 0);
    }

    #[test]
    fn remove_connection_is_idempotent() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();
        ws.start_connection(&a, 0);
        let id = ws.finish_connection(&sink, 0).unwrap();

        ws.remove_connection(id);
        assert_eq!(ws.connection_count(), 0);
        assert_eq!(routing.live_splitters(), 0);
        // Second removal of the same id is a no-op.
        ws.remove_connection(id);
        assert_eq!(ws.connection_count(), 0);
    }

    #[test]
    fn removing_device_removes_exactly_incident_edges() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());
        factory.add_module(ModuleDescriptor {
            name: "filter".to_string(),
            outlets: vec![PortDescriptor::new(0, "out")],
            inlets: vec![PortDescriptor::new(0, "in")],
            output_channels: 1,
            data_buffer: None,
        });

        let a = ws.add_device(&mut factory, "osc").unwrap();
        let b = ws.add_device(&mut factory, "filter").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();

        // a -> b, b -> sink, a -> sink.
        ws.start_connection(&a, 0);
        ws.finish_connection(&b, 0).unwrap();
        ws.start_connection(&b, 0);
        ws.finish_connection(&sink, 0).unwrap();
        ws.start_connection(&a, 0);
        ws.finish_connection(&sink, 1).unwrap();
        assert_eq!(ws.connection_count(), 3);

        // Removing b takes its outgoing edge and its incoming edge, nothing
        // else.
        ws.remove_device(&b);
        assert_eq!(ws.connection_count(), 1);
        assert!(ws.device(&b).is_none());
        assert_eq!(ws.device(&a).unwrap().connections().len(), 1);
        assert_eq!(routing.live_splitters(), 1);

        let ends = ws.connections_for_device(&sink);
        assert_eq!(ends.incoming.len(), 1);
        assert_eq!(ends.incoming[0].source, a);
    }

    #[test]
    fn deleting_source_empties_target_incoming() {
        let (mut ws, mut factory, _routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();
        ws.start_connection(&a, 0);
        ws.finish_connection(&sink, 2).unwrap();

        ws.remove_device(&a);
        let ends = ws.connections_for_device(&sink);
        assert!(ends.incoming.is_empty());
        assert!(ends.outgoing.is_empty());
    }

    #[test]
    fn remove_unknown_device_is_noop() {
        let (mut ws, _factory, _routing) = workspace();
        ws.remove_device(&DeviceId::from_raw("osc-0"));
        assert_eq!(ws.device_count(), 0);
    }

    #[test]
    fn fan_out_allocates_one_splitter_per_connection() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();

        for input in 0..3 {
            ws.start_connection(&a, 0);
            ws.finish_connection(&sink, input).unwrap();
        }
        assert_eq!(ws.connection_count(), 3);
        assert_eq!(routing.live_splitters(), 3);
    }

    #[test]
    fn wire_label_joins_port_labels() {
        let routing = MockRouting::default();
        let view = MockView::default();
        let mut ws = Workspace::with_view(Box::new(routing.clone()), Box::new(view.clone()));
        let mut factory = MockFactory::default();
        factory.add_module(osc());

        let a = ws.add_device(&mut factory, "osc").unwrap();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();
        ws.start_connection(&a, 0);
        ws.finish_connection(&sink, 0).unwrap();
        assert_eq!(
            view.last_wire_label(),
            Some("out -> speaker channel".to_string())
        );
    }

    #[test]
    fn set_control_delivers_parsed_values() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();

        ws.set_control(&a, "frequency", "220*2").unwrap();
        assert_eq!(
            routing.last_control(),
            Some(("frequency".to_string(), vec![440.0]))
        );
        assert_eq!(
            ws.device(&a).unwrap().controls().get("frequency").map(String::as_str),
            Some("220*2")
        );
    }

    #[test]
    fn bad_control_text_is_stored_but_reported() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();

        assert!(ws.set_control(&a, "frequency", "not a number").is_err());
        // The text is kept so it round-trips through snapshots.
        assert_eq!(
            ws.device(&a).unwrap().controls().get("frequency").map(String::as_str),
            Some("not a number")
        );
        assert!(routing.last_control().is_none());
    }

    #[test]
    fn pattern_modules_get_length_prefixed_arrays() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(ModuleDescriptor {
            name: "pattern".to_string(),
            outlets: vec![PortDescriptor::new(0, "out")],
            inlets: vec![PortDescriptor::new(0, "in")],
            output_channels: 1,
            data_buffer: Some("pattern".to_string()),
        });
        let a = ws.add_device(&mut factory, "pattern").unwrap();

        ws.set_control(&a, "wave", "[0.5, -0.5, 1]").unwrap();
        assert_eq!(
            routing.last_control(),
            Some(("wave".to_string(), vec![3.0, 0.5, -0.5, 1.0]))
        );
    }

    #[test]
    fn speaker_control_is_stored_without_delivery() {
        let (mut ws, mut factory, routing) = workspace();
        let sink = ws.add_device(&mut factory, "outputnode").unwrap();
        ws.set_control(&sink, "output_channel", "3").unwrap();
        assert!(routing.last_control().is_none());
        assert_eq!(
            ws.device(&sink).unwrap().controls().get("output_channel").map(String::as_str),
            Some("3")
        );
    }

    #[test]
    fn refresh_controls_redelivers_all_values() {
        let (mut ws, mut factory, routing) = workspace();
        factory.add_module(osc());
        let a = ws.add_device(&mut factory, "osc").unwrap();
        ws.set_control(&a, "frequency", "440").unwrap();
        routing.clear_controls();

        ws.refresh_controls(&a);
        assert_eq!(
            routing.last_control(),
            Some(("frequency".to_string(), vec![440.0]))
        );
    }
}
