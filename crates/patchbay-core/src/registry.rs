//! Device registry: live instances, id assignment, per-kind counters.
//!
//! Devices live in insertion-ordered slots with an id index, so iteration
//! (and therefore snapshot order) follows registration order. Each kind has
//! a monotonic counter that feeds id generation and is never decremented or
//! reused after deletion.

use std::collections::{BTreeMap, HashMap};

use crate::device::{
    CreatedDevice, Device, DeviceId, DeviceKind, PortDescriptor, SPEAKER_CHANNEL_CONTROL,
    SPEAKER_INLET_LABEL,
};

/// Registry of live device instances.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    slots: Vec<Option<Device>>,
    index: HashMap<DeviceId, usize>,
    counts: BTreeMap<String, u64>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device built from a creation result, assigns its id from
    /// the per-kind counter, and returns the id.
    ///
    /// Registration cannot fail; the counter is a `u64` and overflow is
    /// unreachable in practice.
    pub fn register(&mut self, created: CreatedDevice) -> DeviceId {
        let device = self.build(created);
        let id = device.id.clone();
        let slot = self.slots.len();
        self.slots.push(Some(device));
        self.index.insert(id.clone(), slot);
        id
    }

    fn build(&mut self, created: CreatedDevice) -> Device {
        let (kind, unit, outlets, inlets, output_channels, data_buffer) = match created {
            CreatedDevice::Module { unit, descriptor } => {
                // Descriptor port indices are normalized to sequence position
                // so the index -> label mapping is stable by construction.
                let outlets = renumber(descriptor.outlets);
                let inlets = renumber(descriptor.inlets);
                (
                    DeviceKind::Module {
                        name: descriptor.name,
                    },
                    Some(unit),
                    outlets,
                    inlets,
                    descriptor.output_channels,
                    descriptor.data_buffer,
                )
            }
            CreatedDevice::Microphone { unit } => (
                DeviceKind::Microphone,
                Some(unit),
                vec![PortDescriptor::new(0, "microphone output")],
                vec![PortDescriptor::new(0, "microphone input")],
                1,
                None,
            ),
            CreatedDevice::Speaker => (
                DeviceKind::Speaker,
                None,
                Vec::new(),
                vec![PortDescriptor::new(0, SPEAKER_INLET_LABEL)],
                0,
                None,
            ),
        };

        let count = self.counts.entry(kind.name().to_string()).or_insert(0);
        let id = DeviceId::new(kind.name(), *count);
        *count += 1;

        let mut controls = BTreeMap::new();
        if matches!(kind, DeviceKind::Speaker) {
            // The sink's channel selector, 1-based like the UI shows it.
            controls.insert(SPEAKER_CHANNEL_CONTROL.to_string(), "1".to_string());
        }

        Device {
            id,
            kind,
            unit,
            outlets,
            inlets,
            output_channels,
            data_buffer,
            left: String::new(),
            top: String::new(),
            controls,
            connections: Vec::new(),
        }
    }

    /// Looks up a device by id.
    pub fn lookup(&self, id: &DeviceId) -> Option<&Device> {
        self.index
            .get(id)
            .and_then(|&slot| self.slots[slot].as_ref())
    }

    /// Looks up a device by id, mutably.
    pub fn lookup_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.index
            .get(id)
            .and_then(|&slot| self.slots[slot].as_mut())
    }

    /// Whether a device with this id is live.
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.index.contains_key(id)
    }

    /// Removes a device and returns it, or `None` if the id is not live
    /// (repeated unregistration is a no-op, not an error).
    ///
    /// The caller must sever incident connections first; edge cleanup always
    /// precedes device removal.
    pub fn unregister(&mut self, id: &DeviceId) -> Option<Device> {
        let slot = self.index.remove(id)?;
        self.slots[slot].take()
    }

    /// Number of live devices.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live devices, in registration order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Registrations seen so far for a kind (the next counter suffix).
    pub fn count_for(&self, kind: &str) -> u64 {
        self.counts.get(kind).copied().unwrap_or(0)
    }
}

fn renumber(mut ports: Vec<PortDescriptor>) -> Vec<PortDescriptor> {
    for (index, port) in ports.iter_mut().enumerate() {
        port.index = index;
    }
    ports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ModuleDescriptor;
    use crate::routing::UnitId;

    fn module(name: &str) -> CreatedDevice {
        CreatedDevice::Module {
            unit: UnitId::new(0),
            descriptor: ModuleDescriptor {
                name: name.to_string(),
                outlets: vec![PortDescriptor::new(0, "out")],
                inlets: vec![PortDescriptor::new(0, "in")],
                output_channels: 1,
                data_buffer: None,
            },
        }
    }

    #[test]
    fn ids_are_kind_plus_counter() {
        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.register(module("osc")).as_str(), "osc-0");
        assert_eq!(registry.register(module("osc")).as_str(), "osc-1");
        assert_eq!(registry.register(module("filter")).as_str(), "filter-0");
    }

    #[test]
    fn counters_are_monotonic_across_deletion() {
        let mut registry = DeviceRegistry::new();
        let first = registry.register(module("osc"));
        registry.unregister(&first);
        let second = registry.register(module("osc"));
        // The freed suffix is never reused.
        assert_eq!(second.as_str(), "osc-1");
        assert_eq!(registry.count_for("osc"), 2);
    }

    #[test]
    fn unregister_twice_is_noop() {
        let mut registry = DeviceRegistry::new();
        let id = registry.register(module("osc"));
        assert!(registry.unregister(&id).is_some());
        assert!(registry.unregister(&id).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = DeviceRegistry::new();
        let a = registry.register(module("a"));
        let b = registry.register(module("b"));
        let c = registry.register(module("c"));
        registry.unregister(&b);
        let order: Vec<_> = registry.devices().map(|d| d.id().clone()).collect();
        assert_eq!(order, vec![a, c]);
    }

    #[test]
    fn speaker_gets_channel_selector_control() {
        let mut registry = DeviceRegistry::new();
        let id = registry.register(CreatedDevice::Speaker);
        assert_eq!(id.as_str(), "outputnode-0");
        let device = registry.lookup(&id).unwrap();
        assert_eq!(
            device.controls().get(SPEAKER_CHANNEL_CONTROL).map(String::as_str),
            Some("1")
        );
        assert!(device.outlets().is_empty());
        assert_eq!(device.inlet_label(5), "speaker channel");
    }

    #[test]
    fn microphone_port_contract_is_fixed() {
        let mut registry = DeviceRegistry::new();
        let id = registry.register(CreatedDevice::Microphone {
            unit: UnitId::new(7),
        });
        assert_eq!(id.as_str(), "mic-0");
        let device = registry.lookup(&id).unwrap();
        assert_eq!(device.outlet_label(0), "microphone output");
        assert_eq!(device.inlet_label(0), "microphone input");
        assert_eq!(device.output_channels(), 1);
    }

    #[test]
    fn module_port_indices_are_normalized() {
        let mut registry = DeviceRegistry::new();
        let created = CreatedDevice::Module {
            unit: UnitId::new(0),
            descriptor: ModuleDescriptor {
                name: "osc".to_string(),
                // Descriptor arrives with bogus indices.
                outlets: vec![PortDescriptor::new(9, "a"), PortDescriptor::new(9, "b")],
                inlets: vec![],
                output_channels: 2,
                data_buffer: None,
            },
        };
        let id = registry.register(created);
        let device = registry.lookup(&id).unwrap();
        assert_eq!(device.outlets()[0].index, 0);
        assert_eq!(device.outlets()[1].index, 1);
    }
}
