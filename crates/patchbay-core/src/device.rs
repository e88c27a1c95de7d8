//! Device model and the device-creation collaborator contract.
//!
//! Every device in a workspace, regardless of what backs it, exposes the same
//! port contract: an ordered sequence of outlet descriptors and an ordered
//! sequence of inlet descriptors, each with a stable index and a
//! human-readable label. The synthetic kinds (microphone source, speaker
//! sink) populate the contract with fixed descriptors instead of deriving it
//! from a compiled module, which lets the connection graph and the state
//! codec treat all kinds uniformly after creation.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::connection::Connection;
use crate::routing::UnitId;

/// Kind identifier of the microphone source.
pub const MIC_KIND: &str = "mic";
/// Kind identifier of the speaker-channel sink.
pub const SPEAKER_KIND: &str = "outputnode";
/// Inlet label shared by every speaker channel.
pub const SPEAKER_INLET_LABEL: &str = "speaker channel";
/// Control carried by the speaker sink: the 1-based channel selector.
pub const SPEAKER_CHANNEL_CONTROL: &str = "output_channel";

/// Unique identifier of a live device within a workspace session.
///
/// Ids are formed from the device's kind name plus a per-kind counter
/// (`"oscillator-0"`, `"oscillator-1"`). The counter is monotonic and never
/// reused, even after deletion, so ids in old snapshots cannot collide with
/// devices created later in the same session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub(crate) fn new(kind: &str, count: u64) -> Self {
        Self(format!("{kind}-{count}"))
    }

    /// Wraps a raw id string, e.g. one read back from a snapshot.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the kind name encoded in this id (the prefix before the
    /// counter suffix).
    pub fn kind_prefix(&self) -> &str {
        kind_prefix(&self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the kind name encoded in a device id string: everything before
/// the last `-`, which separates the per-kind counter suffix.
pub fn kind_prefix(id: &str) -> &str {
    id.rsplit_once('-').map_or(id, |(kind, _)| kind)
}

/// A named, indexed connection point on a device.
///
/// The index is the port's position in its sequence and is stable for the
/// device's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortDescriptor {
    /// Position of the port in its outlet or inlet sequence.
    pub index: usize,
    /// Human-readable label shown on wires and pickers.
    pub label: String,
}

impl PortDescriptor {
    /// Creates a descriptor.
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
        }
    }
}

/// Port and buffer metadata for a module-backed device, as parsed from the
/// module's compiled description by the device-creation collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ModuleDescriptor {
    /// Module name; doubles as the device's kind name for id generation.
    pub name: String,
    /// Output ports, in order.
    pub outlets: Vec<PortDescriptor>,
    /// Input ports, in order.
    pub inlets: Vec<PortDescriptor>,
    /// Total output channel count, used to size fan-out splitters.
    pub output_channels: usize,
    /// Identifier of the module's data buffer, if it has one. Modules whose
    /// buffer is `"pattern"` take control arrays prefixed with their length
    /// so the buffer can be reallocated.
    pub data_buffer: Option<String>,
}

/// Buffer identifier of modules that take length-prefixed control arrays.
pub(crate) const PATTERN_BUFFER: &str = "pattern";

/// The role of a device in the signal graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    /// Backed by a compiled audio-processing module.
    Module {
        /// Module name (the device's kind name).
        name: String,
    },
    /// The microphone source.
    Microphone,
    /// The speaker-channel sink, backed by the shared merge bus.
    Speaker,
}

impl DeviceKind {
    /// Kind name used for id generation and counters.
    pub fn name(&self) -> &str {
        match self {
            DeviceKind::Module { name } => name,
            DeviceKind::Microphone => MIC_KIND,
            DeviceKind::Speaker => SPEAKER_KIND,
        }
    }

    /// Label drawn on the device's node by the visualization collaborator.
    pub fn display_label(&self) -> &str {
        match self {
            DeviceKind::Module { name } => name,
            DeviceKind::Microphone => "microphone input",
            DeviceKind::Speaker => SPEAKER_INLET_LABEL,
        }
    }
}

/// A live device instance owned by the registry.
#[derive(Debug)]
pub struct Device {
    pub(crate) id: DeviceId,
    pub(crate) kind: DeviceKind,
    /// Audio unit behind this device. `None` for the speaker sink, which is
    /// the shared merge bus rather than a dedicated unit.
    pub(crate) unit: Option<UnitId>,
    pub(crate) outlets: Vec<PortDescriptor>,
    pub(crate) inlets: Vec<PortDescriptor>,
    pub(crate) output_channels: usize,
    pub(crate) data_buffer: Option<String>,
    pub(crate) left: String,
    pub(crate) top: String,
    pub(crate) controls: BTreeMap<String, String>,
    pub(crate) connections: Vec<Connection>,
}

impl Device {
    /// The device's workspace-unique id.
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// The device's kind tag.
    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Output port descriptors, in order.
    pub fn outlets(&self) -> &[PortDescriptor] {
        &self.outlets
    }

    /// Input port descriptors, in order.
    pub fn inlets(&self) -> &[PortDescriptor] {
        &self.inlets
    }

    /// Total output channel count (sizes this device's fan-out splitters).
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Current position as the two style strings the snapshot stores.
    pub fn position(&self) -> (&str, &str) {
        (&self.left, &self.top)
    }

    /// Raw control text per control name, exactly as last typed or restored.
    pub fn controls(&self) -> &BTreeMap<String, String> {
        &self.controls
    }

    /// Outgoing connections, in creation order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Label of an outlet, falling back to `"outlet N"` for an index with no
    /// descriptor. Index bounds are deliberately not enforced here; the
    /// graph defers validation to connection time and connects leniently.
    pub fn outlet_label(&self, index: usize) -> String {
        self.outlets
            .get(index)
            .map_or_else(|| format!("outlet {index}"), |p| p.label.clone())
    }

    /// Label of an inlet. Every speaker inlet resolves to the same label
    /// regardless of index, since the index is a merge-bus channel number.
    pub fn inlet_label(&self, index: usize) -> String {
        if matches!(self.kind, DeviceKind::Speaker) {
            return SPEAKER_INLET_LABEL.to_string();
        }
        self.inlets
            .get(index)
            .map_or_else(|| format!("inlet {index}"), |p| p.label.clone())
    }
}

/// What the device-creation collaborator yields for one creation request.
#[derive(Debug)]
pub enum CreatedDevice {
    /// A module-backed device and the unit the collaborator allocated for it.
    Module {
        /// Audio unit running the compiled module.
        unit: UnitId,
        /// Port and buffer metadata parsed from the module description.
        descriptor: ModuleDescriptor,
    },
    /// The microphone source and its capture unit.
    Microphone {
        /// Audio unit wrapping the capture stream.
        unit: UnitId,
    },
    /// A speaker-channel sink. No dedicated unit: the sink is a window onto
    /// the shared merge bus.
    Speaker,
}

/// Device-creation collaborator.
///
/// Given a kind identifier (`"mic"`, `"outputnode"`, or a module name), the
/// collaborator produces a port-contract-conforming device or fails with a
/// [`DeviceError`]. Creating a module device typically fetches and parses
/// its compiled description, so implementations may block.
pub trait DeviceFactory {
    /// Creates a device of the given kind.
    fn create(&mut self, kind: &str) -> Result<CreatedDevice, DeviceError>;

    /// All kind identifiers this factory can create, sorted, including the
    /// synthetic kinds. Drives device pickers.
    fn kinds(&self) -> Vec<String>;
}

/// Errors from the device-creation collaborator.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The module's compiled description could not be fetched.
    #[error("failed to fetch module '{name}': {reason}")]
    ModuleFetch {
        /// Module kind identifier.
        name: String,
        /// Transport-level failure description.
        reason: String,
    },

    /// The module's compiled description could not be parsed.
    #[error("failed to parse module '{name}': {reason}")]
    ModuleParse {
        /// Module kind identifier.
        name: String,
        /// Parse failure description.
        reason: String,
    },

    /// Microphone access was refused.
    #[error("microphone access denied")]
    PermissionDenied,
}
