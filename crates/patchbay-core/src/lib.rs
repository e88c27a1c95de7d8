//! Device graph and connection model for the patchbay patching environment.
//!
//! This crate is the engine behind a node-and-wire patching canvas: it
//! tracks which device outlets feed which device inlets, keeps the audio
//! routing (fan-out splitting) consistent with that logical graph as nodes
//! and wires come and go, and exposes the state the snapshot codec needs to
//! persist a workspace.
//!
//! # Architecture
//!
//! - [`Workspace`] — owns the device registry and the connection graph;
//!   every mutation goes through it.
//! - [`DeviceRegistry`] — live device instances, id assignment from
//!   per-kind monotonic counters.
//! - Port contract — every device, module-backed or synthetic, exposes
//!   ordered [`PortDescriptor`] sequences; the graph never branches on kind
//!   after creation.
//! - Collaborator traits — [`DeviceFactory`] (device creation),
//!   [`SignalRouting`] (audio units, splitters, the speaker merge bus), and
//!   [`CanvasView`] (wire/node visualization). The [`mock`] module has
//!   deterministic in-memory implementations.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::mock::{MockFactory, MockRouting};
//! use patchbay_core::{ModuleDescriptor, PortDescriptor, Workspace};
//!
//! let mut factory = MockFactory::default();
//! factory.add_module(ModuleDescriptor {
//!     name: "osc".to_string(),
//!     outlets: vec![PortDescriptor::new(0, "out")],
//!     inlets: vec![PortDescriptor::new(0, "in")],
//!     output_channels: 1,
//!     data_buffer: None,
//! });
//!
//! let mut workspace = Workspace::new(Box::new(MockRouting::default()));
//! let osc = workspace.add_device(&mut factory, "osc").unwrap();
//! let speaker = workspace.add_device(&mut factory, "outputnode").unwrap();
//!
//! workspace.start_connection(&osc, 0);
//! workspace.finish_connection(&speaker, 0);
//! assert_eq!(workspace.connection_count(), 1);
//! ```

mod connection;
/// Device model and the device-creation collaborator contract.
pub mod device;
/// Restricted numeric/array grammar for control values.
pub mod expr;
/// Deterministic in-memory collaborators for tests and headless hosts.
pub mod mock;
/// Device registry and id assignment.
pub mod registry;
/// Signal-routing collaborator contract.
pub mod routing;
/// Visualization collaborator contract.
pub mod view;
/// The workspace: connection graph over the registry.
pub mod workspace;

pub use connection::{Connection, ConnectionId, ConnectionInfo, DeviceConnections};
pub use device::{
    CreatedDevice, Device, DeviceError, DeviceFactory, DeviceId, DeviceKind, MIC_KIND,
    ModuleDescriptor, PortDescriptor, SPEAKER_CHANNEL_CONTROL, SPEAKER_INLET_LABEL, SPEAKER_KIND,
    kind_prefix,
};
pub use expr::{ExprError, parse_values};
pub use registry::DeviceRegistry;
pub use routing::{RouteTarget, SignalRouting, SplitterId, UnitId};
pub use view::{CanvasView, NullView, WireInfo};
pub use workspace::Workspace;
