//! Deterministic in-memory collaborators.
//!
//! [`MockRouting`], [`MockFactory`], and [`MockView`] implement the three
//! collaborator traits without any audio or canvas behind them. They record
//! every call so tests (and headless hosts) can assert on routing state,
//! and they hand out handles from plain counters. Clones share state, so a
//! test can keep a handle while the workspace owns the boxed collaborator.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::connection::ConnectionId;
use crate::device::{
    CreatedDevice, DeviceError, DeviceFactory, DeviceId, MIC_KIND, ModuleDescriptor, SPEAKER_KIND,
};
use crate::routing::{RouteTarget, SignalRouting, SplitterId, UnitId};
use crate::view::{CanvasView, WireInfo};

/// One active route recorded by [`MockRouting`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// The splitter carrying the route.
    pub splitter: SplitterId,
    /// Splitter output channel.
    pub output: usize,
    /// Where the channel lands.
    pub target: RouteTarget,
    /// Target input channel.
    pub input: usize,
}

#[derive(Debug)]
struct RoutingState {
    speaker_channels: usize,
    next_splitter: u64,
    splitter_sources: BTreeMap<u64, UnitId>,
    routes: Vec<Route>,
    controls: Vec<(UnitId, String, Vec<f32>)>,
    removed_units: Vec<UnitId>,
}

impl Default for RoutingState {
    fn default() -> Self {
        Self {
            speaker_channels: 8,
            next_splitter: 0,
            splitter_sources: BTreeMap::new(),
            routes: Vec::new(),
            controls: Vec::new(),
            removed_units: Vec::new(),
        }
    }
}

/// Recording implementation of [`SignalRouting`].
#[derive(Clone, Debug, Default)]
pub struct MockRouting {
    state: Rc<RefCell<RoutingState>>,
}

impl MockRouting {
    /// A mock with a specific merge-bus width (default is 8).
    pub fn with_speaker_channels(channels: usize) -> Self {
        let mock = Self::default();
        mock.state.borrow_mut().speaker_channels = channels;
        mock
    }

    /// Number of splitters currently allocated (created and not released).
    pub fn live_splitters(&self) -> usize {
        self.state.borrow().splitter_sources.len()
    }

    /// Active routes, in creation order.
    pub fn routes(&self) -> Vec<Route> {
        self.state.borrow().routes.clone()
    }

    /// Whether some route currently lands on the given merge-bus channel.
    pub fn connected_to_bus(&self, input: usize) -> bool {
        self.state
            .borrow()
            .routes
            .iter()
            .any(|route| route.target == RouteTarget::SpeakerBus && route.input == input)
    }

    /// The most recent control delivery, as `(control, values)`.
    pub fn last_control(&self) -> Option<(String, Vec<f32>)> {
        self.state
            .borrow()
            .controls
            .last()
            .map(|(_, control, values)| (control.clone(), values.clone()))
    }

    /// All control deliveries so far.
    pub fn controls(&self) -> Vec<(UnitId, String, Vec<f32>)> {
        self.state.borrow().controls.clone()
    }

    /// Forgets recorded control deliveries.
    pub fn clear_controls(&self) {
        self.state.borrow_mut().controls.clear();
    }

    /// Units released via [`SignalRouting::remove_unit`].
    pub fn removed_units(&self) -> Vec<UnitId> {
        self.state.borrow().removed_units.clone()
    }
}

impl SignalRouting for MockRouting {
    fn speaker_channels(&self) -> usize {
        self.state.borrow().speaker_channels
    }

    fn create_splitter(&mut self, source: UnitId, _channels: usize) -> SplitterId {
        let mut state = self.state.borrow_mut();
        let id = state.next_splitter;
        state.next_splitter += 1;
        state.splitter_sources.insert(id, source);
        SplitterId::new(id)
    }

    fn connect(&mut self, splitter: SplitterId, output: usize, target: RouteTarget, input: usize) {
        self.state.borrow_mut().routes.push(Route {
            splitter,
            output,
            target,
            input,
        });
    }

    fn disconnect(
        &mut self,
        _source: UnitId,
        splitter: SplitterId,
        output: usize,
        target: RouteTarget,
        input: usize,
    ) {
        let mut state = self.state.borrow_mut();
        let wanted = Route {
            splitter,
            output,
            target,
            input,
        };
        if let Some(position) = state.routes.iter().position(|route| *route == wanted) {
            state.routes.remove(position);
        }
        state.splitter_sources.remove(&splitter.value());
    }

    fn remove_unit(&mut self, unit: UnitId) {
        self.state.borrow_mut().removed_units.push(unit);
    }

    fn send_control(&mut self, unit: UnitId, control: &str, values: &[f32]) {
        self.state
            .borrow_mut()
            .controls
            .push((unit, control.to_string(), values.to_vec()));
    }
}

/// Catalog-backed implementation of [`DeviceFactory`].
///
/// Knows the modules it was given, plus the synthetic kinds. Requesting an
/// unknown module fails with [`DeviceError::ModuleFetch`], the same shape a
/// real collaborator reports when a module description is missing.
#[derive(Debug, Default)]
pub struct MockFactory {
    modules: BTreeMap<String, ModuleDescriptor>,
    next_unit: u64,
    deny_microphone: bool,
}

impl MockFactory {
    /// Adds a module to the catalog under its descriptor name.
    pub fn add_module(&mut self, descriptor: ModuleDescriptor) {
        self.modules.insert(descriptor.name.clone(), descriptor);
    }

    /// Makes microphone creation fail with [`DeviceError::PermissionDenied`].
    pub fn deny_microphone(&mut self) {
        self.deny_microphone = true;
    }

    fn mint_unit(&mut self) -> UnitId {
        let unit = UnitId::new(self.next_unit);
        self.next_unit += 1;
        unit
    }
}

impl DeviceFactory for MockFactory {
    fn create(&mut self, kind: &str) -> Result<CreatedDevice, DeviceError> {
        match kind {
            MIC_KIND => {
                if self.deny_microphone {
                    return Err(DeviceError::PermissionDenied);
                }
                Ok(CreatedDevice::Microphone {
                    unit: self.mint_unit(),
                })
            }
            SPEAKER_KIND => Ok(CreatedDevice::Speaker),
            name => match self.modules.get(name).cloned() {
                Some(descriptor) => Ok(CreatedDevice::Module {
                    unit: self.mint_unit(),
                    descriptor,
                }),
                None => Err(DeviceError::ModuleFetch {
                    name: name.to_string(),
                    reason: "module is not in the catalog".to_string(),
                }),
            },
        }
    }

    fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.modules.keys().cloned().collect();
        kinds.push(MIC_KIND.to_string());
        kinds.push(SPEAKER_KIND.to_string());
        kinds.sort();
        kinds
    }
}

/// One notification recorded by [`MockView`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// A node was drawn.
    DeviceAdded(DeviceId, String),
    /// A node was removed.
    DeviceRemoved(DeviceId),
    /// A wire was drawn.
    WireDrawn(WireInfo),
    /// A wire was removed.
    WireRemoved(ConnectionId),
}

/// Recording implementation of [`CanvasView`].
#[derive(Clone, Debug, Default)]
pub struct MockView {
    events: Rc<RefCell<Vec<ViewEvent>>>,
}

impl MockView {
    /// All notifications so far, in order.
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.borrow().clone()
    }

    /// Label of the most recently drawn wire.
    pub fn last_wire_label(&self) -> Option<String> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find_map(|event| match event {
                ViewEvent::WireDrawn(wire) => Some(wire.label.clone()),
                _ => None,
            })
    }
}

impl CanvasView for MockView {
    fn device_added(&mut self, id: &DeviceId, label: &str) {
        self.events
            .borrow_mut()
            .push(ViewEvent::DeviceAdded(id.clone(), label.to_string()));
    }

    fn device_removed(&mut self, id: &DeviceId) {
        self.events
            .borrow_mut()
            .push(ViewEvent::DeviceRemoved(id.clone()));
    }

    fn wire_drawn(&mut self, wire: &WireInfo) {
        self.events
            .borrow_mut()
            .push(ViewEvent::WireDrawn(wire.clone()));
    }

    fn wire_removed(&mut self, id: ConnectionId) {
        self.events.borrow_mut().push(ViewEvent::WireRemoved(id));
    }
}
