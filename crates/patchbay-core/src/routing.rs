//! Signal-routing collaborator contract.
//!
//! The connection graph never touches audio primitives directly. It drives a
//! [`SignalRouting`] implementation, which owns the opaque audio units, the
//! per-connection fan-out splitters, and the shared speaker merge bus. The
//! graph's job is to keep that routing consistent with the logical topology:
//! a splitter exists exactly as long as the connection that allocated it.
//!
//! The trait is object-safe so hosts can select an implementation at
//! runtime (`Box<dyn SignalRouting>`); tests substitute a recording stub.

/// Opaque handle to an audio unit owned by the routing collaborator.
///
/// Handles are minted by the collaborator (usually at device creation) and
/// mean nothing to the graph beyond identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnitId(u64);

impl UnitId {
    /// Wraps a collaborator-assigned handle value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a fan-out splitter allocated for one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SplitterId(u64);

impl SplitterId {
    /// Wraps a collaborator-assigned handle value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Where a routed splitter channel lands: a device's unit, or the shared
/// speaker merge bus when the target is the speaker sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteTarget {
    /// Input of a specific audio unit.
    Unit(UnitId),
    /// Input channel of the shared speaker merge bus.
    SpeakerBus,
}

/// Signal-routing collaborator.
///
/// Implementations wrap the platform audio graph. All operations are
/// infallible from the graph's point of view: routing errors are the
/// collaborator's to surface, and the logical topology is the source of
/// truth either way.
pub trait SignalRouting {
    /// Channel count of the shared speaker merge bus.
    fn speaker_channels(&self) -> usize;

    /// Allocates a fan-out splitter with `channels` outputs and wires
    /// `source`'s audio output into it.
    fn create_splitter(&mut self, source: UnitId, channels: usize) -> SplitterId;

    /// Routes splitter channel `output` into channel `input` of `target`.
    fn connect(&mut self, splitter: SplitterId, output: usize, target: RouteTarget, input: usize);

    /// Undoes a [`connect`](Self::connect) and detaches the splitter from
    /// its source, releasing the splitter.
    fn disconnect(
        &mut self,
        source: UnitId,
        splitter: SplitterId,
        output: usize,
        target: RouteTarget,
        input: usize,
    );

    /// Tears down every remaining route out of `unit` and releases it.
    /// Called when a device is removed.
    fn remove_unit(&mut self, unit: UnitId);

    /// Delivers parsed control values to a unit's named control inport.
    fn send_control(&mut self, unit: UnitId, control: &str, values: &[f32]);
}
