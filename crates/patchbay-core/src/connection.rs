//! Connection records and incident-edge views.

use std::fmt;

use crate::device::DeviceId;
use crate::routing::SplitterId;

/// Unique token for a connection, assigned at creation time.
///
/// Ids are minted from a workspace-monotonic counter; uniqueness within the
/// session is the only contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub(crate) u64);

impl ConnectionId {
    /// Returns the raw numeric token.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// A directed edge from a source device outlet to a target device inlet.
///
/// Stored on the source device in creation order. The splitter handle is a
/// live routing resource, created and torn down with the edge; it is never
/// serialized and is rebuilt from the endpoint tuple on restore.
#[derive(Debug)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) target: DeviceId,
    pub(crate) output: usize,
    pub(crate) input: usize,
    pub(crate) splitter: SplitterId,
}

impl Connection {
    /// The connection's unique token.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Target device id.
    pub fn target(&self) -> &DeviceId {
        &self.target
    }

    /// Source outlet index.
    pub fn output(&self) -> usize {
        self.output
    }

    /// Target inlet index.
    pub fn input(&self) -> usize {
        self.input
    }
}

/// Owned summary of one edge, with both endpoints resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// The connection's unique token.
    pub id: ConnectionId,
    /// Source device id.
    pub source: DeviceId,
    /// Target device id.
    pub target: DeviceId,
    /// Source outlet index.
    pub output: usize,
    /// Target inlet index.
    pub input: usize,
}

/// Edges incident to one device.
#[derive(Clone, Debug, Default)]
pub struct DeviceConnections {
    /// Edges whose source is the device, in creation order.
    pub outgoing: Vec<ConnectionInfo>,
    /// Edges whose target is the device, gathered by scanning the other
    /// devices' outgoing lists.
    pub incoming: Vec<ConnectionInfo>,
}
