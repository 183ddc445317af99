//! Skywire Routing Core
//!
//! Everything a visor needs to decide what to do with a packet:
//!
//! - [`Packet`]: the hop-by-hop envelope, a RouteID plus an opaque payload.
//! - [`Rule`]: the binary record stored under a RouteID. App rules hand the
//!   payload to a local application; Forward rules relabel it and send it
//!   to the next transport.
//! - [`RoutingTable`] / [`MemoryTable`]: the concurrency-safe store of
//!   rules with RouteID allocation and keep-alive tracking.
//! - [`spawn_gc`]: the background reaper for idle Forward rules.
//! - [`RouteDescriptor`] / [`Loop`]: the endpoint view of a virtual circuit.
//!
//! RouteIDs are node-local labels; the same circuit uses a different ID on
//! every hop.

mod descriptor;
mod error;
mod gc;
mod packet;
mod rule;
mod table;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use descriptor::{Addr, Hop, Loop, Route, RouteDescriptor};
pub use error::RoutingError;
pub use gc::{spawn_gc, GcHandle};
pub use packet::{Packet, MAX_PAYLOAD_SIZE, PACKET_HEADER_SIZE};
pub use rule::{
    AppRule, ForwardRule, Rule, RuleAppFields, RuleForwardFields, RuleSummary, RuleType,
    APP_RULE_SIZE, FORWARD_RULE_SIZE, RULE_HEADER_SIZE,
};
pub use table::{
    MemoryTable, RoutingTable, TableConfig, TableStats, DEFAULT_GC_BATCH_SIZE,
    DEFAULT_GC_INTERVAL, DEFAULT_KEEP_ALIVE,
};

/// A node-local route label.
///
/// Unique within one routing table at any point in time. Zero is a valid
/// value but callers conventionally treat it as "no route".
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RouteId(u32);

impl RouteId {
    /// Create from raw u32.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw u32 value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Convert to big-endian bytes.
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Create from big-endian bytes.
    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }
}

impl From<u32> for RouteId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An application port on a visor.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Create from raw u16.
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the raw u16 value.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for Port {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests;
