//! Skywire routing core
//!
//! Route-based packet forwarding for an overlay network of visors. Each
//! visor keeps a table of rules keyed by route ID; a packet's route ID
//! selects the rule that either forwards it to the next hop or delivers it
//! to a local application.

pub mod config;
pub mod identity;
pub mod router;
pub mod routing;
pub mod transport;

// Re-export identity types
pub use identity::{Identity, IdentityError, PubKey};

// Re-export config types
pub use config::{Config, ConfigError};

// Re-export routing types
pub use routing::{
    spawn_gc, Addr, GcHandle, Loop, MemoryTable, Packet, Port, Route, RouteDescriptor, RouteId,
    RoutingError, RoutingTable, Rule, RuleSummary, RuleType, TableConfig,
};

// Re-export transport types
pub use transport::{
    outbound_channel, packet_channel, OutboundPacket, OutboundRx, OutboundTx, PacketRx, PacketTx,
    ReceivedPacket, TransportId,
};

// Re-export router types
pub use router::{app_channel, AppMessage, AppRx, AppTx, Dispatch, Router, RouterError, RouterStats};
