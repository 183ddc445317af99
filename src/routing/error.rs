//! Routing error types.

use thiserror::Error;

use super::{RouteId, RuleType};

/// Errors from the packet and rule codecs, the routing table and loops.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("payload too large: max {max} bytes, got {got}")]
    PayloadTooLarge { max: usize, got: usize },

    #[error("corrupt packet: {0}")]
    CorruptPacket(String),

    #[error("corrupt rule: {0}")]
    CorruptRule(String),

    #[error("invalid rule access: {accessor} is not defined for {rule_type} rules")]
    InvalidRuleAccess {
        accessor: &'static str,
        rule_type: RuleType,
    },

    #[error("invalid rule summary: {0}")]
    InvalidRuleSummary(String),

    #[error("rule {0} not found")]
    RuleNotFound(RouteId),

    #[error("rule {0} timed out")]
    RuleTimedOut(RouteId),

    #[error("no available route ids")]
    NoAvailableRouteIds,

    #[error("route has no hops")]
    EmptyRoute,
}
