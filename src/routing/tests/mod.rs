use super::*;
use crate::identity::{Identity, PubKey};
use crate::transport::TransportId;
use std::time::{Duration, SystemTime};

mod gc;

pub(super) fn hour_from_now() -> SystemTime {
    SystemTime::now() + Duration::from_secs(3600)
}

pub(super) fn make_forward_rule(next: u32) -> Rule {
    Rule::forward(hour_from_now(), RouteId::new(next), TransportId::generate())
}

pub(super) fn make_app_rule(remote_pk: PubKey, remote_port: u16, local_port: u16) -> Rule {
    Rule::app(
        hour_from_now(),
        RouteId::new(1),
        remote_pk,
        Port::new(remote_port),
        Port::new(local_port),
    )
}

pub(super) fn short_keep_alive(keep_alive_ms: u64) -> TableConfig {
    TableConfig {
        keep_alive: Duration::from_millis(keep_alive_ms),
        gc_interval: Duration::from_millis(20),
        gc_batch_size: 2,
    }
}

pub(super) fn make_pk() -> PubKey {
    Identity::generate().pubkey()
}

#[test]
fn test_route_id_be_bytes() {
    let id = RouteId::new(0x0102_0304);
    assert_eq!(id.to_be_bytes(), [1, 2, 3, 4]);
    assert_eq!(RouteId::from_be_bytes([1, 2, 3, 4]), id);
}

#[test]
fn test_route_id_display() {
    assert_eq!(RouteId::new(42).to_string(), "42");
    assert_eq!(Port::new(8080).to_string(), "8080");
}

#[test]
fn test_routing_error_display() {
    assert_eq!(
        RoutingError::RuleNotFound(RouteId::new(7)).to_string(),
        "rule 7 not found"
    );
    assert_eq!(
        RoutingError::RuleTimedOut(RouteId::new(7)).to_string(),
        "rule 7 timed out"
    );
    assert_eq!(
        RoutingError::PayloadTooLarge {
            max: 65535,
            got: 65536
        }
        .to_string(),
        "payload too large: max 65535 bytes, got 65536"
    );
    assert_eq!(
        RoutingError::InvalidRuleAccess {
            accessor: "remote_pk",
            rule_type: RuleType::Forward,
        }
        .to_string(),
        "invalid rule access: remote_pk is not defined for Forward rules"
    );
    assert_eq!(
        RoutingError::NoAvailableRouteIds.to_string(),
        "no available route ids"
    );
}

/// A forward rule found in the table relabels a packet for the next hop.
#[test]
fn test_lookup_and_relabel() {
    let table = MemoryTable::with_defaults();
    let next_tid = TransportId::generate();

    let id = table.reserve_id().unwrap();
    table
        .save_rule(id, Rule::forward(hour_from_now(), RouteId::new(77), next_tid))
        .unwrap();

    let incoming = Packet::new(id, b"hello").unwrap();
    let decoded = Packet::decode(incoming.as_bytes()).unwrap();
    let rule = table.rule(decoded.route_id()).unwrap();

    let outgoing = Packet::new(rule.route_id(), decoded.payload()).unwrap();
    assert_eq!(outgoing.route_id(), RouteId::new(77));
    assert_eq!(outgoing.payload(), b"hello");
    assert_eq!(rule.transport_id().unwrap(), next_tid);
}
