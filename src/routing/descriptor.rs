//! Route descriptors, hops and loops.
//!
//! A loop is an application-level virtual circuit between two visors. It is
//! named by its endpoint pair ([`RouteDescriptor`]) and carried by a forward
//! and a reverse [`Route`], each a list of transport hops.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use super::{Port, RouteId, RoutingError, Rule};
use crate::identity::PubKey;
use crate::transport::TransportId;

/// An application endpoint: visor public key and port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Addr {
    pub pk: PubKey,
    pub port: Port,
}

impl Addr {
    /// Create a new endpoint address.
    pub fn new(pk: PubKey, port: Port) -> Self {
        Self { pk, port }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pk, self.port)
    }
}

/// Local and remote endpoints of a loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteDescriptor {
    local: Addr,
    remote: Addr,
}

impl RouteDescriptor {
    /// Create a descriptor from its endpoints.
    pub fn new(local: Addr, remote: Addr) -> Self {
        Self { local, remote }
    }

    /// The local endpoint.
    pub fn local(&self) -> &Addr {
        &self.local
    }

    /// The remote endpoint.
    pub fn remote(&self) -> &Addr {
        &self.remote
    }

    /// The same loop as seen from the remote end.
    pub fn inverted(&self) -> Self {
        Self {
            local: self.remote,
            remote: self.local,
        }
    }

    /// Build the App rule that delivers this loop's traffic to the local
    /// application, replying on `response_route_id`.
    pub fn app_rule(&self, expire_at: SystemTime, response_route_id: RouteId) -> Rule {
        Rule::app(
            expire_at,
            response_route_id,
            self.remote.pk,
            self.remote.port,
            self.local.port,
        )
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.local, self.remote)
    }
}

/// One transport hop of a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hop {
    pub transport_id: TransportId,
    pub from: PubKey,
    pub to: PubKey,
}

impl Hop {
    pub fn new(transport_id: TransportId, from: PubKey, to: PubKey) -> Self {
        Self {
            transport_id,
            from,
            to,
        }
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} @ {}", self.from, self.to, self.transport_id)
    }
}

/// An ordered list of hops from source to destination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Vec<Hop>);

impl Route {
    pub fn new(hops: Vec<Hop>) -> Self {
        Self(hops)
    }

    pub fn hops(&self) -> &[Hop] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first hop, if any.
    pub fn first(&self) -> Option<&Hop> {
        self.0.first()
    }
}

impl From<Vec<Hop>> for Route {
    fn from(hops: Vec<Hop>) -> Self {
        Self(hops)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, hop) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", hop)?;
        }
        write!(f, "]")
    }
}

/// A virtual circuit: endpoint pair plus the routes in both directions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loop {
    descriptor: RouteDescriptor,
    forward: Route,
    reverse: Route,
}

impl Loop {
    pub fn new(descriptor: RouteDescriptor, forward: Route, reverse: Route) -> Self {
        Self {
            descriptor,
            forward,
            reverse,
        }
    }

    pub fn descriptor(&self) -> &RouteDescriptor {
        &self.descriptor
    }

    pub fn forward(&self) -> &Route {
        &self.forward
    }

    pub fn reverse(&self) -> &Route {
        &self.reverse
    }

    /// Visor that opened the loop: source of the first forward hop.
    pub fn initiator(&self) -> Result<PubKey, RoutingError> {
        self.forward
            .first()
            .map(|hop| hop.from)
            .ok_or(RoutingError::EmptyRoute)
    }

    /// Visor that accepted the loop: source of the first reverse hop.
    pub fn responder(&self) -> Result<PubKey, RoutingError> {
        self.reverse
            .first()
            .map(|hop| hop.from)
            .ok_or(RoutingError::EmptyRoute)
    }
}
