//! Routing rules: what a visor does with packets bearing a RouteID.
//!
//! ## Wire Format
//!
//! All integers big-endian.
//!
//! | Offset | Field          | Size     | Notes                               |
//! |--------|----------------|----------|-------------------------------------|
//! | 0      | expiry         | 8 bytes  | unix seconds, 0 = none/expired      |
//! | 8      | rule_type      | 1 byte   | 0 = App, 1 = Forward                |
//! | 9      | route_id       | 4 bytes  | response id (App) / next id (Fwd)   |
//!
//! App rule (50 bytes total):
//!
//! | Offset | Field       | Size     |
//! |--------|-------------|----------|
//! | 13     | remote_pk   | 33 bytes |
//! | 46     | remote_port | 2 bytes  |
//! | 48     | local_port  | 2 bytes  |
//!
//! Forward rule (29 bytes total):
//!
//! | Offset | Field             | Size     |
//! |--------|-------------------|----------|
//! | 13     | next_transport_id | 16 bytes |
//!
//! Every visor in the mesh produces and consumes this layout, so it must
//! stay bit-compatible.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{Port, RouteDescriptor, RouteId, RoutingError};
use crate::identity::{PubKey, PUBKEY_SIZE};
use crate::transport::{TransportId, TRANSPORT_ID_SIZE};

/// Size of the common rule header (expiry + type + route id).
pub const RULE_HEADER_SIZE: usize = 8 + 1 + 4;

/// Total encoded size of an App rule.
pub const APP_RULE_SIZE: usize = RULE_HEADER_SIZE + PUBKEY_SIZE + 2 + 2;

/// Total encoded size of a Forward rule.
pub const FORWARD_RULE_SIZE: usize = RULE_HEADER_SIZE + TRANSPORT_ID_SIZE;

// ============================================================================
// Rule Type
// ============================================================================

/// Rule type discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RuleType {
    /// Packets are consumed by a local application.
    App = 0x00,
    /// Packets are relabeled and sent to the next hop.
    Forward = 0x01,
}

impl RuleType {
    /// Try to convert from a byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(RuleType::App),
            0x01 => Some(RuleType::Forward),
            _ => None,
        }
    }

    /// Convert to a byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleType::App => "App",
            RuleType::Forward => "Forward",
        };
        write!(f, "{}", name)
    }
}

/// Unix seconds, clamped to 0 for times before the epoch.
fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Stored expiry for a rule created at `now`.
///
/// An expiry at or before `now` (second granularity) is stored as 0. Peers
/// rely on this exact encoding.
fn normalize_expiry(expire_at: SystemTime, now: SystemTime) -> u64 {
    let expire_secs = unix_secs(expire_at);
    if expire_secs <= unix_secs(now) {
        0
    } else {
        expire_secs
    }
}

// ============================================================================
// Rule Variants
// ============================================================================

/// Rule for packets consumed by a local application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AppRule {
    expire_at: u64,
    response_route_id: RouteId,
    remote_pk: PubKey,
    remote_port: Port,
    local_port: Port,
}

impl AppRule {
    /// Create an App rule, normalizing the expiry against the current time.
    pub fn new(
        expire_at: SystemTime,
        response_route_id: RouteId,
        remote_pk: PubKey,
        remote_port: Port,
        local_port: Port,
    ) -> Self {
        Self::new_at(
            expire_at,
            response_route_id,
            remote_pk,
            remote_port,
            local_port,
            SystemTime::now(),
        )
    }

    /// Create an App rule, normalizing the expiry against `now`.
    pub fn new_at(
        expire_at: SystemTime,
        response_route_id: RouteId,
        remote_pk: PubKey,
        remote_port: Port,
        local_port: Port,
        now: SystemTime,
    ) -> Self {
        Self {
            expire_at: normalize_expiry(expire_at, now),
            response_route_id,
            remote_pk,
            remote_port,
            local_port,
        }
    }

    /// Stored expiry in unix seconds.
    pub fn expiry_secs(&self) -> u64 {
        self.expire_at
    }

    /// RouteID that reply traffic is tagged with.
    pub fn response_route_id(&self) -> RouteId {
        self.response_route_id
    }

    /// Public key of the remote visor.
    pub fn remote_pk(&self) -> PubKey {
        self.remote_pk
    }

    /// Port of the remote application.
    pub fn remote_port(&self) -> Port {
        self.remote_port
    }

    /// Port of the local application.
    pub fn local_port(&self) -> Port {
        self.local_port
    }
}

/// Rule for packets relabeled and forwarded to the next hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ForwardRule {
    expire_at: u64,
    next_route_id: RouteId,
    next_transport_id: TransportId,
}

impl ForwardRule {
    /// Create a Forward rule, normalizing the expiry against the current time.
    pub fn new(expire_at: SystemTime, next_route_id: RouteId, next_transport_id: TransportId) -> Self {
        Self::new_at(expire_at, next_route_id, next_transport_id, SystemTime::now())
    }

    /// Create a Forward rule, normalizing the expiry against `now`.
    pub fn new_at(
        expire_at: SystemTime,
        next_route_id: RouteId,
        next_transport_id: TransportId,
        now: SystemTime,
    ) -> Self {
        Self {
            expire_at: normalize_expiry(expire_at, now),
            next_route_id,
            next_transport_id,
        }
    }

    /// Stored expiry in unix seconds.
    pub fn expiry_secs(&self) -> u64 {
        self.expire_at
    }

    /// RouteID the packet is relabeled with before forwarding.
    pub fn next_route_id(&self) -> RouteId {
        self.next_route_id
    }

    /// Transport the packet leaves on.
    pub fn next_transport_id(&self) -> TransportId {
        self.next_transport_id
    }
}

// ============================================================================
// Rule
// ============================================================================

/// A routing rule.
///
/// The variant is fixed at construction. The type-guarded accessors on
/// `Rule` return [`RoutingError::InvalidRuleAccess`] when used on the wrong
/// variant; match on the enum to get infallible access instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    App(AppRule),
    Forward(ForwardRule),
}

impl Rule {
    /// Create an App rule.
    pub fn app(
        expire_at: SystemTime,
        response_route_id: RouteId,
        remote_pk: PubKey,
        remote_port: Port,
        local_port: Port,
    ) -> Self {
        Rule::App(AppRule::new(
            expire_at,
            response_route_id,
            remote_pk,
            remote_port,
            local_port,
        ))
    }

    /// Create a Forward rule.
    pub fn forward(
        expire_at: SystemTime,
        next_route_id: RouteId,
        next_transport_id: TransportId,
    ) -> Self {
        Rule::Forward(ForwardRule::new(expire_at, next_route_id, next_transport_id))
    }

    /// The rule's type.
    pub fn rule_type(&self) -> RuleType {
        match self {
            Rule::App(_) => RuleType::App,
            Rule::Forward(_) => RuleType::Forward,
        }
    }

    /// Stored expiry in unix seconds (0 when none or already expired).
    pub fn expiry_secs(&self) -> u64 {
        match self {
            Rule::App(r) => r.expire_at,
            Rule::Forward(r) => r.expire_at,
        }
    }

    /// Stored expiry as a point in time. A stored 0 maps to the epoch.
    ///
    /// Returns `None` when the stored seconds do not fit in a `SystemTime`
    /// on this platform.
    pub fn expiry(&self) -> Option<SystemTime> {
        UNIX_EPOCH.checked_add(Duration::from_secs(self.expiry_secs()))
    }

    /// Check whether the rule's expiry has passed at `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expiry_secs() <= unix_secs(now)
    }

    /// The route id field: response route id for App rules, next route id
    /// for Forward rules.
    pub fn route_id(&self) -> RouteId {
        match self {
            Rule::App(r) => r.response_route_id,
            Rule::Forward(r) => r.next_route_id,
        }
    }

    /// Replace the route id field, leaving every other field untouched.
    pub fn set_route_id(&mut self, route_id: RouteId) {
        match self {
            Rule::App(r) => r.response_route_id = route_id,
            Rule::Forward(r) => r.next_route_id = route_id,
        }
    }

    /// The App variant, if this is one.
    pub fn as_app(&self) -> Option<&AppRule> {
        match self {
            Rule::App(r) => Some(r),
            Rule::Forward(_) => None,
        }
    }

    /// The Forward variant, if this is one.
    pub fn as_forward(&self) -> Option<&ForwardRule> {
        match self {
            Rule::Forward(r) => Some(r),
            Rule::App(_) => None,
        }
    }

    fn app_only(&self, accessor: &'static str) -> Result<&AppRule, RoutingError> {
        self.as_app().ok_or(RoutingError::InvalidRuleAccess {
            accessor,
            rule_type: self.rule_type(),
        })
    }

    /// Remote visor public key (App rules only).
    pub fn remote_pk(&self) -> Result<PubKey, RoutingError> {
        Ok(self.app_only("remote_pk")?.remote_pk)
    }

    /// Remote application port (App rules only).
    pub fn remote_port(&self) -> Result<Port, RoutingError> {
        Ok(self.app_only("remote_port")?.remote_port)
    }

    /// Local application port (App rules only).
    pub fn local_port(&self) -> Result<Port, RoutingError> {
        Ok(self.app_only("local_port")?.local_port)
    }

    /// Outgoing transport (Forward rules only).
    pub fn transport_id(&self) -> Result<TransportId, RoutingError> {
        self.as_forward()
            .map(|r| r.next_transport_id)
            .ok_or(RoutingError::InvalidRuleAccess {
                accessor: "transport_id",
                rule_type: self.rule_type(),
            })
    }

    /// Check whether this rule serves the given endpoint pair.
    ///
    /// App rules match on remote key, remote port and local port; the local
    /// key is the visor's own and is not stored in the rule. Forward rules
    /// never match.
    pub fn matches_descriptor(&self, desc: &RouteDescriptor) -> bool {
        match self {
            Rule::App(r) => {
                r.remote_pk == desc.remote().pk
                    && r.remote_port == desc.remote().port
                    && r.local_port == desc.local().port
            }
            Rule::Forward(_) => false,
        }
    }

    /// Encoded size of this rule.
    pub fn encoded_len(&self) -> usize {
        match self {
            Rule::App(_) => APP_RULE_SIZE,
            Rule::Forward(_) => FORWARD_RULE_SIZE,
        }
    }

    /// Encode to the wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.expiry_secs().to_be_bytes());
        buf.push(self.rule_type().to_byte());
        buf.extend_from_slice(&self.route_id().to_be_bytes());

        match self {
            Rule::App(r) => {
                buf.extend_from_slice(r.remote_pk.as_bytes());
                buf.extend_from_slice(&r.remote_port.as_u16().to_be_bytes());
                buf.extend_from_slice(&r.local_port.as_u16().to_be_bytes());
            }
            Rule::Forward(r) => {
                buf.extend_from_slice(r.next_transport_id.as_bytes());
            }
        }

        buf
    }

    /// Decode from the wire layout.
    ///
    /// The buffer must hold exactly one rule of the size its type tag
    /// implies.
    pub fn decode(bytes: &[u8]) -> Result<Self, RoutingError> {
        let mut reader = RuleReader::new(bytes);

        let expire_at = reader.read_u64()?;
        let type_byte = reader.read_u8()?;
        let rule_type = RuleType::from_byte(type_byte).ok_or_else(|| {
            RoutingError::CorruptRule(format!("unknown rule type 0x{:02x}", type_byte))
        })?;
        let route_id = RouteId::new(reader.read_u32()?);

        let expected = match rule_type {
            RuleType::App => APP_RULE_SIZE,
            RuleType::Forward => FORWARD_RULE_SIZE,
        };
        if bytes.len() != expected {
            return Err(RoutingError::CorruptRule(format!(
                "{} rule must be {} bytes, got {}",
                rule_type,
                expected,
                bytes.len()
            )));
        }

        let rule = match rule_type {
            RuleType::App => Rule::App(AppRule {
                expire_at,
                response_route_id: route_id,
                remote_pk: PubKey::from_bytes(reader.read_array()?),
                remote_port: Port::new(reader.read_u16()?),
                local_port: Port::new(reader.read_u16()?),
            }),
            RuleType::Forward => Rule::Forward(ForwardRule {
                expire_at,
                next_route_id: route_id,
                next_transport_id: TransportId::from_bytes(reader.read_array()?),
            }),
        };

        Ok(rule)
    }

    /// Structured view for API boundaries.
    pub fn to_summary(&self) -> RuleSummary {
        match self {
            Rule::App(r) => RuleSummary {
                expire_at: r.expire_at,
                rule_type: RuleType::App,
                app_fields: Some(RuleAppFields {
                    resp_rid: r.response_route_id,
                    remote_pk: r.remote_pk,
                    remote_port: r.remote_port,
                    local_port: r.local_port,
                }),
                forward_fields: None,
            },
            Rule::Forward(r) => RuleSummary {
                expire_at: r.expire_at,
                rule_type: RuleType::Forward,
                app_fields: None,
                forward_fields: Some(RuleForwardFields {
                    next_rid: r.next_route_id,
                    next_tid: r.next_transport_id,
                }),
            },
        }
    }

    /// Rebuild a rule from its summary.
    ///
    /// The summary's expiry is taken verbatim so that a rule survives the
    /// round trip unchanged.
    pub fn from_summary(summary: &RuleSummary) -> Result<Self, RoutingError> {
        match (
            summary.rule_type,
            &summary.app_fields,
            &summary.forward_fields,
        ) {
            (RuleType::App, Some(f), None) => Ok(Rule::App(AppRule {
                expire_at: summary.expire_at,
                response_route_id: f.resp_rid,
                remote_pk: f.remote_pk,
                remote_port: f.remote_port,
                local_port: f.local_port,
            })),
            (RuleType::Forward, None, Some(f)) => Ok(Rule::Forward(ForwardRule {
                expire_at: summary.expire_at,
                next_route_id: f.next_rid,
                next_transport_id: f.next_tid,
            })),
            (RuleType::App, _, _) => Err(RoutingError::InvalidRuleSummary(
                "App summary must carry app_fields and no forward_fields".into(),
            )),
            (RuleType::Forward, _, _) => Err(RoutingError::InvalidRuleSummary(
                "Forward summary must carry forward_fields and no app_fields".into(),
            )),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::App(r) => write!(
                f,
                "App: <resp-rid: {}><remote-pk: {}><remote-port: {}><local-port: {}>",
                r.response_route_id, r.remote_pk, r.remote_port, r.local_port
            ),
            Rule::Forward(r) => write!(
                f,
                "Forward: <next-rid: {}><next-tid: {}>",
                r.next_route_id, r.next_transport_id
            ),
        }
    }
}

impl From<AppRule> for Rule {
    fn from(rule: AppRule) -> Self {
        Rule::App(rule)
    }
}

impl From<ForwardRule> for Rule {
    fn from(rule: ForwardRule) -> Self {
        Rule::Forward(rule)
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Bounds-checked cursor over an encoded rule.
struct RuleReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RuleReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], RoutingError> {
        let end = self.pos + N;
        let slice = self.buf.get(self.pos..end).ok_or_else(|| {
            RoutingError::CorruptRule(format!(
                "need {} bytes at offset {}, buffer is {} bytes",
                N,
                self.pos,
                self.buf.len()
            ))
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, RoutingError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> Result<u16, RoutingError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, RoutingError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, RoutingError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }
}

// ============================================================================
// Rule Summary
// ============================================================================

/// App-specific fields of a [`RuleSummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAppFields {
    pub resp_rid: RouteId,
    pub remote_pk: PubKey,
    pub remote_port: Port,
    pub local_port: Port,
}

/// Forward-specific fields of a [`RuleSummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleForwardFields {
    pub next_rid: RouteId,
    pub next_tid: TransportId,
}

/// Structured projection of a [`Rule`] for management APIs.
///
/// Never sent between visors; exactly one of the field groups is present,
/// matching `rule_type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    /// Stored expiry in unix seconds.
    pub expire_at: u64,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_fields: Option<RuleAppFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_fields: Option<RuleForwardFields>,
}

impl RuleSummary {
    /// Convert back into a rule, validating the field groups.
    pub fn to_rule(&self) -> Result<Rule, RoutingError> {
        Rule::from_summary(self)
    }
}
