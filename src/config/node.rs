//! Node configuration subsections.
//!
//! The `node.*` parameters: identity, routing table tuning and internal
//! channel sizes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::routing::{TableConfig, DEFAULT_GC_BATCH_SIZE, DEFAULT_GC_INTERVAL, DEFAULT_KEEP_ALIVE};

/// Default packet channel capacity.
const DEFAULT_PACKET_CHANNEL: usize = 1024;

/// Default app delivery channel capacity.
const DEFAULT_APP_CHANNEL: usize = 1024;

/// Identity configuration (`node.identity.*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Hex-encoded secret key (`node.identity.secret`).
    /// If not specified, a new keypair will be generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Routing table parameters (`node.routing.*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Idle time before a forward rule is stale (`node.routing.keep_alive_secs`).
    /// Defaults to 1800.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive_secs: Option<u64>,

    /// Interval between GC sweeps (`node.routing.gc_interval_secs`).
    /// Defaults to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc_interval_secs: Option<u64>,

    /// Removals per lock acquisition during a sweep (`node.routing.gc_batch_size`).
    /// Defaults to 256.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc_batch_size: Option<usize>,
}

impl RoutingConfig {
    /// Get the keep-alive, using default if not configured.
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_KEEP_ALIVE)
    }

    /// Get the GC interval, using default if not configured.
    pub fn gc_interval(&self) -> Duration {
        self.gc_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GC_INTERVAL)
    }

    /// Get the GC batch size, using default if not configured.
    pub fn gc_batch_size(&self) -> usize {
        self.gc_batch_size.unwrap_or(DEFAULT_GC_BATCH_SIZE)
    }

    /// Build the routing table parameters.
    pub fn table_config(&self) -> TableConfig {
        TableConfig {
            keep_alive: self.keep_alive(),
            gc_interval: self.gc_interval(),
            gc_batch_size: self.gc_batch_size(),
        }
    }

    fn merge(&mut self, other: RoutingConfig) {
        if other.keep_alive_secs.is_some() {
            self.keep_alive_secs = other.keep_alive_secs;
        }
        if other.gc_interval_secs.is_some() {
            self.gc_interval_secs = other.gc_interval_secs;
        }
        if other.gc_batch_size.is_some() {
            self.gc_batch_size = other.gc_batch_size;
        }
    }
}

/// Internal channel sizes (`node.buffers.*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuffersConfig {
    /// Received-packet channel capacity (`node.buffers.packet_channel`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_channel: Option<usize>,

    /// Local app delivery channel capacity (`node.buffers.app_channel`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_channel: Option<usize>,
}

impl BuffersConfig {
    pub fn packet_channel(&self) -> usize {
        self.packet_channel.unwrap_or(DEFAULT_PACKET_CHANNEL)
    }

    pub fn app_channel(&self) -> usize {
        self.app_channel.unwrap_or(DEFAULT_APP_CHANNEL)
    }

    fn merge(&mut self, other: BuffersConfig) {
        if other.packet_channel.is_some() {
            self.packet_channel = other.packet_channel;
        }
        if other.app_channel.is_some() {
            self.app_channel = other.app_channel;
        }
    }
}

/// Node configuration (`node.*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Identity (`node.identity`).
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Routing table (`node.routing`).
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Channel sizes (`node.buffers`).
    #[serde(default)]
    pub buffers: BuffersConfig,
}

impl NodeConfig {
    pub(super) fn merge(&mut self, other: NodeConfig) {
        if other.identity.secret.is_some() {
            self.identity.secret = other.identity.secret;
        }
        self.routing.merge(other.routing);
        self.buffers.merge(other.buffers);
    }
}
