//! Routing table: RouteID → Rule store with keep-alive tracking.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{RouteDescriptor, RouteId, RoutingError, Rule, RuleType};

/// Default idle time after which a Forward rule is stale (30 minutes).
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30 * 60);

/// Default interval between garbage collection sweeps.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of removals per write-lock acquisition during GC.
pub const DEFAULT_GC_BATCH_SIZE: usize = 256;

/// Routing table parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// Idle time after which a Forward rule is stale.
    pub keep_alive: Duration,
    /// Interval between garbage collection sweeps.
    pub gc_interval: Duration,
    /// Removals per write-lock acquisition during a sweep.
    pub gc_batch_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            keep_alive: DEFAULT_KEEP_ALIVE,
            gc_interval: DEFAULT_GC_INTERVAL,
            gc_batch_size: DEFAULT_GC_BATCH_SIZE,
        }
    }
}

/// Routing table statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Stored rules, stale ones included.
    pub rules: usize,
    /// Stored App rules.
    pub app_rules: usize,
    /// Stored Forward rules.
    pub forward_rules: usize,
    /// Forward rules past their keep-alive but not yet collected.
    pub stale: usize,
}

/// The routing table contract shared by the router and the management API.
///
/// The in-memory [`MemoryTable`] is the reference implementation; durable
/// backends implement the same trait and may block on storage I/O, so
/// callers must not assume any operation is instantaneous.
pub trait RoutingTable: Send + Sync {
    /// Allocate the next unused RouteID. IDs increase strictly and never
    /// wrap.
    fn reserve_id(&self) -> Result<RouteId, RoutingError>;

    /// Insert or replace the rule at `route_id`, marking it active now.
    fn save_rule(&self, route_id: RouteId, rule: Rule) -> Result<(), RoutingError>;

    /// Mark an existing rule active now.
    fn update_activity(&self, route_id: RouteId) -> Result<(), RoutingError>;

    /// Look up a rule. Does not refresh activity.
    fn rule(&self, route_id: RouteId) -> Result<Rule, RoutingError>;

    /// Non-stale rules serving the given endpoint pair.
    fn rules_with_descriptor(&self, desc: &RouteDescriptor) -> Result<Vec<Rule>, RoutingError>;

    /// All non-stale rules.
    fn all_rules(&self) -> Result<Vec<Rule>, RoutingError>;

    /// All non-stale rules with their RouteIDs, ordered by RouteID.
    fn entries(&self) -> Result<Vec<(RouteId, Rule)>, RoutingError>;

    /// Remove rules. Unknown IDs are ignored.
    fn delete_rules(&self, route_ids: &[RouteId]) -> Result<(), RoutingError>;

    /// Number of stored rules, stale ones included.
    fn count(&self) -> usize;

    /// Remove stale Forward rules, returning how many were removed.
    fn collect_garbage(&self) -> usize;
}

#[derive(Clone, Debug)]
struct TableEntry {
    rule: Rule,
    last_activity: Instant,
}

impl TableEntry {
    fn is_stale(&self, now: Instant, keep_alive: Duration) -> bool {
        self.rule.rule_type() == RuleType::Forward
            && now.saturating_duration_since(self.last_activity) > keep_alive
    }
}

#[derive(Debug, Default)]
struct TableInner {
    /// Last RouteID handed out by `reserve_id`.
    last_id: u32,
    rules: HashMap<RouteId, TableEntry>,
}

/// In-memory routing table.
///
/// One reader/writer lock guards the ID counter and the rule map together,
/// so reservations and saves are atomic with respect to lookups. Share it
/// between tasks as `Arc<MemoryTable>`.
#[derive(Debug)]
pub struct MemoryTable {
    inner: RwLock<TableInner>,
    config: TableConfig,
}

impl MemoryTable {
    /// Create an empty table.
    pub fn new(config: TableConfig) -> Self {
        Self {
            inner: RwLock::new(TableInner::default()),
            config,
        }
    }

    /// Create a table with default parameters.
    pub fn with_defaults() -> Self {
        Self::new(TableConfig::default())
    }

    /// Get the table parameters.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Get the keep-alive duration.
    pub fn keep_alive(&self) -> Duration {
        self.config.keep_alive
    }

    /// Get table statistics.
    pub fn stats(&self) -> TableStats {
        let now = Instant::now();
        let inner = self.inner.read();

        let mut stats = TableStats {
            rules: inner.rules.len(),
            ..TableStats::default()
        };
        for entry in inner.rules.values() {
            match entry.rule.rule_type() {
                RuleType::App => stats.app_rules += 1,
                RuleType::Forward => stats.forward_rules += 1,
            }
            if entry.is_stale(now, self.config.keep_alive) {
                stats.stale += 1;
            }
        }
        stats
    }

    #[cfg(test)]
    pub(super) fn set_last_id(&self, last_id: u32) {
        self.inner.write().last_id = last_id;
    }

    fn live_rules<F>(&self, mut keep: F) -> Vec<(RouteId, Rule)>
    where
        F: FnMut(&Rule) -> bool,
    {
        let now = Instant::now();
        let inner = self.inner.read();
        inner
            .rules
            .iter()
            .filter(|(_, e)| !e.is_stale(now, self.config.keep_alive) && keep(&e.rule))
            .map(|(id, e)| (*id, e.rule))
            .collect()
    }
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RoutingTable for MemoryTable {
    fn reserve_id(&self) -> Result<RouteId, RoutingError> {
        let mut inner = self.inner.write();

        // Skip IDs already occupied by caller-chosen saves.
        loop {
            if inner.last_id == u32::MAX {
                return Err(RoutingError::NoAvailableRouteIds);
            }
            inner.last_id += 1;
            let candidate = RouteId::new(inner.last_id);
            if !inner.rules.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    fn save_rule(&self, route_id: RouteId, rule: Rule) -> Result<(), RoutingError> {
        let entry = TableEntry {
            rule,
            last_activity: Instant::now(),
        };
        self.inner.write().rules.insert(route_id, entry);
        Ok(())
    }

    fn update_activity(&self, route_id: RouteId) -> Result<(), RoutingError> {
        let mut inner = self.inner.write();
        let entry = inner
            .rules
            .get_mut(&route_id)
            .ok_or(RoutingError::RuleNotFound(route_id))?;
        entry.last_activity = Instant::now();
        Ok(())
    }

    fn rule(&self, route_id: RouteId) -> Result<Rule, RoutingError> {
        let now = Instant::now();
        let inner = self.inner.read();
        let entry = inner
            .rules
            .get(&route_id)
            .ok_or(RoutingError::RuleNotFound(route_id))?;

        if entry.is_stale(now, self.config.keep_alive) {
            return Err(RoutingError::RuleTimedOut(route_id));
        }
        Ok(entry.rule)
    }

    fn rules_with_descriptor(&self, desc: &RouteDescriptor) -> Result<Vec<Rule>, RoutingError> {
        Ok(self
            .live_rules(|rule| rule.matches_descriptor(desc))
            .into_iter()
            .map(|(_, rule)| rule)
            .collect())
    }

    fn all_rules(&self) -> Result<Vec<Rule>, RoutingError> {
        Ok(self
            .live_rules(|_| true)
            .into_iter()
            .map(|(_, rule)| rule)
            .collect())
    }

    fn entries(&self) -> Result<Vec<(RouteId, Rule)>, RoutingError> {
        let mut entries = self.live_rules(|_| true);
        entries.sort_by_key(|(id, _)| *id);
        Ok(entries)
    }

    fn delete_rules(&self, route_ids: &[RouteId]) -> Result<(), RoutingError> {
        let mut inner = self.inner.write();
        for route_id in route_ids {
            inner.rules.remove(route_id);
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.inner.read().rules.len()
    }

    fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let keep_alive = self.config.keep_alive;

        let candidates: Vec<RouteId> = {
            let inner = self.inner.read();
            inner
                .rules
                .iter()
                .filter(|(_, e)| e.is_stale(now, keep_alive))
                .map(|(id, _)| *id)
                .collect()
        };

        let mut removed = 0;
        for batch in candidates.chunks(self.config.gc_batch_size.max(1)) {
            let mut inner = self.inner.write();
            for route_id in batch {
                // Re-check: the rule may have been saved or touched since the scan.
                let still_stale = inner
                    .rules
                    .get(route_id)
                    .is_some_and(|e| e.is_stale(now, keep_alive));
                if still_stale {
                    inner.rules.remove(route_id);
                    removed += 1;
                }
            }
        }
        removed
    }
}
