//! Bounded per-endpoint probe history.
//!
//! The endpoint set is fixed at construction, so the outer map is never
//! mutated and needs no lock. Each endpoint's sequence sits behind its own
//! mutex: writers for different endpoints never wait on each other.

use indexmap::IndexMap;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::ProbeResult;

pub type Snapshot = Vec<(String, Vec<ProbeResult>)>;

pub struct HistoryStore {
    capacity: usize,
    entries: IndexMap<String, Mutex<VecDeque<ProbeResult>>>,
}

impl HistoryStore {
    /// Creates an empty history per endpoint, in the given order. Repeated
    /// endpoints share the slot of their first occurrence. A zero capacity
    /// is raised to one.
    pub fn new(endpoints: &[String], capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let entries = endpoints
            .iter()
            .map(|e| (e.clone(), Mutex::new(VecDeque::with_capacity(capacity + 1))))
            .collect();
        Self { capacity, entries }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tracked endpoints, each once, in configuration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Appends `result` and evicts from the front until the sequence fits.
    /// Returns `false` when the endpoint is not tracked.
    pub async fn record(&self, endpoint: &str, result: ProbeResult) -> bool {
        let Some(slot) = self.entries.get(endpoint) else {
            warn!(endpoint, "Dropping result for untracked endpoint");
            return false;
        };
        let mut history = slot.lock().await;
        history.push_back(result);
        while history.len() > self.capacity {
            history.pop_front();
        }
        true
    }

    pub async fn latest(&self, endpoint: &str) -> Option<ProbeResult> {
        let slot = self.entries.get(endpoint)?;
        slot.lock().await.back().cloned()
    }

    #[cfg(test)]
    pub async fn history(&self, endpoint: &str) -> Option<Vec<ProbeResult>> {
        let slot = self.entries.get(endpoint)?;
        Some(slot.lock().await.iter().cloned().collect())
    }

    /// Copies every endpoint's history, in configuration order.
    pub async fn snapshot(&self) -> Snapshot {
        let mut out = Vec::with_capacity(self.entries.len());
        for (endpoint, slot) in &self.entries {
            let history = slot.lock().await.iter().cloned().collect();
            out.push((endpoint.clone(), history));
        }
        out
    }
}
