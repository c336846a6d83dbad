use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::common::message::{RttEntry, RttMatrixResponse};

/// destination -> latest rtt (ns)
pub type RttVector = BTreeMap<String, i64>;

/// Latest RTT per (source, destination) edge.
///
/// Only the local node is ever written as a source: each agent measures its own
/// outbound edges. Entries are overwritten, never accumulated. Readers get owned
/// copies so a snapshot never aliases the live table.
#[derive(Debug)]
pub struct RttStore {
    node_id: String,
    table: RwLock<HashMap<String, HashMap<String, i64>>>,
}

impl RttStore {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            table: RwLock::new(HashMap::new()),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Inserts or overwrites the edge (local node -> destination). No validation of rtt.
    pub fn record(&self, destination: &str, rtt: i64) {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table
            .entry(self.node_id.clone())
            .or_default()
            .insert(destination.to_string(), rtt);
    }

    /// Read-consistent copy of the whole table, flattened and sorted for stable output.
    pub fn snapshot(&self) -> RttMatrixResponse {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let mut nodes: Vec<String> = table.keys().cloned().collect();
        nodes.sort();

        let mut entries: Vec<RttEntry> = table
            .iter()
            .flat_map(|(source, row)| {
                row.iter().map(move |(destination, rtt)| RttEntry {
                    source: source.clone(),
                    destination: destination.clone(),
                    rtt: *rtt,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.source.as_str(), a.destination.as_str())
                .cmp(&(b.source.as_str(), b.destination.as_str()))
        });

        RttMatrixResponse { nodes, entries }
    }

    pub fn local_vector(&self) -> RttVector {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .get(&self.node_id)
            .map(|row| row.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }
}
