//! Circular Pattern Detector
//!
//! Builds a directed wallet-transfer graph for one mint and looks for short
//! cycles (A→B→C→A). Parallel transfers between the same pair of wallets are
//! folded into one edge carrying the summed amount, the signatures and the
//! observed time range.
//!
//! # Features
//! - Bounded depth-first search from every unvisited wallet
//! - Rotation/order-insensitive deduplication by participant set
//! - Confidence from cycle length and total cycle duration

use crate::oracle::types::{SwapEvent, TxSignature, WalletAddress};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Most wallets a reported cycle may span
pub const MAX_CYCLE_WALLETS: usize = 4;

/// Per-root cap on raw cycles explored before deduplication
const MAX_CYCLES_PER_ROOT: usize = 64;

/// Aggregated transfers from one wallet to another
#[derive(Debug, Clone, Default)]
pub struct TransferFlow {
    pub total_amount: f64,
    pub signatures: Vec<TxSignature>,
    pub first_ms: i64,
    pub last_ms: i64,
}

/// A detected cycle of wallets passing the token around
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularPattern {
    /// Participants in cycle order, starting at the search root
    pub wallets: Vec<WalletAddress>,
    pub transactions: Vec<TxSignature>,
    pub total_volume: f64,
    pub cycle_time_ms: i64,
    pub confidence: u8,
}

/// Directed transfer graph for a single mint
#[derive(Debug, Default)]
pub struct TransferGraph {
    graph: DiGraph<WalletAddress, TransferFlow>,
    wallet_to_node: HashMap<WalletAddress, NodeIndex>,
    edge_index: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl TransferGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every well-formed transfer of `mint`
    pub fn from_swaps(swaps: &[SwapEvent], mint: &str, excluded: &HashSet<WalletAddress>) -> Self {
        let mut graph = Self::new();
        for event in swaps {
            for transfer in &event.transfers {
                let Some((from, to, amount)) = transfer.resolve(mint) else {
                    continue;
                };
                if excluded.contains(from) || excluded.contains(to) {
                    continue;
                }
                graph.add_transfer(from, to, amount, &event.signature, event.timestamp_ms);
            }
        }
        graph
    }

    fn get_or_create_node(&mut self, wallet: &str) -> NodeIndex {
        if let Some(&idx) = self.wallet_to_node.get(wallet) {
            return idx;
        }
        let idx = self.graph.add_node(wallet.to_string());
        self.wallet_to_node.insert(wallet.to_string(), idx);
        idx
    }

    /// Record a transfer, merging it into the existing edge for the pair
    pub fn add_transfer(&mut self, from: &str, to: &str, amount: f64, signature: &str, timestamp_ms: i64) {
        let from_idx = self.get_or_create_node(from);
        let to_idx = self.get_or_create_node(to);

        let edge = match self.edge_index.get(&(from_idx, to_idx)) {
            Some(&edge) => edge,
            None => {
                let edge = self.graph.add_edge(
                    from_idx,
                    to_idx,
                    TransferFlow {
                        first_ms: timestamp_ms,
                        last_ms: timestamp_ms,
                        ..Default::default()
                    },
                );
                self.edge_index.insert((from_idx, to_idx), edge);
                edge
            }
        };

        if let Some(flow) = self.graph.edge_weight_mut(edge) {
            flow.total_amount += amount;
            if !flow.signatures.iter().any(|s| s == signature) {
                flow.signatures.push(signature.to_string());
            }
            flow.first_ms = flow.first_ms.min(timestamp_ms);
            flow.last_ms = flow.last_ms.max(timestamp_ms);
        }
    }

    pub fn wallet_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Aggregated flow from `from` to `to`, if any transfer exists
    pub fn flow(&self, from: &str, to: &str) -> Option<&TransferFlow> {
        let from_idx = self.wallet_to_node.get(from)?;
        let to_idx = self.wallet_to_node.get(to)?;
        self.flow_between(*from_idx, *to_idx)
    }

    fn flow_between(&self, from: NodeIndex, to: NodeIndex) -> Option<&TransferFlow> {
        let edge = self.edge_index.get(&(from, to))?;
        self.graph.edge_weight(*edge)
    }
}

/// Bounded cycle search over a [`TransferGraph`]
#[derive(Debug, Clone)]
pub struct CircularPatternDetector {
    min_cycle_length: usize,
    max_cycle_length: usize,
    max_patterns: usize,
    fast_cycle_ms: i64,
}

impl CircularPatternDetector {
    pub fn new(min_cycle_length: usize, max_cycle_length: usize, max_patterns: usize, fast_cycle_ms: i64) -> Self {
        Self {
            min_cycle_length: min_cycle_length.max(3),
            max_cycle_length: max_cycle_length.max(min_cycle_length.max(3)).min(MAX_CYCLE_WALLETS),
            max_patterns,
            fast_cycle_ms,
        }
    }

    /// Find deduplicated cycles, strongest first
    pub fn detect(&self, graph: &TransferGraph) -> Vec<CircularPattern> {
        let g = &graph.graph;
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut seen_keys: HashSet<Vec<String>> = HashSet::new();
        let mut patterns = Vec::new();

        for root in g.node_indices() {
            if visited.contains(&root) {
                continue;
            }

            let mut cycles = Vec::new();
            let mut path = vec![root];
            self.search_cycles(graph, root, root, &mut path, &mut cycles);
            visited.insert(root);

            for cycle in cycles {
                let Some(pattern) = self.build_pattern(graph, &cycle) else {
                    continue;
                };

                let mut key = pattern.wallets.clone();
                key.sort();
                if seen_keys.insert(key) {
                    visited.extend(cycle.iter().copied());
                    patterns.push(pattern);
                }
            }
        }

        patterns.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| b.total_volume.total_cmp(&a.total_volume))
        });
        patterns.truncate(self.max_patterns);

        debug!(
            wallets = graph.wallet_count(),
            edges = graph.edge_count(),
            patterns = patterns.len(),
            "Circular pattern search complete"
        );

        patterns
    }

    /// Depth-first search for paths from `current` back to `start`.
    ///
    /// `path` holds the wallets on the current branch (root first) and never
    /// grows beyond `max_cycle_length`.
    fn search_cycles(
        &self,
        graph: &TransferGraph,
        start: NodeIndex,
        current: NodeIndex,
        path: &mut Vec<NodeIndex>,
        found: &mut Vec<Vec<NodeIndex>>,
    ) {
        for edge in graph.graph.edges_directed(current, Direction::Outgoing) {
            if found.len() >= MAX_CYCLES_PER_ROOT {
                return;
            }

            let target = edge.target();
            if target == start {
                if path.len() >= self.min_cycle_length {
                    found.push(path.clone());
                }
                continue;
            }

            if path.len() >= self.max_cycle_length || path.contains(&target) {
                continue;
            }

            path.push(target);
            self.search_cycles(graph, start, target, path, found);
            path.pop();
        }
    }

    fn build_pattern(&self, graph: &TransferGraph, cycle: &[NodeIndex]) -> Option<CircularPattern> {
        let distinct: HashSet<_> = cycle.iter().collect();
        if distinct.len() < self.min_cycle_length || cycle.len() > self.max_cycle_length {
            return None;
        }

        let mut total_volume = 0.0;
        let mut transactions: Vec<TxSignature> = Vec::new();
        let mut first_ms = i64::MAX;
        let mut last_ms = i64::MIN;

        for (i, &from) in cycle.iter().enumerate() {
            let to = cycle[(i + 1) % cycle.len()];
            let flow = graph.flow_between(from, to)?;
            total_volume += flow.total_amount;
            first_ms = first_ms.min(flow.first_ms);
            last_ms = last_ms.max(flow.last_ms);
            for signature in &flow.signatures {
                if !transactions.contains(signature) {
                    transactions.push(signature.clone());
                }
            }
        }

        if total_volume <= 0.0 {
            return None;
        }

        let cycle_time_ms = (last_ms - first_ms).max(0);
        let wallets = cycle
            .iter()
            .filter_map(|idx| graph.graph.node_weight(*idx).cloned())
            .collect();

        Some(CircularPattern {
            wallets,
            transactions,
            total_volume,
            cycle_time_ms,
            confidence: self.confidence(cycle.len(), cycle_time_ms),
        })
    }

    fn confidence(&self, cycle_len: usize, cycle_time_ms: i64) -> u8 {
        let length_bonus = if cycle_len <= 3 { 20 } else { 10 };
        let speed_bonus = if cycle_time_ms < self.fast_cycle_ms { 30 } else { 10 };
        (50 + length_bonus + speed_bonus).min(100) as u8
    }
}
