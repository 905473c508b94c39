use indexmap::IndexMap;
use num_bigint::BigInt;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

/// A matched withdraw/deposit pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub asset: String,
    pub amount: String,
}

/// A withdraw or deposit with no counterpart in the same transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanEvent {
    pub account: String,
    pub asset: String,
    pub amount: String,
}

/// Unmatched deposits (`in`) and withdraws (`out`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orphans {
    #[serde(rename = "in")]
    pub incoming: Vec<OrphanEvent>,

    #[serde(rename = "out")]
    pub outgoing: Vec<OrphanEvent>,
}

impl Orphans {
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

/// Who sent what to whom within a single transaction
///
/// Transfers are in deposit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferGraph {
    pub transfers: Vec<Transfer>,
    pub orphans: Orphans,
}

impl TransferGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers grouped by sender, senders in first-seen order
    pub fn by_sender(&self) -> IndexMap<&str, Vec<&Transfer>> {
        let mut grouped: IndexMap<&str, Vec<&Transfer>> = IndexMap::new();
        for transfer in &self.transfers {
            grouped
                .entry(transfer.from.as_str())
                .or_default()
                .push(transfer);
        }
        grouped
    }

    /// Net amount per `(account, asset)`: received − sent + orphan in − orphan out
    ///
    /// Amounts that are not decimal integers are left out.
    pub fn net_flows(&self) -> IndexMap<(String, String), BigInt> {
        let mut flows: IndexMap<(String, String), BigInt> = IndexMap::new();
        let mut apply = |account: &str, asset: &str, amount: &str, inflow: bool| {
            let Ok(value) = amount.parse::<BigInt>() else {
                tracing::debug!("Skipping non-numeric amount {:?}", amount);
                return;
            };
            let entry = flows
                .entry((account.to_string(), asset.to_string()))
                .or_default();
            if inflow {
                *entry += value;
            } else {
                *entry -= value;
            }
        };

        for t in &self.transfers {
            apply(&t.from, &t.asset, &t.amount, false);
            apply(&t.to, &t.asset, &t.amount, true);
        }
        for o in &self.orphans.incoming {
            apply(&o.account, &o.asset, &o.amount, true);
        }
        for o in &self.orphans.outgoing {
            apply(&o.account, &o.asset, &o.amount, false);
        }

        flows
    }

    /// Account-level flow graph: one node per account, one edge per transfer
    pub fn flow_graph(&self) -> DiGraph<String, Transfer> {
        let mut graph = DiGraph::new();
        let mut index: IndexMap<&str, NodeIndex> = IndexMap::new();

        for transfer in &self.transfers {
            let from = *index
                .entry(transfer.from.as_str())
                .or_insert_with(|| graph.add_node(transfer.from.clone()));
            let to = *index
                .entry(transfer.to.as_str())
                .or_insert_with(|| graph.add_node(transfer.to.clone()));
            graph.add_edge(from, to, transfer.clone());
        }

        graph
    }

    /// Export the flow graph to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let graph = self.flow_graph();
        let mut dot = "digraph TransferGraph {\n".to_string();
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for node in graph.node_indices() {
            let account = &graph[node];
            dot.push_str(&format!(
                "  n{} [label=\"{}\"];\n",
                node.index(),
                display_account(account)
            ));
        }

        dot.push('\n');

        for edge in graph.edge_indices() {
            if let Some((from, to)) = graph.edge_endpoints(edge) {
                let transfer = &graph[edge];
                dot.push_str(&format!(
                    "  n{} -> n{} [label=\"{} {}\"];\n",
                    from.index(),
                    to.index(),
                    transfer.amount,
                    truncate_address(&transfer.asset)
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }
}

/// Shorten long hex addresses to `0x1234..abcd`
pub fn truncate_address(addr: &str) -> String {
    if addr.len() <= 12 || !addr.is_ascii() {
        return addr.to_string();
    }
    format!("{}..{}", &addr[..6], &addr[addr.len() - 4..])
}

/// Truncated account, or a placeholder for unresolved stores
pub fn display_account(account: &str) -> String {
    if account.is_empty() {
        "(unresolved)".to_string()
    } else {
        truncate_address(account)
    }
}
