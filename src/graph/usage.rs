use std::collections::HashMap;

use crate::model::{
    DeadCodeImpact, DeadCodeInfo, DeadCodeReason, Edge, EdgeRelation, Graph, NodeKind,
    UsageStatistics,
};

/// True when the edge keeps its target alive. A mapped API call (uses) is a
/// recorded call into the endpoint; reads and writes-to edges count only
/// when the mapper refined them, never the broad placeholder form.
fn grants_liveness(edge: &Edge) -> bool {
    match edge.relation {
        EdgeRelation::Imports
        | EdgeRelation::Renders
        | EdgeRelation::Contains
        | EdgeRelation::Calls
        | EdgeRelation::Uses => true,
        EdgeRelation::Reads | EdgeRelation::WritesTo => {
            !edge.properties.contains_key("placeholder")
        }
        EdgeRelation::Displays => false,
    }
}

pub struct UsageReport {
    pub dead_code: Vec<DeadCodeInfo>,
    pub statistics: UsageStatistics,
}

/// Score every node: 100 when imported, exported, called, used through a
/// mapped connection, or referenced by a renders/contains/calls edge, else
/// 0. Emits exactly one dead-code entry per liveness-0 node. Section nodes
/// are entry points and always live.
pub fn score_liveness(graph: &mut Graph) -> UsageReport {
    let mut live_incoming: HashMap<u64, usize> = HashMap::new();
    let mut any_incoming: HashMap<u64, usize> = HashMap::new();
    for edge in &graph.edges {
        *any_incoming.entry(edge.target).or_default() += 1;
        if grants_liveness(edge) {
            *live_incoming.entry(edge.target).or_default() += 1;
        }
    }

    let mut dead_code = Vec::new();
    let mut statistics = UsageStatistics::default();

    for node in &mut graph.nodes {
        let exported = matches!(node.kind, NodeKind::Component { exported: true, .. });
        let entry_point = matches!(node.kind, NodeKind::Section { .. });
        let live_count = live_incoming.get(&node.id).copied().unwrap_or(0);
        let usage_count = any_incoming.get(&node.id).copied().unwrap_or(0);

        let live = exported || entry_point || live_count > 0;
        node.live_code_score = if live { 100 } else { 0 };

        statistics.total_entities += 1;
        *statistics
            .by_category
            .entry(node.category.as_str().to_string())
            .or_default() += 1;
        if live {
            statistics.live_entities += 1;
            continue;
        }
        statistics.dead_entities += 1;
        *statistics
            .dead_by_category
            .entry(node.category.as_str().to_string())
            .or_default() += 1;

        dead_code.push(DeadCodeInfo {
            name: node.label.clone(),
            kind: kind_name(&node.kind).to_string(),
            file: node.file.clone(),
            reason: dead_reason(&node.kind),
            confidence: dead_confidence(usage_count),
            impact: dead_impact(&node.kind, usage_count),
        });
    }

    UsageReport {
        dead_code,
        statistics,
    }
}

fn kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Component { .. } => "component",
        NodeKind::Element { .. } => "element",
        NodeKind::Handler { .. } => "handler",
        NodeKind::ExternalPackage { .. } => "package",
        NodeKind::Section { .. } => "section",
        NodeKind::Endpoint { .. } => "endpoint",
        NodeKind::Storage { .. } => "storage",
    }
}

fn dead_reason(kind: &NodeKind) -> DeadCodeReason {
    match kind {
        NodeKind::Component { .. } | NodeKind::ExternalPackage { .. } => DeadCodeReason::Unused,
        NodeKind::Endpoint { .. } | NodeKind::Storage { .. } => DeadCodeReason::Unreachable,
        _ => DeadCodeReason::NoIncomingEdges,
    }
}

/// Confidence rises as the recorded usage count falls. Weak references
/// (displays, uses, reads) do not keep a node alive but do lower the
/// confidence that it is truly dead.
fn dead_confidence(usage_count: usize) -> f64 {
    (1.0 - usage_count as f64 * 0.1).clamp(0.3, 0.95)
}

fn dead_impact(kind: &NodeKind, usage_count: usize) -> DeadCodeImpact {
    match kind {
        NodeKind::Component { .. } | NodeKind::Endpoint { .. } | NodeKind::Storage { .. } => {
            DeadCodeImpact::High
        }
        NodeKind::Handler { .. } => {
            if usage_count > 0 {
                DeadCodeImpact::Medium
            } else {
                DeadCodeImpact::High
            }
        }
        _ => DeadCodeImpact::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ComponentKind, Edge, GraphMetadata, GraphScope, GraphStats, Node, Ownership,
        SCHEMA_VERSION,
    };
    use std::collections::BTreeMap;

    fn node(id: u64, label: &str, kind: NodeKind) -> Node {
        Node {
            id,
            label: label.to_string(),
            category: kind.category(),
            node_type: kind.node_type(),
            kind,
            live_code_score: 0,
            file: "src/App.jsx".to_string(),
            position: None,
            ownership: Ownership::Internal,
            properties: BTreeMap::new(),
        }
    }

    fn edge(id: u64, source: u64, target: u64, relation: EdgeRelation) -> Edge {
        Edge {
            id,
            source,
            target,
            relation,
            properties: BTreeMap::new(),
        }
    }

    fn empty_metadata() -> GraphMetadata {
        GraphMetadata {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: 0,
            scope: GraphScope {
                included_categories: Vec::new(),
                excluded_categories: Vec::new(),
            },
            stats: GraphStats {
                node_count: 0,
                edge_count: 0,
                live_nodes: 0,
                dead_nodes: 0,
            },
        }
    }

    fn component(id: u64, label: &str, exported: bool) -> Node {
        node(
            id,
            label,
            NodeKind::Component {
                component_kind: ComponentKind::Function,
                exported,
            },
        )
    }

    #[test]
    fn exported_component_is_live_without_edges() {
        let mut graph = Graph {
            nodes: vec![component(0, "App", true)],
            edges: vec![],
            metadata: empty_metadata(),
        };
        let report = score_liveness(&mut graph);
        assert_eq!(graph.nodes[0].live_code_score, 100);
        assert!(report.dead_code.is_empty());
    }

    #[test]
    fn unreferenced_component_yields_one_dead_entry() {
        let mut graph = Graph {
            nodes: vec![component(0, "App", true), component(1, "Orphan", false)],
            edges: vec![],
            metadata: empty_metadata(),
        };
        let report = score_liveness(&mut graph);
        assert_eq!(graph.nodes[1].live_code_score, 0);
        assert_eq!(report.dead_code.len(), 1);
        let dead = &report.dead_code[0];
        assert_eq!(dead.name, "Orphan");
        assert_eq!(dead.reason, DeadCodeReason::Unused);
        assert_eq!(dead.impact, DeadCodeImpact::High);
        assert!((dead.confidence - 0.95).abs() < 1e-9);
        assert_eq!(report.statistics.dead_entities, 1);
        assert_eq!(report.statistics.live_entities, 1);
    }

    #[test]
    fn rendered_component_is_live() {
        let mut graph = Graph {
            nodes: vec![component(0, "App", true), component(1, "Card", false)],
            edges: vec![edge(10, 0, 1, EdgeRelation::Renders)],
            metadata: empty_metadata(),
        };
        let report = score_liveness(&mut graph);
        assert_eq!(graph.nodes[1].live_code_score, 100);
        assert!(report.dead_code.is_empty());
    }

    #[test]
    fn weak_references_lower_confidence_but_not_liveness() {
        let mut graph = Graph {
            nodes: vec![
                node(
                    0,
                    "home",
                    NodeKind::Section {
                        route_path: "/".to_string(),
                    },
                ),
                component(1, "Stale", false),
            ],
            edges: vec![edge(10, 0, 1, EdgeRelation::Displays)],
            metadata: empty_metadata(),
        };
        let report = score_liveness(&mut graph);
        assert_eq!(graph.nodes[1].live_code_score, 0);
        assert_eq!(report.dead_code.len(), 1);
        assert!((report.dead_code[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn mapped_backend_nodes_are_live() {
        use crate::model::StorageKind;

        let mut placeholder = BTreeMap::new();
        placeholder.insert("placeholder".to_string(), serde_json::json!(true));
        let mut graph = Graph {
            nodes: vec![
                component(0, "Users", true),
                node(
                    1,
                    "GET /api/users",
                    NodeKind::Endpoint {
                        method: "GET".to_string(),
                        path: "/api/users".to_string(),
                    },
                ),
                node(
                    2,
                    "users",
                    NodeKind::Storage {
                        table: "users".to_string(),
                        storage_kind: StorageKind::Table,
                    },
                ),
                node(
                    3,
                    "audit_log",
                    NodeKind::Storage {
                        table: "audit_log".to_string(),
                        storage_kind: StorageKind::Table,
                    },
                ),
            ],
            edges: vec![
                edge(10, 0, 1, EdgeRelation::Uses),
                edge(11, 1, 2, EdgeRelation::Reads),
                Edge {
                    id: 12,
                    source: 1,
                    target: 3,
                    relation: EdgeRelation::Reads,
                    properties: placeholder,
                },
            ],
            metadata: empty_metadata(),
        };
        let report = score_liveness(&mut graph);

        // A mapped call keeps the endpoint alive, the refined reads edge
        // keeps its storage alive; the placeholder edge keeps nothing.
        assert_eq!(graph.nodes[1].live_code_score, 100);
        assert_eq!(graph.nodes[2].live_code_score, 100);
        assert_eq!(graph.nodes[3].live_code_score, 0);
        assert_eq!(report.dead_code.len(), 1);
        assert_eq!(report.dead_code[0].name, "audit_log");
        assert_eq!(report.dead_code[0].reason, DeadCodeReason::Unreachable);
    }

    #[test]
    fn unreachable_endpoint_reason() {
        let mut graph = Graph {
            nodes: vec![node(
                0,
                "GET /api/ghost",
                NodeKind::Endpoint {
                    method: "GET".to_string(),
                    path: "/api/ghost".to_string(),
                },
            )],
            edges: vec![],
            metadata: empty_metadata(),
        };
        let report = score_liveness(&mut graph);
        assert_eq!(report.dead_code[0].reason, DeadCodeReason::Unreachable);
    }

    #[test]
    fn scores_stay_in_range() {
        let mut graph = Graph {
            nodes: vec![component(0, "App", true), component(1, "B", false)],
            edges: vec![edge(10, 0, 1, EdgeRelation::Imports)],
            metadata: empty_metadata(),
        };
        score_liveness(&mut graph);
        for node in &graph.nodes {
            assert!(node.live_code_score <= 100);
        }
    }
}
