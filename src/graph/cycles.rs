use std::collections::{HashMap, HashSet};

use crate::model::{Cycle, CycleSeverity, Graph};

/// Cycles longer than this are reported as errors.
const WARNING_MAX_LEN: usize = 3;

/// Depth-first search with an explicit recursion stack. A back-edge into
/// the stack yields the stack slice from the revisited node as one cycle.
/// Every unvisited node seeds a fresh traversal so disconnected subgraphs
/// are covered; visited nodes are never re-explored.
pub fn detect_cycles(graph: &Graph) -> Vec<Cycle> {
    let mut adjacency: HashMap<u64, Vec<u64>> = HashMap::new();
    for edge in &graph.edges {
        adjacency.entry(edge.source).or_default().push(edge.target);
    }
    for targets in adjacency.values_mut() {
        targets.sort_unstable();
        targets.dedup();
    }

    let mut cycles = Vec::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut stack: Vec<u64> = Vec::new();
    let mut on_stack: HashSet<u64> = HashSet::new();

    for node in &graph.nodes {
        if visited.contains(&node.id) {
            continue;
        }
        dfs(
            node.id,
            &adjacency,
            &mut visited,
            &mut stack,
            &mut on_stack,
            &mut cycles,
            graph,
        );
    }
    cycles
}

fn dfs(
    node: u64,
    adjacency: &HashMap<u64, Vec<u64>>,
    visited: &mut HashSet<u64>,
    stack: &mut Vec<u64>,
    on_stack: &mut HashSet<u64>,
    cycles: &mut Vec<Cycle>,
    graph: &Graph,
) {
    visited.insert(node);
    stack.push(node);
    on_stack.insert(node);

    if let Some(targets) = adjacency.get(&node) {
        for &target in targets {
            if on_stack.contains(&target) {
                let start = stack
                    .iter()
                    .position(|&id| id == target)
                    .unwrap_or(stack.len() - 1);
                let node_ids: Vec<u64> = stack[start..].to_vec();
                cycles.push(build_cycle(node_ids, graph));
            } else if !visited.contains(&target) {
                dfs(target, adjacency, visited, stack, on_stack, cycles, graph);
            }
        }
    }

    stack.pop();
    on_stack.remove(&node);
}

fn build_cycle(node_ids: Vec<u64>, graph: &Graph) -> Cycle {
    let severity = if node_ids.len() > WARNING_MAX_LEN {
        CycleSeverity::Error
    } else {
        CycleSeverity::Warning
    };
    let mut labels: Vec<String> = node_ids
        .iter()
        .map(|id| {
            graph
                .node(*id)
                .map(|node| node.label.clone())
                .unwrap_or_else(|| id.to_string())
        })
        .collect();
    if let Some(first) = labels.first().cloned() {
        labels.push(first);
    }
    Cycle {
        node_ids,
        severity,
        description: format!("dependency cycle: {}", labels.join(" -> ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Edge, EdgeRelation, Graph, GraphMetadata, GraphScope, GraphStats, Node, NodeKind,
        Ownership,
    };
    use std::collections::BTreeMap;

    fn graph(node_count: u64, edges: &[(u64, u64)]) -> Graph {
        let nodes = (0..node_count)
            .map(|id| {
                let kind = NodeKind::Component {
                    component_kind: crate::model::ComponentKind::Function,
                    exported: true,
                };
                Node {
                    id,
                    label: format!("C{id}"),
                    category: kind.category(),
                    node_type: kind.node_type(),
                    kind,
                    live_code_score: 100,
                    file: "src/App.jsx".to_string(),
                    position: None,
                    ownership: Ownership::Internal,
                    properties: BTreeMap::new(),
                }
            })
            .collect();
        let edges = edges
            .iter()
            .enumerate()
            .map(|(index, (source, target))| Edge {
                id: 1000 + index as u64,
                source: *source,
                target: *target,
                relation: EdgeRelation::Imports,
                properties: BTreeMap::new(),
            })
            .collect();
        Graph {
            nodes,
            edges,
            metadata: GraphMetadata {
                schema_version: crate::model::SCHEMA_VERSION.to_string(),
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
            },
        }
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let graph = graph(3, &[(0, 1), (1, 2)]);
        assert!(detect_cycles(&graph).is_empty());
    }

    #[test]
    fn triangle_is_a_warning() {
        let graph = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let cycles = detect_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].severity, CycleSeverity::Warning);
        assert_eq!(cycles[0].node_ids, vec![0, 1, 2]);
    }

    #[test]
    fn four_cycle_is_an_error_in_adjacency_order() {
        let graph = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let cycles = detect_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].severity, CycleSeverity::Error);
        assert_eq!(cycles[0].node_ids, vec![0, 1, 2, 3]);
        assert!(cycles[0].description.contains("C0 -> C1 -> C2 -> C3 -> C0"));
    }

    #[test]
    fn disconnected_subgraphs_are_both_covered() {
        let graph = graph(5, &[(0, 1), (2, 3), (3, 4), (4, 2)]);
        let cycles = detect_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].node_ids, vec![2, 3, 4]);
    }

    #[test]
    fn self_loop_is_a_single_node_cycle() {
        let graph = graph(2, &[(0, 0), (0, 1)]);
        let cycles = detect_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].node_ids, vec![0]);
    }
}
