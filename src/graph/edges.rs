use serde_json::json;
use std::collections::{BTreeMap, HashSet};

use super::{BuildIndex, IdGenerator};
use crate::extractor::facts::FileFacts;
use crate::model::{
    ConnectionKind, ConnectionMappingResult, Edge, EdgeRelation, StorageOpType,
};
use crate::util::import_trailing_segment;

/// Every edge family, computed independently, merged, and deduplicated by
/// (source, target, relation). The first edge wins; later duplicates are
/// discarded with their properties.
pub(crate) fn build_edges(
    ids: &mut IdGenerator,
    facts: &[FileFacts],
    index: &BuildIndex,
    connections: &ConnectionMappingResult,
) -> Vec<Edge> {
    let mut pending: Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)> =
        Vec::new();

    import_edges(facts, index, &mut pending);
    render_edges(facts, index, &mut pending);
    contains_edges(facts, index, &mut pending);
    call_edges(facts, index, &mut pending);
    uses_edges(connections, index, &mut pending);
    storage_edges(connections, index, &mut pending);
    display_edges(index, &mut pending);

    let mut seen: HashSet<(u64, u64, EdgeRelation)> = HashSet::new();
    let mut edges = Vec::new();
    for (source, target, relation, properties) in pending {
        if !seen.insert((source, target, relation)) {
            continue;
        }
        edges.push(Edge {
            id: ids.next_id(),
            source,
            target,
            relation,
            properties,
        });
    }
    edges
}

/// Owning component of an element: the definition in the element's own
/// file, falling back to the first definition of that name anywhere. The
/// fallback covers synthesized data-source elements attributed by file
/// stem.
fn resolve_component(index: &BuildIndex, name: &str, file: &str) -> Option<u64> {
    index
        .component_id
        .get(&(name.to_string(), file.to_string()))
        .copied()
        .or_else(|| index.component_by_name.get(name).copied())
}

/// Component -> package for bare imports, component -> component for
/// relative imports resolved by the trailing path segment or a named
/// specifier.
fn import_edges(
    facts: &[FileFacts],
    index: &BuildIndex,
    pending: &mut Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)>,
) {
    for file in facts {
        let sources: Vec<u64> = file
            .components
            .iter()
            .filter_map(|component| {
                index
                    .component_id
                    .get(&(component.name.clone(), component.file.clone()))
                    .copied()
            })
            .collect();
        for import in &file.imports {
            let mut targets: Vec<u64> = Vec::new();
            if import.relative {
                let segment = import_trailing_segment(&import.source);
                if let Some(&target) = index.component_by_name.get(&segment) {
                    targets.push(target);
                }
                for name in &import.names {
                    if let Some(&target) = index.component_by_name.get(name) {
                        targets.push(target);
                    }
                }
            } else {
                let package = super::root_package(&import.source);
                if let Some(&target) = index.package_id.get(&package) {
                    targets.push(target);
                }
            }
            for &source in &sources {
                for &target in &targets {
                    if source == target {
                        continue;
                    }
                    let mut properties = BTreeMap::new();
                    properties.insert("source_path".to_string(), json!(import.source));
                    pending.push((source, target, EdgeRelation::Imports, properties));
                }
            }
        }
    }
}

/// Parent -> child for capitalized usages matching a component defined in
/// the same file. Keying by (name, file) makes the same-file requirement
/// structural. Self-renders are suppressed.
fn render_edges(
    facts: &[FileFacts],
    index: &BuildIndex,
    pending: &mut Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)>,
) {
    for file in facts {
        for usage in &file.usages {
            let parent_key = (usage.used_in.clone(), usage.file.clone());
            let Some(&parent) = index.component_id.get(&parent_key) else {
                continue;
            };
            let child_key = (usage.name.clone(), usage.file.clone());
            let Some(&child) = index.component_id.get(&child_key) else {
                continue;
            };
            if parent == child {
                continue;
            }
            pending.push((parent, child, EdgeRelation::Renders, BTreeMap::new()));
        }
    }
}

fn contains_edges(
    facts: &[FileFacts],
    index: &BuildIndex,
    pending: &mut Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)>,
) {
    let mut element_index = 0usize;
    for file in facts {
        for element in &file.elements {
            let node_id = index.element_node.get(element_index).copied().flatten();
            element_index += 1;
            let Some(element_id) = node_id else {
                continue;
            };
            let Some(component_id) = resolve_component(index, &element.component, &file.file)
            else {
                continue;
            };
            pending.push((component_id, element_id, EdgeRelation::Contains, BTreeMap::new()));
        }
    }
}

/// Handler-triggered calls: element -> handler per (event, callee). When
/// semantic filtering denied the element a node, fall back to a direct
/// component -> handler edge; zero resolved callees mean no edge at all.
fn call_edges(
    facts: &[FileFacts],
    index: &BuildIndex,
    pending: &mut Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)>,
) {
    let mut element_index = 0usize;
    for file in facts {
        for element in &file.elements {
            let node_id = index.element_node.get(element_index).copied().flatten();
            element_index += 1;
            for binding in &element.handlers {
                for callee in &binding.callees {
                    let key = (element.component.clone(), callee.clone());
                    let Some(&handler_id) = index.handler_id.get(&key) else {
                        continue;
                    };
                    let source = match node_id {
                        Some(id) => id,
                        None => match resolve_component(index, &element.component, &file.file) {
                            Some(component_id) => component_id,
                            None => continue,
                        },
                    };
                    let mut properties = BTreeMap::new();
                    properties.insert("event".to_string(), json!(binding.event));
                    pending.push((source, handler_id, EdgeRelation::Calls, properties));
                }
            }
        }
    }
}

/// Component -> endpoint for every direct or proxy connection the mapper
/// produced.
fn uses_edges(
    connections: &ConnectionMappingResult,
    index: &BuildIndex,
    pending: &mut Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)>,
) {
    for connection in &connections.connections {
        if connection.kind == ConnectionKind::Indirect {
            continue;
        }
        let Some(&source) = index.component_by_name.get(&connection.component) else {
            continue;
        };
        let Some(&target) = index.endpoint_by_name.get(&connection.endpoint) else {
            continue;
        };
        let mut properties = BTreeMap::new();
        properties.insert("confidence".to_string(), json!(connection.confidence));
        pending.push((source, target, EdgeRelation::Uses, properties));
    }
}

/// Endpoint -> storage. Mapper-refined edges when indirect connections
/// exist, otherwise the broad placeholder rule: every endpoint reads every
/// storage entity.
fn storage_edges(
    connections: &ConnectionMappingResult,
    index: &BuildIndex,
    pending: &mut Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)>,
) {
    let mut refined = false;
    for connection in &connections.connections {
        if connection.kind != ConnectionKind::Indirect {
            continue;
        }
        let Some(&source) = index.endpoint_by_name.get(&connection.component) else {
            continue;
        };
        let Some(&target) = index.storage_id.get(&connection.endpoint) else {
            continue;
        };
        refined = true;
        let relation = match &connection.storage_op {
            Some(op) if op.op_type == StorageOpType::Write => EdgeRelation::WritesTo,
            _ => EdgeRelation::Reads,
        };
        let mut properties = BTreeMap::new();
        properties.insert("confidence".to_string(), json!(connection.confidence));
        pending.push((source, target, relation, properties));
    }
    if refined {
        return;
    }
    for &endpoint_id in index.endpoint_by_name.values() {
        for &storage_id in index.storage_id.values() {
            let mut properties = BTreeMap::new();
            properties.insert("placeholder".to_string(), json!(true));
            pending.push((endpoint_id, storage_id, EdgeRelation::Reads, properties));
        }
    }
}

/// Section -> member component, flagged root or shared.
fn display_edges(
    index: &BuildIndex,
    pending: &mut Vec<(u64, u64, EdgeRelation, BTreeMap<String, serde_json::Value>)>,
) {
    let mut sections: Vec<(&String, &u64)> = index.section_id.iter().collect();
    sections.sort_by_key(|(path, _)| path.to_string());
    for (path, &section_id) in sections {
        let Some(members) = index.section_members.get(path) else {
            continue;
        };
        for (position, member) in members.iter().enumerate() {
            let Some(&component_id) = index.component_by_name.get(member) else {
                continue;
            };
            let mut properties = BTreeMap::new();
            properties.insert("root".to_string(), json!(position == 0));
            pending.push((section_id, component_id, EdgeRelation::Displays, properties));
        }
    }
}
