pub mod connections;
pub mod cycles;
pub mod edges;
pub mod endpoint;
pub mod usage;

use anyhow::Result;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::Config;
use crate::extractor::facts::{FileFacts, InformativeElement, PASSIVE_TAGS};
use crate::model::{
    ApiCallFact, ConnectionMappingResult, ElementKind, EndpointFact, Graph, GraphMetadata,
    GraphScope, Node, NodeCategory, NodeKind, Ownership, Position, Route, StorageKind,
    StorageOpFact,
};

/// Monotonic id counter owned by one build. Ids are deterministic for a
/// fixed input order.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone)]
pub struct BuilderOptions {
    /// Markup tags dropped when they carry no event handler and are not a
    /// data source or state hook.
    pub passive_tags: Vec<String>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            passive_tags: PASSIVE_TAGS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

/// Lookup tables shared between the node pass and the edge pass. Populated
/// fully before any edge family runs.
#[derive(Debug, Default)]
pub(crate) struct BuildIndex {
    /// Definitions are identified by (name, file): the same name in two
    /// files is two components with two nodes.
    pub component_id: HashMap<(String, String), u64>,
    /// Name-only lookup for cross-file references (imports, usages,
    /// routes). First definition wins.
    pub component_by_name: HashMap<String, u64>,
    pub component_file: HashMap<String, String>,
    pub handler_id: HashMap<(String, String), u64>,
    pub package_id: HashMap<String, u64>,
    pub section_id: HashMap<String, u64>,
    /// Route path -> member component labels, root first.
    pub section_members: HashMap<String, Vec<String>>,
    pub endpoint_id: HashMap<String, u64>,
    /// Endpoint handler name -> node id, for resolving mapper output.
    pub endpoint_by_name: HashMap<String, u64>,
    pub storage_id: HashMap<String, u64>,
    /// One entry per extracted element across all files, in input order.
    /// `None` marks an element denied a node by semantic filtering.
    pub element_node: Vec<Option<u64>>,
}

pub struct Built {
    pub graph: Graph,
    pub connections: ConnectionMappingResult,
}

pub struct GraphBuilder {
    options: BuilderOptions,
    ids: IdGenerator,
}

impl GraphBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            options,
            ids: IdGenerator::default(),
        }
    }

    /// Build the full graph: all nodes first, then every edge family, then
    /// metadata. Backend facts arrive from the caller so that the builder
    /// has endpoints and storage entities for the mapper's edges to land on.
    pub fn build(
        mut self,
        facts: &[FileFacts],
        routes: &[Route],
        endpoints: &[EndpointFact],
        storage_ops: &[StorageOpFact],
    ) -> Result<Built> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut index = BuildIndex::default();

        self.create_component_nodes(facts, &mut nodes, &mut index);
        attach_render_locations(facts, &mut nodes, &index);
        self.create_element_nodes(facts, &mut nodes, &mut index);
        self.create_handler_nodes(facts, &mut nodes, &mut index);
        self.create_package_nodes(facts, &mut nodes, &mut index);
        self.create_backend_nodes(endpoints, storage_ops, &mut nodes, &mut index);
        self.create_section_nodes(facts, routes, &mut nodes, &mut index);

        let api_calls: Vec<ApiCallFact> = facts
            .iter()
            .flat_map(|file| file.api_calls.iter().cloned())
            .collect();
        let component_labels: Vec<String> = facts
            .iter()
            .flat_map(|file| file.components.iter().map(|c| c.name.clone()))
            .collect();
        let connections =
            connections::map_connections(&component_labels, endpoints, &api_calls, storage_ops);

        let edges = edges::build_edges(&mut self.ids, facts, &index, &connections);

        let mut graph = Graph {
            metadata: metadata_for(&nodes),
            nodes,
            edges,
        };
        graph.refresh_stats();
        Ok(Built { graph, connections })
    }

    /// Rule 1: one node per component definition, in input order.
    fn create_component_nodes(
        &mut self,
        facts: &[FileFacts],
        nodes: &mut Vec<Node>,
        index: &mut BuildIndex,
    ) {
        for file in facts {
            for component in &file.components {
                let key = (component.name.clone(), component.file.clone());
                if index.component_id.contains_key(&key) {
                    continue;
                }
                let id = self.ids.next_id();
                let kind = NodeKind::Component {
                    component_kind: component.kind,
                    exported: component.exported,
                };
                nodes.push(make_node(
                    id,
                    component.name.clone(),
                    kind,
                    &component.file,
                    Some(component.position),
                    Ownership::Internal,
                ));
                index.component_id.insert(key, id);
                index
                    .component_by_name
                    .entry(component.name.clone())
                    .or_insert(id);
                index
                    .component_file
                    .entry(component.name.clone())
                    .or_insert_with(|| component.file.clone());
            }
        }
    }

    /// Rule 2: element nodes. Data-source and state elements always get a
    /// node; handler-carrying markup only when it has a semantic identifier
    /// (which becomes the label); passive markup without handlers is
    /// dropped.
    fn create_element_nodes(
        &mut self,
        facts: &[FileFacts],
        nodes: &mut Vec<Node>,
        index: &mut BuildIndex,
    ) {
        for file in facts {
            for element in &file.elements {
                let node_id = match self.element_disposition(element) {
                    ElementDisposition::Node(label) => {
                        let id = self.ids.next_id();
                        let kind = NodeKind::Element {
                            element_kind: element.kind,
                            semantic_identifier: element.semantic_identifier.clone(),
                        };
                        let mut node = make_node(
                            id,
                            label,
                            kind,
                            &file.file,
                            Some(element.position),
                            Ownership::Internal,
                        );
                        node.properties
                            .insert("component".to_string(), json!(element.component));
                        if !element.data_bindings.is_empty() {
                            node.properties
                                .insert("data_bindings".to_string(), json!(element.data_bindings));
                        }
                        nodes.push(node);
                        Some(id)
                    }
                    ElementDisposition::Dropped | ElementDisposition::EdgeOnly => None,
                };
                index.element_node.push(node_id);
            }
        }
    }

    fn element_disposition(&self, element: &InformativeElement) -> ElementDisposition {
        match element.kind {
            ElementKind::DataSource | ElementKind::StateManagement => {
                ElementDisposition::Node(element.name.clone())
            }
            ElementKind::Display | ElementKind::Input => {
                if !element.handlers.is_empty() {
                    match &element.semantic_identifier {
                        Some(identifier) => ElementDisposition::Node(identifier.clone()),
                        None => ElementDisposition::EdgeOnly,
                    }
                } else if self
                    .options
                    .passive_tags
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case(&element.name))
                {
                    ElementDisposition::Dropped
                } else {
                    let label = element
                        .semantic_identifier
                        .clone()
                        .unwrap_or_else(|| element.name.clone());
                    ElementDisposition::Node(label)
                }
            }
        }
    }

    /// Rule 3: one handler node per distinct callee name per component.
    fn create_handler_nodes(
        &mut self,
        facts: &[FileFacts],
        nodes: &mut Vec<Node>,
        index: &mut BuildIndex,
    ) {
        for file in facts {
            for element in &file.elements {
                for binding in &element.handlers {
                    for callee in &binding.callees {
                        let key = (element.component.clone(), callee.clone());
                        if index.handler_id.contains_key(&key) {
                            continue;
                        }
                        let id = self.ids.next_id();
                        nodes.push(make_node(
                            id,
                            callee.clone(),
                            NodeKind::Handler {
                                component: element.component.clone(),
                            },
                            &file.file,
                            None,
                            Ownership::Internal,
                        ));
                        index.handler_id.insert(key, id);
                    }
                }
            }
        }
    }

    /// Rule 4: one node per distinct external package. Scoped and sub-path
    /// imports collapse to the root package.
    fn create_package_nodes(
        &mut self,
        facts: &[FileFacts],
        nodes: &mut Vec<Node>,
        index: &mut BuildIndex,
    ) {
        for file in facts {
            for import in &file.imports {
                if import.relative {
                    continue;
                }
                let package = root_package(&import.source);
                if package.is_empty() || index.package_id.contains_key(&package) {
                    continue;
                }
                let id = self.ids.next_id();
                nodes.push(make_node(
                    id,
                    package.clone(),
                    NodeKind::ExternalPackage {
                        package: package.clone(),
                    },
                    &file.file,
                    None,
                    Ownership::External,
                ));
                index.package_id.insert(package, id);
            }
        }
    }

    fn create_backend_nodes(
        &mut self,
        endpoints: &[EndpointFact],
        storage_ops: &[StorageOpFact],
        nodes: &mut Vec<Node>,
        index: &mut BuildIndex,
    ) {
        for endpoint in endpoints {
            let label = format!("{} {}", endpoint.method, endpoint.path);
            if index.endpoint_id.contains_key(&label) {
                continue;
            }
            let id = self.ids.next_id();
            let mut node = make_node(
                id,
                label.clone(),
                NodeKind::Endpoint {
                    method: endpoint.method.clone(),
                    path: endpoint.path.clone(),
                },
                &endpoint.file,
                None,
                Ownership::Internal,
            );
            node.properties
                .insert("handler".to_string(), json!(endpoint.name));
            node.properties.insert(
                "normalized_path".to_string(),
                json!(endpoint::normalize(&endpoint.path)),
            );
            nodes.push(node);
            index.endpoint_id.insert(label, id);
            index.endpoint_by_name.entry(endpoint.name.clone()).or_insert(id);
        }

        for op in storage_ops {
            if index.storage_id.contains_key(&op.table) {
                continue;
            }
            let id = self.ids.next_id();
            nodes.push(make_node(
                id,
                op.table.clone(),
                NodeKind::Storage {
                    table: op.table.clone(),
                    storage_kind: storage_kind_for(&op.table),
                },
                &op.file,
                None,
                Ownership::Internal,
            ));
            index.storage_id.insert(op.table.clone(), id);
        }
    }

    /// Rule 5: one section node per route, with membership discovered by a
    /// bounded walk of the component import graph. Routes pointing at
    /// unknown components are logged and skipped, the build continues.
    fn create_section_nodes(
        &mut self,
        facts: &[FileFacts],
        routes: &[Route],
        nodes: &mut Vec<Node>,
        index: &mut BuildIndex,
    ) {
        let adjacency = component_import_adjacency(facts, index);
        for route in routes {
            if !index.component_by_name.contains_key(&route.component) {
                eprintln!(
                    "viewgraph: route {} points at unknown component {}, skipping",
                    route.path, route.component
                );
                continue;
            }
            if index.section_id.contains_key(&route.path) {
                continue;
            }
            let id = self.ids.next_id();
            let file = index
                .component_file
                .get(&route.component)
                .cloned()
                .unwrap_or_default();
            let mut node = make_node(
                id,
                route.section.clone(),
                NodeKind::Section {
                    route_path: route.path.clone(),
                },
                &file,
                None,
                Ownership::Internal,
            );
            node.properties
                .insert("root_component".to_string(), json!(route.component));
            nodes.push(node);
            index.section_id.insert(route.path.clone(), id);
            index
                .section_members
                .insert(route.path.clone(), section_members(&route.component, &adjacency));
        }
    }
}

enum ElementDisposition {
    Node(String),
    /// Handler element without a semantic identifier: no node, the calls
    /// family adds a direct component edge instead.
    EdgeOnly,
    Dropped,
}

/// Component label -> component labels it imports, resolved by matching the
/// trailing segment of relative import sources against known labels.
fn component_import_adjacency(
    facts: &[FileFacts],
    index: &BuildIndex,
) -> HashMap<String, Vec<String>> {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    for file in facts {
        let mut targets = Vec::new();
        for import in &file.imports {
            if !import.relative {
                continue;
            }
            let segment = crate::util::import_trailing_segment(&import.source);
            if index.component_by_name.contains_key(&segment) {
                targets.push(segment.clone());
            }
            for name in &import.names {
                if index.component_by_name.contains_key(name) && !targets.contains(name) {
                    targets.push(name.clone());
                }
            }
        }
        for component in &file.components {
            adjacency
                .entry(component.name.clone())
                .or_default()
                .extend(targets.iter().filter(|t| **t != component.name).cloned());
        }
    }
    adjacency
}

/// Recursive membership walk, root first, bounded by a visited set and the
/// configured depth cap so import cycles terminate.
fn section_members(root: &str, adjacency: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut members = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: Vec<(String, usize)> = vec![(root.to_string(), 0)];
    let depth_max = Config::get().section_depth_max;
    while let Some((name, depth)) = queue.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        members.push(name.clone());
        if depth >= depth_max {
            continue;
        }
        if let Some(targets) = adjacency.get(&name) {
            // Reverse keeps sibling order stable under the stack pop.
            for target in targets.iter().rev() {
                if !visited.contains(target) {
                    queue.push((target.clone(), depth + 1));
                }
            }
        }
    }
    members
}

/// Render locations are a side channel between node creation and the edge
/// passes: the map is complete before any edge family reads component
/// properties.
fn attach_render_locations(facts: &[FileFacts], nodes: &mut [Node], index: &BuildIndex) {
    let mut locations: HashMap<u64, Vec<serde_json::Value>> = HashMap::new();
    for file in facts {
        for usage in &file.usages {
            let Some(&target) = index.component_by_name.get(&usage.name) else {
                continue;
            };
            locations.entry(target).or_default().push(json!({
                "file": usage.file,
                "component": usage.used_in,
                "line": usage.position.line,
            }));
        }
    }
    for node in nodes.iter_mut() {
        if let Some(list) = locations.remove(&node.id) {
            node.properties
                .insert("render_locations".to_string(), json!(list));
        }
    }
}

fn make_node(
    id: u64,
    label: String,
    kind: NodeKind,
    file: &str,
    position: Option<Position>,
    ownership: Ownership,
) -> Node {
    Node {
        id,
        label,
        category: kind.category(),
        node_type: kind.node_type(),
        kind,
        live_code_score: 100,
        file: file.to_string(),
        position,
        ownership,
        properties: BTreeMap::new(),
    }
}

/// `@scope/pkg/sub` -> `@scope/pkg`, `pkg/sub` -> `pkg`.
fn root_package(source: &str) -> String {
    let mut parts = source.split('/');
    let first = parts.next().unwrap_or_default();
    if first.starts_with('@') {
        match parts.next() {
            Some(second) => format!("{first}/{second}"),
            None => first.to_string(),
        }
    } else {
        first.to_string()
    }
}

fn storage_kind_for(table: &str) -> StorageKind {
    if table.starts_with("v_") || table.ends_with("_view") {
        StorageKind::View
    } else {
        StorageKind::Table
    }
}

fn metadata_for(nodes: &[Node]) -> GraphMetadata {
    let present: HashSet<NodeCategory> = nodes.iter().map(|node| node.category).collect();
    let all = [
        NodeCategory::FrontEnd,
        NodeCategory::BusinessLogic,
        NodeCategory::Middleware,
        NodeCategory::Api,
        NodeCategory::Database,
        NodeCategory::Library,
    ];
    let included = all
        .iter()
        .filter(|category| present.contains(*category))
        .map(|category| category.as_str().to_string())
        .collect();
    let excluded = all
        .iter()
        .filter(|category| !present.contains(*category))
        .map(|category| category.as_str().to_string())
        .collect();
    GraphMetadata {
        schema_version: crate::model::SCHEMA_VERSION.to_string(),
        generated_at: crate::util::unix_now(),
        scope: GraphScope {
            included_categories: included,
            excluded_categories: excluded,
        },
        stats: crate::model::GraphStats {
            node_count: 0,
            edge_count: 0,
            live_nodes: 0,
            dead_nodes: 0,
        },
    }
}
