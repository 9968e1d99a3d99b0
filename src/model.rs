use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
    FrontEnd,
    BusinessLogic,
    Middleware,
    Api,
    Database,
    Library,
}

impl NodeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeCategory::FrontEnd => "front-end",
            NodeCategory::BusinessLogic => "business-logic",
            NodeCategory::Middleware => "middleware",
            NodeCategory::Api => "api",
            NodeCategory::Database => "database",
            NodeCategory::Library => "library",
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Function,
    Api,
    Table,
    View,
    ExternalDependency,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    Internal,
    External,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Function,
    Class,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Display,
    Input,
    DataSource,
    StateManagement,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Table,
    View,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: i64,
    pub column: i64,
}

/// What a node stands for. Each variant carries only the fields relevant to
/// that kind; category and type are derived from the variant, never stored
/// separately on the node.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Component {
        component_kind: ComponentKind,
        exported: bool,
    },
    Element {
        element_kind: ElementKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        semantic_identifier: Option<String>,
    },
    Handler {
        component: String,
    },
    ExternalPackage {
        package: String,
    },
    Section {
        route_path: String,
    },
    Endpoint {
        method: String,
        path: String,
    },
    Storage {
        table: String,
        storage_kind: StorageKind,
    },
}

impl NodeKind {
    pub fn category(&self) -> NodeCategory {
        match self {
            NodeKind::Component { .. } | NodeKind::Element { .. } | NodeKind::Section { .. } => {
                NodeCategory::FrontEnd
            }
            NodeKind::Handler { .. } => NodeCategory::BusinessLogic,
            NodeKind::ExternalPackage { .. } => NodeCategory::Library,
            NodeKind::Endpoint { .. } => NodeCategory::Api,
            NodeKind::Storage { .. } => NodeCategory::Database,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Component { .. } | NodeKind::Element { .. } | NodeKind::Handler { .. } => {
                NodeType::Function
            }
            NodeKind::Section { .. } => NodeType::View,
            NodeKind::ExternalPackage { .. } => NodeType::ExternalDependency,
            NodeKind::Endpoint { .. } => NodeType::Api,
            NodeKind::Storage { storage_kind, .. } => match storage_kind {
                StorageKind::Table => NodeType::Table,
                StorageKind::View => NodeType::View,
            },
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Node {
    pub id: u64,
    pub label: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub category: NodeCategory,
    pub node_type: NodeType,
    pub live_code_score: u8,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub ownership: Ownership,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeRelation {
    #[serde(rename = "imports")]
    Imports,
    #[serde(rename = "renders")]
    Renders,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "calls")]
    Calls,
    #[serde(rename = "reads")]
    Reads,
    #[serde(rename = "writes to")]
    WritesTo,
    #[serde(rename = "displays")]
    Displays,
    #[serde(rename = "uses")]
    Uses,
}

#[derive(Debug, Serialize, Clone)]
pub struct Edge {
    pub id: u64,
    pub source: u64,
    pub target: u64,
    pub relation: EdgeRelation,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Clone)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub live_nodes: usize,
    pub dead_nodes: usize,
}

#[derive(Debug, Serialize, Clone)]
pub struct GraphScope {
    pub included_categories: Vec<String>,
    pub excluded_categories: Vec<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct GraphMetadata {
    pub schema_version: String,
    pub generated_at: i64,
    pub scope: GraphScope,
    pub stats: GraphStats,
}

#[derive(Debug, Serialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metadata: GraphMetadata,
}

impl Graph {
    pub fn node(&self, id: u64) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_by_label(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.label == label)
    }

    pub fn edges_with(&self, relation: EdgeRelation) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.relation == relation)
    }

    pub fn refresh_stats(&mut self) {
        self.metadata.stats = GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            live_nodes: self
                .nodes
                .iter()
                .filter(|node| node.live_code_score > 0)
                .count(),
            dead_nodes: self
                .nodes
                .iter()
                .filter(|node| node.live_code_score == 0)
                .count(),
        };
    }
}

// External input shapes: route discovery and backend analyzers live outside
// the core, only their output shapes are consumed here.

#[derive(Debug, Serialize, Clone)]
pub struct Route {
    pub path: String,
    pub component: String,
    pub section: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct EndpointFact {
    pub name: String,
    pub path: String,
    pub method: String,
    pub file: String,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageOpType {
    Read,
    Write,
}

#[derive(Debug, Serialize, Clone)]
pub struct StorageOpFact {
    pub operation: String,
    pub table: String,
    pub op_type: StorageOpType,
    pub file: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ApiCallFact {
    pub component: String,
    pub file: String,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

// Connection mapping output.

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Direct,
    Indirect,
    Proxy,
}

#[derive(Debug, Serialize, Clone)]
pub struct Connection {
    pub component: String,
    pub endpoint: String,
    pub kind: ConnectionKind,
    pub confidence: f64,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_call: Option<ApiCallFact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_op: Option<StorageOpFact>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionMappingResult {
    pub connections: Vec<Connection>,
    pub unmapped_frontend: Vec<String>,
    pub unmapped_backend: Vec<String>,
    pub coverage: f64,
}

// Usage / dead-code output.

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeadCodeReason {
    Unused,
    Unreachable,
    NoIncomingEdges,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DeadCodeImpact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize, Clone)]
pub struct DeadCodeInfo {
    pub name: String,
    pub kind: String,
    pub file: String,
    pub reason: DeadCodeReason,
    pub confidence: f64,
    pub impact: DeadCodeImpact,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct UsageStatistics {
    pub total_entities: usize,
    pub live_entities: usize,
    pub dead_entities: usize,
    pub by_category: BTreeMap<String, usize>,
    pub dead_by_category: BTreeMap<String, usize>,
}

// Cycle detection output.

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleSeverity {
    Warning,
    Error,
}

#[derive(Debug, Serialize, Clone)]
pub struct Cycle {
    pub node_ids: Vec<u64>,
    pub severity: CycleSeverity,
    pub description: String,
}
