use viewgraph::extractor::facts::FileFacts;
use viewgraph::extractor::{Extractor, ExtractorOptions};
use viewgraph::graph::{cycles, usage, BuilderOptions, GraphBuilder};
use viewgraph::model::{
    CycleSeverity, EdgeRelation, EndpointFact, NodeKind, Route, StorageOpFact, StorageOpType,
};

fn extract(sources: &[(&str, &str)]) -> Vec<FileFacts> {
    let mut extractor = Extractor::new(ExtractorOptions::default()).unwrap();
    sources
        .iter()
        .map(|(path, source)| {
            extractor
                .extract_file("javascript", source, path)
                .unwrap_or_else(|err| panic!("extract {path}: {err}"))
        })
        .collect()
}

fn build(
    facts: &[FileFacts],
    routes: &[Route],
    endpoints: &[EndpointFact],
    storage_ops: &[StorageOpFact],
) -> viewgraph::graph::Built {
    GraphBuilder::new(BuilderOptions::default())
        .build(facts, routes, endpoints, storage_ops)
        .unwrap()
}

const APP: &str = r#"
import { UserCard } from "./UserCard";
import axios from "axios";

export function App() {
  return (
    <main>
      <Header />
      <button aria-label="refresh" onClick={reload}>Refresh</button>
      <button onClick={() => submitForm()}><Icon /></button>
    </main>
  );
}

function Header() {
  return <header><h1>title</h1></header>;
}
"#;

const USER_CARD: &str = r#"
export function UserCard() {
  return <div className="card">card</div>;
}
"#;

#[test]
fn node_rules_produce_expected_kinds() {
    let facts = extract(&[("src/App.jsx", APP), ("src/UserCard.jsx", USER_CARD)]);
    let built = build(&facts, &[], &[], &[]);
    let graph = &built.graph;

    // Components: App, Header, UserCard. Header qualifies: uppercase + markup.
    let components: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::Component { .. }))
        .map(|node| node.label.as_str())
        .collect();
    assert_eq!(components, vec!["App", "Header", "UserCard"]);

    // The refresh button has a semantic identifier and becomes a node with
    // that label; the second button does not and is edge-only.
    assert!(graph.node_by_label("refresh").is_some());
    assert!(graph.node_by_label("button").is_none());

    // Handlers: reload and submitForm, one node each under App.
    let handlers: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::Handler { .. }))
        .map(|node| node.label.as_str())
        .collect();
    assert_eq!(handlers, vec!["reload", "submitForm"]);

    // One package node for axios; the relative import does not create one.
    let packages: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::ExternalPackage { .. }))
        .map(|node| node.label.as_str())
        .collect();
    assert_eq!(packages, vec!["axios"]);
}

#[test]
fn usages_fold_into_render_locations_not_nodes() {
    let facts = extract(&[("src/App.jsx", APP), ("src/UserCard.jsx", USER_CARD)]);
    let built = build(&facts, &[], &[], &[]);
    let graph = &built.graph;

    let header_nodes = graph
        .nodes
        .iter()
        .filter(|node| node.label == "Header")
        .count();
    assert_eq!(header_nodes, 1);

    let header = graph.node_by_label("Header").unwrap();
    let locations = header.properties.get("render_locations").unwrap();
    assert_eq!(locations.as_array().unwrap().len(), 1);
    assert_eq!(locations[0]["component"], "App");
}

#[test]
fn edge_families_and_dedup() {
    let facts = extract(&[("src/App.jsx", APP), ("src/UserCard.jsx", USER_CARD)]);
    let built = build(&facts, &[], &[], &[]);
    let graph = &built.graph;

    let app = graph.node_by_label("App").unwrap().id;
    let header = graph.node_by_label("Header").unwrap().id;
    let user_card = graph.node_by_label("UserCard").unwrap().id;
    let axios = graph.node_by_label("axios").unwrap().id;
    let refresh = graph.node_by_label("refresh").unwrap().id;
    let reload = graph.node_by_label("reload").unwrap().id;
    let submit = graph.node_by_label("submitForm").unwrap().id;

    let has_edge = |source: u64, target: u64, relation: EdgeRelation| {
        graph
            .edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target && edge.relation == relation)
    };

    // Header is defined in the same file as its usage: renders edge.
    assert!(has_edge(app, header, EdgeRelation::Renders));
    // UserCard is only imported: imports edge, no renders edge.
    assert!(has_edge(app, user_card, EdgeRelation::Imports));
    assert!(!has_edge(app, user_card, EdgeRelation::Renders));
    assert!(has_edge(app, axios, EdgeRelation::Imports));
    // Element with a semantic identifier gets contains + calls edges.
    assert!(has_edge(app, refresh, EdgeRelation::Contains));
    assert!(has_edge(refresh, reload, EdgeRelation::Calls));
    // The filtered-out button falls back to a direct component edge.
    assert!(has_edge(app, submit, EdgeRelation::Calls));

    // No duplicate (source, target, relation) triples.
    let mut seen = std::collections::HashSet::new();
    for edge in &graph.edges {
        assert!(seen.insert((edge.source, edge.target, edge.relation)));
    }
    // No self-renders anywhere.
    assert!(graph
        .edges_with(EdgeRelation::Renders)
        .all(|edge| edge.source != edge.target));
}

#[test]
fn same_name_components_in_different_files_each_get_a_node() {
    let facts = extract(&[
        (
            "src/a/Card.jsx",
            r#"export function Card() { return <div onClick={openA}>a</div>; }"#,
        ),
        (
            "src/b/Card.jsx",
            r#"export function Card() { return <div onClick={openB}>b</div>; }"#,
        ),
    ]);
    let built = build(&facts, &[], &[], &[]);
    let graph = &built.graph;

    let cards: Vec<_> = graph
        .nodes
        .iter()
        .filter(|node| node.label == "Card" && matches!(node.kind, NodeKind::Component { .. }))
        .collect();
    assert_eq!(cards.len(), 2);
    let files: Vec<&str> = cards.iter().map(|node| node.file.as_str()).collect();
    assert_eq!(files, vec!["src/a/Card.jsx", "src/b/Card.jsx"]);

    // Contains edges bind each element to the definition in its own file.
    let element_a = graph.node_by_label("a").unwrap().id;
    let element_b = graph.node_by_label("b").unwrap().id;
    let contains: Vec<(u64, u64)> = graph
        .edges_with(EdgeRelation::Contains)
        .map(|edge| (edge.source, edge.target))
        .collect();
    assert!(contains.contains(&(cards[0].id, element_a)));
    assert!(contains.contains(&(cards[1].id, element_b)));
}

#[test]
fn ids_are_deterministic_for_fixed_input_order() {
    let sources = [("src/App.jsx", APP), ("src/UserCard.jsx", USER_CARD)];
    let first = build(&extract(&sources), &[], &[], &[]);
    let second = build(&extract(&sources), &[], &[], &[]);

    let ids = |built: &viewgraph::graph::Built| -> Vec<(u64, String)> {
        built
            .graph
            .nodes
            .iter()
            .map(|node| (node.id, node.label.clone()))
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.graph.edges.len(), second.graph.edges.len());
}

#[test]
fn sections_cover_the_import_graph() {
    let facts = extract(&[
        (
            "src/App.jsx",
            r#"
import { Users } from "./Users";
export function App() {
  return <Routes><Route path="/users" element={<Users />} /></Routes>;
}
"#,
        ),
        (
            "src/Users.jsx",
            r#"
import { UserCard } from "./UserCard";
export function Users() {
  return <ul><UserCard /></ul>;
}
"#,
        ),
        ("src/UserCard.jsx", USER_CARD),
    ]);
    let routes = viewgraph::report::collect_routes(&facts);
    assert_eq!(routes.len(), 1);
    let built = build(&facts, &routes, &[], &[]);
    let graph = &built.graph;

    let section = graph.node_by_label("users").unwrap();
    assert!(matches!(section.kind, NodeKind::Section { .. }));

    let displayed: Vec<&str> = graph
        .edges_with(EdgeRelation::Displays)
        .map(|edge| graph.node(edge.target).unwrap().label.as_str())
        .collect();
    assert_eq!(displayed, vec!["Users", "UserCard"]);

    let root_flags: Vec<bool> = graph
        .edges_with(EdgeRelation::Displays)
        .map(|edge| edge.properties["root"].as_bool().unwrap())
        .collect();
    assert_eq!(root_flags, vec![true, false]);
}

#[test]
fn backend_nodes_and_storage_edges() {
    let facts = extract(&[("src/App.jsx", APP)]);
    let endpoints = vec![EndpointFact {
        name: "listUsers".to_string(),
        path: "/api/users".to_string(),
        method: "GET".to_string(),
        file: "server/routes/users.js".to_string(),
    }];
    let storage_ops = vec![StorageOpFact {
        operation: "db.query".to_string(),
        table: "users".to_string(),
        op_type: StorageOpType::Read,
        file: "server/routes/users.js".to_string(),
    }];
    let built = build(&facts, &[], &endpoints, &storage_ops);
    let graph = &built.graph;

    let endpoint = graph.node_by_label("GET /api/users").unwrap();
    let storage = graph.node_by_label("users").unwrap();
    assert!(matches!(endpoint.kind, NodeKind::Endpoint { .. }));
    assert!(matches!(storage.kind, NodeKind::Storage { .. }));

    // Shared file: the mapper refines the placeholder into a reads edge.
    assert!(graph
        .edges_with(EdgeRelation::Reads)
        .any(|edge| edge.source == endpoint.id && edge.target == storage.id));
}

#[test]
fn liveness_and_cycles_over_a_built_graph() {
    let facts = extract(&[
        (
            "src/A.jsx",
            r#"
import { B } from "./B";
export function A() { return <div><B /></div>; }
"#,
        ),
        (
            "src/B.jsx",
            r#"
import { A } from "./A";
export function B() { return <span>b</span>; }
"#,
        ),
        (
            "src/Orphan.jsx",
            r#"
function Orphan() { return <div>gone</div>; }
"#,
        ),
    ]);
    let built = build(&facts, &[], &[], &[]);
    let mut graph = built.graph;
    let report = usage::score_liveness(&mut graph);

    for node in &graph.nodes {
        assert!(node.live_code_score == 0 || node.live_code_score == 100);
    }
    assert_eq!(report.dead_code.len(), 1);
    assert_eq!(report.dead_code[0].name, "Orphan");

    // A imports B, B imports A: a two-cycle, reported as a warning.
    let cycles = cycles::detect_cycles(&graph);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].severity, CycleSeverity::Warning);
}
