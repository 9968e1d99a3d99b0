pub mod datasource;
pub mod facts;
pub mod markup;

use anyhow::Result;
use tree_sitter::{Node, Parser};

use crate::error::AnalysisError;
use crate::model::{ComponentKind, ElementKind, Position};
use datasource::AuxCtx;
use facts::{
    default_interactive_widgets, ComponentDefinition, FileFacts, ImportRecord, InformativeElement,
};
use markup::{contains_markup, MarkupCtx};

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Capitalized tags treated as interactive widgets instead of rendered
    /// child components.
    pub interactive_widgets: Vec<String>,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            interactive_widgets: default_interactive_widgets(),
        }
    }
}

/// Walks JS/TS/TSX syntax trees and produces per-file facts. One parser per
/// grammar, reused across files.
pub struct Extractor {
    js: Parser,
    ts: Parser,
    tsx: Parser,
    options: ExtractorOptions,
}

impl Extractor {
    pub fn new(options: ExtractorOptions) -> Result<Self> {
        let mut js = Parser::new();
        js.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
        let mut ts = Parser::new();
        ts.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;
        let mut tsx = Parser::new();
        tsx.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())?;
        Ok(Self {
            js,
            ts,
            tsx,
            options,
        })
    }

    /// Extract every fact from one file: a single top-level traversal for
    /// definitions, imports, exports, and markup, then two auxiliary
    /// traversals for API calls and state hooks.
    pub fn extract_file(
        &mut self,
        language: &str,
        source: &str,
        rel_path: &str,
    ) -> Result<FileFacts, AnalysisError> {
        if source.trim().is_empty() {
            return Err(AnalysisError::syntax(rel_path, "empty file"));
        }
        let parser = match language {
            "javascript" => &mut self.js,
            "typescript" => &mut self.ts,
            "tsx" => &mut self.tsx,
            other => {
                return Err(AnalysisError::validation(format!(
                    "unsupported language: {other}"
                )));
            }
        };
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::syntax(rel_path, "parse failed"))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(AnalysisError::syntax(rel_path, "syntax error"));
        }

        let bytes = source.as_bytes();
        let mut facts = FileFacts::new(rel_path);
        let mut bodies: Vec<(String, usize)> = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            self.handle_top_level(bytes, rel_path, child, false, &mut facts, &mut bodies);
        }

        // Names exported via a trailing export list or default export.
        for component in &mut facts.components {
            if facts.exports.iter().any(|name| *name == component.name) {
                component.exported = true;
            }
        }

        // Components defined inside other components. Worklist: bodies
        // registered here are themselves scanned for deeper definitions.
        let mut body_index = 0;
        while body_index < bodies.len() {
            let body_id = bodies[body_index].1;
            body_index += 1;
            let Some(body) = find_node_by_id(root, body_id) else {
                continue;
            };
            self.collect_nested(bytes, rel_path, body, &mut facts, &mut bodies);
        }

        let markup_ctx = MarkupCtx {
            source: bytes,
            file: rel_path,
            widgets: &self.options.interactive_widgets,
        };
        for (name, body_id) in &bodies {
            let Some(body) = find_node_by_id(root, *body_id) else {
                continue;
            };
            markup::collect_markup(&markup_ctx, body, name, &mut facts);
        }

        let aux = AuxCtx {
            source: bytes,
            file: rel_path,
            components: &facts.components,
        };
        datasource::collect_api_calls(&aux, root, &mut facts.api_calls);
        datasource::collect_state_hooks(&aux, root, &mut facts.state_hooks);

        // The "call" prefix keeps the call-site label distinct from the
        // backend endpoint labeled "METHOD path".
        for call in &facts.api_calls {
            facts.elements.push(InformativeElement {
                kind: ElementKind::DataSource,
                name: format!("call {} {}", call.method, call.path),
                position: call.position.unwrap_or(Position { line: 0, column: 0 }),
                component: call.component.clone(),
                handlers: Vec::new(),
                data_bindings: Vec::new(),
                semantic_identifier: Some(call.path.clone()),
            });
        }
        for hook in &facts.state_hooks {
            facts.elements.push(InformativeElement {
                kind: ElementKind::StateManagement,
                name: hook.hook.clone(),
                position: hook.position,
                component: hook.component.clone(),
                handlers: Vec::new(),
                data_bindings: Vec::new(),
                semantic_identifier: None,
            });
        }

        Ok(facts)
    }

    fn handle_top_level(
        &self,
        source: &[u8],
        file: &str,
        node: Node,
        exported: bool,
        facts: &mut FileFacts,
        bodies: &mut Vec<(String, usize)>,
    ) {
        match node.kind() {
            "import_statement" => {
                if let Some(record) = import_record(source, node) {
                    facts.imports.push(record);
                }
            }
            "export_statement" => self.handle_export(source, file, node, facts, bodies),
            "function_declaration" => {
                self.handle_function(source, file, node, exported, facts, bodies);
            }
            "lexical_declaration" | "variable_declaration" => {
                self.handle_variable(source, file, node, exported, facts, bodies);
            }
            "class_declaration" => {
                self.handle_class(source, file, node, exported, facts, bodies);
            }
            _ => {}
        }
    }

    /// Qualifying definitions inside a component body. A registered nested
    /// component is not descended into here; the worklist scans its body.
    fn collect_nested(
        &self,
        source: &[u8],
        file: &str,
        node: Node,
        facts: &mut FileFacts,
        bodies: &mut Vec<(String, usize)>,
    ) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let before = bodies.len();
            match child.kind() {
                "function_declaration" => {
                    self.handle_function(source, file, child, false, facts, bodies);
                }
                "lexical_declaration" | "variable_declaration" => {
                    self.handle_variable(source, file, child, false, facts, bodies);
                }
                "class_declaration" => {
                    self.handle_class(source, file, child, false, facts, bodies);
                }
                _ => {}
            }
            if bodies.len() == before {
                self.collect_nested(source, file, child, facts, bodies);
            }
        }
    }

    fn handle_export(
        &self,
        source: &[u8],
        file: &str,
        node: Node,
        facts: &mut FileFacts,
        bodies: &mut Vec<(String, usize)>,
    ) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "function_declaration" | "lexical_declaration" | "variable_declaration"
                | "class_declaration" => {
                    self.handle_top_level(source, file, child, true, facts, bodies);
                }
                "identifier" => facts.exports.push(node_text(source, child)),
                "export_clause" => {
                    let mut inner = child.walk();
                    for spec in child.named_children(&mut inner) {
                        if spec.kind() == "export_specifier" {
                            if let Some(name) = spec.child_by_field_name("name") {
                                facts.exports.push(node_text(source, name));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_function(
        &self,
        source: &[u8],
        file: &str,
        node: Node,
        exported: bool,
        facts: &mut FileFacts,
        bodies: &mut Vec<(String, usize)>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(source, name_node);
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        if !is_component_name(&name) || !contains_markup(body) {
            return;
        }
        facts.components.push(ComponentDefinition {
            name: name.clone(),
            file: file.to_string(),
            position: position_of(node),
            kind: ComponentKind::Function,
            exported,
            byte_range: (node.start_byte(), node.end_byte()),
        });
        bodies.push((name, body.id()));
    }

    fn handle_variable(
        &self,
        source: &[u8],
        file: &str,
        node: Node,
        exported: bool,
        facts: &mut FileFacts,
        bodies: &mut Vec<(String, usize)>,
    ) {
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name_node.kind() != "identifier" {
                continue;
            }
            let name = node_text(source, name_node);
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            let candidate = match value.kind() {
                "arrow_function" | "function_expression" => Some(value),
                // React.memo(...) / forwardRef(...) wrappers.
                "call_expression" => value
                    .child_by_field_name("arguments")
                    .and_then(|arguments| {
                        let mut inner = arguments.walk();
                        arguments.named_children(&mut inner).find(|arg| {
                            matches!(arg.kind(), "arrow_function" | "function_expression")
                        })
                    }),
                _ => None,
            };
            let Some(function) = candidate else {
                continue;
            };
            let Some(body) = function.child_by_field_name("body") else {
                continue;
            };
            if !is_component_name(&name) || !contains_markup(body) {
                continue;
            }
            facts.components.push(ComponentDefinition {
                name: name.clone(),
                file: file.to_string(),
                position: position_of(declarator),
                kind: ComponentKind::Function,
                exported,
                byte_range: (declarator.start_byte(), declarator.end_byte()),
            });
            bodies.push((name, body.id()));
        }
    }

    fn handle_class(
        &self,
        source: &[u8],
        file: &str,
        node: Node,
        exported: bool,
        facts: &mut FileFacts,
        bodies: &mut Vec<(String, usize)>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(source, name_node);
        if !is_component_name(&name) {
            return;
        }
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(render_body) = render_method_body(source, body) else {
            return;
        };
        if !contains_markup(render_body) {
            return;
        }
        facts.components.push(ComponentDefinition {
            name: name.clone(),
            file: file.to_string(),
            position: position_of(node),
            kind: ComponentKind::Class,
            exported,
            byte_range: (node.start_byte(), node.end_byte()),
        });
        bodies.push((name, body.id()));
    }
}

fn render_method_body<'tree>(source: &[u8], class_body: Node<'tree>) -> Option<Node<'tree>> {
    let mut cursor = class_body.walk();
    for member in class_body.named_children(&mut cursor) {
        if member.kind() != "method_definition" {
            continue;
        }
        let Some(name) = member.child_by_field_name("name") else {
            continue;
        };
        if node_text(source, name) != "render" {
            continue;
        }
        return member.child_by_field_name("body");
    }
    None
}

fn import_record(source: &[u8], node: Node) -> Option<ImportRecord> {
    let source_node = node.child_by_field_name("source")?;
    let import_source = datasource::unquote_string_literal(&node_text(source, source_node));
    let relative = import_source.starts_with("./") || import_source.starts_with("../");
    let mut names = Vec::new();
    let mut default_name = None;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut inner = child.walk();
        for part in child.named_children(&mut inner) {
            match part.kind() {
                "identifier" => default_name = Some(node_text(source, part)),
                "named_imports" => {
                    let mut specs = part.walk();
                    for spec in part.named_children(&mut specs) {
                        if spec.kind() == "import_specifier" {
                            if let Some(name) = spec.child_by_field_name("name") {
                                names.push(node_text(source, name));
                            }
                        }
                    }
                }
                "namespace_import" => {
                    if let Some(alias) = part.named_child(0) {
                        default_name = Some(node_text(source, alias));
                    }
                }
                _ => {}
            }
        }
    }
    Some(ImportRecord {
        source: import_source,
        names,
        default_name,
        relative,
    })
}

fn is_component_name(name: &str) -> bool {
    name.chars()
        .next()
        .map(|ch| ch.is_ascii_uppercase())
        .unwrap_or(false)
}

pub(crate) fn node_text(source: &[u8], node: Node) -> String {
    node.utf8_text(source).unwrap_or_default().to_string()
}

pub(crate) fn position_of(node: Node) -> Position {
    let start = node.start_position();
    Position {
        line: start.row as i64 + 1,
        column: start.column as i64 + 1,
    }
}

/// Recover a node recorded by id during the definition pass. Ids are stable
/// within one tree, so this walk always terminates at the same node.
fn find_node_by_id(root: Node, id: usize) -> Option<Node> {
    if root.id() == id {
        return Some(root);
    }
    let mut cursor = root.walk();
    let children: Vec<Node> = root.children(&mut cursor).collect();
    for child in children {
        if let Some(found) = find_node_by_id(child, id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;

    fn extract(source: &str) -> FileFacts {
        let mut extractor = Extractor::new(ExtractorOptions::default()).unwrap();
        extractor
            .extract_file("javascript", source, "src/App.jsx")
            .unwrap()
    }

    #[test]
    fn finds_function_component_with_markup() {
        let facts = extract(
            r#"
export function UserCard() {
  return <div className="card"><span>hello</span></div>;
}
"#,
        );
        assert_eq!(facts.components.len(), 1);
        assert_eq!(facts.components[0].name, "UserCard");
        assert!(facts.components[0].exported);
        assert_eq!(facts.components[0].kind, ComponentKind::Function);
    }

    #[test]
    fn uppercase_without_markup_is_not_a_component() {
        let facts = extract(
            r#"
function FormatDate(value) {
  return value.toISOString();
}
"#,
        );
        assert!(facts.components.is_empty());
    }

    #[test]
    fn arrow_component_and_conditional_markup() {
        let facts = extract(
            r#"
const Banner = ({ show }) => show ? <div onClick={dismiss}>Close</div> : null;
"#,
        );
        assert_eq!(facts.components.len(), 1);
        assert_eq!(facts.components[0].name, "Banner");
        assert_eq!(facts.elements.len(), 1);
        assert_eq!(facts.elements[0].component, "Banner");
        assert_eq!(facts.elements[0].handlers[0].event, "onClick");
        assert_eq!(facts.elements[0].handlers[0].callees, vec!["dismiss"]);
        assert_eq!(facts.elements[0].semantic_identifier.as_deref(), Some("Close"));
    }

    #[test]
    fn class_component_needs_render_markup() {
        let facts = extract(
            r#"
class Dashboard extends React.Component {
  render() {
    return <section><Chart data={this.props.data} /></section>;
  }
}
class Helper {
  render() { return 42; }
}
"#,
        );
        assert_eq!(facts.components.len(), 1);
        assert_eq!(facts.components[0].kind, ComponentKind::Class);
        assert_eq!(facts.usages.len(), 1);
        assert_eq!(facts.usages[0].name, "Chart");
        assert_eq!(facts.usages[0].used_in, "Dashboard");
    }

    #[test]
    fn passive_markup_is_dropped() {
        let facts = extract(
            r#"
function Layout() {
  return <div><span>static</span><p>text</p></div>;
}
"#,
        );
        assert!(facts.elements.is_empty());
    }

    #[test]
    fn inline_closure_resolves_all_callees() {
        let facts = extract(
            r#"
function Toolbar() {
  return <button aria-label="save" onClick={() => { validate(); store.save(); }}>Save</button>;
}
"#,
        );
        let element = &facts.elements[0];
        assert_eq!(element.kind, ElementKind::Input);
        let binding = &element.handlers[0];
        assert_eq!(binding.callees, vec!["save", "validate"]);
        assert_eq!(element.semantic_identifier.as_deref(), Some("save"));
    }

    #[test]
    fn nested_components_get_their_own_context() {
        let facts = extract(
            r#"
function App() {
  function Inner() {
    return <button onClick={save}>Go</button>;
  }
  const Row = () => <li onClick={pick}>row</li>;
  return <section><Inner /><Row /></section>;
}
"#,
        );
        let names: Vec<&str> = facts.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["App", "Inner", "Row"]);

        // Markup inside a nested definition belongs to it, not to App.
        assert_eq!(facts.elements.len(), 2);
        assert_eq!(facts.elements[0].component, "Inner");
        assert_eq!(facts.elements[0].name, "button");
        assert_eq!(facts.elements[1].component, "Row");
        assert_eq!(facts.elements[1].name, "li");

        let used: Vec<&str> = facts.usages.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(used, vec!["Inner", "Row"]);
        assert!(facts.usages.iter().all(|u| u.used_in == "App"));
    }

    #[test]
    fn nested_component_owns_its_api_calls() {
        let facts = extract(
            r#"
function Page() {
  const Widget = () => {
    const refresh = () => fetch("/api/widgets");
    return <div onClick={refresh}>w</div>;
  };
  return <main><Widget /></main>;
}
"#,
        );
        assert_eq!(facts.api_calls.len(), 1);
        assert_eq!(facts.api_calls[0].component, "Widget");
    }

    #[test]
    fn fetch_calls_attach_to_owning_component() {
        let facts = extract(
            r#"
function Users() {
  const load = () => fetch("/api/users");
  return <div onClick={load}>users</div>;
}
fetch("/api/health", { method: "POST" });
"#,
        );
        assert_eq!(facts.api_calls.len(), 2);
        assert_eq!(facts.api_calls[0].component, "Users");
        assert_eq!(facts.api_calls[0].method, "GET");
        assert_eq!(facts.api_calls[1].component, "App");
        assert_eq!(facts.api_calls[1].method, "POST");
        assert!(facts
            .elements
            .iter()
            .any(|element| element.kind == ElementKind::DataSource));
    }

    #[test]
    fn state_hooks_become_state_elements() {
        let facts = extract(
            r#"
function Counter() {
  const [count, setCount] = useState(0);
  return <button onClick={() => setCount(count + 1)}>+</button>;
}
"#,
        );
        assert_eq!(facts.state_hooks.len(), 1);
        assert_eq!(facts.state_hooks[0].hook, "useState");
        assert_eq!(facts.state_hooks[0].component, "Counter");
        assert!(facts
            .elements
            .iter()
            .any(|element| element.kind == ElementKind::StateManagement));
    }

    #[test]
    fn route_declarations_are_collected() {
        let facts = extract(
            r#"
function App() {
  return (
    <Routes>
      <Route path="/users" element={<Users />} />
      <Route path="/admin" component={Admin} />
    </Routes>
  );
}
"#,
        );
        assert_eq!(facts.routes.len(), 2);
        assert_eq!(facts.routes[0].path, "/users");
        assert_eq!(facts.routes[0].component, "Users");
        assert_eq!(facts.routes[1].component, "Admin");
    }

    #[test]
    fn imports_record_source_and_specifiers() {
        let facts = extract(
            r#"
import React, { useState } from "react";
import { UserCard } from "./components/UserCard";
function App() { return <UserCard />; }
"#,
        );
        assert_eq!(facts.imports.len(), 2);
        assert_eq!(facts.imports[0].default_name.as_deref(), Some("React"));
        assert_eq!(facts.imports[0].names, vec!["useState"]);
        assert!(!facts.imports[0].relative);
        assert!(facts.imports[1].relative);
    }
}
