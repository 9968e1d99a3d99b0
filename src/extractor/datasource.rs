use tree_sitter::Node;

use super::facts::{ComponentDefinition, StateHookFact};
use super::{node_text, position_of};
use crate::model::ApiCallFact;

/// Receivers whose HTTP-verb methods count as API calls.
const AXIOS_RECEIVERS: &[&str] = &["axios", "http", "api", "client"];
const AXIOS_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];

/// React state hooks that mark a component as stateful.
const STATE_HOOKS: &[&str] = &["useState", "useReducer", "useContext", "useRef"];

pub(crate) struct AuxCtx<'a> {
    pub source: &'a [u8],
    pub file: &'a str,
    pub components: &'a [ComponentDefinition],
}

impl AuxCtx<'_> {
    /// Attribute a byte offset to the innermost component whose body
    /// contains it, so nested definitions own their own calls.
    /// Module-level calls fall back to the file stem.
    fn owning_component(&self, offset: usize) -> String {
        let mut best: Option<&ComponentDefinition> = None;
        for component in self.components {
            if !component.contains_byte(offset) {
                continue;
            }
            let narrower = best
                .map(|current| {
                    component.byte_range.1 - component.byte_range.0
                        < current.byte_range.1 - current.byte_range.0
                })
                .unwrap_or(true);
            if narrower {
                best = Some(component);
            }
        }
        match best {
            Some(component) => component.name.clone(),
            None => file_stem(self.file),
        }
    }
}

fn file_stem(file: &str) -> String {
    let last = file.rsplit('/').next().unwrap_or(file);
    match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => last.to_string(),
    }
}

/// Auxiliary traversal one: every fetch/axios call in the file.
pub(crate) fn collect_api_calls(ctx: &AuxCtx, node: Node, out: &mut Vec<ApiCallFact>) {
    if node.kind() == "call_expression" {
        if let Some(call) = fetch_call(ctx, node).or_else(|| axios_call(ctx, node)) {
            out.push(call);
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_api_calls(ctx, child, out);
    }
}

/// Auxiliary traversal two: state hook calls.
pub(crate) fn collect_state_hooks(ctx: &AuxCtx, node: Node, out: &mut Vec<StateHookFact>) {
    if node.kind() == "call_expression" {
        if let Some(function) = node.child_by_field_name("function") {
            if function.kind() == "identifier" {
                let name = node_text(ctx.source, function);
                if STATE_HOOKS.contains(&name.as_str()) {
                    out.push(StateHookFact {
                        hook: name,
                        component: ctx.owning_component(node.start_byte()),
                        position: position_of(node),
                    });
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_state_hooks(ctx, child, out);
    }
}

/// `fetch("/api/users")` and `fetch(url, { method: "POST", ... })`.
fn fetch_call(ctx: &AuxCtx, node: Node) -> Option<ApiCallFact> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" || node_text(ctx.source, function) != "fetch" {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let args: Vec<Node> = arguments.named_children(&mut cursor).collect();
    let path = string_argument(ctx.source, *args.first()?)?;
    let method = args
        .get(1)
        .and_then(|options| object_property_string(ctx.source, *options, "method"))
        .unwrap_or_else(|| "GET".to_string())
        .to_ascii_uppercase();
    Some(ApiCallFact {
        component: ctx.owning_component(node.start_byte()),
        file: ctx.file.to_string(),
        method,
        path,
        position: Some(position_of(node)),
    })
}

/// `axios.get("/api/users")` style calls on any known client receiver, and
/// the config form `axios({ url, method })`.
fn axios_call(ctx: &AuxCtx, node: Node) -> Option<ApiCallFact> {
    let function = node.child_by_field_name("function")?;
    let arguments = node.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let args: Vec<Node> = arguments.named_children(&mut cursor).collect();

    match function.kind() {
        "member_expression" => {
            let receiver = function.child_by_field_name("object")?;
            let property = function.child_by_field_name("property")?;
            if receiver.kind() != "identifier" {
                return None;
            }
            let receiver_name = node_text(ctx.source, receiver);
            let method_name = node_text(ctx.source, property);
            if !AXIOS_RECEIVERS.contains(&receiver_name.as_str())
                || !AXIOS_METHODS.contains(&method_name.as_str())
            {
                return None;
            }
            let path = string_argument(ctx.source, *args.first()?)?;
            Some(ApiCallFact {
                component: ctx.owning_component(node.start_byte()),
                file: ctx.file.to_string(),
                method: method_name.to_ascii_uppercase(),
                path,
                position: Some(position_of(node)),
            })
        }
        "identifier" if node_text(ctx.source, function) == "axios" => {
            let config = *args.first()?;
            let path = object_property_string(ctx.source, config, "url")?;
            let method = object_property_string(ctx.source, config, "method")
                .unwrap_or_else(|| "GET".to_string())
                .to_ascii_uppercase();
            Some(ApiCallFact {
                component: ctx.owning_component(node.start_byte()),
                file: ctx.file.to_string(),
                method,
                path,
                position: Some(position_of(node)),
            })
        }
        _ => None,
    }
}

fn string_argument(source: &[u8], node: Node) -> Option<String> {
    match node.kind() {
        "string" => Some(unquote_string_literal(&node_text(source, node))),
        "template_string" => {
            let text = node_text(source, node);
            Some(text.trim_matches('`').to_string())
        }
        _ => None,
    }
}

pub(crate) fn object_property_string(source: &[u8], node: Node, key: &str) -> Option<String> {
    if node.kind() != "object" {
        return None;
    }
    let mut cursor = node.walk();
    for pair in node.named_children(&mut cursor) {
        if pair.kind() != "pair" {
            continue;
        }
        let Some(key_node) = pair.child_by_field_name("key") else {
            continue;
        };
        let key_text = node_text(source, key_node);
        let key_text = key_text.trim_matches('"').trim_matches('\'');
        if key_text != key {
            continue;
        }
        let Some(value) = pair.child_by_field_name("value") else {
            continue;
        };
        if value.kind() == "string" {
            return Some(unquote_string_literal(&node_text(source, value)));
        }
    }
    None
}

pub(crate) fn unquote_string_literal(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        let first = bytes[0];
        let last = bytes[trimmed.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}
