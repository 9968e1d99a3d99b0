use tree_sitter::Node;

use super::facts::{
    ComponentUsage, EventHandlerBinding, FileFacts, HandlerBindingKind, InformativeElement,
    RouteDecl, INPUT_TAGS,
};

use super::{node_text, position_of};
use crate::config::Config;
use crate::model::ElementKind;

/// Attributes that identify an element rather than bind data to it.
const SEMANTIC_ATTRS: &[&str] = &["aria-label", "data-testid", "id"];

/// Attributes that are never data bindings.
const INERT_ATTRS: &[&str] = &["key", "ref", "className", "class", "style"];

pub(crate) struct MarkupCtx<'a> {
    pub source: &'a [u8],
    pub file: &'a str,
    pub widgets: &'a [String],
}

/// True when the node's shape can carry JSX and somewhere below it a JSX
/// element, self-closing element, or fragment actually appears. Shapes not
/// listed here cannot produce markup from a component body.
pub(crate) fn contains_markup(node: Node) -> bool {
    match node.kind() {
        "jsx_element" | "jsx_self_closing_element" | "jsx_fragment" => true,
        "statement_block" | "expression_statement" | "parenthesized_expression"
        | "jsx_expression" | "sequence_expression" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor).any(contains_markup)
        }
        "return_statement" => node.named_child(0).map(contains_markup).unwrap_or(false),
        "if_statement" => {
            let consequence = node
                .child_by_field_name("consequence")
                .map(contains_markup)
                .unwrap_or(false);
            let alternative = node
                .child_by_field_name("alternative")
                .map(contains_markup)
                .unwrap_or(false);
            consequence || alternative
        }
        "else_clause" => node.named_child(0).map(contains_markup).unwrap_or(false),
        "ternary_expression" => {
            let consequence = node
                .child_by_field_name("consequence")
                .map(contains_markup)
                .unwrap_or(false);
            let alternative = node
                .child_by_field_name("alternative")
                .map(contains_markup)
                .unwrap_or(false);
            consequence || alternative
        }
        "binary_expression" => {
            let left = node
                .child_by_field_name("left")
                .map(contains_markup)
                .unwrap_or(false);
            let right = node
                .child_by_field_name("right")
                .map(contains_markup)
                .unwrap_or(false);
            left || right
        }
        "call_expression" => {
            let Some(arguments) = node.child_by_field_name("arguments") else {
                return false;
            };
            let mut cursor = arguments.walk();
            arguments.named_children(&mut cursor).any(contains_markup)
        }
        "arrow_function" | "function_expression" => node
            .child_by_field_name("body")
            .map(contains_markup)
            .unwrap_or(false),
        _ => false,
    }
}

/// Walk a component body and record every informative element, component
/// usage, and route declaration it contains. The owning component is fixed
/// for the whole walk; nested closures do not change ownership, but nested
/// component definitions own their markup and are walked separately.
pub(crate) fn collect_markup(ctx: &MarkupCtx, body: Node, component: &str, facts: &mut FileFacts) {
    // An arrow component can have a bare JSX expression as its whole body.
    if matches!(body.kind(), "jsx_element" | "jsx_self_closing_element") {
        handle_jsx_element(ctx, body, component, facts);
        return;
    }
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "jsx_element" | "jsx_self_closing_element" => {
                handle_jsx_element(ctx, child, component, facts);
            }
            "jsx_fragment" => collect_markup(ctx, child, component, facts),
            // Nested component definitions get their own extraction pass.
            "function_declaration" | "class_declaration" => {}
            "lexical_declaration" | "variable_declaration" => {
                let mut decl_cursor = child.walk();
                for declarator in child.named_children(&mut decl_cursor) {
                    if !is_component_declarator(ctx.source, declarator) {
                        collect_markup(ctx, declarator, component, facts);
                    }
                }
            }
            _ => collect_markup(ctx, child, component, facts),
        }
    }
}

/// A `const Inner = () => <jsx/>` declarator defines a component of its
/// own; its markup must not be attributed to the enclosing body.
fn is_component_declarator(source: &[u8], declarator: Node) -> bool {
    if declarator.kind() != "variable_declarator" {
        return false;
    }
    let Some(name) = declarator.child_by_field_name("name") else {
        return false;
    };
    if name.kind() != "identifier" || !is_component_tag(&node_text(source, name)) {
        return false;
    }
    let Some(value) = declarator.child_by_field_name("value") else {
        return false;
    };
    if !matches!(value.kind(), "arrow_function" | "function_expression") {
        return false;
    }
    value
        .child_by_field_name("body")
        .map(contains_markup)
        .unwrap_or(false)
}

fn handle_jsx_element(ctx: &MarkupCtx, node: Node, component: &str, facts: &mut FileFacts) {
    let tag_node = match node.kind() {
        "jsx_self_closing_element" => Some(node),
        _ => node
            .named_children(&mut node.walk())
            .find(|child| child.kind() == "jsx_opening_element"),
    };

    if let Some(tag_owner) = tag_node {
        if let Some(tag) = element_tag(ctx.source, tag_owner) {
            let attrs = collect_attributes(ctx, tag_owner);
            if tag == "Route" {
                if let Some(route) = route_decl(&attrs, ctx.file) {
                    facts.routes.push(route);
                }
            } else if is_component_tag(&tag) && !ctx.widgets.iter().any(|widget| *widget == tag) {
                facts.usages.push(ComponentUsage {
                    name: tag.clone(),
                    used_in: component.to_string(),
                    file: ctx.file.to_string(),
                    position: position_of(node),
                });
            } else if let Some(element) = build_element(ctx, node, &tag, component, &attrs) {
                facts.elements.push(element);
            }
        }
    }

    // Child markup belongs to the same component even when it sits inside
    // a capitalized usage.
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "jsx_element" | "jsx_self_closing_element" => {
                handle_jsx_element(ctx, child, component, facts);
            }
            "jsx_opening_element" | "jsx_closing_element" => {}
            _ => collect_markup(ctx, child, component, facts),
        }
    }
}

fn is_component_tag(tag: &str) -> bool {
    tag.chars().next().map(|ch| ch.is_ascii_uppercase()).unwrap_or(false)
}

fn element_tag(source: &[u8], node: Node) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    Some(node_text(source, name))
}

struct JsxAttr {
    name: String,
    string_value: Option<String>,
    expr_kind: Option<&'static str>,
    expr_text: Option<String>,
}

fn collect_attributes<'tree>(ctx: &MarkupCtx, node: Node<'tree>) -> Vec<(JsxAttr, Option<Node<'tree>>)> {
    let mut attrs = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "jsx_attribute" {
            continue;
        }
        let Some(name_node) = child.named_child(0) else {
            continue;
        };
        let name = node_text(ctx.source, name_node);
        let mut string_value = None;
        let mut expr_node = None;
        let mut inner_cursor = child.walk();
        for part in child.named_children(&mut inner_cursor) {
            match part.kind() {
                "string" => string_value = unquote(&node_text(ctx.source, part)),
                "jsx_expression" => {
                    expr_node = part.named_child(0);
                }
                _ => {}
            }
        }
        let expr_kind = expr_node.map(|expr| expr.kind());
        let expr_text = expr_node.map(|expr| node_text(ctx.source, expr));
        attrs.push((
            JsxAttr {
                name,
                string_value,
                expr_kind: expr_kind.map(kind_static),
                expr_text,
            },
            expr_node,
        ));
    }
    attrs
}

fn kind_static(kind: &str) -> &'static str {
    match kind {
        "identifier" => "identifier",
        "member_expression" => "member_expression",
        "arrow_function" => "arrow_function",
        "function_expression" => "function_expression",
        "call_expression" => "call_expression",
        "jsx_element" => "jsx_element",
        "jsx_self_closing_element" => "jsx_self_closing_element",
        _ => "other",
    }
}

fn build_element(
    ctx: &MarkupCtx,
    node: Node,
    tag: &str,
    component: &str,
    attrs: &[(JsxAttr, Option<Node>)],
) -> Option<InformativeElement> {
    let mut handlers = Vec::new();
    let mut data_bindings = Vec::new();
    for (attr, expr) in attrs {
        if is_event_attr(&attr.name) {
            handlers.push(handler_binding(ctx, attr, *expr));
        } else if !SEMANTIC_ATTRS.contains(&attr.name.as_str())
            && !INERT_ATTRS.contains(&attr.name.as_str())
        {
            // Dynamic expression values and literal string attributes both
            // bind data to the element.
            data_bindings.push(attr.name.clone());
        }
    }
    if has_expression_child(node) {
        data_bindings.push("children".to_string());
    }
    if handlers.is_empty() && data_bindings.is_empty() {
        return None;
    }

    let kind = if INPUT_TAGS.contains(&tag.to_ascii_lowercase().as_str())
        || (is_component_tag(tag) && !handlers.is_empty())
    {
        ElementKind::Input
    } else {
        ElementKind::Display
    };

    Some(InformativeElement {
        kind,
        name: tag.to_string(),
        position: position_of(node),
        component: component.to_string(),
        handlers,
        data_bindings,
        semantic_identifier: semantic_identifier(ctx, node, attrs),
    })
}

fn has_expression_child(node: Node) -> bool {
    if node.kind() != "jsx_element" {
        return false;
    }
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .any(|child| child.kind() == "jsx_expression")
}

fn is_event_attr(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('o')
        && chars.next() == Some('n')
        && chars.next().map(|ch| ch.is_ascii_uppercase()).unwrap_or(false)
}

fn handler_binding(ctx: &MarkupCtx, attr: &JsxAttr, expr: Option<Node>) -> EventHandlerBinding {
    let event = attr.name.clone();
    let Some(expr) = expr else {
        return EventHandlerBinding {
            event,
            kind: HandlerBindingKind::DirectReference,
            callees: Vec::new(),
        };
    };
    match expr.kind() {
        "identifier" => EventHandlerBinding {
            event,
            kind: HandlerBindingKind::DirectReference,
            callees: vec![node_text(ctx.source, expr)],
        },
        "member_expression" => {
            let callees = member_method_name(ctx.source, expr)
                .map(|name| vec![name])
                .unwrap_or_default();
            EventHandlerBinding {
                event,
                kind: HandlerBindingKind::MemberAccess,
                callees,
            }
        }
        "arrow_function" | "function_expression" => {
            let mut callees = Vec::new();
            closure_callees(ctx.source, expr, &mut callees);
            callees.sort();
            callees.dedup();
            EventHandlerBinding {
                event,
                kind: HandlerBindingKind::InlineClosure,
                callees,
            }
        }
        "call_expression" => {
            let callees = expr
                .child_by_field_name("function")
                .and_then(|function| callee_name(ctx.source, function))
                .map(|name| vec![name])
                .unwrap_or_default();
            EventHandlerBinding {
                event,
                kind: HandlerBindingKind::DirectReference,
                callees,
            }
        }
        _ => EventHandlerBinding {
            event,
            kind: HandlerBindingKind::InlineClosure,
            callees: Vec::new(),
        },
    }
}

/// Every call made anywhere inside a closure body, by name. A closure that
/// calls nothing resolves to no handlers.
fn closure_callees(source: &[u8], node: Node, out: &mut Vec<String>) {
    if node.kind() == "call_expression" {
        if let Some(function) = node.child_by_field_name("function") {
            if let Some(name) = callee_name(source, function) {
                out.push(name);
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        closure_callees(source, child, out);
    }
}

fn callee_name(source: &[u8], function: Node) -> Option<String> {
    match function.kind() {
        "identifier" => Some(node_text(source, function)),
        "member_expression" => member_method_name(source, function),
        _ => None,
    }
}

fn member_method_name(source: &[u8], member: Node) -> Option<String> {
    let property = member.child_by_field_name("property")?;
    Some(node_text(source, property))
}

/// Semantic identifier priority: aria-label, then data-testid, then id,
/// then a short single text child.
fn semantic_identifier(ctx: &MarkupCtx, node: Node, attrs: &[(JsxAttr, Option<Node>)]) -> Option<String> {
    for wanted in SEMANTIC_ATTRS {
        if let Some((attr, _)) = attrs.iter().find(|(attr, _)| attr.name == *wanted) {
            if let Some(value) = &attr.string_value {
                if !value.is_empty() {
                    return Some(value.clone());
                }
            }
        }
    }
    single_text_child(ctx, node)
}

fn single_text_child(ctx: &MarkupCtx, node: Node) -> Option<String> {
    if node.kind() != "jsx_element" {
        return None;
    }
    let mut text = None;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "jsx_opening_element" | "jsx_closing_element" => {}
            "jsx_text" => {
                if text.is_some() {
                    return None;
                }
                text = Some(node_text(ctx.source, child).trim().to_string());
            }
            _ => return None,
        }
    }
    let text = text?;
    if text.is_empty() || text.chars().count() > Config::get().semantic_text_max {
        return None;
    }
    Some(text)
}

/// `<Route path="/users" element={<Users />} />` and the older
/// `component={Users}` form.
fn route_decl(attrs: &[(JsxAttr, Option<Node>)], file: &str) -> Option<RouteDecl> {
    let path = attrs
        .iter()
        .find(|(attr, _)| attr.name == "path")
        .and_then(|(attr, _)| attr.string_value.clone())?;
    let component = attrs.iter().find_map(|(attr, _)| match attr.name.as_str() {
        "element" => match attr.expr_kind {
            Some("jsx_element") | Some("jsx_self_closing_element") => attr
                .expr_text
                .as_deref()
                .and_then(jsx_expr_tag_name),
            _ => None,
        },
        "component" => match attr.expr_kind {
            Some("identifier") => attr.expr_text.clone(),
            _ => None,
        },
        _ => None,
    })?;
    Some(RouteDecl {
        path,
        component,
        file: file.to_string(),
    })
}

fn jsx_expr_tag_name(text: &str) -> Option<String> {
    let trimmed = text.trim_start_matches('<').trim();
    let name: String = trimmed
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '.')
        .collect();
    if name.is_empty() { None } else { Some(name) }
}

fn unquote(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        let first = bytes[0];
        let last = bytes[trimmed.len() - 1];
        if (first == b'"' && last == b'"')
            || (first == b'\'' && last == b'\'')
            || (first == b'`' && last == b'`')
        {
            return Some(trimmed[1..trimmed.len() - 1].to_string());
        }
    }
    Some(trimmed.to_string())
}
