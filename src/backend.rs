use anyhow::Result;
use tree_sitter::{Node, Parser};

use crate::error::AnalysisError;
use crate::extractor::node_text;
use crate::model::{EndpointFact, StorageOpFact, StorageOpType};

/// Receivers whose HTTP-verb method calls register routes.
const ROUTER_RECEIVERS: &[&str] = &["app", "router", "server", "api"];
const ROUTE_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "all"];

/// Receivers whose member calls touch storage.
const DB_RECEIVERS: &[&str] = &["db", "pool", "client", "knex", "database"];

/// Prisma model operations that only read.
const PRISMA_READS: &[&str] = &[
    "findMany",
    "findUnique",
    "findFirst",
    "count",
    "aggregate",
    "groupBy",
];
const PRISMA_WRITES: &[&str] = &[
    "create",
    "createMany",
    "update",
    "updateMany",
    "upsert",
    "delete",
    "deleteMany",
];

#[derive(Debug, Default)]
pub struct BackendFacts {
    pub endpoints: Vec<EndpointFact>,
    pub storage_ops: Vec<StorageOpFact>,
}

/// Finds route registrations and storage operations in backend files.
pub struct BackendAnalyzer {
    js: Parser,
    ts: Parser,
}

impl BackendAnalyzer {
    pub fn new() -> Result<Self> {
        let mut js = Parser::new();
        js.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
        let mut ts = Parser::new();
        ts.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;
        Ok(Self { js, ts })
    }

    pub fn analyze_file(
        &mut self,
        language: &str,
        source: &str,
        rel_path: &str,
    ) -> Result<BackendFacts, AnalysisError> {
        if source.trim().is_empty() {
            return Err(AnalysisError::syntax(rel_path, "empty file"));
        }
        let parser = match language {
            "typescript" => &mut self.ts,
            _ => &mut self.js,
        };
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::syntax(rel_path, "parse failed"))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(AnalysisError::syntax(rel_path, "syntax error"));
        }

        let mut facts = BackendFacts::default();
        walk(source.as_bytes(), rel_path, root, &mut facts);
        Ok(facts)
    }
}

fn walk(source: &[u8], file: &str, node: Node, facts: &mut BackendFacts) {
    if node.kind() == "call_expression" {
        if let Some(endpoint) = route_registration(source, file, node) {
            facts.endpoints.push(endpoint);
        } else if let Some(op) = storage_operation(source, file, node) {
            facts.storage_ops.push(op);
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(source, file, child, facts);
    }
}

/// `app.get("/users/:id", handler)` style registrations.
fn route_registration(source: &[u8], file: &str, node: Node) -> Option<EndpointFact> {
    let (receiver, method) = member_receiver_and_method(source, node)?;
    if !ROUTER_RECEIVERS.contains(&receiver.as_str()) || !ROUTE_METHODS.contains(&method.as_str())
    {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let args: Vec<Node> = arguments.named_children(&mut cursor).collect();
    let path = string_value(source, *args.first()?)?;
    let http_method = if method == "all" {
        "ANY".to_string()
    } else {
        method.to_ascii_uppercase()
    };
    let name = args
        .iter()
        .skip(1)
        .find_map(|arg| handler_name(source, *arg))
        .unwrap_or_else(|| format!("{http_method} {path}"));
    Some(EndpointFact {
        name,
        path,
        method: http_method,
        file: file.to_string(),
    })
}

fn handler_name(source: &[u8], node: Node) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(source, node)),
        "member_expression" => node
            .child_by_field_name("property")
            .map(|property| node_text(source, property)),
        "function_expression" | "function_declaration" => node
            .child_by_field_name("name")
            .map(|name| node_text(source, name)),
        _ => None,
    }
}

fn storage_operation(source: &[u8], file: &str, node: Node) -> Option<StorageOpFact> {
    raw_query_op(source, file, node)
        .or_else(|| builder_op(source, file, node))
        .or_else(|| prisma_op(source, file, node))
}

/// `db.query("SELECT ... FROM users")` and friends: the table comes from
/// the SQL text itself.
fn raw_query_op(source: &[u8], file: &str, node: Node) -> Option<StorageOpFact> {
    let (receiver, method) = member_receiver_and_method(source, node)?;
    if !DB_RECEIVERS.contains(&receiver.as_str()) || !matches!(method.as_str(), "query" | "execute")
    {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    let sql = string_value(source, first)?;
    let (table, op_type) = sql_table_and_op(&sql)?;
    Some(StorageOpFact {
        operation: format!("{receiver}.{method}"),
        table,
        op_type,
        file: file.to_string(),
    })
}

/// `knex("users").where(...)` and `db.collection("users").find(...)`: the
/// table is the string argument, the operation type comes from the chained
/// method when one is visible.
fn builder_op(source: &[u8], file: &str, node: Node) -> Option<StorageOpFact> {
    let function = node.child_by_field_name("function")?;
    let (table, operation) = match function.kind() {
        "identifier" => {
            let name = node_text(source, function);
            if name != "knex" {
                return None;
            }
            let arguments = node.child_by_field_name("arguments")?;
            let table = string_value(source, arguments.named_child(0)?)?;
            (table, name)
        }
        "member_expression" => {
            let (receiver, method) = member_receiver_and_method(source, node)?;
            if !DB_RECEIVERS.contains(&receiver.as_str()) || method != "collection" {
                return None;
            }
            let arguments = node.child_by_field_name("arguments")?;
            let table = string_value(source, arguments.named_child(0)?)?;
            (table, format!("{receiver}.collection"))
        }
        _ => return None,
    };
    let op_type = chained_op_type(source, node).unwrap_or(StorageOpType::Read);
    Some(StorageOpFact {
        operation,
        table,
        op_type,
        file: file.to_string(),
    })
}

/// `prisma.user.findMany()` member chains.
fn prisma_op(source: &[u8], file: &str, node: Node) -> Option<StorageOpFact> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "member_expression" {
        return None;
    }
    let op_node = function.child_by_field_name("property")?;
    let op = node_text(source, op_node);
    let op_type = if PRISMA_READS.contains(&op.as_str()) {
        StorageOpType::Read
    } else if PRISMA_WRITES.contains(&op.as_str()) {
        StorageOpType::Write
    } else {
        return None;
    };
    let model_member = function.child_by_field_name("object")?;
    if model_member.kind() != "member_expression" {
        return None;
    }
    let root = model_member.child_by_field_name("object")?;
    if root.kind() != "identifier" || node_text(source, root) != "prisma" {
        return None;
    }
    let model = node_text(source, model_member.child_by_field_name("property")?);
    Some(StorageOpFact {
        operation: format!("prisma.{model}.{op}"),
        table: model,
        op_type,
        file: file.to_string(),
    })
}

/// When a builder call is itself the receiver of a chained method, the
/// chained name decides read vs write.
fn chained_op_type(source: &[u8], node: Node) -> Option<StorageOpType> {
    let parent = node.parent()?;
    if parent.kind() != "member_expression" {
        return None;
    }
    let property = parent.child_by_field_name("property")?;
    let name = node_text(source, property);
    let op_type = match name.as_str() {
        "select" | "where" | "first" | "find" | "findOne" | "pluck" | "count" => {
            StorageOpType::Read
        }
        "insert" | "insertOne" | "insertMany" | "update" | "updateOne" | "updateMany" | "del"
        | "delete" | "deleteOne" | "deleteMany" | "upsert" => StorageOpType::Write,
        _ => return None,
    };
    Some(op_type)
}

fn member_receiver_and_method(source: &[u8], call: Node) -> Option<(String, String)> {
    let function = call.child_by_field_name("function")?;
    if function.kind() != "member_expression" {
        return None;
    }
    let object = function.child_by_field_name("object")?;
    if object.kind() != "identifier" {
        return None;
    }
    let property = function.child_by_field_name("property")?;
    Some((node_text(source, object), node_text(source, property)))
}

fn string_value(source: &[u8], node: Node) -> Option<String> {
    match node.kind() {
        "string" => {
            let text = node_text(source, node);
            Some(
                text.trim_matches(|ch| ch == '"' || ch == '\'')
                    .to_string(),
            )
        }
        "template_string" => Some(node_text(source, node).trim_matches('`').to_string()),
        _ => None,
    }
}

/// Pull the first table name out of a SQL string and classify the
/// statement. Quoted and schema-qualified names keep only the final part.
fn sql_table_and_op(sql: &str) -> Option<(String, StorageOpType)> {
    let upper = sql.to_ascii_uppercase();
    let tokens: Vec<&str> = sql.split_whitespace().collect();
    let upper_tokens: Vec<String> = upper
        .split_whitespace()
        .map(|token| token.to_string())
        .collect();

    let (keyword, op_type) = if upper.starts_with("SELECT") {
        ("FROM", StorageOpType::Read)
    } else if upper.starts_with("INSERT") {
        ("INTO", StorageOpType::Write)
    } else if upper.starts_with("UPDATE") {
        ("UPDATE", StorageOpType::Write)
    } else if upper.starts_with("DELETE") {
        ("FROM", StorageOpType::Write)
    } else {
        return None;
    };

    let index = upper_tokens.iter().position(|token| token == keyword)?;
    let raw = tokens.get(index + 1)?;
    let cleaned = raw
        .trim_matches(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_' && ch != '.')
        .rsplit('.')
        .next()?
        .to_string();
    if cleaned.is_empty() {
        return None;
    }
    Some((cleaned.to_ascii_lowercase(), op_type))
}
