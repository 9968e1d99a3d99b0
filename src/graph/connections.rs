use std::collections::HashSet;

use super::endpoint::normalize;
use crate::model::{
    ApiCallFact, Connection, ConnectionKind, ConnectionMappingResult, EndpointFact, StorageOpFact,
};

/// Gateway prefixes stripped from a call path before retrying a direct
/// match as a proxy connection.
const GATEWAY_PREFIXES: &[&str] = &["/gateway", "/proxy", "/backend", "/api/v1", "/api"];

/// Confidence weights. Base applies to any formed connection; the bonuses
/// stack and the sum is clamped to 1.0.
const BASE_SCORE: f64 = 0.5;
const EXACT_PATH_BONUS: f64 = 0.4;
const METHOD_BONUS: f64 = 0.2;
const NORMALIZED_BONUS: f64 = 0.3;

const INDIRECT_FILE_SCORE: f64 = 0.6;
const INDIRECT_SERVICE_SCORE: f64 = 0.5;

/// Weighted confidence for a call/route pair. A full match (exact path,
/// method, normalized path) clamps to 1.0; a method-only match scores 0.7.
pub fn connection_confidence(call: &ApiCallFact, endpoint: &EndpointFact) -> f64 {
    let mut score = BASE_SCORE;
    if call.path == endpoint.path {
        score += EXACT_PATH_BONUS;
    }
    if method_matches(&call.method, &endpoint.method) {
        score += METHOD_BONUS;
    }
    if normalize(&call.path) == normalize(&endpoint.path) {
        score += NORMALIZED_BONUS;
    }
    score.min(1.0)
}

fn method_matches(call_method: &str, endpoint_method: &str) -> bool {
    endpoint_method == "ANY" || call_method.eq_ignore_ascii_case(endpoint_method)
}

/// Map frontend API calls onto backend routes and backend routes onto
/// storage operations. Direct matches require method compatibility and an
/// equal normalized path; proxy matches retry after stripping a gateway
/// prefix; indirect matches link a route to storage through a shared file
/// or service name.
pub fn map_connections(
    components: &[String],
    endpoints: &[EndpointFact],
    api_calls: &[ApiCallFact],
    storage_ops: &[StorageOpFact],
) -> ConnectionMappingResult {
    let mut connections = Vec::new();
    let mut matched_calls: HashSet<usize> = HashSet::new();
    let mut matched_endpoints: HashSet<usize> = HashSet::new();

    for (call_index, call) in api_calls.iter().enumerate() {
        for (endpoint_index, endpoint) in endpoints.iter().enumerate() {
            if let Some(connection) = direct_connection(call, endpoint) {
                matched_calls.insert(call_index);
                matched_endpoints.insert(endpoint_index);
                connections.push(connection);
            }
        }
    }

    // Proxy pass only for calls that found nothing directly.
    for (call_index, call) in api_calls.iter().enumerate() {
        if matched_calls.contains(&call_index) {
            continue;
        }
        let Some(stripped) = strip_gateway_prefix(&call.path) else {
            continue;
        };
        let proxied = ApiCallFact {
            path: stripped,
            ..call.clone()
        };
        for (endpoint_index, endpoint) in endpoints.iter().enumerate() {
            if let Some(mut connection) = direct_connection(&proxied, endpoint) {
                connection.kind = ConnectionKind::Proxy;
                connection.api_call = Some(call.clone());
                matched_calls.insert(call_index);
                matched_endpoints.insert(endpoint_index);
                connections.push(connection);
            }
        }
    }

    let mut matched_storage: HashSet<usize> = HashSet::new();
    for (endpoint_index, endpoint) in endpoints.iter().enumerate() {
        for (op_index, op) in storage_ops.iter().enumerate() {
            let Some(confidence) = indirect_score(endpoint, op) else {
                continue;
            };
            matched_endpoints.insert(endpoint_index);
            matched_storage.insert(op_index);
            connections.push(Connection {
                component: endpoint.name.clone(),
                endpoint: op.table.clone(),
                kind: ConnectionKind::Indirect,
                confidence,
                path: vec![endpoint.path.clone(), op.table.clone()],
                api_call: None,
                storage_op: Some(op.clone()),
            });
        }
    }

    let mut unmapped_frontend: Vec<String> = api_calls
        .iter()
        .enumerate()
        .filter(|(index, _)| !matched_calls.contains(index))
        .map(|(_, call)| format!("{}: {} {}", call.component, call.method, call.path))
        .collect();
    // Components that issue calls but matched nothing are unmapped too.
    for component in components {
        let calls: Vec<usize> = api_calls
            .iter()
            .enumerate()
            .filter(|(_, call)| call.component == *component)
            .map(|(index, _)| index)
            .collect();
        if !calls.is_empty() && calls.iter().all(|index| !matched_calls.contains(index)) {
            unmapped_frontend.push(component.clone());
        }
    }
    unmapped_frontend.sort();
    unmapped_frontend.dedup();

    let mut unmapped_backend: Vec<String> = endpoints
        .iter()
        .enumerate()
        .filter(|(index, _)| !matched_endpoints.contains(index))
        .map(|(_, endpoint)| endpoint.name.clone())
        .collect();
    unmapped_backend.extend(
        storage_ops
            .iter()
            .enumerate()
            .filter(|(index, _)| !matched_storage.contains(index))
            .map(|(_, op)| op.table.clone()),
    );
    unmapped_backend.sort();
    unmapped_backend.dedup();

    let frontend_count = api_calls.len();
    let backend_count = endpoints.len();
    let coverage = if frontend_count + backend_count == 0 {
        0.0
    } else {
        (2.0 * connections.len() as f64) / (frontend_count + backend_count) as f64 * 100.0
    };

    ConnectionMappingResult {
        connections,
        unmapped_frontend,
        unmapped_backend,
        coverage,
    }
}

fn direct_connection(call: &ApiCallFact, endpoint: &EndpointFact) -> Option<Connection> {
    if !method_matches(&call.method, &endpoint.method) {
        return None;
    }
    if normalize(&call.path) != normalize(&endpoint.path) {
        return None;
    }
    Some(Connection {
        component: call.component.clone(),
        endpoint: endpoint.name.clone(),
        kind: ConnectionKind::Direct,
        confidence: connection_confidence(call, endpoint),
        path: vec![
            call.component.clone(),
            format!("{} {}", call.method, call.path),
            endpoint.path.clone(),
        ],
        api_call: Some(call.clone()),
        storage_op: None,
    })
}

fn strip_gateway_prefix(path: &str) -> Option<String> {
    for prefix in GATEWAY_PREFIXES {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.starts_with('/') {
                return Some(rest.to_string());
            }
        }
    }
    None
}

fn indirect_score(endpoint: &EndpointFact, op: &StorageOpFact) -> Option<f64> {
    if endpoint.file == op.file {
        return Some(INDIRECT_FILE_SCORE);
    }
    let endpoint_service = service_name(&endpoint.file).or_else(|| service_name(&endpoint.path));
    let op_service = service_name(&op.file);
    match (endpoint_service, op_service) {
        (Some(a), Some(b)) if a == b => Some(INDIRECT_SERVICE_SCORE),
        _ => None,
    }
}

/// The `<name>` in a `/services/<name>/` path.
fn service_name(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .iter()
        .position(|segment| *segment == "services")
        .and_then(|index| segments.get(index + 1))
        .map(|segment| segment.to_string())
}
