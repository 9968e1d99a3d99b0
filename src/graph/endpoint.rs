/// Segments kept literal even when a later rule would parameterize them.
const KNOWN_STATIC_SEGMENTS: &[&str] = &[
    "api", "auth", "users", "user", "admin", "login", "logout", "register", "search", "health",
    "status", "settings", "profile", "public", "static", "assets", "services", "graphql",
    "webhooks", "internal", "orders", "products", "items",
];

/// Canonical, parameterized form of a concrete path. Structurally equivalent
/// paths compare equal after normalization regardless of literal ids.
/// Idempotent: normalizing an already-normalized path is a no-op.
pub fn normalize(path: &str) -> String {
    let (path, fragment) = match path.split_once('#') {
        Some((before, _)) => (before, true),
        None => (path, false),
    };
    let (path, query) = match path.split_once('?') {
        Some((before, _)) => (before, true),
        None => (path, false),
    };

    let mut segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(classify_segment)
        .collect();
    if query {
        segments.push(":query".to_string());
    }
    if fragment {
        segments.push(":fragment".to_string());
    }
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Strict priority order; the first matching rule wins. Reordering these
/// rules misclassifies segments: a UUID checked after the generic rule
/// would come back as `:identifier`.
fn classify_segment(segment: &str) -> String {
    // Already parameterized, including our own markers.
    if segment.starts_with(':') || segment.contains("${") {
        return placeholder_or(segment);
    }
    if KNOWN_STATIC_SEGMENTS.contains(&segment.to_ascii_lowercase().as_str()) {
        return segment.to_string();
    }
    if looks_like_uuid(segment) {
        return ":uuid".to_string();
    }
    if is_version_tag(segment) {
        return segment.to_string();
    }
    if segment.chars().all(|ch| ch.is_ascii_digit()) {
        return ":id".to_string();
    }
    if is_capitalized_alphanumeric(segment) {
        return ":objectId".to_string();
    }
    let has_digit = segment.chars().any(|ch| ch.is_ascii_digit());
    if segment.contains('.') && is_word(segment, &['.', '-', '_']) {
        return ":file".to_string();
    }
    if segment.contains('_') && is_word(segment, &['_']) {
        return ":slug".to_string();
    }
    if segment.contains('-') && !has_digit && is_word(segment, &['-']) {
        return ":slug".to_string();
    }
    if has_digit && is_word(segment, &['-']) {
        return ":identifier".to_string();
    }
    segment.to_string()
}

fn placeholder_or(segment: &str) -> String {
    if segment.starts_with(':') {
        segment.to_string()
    } else {
        ":param".to_string()
    }
}

fn is_word(segment: &str, extra: &[char]) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || extra.contains(&ch))
}

/// 8-4-4-4-12 hex groups.
fn looks_like_uuid(segment: &str) -> bool {
    let parts: Vec<&str> = segment.split('-').collect();
    if parts.len() != 5 {
        return false;
    }
    let lens = [8, 4, 4, 4, 12];
    parts.iter().zip(lens.iter()).all(|(part, len)| {
        part.len() == *len && part.chars().all(|ch| ch.is_ascii_hexdigit())
    })
}

/// `v1`, `v2.3`, `v10.0.1`.
fn is_version_tag(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix('v') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    rest.split('.')
        .all(|part| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit()))
}

/// Mixed-case alphanumeric ids such as Mongo-style object ids or camelCase
/// tokens carrying digits.
fn is_capitalized_alphanumeric(segment: &str) -> bool {
    segment.chars().any(|ch| ch.is_ascii_uppercase())
        && segment.chars().any(|ch| ch.is_ascii_digit())
        && segment.chars().all(|ch| ch.is_ascii_alphanumeric())
}
