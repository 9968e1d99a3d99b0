use anyhow::Result;
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub size: i64,
    pub language: String,
    pub role: FileRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Frontend,
    Backend,
}

#[derive(Debug, Clone)]
pub struct LanguageSpec {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub no_ignore: bool,
}

impl ScanOptions {
    pub fn new(no_ignore: bool) -> Self {
        Self { no_ignore }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { no_ignore: false }
    }
}

static LANGUAGE_SPECS: &[LanguageSpec] = &[
    LanguageSpec {
        name: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
    },
    LanguageSpec {
        name: "typescript",
        extensions: &["ts", "mts", "cts"],
    },
    LanguageSpec {
        name: "tsx",
        extensions: &["tsx"],
    },
];

/// Path segments that mark a file as backend rather than UI code.
static BACKEND_SEGMENTS: &[&str] = &[
    "server",
    "routes",
    "api",
    "middleware",
    "controllers",
    "db",
    "models",
    "services",
];

pub fn scan_repo_with_options(repo_root: &Path, options: ScanOptions) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();
    let mut builder = WalkBuilder::new(repo_root);
    if options.no_ignore {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    } else {
        builder
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .parents(true)
            .require_git(false);
    }
    let walker = builder
        .hidden(false)
        .filter_entry(|entry| !is_ignored_entry(entry))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(value) => value,
            Err(err) => {
                eprintln!("viewgraph: walk error: {err}");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let language = match detect_language(path) {
            Some(value) => value,
            None => continue,
        };
        let rel_path = crate::util::normalize_rel_path(repo_root, path)?;
        let size = fs::metadata(path).map(|meta| meta.len() as i64).unwrap_or(0);
        let role = classify_role(&rel_path);
        files.push(ScannedFile {
            rel_path,
            abs_path: path.to_path_buf(),
            size,
            language: language.to_string(),
            role,
        });
    }
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

fn is_ignored_entry(entry: &ignore::DirEntry) -> bool {
    match entry.file_name() {
        name if name == OsStr::new(".git") => true,
        name if name == OsStr::new("node_modules") => true,
        name if name == OsStr::new("dist") => true,
        name if name == OsStr::new("build") => true,
        _ => false,
    }
}

fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    for spec in LANGUAGE_SPECS {
        if spec.extensions.iter().any(|candidate| *candidate == ext) {
            return Some(spec.name);
        }
    }
    None
}

/// Classify a file as backend when any path segment matches a known backend
/// directory name. JSX-capable files are always frontend: backend route files
/// do not carry markup.
pub fn classify_role(rel_path: &str) -> FileRole {
    if rel_path.ends_with(".jsx") || rel_path.ends_with(".tsx") {
        return FileRole::Frontend;
    }
    let backend = rel_path
        .split('/')
        .any(|segment| BACKEND_SEGMENTS.contains(&segment.to_ascii_lowercase().as_str()));
    if backend {
        FileRole::Backend
    } else {
        FileRole::Frontend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_backend_paths() {
        assert_eq!(classify_role("server/routes/users.js"), FileRole::Backend);
        assert_eq!(classify_role("src/api/client.ts"), FileRole::Backend);
        assert_eq!(classify_role("src/components/App.tsx"), FileRole::Frontend);
        assert_eq!(classify_role("src/controllers/auth.ts"), FileRole::Backend);
    }

    #[test]
    fn jsx_is_always_frontend() {
        assert_eq!(classify_role("src/api/Dashboard.tsx"), FileRole::Frontend);
    }
}
