use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::backend::BackendAnalyzer;
use crate::config::Config;
use crate::extractor::facts::FileFacts;
use crate::extractor::{Extractor, ExtractorOptions};
use crate::graph::{cycles, usage, BuilderOptions, GraphBuilder};
use crate::model::{
    ConnectionMappingResult, Cycle, DeadCodeInfo, EndpointFact, Graph, Route, StorageOpFact,
    UsageStatistics,
};
use crate::scan::{self, FileRole, ScanOptions};
use crate::util;

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub graph: Graph,
    pub usage: UsageStatistics,
    pub dead_code: Vec<DeadCodeInfo>,
    pub connections: ConnectionMappingResult,
    pub cycles: Vec<Cycle>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    pub no_ignore: bool,
}

/// Full pipeline: scan, extract per file (failures isolated), build the
/// graph, score liveness, map connections, detect cycles.
pub fn analyze(repo_root: &Path, options: AnalyzeOptions) -> Result<AnalysisReport> {
    let files = scan::scan_repo_with_options(repo_root, ScanOptions::new(options.no_ignore))
        .map_err(|err| crate::error::AnalysisError::system(err.to_string()))?;
    let max_bytes = Config::get().max_file_size_mb as i64 * 1024 * 1024;

    let mut extractor = Extractor::new(ExtractorOptions::default())?;
    let mut backend = BackendAnalyzer::new()?;
    let mut facts: Vec<FileFacts> = Vec::new();
    let mut endpoints: Vec<EndpointFact> = Vec::new();
    let mut storage_ops: Vec<StorageOpFact> = Vec::new();

    for file in &files {
        if file.size > max_bytes {
            eprintln!(
                "viewgraph: skipping {} ({} bytes over limit)",
                file.rel_path, file.size
            );
            continue;
        }
        let source = match util::read_to_string(&file.abs_path) {
            Ok(value) => value,
            Err(err) => {
                eprintln!("viewgraph: skipping {}: {err}", file.rel_path);
                continue;
            }
        };
        match file.role {
            FileRole::Frontend => {
                match extractor.extract_file(&file.language, &source, &file.rel_path) {
                    Ok(file_facts) => facts.push(file_facts),
                    Err(err) => eprintln!("viewgraph: {err}"),
                }
            }
            FileRole::Backend => match backend.analyze_file(&file.language, &source, &file.rel_path)
            {
                Ok(backend_facts) => {
                    endpoints.extend(backend_facts.endpoints);
                    storage_ops.extend(backend_facts.storage_ops);
                }
                Err(err) => eprintln!("viewgraph: {err}"),
            },
        }
    }

    let routes = collect_routes(&facts);
    let built =
        GraphBuilder::new(BuilderOptions::default()).build(&facts, &routes, &endpoints, &storage_ops)?;
    let mut graph = built.graph;
    let usage_report = usage::score_liveness(&mut graph);
    graph.refresh_stats();
    let cycles = cycles::detect_cycles(&graph);

    Ok(AnalysisReport {
        graph,
        usage: usage_report.statistics,
        dead_code: usage_report.dead_code,
        connections: built.connections,
        cycles,
    })
}

/// Route declarations found in JSX become the section inputs for the
/// builder. The section name is the first path segment, or "home" for the
/// root route.
pub fn collect_routes(facts: &[FileFacts]) -> Vec<Route> {
    let mut routes = Vec::new();
    for file in facts {
        for decl in &file.routes {
            routes.push(Route {
                path: decl.path.clone(),
                component: decl.component.clone(),
                section: section_name(&decl.path),
            });
        }
    }
    routes
}

fn section_name(path: &str) -> String {
    path.split('/')
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.trim_start_matches(':').to_string())
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| "home".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_names_from_paths() {
        assert_eq!(section_name("/"), "home");
        assert_eq!(section_name("/users"), "users");
        assert_eq!(section_name("/admin/stats"), "admin");
        assert_eq!(section_name("/:id"), "id");
    }
}
