pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod model;
pub mod report;
pub mod scan;
pub mod util;

pub use error::AnalysisError;
pub use report::{analyze, AnalysisReport, AnalyzeOptions};
