use anyhow::Result;
use clap::Parser;

use viewgraph::cli::{Cli, Command};
use viewgraph::report::{analyze, AnalyzeOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Analyze { path, no_ignore } => {
            let report = analyze(&path, AnalyzeOptions { no_ignore })?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Graph { path, no_ignore } => {
            let report = analyze(&path, AnalyzeOptions { no_ignore })?;
            println!("{}", serde_json::to_string_pretty(&report.graph)?);
        }
        Command::DeadCode { path, no_ignore } => {
            let report = analyze(&path, AnalyzeOptions { no_ignore })?;
            println!("{}", serde_json::to_string_pretty(&report.dead_code)?);
        }
        Command::Connections { path, no_ignore } => {
            let report = analyze(&path, AnalyzeOptions { no_ignore })?;
            println!("{}", serde_json::to_string_pretty(&report.connections)?);
        }
        Command::Cycles { path, no_ignore } => {
            let report = analyze(&path, AnalyzeOptions { no_ignore })?;
            println!("{}", serde_json::to_string_pretty(&report.cycles)?);
        }
    }
    Ok(())
}
