use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "viewgraph",
    version,
    about = "Semantic dependency graphs for component-based UI apps",
    after_help = "EXAMPLES:\n    \
    viewgraph analyze .                    Full report (graph, dead code, connections, cycles)\n    \
    viewgraph graph ./my-app               Just the node/edge graph\n    \
    viewgraph dead-code ./my-app           Dead-code findings with confidence and impact\n    \
    viewgraph connections ./my-app         Frontend-to-backend connection mapping\n    \
    viewgraph cycles ./my-app              Dependency cycles with severity"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full analysis and print the complete report as JSON
    Analyze {
        /// Repository root to analyze
        path: PathBuf,
        /// Do not honor .gitignore files
        #[arg(long)]
        no_ignore: bool,
    },
    /// Print only the dependency graph
    Graph {
        path: PathBuf,
        #[arg(long)]
        no_ignore: bool,
    },
    /// Print dead-code findings
    DeadCode {
        path: PathBuf,
        #[arg(long)]
        no_ignore: bool,
    },
    /// Print the frontend/backend connection mapping
    Connections {
        path: PathBuf,
        #[arg(long)]
        no_ignore: bool,
    },
    /// Print dependency cycles
    Cycles {
        path: PathBuf,
        #[arg(long)]
        no_ignore: bool,
    },
}
