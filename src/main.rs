//! apiscope CLI entry point.

use apiscope::cli::{self, Cli, Commands, EXIT_ERROR};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Scan(args) => cli::run_scan(args),
        Commands::Endpoints(args) => cli::run_endpoints(args),
        Commands::Nodes(args) => cli::run_nodes(args),
        Commands::Search(args) => cli::run_search(args),
        Commands::Filter(args) => cli::run_filter(args),
        Commands::Stats(args) => cli::run_stats(args),
        Commands::Graph(args) => cli::run_graph(args),
        Commands::Export(args) => cli::run_export(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
