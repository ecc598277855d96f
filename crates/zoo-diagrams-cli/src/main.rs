//! zoo-diagrams CLI - Materialize Mermaid blocks in rendered HTML pages

mod cli;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();

    // Logging is set up inside run(), once the flags are known.
    let app = cli::DiagramsApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
