//! Command-line interface for the zoo-diagrams utility
//!
//! Materializes Mermaid source blocks in rendered HTML pages, the same way
//! the docs site does in the browser, so pages can be checked or
//! prerendered ahead of time.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::executor::block_on;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use zoo_diagrams::core::logging::{init_logging, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use zoo_diagrams::engine::{detect_diagram_kind, header_keyword, DiagramKind, PrerenderLoader};
use zoo_diagrams::materializer::EngineProvider;
use zoo_diagrams::{
    materialize_html_with, Document, Environment, MaterializeReport, Materializer,
    MaterializerConfig,
};

/// zoo-diagrams - Materialize Mermaid diagrams in rendered HTML
#[derive(Parser)]
#[command(name = "zoo-diagrams")]
#[command(about = "Turn Mermaid code blocks in rendered HTML pages into diagram containers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output; raises the log level to at least info
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Cli {
    /// Log level after `--verbose` is applied
    pub fn effective_log_level(&self) -> LogLevel {
        match self.log_level {
            LogLevel::Warn | LogLevel::Error if self.verbose => LogLevel::Info,
            level => level,
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace Mermaid code blocks with diagram containers
    Materialize {
        /// Input HTML file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output HTML file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file overriding marker and container names
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Behave like static generation: leave the page untouched
        #[arg(long = "static")]
        static_build: bool,

        /// Print the run report to stderr as JSON
        #[arg(long)]
        report: bool,
    },

    /// List Mermaid code blocks found in a page
    Scan {
        /// Input HTML file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// JSON file overriding marker and container names
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show recognized diagram types
    Types {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// One source block as listed by `scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub index: usize,
    pub spelling: String,
    pub inline: bool,
    /// Detected type id, `None` when the header is not recognized
    pub diagram_type: Option<&'static str>,
    pub header: Option<String>,
}

/// Main CLI application
#[derive(Default)]
pub struct DiagramsApp;

impl DiagramsApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level_str = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.effective_log_level().as_str().to_string()));

        let log_format_str = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("zoo-diagrams v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Materialize {
                input,
                output,
                config,
                static_build,
                report,
            } => self.materialize_command(input, output, config, static_build, report, cli.verbose),
            Commands::Scan {
                input,
                config,
                json,
            } => self.scan_command(input, config, json, cli.verbose),
            Commands::Types { json } => self.types_command(json, cli.verbose),
        }
    }

    /// Handle the materialize command
    fn materialize_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        config: Option<PathBuf>,
        static_build: bool,
        report: bool,
        verbose: bool,
    ) -> Result<()> {
        let config = self.load_config(config)?;
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let environment = if static_build {
            Environment::Static
        } else {
            Environment::Interactive
        };
        let (html, run_report) = self.materialize(config, environment, &content)?;

        if verbose {
            eprintln!("{}", run_report);
        }
        if report {
            eprintln!("{}", serde_json::to_string(&run_report)?);
        }

        self.write_output(output, &html)
    }

    /// Materialize one page with a provider scoped to this run
    pub fn materialize(
        &self,
        config: MaterializerConfig,
        environment: Environment,
        html: &str,
    ) -> Result<(String, MaterializeReport)> {
        let provider = Arc::new(EngineProvider::new(PrerenderLoader::new(
            config.id_prefix.clone(),
        )));
        let materializer = Materializer::with_config(config, provider);
        block_on(materialize_html_with(&materializer, environment, html))
    }

    /// Handle the scan command
    fn scan_command(
        &self,
        input: Option<PathBuf>,
        config: Option<PathBuf>,
        json: bool,
        verbose: bool,
    ) -> Result<()> {
        let config = self.load_config(config)?;
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let entries = self.scan(config, &content)?;

        if json {
            let listing = serde_json::json!({
                "blocks": entries,
                "total": entries.len(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            for entry in &entries {
                println!(
                    "{:>3}  {:<8} {:<7} {}",
                    entry.index,
                    entry.spelling,
                    if entry.inline { "inline" } else { "block" },
                    entry.diagram_type.unwrap_or("unknown"),
                );
            }
            println!();
            println!("Total: {} diagram block(s)", entries.len());
        }

        Ok(())
    }

    /// Source blocks of a page, in document order
    pub fn scan(&self, config: MaterializerConfig, html: &str) -> Result<Vec<ScanEntry>> {
        let document = Document::parse_html(html)?;
        let provider = Arc::new(EngineProvider::new(PrerenderLoader::default()));
        let materializer = Materializer::with_config(config, provider);

        let entries = materializer
            .discover(&document)
            .into_iter()
            .enumerate()
            .map(|(index, block)| {
                let source = document.text_content(block.node);
                ScanEntry {
                    index,
                    spelling: block.spelling.to_string(),
                    inline: block.inline,
                    diagram_type: detect_diagram_kind(&source).map(|kind| kind.id()),
                    header: header_keyword(&source),
                }
            })
            .collect::<Vec<_>>();
        debug!(blocks = entries.len(), "Scan completed");
        Ok(entries)
    }

    /// Handle the types command
    fn types_command(&self, json: bool, verbose: bool) -> Result<()> {
        if verbose {
            eprintln!("Listing recognized diagram types");
        }

        let kinds: Vec<DiagramKind> = DiagramKind::all().collect();

        if json {
            let types: Vec<_> = kinds
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "name": kind.id(),
                        "description": kind.description(),
                        "keywords": kind.keywords(),
                    })
                })
                .collect();
            let listing = serde_json::json!({
                "supported_types": types,
                "total": kinds.len(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            println!("Recognized diagram types:");
            for kind in &kinds {
                println!("  {:<14} - {}", kind.id(), kind.description());
            }
            println!();
            println!("Total: {} diagram types recognized", kinds.len());
        }

        Ok(())
    }

    fn load_config(&self, path: Option<PathBuf>) -> Result<MaterializerConfig> {
        match path {
            Some(path) => MaterializerConfig::load(&path)
                .map_err(|e| anyhow!("Failed to load config '{}': {}", path.display(), e)),
            None => Ok(MaterializerConfig::default()),
        }
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    ///
    /// Written exactly as given; an unchanged page stays byte-identical.
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(content.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}
