//! # Amagi CLI Entry Point
//!
//! Searches tracks across a pool of search nodes from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # Search with the default engine (YouTube)
//! amagi search -n youshallnotpass@localhost:2333 never gonna give you up
//!
//! # Search SoundCloud over two nodes, failing over between them
//! amagi search -n pw@lava1:2333 -n pw@lava2:2333 -e soundcloud lofi
//!
//! # Load a URL directly, nodes from a config file
//! amagi search -c amagi.json https://www.youtube.com/watch?v=dQw4w9WgXcQ
//!
//! # Probe every node
//! amagi status -c amagi.json | jq '.nodes'
//! ```
//!
//! Results are printed as raw JSON on stdout. Logs go to stderr and follow
//! `RUST_LOG` (default `info`).

use amagi_cli::commands::{self, ConnectOptions};
use amagi_common::SearchEngine;
use anyhow::{bail, Result};
use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs)]
/// Amagi - track search dispatcher
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Search(SearchArgs),
    Status(StatusArgs),
}

/// Arguments for a single search.
///
/// The query words are joined with spaces. A query starting with `http://`
/// or `https://` is loaded as is, without an engine prefix.
#[derive(FromArgs)]
#[argh(subcommand, name = "search")]
/// search tracks across the nodes
struct SearchArgs {
    /// search engine: youtube, youtubeMusic, soundcloud, or a raw prefix
    /// such as "spsearch:"
    #[argh(option, short = 'e')]
    engine: Option<String>,

    /// JSON config file with nodes, cache and request settings
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// node as auth@host, can be repeated
    #[argh(option, short = 'n', long = "node")]
    nodes: Vec<String>,

    /// connect to --node hosts over https
    #[argh(switch)]
    secure: bool,

    /// request timeout in milliseconds
    #[argh(option)]
    timeout: Option<u64>,

    /// node attempts per search, capped to the number of nodes
    #[argh(option)]
    retry: Option<usize>,

    /// keep nodes that fail validation instead of aborting
    #[argh(switch, long = "ignore-dead-node")]
    ignore_dead_node: bool,

    /// query words or a URL
    #[argh(positional)]
    query: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
/// probe every node and report node and cache state
struct StatusArgs {
    /// JSON config file with nodes, cache and request settings
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// node as auth@host, can be repeated
    #[argh(option, short = 'n', long = "node")]
    nodes: Vec<String>,

    /// connect to --node hosts over https
    #[argh(switch)]
    secure: bool,

    /// request timeout in milliseconds
    #[argh(option)]
    timeout: Option<u64>,
}

impl SearchArgs {
    fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            config: self.config.clone(),
            nodes: self.nodes.clone(),
            secure: self.secure,
            timeout_ms: self.timeout,
            retry: self.retry,
            ignore_dead_node: self.ignore_dead_node,
        }
    }
}

impl StatusArgs {
    fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            config: self.config.clone(),
            nodes: self.nodes.clone(),
            secure: self.secure,
            timeout_ms: self.timeout,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // stdout is reserved for the JSON result
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Status(args) => run_status(args).await,
    }
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        bail!("Missing search query");
    }

    let config = commands::resolve_config(&args.connect_options())?;
    let engine = args.engine.as_deref().map(SearchEngine::from);
    let result = commands::search(config, &query, engine).await?;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

async fn run_status(args: StatusArgs) -> Result<()> {
    let config = commands::resolve_config(&args.connect_options())?;
    let status = commands::status(config).await?;

    println!("{}", serde_json::to_string(&status)?);
    Ok(())
}
