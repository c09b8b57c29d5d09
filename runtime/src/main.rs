// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use reelsniff_runtime::cli::{self, play_cmd::PlayTarget};
use reelsniff_runtime::config::RuntimeConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "reelsniff",
    about = "Reelsniff: find a title, sniff a playable stream, hand it to mpv",
    version,
    after_help = "Run 'reelsniff <command> --help' for details on each command.\nRun 'reelsniff' with no command to be prompted for a title."
)]
struct Cli {
    /// Config file (JSON). Defaults to $REELSNIFF_CONFIG or ~/.reelsniff/config.json
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Show the browser window instead of running headless
    #[arg(long, global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search a title, pick one, sniff a stream and play it
    Play {
        /// Free-text title query (prompted for when omitted)
        query: Vec<String>,
        /// Pick the Nth result instead of prompting
        #[arg(long)]
        pick: Option<usize>,
        /// Skip the lookup and play this IMDb id directly
        #[arg(long, conflicts_with_all = ["query", "pick"])]
        id: Option<String>,
    },
    /// Sniff a stream for an IMDb id and print it
    Sniff {
        /// IMDb identifier (e.g. "tt0133093")
        id: String,
    },
    /// Look a title up and print the candidates
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// List the configured sources in attempt order
    Sources,
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "reelsniff=debug,reelsniff_runtime=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "reelsniff", &mut std::io::stdout());
        return Ok(());
    }

    let (mut config, config_path) = RuntimeConfig::load(cli.config.as_deref())?;
    if cli.headed {
        config.browser.headless = false;
    }

    match cli.command {
        None => match cli::play_cmd::prompt_query(&config).await? {
            Some(query) => cli::play_cmd::run(&config, PlayTarget::Query(query), None).await,
            None => Ok(()),
        },
        Some(Commands::Play { query, pick, id }) => {
            let target = match id {
                Some(id) => PlayTarget::Identifier(id),
                None if query.is_empty() => match cli::play_cmd::prompt_query(&config).await? {
                    Some(query) => PlayTarget::Query(query),
                    None => return Ok(()),
                },
                None => PlayTarget::Query(query.join(" ")),
            };
            cli::play_cmd::run(&config, target, pick).await
        }
        Some(Commands::Sniff { id }) => cli::sniff_cmd::run(&config, &id, cli.json).await,
        Some(Commands::Search { query }) => {
            cli::search_cmd::run(&config, &query.join(" "), cli.json).await
        }
        Some(Commands::Sources) => cli::sources_cmd::run(&config, cli.json),
        Some(Commands::Doctor) => cli::doctor::run(&config, config_path.as_deref()).await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Global flags via environment variables so all modules can check them
    if cli.quiet {
        std::env::set_var("REELSNIFF_QUIET", "1");
    }
    init_tracing(cli.verbose);

    let json = cli.json;
    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = run(cli).await {
        if json {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}
