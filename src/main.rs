//! Countdown CLI - mirrors a server-synchronized countdown timer
//!
//! Connects to the state and subscriber-count channels of a countdown
//! server and ticks the timer locally between snapshots:
//! - `watch`: live view of a running countdown
//! - `simulate`: offline run from a snapshot file

use anyhow::Result;
use clap::{CommandFactory, Parser};

use countdown::cli::{
    load_snapshot, simulate, Cli, Commands, Display, TerminalListener, WatchClient,
};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);
    install_tls_provider();

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over the verbose flag.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Selects the crypto provider used for `wss://` channels.
fn install_tls_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("TLS crypto provider already installed");
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Watch(args)) => {
            let mut client = WatchClient::new(args.to_config());
            if args.reconnect {
                client = client.with_reconnect(args.max_retries);
            }

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            client.watch(TerminalListener::stdout(), shutdown).await?;
        }
        Some(Commands::Simulate(args)) => {
            let snapshot = load_snapshot(&args.file)?;
            let mut listener = TerminalListener::stdout();
            let summary = simulate(snapshot, args.ticks, &mut listener);
            Display::show_simulation_summary(&summary);
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
