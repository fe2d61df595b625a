//! Redock command line
//!
//! Inspects and edits the runtime state Redock shares between invocations,
//! and exposes the host helpers (SSH keys, package mirror, local addresses,
//! container terminals).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use redock_logging::{init_logging, LogConfig};
use tracing::debug;

mod cli;

use cli::container::ContainerAction;
use cli::state::StateAction;

#[derive(Parser, Debug)]
#[command(name = "redock", about = "Human friendly wrapper around Docker: runtime state and host helpers")]
struct Cli {
    /// More output; repeat for even more (-vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use this state file instead of ~/.redock/state.json
    #[arg(long, global = true, env = redock_config::STATE_FILE_ENV)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect the runtime state record
    State {
        #[command(subcommand)]
        action: StateAction,
    },

    /// Manage the containers recorded in the runtime state
    Container {
        #[command(subcommand)]
        action: ContainerAction,
    },

    /// Make sure the SSH key pair exists and print the public key
    Keys,

    /// Print the Ubuntu package mirror configured in containers
    Mirror,

    /// List the local IPv4 addresses (no loopback)
    Addresses,

    /// Show a container's terminal output until Enter is pressed
    Attach {
        /// Container id
        container_id: String,
    },
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::State { action } => {
            let store = cli::open_store(cli.state_file)?;
            cli::state::run(&store, action)
        }
        Commands::Container { action } => {
            let store = cli::open_store(cli.state_file)?;
            cli::container::run(&store, action)
        }
        Commands::Keys => cli::host::keys(),
        Commands::Mirror => cli::host::mirror(),
        Commands::Addresses => cli::host::addresses(),
        Commands::Attach { container_id } => cli::host::attach(&container_id),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(LogConfig {
        app_name: "redock",
        verbosity: cli.verbose,
        log_to_file: true,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:#}", err);
            None
        }
    };
    debug!(command = ?cli.command, "Starting");

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(1)
        }
    }
}
