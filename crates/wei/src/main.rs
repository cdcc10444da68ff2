//! Wei - conversational habit coach

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::{agents_command, chat_command, init_command, status_command};

/// Wei - habit coaching agents in your terminal
#[derive(Parser)]
#[command(name = "wei")]
#[command(about = "Conversational habit coach with a multi-agent runtime")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    /// Chat with the agents
    Chat {
        /// Message to send; omit for an interactive session
        #[arg(short, long)]
        message: Option<String>,
        /// Session key
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Agent set to run
        #[arg(short, long, default_value = wei_agent::configs::DEFAULT_SET)]
        agents: String,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show configuration and provider status
    Status,
    /// List agent sets and their handoff graphs
    Agents {
        /// Only show this set
        set: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Chat { verbose: true, .. }) {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Chat {
            message,
            session,
            agents,
            verbose: _,
        } => chat_command(message, session, agents).await,
        Commands::Status => status_command().await,
        Commands::Agents { set } => agents_command(set).await,
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
