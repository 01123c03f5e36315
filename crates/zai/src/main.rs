//! zAI - master agent coordinating tools and specialized agents

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    agents_command, ask_command, delegate_command, init_command, status_command, tools_command,
};

/// zAI - route questions to tools and specialized agents
#[derive(Parser)]
#[command(name = "zai")]
#[command(about = "◆ A master agent coordinating tools and specialized agents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and agent directory
    Init,
    /// Ask the master agent
    Ask {
        /// Message to send
        #[arg(short, long)]
        message: Option<String>,
        /// Session ID
        #[arg(short, long, default_value = "default")]
        session: String,
    },
    /// Show system status
    Status,
    /// List registered tools
    Tools {
        /// Only tools whose name starts with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
        /// Only tools in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List specialized agents and their state
    Agents,
    /// Send a query straight to one agent
    Delegate {
        /// Agent name
        agent: String,
        /// Query text
        query: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (label, result) = match cli.command {
        Commands::Init => ("Init", init_command().await),
        Commands::Ask { message, session } => ("Ask", ask_command(message, session).await),
        Commands::Status => ("Status", status_command().await),
        Commands::Tools { prefix, category } => ("Tools", tools_command(prefix, category).await),
        Commands::Agents => ("Agents", agents_command().await),
        Commands::Delegate { agent, query } => ("Delegate", delegate_command(agent, query).await),
    };

    if let Err(e) = result {
        error!("{} failed: {:#}", label, e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
