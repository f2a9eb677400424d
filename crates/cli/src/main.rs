//! promptwright CLI: the main entry point.
//!
//! Commands:
//! - `compile` : Build the completion request for a conversation and a new message
//! - `index`   : Index a project directory for contextual search
//! - `models`  : List known models and their context windows
//! - `config`  : Show, locate or validate the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "promptwright",
    about = "promptwright: token-budgeted completion requests from conversations",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a completion request and print it as JSON
    Compile {
        /// Conversation file (JSON)
        #[arg(short, long)]
        conversation: PathBuf,

        /// The new user message (defaults to the last message when retrying)
        #[arg(short, long)]
        message: Option<String>,

        /// Target model (defaults to the conversation's model)
        #[arg(long)]
        model: Option<String>,

        /// Regenerate the response of the last message
        #[arg(long)]
        retry: bool,

        /// Answer from the project index instead of history
        #[arg(long)]
        contextual_search: bool,
    },

    /// Index a project directory for contextual search
    Index {
        /// Directory to index
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// List known models and their context windows
    Models,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Validate the configuration
    Validate,
    /// Print a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr so stdout stays pipeable.
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Compile {
            conversation,
            message,
            model,
            retry,
            contextual_search,
        } => {
            commands::compile::run(commands::compile::CompileArgs {
                conversation,
                message,
                model,
                retry,
                contextual_search,
            })
            .await?
        }
        Commands::Index { dir } => commands::index::run(&dir).await?,
        Commands::Models => commands::models::run()?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Validate => commands::config_cmd::validate()?,
            ConfigAction::Init => commands::config_cmd::init(),
        },
    }

    Ok(())
}
