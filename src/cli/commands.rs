use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ragchat", version, about = "Terminal chat client for a RAG orchestrator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enter interactive chat against an environment's orchestrator
    Chat {
        /// Environment id to chat against (overrides the configured default)
        #[arg(short, long)]
        environment: Option<String>,
    },

    /// Inspect the configured deployment environments
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },

    /// Probe an orchestrator's reachability
    Health {
        /// Environment id to probe (overrides the configured default)
        #[arg(short, long)]
        environment: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EnvAction {
    /// List all configured environments
    List,

    /// Show a single environment in full
    Show { id: String },
}
