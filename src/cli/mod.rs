pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Portal CLI - backend lookups and session tooling for the customer portal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Backend base URL (defaults to PORTAL_BACKEND_URL)")]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show the identity behind an access token")]
    Whoami {
        #[arg(long, help = "Access token (defaults to PORTAL_TOKEN)")]
        token: Option<String>,
    },

    #[command(about = "Look up a backend resource")]
    Lookup {
        #[command(subcommand)]
        cmd: commands::lookup::LookupCommands,
    },

    #[command(about = "Mint and inspect session cookies")]
    Session {
        #[command(subcommand)]
        cmd: commands::session::SessionCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let backend = cli
        .backend
        .clone()
        .unwrap_or_else(|| crate::config::config().backend.base_url.clone());

    match cli.command {
        Commands::Whoami { token } => commands::lookup::whoami(&backend, token, output_format).await,
        Commands::Lookup { cmd } => commands::lookup::handle(cmd, &backend, output_format).await,
        Commands::Session { cmd } => commands::session::handle(cmd, output_format),
    }
}
