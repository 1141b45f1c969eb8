use anyhow::Context;
use clap::Subcommand;
use std::sync::Arc;

use crate::backend::BackendApi;
use crate::cli::utils::output_record;
use crate::cli::OutputFormat;
use crate::client::{AuthContext, ReqwestTransport};

#[derive(Subcommand)]
pub enum LookupCommands {
    #[command(about = "Show an organization")]
    Organization {
        #[arg(help = "Organization id")]
        id: String,
        #[arg(long, help = "Access token (defaults to PORTAL_TOKEN)")]
        token: Option<String>,
    },

    #[command(about = "Show a project")]
    Project {
        #[arg(help = "Project id")]
        id: String,
        #[arg(long, help = "Access token (defaults to PORTAL_TOKEN)")]
        token: Option<String>,
    },

    #[command(about = "Show a user")]
    User {
        #[arg(help = "User id")]
        id: String,
        #[arg(long, help = "Access token (defaults to PORTAL_TOKEN)")]
        token: Option<String>,
    },
}

pub async fn whoami(backend: &str, token: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let info = api(backend)
        .userinfo(bearer(token)?)
        .await
        .context("userinfo lookup failed")?;
    output_record(&output_format, &format!("Signed in as {}", info.name), &info)
}

pub async fn handle(cmd: LookupCommands, backend: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let api = api(backend);
    match cmd {
        LookupCommands::Organization { id, token } => {
            let organization = api
                .organization(bearer(token)?, &id)
                .await
                .with_context(|| format!("organization '{}' lookup failed", id))?;
            output_record(&output_format, &format!("Organization {}", organization.id), &organization)
        }
        LookupCommands::Project { id, token } => {
            let project = api
                .project(bearer(token)?, &id)
                .await
                .with_context(|| format!("project '{}' lookup failed", id))?;
            output_record(&output_format, &format!("Project {}", project.id), &project)
        }
        LookupCommands::User { id, token } => {
            let user = api
                .user(bearer(token)?, &id)
                .await
                .with_context(|| format!("user '{}' lookup failed", id))?;
            output_record(&output_format, &format!("User {}", user.id), &user)
        }
    }
}

fn api(backend: &str) -> BackendApi {
    BackendApi::new(backend, Arc::new(ReqwestTransport::default()))
}

fn bearer(token: Option<String>) -> anyhow::Result<AuthContext> {
    let token = token
        .or_else(|| std::env::var("PORTAL_TOKEN").ok())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("No access token: pass --token or set PORTAL_TOKEN"))?;
    Ok(AuthContext::Bearer(token))
}
