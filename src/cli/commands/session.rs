use anyhow::Context;
use chrono::{TimeZone, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_record, output_success};
use crate::cli::OutputFormat;
use crate::config;
use crate::session::{SessionCodec, SessionError};

#[derive(Subcommand)]
pub enum SessionCommands {
    #[command(about = "Mint a session cookie value signed with PORTAL_SESSION_SECRET")]
    Mint {
        #[arg(help = "Subject (user id)")]
        subject: String,
        #[arg(long, help = "Upstream access token to embed")]
        token: String,
    },

    #[command(about = "Verify a session cookie value and show its claims")]
    Inspect {
        #[arg(help = "Cookie value")]
        value: String,
    },
}

pub fn handle(cmd: SessionCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let codec = SessionCodec::new(&config.session, &config.cookies).context("PORTAL_SESSION_SECRET is not set")?;
    let now = Utc::now().timestamp();

    match cmd {
        SessionCommands::Mint { subject, token } => {
            let session = codec.issue(&subject, &token, now)?;
            output_success(
                &output_format,
                &format!("{}={}", codec.cookie_name(), session.encoded),
                Some(json!({
                    "cookie": codec.cookie_name(),
                    "value": session.encoded,
                    "expires_at": session.expires_at(),
                })),
            )
        }
        SessionCommands::Inspect { value } => match codec.decode(&value, now) {
            Ok(session) => output_record(
                &output_format,
                "Valid session",
                &json!({
                    "sub": session.claims.sub,
                    "sid": session.claims.sid,
                    "issued_at": Utc.timestamp_opt(session.claims.iat, 0).single(),
                    "expires_at": Utc.timestamp_opt(session.claims.exp, 0).single(),
                }),
            ),
            // Usually a secret mismatch between the CLI and the server
            Err(SessionError::Malformed(reason)) => {
                anyhow::bail!("session does not verify with the configured secret: {}", reason)
            }
            Err(e) => Err(e.into()),
        },
    }
}
