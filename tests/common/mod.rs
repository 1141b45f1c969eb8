use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use portal_web::config::AppConfig;
use portal_web::session::{Session, SessionCodec};
use reqwest::StatusCode;

pub const SESSION_SECRET: &str = "integration-session-secret";
pub const ASSET_MAX_AGE: u64 = 120;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub asset_dir: PathBuf,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let asset_dir = std::env::temp_dir().join(format!("portal-web-assets-{}", port));
        std::fs::create_dir_all(&asset_dir).context("failed to create asset dir")?;
        std::fs::write(asset_dir.join("app.css"), "body { margin: 0 }")?;

        // Nothing listens on the backend port, so backend calls fail as transport errors
        let backend_port = portpicker::pick_unused_port().context("failed to pick backend port")?;

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/portal-web");
        cmd.env("APP_ENV", "development")
            .env("PORTAL_PORT", port.to_string())
            .env("PORTAL_SESSION_SECRET", SESSION_SECRET)
            .env("PORTAL_BACKEND_URL", format!("http://127.0.0.1:{}/api", backend_port))
            .env("PORTAL_ASSET_DIR", &asset_dir)
            .env("PORTAL_ASSET_MAX_AGE_SECS", ASSET_MAX_AGE.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            asset_dir,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Client that reports redirects instead of following them
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

/// A session the spawned server will accept
#[allow(dead_code)]
pub fn session(subject: &str) -> Session {
    let mut config = AppConfig::development();
    config.session.secret = SESSION_SECRET.to_string();
    let codec = SessionCodec::new(&config.session, &config.cookies).expect("codec");
    codec
        .issue(subject, "upstream-token", chrono::Utc::now().timestamp())
        .expect("session")
}
