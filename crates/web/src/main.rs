mod handlers;

use std::{
    fs::File,
    io::BufReader,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Router,
    extract::{ConnectInfo, FromRef},
    http::{HeaderName, Request, header},
};
use buildhook_build::{BuildLogStore, BuildPipeline};
use buildhook_core::config::Config;
use buildhook_github::status::reporter_from_config;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    ServiceBuilderExt,
    trace::{DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::{Level, Span};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use crate::handlers::build_router;

const CONFIG_ENV: &str = "BUILDHOOK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Clone, FromRef)]
pub struct AppState {
    config: Arc<Config>,
    pipeline: Arc<BuildPipeline>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let logs = BuildLogStore::open(&config.build.log_root).await.with_context(|| {
            format!("Failed to open log directory {}", config.build.log_root.display())
        })?;
        let reporter = reporter_from_config(&config.github)?;
        let pipeline = BuildPipeline::from_config(&config.build, Arc::new(logs), reporter);
        Ok(Self { config: Arc::new(config), pipeline: Arc::new(pipeline) })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                // Default to info level
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = load_config()?;
    let port = config.server.port;
    let state = AppState::new(config).await?;
    tracing::info!("Storing build logs in {}", state.pipeline.logs().root().display());

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await.context("bind error")?;
    tracing::info!("Web server: Listening on {}", addr);

    let router = app(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;
    tracing::info!("Shut down gracefully");
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let file = File::open(&path)
        .with_context(|| format!("Failed to open config file {}", path.display()))?;
    let config: Config = serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    anyhow::ensure!(!config.github.webhook_secret.is_empty(), "github.webhook_secret is empty");
    anyhow::ensure!(!config.build.command.is_empty(), "build.command is empty");
    Ok(config)
}

fn app(state: AppState) -> Router {
    let sensitive_headers: Arc<[_]> =
        vec![header::AUTHORIZATION, HeaderName::from_static("x-hub-signature-256")].into();
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(RequestSpan { level: Level::INFO })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .compression();
    build_router().with_state(state).layer(middleware)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}

#[derive(Debug, Clone)]
pub struct RequestSpan {
    level: Level,
}

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        // Behind a proxy the first forwarded address is the client
        let forwarded = request
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        let ip = forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(socket_addr)| socket_addr.ip())
            })
            .unwrap_or(IpAddr::from([0, 0, 0, 0]));
        let event = request
            .headers()
            .get("X-GitHub-Event")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("[unknown]");
        macro_rules! make_span {
            ($level:expr) => {
                tracing::span!(
                    $level,
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    ip = %ip,
                    event = %event,
                    user_agent = %user_agent,
                )
            }
        }
        match self.level {
            Level::ERROR => make_span!(Level::ERROR),
            Level::WARN => make_span!(Level::WARN),
            Level::INFO => make_span!(Level::INFO),
            Level::DEBUG => make_span!(Level::DEBUG),
            Level::TRACE => make_span!(Level::TRACE),
        }
    }
}
