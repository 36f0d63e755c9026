use std::sync::Arc;
use std::time::Duration;

use askdb::api::GeminiApi;
use askdb::config::Config;
use askdb::db::PgGateway;
use askdb::router::{AssistantState, assistant_router};
use askdb::service::{Authenticator, Orchestrator, SqlTranslator, sessions_actor};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.postgres.redacted_url(),
        model = %cfg.llm.model,
        proxy = %cfg.llm.proxy.as_deref().unwrap_or("<none>"),
        loglevel = %cfg.basic.loglevel,
        secure_cookie = !cfg.basic.insecure_cookie
    );

    // Long-lived handles, created once and shared by every session.
    let client = GeminiApi::build_client(&cfg.llm)?;
    let model = GeminiApi::new(client, &cfg.llm)?;
    let gateway = PgGateway::new(cfg.postgres.clone());
    let orchestrator = Orchestrator::new(
        Authenticator::new(cfg.basic.hashed_password.clone()),
        SqlTranslator::new(Arc::new(model)),
        Arc::new(gateway),
    );

    let sessions = sessions_actor::spawn(Duration::from_secs(cfg.basic.session_idle_secs)).await?;
    let state = AssistantState::new(
        orchestrator,
        sessions,
        cfg.basic.cookie_key()?,
        !cfg.basic.insecure_cookie,
    );
    let app = assistant_router(state, cfg.basic.body_limit);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
