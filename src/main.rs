use std::time::Duration;

use lawbook::config::AppConfig;
use lawbook::state::AppState;
use lawbook::{app, db, sessions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "lawbook=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let db = db::connect(&config).await?;
    db::migrate(&db).await?;

    let cleanup_every = Duration::from_secs(config.session.cleanup_interval_secs);
    let state = AppState::from_pool(db, config.clone());
    let cleanup = sessions::cleanup::spawn_cleanup(state.sessions.clone(), cleanup_every);

    let app = app::build_app(state)?;
    let served = app::serve(app, &config).await;
    cleanup.abort();
    served
}
