use std::{sync::Arc, time::Duration};

use moviehub::{AppState, config::Config, db, proxy, router, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,moviehub=debug,sqlx=warn".to_string()),
        )
        .init();

    let mut config = Config::from_env()?;
    if config.jwt_secret.trim().is_empty() {
        tracing::warn!("JWT_SECRET is not set; using a random secret, sessions end on restart");
        config.jwt_secret = uuid::Uuid::new_v4().to_string();
    }
    let config = Arc::new(config);

    let db = db::connect_and_migrate(&config.database_url, config.db_max_connections).await?;

    if config.seed_demo_data {
        seed::seed_demo_data(&db, config.bcrypt_cost).await?;
    }

    let http = proxy::build_client(Duration::from_secs(config.http_connect_timeout_secs))?;

    let state = Arc::new(AppState::new(config.clone(), db, http));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
