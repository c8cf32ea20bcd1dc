//! todo-api バイナリのエントリポイント
//! 設定を環境変数から読み込み、HTTP サーバを起動します。

use anyhow::Context;
use shared::{init_tracing, Config};
use todo_api::{app, store::TodoRepository, templates::Templates, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format).map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))?;

    let repo = TodoRepository::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    let templates = Templates::new().context("failed to register templates")?;
    let state = AppState::new(repo, templates);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, environment = %config.environment, "server starting");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
