mod config;

use std::net::SocketAddr;

use tracing::info;

use todo_api::AppContext;
use todo_db::Database;
use todo_media::MediaStore;

use crate::config::{Config, DatabaseTarget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=info,todo_api=info,todo_db=info,todo_media=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Schema is created on open if absent
    let db = match &config.database {
        DatabaseTarget::File(path) => Database::open(path)?,
        DatabaseTarget::Memory => {
            info!("Using in-memory database; todos will not survive a restart");
            Database::open_in_memory()?
        }
    };
    let media = MediaStore::new(config.upload_folder.clone()).await?;
    let state = AppContext::new(db, media, config.utc_offset)?;

    let app = todo_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("To-do server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            ctrl_c.await.ok();
            info!("Received Ctrl+C, shutting down...");
            return;
        };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
