use std::sync::Arc;

use chrono::FixedOffset;
use todo_db::Database;
use todo_media::MediaStore;

use crate::pages::Pages;

pub type AppState = Arc<AppContext>;

/// Everything a handler needs, constructed once at startup and injected
/// through axum `State`.
pub struct AppContext {
    pub db: Database,
    pub media: MediaStore,
    pub pages: Pages,
    /// Offset applied to record creation timestamps.
    pub utc_offset: FixedOffset,
}

impl AppContext {
    pub fn new(db: Database, media: MediaStore, utc_offset: FixedOffset) -> anyhow::Result<AppState> {
        Ok(Arc::new(Self {
            db,
            media,
            pages: Pages::new()?,
            utc_offset,
        }))
    }
}

/// Run a blocking database call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> anyhow::Result<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
}
