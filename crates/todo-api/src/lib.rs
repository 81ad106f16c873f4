pub mod error;
pub mod form;
pub mod pages;
pub mod state;
pub mod todos;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppContext, AppState};

/// Request bodies above this size are rejected with 413 before any handler
/// sees them.
pub const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.media.dir());

    Router::new()
        .route("/", get(pages::index))
        .route("/add", post(todos::add_todo))
        .route("/complete/{id}", post(todos::toggle_complete))
        .route("/delete/{id}", post(todos::delete_todo))
        .nest_service("/static/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_CONTENT_LENGTH))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
