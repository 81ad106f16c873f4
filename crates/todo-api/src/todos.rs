use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{debug, info, warn};

use todo_media::{MediaError, MediaStore};
use todo_types::api::Envelope;
use todo_types::clock::local_now;
use todo_types::models::NewTodo;

use crate::error::ApiError;
use crate::form::{AddTodoForm, UploadedFile};
use crate::state::{AppState, with_db};

const TASK_NOT_FOUND: &str = "Task not found";
const CATEGORY_NOT_FOUND: &str = "Category not found";

/// POST /add — create a todo, optionally with a pasted or uploaded image.
///
/// Image problems never fail the request: the todo is created without one.
pub async fn add_todo(
    State(state): State<AppState>,
    form: AddTodoForm,
) -> Result<Json<Envelope>, ApiError> {
    const CONTEXT: &str = "Failed to add task";

    let content = form
        .content
        .ok_or_else(|| ApiError::internal(CONTEXT)("missing form field `content`"))?;

    let category_id = match form.category_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let id: i64 = raw.parse().map_err(|_| ApiError::NotFound(CATEGORY_NOT_FOUND))?;
            with_db(&state, move |db| db.get_category(id))
                .await
                .map_err(ApiError::internal(CONTEXT))?
                .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))?;
            Some(id)
        }
    };

    let image_path = attach_image(&state.media, form.pasted_image, form.image).await;

    let new = NewTodo {
        content,
        created_at: local_now(state.utc_offset),
        image_path: image_path.clone(),
        category_id,
    };

    match with_db(&state, move |db| db.insert_todo(&new)).await {
        Ok(todo) => {
            info!("Added todo {} (image: {:?})", todo.id, todo.image_path);
            Ok(Json(Envelope::ok("Task added")))
        }
        Err(e) => {
            // The row never landed, so the stored image would be orphaned.
            if let Some(path) = image_path {
                discard_image(&state.media, &path).await;
            }
            Err(ApiError::internal(CONTEXT)(e))
        }
    }
}

/// POST /complete/{id} — flip the completed flag. Each call flips again.
pub async fn toggle_complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let id = parse_id(&id)?;

    let todo = with_db(&state, move |db| db.toggle_todo(id))
        .await
        .map_err(ApiError::internal("Failed to update task status"))?
        .ok_or(ApiError::NotFound(TASK_NOT_FOUND))?;

    info!("Todo {} completed={}", todo.id, todo.completed);
    Ok(Json(Envelope::ok("Task status updated")))
}

/// POST /delete/{id} — delete the todo, then its image file (best-effort).
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let id = parse_id(&id)?;

    let todo = with_db(&state, move |db| db.delete_todo(id))
        .await
        .map_err(ApiError::internal("Failed to delete task"))?
        .ok_or(ApiError::NotFound(TASK_NOT_FOUND))?;

    if let Some(path) = &todo.image_path {
        discard_image(&state.media, path).await;
    }

    info!("Deleted todo {}", todo.id);
    Ok(Json(Envelope::ok("Task deleted")))
}

/// Ids that are not integers cannot name a todo.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(TASK_NOT_FOUND))
}

/// A pasted image takes precedence; the uploaded file is only looked at when
/// no paste was supplied, even if the paste turns out to be undecodable.
async fn attach_image(
    media: &MediaStore,
    pasted: Option<String>,
    upload: Option<UploadedFile>,
) -> Option<String> {
    if let Some(data) = pasted.filter(|d| !d.is_empty()) {
        return match media.save_pasted(&data).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Could not store pasted image: {}", e);
                None
            }
        };
    }

    let file = upload.filter(|f| !f.filename.is_empty())?;
    match media.save_upload(&file.filename, &file.bytes).await {
        Ok(path) => Some(path),
        Err(MediaError::Disallowed(name)) => {
            debug!("Ignoring upload with disallowed type: {}", name);
            None
        }
        Err(e) => {
            warn!("Could not store uploaded image {}: {}", file.filename, e);
            None
        }
    }
}

async fn discard_image(media: &MediaStore, path: &str) {
    if let Err(e) = media.remove(path).await {
        warn!("Could not remove image {}: {}", path, e);
    }
}
