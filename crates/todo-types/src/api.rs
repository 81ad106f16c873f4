use serde::{Deserialize, Serialize};

use crate::models::Todo;

// -- Envelope --

/// JSON body returned by every mutation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
}

impl Envelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// -- Page --

/// One row of the list page: the todo plus its category name, resolved by
/// foreign-key lookup.
#[derive(Debug, Clone, Serialize)]
pub struct TodoView {
    pub id: i64,
    pub content: String,
    pub completed: bool,
    pub created_at: String,
    /// File name inside the upload directory, if the todo has an image.
    pub image_file: Option<String>,
    pub category_name: Option<String>,
}

impl TodoView {
    pub fn new(todo: Todo, category_name: Option<String>) -> Self {
        Self {
            id: todo.id,
            content: todo.content,
            completed: todo.completed,
            created_at: todo.created_at.format("%Y-%m-%d %H:%M").to_string(),
            image_file: todo
                .image_path
                .as_deref()
                .and_then(|p| p.rsplit('/').next())
                .map(str::to_owned),
            category_name,
        }
    }
}
