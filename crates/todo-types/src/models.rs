use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// A single task. `image_path` is relative to the static root, e.g.
/// `uploads/pasted_20240101120000.png`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub content: String,
    pub completed: bool,
    pub created_at: DateTime<FixedOffset>,
    pub image_path: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
    pub image_path: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}
