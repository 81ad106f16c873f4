use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::Html};
use tera::{Context, Tera};
use tracing::error;

use todo_types::api::TodoView;

use crate::state::{AppState, with_db};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Server-rendered pages. Templates are compiled into the binary.
pub struct Pages {
    tera: Tera,
}

impl Pages {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render_index(&self, todos: &[TodoView]) -> anyhow::Result<String> {
        let remaining = todos.iter().filter(|t| !t.completed).count();

        let mut context = Context::new();
        context.insert("todos", todos);
        context.insert("remaining", &remaining);
        context.insert("total", &todos.len());
        Ok(self.tera.render("index.html", &context)?)
    }
}

/// GET / — every todo, with its category name resolved by id.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let (todos, categories) = with_db(&state, |db| Ok((db.list_todos()?, db.list_categories()?)))
        .await
        .map_err(|e| {
            error!("Failed to load todos: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let names: HashMap<i64, String> = categories.into_iter().map(|c| (c.id, c.name)).collect();
    let views: Vec<TodoView> = todos
        .into_iter()
        .map(|todo| {
            let category_name = todo.category_id.and_then(|id| names.get(&id).cloned());
            TodoView::new(todo, category_name)
        })
        .collect();

    let html = state.pages.render_index(&views).map_err(|e| {
        error!("Failed to render index: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Html(html))
}
