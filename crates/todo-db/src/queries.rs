use crate::Database;
use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use todo_types::models::{Category, NewCategory, NewTodo, Todo};

const TODO_COLUMNS: &str = "id, content, completed, created_at, image_path, category_id";
const CATEGORY_COLUMNS: &str = "id, name, description, created_at";

impl Database {
    // -- Todos --

    pub fn insert_todo(&self, new: &NewTodo) -> Result<Todo> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO todos (content, completed, created_at, image_path, category_id)
                 VALUES (?1, 0, ?2, ?3, ?4)",
                rusqlite::params![
                    &new.content,
                    new.created_at.to_rfc3339(),
                    &new.image_path,
                    new.category_id,
                ],
            )?;
            let id = tx.last_insert_rowid();
            query_todo(tx, id)?.ok_or_else(|| anyhow::anyhow!("Inserted todo {} vanished", id))
        })
    }

    /// All todos in insertion order. No filtering or pagination.
    pub fn list_todos(&self) -> Result<Vec<Todo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY id"))?;
            let rows = stmt
                .query_map([], todo_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_todo(&self, id: i64) -> Result<Option<Todo>> {
        self.with_conn(|conn| query_todo(conn, id))
    }

    pub fn count_todos(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM todos", [], |r| r.get(0))?))
    }

    /// Flip `completed` and return the updated row, or `None` if no such todo.
    pub fn toggle_todo(&self, id: i64) -> Result<Option<Todo>> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE todos SET completed = NOT completed WHERE id = ?1",
                [id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_todo(tx, id)
        })
    }

    /// Delete a todo, returning the removed row so the caller can clean up
    /// its image.
    pub fn delete_todo(&self, id: i64) -> Result<Option<Todo>> {
        self.with_tx(|tx| {
            let Some(todo) = query_todo(tx, id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM todos WHERE id = ?1", [id])?;
            Ok(Some(todo))
        })
    }

    // -- Categories --

    pub fn insert_category(&self, new: &NewCategory) -> Result<Category> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO categories (name, description, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![&new.name, &new.description, new.created_at.to_rfc3339()],
            )?;
            let id = tx.last_insert_rowid();
            query_category(tx, id)?
                .ok_or_else(|| anyhow::anyhow!("Inserted category {} vanished", id))
        })
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id"))?;
            let rows = stmt
                .query_map([], category_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        self.with_conn(|conn| query_category(conn, id))
    }

    /// Remove a category. Todos that referenced it keep existing with their
    /// `category_id` cleared (`ON DELETE SET NULL`).
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let changed = tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_todo(conn: &Connection, id: i64) -> Result<Option<Todo>> {
    let row = conn
        .query_row(
            &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
            [id],
            todo_from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    let row = conn
        .query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
            [id],
            category_from_row,
        )
        .optional()?;
    Ok(row)
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        content: row.get(1)?,
        completed: row.get(2)?,
        created_at: timestamp(row, 3)?,
        image_path: row.get(4)?,
        category_id: row.get(5)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: timestamp(row, 3)?,
    })
}

/// Timestamps are stored as RFC 3339 text so the original offset survives.
fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<FixedOffset>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
