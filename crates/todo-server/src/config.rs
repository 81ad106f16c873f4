use std::path::PathBuf;

use chrono::FixedOffset;
use thiserror::Error;
use todo_types::clock::{default_offset, parse_offset};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:///todos.db";
pub const DEFAULT_UPLOAD_FOLDER: &str = "static/uploads";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5002;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unsupported database URL {url:?}: only sqlite is available")]
    UnsupportedDatabase { url: String },
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseTarget,
    pub upload_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub utc_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset and empty values fall back
    /// to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let database = parse_database_url(&normalize_database_url(&url))?;

        let upload_folder = get("UPLOAD_FOLDER")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_FOLDER));

        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.into());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                field: "PORT",
                reason: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let utc_offset = match get("TODO_UTC_OFFSET") {
            Some(raw) => parse_offset(&raw).ok_or_else(|| ConfigError::InvalidValue {
                field: "TODO_UTC_OFFSET",
                reason: format!("{raw:?} is not of the form +HH:MM"),
            })?,
            None => default_offset(),
        };

        Ok(Self {
            database,
            upload_folder,
            host,
            port,
            utc_offset,
        })
    }
}

/// Hosting platforms hand out `postgres://` URLs; the canonical scheme is
/// `postgresql://`. Only the leading scheme is rewritten.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{rest}"),
        None => url.to_string(),
    }
}

/// Map a SQLAlchemy-style URL onto a SQLite target.
///
/// `sqlite:///todos.db` is relative, `sqlite:////var/db/todos.db` absolute,
/// `sqlite://` and `sqlite:///:memory:` in memory. A value with no scheme is
/// taken as a file path.
pub fn parse_database_url(url: &str) -> Result<DatabaseTarget, ConfigError> {
    let Some((scheme, rest)) = url.split_once("://") else {
        return Ok(DatabaseTarget::File(PathBuf::from(url)));
    };

    if scheme != "sqlite" {
        return Err(ConfigError::UnsupportedDatabase {
            url: redact(url),
        });
    }

    let path = rest.strip_prefix('/').unwrap_or(rest);
    match path {
        "" | ":memory:" => Ok(DatabaseTarget::Memory),
        _ => Ok(DatabaseTarget::File(PathBuf::from(path))),
    }
}

/// Hide credentials before a URL reaches logs or error messages.
fn redact(url: &str) -> String {
    match (url.split_once("://"), url.rsplit_once('@')) {
        (Some((scheme, _)), Some((_, host))) => format!("{scheme}://***@{host}"),
        _ => url.to_string(),
    }
}
