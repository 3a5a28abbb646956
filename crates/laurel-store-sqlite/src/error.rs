//! Error type for `laurel-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] laurel_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column value did not decode to its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
