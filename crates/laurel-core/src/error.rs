//! Error types for `laurel-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::event::EventStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event {0} is not closed (status: {1})")]
  EventNotClosed(Uuid, EventStatus),

  #[error("event {0} is already finalized")]
  AlreadyFinalized(Uuid),

  #[error("event {0} has no submissions")]
  NoSubmissions(Uuid),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
