//! Error type for `tutorlink-store-sqlite`.
//!
//! Covers the document-store side only; identity-provider methods report
//! through the closed [`tutorlink_core::AuthError`] set instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored `fields` column that is valid JSON but not a JSON object.
  #[error("document {0} in collection {1:?} is not a JSON object")]
  NotAnObject(uuid::Uuid, String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
