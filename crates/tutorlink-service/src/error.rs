//! Error type for the profile access layer.

use thiserror::Error;
use uuid::Uuid;

use tutorlink_core::AuthError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error surfaced by [`crate::ProfileService`].
///
/// Authentication failures keep their closed [`AuthError`] shape so the
/// fixed user-facing messages survive the trip; store failures are boxed
/// and surfaced as generic read/write failures. Nothing here is retried.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Auth(#[from] AuthError),

  /// An authenticated identity with no profile record is invalid
  /// application state; login fails rather than tolerating it.
  #[error("no profile record for authenticated user {0}")]
  ProfileNotFound(Uuid),

  #[error("profile read failed: {0}")]
  Read(#[source] BoxError),

  #[error("profile write failed: {0}")]
  Write(#[source] BoxError),

  #[error("stored profile for {uid} does not decode: {source}")]
  Decode {
    uid:    Uuid,
    source: serde_json::Error,
  },
}

impl Error {
  /// The fixed message shown to the user for this failure.
  pub fn user_message(&self) -> &'static str {
    match self {
      Self::Auth(e) => e.user_message(),
      Self::ProfileNotFound(_) => "User profile not found.",
      Self::Read(_) | Self::Write(_) | Self::Decode { .. } => {
        "Something went wrong. Please try again."
      }
    }
  }
}
