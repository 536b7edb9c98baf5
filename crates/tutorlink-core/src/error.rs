//! Error types for `tutorlink-core`.

use thiserror::Error;
use uuid::Uuid;

/// Minimum accepted password length, matching the signup forms.
pub const MIN_PASSWORD_LEN: usize = 6;

/// The closed set of failures an identity provider can report.
///
/// These are surfaced directly to the user as a small fixed set of
/// messages (see [`AuthError::user_message`]) and are never retried.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("email already in use: {0}")]
  EmailAlreadyInUse(String),

  #[error("malformed email address: {0:?}")]
  InvalidEmail(String),

  #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
  WeakPassword,

  #[error("account is disabled")]
  AccountDisabled,

  #[error("too many failed sign-in attempts")]
  RateLimited,

  #[error("identity not found: {0}")]
  IdentityNotFound(Uuid),

  /// Transport or internal failure inside the provider itself.
  #[error("identity provider error: {0}")]
  Provider(String),
}

impl AuthError {
  /// The fixed user-facing message for this failure.
  pub fn user_message(&self) -> &'static str {
    match self {
      Self::InvalidCredentials => "Invalid email or password.",
      Self::EmailAlreadyInUse(_) => "An account with this email already exists.",
      Self::InvalidEmail(_) => "Please enter a valid email address.",
      Self::WeakPassword => "Password must be at least 6 characters.",
      Self::AccountDisabled => "This account has been disabled.",
      Self::RateLimited => "Too many attempts. Please try again later.",
      Self::IdentityNotFound(_) | Self::Provider(_) => {
        "Something went wrong. Please try again."
      }
    }
  }
}
