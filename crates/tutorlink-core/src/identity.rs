//! The `IdentityProvider` trait — the authentication boundary.
//!
//! The provider owns credentials and the notion of "currently signed-in
//! identity". The profile document lives elsewhere (see
//! [`crate::document::DocumentStore`]); the access layer stitches the two
//! together.

use std::future::Future;

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::AuthError;

/// The provider's session-change notification stream.
///
/// Carries the uid of the currently signed-in identity, or `None` when
/// signed out. Subscribers see the latest value immediately and every
/// subsequent change.
pub type SessionChanges = watch::Receiver<Option<Uuid>>;

/// Abstraction over the external identity provider.
///
/// All failures are expressed through the closed [`AuthError`] set, so
/// the access layer can map them to fixed user-facing messages without
/// knowing which backend produced them.
pub trait IdentityProvider: Send + Sync {
  /// Create a new identity for `email`. Fails with
  /// [`AuthError::EmailAlreadyInUse`] on a duplicate email and with
  /// [`AuthError::InvalidEmail`] / [`AuthError::WeakPassword`] on
  /// malformed input.
  fn create_identity<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Uuid, AuthError>> + Send + 'a;

  /// Verify `email`/`password` and establish the provider-side session.
  /// Returns the identity uid on success.
  fn verify_identity<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Uuid, AuthError>> + Send + 'a;

  /// Set the provider-level display name for `uid`.
  fn set_display_name<'a>(
    &'a self,
    uid: Uuid,
    name: &'a str,
  ) -> impl Future<Output = Result<(), AuthError>> + Send + 'a;

  /// Tear down the current session, if any.
  fn invalidate_session(
    &self,
  ) -> impl Future<Output = Result<(), AuthError>> + Send + '_;

  /// Remove an identity entirely.
  ///
  /// Only the registration compensation path calls this: when the profile
  /// write that follows identity creation fails, the fresh identity is
  /// deleted rather than left orphaned.
  fn delete_identity(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<(), AuthError>> + Send + '_;

  /// Subscribe to the provider's own session-change notifications.
  fn session_changes(&self) -> SessionChanges;
}
