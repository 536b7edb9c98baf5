//! [`ProfileService`] — registration, login, profile reads and merge
//! updates, and the current-user broadcast.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use tutorlink_core::{
  document::{DocumentStore, FieldFilter, Fields, MergePolicy, USERS_COLLECTION},
  identity::IdentityProvider,
  profile::{Profile, Role, TutorProfile},
};

use crate::error::Error;

// ─── Navigation intent ───────────────────────────────────────────────────────

/// Where the application should land after an auth transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
  /// The anonymous landing state.
  #[default]
  Landing,
  ClientDashboard,
  TutorDashboard,
}

impl Route {
  fn for_role(role: Role) -> Self {
    match role {
      Role::Client => Self::ClientDashboard,
      Role::Tutor => Self::TutorDashboard,
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The profile access layer.
///
/// Holds the single-slot current-user broadcast: the latest known profile
/// or none, updated by every successful login/logout/update and by the
/// provider's own session-change notifications (see
/// [`Self::run_session_listener`]). The service is the only writer;
/// subscribers read snapshots.
pub struct ProfileService<P, D> {
  provider: Arc<P>,
  store:    Arc<D>,
  current:  watch::Sender<Option<Profile>>,
  route:    watch::Sender<Route>,
}

impl<P, D> ProfileService<P, D>
where
  P: IdentityProvider,
  D: DocumentStore,
{
  pub fn new(provider: Arc<P>, store: Arc<D>) -> Self {
    let (current, _) = watch::channel(None);
    let (route, _) = watch::channel(Route::default());
    Self { provider, store, current, route }
  }

  // ── Registration ──────────────────────────────────────────────────────

  /// Create an identity and its profile record.
  ///
  /// Identity creation and the profile write are two sequential external
  /// calls. If the second fails, the fresh identity is deleted again
  /// (compensation) so no orphaned identity is left behind.
  pub async fn register(
    &self,
    email: &str,
    password: &str,
    role: Role,
    extras: Fields,
  ) -> Result<(), Error> {
    let uid = self.provider.create_identity(email, password).await?;

    let display_name = display_name_from(&extras);
    if let Some(name) = &display_name {
      if let Err(error) = self.provider.set_display_name(uid, name).await {
        self.compensate_registration(uid).await;
        return Err(error.into());
      }
    }

    let mut fields = sanitize_patch(extras);
    fields.insert("uid".into(), serde_json::json!(uid));
    fields.insert("email".into(), serde_json::json!(email));
    if let Some(name) = &display_name {
      fields.insert("displayName".into(), serde_json::json!(name));
    }
    fields.insert("role".into(), serde_json::json!(role.as_str()));
    fields.insert("createdAt".into(), serde_json::json!(Utc::now()));

    if let Err(error) = self
      .store
      .write_document(USERS_COLLECTION, uid, fields.clone(), MergePolicy::Merge)
      .await
    {
      self.compensate_registration(uid).await;
      return Err(Error::Write(Box::new(error)));
    }

    tracing::info!(%uid, %role, "registered new account");

    match Profile::from_fields(fields) {
      Ok(profile) => {
        self.current.send_replace(Some(profile));
      }
      // The record was written; only the cache update is skipped.
      Err(error) => {
        tracing::warn!(%uid, %error, "registered profile does not decode");
      }
    }
    Ok(())
  }

  async fn compensate_registration(&self, uid: Uuid) {
    if let Err(error) = self.provider.delete_identity(uid).await {
      tracing::error!(
        %uid,
        %error,
        "compensating identity delete failed; orphaned identity remains"
      );
    }
  }

  // ── Session ───────────────────────────────────────────────────────────

  /// Verify credentials and load the profile record.
  ///
  /// An authenticated identity with no profile record fails with
  /// [`Error::ProfileNotFound`]; the current-user slot is left unchanged
  /// on any failure.
  pub async fn login(&self, email: &str, password: &str) -> Result<Route, Error> {
    let uid = self.provider.verify_identity(email, password).await?;

    let fields = self
      .store
      .read_document(USERS_COLLECTION, uid)
      .await
      .map_err(|e| Error::Read(Box::new(e)))?
      .ok_or(Error::ProfileNotFound(uid))?;

    let profile =
      Profile::from_fields(fields).map_err(|source| Error::Decode { uid, source })?;

    let route = Route::for_role(profile.role());
    tracing::info!(%uid, role = %profile.role(), "signed in");

    self.current.send_replace(Some(profile));
    self.route.send_replace(route);
    Ok(route)
  }

  /// Tear down the session and return to the anonymous landing state.
  pub async fn logout(&self) -> Result<(), Error> {
    self.provider.invalidate_session().await?;
    self.current.send_replace(None);
    self.route.send_replace(Route::Landing);
    tracing::info!("signed out");
    Ok(())
  }

  // ── Profile reads and writes ──────────────────────────────────────────

  /// Single-key read. An absent record is `Ok(None)`, never an error.
  pub async fn get_profile(&self, uid: Uuid) -> Result<Option<Profile>, Error> {
    let fields = self
      .store
      .read_document(USERS_COLLECTION, uid)
      .await
      .map_err(|e| Error::Read(Box::new(e)))?;

    fields
      .map(|f| Profile::from_fields(f).map_err(|source| Error::Decode { uid, source }))
      .transpose()
  }

  /// Merge-write `patch` onto the profile record, then re-read and
  /// republish the result when `uid` is the signed-in user.
  ///
  /// `role` and `uid` keys are stripped from the patch: the role chosen
  /// at registration is immutable, and the key is the record identity.
  /// The read-after-write is not transactional; a concurrent updater can
  /// interleave.
  pub async fn update_profile(&self, uid: Uuid, patch: Fields) -> Result<(), Error> {
    let patch = sanitize_patch(patch);

    self
      .store
      .write_document(USERS_COLLECTION, uid, patch, MergePolicy::Merge)
      .await
      .map_err(|e| Error::Write(Box::new(e)))?;

    if let Some(profile) = self.get_profile(uid).await? {
      let is_current = self.current.borrow().as_ref().map(Profile::uid) == Some(uid);
      if is_current {
        self.current.send_replace(Some(profile));
      }
    }
    Ok(())
  }

  /// Every profile with role `tutor`, unordered. No pagination.
  pub async fn list_tutors(&self) -> Result<Vec<TutorProfile>, Error> {
    let filter = FieldFilter::equals("role", Role::Tutor.as_str());
    let docs = self
      .store
      .query_documents(USERS_COLLECTION, &filter)
      .await
      .map_err(|e| Error::Read(Box::new(e)))?;

    let mut tutors = Vec::with_capacity(docs.len());
    for fields in docs {
      match Profile::from_fields(fields) {
        Ok(Profile::Tutor(tutor)) => tutors.push(tutor),
        // The role filter already ran; a non-tutor here is store skew.
        Ok(other) => {
          tracing::warn!(uid = %other.uid(), "non-tutor record in tutor query result");
        }
        Err(error) => {
          tracing::warn!(%error, "skipping undecodable record in tutor query result");
        }
      }
    }
    Ok(tutors)
  }

  // ── Current-user slot ─────────────────────────────────────────────────

  /// Snapshot of the current-user slot.
  pub fn current_user(&self) -> Option<Profile> {
    self.current.borrow().clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self.current.borrow().is_some()
  }

  /// Subscribe to the current-user broadcast. The latest value is
  /// observable immediately; every subsequent change is delivered.
  pub fn subscribe(&self) -> watch::Receiver<Option<Profile>> {
    self.current.subscribe()
  }

  /// Subscribe to navigation intents signalled by login/logout.
  pub fn routes(&self) -> watch::Receiver<Route> {
    self.route.subscribe()
  }

  // ── Provider session listener ─────────────────────────────────────────

  /// Mirror the provider's own session-change stream into the
  /// current-user slot: re-read the profile on sign-in, clear on
  /// sign-out. Runs until the provider drops its stream; callers decide
  /// whether to spawn it.
  pub async fn run_session_listener(&self) {
    let mut sessions = self.provider.session_changes();
    loop {
      if sessions.changed().await.is_err() {
        break;
      }
      let uid = *sessions.borrow_and_update();
      match uid {
        None => {
          self.current.send_replace(None);
        }
        Some(uid) => match self.get_profile(uid).await {
          Ok(Some(profile)) => {
            self.current.send_replace(Some(profile));
          }
          Ok(None) => {
            tracing::warn!(%uid, "signed-in identity has no profile record");
            self.current.send_replace(None);
          }
          Err(error) => {
            tracing::warn!(%uid, %error, "profile refresh after session change failed");
          }
        },
      }
    }
  }
}

// ─── Patch helpers ───────────────────────────────────────────────────────────

/// Keys no update path may change.
const IMMUTABLE_KEYS: [&str; 2] = ["role", "uid"];

fn sanitize_patch(mut patch: Fields) -> Fields {
  for key in IMMUTABLE_KEYS {
    if patch.remove(key).is_some() {
      tracing::warn!(key, "stripped immutable key from profile patch");
    }
  }
  patch
}

/// `firstName` + `lastName` from registration extras, if both are set.
fn display_name_from(extras: &Fields) -> Option<String> {
  let first = extras.get("firstName")?.as_str()?;
  let last = extras.get("lastName")?.as_str()?;
  Some(format!("{first} {last}"))
}
