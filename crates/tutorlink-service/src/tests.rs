//! Behavioural tests for [`ProfileService`] against the in-memory SQLite
//! backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use tutorlink_core::{
  document::{DocumentStore, FieldFilter, Fields, MergePolicy},
  error::AuthError,
  identity::IdentityProvider,
  profile::{Profile, Role},
};
use tutorlink_store_sqlite::SqliteBackend;

use crate::{Error, ProfileService, Route};

type Service = ProfileService<SqliteBackend, SqliteBackend>;

async fn service() -> (Service, SqliteBackend) {
  let backend = SqliteBackend::open_in_memory().await.expect("backend");
  let svc =
    ProfileService::new(Arc::new(backend.clone()), Arc::new(backend.clone()));
  (svc, backend)
}

fn fields(value: serde_json::Value) -> Fields {
  value.as_object().expect("object literal").clone()
}

async fn register_tutor(svc: &Service, email: &str) {
  svc
    .register(
      email,
      "secret1",
      Role::Tutor,
      fields(json!({
        "firstName": "A",
        "lastName": "B",
        "subjects": ["Math"],
        "hourlyRate": 50.0,
      })),
    )
    .await
    .unwrap();
}

async fn register_client(svc: &Service, email: &str) {
  svc
    .register(
      email,
      "secret1",
      Role::Client,
      fields(json!({
        "firstName": "C",
        "lastName": "D",
        "gradeLevel": "Grade 11",
      })),
    )
    .await
    .unwrap();
}

// ─── Registration and login ──────────────────────────────────────────────────

#[tokio::test]
async fn register_then_login_keeps_role_and_uid() {
  let (svc, _) = service().await;
  register_tutor(&svc, "a@x.com").await;

  let registered_uid = svc.current_user().unwrap().uid();
  svc.logout().await.unwrap();

  let route = svc.login("a@x.com", "secret1").await.unwrap();
  assert_eq!(route, Route::TutorDashboard);

  let user = svc.current_user().unwrap();
  assert_eq!(user.role(), Role::Tutor);
  assert_eq!(user.uid(), registered_uid);
}

#[tokio::test]
async fn registered_extras_survive_login() {
  let (svc, _) = service().await;
  register_tutor(&svc, "a@x.com").await;
  svc.logout().await.unwrap();
  svc.login("a@x.com", "secret1").await.unwrap();

  let Profile::Tutor(tutor) = svc.current_user().unwrap() else {
    panic!("expected a tutor profile");
  };
  assert_eq!(tutor.identity.email, "a@x.com");
  assert_eq!(tutor.identity.display_name.as_deref(), Some("A B"));
  assert_eq!(tutor.details.personal.first_name.as_deref(), Some("A"));
  assert_eq!(tutor.details.subjects, ["Math"]);
  assert_eq!(tutor.details.hourly_rate, Some(50.0));
}

#[tokio::test]
async fn login_routes_clients_to_their_dashboard() {
  let (svc, _) = service().await;
  register_client(&svc, "c@x.com").await;
  svc.logout().await.unwrap();

  let route = svc.login("c@x.com", "secret1").await.unwrap();
  assert_eq!(route, Route::ClientDashboard);
  assert_eq!(*svc.routes().borrow(), Route::ClientDashboard);
}

#[tokio::test]
async fn login_wrong_password_leaves_cache_unchanged() {
  let (svc, _) = service().await;
  register_tutor(&svc, "a@x.com").await;
  svc.logout().await.unwrap();
  svc.login("a@x.com", "secret1").await.unwrap();
  let before = svc.current_user();

  let err = svc.login("a@x.com", "wrong-1").await.unwrap_err();
  assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
  assert_eq!(svc.current_user(), before);
}

#[tokio::test]
async fn login_without_profile_record_fails() {
  let (svc, backend) = service().await;

  // Identity exists but no profile document was ever written.
  backend.create_identity("a@x.com", "secret1").await.unwrap();

  let err = svc.login("a@x.com", "secret1").await.unwrap_err();
  assert!(matches!(err, Error::ProfileNotFound(_)));
  assert!(!svc.is_authenticated());
}

#[tokio::test]
async fn logout_clears_session_state() {
  let (svc, _) = service().await;
  register_client(&svc, "c@x.com").await;
  svc.logout().await.unwrap();

  assert!(!svc.is_authenticated());
  assert!(svc.current_user().is_none());
  assert_eq!(*svc.routes().borrow(), Route::Landing);
}

// ─── Registration compensation ───────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("write refused")]
struct WriteRefused;

/// A store whose writes always fail — drives the compensation path.
#[derive(Clone)]
struct FailingStore;

impl DocumentStore for FailingStore {
  type Error = WriteRefused;

  async fn write_document(
    &self,
    _: &str,
    _: Uuid,
    _: Fields,
    _: MergePolicy,
  ) -> Result<(), WriteRefused> {
    Err(WriteRefused)
  }

  async fn read_document(
    &self,
    _: &str,
    _: Uuid,
  ) -> Result<Option<Fields>, WriteRefused> {
    Ok(None)
  }

  async fn query_documents(
    &self,
    _: &str,
    _: &FieldFilter,
  ) -> Result<Vec<Fields>, WriteRefused> {
    Ok(Vec::new())
  }
}

#[tokio::test]
async fn failed_profile_write_deletes_the_fresh_identity() {
  let backend = SqliteBackend::open_in_memory().await.unwrap();
  let svc = ProfileService::new(Arc::new(backend.clone()), Arc::new(FailingStore));

  let err = svc
    .register("a@x.com", "secret1", Role::Client, Fields::new())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Write(_)));
  assert!(!svc.is_authenticated());

  // The identity was compensated away, so the email is free again.
  backend.create_identity("a@x.com", "secret1").await.unwrap();
}

// ─── Profile reads and merge updates ─────────────────────────────────────────

#[tokio::test]
async fn get_profile_missing_returns_none() {
  let (svc, _) = service().await;
  let got = svc.get_profile(Uuid::new_v4()).await.unwrap();
  assert!(got.is_none());
}

#[tokio::test]
async fn update_merges_and_keeps_existing_fields() {
  let (svc, _) = service().await;
  register_tutor(&svc, "a@x.com").await;
  let uid = svc.current_user().unwrap().uid();

  svc
    .update_profile(uid, fields(json!({ "bio": "x" })))
    .await
    .unwrap();

  let Some(Profile::Tutor(tutor)) = svc.get_profile(uid).await.unwrap() else {
    panic!("expected a tutor profile");
  };
  assert_eq!(tutor.details.personal.bio.as_deref(), Some("x"));
  assert_eq!(tutor.details.personal.first_name.as_deref(), Some("A"));
  assert_eq!(tutor.details.subjects, ["Math"]);
  assert_eq!(tutor.details.hourly_rate, Some(50.0));
}

#[tokio::test]
async fn update_republishes_to_the_current_user_slot() {
  let (svc, _) = service().await;
  register_client(&svc, "c@x.com").await;
  let uid = svc.current_user().unwrap().uid();

  svc
    .update_profile(uid, fields(json!({ "bio": "new bio" })))
    .await
    .unwrap();

  let Some(Profile::Client(client)) = svc.current_user() else {
    panic!("expected a client profile");
  };
  assert_eq!(client.details.personal.bio.as_deref(), Some("new bio"));
}

#[tokio::test]
async fn update_cannot_change_the_role() {
  let (svc, _) = service().await;
  register_tutor(&svc, "a@x.com").await;
  let uid = svc.current_user().unwrap().uid();

  svc
    .update_profile(uid, fields(json!({ "role": "client", "bio": "x" })))
    .await
    .unwrap();

  let profile = svc.get_profile(uid).await.unwrap().unwrap();
  assert_eq!(profile.role(), Role::Tutor);
}

// ─── Tutor listing ───────────────────────────────────────────────────────────

#[tokio::test]
async fn list_tutors_returns_only_tutor_records() {
  let (svc, _) = service().await;
  register_tutor(&svc, "t1@x.com").await;
  register_tutor(&svc, "t2@x.com").await;
  register_client(&svc, "c@x.com").await;

  let tutors = svc.list_tutors().await.unwrap();
  assert_eq!(tutors.len(), 2);

  let emails: Vec<_> = tutors.iter().map(|t| t.identity.email.as_str()).collect();
  assert!(emails.contains(&"t1@x.com"));
  assert!(emails.contains(&"t2@x.com"));
  assert!(!emails.contains(&"c@x.com"));
}

// ─── Broadcast and session listener ──────────────────────────────────────────

#[tokio::test]
async fn subscribers_see_the_latest_value_immediately() {
  let (svc, _) = service().await;
  register_client(&svc, "c@x.com").await;

  let rx = svc.subscribe();
  assert!(rx.borrow().is_some());
}

#[tokio::test]
async fn provider_sign_out_clears_the_slot() {
  let (svc, backend) = service().await;
  register_tutor(&svc, "a@x.com").await;

  let svc = Arc::new(svc);
  let listener = {
    let svc = Arc::clone(&svc);
    tokio::spawn(async move { svc.run_session_listener().await })
  };

  svc.login("a@x.com", "secret1").await.unwrap();
  assert!(svc.is_authenticated());

  // Sign out at the provider, not through the service.
  backend.invalidate_session().await.unwrap();

  let mut rx = svc.subscribe();
  tokio::time::timeout(Duration::from_secs(2), async {
    while rx.borrow_and_update().is_some() {
      rx.changed().await.unwrap();
    }
  })
  .await
  .expect("slot should clear after provider sign-out");

  assert!(!svc.is_authenticated());
  listener.abort();
}
