//! [`SqliteBackend`] — SQLite implementations of [`IdentityProvider`] and
//! [`DocumentStore`].

use std::{path::Path, sync::Arc};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use tokio::sync::watch;
use uuid::Uuid;

use tutorlink_core::{
  document::{DocumentStore, FieldFilter, Fields, MergePolicy},
  error::{AuthError, MIN_PASSWORD_LEN},
  identity::{IdentityProvider, SessionChanges},
};

use crate::{
  encode::{encode_dt, encode_uuid, parse_dt, parse_uuid},
  schema::SCHEMA,
  Error, Result,
};

/// Consecutive failures after which sign-in is locked out.
const MAX_FAILED_ATTEMPTS: i64 = 5;
/// How long the lockout lasts after the most recent failure.
const LOCKOUT_SECS: i64 = 15 * 60;

// ─── Backend ─────────────────────────────────────────────────────────────────

/// A local tutorlink backend in a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and all
/// clones share one session slot.
#[derive(Clone)]
pub struct SqliteBackend {
  conn:    tokio_rusqlite::Connection,
  session: Arc<watch::Sender<Option<Uuid>>>,
}

impl SqliteBackend {
  /// Open (or create) a backend at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_conn(conn).await
  }

  /// Open an in-memory backend — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_conn(conn).await
  }

  async fn with_conn(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (session, _) = watch::channel(None);
    let backend = Self { conn, session: Arc::new(session) };
    backend.init_schema().await?;
    Ok(backend)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Mark an account disabled (or re-enable it). Administrative hook, not
  /// part of the [`IdentityProvider`] surface.
  pub async fn set_disabled(&self, uid: Uuid, disabled: bool) -> Result<bool> {
    let uid_str = encode_uuid(uid);
    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET disabled = ?2 WHERE uid = ?1",
          rusqlite::params![uid_str, disabled],
        )?)
      })
      .await?;
    Ok(rows > 0)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn provider_err(e: impl std::fmt::Display) -> AuthError {
  AuthError::Provider(e.to_string())
}

/// Minimal shape check: a non-empty local part and domain, no whitespace.
fn validate_email(email: &str) -> Result<(), AuthError> {
  let well_formed = email
    .split_once('@')
    .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
    && !email.contains(char::is_whitespace);
  if well_formed {
    Ok(())
  } else {
    Err(AuthError::InvalidEmail(email.to_owned()))
  }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(provider_err)?
      .to_string(),
  )
}

fn verify_password(password: &str, phc: &str) -> Result<bool, AuthError> {
  let parsed = PasswordHash::new(phc).map_err(provider_err)?;
  Ok(
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok(),
  )
}

/// One row of the `accounts` table, as read for verification.
struct RawAccount {
  uid:             String,
  password_hash:   String,
  disabled:        bool,
  failed_attempts: i64,
  last_failed_at:  Option<String>,
}

// ─── IdentityProvider impl ───────────────────────────────────────────────────

impl IdentityProvider for SqliteBackend {
  async fn create_identity(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Uuid, AuthError> {
    validate_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(AuthError::WeakPassword);
    }

    let uid = Uuid::new_v4();
    let uid_str = encode_uuid(uid);
    let email_owned = email.to_owned();
    let hash = hash_password(password)?;
    let at_str = encode_dt(Utc::now());

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email_owned],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO accounts (uid, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![uid_str, email_owned, hash, at_str],
        )?;
        Ok(true)
      })
      .await
      .map_err(provider_err)?;

    if !inserted {
      return Err(AuthError::EmailAlreadyInUse(email.to_owned()));
    }
    Ok(uid)
  }

  async fn verify_identity(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Uuid, AuthError> {
    let email_owned = email.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, password_hash, disabled, failed_attempts, last_failed_at
               FROM accounts WHERE email = ?1",
              rusqlite::params![email_owned],
              |row| {
                Ok(RawAccount {
                  uid:             row.get(0)?,
                  password_hash:   row.get(1)?,
                  disabled:        row.get(2)?,
                  failed_attempts: row.get(3)?,
                  last_failed_at:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(provider_err)?;

    // An unknown email reports the same failure as a bad password.
    let account = raw.ok_or(AuthError::InvalidCredentials)?;
    if account.disabled {
      return Err(AuthError::AccountDisabled);
    }

    let now = Utc::now();
    let last_failed = account
      .last_failed_at
      .as_deref()
      .map(parse_dt)
      .transpose()
      .map_err(provider_err)?;

    let within_window = last_failed
      .is_some_and(|at| (now - at).num_seconds() < LOCKOUT_SECS);
    if account.failed_attempts >= MAX_FAILED_ATTEMPTS && within_window {
      return Err(AuthError::RateLimited);
    }

    let uid = parse_uuid(&account.uid).map_err(provider_err)?;
    let uid_str = account.uid;

    if !verify_password(password, &account.password_hash)? {
      // A stale failure streak restarts at one.
      let attempts = if within_window { account.failed_attempts + 1 } else { 1 };
      let at_str = encode_dt(now);
      self
        .conn
        .call(move |conn| {
          conn.execute(
            "UPDATE accounts SET failed_attempts = ?2, last_failed_at = ?3
             WHERE uid = ?1",
            rusqlite::params![uid_str, attempts, at_str],
          )?;
          Ok(())
        })
        .await
        .map_err(provider_err)?;
      return Err(AuthError::InvalidCredentials);
    }

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts SET failed_attempts = 0, last_failed_at = NULL
           WHERE uid = ?1",
          rusqlite::params![uid_str],
        )?;
        Ok(())
      })
      .await
      .map_err(provider_err)?;

    self.session.send_replace(Some(uid));
    Ok(uid)
  }

  async fn set_display_name(
    &self,
    uid: Uuid,
    name: &str,
  ) -> Result<(), AuthError> {
    let uid_str = encode_uuid(uid);
    let name_owned = name.to_owned();

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET display_name = ?2 WHERE uid = ?1",
          rusqlite::params![uid_str, name_owned],
        )?)
      })
      .await
      .map_err(provider_err)?;

    if rows == 0 {
      return Err(AuthError::IdentityNotFound(uid));
    }
    Ok(())
  }

  async fn invalidate_session(&self) -> Result<(), AuthError> {
    self.session.send_replace(None);
    Ok(())
  }

  async fn delete_identity(&self, uid: Uuid) -> Result<(), AuthError> {
    let uid_str = encode_uuid(uid);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM accounts WHERE uid = ?1",
          rusqlite::params![uid_str],
        )?)
      })
      .await
      .map_err(provider_err)?;

    if rows == 0 {
      return Err(AuthError::IdentityNotFound(uid));
    }

    // Deleting the signed-in identity ends its session.
    self.session.send_if_modified(|current| {
      if *current == Some(uid) {
        *current = None;
        true
      } else {
        false
      }
    });
    Ok(())
  }

  fn session_changes(&self) -> SessionChanges { self.session.subscribe() }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteBackend {
  type Error = Error;

  async fn write_document(
    &self,
    collection: &str,
    key: Uuid,
    fields: Fields,
    policy: MergePolicy,
  ) -> Result<()> {
    let coll = collection.to_owned();
    let key_str = encode_uuid(key);
    let fields_str = serde_json::Value::Object(fields).to_string();
    let at_str = encode_dt(Utc::now());
    let merge = matches!(policy, MergePolicy::Merge);

    self
      .conn
      .call(move |conn| {
        // json_patch gives RFC 7386 merge semantics: nested objects merge
        // recursively, arrays and scalars replace, explicit null deletes.
        conn.execute(
          "INSERT INTO documents (collection, key, fields, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (collection, key) DO UPDATE SET
             fields = CASE WHEN ?5
               THEN json_patch(documents.fields, excluded.fields)
               ELSE excluded.fields
             END,
             updated_at = excluded.updated_at",
          rusqlite::params![coll, key_str, fields_str, at_str, merge],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn read_document(
    &self,
    collection: &str,
    key: Uuid,
  ) -> Result<Option<Fields>> {
    let coll = collection.to_owned();
    let key_str = encode_uuid(key);

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT fields FROM documents WHERE collection = ?1 AND key = ?2",
              rusqlite::params![coll, key_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|s| decode_fields(&s, key, collection))
      .transpose()
  }

  async fn query_documents(
    &self,
    collection: &str,
    filter: &FieldFilter,
  ) -> Result<Vec<Fields>> {
    let coll = collection.to_owned();

    let raws: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT key, fields FROM documents WHERE collection = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![coll], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // The predicate is evaluated over the decoded JSON; demo-scale scan.
    let mut out = Vec::new();
    for (key_str, fields_str) in raws {
      let key = parse_uuid(&key_str)?;
      let fields = decode_fields(&fields_str, key, collection)?;
      if filter.matches(&fields) {
        out.push(fields);
      }
    }
    Ok(out)
  }
}

fn decode_fields(raw: &str, key: Uuid, collection: &str) -> Result<Fields> {
  match serde_json::from_str(raw)? {
    serde_json::Value::Object(map) => Ok(map),
    _ => Err(Error::NotAnObject(key, collection.to_owned())),
  }
}
