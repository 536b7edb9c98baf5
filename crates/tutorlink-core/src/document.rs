//! The `DocumentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `tutorlink-store-sqlite`). The access layer (`tutorlink-service`)
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

/// The single collection this application persists into.
pub const USERS_COLLECTION: &str = "users";

/// The flat, schemaless field map of one document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

// ─── Write semantics ─────────────────────────────────────────────────────────

/// How a write treats fields already present on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
  /// Unspecified fields are left untouched server-side.
  #[default]
  Merge,
  /// The document is replaced wholesale.
  Replace,
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// A single field-equals predicate — the only query shape the client needs.
#[derive(Debug, Clone)]
pub struct FieldFilter {
  pub field:  String,
  pub equals: serde_json::Value,
}

impl FieldFilter {
  pub fn equals(
    field: impl Into<String>,
    value: impl Into<serde_json::Value>,
  ) -> Self {
    Self { field: field.into(), equals: value.into() }
  }

  /// Whether `fields` satisfies this predicate.
  pub fn matches(&self, fields: &Fields) -> bool {
    fields.get(&self.field) == Some(&self.equals)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the managed document store.
///
/// One record per identity; record key = identity uid. A read that finds
/// no record is a valid absent outcome, never an error — errors are
/// reserved for transport and permission failures.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write `fields` under `key`, honouring `policy`.
  fn write_document<'a>(
    &'a self,
    collection: &'a str,
    key: Uuid,
    fields: Fields,
    policy: MergePolicy,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Read the document under `key`. Returns `None` if absent.
  fn read_document<'a>(
    &'a self,
    collection: &'a str,
    key: Uuid,
  ) -> impl Future<Output = Result<Option<Fields>, Self::Error>> + Send + 'a;

  /// Return every document in `collection` matching `filter`, unordered.
  /// No pagination — intended for demo-scale datasets.
  fn query_documents<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a FieldFilter,
  ) -> impl Future<Output = Result<Vec<Fields>, Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn filter_matches_on_equality() {
    let filter = FieldFilter::equals("role", "tutor");

    let mut fields = Fields::new();
    fields.insert("role".into(), json!("tutor"));
    assert!(filter.matches(&fields));

    fields.insert("role".into(), json!("client"));
    assert!(!filter.matches(&fields));

    fields.remove("role");
    assert!(!filter.matches(&fields));
  }
}
