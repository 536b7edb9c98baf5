//! The profile access layer.
//!
//! [`ProfileService`] mediates between callers (views, the CLI) and the
//! two external boundaries defined in `tutorlink-core`: the identity
//! provider and the document store. It owns the single-slot current-user
//! broadcast and the role-based navigation signal; it is an explicit
//! context object constructed at application start, not an ambient
//! singleton.

pub mod error;
pub mod session;

pub use error::Error;
pub use session::{ProfileService, Route};

#[cfg(test)]
mod tests;
