//! Core types and trait definitions for the tutorlink marketplace client.
//!
//! This crate is deliberately free of I/O and backend dependencies. It
//! defines the profile data model and the two external-service boundaries
//! (identity provider, document store); everything else depends on it.

pub mod document;
pub mod error;
pub mod identity;
pub mod profile;

pub use error::AuthError;
