//! Column encoding helpers shared by the account and document tables.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

pub fn encode_uuid(id: Uuid) -> String { id.to_string() }

pub fn parse_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(Error::Uuid)
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn parse_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}
