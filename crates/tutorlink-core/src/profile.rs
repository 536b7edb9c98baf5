//! The role-tagged profile model.
//!
//! A profile is the application-level document stored in the `users`
//! collection, keyed by identity uid. The role chosen at registration is
//! the discriminant of a closed union: it decides which detail shape
//! applies and is never changed by any update path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Fields;

// ─── Role ────────────────────────────────────────────────────────────────────

/// The two account roles of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Client,
  Tutor,
}

impl Role {
  /// The discriminant string stored under the `role` document key.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Client => "client",
      Self::Tutor => "tutor",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Identity core ───────────────────────────────────────────────────────────

/// The fields every account shares, managed jointly with the identity
/// provider. The role lives on the [`Profile`] union, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
  pub uid:   Uuid,
  pub email: String,
  #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
  pub photo_url: Option<String>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
}

// ─── Shared detail block ─────────────────────────────────────────────────────

/// Name, contact and location fields common to both roles.
/// Everything here is optional; profiles are filled in over time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub full_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mobile_number: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gender: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birthday: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub province: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bio: Option<String>,
}

// ─── Client variant ──────────────────────────────────────────────────────────

/// What a client is looking for in a tutor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPreferences {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subjects: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub budget: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_price: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_price: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub availability: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_tutor_gender: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_schedule: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_mode: Option<String>,
}

/// Client-specific profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
  #[serde(flatten)]
  pub personal: PersonalDetails,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub grade_level: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interests: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub learning_goals: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_subjects: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub budget: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferences: Option<ClientPreferences>,
}

/// A client account: identity core plus client details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
  #[serde(flatten)]
  pub identity: Identity,
  #[serde(flatten)]
  pub details:  ClientDetails,
}

// ─── Tutor variant ───────────────────────────────────────────────────────────

/// How a tutor prefers to hold sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorPreferences {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_mode: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub available_schedule: Option<Vec<String>>,
}

/// Tutor-specific profile fields, including the rating aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorDetails {
  #[serde(flatten)]
  pub personal: PersonalDetails,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub subjects: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subjects_taught: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hourly_rate: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub education: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub experience: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub experience_years: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub experience_description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub teaching_style: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub availability: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_reviews: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub certifications: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub specialization: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferences: Option<TutorPreferences>,
}

/// A tutor account: identity core plus tutor details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorProfile {
  #[serde(flatten)]
  pub identity: Identity,
  #[serde(flatten)]
  pub details:  TutorDetails,
}

// ─── Profile union ───────────────────────────────────────────────────────────

/// A stored profile, discriminated by the `role` document key.
///
/// "Role determines shape" holds at the type level: there is no way to
/// construct a tutor-shaped document tagged as a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
  Client(ClientProfile),
  Tutor(TutorProfile),
}

impl Profile {
  pub fn role(&self) -> Role {
    match self {
      Self::Client(_) => Role::Client,
      Self::Tutor(_) => Role::Tutor,
    }
  }

  pub fn identity(&self) -> &Identity {
    match self {
      Self::Client(p) => &p.identity,
      Self::Tutor(p) => &p.identity,
    }
  }

  pub fn uid(&self) -> Uuid { self.identity().uid }

  pub fn email(&self) -> &str { &self.identity().email }

  pub fn display_name(&self) -> Option<&str> {
    self.identity().display_name.as_deref()
  }

  pub fn created_at(&self) -> DateTime<Utc> { self.identity().created_at }

  /// Decode a profile from the flat field map read out of the store.
  pub fn from_fields(fields: Fields) -> Result<Self, serde_json::Error> {
    serde_json::from_value(serde_json::Value::Object(fields))
  }

  /// Serialise into the flat field map written to the store.
  ///
  /// Unset optional fields are omitted entirely, so a merge write never
  /// clobbers a field with `null`.
  pub fn to_fields(&self) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(self)? {
      serde_json::Value::Object(map) => Ok(map),
      // Unreachable: a tagged struct always serialises to an object.
      other => Err(serde::de::Error::custom(format!(
        "profile serialised to non-object value: {other}"
      ))),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn identity() -> Identity {
    Identity {
      uid:          Uuid::new_v4(),
      email:        "a@example.com".into(),
      display_name: Some("A B".into()),
      photo_url:    None,
      created_at:   Utc::now(),
    }
  }

  #[test]
  fn role_tag_is_the_discriminant() {
    let profile = Profile::Tutor(TutorProfile {
      identity: identity(),
      details:  TutorDetails {
        subjects: vec!["Math".into()],
        hourly_rate: Some(50.0),
        ..Default::default()
      },
    });

    let fields = profile.to_fields().unwrap();
    assert_eq!(fields.get("role"), Some(&json!("tutor")));
    assert_eq!(fields.get("subjects"), Some(&json!(["Math"])));
    assert_eq!(fields.get("hourlyRate"), Some(&json!(50.0)));
  }

  #[test]
  fn unset_fields_are_omitted() {
    let profile = Profile::Client(ClientProfile {
      identity: identity(),
      details:  ClientDetails::default(),
    });

    let fields = profile.to_fields().unwrap();
    assert!(!fields.contains_key("bio"));
    assert!(!fields.contains_key("gradeLevel"));
    assert!(!fields.contains_key("photoURL"));
  }

  #[test]
  fn fields_round_trip() {
    let profile = Profile::Client(ClientProfile {
      identity: identity(),
      details:  ClientDetails {
        personal: PersonalDetails {
          first_name: Some("A".into()),
          bio: Some("hello".into()),
          ..Default::default()
        },
        preferences: Some(ClientPreferences {
          subjects: Some(vec!["Science".into()]),
          max_price: Some(500.0),
          ..Default::default()
        }),
        ..Default::default()
      },
    });

    let decoded = Profile::from_fields(profile.to_fields().unwrap()).unwrap();
    assert_eq!(decoded, profile);
  }

  #[test]
  fn missing_role_does_not_decode() {
    let mut fields = Profile::Client(ClientProfile {
      identity: identity(),
      details:  ClientDetails::default(),
    })
    .to_fields()
    .unwrap();
    fields.remove("role");

    assert!(Profile::from_fields(fields).is_err());
  }
}
