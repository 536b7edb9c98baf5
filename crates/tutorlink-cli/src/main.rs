//! `tutorlink` — command-line demo client for the tutoring marketplace.
//!
//! Each invocation opens the local SQLite backend, builds a
//! [`ProfileService`], performs one operation, and prints the result.
//!
//! # Usage
//!
//! ```
//! tutorlink register-tutor --email a@x.com --password secret1 \
//!   --first-name A --last-name B --subjects Math,Science --hourly-rate 50
//! tutorlink login --email a@x.com --password secret1
//! tutorlink tutors
//! tutorlink theme dark
//! ```

mod prefs;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use tutorlink_core::{
  document::Fields,
  profile::{Profile, Role, TutorProfile},
};
use tutorlink_service::{ProfileService, Route};
use tutorlink_store_sqlite::SqliteBackend;

use prefs::{Preferences, Theme};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tutorlink", about = "Tutoring-marketplace demo client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tutorlink.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create a client account.
  RegisterClient {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    grade_level: Option<String>,
  },

  /// Create a tutor account.
  RegisterTutor {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    phone: Option<String>,
    /// Comma-separated list of taught subjects.
    #[arg(long)]
    subjects: String,
    #[arg(long)]
    hourly_rate: f64,
  },

  /// Sign in and print the loaded profile.
  Login {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },

  /// List every tutor profile.
  Tutors,

  /// Sign in and apply `key=value` merge updates to the profile.
  Update {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Values parse as JSON, falling back to plain strings.
    #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
    set: Vec<String>,
  },

  /// Show or set the light/dark display preference.
  Theme { choice: Option<Theme> },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `tutorlink.toml` layered with
/// `TUTORLINK_*` environment variables.
#[derive(Deserialize)]
#[serde(default)]
struct AppConfig {
  store_path: PathBuf,
  prefs_path: PathBuf,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("tutorlink.db"),
      prefs_path: PathBuf::from("prefs.toml"),
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

type Service = ProfileService<SqliteBackend, SqliteBackend>;

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("TUTORLINK"))
    .build()
    .context("failed to read configuration")?;
  let app_cfg: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  // The display preference is read at startup and rewritten on toggle.
  let preferences = prefs::load(&app_cfg.prefs_path)?;
  if let Command::Theme { choice } = &cli.command {
    return match choice {
      None => {
        println!("{}", preferences.theme);
        Ok(())
      }
      Some(theme) => {
        prefs::store(&app_cfg.prefs_path, &Preferences { theme: *theme })?;
        println!("theme set to {theme}");
        Ok(())
      }
    };
  }

  let backend = SqliteBackend::open(&app_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {}", app_cfg.store_path.display())
    })?;
  let service = ProfileService::new(Arc::new(backend.clone()), Arc::new(backend));

  match cli.command {
    Command::RegisterClient {
      email,
      password,
      first_name,
      last_name,
      phone,
      grade_level,
    } => {
      let mut extras = Fields::new();
      extras.insert("firstName".into(), json!(first_name));
      extras.insert("lastName".into(), json!(last_name));
      if let Some(phone) = phone {
        extras.insert("phone".into(), json!(phone));
      }
      if let Some(grade) = grade_level {
        extras.insert("gradeLevel".into(), json!(grade));
      }
      register(&service, &email, &password, Role::Client, extras).await
    }

    Command::RegisterTutor {
      email,
      password,
      first_name,
      last_name,
      phone,
      subjects,
      hourly_rate,
    } => {
      let subjects: Vec<_> =
        subjects.split(',').map(|s| s.trim().to_owned()).collect();
      let mut extras = Fields::new();
      extras.insert("firstName".into(), json!(first_name));
      extras.insert("lastName".into(), json!(last_name));
      if let Some(phone) = phone {
        extras.insert("phone".into(), json!(phone));
      }
      extras.insert("subjects".into(), json!(subjects));
      extras.insert("hourlyRate".into(), json!(hourly_rate));
      register(&service, &email, &password, Role::Tutor, extras).await
    }

    Command::Login { email, password } => {
      let route = match service.login(&email, &password).await {
        Ok(route) => route,
        Err(error) => {
          tracing::error!(%error, "login failed");
          bail!("{}", error.user_message());
        }
      };
      if let Some(profile) = service.current_user() {
        print_profile(&profile);
      }
      println!("→ {}", route_label(route));
      Ok(())
    }

    Command::Tutors => {
      let tutors = match service.list_tutors().await {
        Ok(tutors) => tutors,
        Err(error) => {
          tracing::error!(%error, "tutor listing failed");
          bail!("{}", error.user_message());
        }
      };
      if tutors.is_empty() {
        println!("no tutors registered yet");
      }
      for tutor in &tutors {
        print_tutor_line(tutor);
      }
      Ok(())
    }

    Command::Update { email, password, set } => {
      if let Err(error) = service.login(&email, &password).await {
        tracing::error!(%error, "login failed");
        bail!("{}", error.user_message());
      }
      let uid = service
        .current_user()
        .map(|p| p.uid())
        .context("no current user after login")?;

      let mut patch = Fields::new();
      for pair in &set {
        let (key, value) = parse_key_value(pair)?;
        patch.insert(key, value);
      }

      if let Err(error) = service.update_profile(uid, patch).await {
        tracing::error!(%error, "profile update failed");
        bail!("{}", error.user_message());
      }
      if let Some(profile) = service.current_user() {
        print_profile(&profile);
      }
      Ok(())
    }

    Command::Theme { .. } => unreachable!("handled before opening the store"),
  }
}

async fn register(
  service: &Service,
  email: &str,
  password: &str,
  role: Role,
  extras: Fields,
) -> Result<()> {
  if let Err(error) = service.register(email, password, role, extras).await {
    tracing::error!(%error, "registration failed");
    bail!("{}", error.user_message());
  }
  println!("registered {email} as {role}");
  Ok(())
}

// ─── Output helpers ───────────────────────────────────────────────────────────

fn route_label(route: Route) -> &'static str {
  match route {
    Route::Landing => "landing",
    Route::ClientDashboard => "client dashboard",
    Route::TutorDashboard => "tutor dashboard",
  }
}

fn print_profile(profile: &Profile) {
  let identity = profile.identity();
  let name = identity.display_name.as_deref().unwrap_or(&identity.email);
  println!("{name} <{}> — {}", identity.email, profile.role());
  match profile {
    Profile::Client(client) => {
      if let Some(bio) = &client.details.personal.bio {
        println!("  {bio}");
      }
      if let Some(grade) = &client.details.grade_level {
        println!("  grade level: {grade}");
      }
    }
    Profile::Tutor(tutor) => print_tutor_line(tutor),
  }
}

fn print_tutor_line(tutor: &TutorProfile) {
  let name = tutor
    .identity
    .display_name
    .as_deref()
    .unwrap_or(&tutor.identity.email);
  let subjects = tutor.details.subjects.join(", ");
  let rate = tutor
    .details
    .hourly_rate
    .map(|r| format!("{r}/hr"))
    .unwrap_or_else(|| "rate unset".to_owned());
  let rating = tutor
    .details
    .rating
    .map(|r| format!("★ {r:.1}"))
    .unwrap_or_else(|| "unrated".to_owned());
  println!("  {name} — {subjects} — {rate} — {rating}");
}

/// Split `key=value`; the value parses as JSON first, then as a string.
fn parse_key_value(pair: &str) -> Result<(String, serde_json::Value)> {
  let (key, raw) = pair
    .split_once('=')
    .with_context(|| format!("expected KEY=VALUE, got {pair:?}"))?;
  let value = serde_json::from_str(raw)
    .unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()));
  Ok((key.to_owned(), value))
}

#[cfg(test)]
mod tests {
  use super::parse_key_value;
  use serde_json::json;

  #[test]
  fn values_parse_as_json_with_string_fallback() {
    assert_eq!(parse_key_value("bio=hello").unwrap().1, json!("hello"));
    assert_eq!(parse_key_value("hourlyRate=50").unwrap().1, json!(50));
    assert_eq!(
      parse_key_value("subjects=[\"Math\"]").unwrap().1,
      json!(["Math"])
    );
    assert!(parse_key_value("no-equals-sign").is_err());
  }
}
