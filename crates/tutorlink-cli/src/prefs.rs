//! The persisted light/dark display preference.
//!
//! A single-key TOML file, read at startup and rewritten on toggle. A
//! missing file means the default (light) theme.

use std::{fs, path::Path};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// The display theme choice.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl std::fmt::Display for Theme {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Light => "light",
      Self::Dark => "dark",
    })
  }
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
  #[serde(default)]
  pub theme: Theme,
}

pub fn load(path: &Path) -> Result<Preferences> {
  if !path.exists() {
    return Ok(Preferences::default());
  }
  let raw = fs::read_to_string(path)
    .with_context(|| format!("reading preferences {}", path.display()))?;
  toml::from_str(&raw).context("parsing preferences")
}

pub fn store(path: &Path, prefs: &Preferences) -> Result<()> {
  let raw = toml::to_string_pretty(prefs).context("serialising preferences")?;
  fs::write(path, raw)
    .with_context(|| format!("writing preferences {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("tutorlink-prefs-{}.toml", std::process::id()))
  }

  #[test]
  fn missing_file_yields_default() {
    let prefs = load(Path::new("/nonexistent/prefs.toml")).unwrap();
    assert_eq!(prefs.theme, Theme::Light);
  }

  #[test]
  fn round_trips_through_the_file() {
    let path = temp_path();
    store(&path, &Preferences { theme: Theme::Dark }).unwrap();
    let prefs = load(&path).unwrap();
    assert_eq!(prefs.theme, Theme::Dark);
    std::fs::remove_file(&path).ok();
  }
}
