use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Local,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::grid::parse_week_start;

const CONFIG_FILE: &str = "almanac.toml";
const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";
const EVENTS_FILE: &str = "events.json";
const DEFAULT_WEEK_START: &str =
  "sunday";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
  pub events:       Option<PathBuf>,
  pub timezone:     Option<String>,
  pub week_start:   String,
  pub color:        bool,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      events:       None,
      timezone:     None,
      week_start:   DEFAULT_WEEK_START
        .to_string(),
      color:        true,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) = resolve_config_path(
      config_override
    )?
    else {
      warn!(
        "no almanac.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    if !path.exists() {
      if config_override.is_some() {
        return Err(anyhow!(
          "config file does not exist: \
           {}",
          path.display()
        ));
      }
      warn!(file = %path.display(), "config file not found; using defaults");
      return Ok(Self::default());
    }

    info!(file = %path.display(), "loading config");
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    let mut cfg = Self::from_toml_str(
      &text
    )
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Self =
      toml::from_str(text)?;
    cfg.sanitize();
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      match key.as_str() {
        | "events" => {
          self.events =
            Some(PathBuf::from(value));
        }
        | "timezone" => {
          self.timezone = Some(value);
        }
        | "week_start" => {
          self.week_start = value;
        }
        | "color" => {
          self.color =
            parse_bool(&value)
              .ok_or_else(|| {
                anyhow!(
                  "invalid color \
                   setting: {value}"
                )
              })?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: \
             {other}"
          ));
        }
      }
    }
    self.sanitize();
    Ok(())
  }

  fn sanitize(&mut self) {
    if parse_week_start(
      &self.week_start
    )
    .is_none()
    {
      tracing::error!(
        week_start = %self.week_start,
        "unsupported week_start; using sunday"
      );
      self.week_start =
        DEFAULT_WEEK_START.to_string();
    }

    if let Some(raw) =
      self.timezone.as_deref()
      && parse_timezone(raw).is_none()
    {
      self.timezone = None;
    }

    if let Some(path) =
      self.events.as_deref()
    {
      self.events =
        Some(expand_tilde(path));
    }
  }

  pub fn week_start_day(
    &self
  ) -> Weekday {
    parse_week_start(&self.week_start)
      .unwrap_or(Weekday::Sun)
  }

  /// Today's calendar date in the
  /// configured timezone, else the
  /// system's local date.
  pub fn today(&self) -> NaiveDate {
    match self
      .timezone
      .as_deref()
      .and_then(parse_timezone)
    {
      | Some(tz) => {
        Utc::now()
          .with_timezone(&tz)
          .date_naive()
      }
      | None => {
        Local::now().date_naive()
      }
    }
  }
}

#[tracing::instrument(skip(
  cfg,
  override_path
))]
pub fn resolve_events_path(
  cfg: &Config,
  override_path: Option<&Path>
) -> anyhow::Result<PathBuf> {
  if let Some(path) = override_path {
    return Ok(expand_tilde(path));
  }
  if let Some(path) = cfg.events.clone()
  {
    return Ok(path);
  }

  let data = dirs::data_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine data \
         directory; pass --events"
      )
    })?;
  Ok(data.join("almanac").join(EVENTS_FILE))
}

fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(expand_tilde(path)));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Ok(Some(expand_tilde(
        Path::new(trimmed)
      )));
    }
  }

  Ok(dirs::config_dir().map(|dir| {
    dir.join("almanac").join(CONFIG_FILE)
  }))
}

fn parse_timezone(raw: &str) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(err) => {
      tracing::error!(
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use chrono::Weekday;

  use super::{
    Config,
    resolve_events_path
  };

  #[test]
  fn defaults_without_file() {
    let cfg = Config::default();
    assert_eq!(
      cfg.week_start_day(),
      Weekday::Sun
    );
    assert!(cfg.color);
    assert!(cfg.events.is_none());
  }

  #[test]
  fn parses_toml_and_sanitises() {
    let cfg = Config::from_toml_str(
      r#"
        events = "/srv/cal/events.json"
        timezone = "Not/AZone"
        week_start = "weekday"
        color = false
      "#
    )
    .expect("parse config");

    assert_eq!(
      cfg.events,
      Some(PathBuf::from(
        "/srv/cal/events.json"
      ))
    );
    assert_eq!(cfg.timezone, None);
    assert_eq!(cfg.week_start, "sunday");
    assert!(!cfg.color);
  }

  #[test]
  fn overrides_replace_values() {
    let mut cfg = Config::default();
    cfg
      .apply_overrides(vec![
        (
          "week_start".to_string(),
          "monday".to_string()
        ),
        (
          "color".to_string(),
          "off".to_string()
        ),
        (
          "timezone".to_string(),
          "Europe/Berlin".to_string()
        ),
      ])
      .expect("apply overrides");

    assert_eq!(
      cfg.week_start_day(),
      Weekday::Mon
    );
    assert!(!cfg.color);
    assert_eq!(
      cfg.timezone.as_deref(),
      Some("Europe/Berlin")
    );
  }

  #[test]
  fn rejects_unknown_keys_and_bad_bools() {
    let mut cfg = Config::default();
    assert!(
      cfg
        .apply_overrides(vec![(
          "colour".to_string(),
          "on".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides(vec![(
          "color".to_string(),
          "maybe".to_string()
        )])
        .is_err()
    );
  }

  #[test]
  fn events_override_beats_config() {
    let cfg = Config {
      events: Some(PathBuf::from(
        "/from/config.json"
      )),
      ..Config::default()
    };
    let path = resolve_events_path(
      &cfg,
      Some(PathBuf::from("/from/flag.json").as_path())
    )
    .expect("resolve");
    assert_eq!(
      path,
      PathBuf::from("/from/flag.json")
    );
    assert_eq!(
      resolve_events_path(&cfg, None)
        .expect("resolve"),
      PathBuf::from("/from/config.json")
    );
  }

  #[test]
  fn load_records_the_file_it_read() {
    let temp = tempfile::tempdir()
      .expect("tempdir");
    let path =
      temp.path().join("almanac.toml");
    std::fs::write(
      &path,
      "week_start = \"mon\"\n"
    )
    .expect("write config");

    let cfg = Config::load(Some(&path))
      .expect("load config");
    assert_eq!(cfg.loaded_files, vec![
      path
    ]);
    assert_eq!(
      cfg.week_start_day(),
      Weekday::Mon
    );
    assert!(
      Config::from_toml_str("")
        .expect("empty config")
        .loaded_files
        .is_empty()
    );
  }
}
