use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Days,
  NaiveDate
};
use regex::Regex;
use thiserror::Error;

const DATE_KEY_FORMAT: &str =
  "%Y-%m-%d";
const LONG_LABEL_FORMAT: &str =
  "%A, %B %-d, %Y";

const MIN_SEARCH_YEAR: u64 = 1900;
const MAX_SEARCH_YEAR: u64 = 9999;

/// Why a search string could not be
/// resolved to a calendar date.
///
/// `Display` is the message shown to
/// the user.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Error,
)]
pub enum SearchDateError {
  #[error(
    "Invalid date format. Use \
     MM/DD/YYYY or YYYY-MM-DD."
  )]
  InvalidFormat,

  #[error(
    "Invalid month. Month must be \
     between 1 and 12."
  )]
  InvalidMonth,

  #[error(
    "Invalid day. Day must be between \
     1 and 31."
  )]
  InvalidDay,

  #[error(
    "Invalid year. Year must be \
     between 1900 and 9999."
  )]
  InvalidYear,

  #[error(
    "Invalid day for the given month."
  )]
  InvalidDayForMonth
}

impl SearchDateError {
  pub fn kind(&self) -> &'static str {
    match self {
      | Self::InvalidFormat => {
        "invalid_format"
      }
      | Self::InvalidMonth => {
        "invalid_month"
      }
      | Self::InvalidDay => "invalid_day",
      | Self::InvalidYear => {
        "invalid_year"
      }
      | Self::InvalidDayForMonth => {
        "invalid_day_for_month"
      }
    }
  }
}

/// A successfully resolved search
/// string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDate {
  pub date:  NaiveDate,
  pub label: String
}

pub type ParsedSearchDate =
  Result<SearchDate, SearchDateError>;

#[derive(Debug, Clone, Copy)]
enum SearchShape {
  MonthDayYear,
  YearMonthDay
}

#[must_use]
pub fn to_key(date: NaiveDate) -> String {
  format!(
    "{:04}-{:02}-{:02}",
    date.year(),
    date.month(),
    date.day()
  )
}

pub fn parse_date_key(
  key: &str
) -> anyhow::Result<NaiveDate> {
  let date = NaiveDate::parse_from_str(
    key,
    DATE_KEY_FORMAT
  )
  .with_context(|| {
    format!("invalid date key: {key}")
  })?;

  // chrono accepts unpadded fields;
  // keys must round-trip exactly.
  if to_key(date) != key {
    return Err(anyhow!(
      "date key is not canonical \
       YYYY-MM-DD: {key}"
    ));
  }
  Ok(date)
}

#[must_use]
pub fn long_label(
  date: NaiveDate
) -> String {
  date
    .format(LONG_LABEL_FORMAT)
    .to_string()
}

#[tracing::instrument(skip(raw), fields(input = raw))]
pub fn parse_search_input(
  raw: &str
) -> ParsedSearchDate {
  let token = raw.trim();

  let (month, day, year) =
    split_search_components(token)
      .ok_or(
        SearchDateError::InvalidFormat
      )?;

  if !(1..=12).contains(&month) {
    return Err(
      SearchDateError::InvalidMonth
    );
  }
  if !(1..=31).contains(&day) {
    return Err(
      SearchDateError::InvalidDay
    );
  }
  if !(MIN_SEARCH_YEAR..=MAX_SEARCH_YEAR)
    .contains(&year)
  {
    return Err(
      SearchDateError::InvalidYear
    );
  }

  let date =
    roll_forward_date(year, month, day)
      .ok_or(
        SearchDateError::InvalidDayForMonth
      )?;

  if u64::from(date.month()) != month {
    tracing::debug!(
      month,
      day,
      rolled = %to_key(date),
      "day overflowed into next month"
    );
    return Err(
      SearchDateError::InvalidDayForMonth
    );
  }

  Ok(SearchDate {
    date,
    label: long_label(date)
  })
}

fn split_search_components(
  token: &str
) -> Option<(u64, u64, u64)> {
  let shape = detect_shape(token)?;
  let pattern = match shape {
    | SearchShape::MonthDayYear => {
      r"^(?P<month>[0-9]+)/(?P<day>[0-9]+)/(?P<year>[0-9]+)$"
    }
    | SearchShape::YearMonthDay => {
      r"^(?P<year>[0-9]+)-(?P<month>[0-9]+)-(?P<day>[0-9]+)$"
    }
  };

  let re = Regex::new(pattern).ok()?;
  let caps = re.captures(token)?;
  tracing::trace!(
    ?shape,
    "matched search shape"
  );

  let month = parse_component(
    caps.name("month")?.as_str()
  );
  let day = parse_component(
    caps.name("day")?.as_str()
  );
  let year = parse_component(
    caps.name("year")?.as_str()
  );
  Some((month, day, year))
}

fn detect_shape(
  token: &str
) -> Option<SearchShape> {
  if token.contains('/') {
    Some(SearchShape::MonthDayYear)
  } else if token.contains('-') {
    Some(SearchShape::YearMonthDay)
  } else {
    None
  }
}

// All-digit components only fail to
// parse on overflow; saturate so the
// range checks report them.
fn parse_component(raw: &str) -> u64 {
  raw.parse::<u64>().unwrap_or(u64::MAX)
}

fn roll_forward_date(
  year: u64,
  month: u64,
  day: u64
) -> Option<NaiveDate> {
  let year = i32::try_from(year).ok()?;
  let month = u32::try_from(month).ok()?;
  NaiveDate::from_ymd_opt(year, month, 1)?
    .checked_add_days(Days::new(
      day.saturating_sub(1)
    ))
}

pub mod date_key_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    date: &NaiveDate,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&super::to_key(*date))
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDate, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_date_key(&raw)
      .map_err(serde::de::Error::custom)
  }
}
