use chrono::{
  Datelike,
  Duration,
  Months,
  NaiveDate,
  Weekday
};

/// The weeks covering one calendar
/// month, starting on `week_start`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct MonthGrid {
  year:       i32,
  month:      u32,
  week_start: Weekday
}

impl MonthGrid {
  pub fn new(
    year: i32,
    month: u32,
    week_start: Weekday
  ) -> Option<Self> {
    NaiveDate::from_ymd_opt(
      year, month, 1
    )?;
    Some(Self {
      year,
      month,
      week_start
    })
  }

  #[must_use]
  pub fn containing(
    date: NaiveDate,
    week_start: Weekday
  ) -> Self {
    Self {
      year: date.year(),
      month: date.month(),
      week_start
    }
  }

  pub fn year(&self) -> i32 {
    self.year
  }

  pub fn month(&self) -> u32 {
    self.month
  }

  pub fn week_start(&self) -> Weekday {
    self.week_start
  }

  pub fn first_day(&self) -> NaiveDate {
    first_day_of_month(
      self.year, self.month
    )
  }

  pub fn last_day(&self) -> NaiveDate {
    last_day_of_month(
      self.year, self.month
    )
  }

  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year
      && date.month() == self.month
  }

  /// `"June 2025"`.
  pub fn title(&self) -> String {
    self
      .first_day()
      .format("%B %Y")
      .to_string()
  }

  /// Every day from the start of the
  /// week holding the 1st through the
  /// end of the week holding the last
  /// day. Call again to restart.
  pub fn days(&self) -> GridDays {
    let start = start_of_week(
      self.first_day(),
      self.week_start
    );
    let end = add_days(
      start_of_week(
        self.last_day(),
        self.week_start
      ),
      6
    );
    GridDays {
      next: Some(start),
      end
    }
  }

  pub fn weeks(
    &self
  ) -> Vec<[NaiveDate; 7]> {
    let days: Vec<NaiveDate> =
      self.days().collect();
    days
      .chunks_exact(7)
      .filter_map(|chunk| {
        <[NaiveDate; 7]>::try_from(chunk)
          .ok()
      })
      .collect()
  }

  /// `None` when the move leaves the
  /// representable date range.
  pub fn shifted(
    &self,
    months: i32
  ) -> Option<Self> {
    let moved = shift_months(
      self.first_day(),
      months
    )?;
    Some(Self::containing(
      moved,
      self.week_start
    ))
  }
}

/// Lazy, finite walk over a
/// [`MonthGrid`]'s days.
#[derive(Debug, Clone)]
pub struct GridDays {
  next: Option<NaiveDate>,
  end:  NaiveDate
}

impl Iterator for GridDays {
  type Item = NaiveDate;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.next?;
    self.next = if current < self.end {
      current.succ_opt()
    } else {
      None
    };
    Some(current)
  }

  fn size_hint(
    &self
  ) -> (usize, Option<usize>) {
    let remaining =
      match self.next {
        | Some(day) => {
          usize::try_from(
            (self.end - day).num_days()
              + 1
          )
          .unwrap_or(0)
        }
        | None => 0
      };
    (remaining, Some(remaining))
  }
}

impl ExactSizeIterator for GridDays {}

impl std::iter::FusedIterator
  for GridDays
{
}

pub fn parse_week_start(
  raw: &str
) -> Option<Weekday> {
  match raw
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | _ => None
  }
}

pub fn weekday_labels(
  week_start: Weekday
) -> [&'static str; 7] {
  match week_start {
    | Weekday::Mon => {
      [
        "Mon", "Tue", "Wed", "Thu",
        "Fri", "Sat", "Sun"
      ]
    }
    | _ => {
      [
        "Sun", "Mon", "Tue", "Wed",
        "Thu", "Fri", "Sat"
      ]
    }
  }
}

pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> Option<NaiveDate> {
  let step =
    Months::new(months.unsigned_abs());
  if months >= 0 {
    date.checked_add_months(step)
  } else {
    date.checked_sub_months(step)
  }
}

fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}
