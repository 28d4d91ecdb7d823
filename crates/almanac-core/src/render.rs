use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::conflict::{annotate, conflicting_pairs, has_conflicts};
use crate::datekey::{SearchDate, long_label};
use crate::event::Event;
use crate::grid::{MonthGrid, weekday_labels};
use crate::index::EventIndex;

// Fits ">31!99" plus a separating space.
const CELL_WIDTH: usize = 7;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Month grid: one cell per day with an event count, `!` marking days with
    /// overlapping events, `>` the selected day and `*` today.
    #[tracing::instrument(skip(self, out, grid, index))]
    pub fn write_month<W: Write>(
        &self,
        out: &mut W,
        grid: &MonthGrid,
        index: &EventIndex,
        today: NaiveDate,
        selected: Option<NaiveDate>,
    ) -> anyhow::Result<()> {
        let row_width = CELL_WIDTH * 7;
        let title = grid.title();
        let indent = row_width.saturating_sub(UnicodeWidthStr::width(title.as_str())) / 2;
        writeln!(out, "{}{}", " ".repeat(indent), self.paint(&title, "1"))?;

        for label in weekday_labels(grid.week_start()) {
            write!(out, "{label:>width$}", width = CELL_WIDTH)?;
        }
        writeln!(out)?;

        for week in grid.weeks() {
            for day in week {
                let cell = self.day_cell(grid, index, day, today, selected);
                let padding = CELL_WIDTH.saturating_sub(visible_width(&cell));
                write!(out, "{}{}", " ".repeat(padding), cell)?;
            }
            writeln!(out)?;
        }

        Ok(())
    }

    fn day_cell(
        &self,
        grid: &MonthGrid,
        index: &EventIndex,
        day: NaiveDate,
        today: NaiveDate,
        selected: Option<NaiveDate>,
    ) -> String {
        let marker = if selected == Some(day) {
            ">"
        } else if day == today {
            "*"
        } else {
            ""
        };
        let number = format!("{marker}{}", day.day());

        if !grid.contains(day) {
            return self.paint(&number, "2");
        }

        let events = index.lookup_date(day);
        let number = if day == today {
            self.paint(&number, "7")
        } else {
            number
        };

        match events.len() {
            0 => number,
            count if has_conflicts(events) => {
                format!("{number}{}", self.paint(&format!("!{count}"), "31"))
            }
            count => format!("{number}{}", self.paint(&format!("+{count}"), "36")),
        }
    }

    /// A day's events with their conflict flags, followed by each overlapping pair.
    #[tracing::instrument(skip(self, out, events), fields(events = events.len()))]
    pub fn write_day<W: Write>(
        &self,
        out: &mut W,
        date: NaiveDate,
        events: &[Event],
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&long_label(date), "1"))?;

        if events.is_empty() {
            writeln!(out, "No events.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Time".to_string(),
            "Title".to_string(),
            "Color".to_string(),
            "Conflict".to_string(),
        ];

        let rows = annotate(events)
            .into_iter()
            .map(|annotated| {
                let event = annotated.event;
                let time = format!(
                    "{}-{}",
                    event.start_time.format("%H:%M"),
                    event.display_end().format("%H:%M")
                );
                let conflict = if annotated.conflict {
                    self.paint("yes", "31")
                } else {
                    String::new()
                };
                vec![
                    event.id.to_string(),
                    time,
                    event.title.clone(),
                    event.color.clone(),
                    conflict,
                ]
            })
            .collect();

        write_table(&mut *out, headers, rows)?;

        for overlap in conflicting_pairs(events) {
            writeln!(
                out,
                "! {} overlaps {} by {} min",
                events[overlap.first].title, events[overlap.second].title, overlap.minutes
            )?;
        }

        Ok(())
    }

    pub fn write_search_hit<W: Write>(&self, out: &mut W, hit: &SearchDate) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&hit.label, "1"))?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn visible_width(text: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(text).as_str())
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{:width$} ", header, width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let padding = widths[idx].saturating_sub(visible_width(cell));
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
