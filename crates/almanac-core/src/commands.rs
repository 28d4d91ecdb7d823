use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::cli::Command;
use crate::config::Config;
use crate::conflict::{AnnotatedEvent, annotate};
use crate::datekey::{SearchDate, parse_search_input, to_key};
use crate::grid::MonthGrid;
use crate::index::EventIndex;
use crate::render::Renderer;

/// Everything a command needs besides its own arguments.
pub struct CommandContext<'a> {
    pub cfg: &'a Config,
    pub renderer: &'a Renderer,
    pub index: &'a EventIndex,
    pub today: NaiveDate,
}

#[derive(Debug, Serialize)]
struct DayExport<'a> {
    date: String,
    events: Vec<AnnotatedEvent<'a>>,
}

#[instrument(skip(ctx, out))]
pub fn dispatch<W: Write>(ctx: &CommandContext<'_>, command: Command, out: &mut W) -> anyhow::Result<()> {
    debug!(today = %ctx.today, dates = ctx.index.len(), "dispatching command");

    match command {
        Command::Month { date, offset } => cmd_month(ctx, date.as_deref(), offset, out),
        Command::Day { date } => cmd_day(ctx, &date, out),
        Command::Search { input } => cmd_search(ctx, &input, out),
        Command::Export { date } => cmd_export(ctx, date.as_deref(), out),
    }
}

fn resolve(input: &str) -> anyhow::Result<SearchDate> {
    parse_search_input(input).with_context(|| format!("cannot resolve date {input:?}"))
}

fn cmd_month<W: Write>(
    ctx: &CommandContext<'_>,
    date: Option<&str>,
    offset: i32,
    out: &mut W,
) -> anyhow::Result<()> {
    let (focus, selected) = match date {
        Some(raw) => {
            let hit = resolve(raw)?;
            (hit.date, Some(hit.date))
        }
        None => (ctx.today, None),
    };

    let grid = MonthGrid::containing(focus, ctx.cfg.week_start_day())
        .shifted(offset)
        .ok_or_else(|| anyhow!("month offset {offset} is out of range"))?;
    let selected = selected.filter(|day| grid.contains(*day));
    ctx.renderer
        .write_month(out, &grid, ctx.index, ctx.today, selected)
}

fn cmd_day<W: Write>(ctx: &CommandContext<'_>, date: &str, out: &mut W) -> anyhow::Result<()> {
    let hit = resolve(date)?;
    ctx.renderer
        .write_day(out, hit.date, ctx.index.lookup_date(hit.date))
}

fn cmd_search<W: Write>(ctx: &CommandContext<'_>, input: &str, out: &mut W) -> anyhow::Result<()> {
    let hit = resolve(input)?;
    ctx.renderer.write_search_hit(out, &hit)?;
    writeln!(out)?;

    let grid = MonthGrid::containing(hit.date, ctx.cfg.week_start_day());
    ctx.renderer
        .write_month(out, &grid, ctx.index, ctx.today, Some(hit.date))?;
    writeln!(out)?;
    ctx.renderer
        .write_day(out, hit.date, ctx.index.lookup_date(hit.date))
}

fn cmd_export<W: Write>(ctx: &CommandContext<'_>, date: Option<&str>, out: &mut W) -> anyhow::Result<()> {
    match date {
        Some(raw) => {
            let hit = resolve(raw)?;
            let export = DayExport {
                date: to_key(hit.date),
                events: annotate(ctx.index.lookup_date(hit.date)),
            };
            serde_json::to_writer_pretty(&mut *out, &export)?;
        }
        None => {
            let all: BTreeMap<&str, Vec<AnnotatedEvent<'_>>> = ctx
                .index
                .iter()
                .map(|(key, events)| (key, annotate(events)))
                .collect();
            serde_json::to_writer_pretty(&mut *out, &all)?;
        }
    }
    writeln!(out)?;
    Ok(())
}
