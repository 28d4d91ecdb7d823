pub mod cli;
pub mod commands;
pub mod config;
pub mod conflict;
pub mod datekey;
pub mod event;
pub mod grid;
pub mod index;
pub mod render;
pub mod source;

use std::ffi::OsString;
use std::io::{
  self,
  Write
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use conflict::{
  AnnotatedEvent,
  annotate
};
pub use datekey::{
  ParsedSearchDate,
  SearchDate,
  SearchDateError,
  parse_search_input,
  to_key
};
pub use event::{
  Event,
  EventId
};
pub use index::{
  EventIndex,
  build_index,
  lookup
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?cli.overrides, "config overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  debug!(
    files = ?cfg.loaded_files,
    "config files loaded"
  );
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let events_path =
    config::resolve_events_path(
      &cfg,
      cli.events.as_deref()
    )
    .context(
      "failed to resolve event file"
    )?;

  let events =
    source::load_events(&events_path)?;
  let index = EventIndex::build(&events);

  let renderer =
    render::Renderer::new(&cfg);
  let ctx = commands::CommandContext {
    cfg:      &cfg,
    renderer: &renderer,
    index:    &index,
    today:    cfg.today()
  };

  let mut out = io::stdout().lock();
  commands::dispatch(
    &ctx,
    cli.command.unwrap_or_default(),
    &mut out
  )?;
  out.flush()?;

  info!("done");
  Ok(())
}
