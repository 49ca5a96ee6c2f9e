//! `redil`: command-line and terminal UI client for the Redil server.
//!
//! # Usage
//!
//! ```
//! redil --url http://localhost:8080 --user admin --password secret
//! redil --config ~/.config/redil/config.toml summary --start-year 2024
//! redil top-groups --level zone --id <uuid> -n 10
//! redil tree --all
//! ```
//!
//! Without a subcommand the interactive tree browser starts.

mod app;
mod client;
mod render;
mod ui;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::{Args as ClapArgs, Parser, Subcommand};
use client::{ApiClient, ApiConfig, StatsQuery};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use redil_core::{
  org::HierarchyLevel,
  tree::{ExpansionState, visible_rows},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "redil", about = "Client for the Redil small-group server")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the redil server (default: http://localhost:8080).
  #[arg(long, env = "REDIL_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "REDIL_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "REDIL_PASSWORD")]
  password: Option<String>,

  #[command(flatten)]
  range: RangeArgs,

  #[command(subcommand)]
  command: Option<Command>,
}

/// Month range for statistics; the server fills in what is left out.
#[derive(ClapArgs, Debug, Default)]
struct RangeArgs {
  #[arg(long, global = true)]
  start_month: Option<u32>,
  #[arg(long, global = true)]
  start_year:  Option<i32>,
  #[arg(long, global = true)]
  end_month:   Option<u32>,
  #[arg(long, global = true)]
  end_year:    Option<i32>,
}

/// A hierarchy node to report on; defaults to the caller's own scope.
#[derive(ClapArgs, Debug)]
struct NodeArgs {
  /// union, association, zone, district, church or small_group.
  #[arg(long, requires = "id")]
  level: Option<HierarchyLevel>,
  #[arg(long, requires = "level")]
  id:    Option<Uuid>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Browse the hierarchy interactively (default).
  Browse,
  /// Totals for a node and each of its direct children.
  Summary {
    #[command(flatten)]
    node: NodeArgs,
  },
  /// Small groups ranked by attendance + 2×guests + 3×studies.
  TopGroups {
    #[command(flatten)]
    node: NodeArgs,
    #[arg(short, default_value_t = 5)]
    n:    usize,
  },
  /// Missionary pairs ranked by studies given.
  TopPairs {
    #[command(flatten)]
    node: NodeArgs,
    #[arg(short, default_value_t = 5)]
    n:    usize,
  },
  /// Print the hierarchy, expanding the given nodes.
  Tree {
    /// Expand this node id (repeatable).
    #[arg(long, value_name = "ID")]
    expand: Vec<Uuid>,
    /// Expand every node.
    #[arg(long)]
    all:    bool,
  },
}

impl RangeArgs {
  fn query(&self, node: Option<&NodeArgs>, n: Option<usize>) -> StatsQuery {
    StatsQuery {
      level: node.and_then(|a| a.level),
      id: node.and_then(|a| a.id),
      start_month: self.start_month,
      start_year: self.start_year,
      end_month: self.end_month,
      end_year: self.end_year,
      n,
    }
  }
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .clone()
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .clone()
      .or_else(|| non_empty(&file_cfg.username))
      .unwrap_or_default(),
    password: args
      .password
      .clone()
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
  };
  let client = ApiClient::new(api_config)?;

  match args.command.unwrap_or(Command::Browse) {
    Command::Browse => browse(client, args.range.query(None, None)).await,
    Command::Summary { node } => {
      let summary = client.summary(&args.range.query(Some(&node), None)).await?;
      print!("{}", render::summary(&summary));
      Ok(())
    }
    Command::TopGroups { node, n } => {
      let ranked = client.top_groups(&args.range.query(Some(&node), Some(n))).await?;
      print!("{}", render::groups(&ranked));
      Ok(())
    }
    Command::TopPairs { node, n } => {
      let ranked = client.top_pairs(&args.range.query(Some(&node), Some(n))).await?;
      print!("{}", render::pairs(&ranked));
      Ok(())
    }
    Command::Tree { expand, all } => {
      let nodes = client.hierarchy().await?;
      let mut state: ExpansionState = expand.into_iter().collect();
      if all {
        state.expand_all(&nodes);
      }
      print!("{}", render::tree(&visible_rows(&nodes, &state)));
      Ok(())
    }
  }
}

// ─── Interactive browser ─────────────────────────────────────────────────────

async fn browse(client: ApiClient, query: StatsQuery) -> Result<()> {
  let me = client.me().await.context("authenticating")?;
  let mut app = App::new(client, query);
  app.load_tree().await?;
  app.status_msg = format!("signed in as {} ({})", me.username, me.role);

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }
  Ok(())
}
