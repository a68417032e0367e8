//! docket server binary.
//!
//! Reads `docket.toml` (or the path given with `--config`) layered with
//! `DOCKET_*` environment variables, opens the SQLite store and the
//! attachment directory, and serves the JSON API over HTTP while sweeping
//! expired documents in the background.
//!
//! # One-shot sweep
//!
//! ```text
//! docket sweep --today 2024-07-01
//! ```
//!
//! # Password hash generation
//!
//! ```text
//! docket hash-password
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use docket_core::clock::{Clock, FixedClock, SystemClock};
use docket_server::{build_engine, router, settings::ServerConfig, spawn_sweeper};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Docket compliance document server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "docket.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Expire every past-due document once and print the report.
  Sweep {
    /// Sweep as of this date instead of today.
    #[arg(long)]
    today: Option<NaiveDate>,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      let hash = docket_core::password::hash_password(&password).context("failed to hash password")?;
      println!("{hash}");
      Ok(())
    }
    Command::Sweep { today } => {
      let cfg = ServerConfig::load(&cli.config)?;
      let clock: Arc<dyn Clock> = match today {
        Some(date) => Arc::new(FixedClock::at_date(date)),
        None => Arc::new(SystemClock),
      };
      let engine = build_engine(&cfg, clock).await?;
      let report = engine.sweep().await.context("sweep failed")?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }
    Command::Serve => serve(ServerConfig::load(&cli.config)?).await,
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let engine = Arc::new(build_engine(&cfg, Arc::new(SystemClock)).await?);

  let sweeper = spawn_sweeper(engine.clone(), Duration::from_secs(cfg.sweep_interval_secs.max(1)));
  let app = router(engine);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      tracing::info!("shutting down");
    })
    .await
    .context("server error")?;

  sweeper.abort();
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
