//! Binary entrypoint: raw webhook body on stdin, one JSON object on stdout.
//!
//! Output is either an Assessment or an ErrorOutput. Logs go to stderr
//! (`RUST_LOG=confidence_engine=debug` for the per-metric trace).
//!
//! Exit codes: 0 assessed, 1 invalid input or policy, 2 signature rejected.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use confidence_engine::types::ErrorOutput;
use confidence_engine::{Config, Engine, EngineError, Verification};

/// Score a CI coverage webhook delivery for release confidence.
#[derive(Parser, Debug)]
#[command(name = "confidence-engine", version)]
struct Cli {
  /// X-Hub-Signature-256 header of the delivery (sha256=<hex>).
  #[arg(long, env = "WEBHOOK_SIGNATURE")]
  signature: Option<String>,

  /// Shared webhook secret.
  #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
  secret: Option<String>,

  /// JSON policy file overriding scoring weights and thresholds.
  #[arg(long)]
  policy: Option<PathBuf>,

  /// Score without checking the signature (local replays only).
  #[arg(long)]
  insecure_skip_verify: bool,

  /// Pretty-print the JSON output.
  #[arg(long)]
  pretty: bool,
}

fn main() {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();
  if let Err(e) = run_binary(&cli) {
    let err = ErrorOutput::from(&e);
    let mut out = io::stdout().lock();
    let _ = serde_json::to_writer(&mut out, &err);
    let _ = writeln!(out);
    let _ = out.flush();
    std::process::exit(e.exit_code());
  }
}

fn run_binary(cli: &Cli) -> Result<(), EngineError> {
  let config = match &cli.policy {
    Some(path) => Config::from_file(path)?,
    None => Config::default(),
  };

  let mut raw = Vec::new();
  io::stdin().lock().read_to_end(&mut raw)?;

  let verification = if cli.insecure_skip_verify {
    Verification::Skip
  } else {
    Verification::Required {
      header: cli.signature.as_deref(),
      secret: cli.secret.as_deref(),
    }
  };
  let assessment = Engine::new(config).assess_delivery(&raw, verification)?;

  let mut out = io::stdout().lock();
  if cli.pretty {
    serde_json::to_writer_pretty(&mut out, &assessment)?;
  } else {
    serde_json::to_writer(&mut out, &assessment)?;
  }
  writeln!(out)?;
  out.flush()?;
  Ok(())
}
