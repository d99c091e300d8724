//! `armoury`: command-line client for the armoury ledger server.
//!
//! # Usage
//!
//! ```
//! armoury --url http://localhost:8080 list --filter doe
//! armoury issue --army-number 123 --rank PVT --name Doe \
//!   --weapon-type Rifle --butt-number B2 --register-number R1 \
//!   --bayonet-complete false
//! armoury return 6f1c... --storeman "Sgt Lee"
//! armoury --config ~/.config/armoury/config.toml stats
//! ```

mod client;
mod render;

use anyhow::{Context, Result};
use armoury_core::transaction::NewIssue;
use chrono::Utc;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "armoury", about = "Issue and return arms against the armoury ledger")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the armoury server (default: http://localhost:8080).
  #[arg(long, env = "ARMOURY_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List records, newest first.
  List {
    /// Case-insensitive on name; literal on army and butt numbers.
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// Issue a weapon and open a record.
  Issue {
    #[arg(long)]
    army_number:      String,
    #[arg(long)]
    rank:             String,
    #[arg(long)]
    name:             String,
    #[arg(long)]
    weapon_type:      String,
    #[arg(long)]
    butt_number:      String,
    #[arg(long)]
    register_number:  String,
    #[arg(long)]
    magazine:         Option<String>,
    /// `true` or `false`; omit when unknown.
    #[arg(long, value_name = "BOOL")]
    bayonet_complete: Option<bool>,
    #[arg(long)]
    remarks:          Option<String>,
  },
  /// Close an open record as returned now.
  Return {
    id: Uuid,
    #[arg(long)]
    storeman: String,
  },
  /// Print the dashboard figures.
  Stats,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
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
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
  };
  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::List { filter } => {
      let now = Utc::now();
      for tx in client.list_transactions(filter.as_deref()).await? {
        println!("{}", render::transaction_line(&tx, now));
      }
    }
    Command::Issue {
      army_number,
      rank,
      name,
      weapon_type,
      butt_number,
      register_number,
      magazine,
      bayonet_complete,
      remarks,
    } => {
      let input = NewIssue {
        army_number,
        rank,
        name,
        weapon_type,
        butt_number,
        register_number,
        magazine,
        bayonet_complete,
        remarks,
        date_out: None,
      };
      let tx = client.issue(&input).await?;
      println!("{}", render::transaction_line(&tx, Utc::now()));
    }
    Command::Return { id, storeman } => {
      let tx = client.return_weapon(id, &storeman).await?;
      println!("{}", render::transaction_line(&tx, Utc::now()));
    }
    Command::Stats => {
      print!("{}", render::stats_report(&client.stats().await?));
    }
  }

  Ok(())
}
