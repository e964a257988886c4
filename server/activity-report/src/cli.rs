//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "activity-report", version, about = "Repository activity reports from an event store", long_about = None)]
pub struct Cli {
  /// URL of the Elasticsearch instance
  #[arg(short, long, env = "EVENT_STORE_URL", global = true, default_value = "http://localhost:9200")]
  pub url: String,

  /// Debug-level logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Emit logs as JSON lines
  #[arg(long, global = true)]
  pub log_json: bool,

  /// Per-request timeout, in seconds
  #[arg(long, global = true, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
  pub timeout_secs: u64,

  /// Attempts per store request before giving up
  #[arg(long, global = true, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
  pub max_attempts: u32,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// New committers per month and commits per author for one project
  Monthly(MonthlyArgs),
  /// Rank repositories by commits + issues + pull requests in a trailing window
  Ranking(RankingArgs),
}

#[derive(Args, Debug)]
pub struct MonthlyArgs {
  /// Repository URL (or name) of the git repo
  #[arg(short = 'R', long)]
  pub repo: Option<String>,

  /// Raw index to use or create
  #[arg(short, long)]
  pub raw: Option<String>,

  /// Enriched index to use or create
  #[arg(short, long)]
  pub enrich: Option<String>,

  /// Create the indices first; otherwise only analysis is done
  #[arg(short, long)]
  pub create: bool,

  /// Output file for the new-committer table
  #[arg(short = '1', long)]
  pub output1: PathBuf,

  /// Output file for the commits-by-author table
  #[arg(short = '2', long)]
  pub output2: PathBuf,

  /// Only credit a commit when the author is new or already active that month
  #[arg(long)]
  pub legacy_accumulation: bool,

  /// Ingestor program
  #[arg(long, default_value = "p2o.py")]
  pub p2o: PathBuf,
}

#[derive(Args, Debug)]
pub struct RankingArgs {
  /// GitHub user token, needed when creating indices
  #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
  pub token: Option<String>,

  /// Output file
  #[arg(short, long)]
  pub out_file: PathBuf,

  /// JSON file with repo details; indices are created before analysis
  #[arg(short, long, conflicts_with = "index_file", required_unless_present = "index_file")]
  pub create_file: Option<PathBuf>,

  /// JSON file naming the enriched indices to analyse
  #[arg(short, long)]
  pub index_file: Option<PathBuf>,

  /// Length of the trailing window, in calendar months
  #[arg(long, default_value_t = 3)]
  pub window_months: u32,

  /// Ingestor program
  #[arg(long, default_value = "p2o.py")]
  pub p2o: PathBuf,
}
