//! Binary entrypoint: parse arguments, run one report, print its tables to stdout.

use std::io::{self, Write};
use std::time::Duration;

use activity_engine::{AccumulationMode, Config, Engine};
use clap::Parser;
use tracing::{error, Level};

use activity_report::app::{self, MonthlyJob, RankingJob, RepoSource};
use activity_report::cli::{Cli, Command};
use activity_report::output::{self, COMMITS_BY_AUTHOR_HEADERS, NEW_COMMITTER_HEADERS, RANKING_HEADERS};
use activity_report::{telemetry, ElasticStore, P2oIngestor, ReportError, RetryPolicy};

#[tokio::main]
async fn main() {
  let cli = Cli::parse();
  let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
  telemetry::init_tracing(cli.log_json, level);

  if let Err(e) = run(cli).await {
    error!(error = %e, "report failed");
    let _ = writeln!(io::stderr(), "activity-report: {}", e);
    std::process::exit(1);
  }
}

async fn run(cli: Cli) -> Result<(), ReportError> {
  let timeout = Duration::from_secs(cli.timeout_secs);
  let retry = RetryPolicy {
    max_attempts: cli.max_attempts,
    timeout,
    ..RetryPolicy::default()
  };
  let store = ElasticStore::new(&cli.url, timeout)?.with_request_timeout(timeout);
  let stdout = io::stdout();

  match cli.command {
    Command::Monthly(args) => {
      let engine = Engine::new(Config {
        accumulation: if args.legacy_accumulation {
          AccumulationMode::FirstSeenOnly
        } else {
          AccumulationMode::Total
        },
        ..Config::default()
      });
      let job = MonthlyJob {
        repo: args.repo,
        raw: args.raw,
        enrich: args.enrich,
        create: args.create,
        store_address: cli.url.clone(),
        new_committers_path: args.output1,
        commits_path: args.output2,
      };
      let ingestor = P2oIngestor::new(args.p2o);

      let report = app::run_monthly(&job, &engine, &store, &ingestor, &retry).await?;
      output::write_table(stdout.lock(), &NEW_COMMITTER_HEADERS, &report.new_committers)?;
      output::write_table(stdout.lock(), &COMMITS_BY_AUTHOR_HEADERS, &report.commits_by_author)?;
    }
    Command::Ranking(args) => {
      let engine = Engine::new(Config {
        window_months: args.window_months,
        ..Config::default()
      });
      let source = match (args.create_file, args.index_file) {
        (Some(path), _) => RepoSource::Registry(path),
        (None, Some(path)) => RepoSource::IndexFile(path),
        (None, None) => {
          return Err(
            activity_engine::EngineError::config(
              "create_file|index_file",
              "at least one of --create-file or --index-file is expected",
            )
            .into(),
          )
        }
      };
      let job = RankingJob {
        source,
        token: args.token,
        store_address: cli.url.clone(),
        out_file: args.out_file,
      };
      let ingestor = P2oIngestor::new(args.p2o);
      let now = chrono::Utc::now().naive_utc();

      let outcome = app::run_ranking(&job, &engine, &store, &ingestor, &retry, now).await?;
      output::write_table(stdout.lock(), &RANKING_HEADERS, &outcome.records)?;
      for (name, e) in &outcome.failed {
        let _ = writeln!(io::stderr(), "activity-report: skipped {}: {}", name, e);
      }
    }
  }

  Ok(())
}
