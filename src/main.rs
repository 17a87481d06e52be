//! Command line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Duration;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use tablekeeper::config::{DEFAULT_EXPIRATION_PATTERN, ExpirationConfig, ProvisionConfig};
use tablekeeper::{BatchReport, Result, WarehouseSession, logging};

#[derive(Debug, Parser)]
#[command(name = "tablekeeper", version, about = "Provision and expire BigQuery tables")]
struct Cli {
    /// Project the dataset lives in
    #[arg(long = "project-id", env = "GOOGLE_CLOUD_PROJECT", global = true)]
    project_id: Option<String>,

    /// Service-account key used when ambient credentials are not set,
    /// for example /path/to/credentials.json
    #[arg(long = "credentials-file", global = true)]
    credentials_file: Option<PathBuf>,

    /// Stop at the first table that fails instead of carrying on
    #[arg(long = "abort-on-error", global = true, default_value_t = false)]
    abort_on_error: bool,

    /// Increase log detail (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create `count` tables named <prefix>0 .. <prefix>N-1
    Provision {
        #[arg(long = "dataset-id")]
        dataset_id: String,

        #[arg(long)]
        prefix: String,

        #[arg(long)]
        count: usize,

        /// Days until the new tables expire
        #[arg(
            long = "ttl-days",
            default_value_t = 7,
            value_parser = clap::value_parser!(i64).range(1..=36500)
        )]
        ttl_days: i64,
    },

    /// Push out the expiration of tables whose names fully match a pattern
    Expire {
        #[arg(long = "dataset-id")]
        dataset_id: String,

        /// Regex matched against the whole table name
        #[arg(long, default_value = DEFAULT_EXPIRATION_PATTERN)]
        pattern: String,

        /// Days from now the matching tables will expire
        #[arg(
            long = "horizon-days",
            default_value_t = 14,
            value_parser = clap::value_parser!(i64).range(1..=36500)
        )]
        horizon_days: i64,
    },
}

fn summarize<T>(operation: &str, report: &BatchReport<T>) -> ExitCode {
    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failures.len(),
        aborted = report.aborted,
        "{} finished",
        operation
    );
    if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(project_id: &str, cli: Cli) -> Result<ExitCode> {
    let session = WarehouseSession::connect(project_id, cli.credentials_file)?;
    tracing::debug!("BigQuery service init success.");
    let continue_on_error = !cli.abort_on_error;

    match cli.command {
        Command::Provision {
            dataset_id,
            prefix,
            count,
            ttl_days,
        } => {
            let config = ProvisionConfig::new(dataset_id, prefix, count)
                .with_ttl(Duration::days(ttl_days))
                .with_continue_on_error(continue_on_error);
            let report = session.provision(&config)?;
            Ok(summarize("Provision", &report))
        }
        Command::Expire {
            dataset_id,
            pattern,
            horizon_days,
        } => {
            let config = ExpirationConfig::new(dataset_id)
                .with_pattern(pattern)
                .with_horizon(Duration::days(horizon_days))
                .with_continue_on_error(continue_on_error);
            let report = session.update_expiring(&config)?;
            for entry in &report.succeeded {
                println!("{}", entry.table);
            }
            Ok(summarize("Expire", &report))
        }
    }
}

fn main() -> ExitCode {
    let mut cli = Cli::parse();
    // Global args cannot be marked required, so enforce it here with the
    // usual usage error and exit code.
    let Some(project_id) = cli.project_id.take() else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "--project-id <PROJECT_ID> is required (or set GOOGLE_CLOUD_PROJECT)",
            )
            .exit()
    };
    logging::init(cli.verbose);
    tracing::debug!("Command line args parsed");

    match run(&project_id, cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn expire_defaults_to_shipped_pattern_and_horizon() {
        let cli = Cli::try_parse_from([
            "tablekeeper",
            "--project-id",
            "owox-test-1",
            "expire",
            "--dataset-id",
            "analytics",
        ])
        .unwrap();
        match cli.command {
            Command::Expire {
                pattern,
                horizon_days,
                ..
            } => {
                assert_eq!(pattern, "tmp.+");
                assert_eq!(horizon_days, 14);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.abort_on_error);
    }

    #[test]
    fn provision_requires_count() {
        let result = Cli::try_parse_from([
            "tablekeeper",
            "--project-id",
            "p",
            "provision",
            "--dataset-id",
            "d",
            "--prefix",
            "tmp",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tablekeeper",
            "--project-id",
            "p",
            "provision",
            "--dataset-id",
            "d",
            "--prefix",
            "tmp",
            "--count",
            "3",
            "--credentials-file",
            "/tmp/key.json",
            "--abort-on-error",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.credentials_file, Some(PathBuf::from("/tmp/key.json")));
        assert!(cli.abort_on_error);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn project_id_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tablekeeper",
            "expire",
            "--dataset-id",
            "analytics",
            "--project-id",
            "owox-test-1",
        ])
        .unwrap();
        assert_eq!(cli.project_id.as_deref(), Some("owox-test-1"));
    }
}
