#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the admission list converter.
//!
//! Reads the configured admission lists from the links file, downloads each
//! PDF into the download cache and writes one CSV per list.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr as _;
use std::time::Instant;

use chamadas_admission_models::Institution;
use chamadas_cli_utils::IndicatifProgress;
use chamadas_convert::{Converter, Directories, filter_jobs};
use chamadas_fetch::{Fetcher, HttpSource, RetryPolicy};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chamadas",
    about = "Converts university admission list PDFs into CSV",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Options of `run`, used when no subcommand is given
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every configured admission list and convert it to CSV
    Run(RunArgs),
    /// List configured admission lists and the files they use
    Jobs(PathArgs),
}

#[derive(Args, Clone)]
struct PathArgs {
    /// Links file mapping institution and period to a PDF URL
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    /// Directory holding the `tabula-{INSTITUTION}_{period}.json` layouts
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,
    /// Download cache for the PDFs
    #[arg(long, default_value = "downloads")]
    downloads_dir: PathBuf,
    /// Destination of the CSVs
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

impl PathArgs {
    fn directories(&self) -> Directories {
        Directories {
            config_dir: self.config_dir.clone(),
            downloads_dir: self.downloads_dir.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Args, Clone)]
struct RunArgs {
    #[command(flatten)]
    paths: PathArgs,
    /// Retries for timeouts, connection failures, HTTP 429 and 5xx
    #[arg(long, default_value = "0")]
    retries: u32,
    /// Comma-separated list of institutions to convert (e.g., "UFMG,UFRJ")
    #[arg(long)]
    only: Option<String>,
}

fn parse_institutions(list: &str) -> Result<Vec<Institution>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            Institution::from_str(code).map_err(|_| {
                let known: Vec<String> = Institution::ALL.iter().map(ToString::to_string).collect();
                format!("unknown institution {code:?} (known: {})", known.join(", "))
            })
        })
        .collect()
}

async fn run(args: RunArgs, multi: &chamadas_cli_utils::MultiProgress) -> ExitCode {
    let start = Instant::now();

    let jobs = match chamadas_layout::load_jobs(&args.paths.config) {
        Ok(jobs) => jobs,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let jobs = match args.only.as_deref().map(parse_institutions).transpose() {
        Ok(only) => filter_jobs(jobs, only.as_deref().unwrap_or_default()),
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if jobs.is_empty() {
        log::warn!("No admission lists configured in {}", args.paths.config.display());
        return ExitCode::SUCCESS;
    }

    let source = match HttpSource::new() {
        Ok(source) => source,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let fetcher = Fetcher::new(source).with_retry(RetryPolicy::new(
        args.retries,
        RetryPolicy::DEFAULT_BASE_DELAY,
    ));
    let converter = Converter::new(fetcher, args.paths.directories());

    log::info!("Converting {} admission list(s)", jobs.len());

    let progress = IndicatifProgress::jobs_bar(multi, "Admission lists");
    let report = converter.run_all(&jobs, &*progress).await;

    report.log_summary();
    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn list_jobs(args: &PathArgs) -> ExitCode {
    let jobs = match chamadas_layout::load_jobs(&args.config) {
        Ok(jobs) => jobs,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let dirs = args.directories();

    println!("{:<16} {:<40} URL", "JOB", "LAYOUT");
    println!("{}", "-".repeat(80));
    for job in &jobs {
        println!(
            "{:<16} {:<40} {}",
            job.to_string(),
            job.layout_path(&dirs.config_dir).display().to_string(),
            job.url
        );
    }
    println!();
    println!("{} admission list(s)", jobs.len());

    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let multi = chamadas_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(cli.run)) {
        Commands::Run(args) => run(args, &multi).await,
        Commands::Jobs(args) => list_jobs(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_run() {
        let cli = Cli::parse_from(["chamadas"]);
        assert!(cli.command.is_none());

        let args = cli.run;
        assert_eq!(args.paths.config, PathBuf::from("config.json"));
        assert_eq!(args.paths.config_dir, PathBuf::from("config"));
        assert_eq!(args.retries, 0);
        assert!(args.only.is_none());
    }

    #[test]
    fn run_accepts_directories_and_filters() {
        let cli = Cli::parse_from([
            "chamadas",
            "run",
            "--output-dir",
            "out",
            "--retries",
            "2",
            "--only",
            "UFMG,UFRJ",
        ]);

        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.paths.output_dir, PathBuf::from("out"));
        assert_eq!(args.retries, 2);
        assert_eq!(
            parse_institutions(args.only.as_deref().unwrap()).unwrap(),
            vec![Institution::Ufmg, Institution::Ufrj]
        );
    }

    #[test]
    fn unknown_institution_is_rejected() {
        let err = parse_institutions("UFMG, USP").unwrap_err();
        assert!(err.contains("USP"));
    }

    #[test]
    fn top_level_options_apply_to_the_default_run() {
        let cli = Cli::parse_from(["chamadas", "--only", "UFF"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.run.only.as_deref(), Some("UFF"));
    }

    #[test]
    fn jobs_takes_the_links_file() {
        let cli = Cli::parse_from(["chamadas", "jobs", "--config", "links.json"]);
        let Some(Commands::Jobs(args)) = cli.command else {
            panic!("expected jobs");
        };
        assert_eq!(args.config, PathBuf::from("links.json"));
    }
}
