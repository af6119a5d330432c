///
/// This module implements the CLI interface for iofxml: command parsing,
/// argument validation, and the async entrypoint shared by `main` and the
/// integration tests.
///
/// All merge and resolution logic lives in the [`iofxml-core`] crate. This
/// module only wires configuration, the terminal prompt and console output
/// around it.
///
/// ## Commands
/// - `winsplits [--date YYYY-MM-DD] [--output-dir DIR]`: pick an event and a
///   class interactively and download its IOF-XML result
/// - `merge <base> <supplement>... <output>`: append every supplement's
///   person results to the base's class result and write `<output>`
///
/// [`iofxml-core`]: ../../iofxml-core/
use crate::load_config::load_config;
use crate::prompt::TerminalSelector;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use iofxml_core::acquire::Acquisition;
use iofxml_core::catalog::WinsplitsClient;
use iofxml_core::merge::merge;
use iofxml_core::output::write_atomic;
use std::path::{Path, PathBuf};

/// CLI for iofxml: fetch and merge IOF-XML split times.
#[derive(Parser)]
#[clap(
    name = "iofxml",
    version,
    about = "Download Winsplits split times as IOF-XML and merge result files"
)]
pub struct Cli {
    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactively download split times from Winsplits
    Winsplits {
        /// Event date as YYYY-MM-DD (defaults to today)
        #[clap(long)]
        date: Option<NaiveDate>,

        /// Directory the downloaded file is written to
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },
    /// Merge split times files: <base> <supplement>... <output>
    Merge {
        /// Base file, one or more supplements, then the output path
        #[clap(required = true, num_args = 3.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },
}

/// Split merge positionals into base, supplements and output.
pub fn split_merge_args(files: &[PathBuf]) -> Result<(&Path, &[PathBuf], &Path)> {
    match files {
        [base, supplements @ .., output] if !supplements.is_empty() => {
            Ok((base.as_path(), supplements, output.as_path()))
        }
        _ => anyhow::bail!(
            "merge requires at least 2 input files and 1 output file\nUsage: iofxml merge <input1> [input2...] <output>"
        ),
    }
}

/// The requested date, or the UTC calendar date of `now`.
fn event_date(requested: Option<NaiveDate>, now: DateTime<Utc>) -> NaiveDate {
    requested.unwrap_or_else(|| now.date_naive())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Winsplits { date, output_dir } => {
            let date = event_date(date, Utc::now());
            let output_dir = output_dir.unwrap_or(config.download.output_dir);
            tracing::info!(command = "winsplits", %date, "Starting acquisition");
            println!(
                "Fetching events from Winsplits on {}",
                date.format("%a %b %d %Y")
            );

            let catalog = WinsplitsClient::new(config.remote);
            let selector = TerminalSelector::default();
            let path = Acquisition::new(&catalog, &selector, output_dir)
                .run(date)
                .await?;

            println!("IOF XML split times file downloaded: {}", path.display());
            Ok(())
        }
        Commands::Merge { files } => {
            let (base, supplements, output) = split_merge_args(&files)?;
            tracing::info!(command = "merge", output = %output.display(), "Starting merge");

            let (document, report) = merge(base, supplements)?;
            write_atomic(output, &document.serialize())?;

            println!(
                "Merged {} person results into {}",
                report.total_records(),
                output.display()
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_base_supplements_and_output() {
        let files: Vec<PathBuf> = ["a.xml", "b.xml", "c.xml", "out.xml"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let (base, supplements, output) = split_merge_args(&files).unwrap();
        assert_eq!(base, Path::new("a.xml"));
        assert_eq!(supplements, &files[1..3]);
        assert_eq!(output, Path::new("out.xml"));
    }

    #[test]
    fn rejects_too_few_merge_paths() {
        let files = vec![PathBuf::from("a.xml"), PathBuf::from("out.xml")];
        assert!(split_merge_args(&files).is_err());
    }

    #[test]
    fn parses_date_and_merge_arguments() {
        let cli = Cli::try_parse_from(["iofxml", "winsplits", "--date", "2025-09-01"]).unwrap();
        match cli.command {
            Commands::Winsplits { date, .. } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 1));
            }
            Commands::Merge { .. } => panic!("expected winsplits"),
        }

        assert!(Cli::try_parse_from(["iofxml", "winsplits", "--date", "1st of May"]).is_err());
        assert!(Cli::try_parse_from(["iofxml", "merge", "a.xml", "out.xml"]).is_err());
    }

    #[test]
    fn default_date_is_the_utc_day() {
        let late = DateTime::parse_from_rfc3339("2025-09-01T23:30:00-05:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(event_date(None, late), NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());

        let chosen = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(event_date(Some(chosen), late), chosen);
    }
}
