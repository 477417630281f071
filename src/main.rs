use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;

use ptv_gtfs::convert::{convert, ConvertOptions};
use ptv_gtfs::mode::{Mode, ValidityWindow};
use ptv_gtfs::trip_assembler::TripScope;
use ptv_gtfs::validate::Severity;

#[derive(Debug, Parser)]
#[command(about = "Convert a PTV timetable database into a GTFS archive")]
struct Cli {
    /// PTV SQLite database file
    #[arg(short = 'f', long = "file")]
    input: PathBuf,

    /// Service to convert
    #[arg(short = 's', long = "service", value_enum)]
    mode: Mode,

    /// Path of the output archive, should end in .zip
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Whether a run id identifies one trip across all calendars or one per calendar
    #[arg(long, value_enum, default_value = "feed")]
    trip_scope: TripScope,

    /// First day of service of every calendar (YYYYMMDD)
    #[arg(long, value_parser = parse_date, default_value = "20140101")]
    start_date: NaiveDate,

    /// Last day of service of every calendar (YYYYMMDD)
    #[arg(long, value_parser = parse_date, default_value = "20141231")]
    end_date: NaiveDate,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|err| format!("{value}: {err}"))
}

impl Cli {
    fn options(&self) -> Result<ConvertOptions> {
        if self.end_date < self.start_date {
            bail!(
                "End date {} is before start date {}",
                self.end_date,
                self.start_date
            );
        }
        Ok(ConvertOptions {
            mode: self.mode,
            trip_scope: self.trip_scope,
            window: ValidityWindow {
                start_date: self.start_date,
                end_date: self.end_date,
            },
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let options = cli.options()?;
    let conversion = convert(&cli.input, &cli.output, &options).await?;

    for finding in &conversion.findings {
        match finding.severity {
            Severity::Warning => log::warn!("{}", finding.message),
            Severity::Error => log::error!("{}", finding.message),
        }
    }
    let errors = conversion.error_count();
    if errors > 0 {
        bail!(
            "{} validation error(s), the feed at {:?} is not publishable",
            errors,
            cli.output
        );
    }
    log::info!("Done.");
    Ok(())
}
