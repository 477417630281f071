use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressIterator;

use crate::calendar::{build_calendar, discover_calendars};
use crate::error::ConvertError;
use crate::feed_writer::{check_archive, write_feed_to_path};
use crate::mode::{Mode, ModeConfig, ValidityWindow, AGENCY_TIMEZONE, AGENCY_URL};
use crate::route_namer::name_route;
use crate::schedule::{Agency, Route, Schedule, Stop};
use crate::source::{SourceReader, SqliteSource};
use crate::stop_namer::name_stop;
use crate::trip_assembler::{direction_lookup, AssemblyReport, TripAssembler, TripScope};
use crate::validate::{validate, Finding};

#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    pub mode: Mode,
    pub trip_scope: TripScope,
    pub window: ValidityWindow,
}

impl ConvertOptions {
    pub fn new(mode: Mode) -> Self {
        ConvertOptions {
            mode,
            trip_scope: TripScope::default(),
            window: ValidityWindow::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub calendars: BTreeMap<String, AssemblyReport>,
    pub skipped_calendars: Vec<String>,
}

#[derive(Debug)]
pub struct Conversion {
    pub schedule: Schedule,
    pub build: BuildReport,
    pub findings: Vec<Finding>,
}

impl Conversion {
    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }
}

/// Converts the snapshot at `input` into a feed archive at `output`.
///
/// Inconsistent source data aborts before anything is written. Validation
/// findings never prevent writing; they are returned for the caller to report.
pub async fn convert(input: &Path, output: &Path, options: &ConvertOptions) -> Result<Conversion> {
    let mut source = SqliteSource::open(input)
        .await
        .with_context(|| format!("Could not open {:?}", input))?;
    let (schedule, build) = build_schedule(&mut source, options).await?;

    log::info!("Validating feed.");
    let mut findings = validate(&schedule);
    write_feed_to_path(&schedule, output)
        .with_context(|| format!("Could not write {:?}", output))?;
    findings.extend(check_archive(output));

    Ok(Conversion {
        schedule,
        build,
        findings,
    })
}

pub async fn build_schedule<S: SourceReader>(
    source: &mut S,
    options: &ConvertOptions,
) -> Result<(Schedule, BuildReport)> {
    let config = options.mode.config();
    let mut schedule = Schedule::new();

    schedule.add_agency(Agency {
        id: config.agency_id().to_string(),
        name: config.agency_name.to_string(),
        url: AGENCY_URL.to_string(),
        timezone: AGENCY_TIMEZONE.to_string(),
    })?;

    prepare_routes(source, &config, &mut schedule)
        .await
        .context("Could not prepare routes")?;
    prepare_stops(source, &config, &mut schedule)
        .await
        .context("Could not prepare stops")?;
    let build = prepare_trips(source, &config, options, &mut schedule)
        .await
        .context("Could not prepare trips")?;

    log::info!(
        "Prepared {} routes, {} stops, {} calendars, {} trips and {} stop times",
        schedule.routes.len(),
        schedule.stops.len(),
        schedule.calendars.len(),
        schedule.trips.len(),
        schedule.stop_time_count()
    );
    Ok((schedule, build))
}

async fn prepare_routes<S: SourceReader>(
    source: &mut S,
    config: &ModeConfig,
    schedule: &mut Schedule,
) -> Result<(), ConvertError> {
    log::info!("Preparing routes...");
    for line in source.lines(config).await? {
        let mut name = name_route(config.mode, &line.line_name);
        if name.long_name.is_empty() && name.short_name.is_none() {
            log::warn!("Line {} has no name, using its id", line.line_id);
            name.long_name = line.line_id.clone();
        }
        schedule.add_route(Route {
            id: line.line_id,
            agency_id: config.agency_id().to_string(),
            short_name: name.short_name,
            long_name: name.long_name,
            route_type: config.route_type,
        })?;
    }
    Ok(())
}

async fn prepare_stops<S: SourceReader>(
    source: &mut S,
    config: &ModeConfig,
    schedule: &mut Schedule,
) -> Result<(), ConvertError> {
    log::info!("Preparing stops...");
    for location in source.locations(config).await? {
        let name = name_stop(config.mode, &location.location_name);
        schedule.add_stop(Stop {
            id: location.location_id,
            name: name.name,
            code: name.code,
            latitude: location.latitude,
            longitude: location.longitude,
        })?;
    }
    Ok(())
}

async fn prepare_trips<S: SourceReader>(
    source: &mut S,
    config: &ModeConfig,
    options: &ConvertOptions,
    schedule: &mut Schedule,
) -> Result<BuildReport> {
    log::info!("Preparing trips...");
    let style = indicatif::ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {human_pos:>7}/{human_len:7} {msg}",
    )?;
    let assembler = TripAssembler::new(options.trip_scope);
    let mut build = BuildReport::default();

    for (calendar_id, table_name) in discover_calendars(source, config).await? {
        let calendar = match build_calendar(&calendar_id, options.window) {
            Ok(calendar) => calendar,
            Err(err) => {
                log::error!("Skipping table {}: {}", table_name, err);
                build.skipped_calendars.push(calendar_id);
                continue;
            }
        };
        schedule.add_calendar(calendar)?;

        let directions = direction_lookup(&source.directions(config).await?);
        let rows = source.stop_times(&table_name).await?;
        log::info!("Processing calendar {} ({} rows)", calendar_id, rows.len());

        let report = assembler
            .assemble(
                schedule,
                &calendar_id,
                rows.iter()
                    .progress_with_style(style.clone())
                    .with_message(format!("Assemble trips of {calendar_id}."))
                    .with_finish(indicatif::ProgressFinish::AndLeave),
                &directions,
            )
            .with_context(|| format!("Could not assemble trips from {}", table_name))?;
        if report.rollovers > 0 {
            log::info!(
                "Moved {} stop times of calendar {} past midnight",
                report.rollovers,
                calendar_id
            );
        }
        build.calendars.insert(calendar_id, report);
    }

    Ok(build)
}
