use std::io::{Seek, Write};
use std::path::Path;

use chrono::Weekday;
use gtfs_structures::RouteType;
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::calendar::ServiceCalendar;
use crate::error::ConvertError;
use crate::schedule::{Agency, Route, Schedule, Stop, StopTime, Trip};
use crate::validate::Finding;

/// A row of one of the feed's tables. Fields serialize in `HEADERS` order.
trait Record: Serialize {
    const FILE_NAME: &'static str;
    const HEADERS: &'static [&'static str];
}

#[derive(Serialize)]
struct AgencyRecord<'a> {
    agency_id: &'a str,
    agency_name: &'a str,
    agency_url: &'a str,
    agency_timezone: &'a str,
}

impl Record for AgencyRecord<'_> {
    const FILE_NAME: &'static str = "agency.txt";
    const HEADERS: &'static [&'static str] =
        &["agency_id", "agency_name", "agency_url", "agency_timezone"];
}

#[derive(Serialize)]
struct CalendarRecord<'a> {
    service_id: &'a str,
    monday: u8,
    tuesday: u8,
    wednesday: u8,
    thursday: u8,
    friday: u8,
    saturday: u8,
    sunday: u8,
    start_date: String,
    end_date: String,
}

impl Record for CalendarRecord<'_> {
    const FILE_NAME: &'static str = "calendar.txt";
    const HEADERS: &'static [&'static str] = &[
        "service_id",
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
        "start_date",
        "end_date",
    ];
}

#[derive(Serialize)]
struct RouteRecord<'a> {
    route_id: &'a str,
    agency_id: &'a str,
    route_short_name: Option<&'a str>,
    route_long_name: &'a str,
    route_type: i32,
}

impl Record for RouteRecord<'_> {
    const FILE_NAME: &'static str = "routes.txt";
    const HEADERS: &'static [&'static str] = &[
        "route_id",
        "agency_id",
        "route_short_name",
        "route_long_name",
        "route_type",
    ];
}

#[derive(Serialize)]
struct StopRecord<'a> {
    stop_id: &'a str,
    stop_code: Option<&'a str>,
    stop_name: &'a str,
    stop_lat: f64,
    stop_lon: f64,
}

impl Record for StopRecord<'_> {
    const FILE_NAME: &'static str = "stops.txt";
    const HEADERS: &'static [&'static str] =
        &["stop_id", "stop_code", "stop_name", "stop_lat", "stop_lon"];
}

#[derive(Serialize)]
struct TripRecord<'a> {
    route_id: &'a str,
    service_id: &'a str,
    trip_id: &'a str,
    trip_headsign: &'a str,
}

impl Record for TripRecord<'_> {
    const FILE_NAME: &'static str = "trips.txt";
    const HEADERS: &'static [&'static str] =
        &["route_id", "service_id", "trip_id", "trip_headsign"];
}

#[derive(Serialize)]
struct StopTimeRecord<'a> {
    trip_id: &'a str,
    arrival_time: String,
    departure_time: String,
    stop_id: &'a str,
    stop_sequence: u32,
    pickup_type: u8,
    drop_off_type: u8,
}

impl Record for StopTimeRecord<'_> {
    const FILE_NAME: &'static str = "stop_times.txt";
    const HEADERS: &'static [&'static str] = &[
        "trip_id",
        "arrival_time",
        "departure_time",
        "stop_id",
        "stop_sequence",
        "pickup_type",
        "drop_off_type",
    ];
}

impl<'a> From<&'a Agency> for AgencyRecord<'a> {
    fn from(agency: &'a Agency) -> Self {
        AgencyRecord {
            agency_id: &agency.id,
            agency_name: &agency.name,
            agency_url: &agency.url,
            agency_timezone: &agency.timezone,
        }
    }
}

impl<'a> From<&'a ServiceCalendar> for CalendarRecord<'a> {
    fn from(calendar: &'a ServiceCalendar) -> Self {
        let day = |weekday: Weekday| u8::from(calendar.runs_on(weekday));
        CalendarRecord {
            service_id: &calendar.id,
            monday: day(Weekday::Mon),
            tuesday: day(Weekday::Tue),
            wednesday: day(Weekday::Wed),
            thursday: day(Weekday::Thu),
            friday: day(Weekday::Fri),
            saturday: day(Weekday::Sat),
            sunday: day(Weekday::Sun),
            start_date: calendar.start_date.format("%Y%m%d").to_string(),
            end_date: calendar.end_date.format("%Y%m%d").to_string(),
        }
    }
}

impl<'a> From<&'a Route> for RouteRecord<'a> {
    fn from(route: &'a Route) -> Self {
        RouteRecord {
            route_id: &route.id,
            agency_id: &route.agency_id,
            route_short_name: route.short_name.as_deref(),
            route_long_name: &route.long_name,
            route_type: route_type_code(route.route_type),
        }
    }
}

impl<'a> From<&'a Stop> for StopRecord<'a> {
    fn from(stop: &'a Stop) -> Self {
        StopRecord {
            stop_id: &stop.id,
            stop_code: stop.code.as_deref(),
            stop_name: &stop.name,
            stop_lat: stop.latitude,
            stop_lon: stop.longitude,
        }
    }
}

impl<'a> From<&'a Trip> for TripRecord<'a> {
    fn from(trip: &'a Trip) -> Self {
        TripRecord {
            route_id: &trip.route_id,
            service_id: &trip.calendar_id,
            trip_id: &trip.id,
            trip_headsign: &trip.headsign,
        }
    }
}

impl<'a> StopTimeRecord<'a> {
    fn new(trip: &'a Trip, stop_time: &'a StopTime) -> Self {
        StopTimeRecord {
            trip_id: &trip.id,
            arrival_time: format_time(stop_time.arrival_time),
            departure_time: format_time(stop_time.departure_time),
            stop_id: &stop_time.stop_id,
            stop_sequence: stop_time.stop_sequence,
            pickup_type: 0,
            drop_off_type: 0,
        }
    }
}

pub fn route_type_code(route_type: RouteType) -> i32 {
    match route_type {
        RouteType::Tramway => 0,
        RouteType::Subway => 1,
        RouteType::Rail => 2,
        RouteType::Bus => 3,
        RouteType::Ferry => 4,
        RouteType::CableCar => 5,
        RouteType::Gondola => 6,
        RouteType::Funicular => 7,
        RouteType::Coach => 200,
        RouteType::Air => 1100,
        RouteType::Taxi => 1500,
        RouteType::Other(other) => i32::from(other),
    }
}

/// `HH:MM:SS`, with hours past 23 for service after midnight.
pub fn format_time(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

// Fixed timestamp and entry order keep the archive reproducible.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

fn write_table<W, R, I>(zip: &mut ZipWriter<W>, records: I) -> Result<usize, ConvertError>
where
    W: Write + Seek,
    R: Record,
    I: IntoIterator<Item = R>,
{
    zip.start_file(R::FILE_NAME, entry_options())?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(&mut *zip);
    writer.write_record(R::HEADERS)?;
    let mut count = 0;
    for record in records {
        writer.serialize(record)?;
        count += 1;
    }
    writer.flush()?;
    log::info!("Wrote {} records to {}", count, R::FILE_NAME);
    Ok(count)
}

pub fn write_feed<W: Write + Seek>(schedule: &Schedule, output: W) -> Result<W, ConvertError> {
    let mut zip = ZipWriter::new(output);
    write_table(&mut zip, schedule.agencies.iter().map(AgencyRecord::from))?;
    write_table(&mut zip, schedule.calendars.iter().map(CalendarRecord::from))?;
    write_table(&mut zip, schedule.routes.iter().map(RouteRecord::from))?;
    write_table(&mut zip, schedule.stops.iter().map(StopRecord::from))?;
    write_table(&mut zip, schedule.trips.iter().map(TripRecord::from))?;
    write_table(
        &mut zip,
        schedule.trips.iter().flat_map(|trip| {
            trip.stop_times
                .iter()
                .map(move |stop_time| StopTimeRecord::new(trip, stop_time))
        }),
    )?;
    Ok(zip.finish()?)
}

pub fn write_feed_to_path(schedule: &Schedule, path: &Path) -> Result<(), ConvertError> {
    log::info!("Writing feed to {:?}", path);
    let file = std::fs::File::create(path)?;
    write_feed(schedule, file)?;
    Ok(())
}

/// Reads a written archive back with an independent GTFS reader, which
/// resolves every reference between the tables.
pub fn check_archive(path: &Path) -> Vec<Finding> {
    match gtfs_structures::Gtfs::from_path(path) {
        Ok(gtfs) => {
            log::info!(
                "Archive reads back with {} routes, {} stops and {} trips",
                gtfs.routes.len(),
                gtfs.stops.len(),
                gtfs.trips.len()
            );
            vec![]
        }
        Err(err) => vec![Finding::error(format!(
            "archive {:?} could not be read back: {}",
            path, err
        ))],
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::calendar::build_calendar;
    use crate::mode::ValidityWindow;

    fn schedule() -> Schedule {
        let mut schedule = Schedule::new();
        schedule
            .add_agency(Agency {
                id: "tram".to_string(),
                name: "Yarra Trams".to_string(),
                url: "http://ptv.vic.gov.au".to_string(),
                timezone: "Australia/Melbourne".to_string(),
            })
            .unwrap();
        schedule
            .add_route(Route {
                id: "1".to_string(),
                agency_id: "tram".to_string(),
                short_name: Some("1".to_string()),
                long_name: "East Coburg to South Melbourne Beach".to_string(),
                route_type: RouteType::Tramway,
            })
            .unwrap();
        schedule
            .add_stop(Stop {
                id: "10".to_string(),
                name: "Smith Street".to_string(),
                code: Some("42".to_string()),
                latitude: -37.8,
                longitude: 144.98,
            })
            .unwrap();
        schedule
            .add_stop(Stop {
                id: "20".to_string(),
                name: "Town Hall".to_string(),
                code: None,
                latitude: -37.81,
                longitude: 144.96,
            })
            .unwrap();
        schedule
            .add_calendar(build_calendar("monthur", ValidityWindow::default()).unwrap())
            .unwrap();
        schedule
            .add_trip(Trip {
                id: "900".to_string(),
                route_id: "1".to_string(),
                calendar_id: "monthur".to_string(),
                headsign: "South Melbourne Beach".to_string(),
                stop_times: vec![
                    StopTime {
                        stop_id: "10".to_string(),
                        arrival_time: 83_500,
                        departure_time: 83_500,
                        stop_sequence: 0,
                    },
                    StopTime {
                        stop_id: "20".to_string(),
                        arrival_time: 86_800,
                        departure_time: 86_800,
                        stop_sequence: 1,
                    },
                ],
            })
            .unwrap();
        schedule
    }

    fn read_entry(archive: &[u8], name: &str) -> String {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        let mut content = String::new();
        zip.by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn times_past_midnight_keep_counting_hours() {
        assert_eq!(format_time(0), "00:00:00");
        assert_eq!(format_time(83_500), "23:11:40");
        assert_eq!(format_time(86_800), "24:06:40");
    }

    #[test]
    fn route_type_codes() {
        assert_eq!(route_type_code(RouteType::Tramway), 0);
        assert_eq!(route_type_code(RouteType::Subway), 1);
        assert_eq!(route_type_code(RouteType::Rail), 2);
        assert_eq!(route_type_code(RouteType::Bus), 3);
    }

    #[test]
    fn archive_contains_every_table() {
        let archive = write_feed(&schedule(), Cursor::new(vec![])).unwrap().into_inner();
        let zip = zip::ZipArchive::new(Cursor::new(&archive)).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        for name in [
            "agency.txt",
            "calendar.txt",
            "routes.txt",
            "stops.txt",
            "trips.txt",
            "stop_times.txt",
        ] {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn table_contents() {
        let archive = write_feed(&schedule(), Cursor::new(vec![])).unwrap().into_inner();

        assert_eq!(
            read_entry(&archive, "calendar.txt"),
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             monthur,1,1,1,1,0,0,0,20140101,20141231\n"
        );
        assert_eq!(
            read_entry(&archive, "stops.txt"),
            "stop_id,stop_code,stop_name,stop_lat,stop_lon\n\
             10,42,Smith Street,-37.8,144.98\n\
             20,,Town Hall,-37.81,144.96\n"
        );
        assert_eq!(
            read_entry(&archive, "stop_times.txt"),
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence,pickup_type,drop_off_type\n\
             900,23:11:40,23:11:40,10,0,0,0\n\
             900,24:06:40,24:06:40,20,1,0,0\n"
        );
        assert_eq!(
            read_entry(&archive, "routes.txt"),
            "route_id,agency_id,route_short_name,route_long_name,route_type\n\
             1,tram,1,East Coburg to South Melbourne Beach,0\n"
        );
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let mut schedule = Schedule::new();
        schedule
            .add_agency(Agency {
                id: "bus".to_string(),
                name: "Melbourne Bus".to_string(),
                url: "http://ptv.vic.gov.au".to_string(),
                timezone: "Australia/Melbourne".to_string(),
            })
            .unwrap();
        let archive = write_feed(&schedule, Cursor::new(vec![])).unwrap().into_inner();
        assert_eq!(
            read_entry(&archive, "trips.txt"),
            "route_id,service_id,trip_id,trip_headsign\n"
        );
    }

    #[test]
    fn same_schedule_gives_identical_bytes() {
        let first = write_feed(&schedule(), Cursor::new(vec![])).unwrap().into_inner();
        let second = write_feed(&schedule(), Cursor::new(vec![])).unwrap().into_inner();
        assert_eq!(first, second);
    }

    #[test]
    fn written_archive_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        write_feed_to_path(&schedule(), &path).unwrap();
        assert_eq!(check_archive(&path), vec![]);
    }

    #[test]
    fn unreadable_archive_is_an_error_finding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        let findings = check_archive(&path);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_error());
    }
}
