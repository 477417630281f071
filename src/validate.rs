use std::collections::HashSet;
use std::fmt;

use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn warning(message: impl Into<String>) -> Self {
        Finding {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Finding {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Structural checks of a schedule before it is written. Errors mark feeds
/// that consumers will reject; warnings are advisory.
pub fn validate(schedule: &Schedule) -> Vec<Finding> {
    let mut findings = vec![];

    if schedule.agencies.is_empty() {
        findings.push(Finding::error("feed has no agency"));
    }

    for route in schedule.routes.iter() {
        if !schedule.agencies.contains(&route.agency_id) {
            findings.push(Finding::error(format!(
                "route {} references unknown agency {}",
                route.id, route.agency_id
            )));
        }
        if route.long_name.is_empty() && route.short_name.as_deref().unwrap_or("").is_empty() {
            findings.push(Finding::error(format!("route {} has no name", route.id)));
        }
    }

    for stop in schedule.stops.iter() {
        if stop.name.is_empty() {
            findings.push(Finding::error(format!("stop {} has no name", stop.id)));
        }
        if !(-90.0..=90.0).contains(&stop.latitude) || !(-180.0..=180.0).contains(&stop.longitude)
        {
            findings.push(Finding::error(format!(
                "stop {} has invalid coordinates ({}, {})",
                stop.id, stop.latitude, stop.longitude
            )));
        }
    }

    for calendar in schedule.calendars.iter() {
        if !calendar.has_service() {
            findings.push(Finding::warning(format!(
                "calendar {} has no active weekday",
                calendar.id
            )));
        }
    }

    let mut used_routes = HashSet::new();
    let mut used_stops = HashSet::new();
    let mut used_calendars = HashSet::new();

    for trip in schedule.trips.iter() {
        used_routes.insert(trip.route_id.as_str());
        used_calendars.insert(trip.calendar_id.as_str());

        if !schedule.routes.contains(&trip.route_id) {
            findings.push(Finding::error(format!(
                "trip {} references unknown route {}",
                trip.id, trip.route_id
            )));
        }
        if !schedule.calendars.contains(&trip.calendar_id) {
            findings.push(Finding::error(format!(
                "trip {} references unknown calendar {}",
                trip.id, trip.calendar_id
            )));
        }
        if trip.stop_times.len() < 2 {
            findings.push(Finding::warning(format!(
                "trip {} has {} stop time(s)",
                trip.id,
                trip.stop_times.len()
            )));
        }

        for (expected, stop_time) in trip.stop_times.iter().enumerate() {
            used_stops.insert(stop_time.stop_id.as_str());
            if !schedule.stops.contains(&stop_time.stop_id) {
                findings.push(Finding::error(format!(
                    "trip {} references unknown stop {}",
                    trip.id, stop_time.stop_id
                )));
            }
            if stop_time.stop_sequence as usize != expected {
                findings.push(Finding::error(format!(
                    "trip {} has stop sequence {} at position {}",
                    trip.id, stop_time.stop_sequence, expected
                )));
            }
        }

        for pair in trip.stop_times.windows(2) {
            if pair[1].arrival_time < pair[0].departure_time {
                findings.push(Finding::error(format!(
                    "trip {} goes back in time at stop sequence {}",
                    trip.id, pair[1].stop_sequence
                )));
            }
        }
    }

    for route in schedule.routes.iter() {
        if !used_routes.contains(route.id.as_str()) {
            findings.push(Finding::warning(format!("route {} has no trips", route.id)));
        }
    }
    for stop in schedule.stops.iter() {
        if !used_stops.contains(stop.id.as_str()) {
            findings.push(Finding::warning(format!("stop {} is never visited", stop.id)));
        }
    }
    for calendar in schedule.calendars.iter() {
        if !used_calendars.contains(calendar.id.as_str()) {
            findings.push(Finding::warning(format!(
                "calendar {} has no trips",
                calendar.id
            )));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::build_calendar;
    use crate::mode::ValidityWindow;
    use crate::schedule::{Agency, Route, Stop, StopTime, Trip};
    use gtfs_structures::RouteType;

    fn stop_time(stop_id: &str, time: u32, stop_sequence: u32) -> StopTime {
        StopTime {
            stop_id: stop_id.to_string(),
            arrival_time: time,
            departure_time: time,
            stop_sequence,
        }
    }

    fn valid_schedule() -> Schedule {
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
        for id in ["10", "20"] {
            schedule
                .add_stop(Stop {
                    id: id.to_string(),
                    name: format!("Stop {id}"),
                    code: Some(id.to_string()),
                    latitude: -37.8,
                    longitude: 144.9,
                })
                .unwrap();
        }
        schedule
            .add_calendar(build_calendar("sat", ValidityWindow::default()).unwrap())
            .unwrap();
        schedule
            .add_trip(Trip {
                id: "900".to_string(),
                route_id: "1".to_string(),
                calendar_id: "sat".to_string(),
                headsign: "City".to_string(),
                stop_times: vec![stop_time("10", 100, 0), stop_time("20", 200, 1)],
            })
            .unwrap();
        schedule
    }

    #[test]
    fn clean_schedule_has_no_findings() {
        assert_eq!(validate(&valid_schedule()), vec![]);
    }

    #[test]
    fn missing_agency_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.agencies = Default::default();
        let findings = validate(&schedule);
        assert!(findings.contains(&Finding::error("feed has no agency")));
        assert!(findings.contains(&Finding::error(
            "route 1 references unknown agency tram"
        )));
    }

    #[test]
    fn backwards_time_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.trip_mut("900").unwrap().stop_times[1].arrival_time = 50;
        let findings = validate(&schedule);
        assert_eq!(
            findings,
            vec![Finding::error(
                "trip 900 goes back in time at stop sequence 1"
            )]
        );
    }

    #[test]
    fn sequence_gap_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.trip_mut("900").unwrap().stop_times[1].stop_sequence = 2;
        assert_eq!(
            validate(&schedule),
            vec![Finding::error("trip 900 has stop sequence 2 at position 1")]
        );
    }

    #[test]
    fn trip_with_unknown_route_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.trip_mut("900").unwrap().route_id = "99".to_string();
        assert_eq!(
            validate(&schedule),
            vec![
                Finding::error("trip 900 references unknown route 99"),
                Finding::warning("route 1 has no trips"),
            ]
        );
    }

    #[test]
    fn trip_with_unknown_calendar_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.trip_mut("900").unwrap().calendar_id = "wed".to_string();
        assert_eq!(
            validate(&schedule),
            vec![
                Finding::error("trip 900 references unknown calendar wed"),
                Finding::warning("calendar sat has no trips"),
            ]
        );
    }

    #[test]
    fn trip_with_unknown_stop_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.trip_mut("900").unwrap().stop_times[1].stop_id = "77".to_string();
        assert_eq!(
            validate(&schedule),
            vec![
                Finding::error("trip 900 references unknown stop 77"),
                Finding::warning("stop 20 is never visited"),
            ]
        );
    }

    #[test]
    fn unnamed_route_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.routes = Default::default();
        schedule
            .add_route(Route {
                id: "1".to_string(),
                agency_id: "tram".to_string(),
                short_name: Some(String::new()),
                long_name: String::new(),
                route_type: RouteType::Tramway,
            })
            .unwrap();
        assert_eq!(
            validate(&schedule),
            vec![Finding::error("route 1 has no name")]
        );
    }

    #[test]
    fn unnamed_stop_is_an_error() {
        let mut schedule = valid_schedule();
        schedule.stops = Default::default();
        for (id, name) in [("10", ""), ("20", "Stop 20")] {
            schedule
                .add_stop(Stop {
                    id: id.to_string(),
                    name: name.to_string(),
                    code: None,
                    latitude: -37.8,
                    longitude: 144.9,
                })
                .unwrap();
        }
        assert_eq!(
            validate(&schedule),
            vec![Finding::error("stop 10 has no name")]
        );
    }

    #[test]
    fn calendar_without_weekdays_is_a_warning() {
        let mut schedule = valid_schedule();
        let mut calendar = build_calendar("sun", ValidityWindow::default()).unwrap();
        calendar.weekdays = [false; 7];
        schedule.add_calendar(calendar).unwrap();
        assert_eq!(
            validate(&schedule),
            vec![
                Finding::warning("calendar sun has no active weekday"),
                Finding::warning("calendar sun has no trips"),
            ]
        );
    }

    #[test]
    fn unused_entities_are_warnings() {
        let mut schedule = valid_schedule();
        schedule
            .add_stop(Stop {
                id: "30".to_string(),
                name: "Lonely".to_string(),
                code: None,
                latitude: -37.8,
                longitude: 144.9,
            })
            .unwrap();
        schedule
            .add_calendar(build_calendar("sun", ValidityWindow::default()).unwrap())
            .unwrap();

        let findings = validate(&schedule);
        assert_eq!(
            findings,
            vec![
                Finding::warning("stop 30 is never visited"),
                Finding::warning("calendar sun has no trips"),
            ]
        );
        assert!(!findings.iter().any(Finding::is_error));
    }

    #[test]
    fn short_trip_and_bad_coordinates() {
        let mut schedule = valid_schedule();
        schedule.trip_mut("900").unwrap().stop_times.truncate(1);
        schedule.stops = Default::default();
        schedule
            .add_stop(Stop {
                id: "10".to_string(),
                name: "Stop 10".to_string(),
                code: None,
                latitude: 137.8,
                longitude: 144.9,
            })
            .unwrap();

        let findings = validate(&schedule);
        assert!(findings.contains(&Finding::error(
            "stop 10 has invalid coordinates (137.8, 144.9)"
        )));
        assert!(findings.contains(&Finding::warning("trip 900 has 1 stop time(s)")));
    }

    #[test]
    fn finding_display() {
        assert_eq!(
            Finding::warning("route 4 has no trips").to_string(),
            "warning: route 4 has no trips"
        );
    }
}
