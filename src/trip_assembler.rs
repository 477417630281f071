use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::ConvertError;
use crate::schedule::{Schedule, StopTime, Trip};
use crate::source::{DirectionRow, StopTimeRow};

pub const SECONDS_PER_DAY: u32 = 86_400;

/// How run identifiers map to trips when the same run appears in several
/// calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TripScope {
    /// Trip id is the run id. A run found in a second calendar is appended to
    /// the trip created by the first one.
    #[default]
    #[value(name = "feed")]
    FeedWide,
    /// Trip id is `{run_id}-{calendar_id}`.
    #[value(name = "calendar")]
    PerCalendar,
}

impl TripScope {
    pub fn trip_id(self, run_id: &str, calendar_id: &str) -> String {
        match self {
            TripScope::FeedWide => run_id.to_string(),
            TripScope::PerCalendar => format!("{run_id}-{calendar_id}"),
        }
    }
}

pub type DirectionLookup = HashMap<i64, String>;

pub fn direction_lookup(rows: &[DirectionRow]) -> DirectionLookup {
    rows.iter()
        .map(|row| (row.direction_id, row.direction_name.clone()))
        .collect()
}

/// State carried from one stop-time row to the next within a calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyState {
    pub last_time: u32,
    pub last_trip_id: Option<String>,
}

impl AssemblyState {
    /// Returns the state for the following row together with the service-day
    /// time of this one. A time earlier than the previous row of the same trip
    /// has crossed midnight and is moved into the next day.
    pub fn next(self, trip_id: &str, raw_time: u32) -> (AssemblyState, u32) {
        let same_trip = self.last_trip_id.as_deref() == Some(trip_id);
        let time = if same_trip && raw_time < self.last_time {
            raw_time + SECONDS_PER_DAY
        } else {
            raw_time
        };
        let last_trip_id = if same_trip {
            self.last_trip_id
        } else {
            Some(trip_id.to_string())
        };
        (
            AssemblyState {
                last_time: time,
                last_trip_id,
            },
            time,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub rows: usize,
    pub trips_created: usize,
    pub rollovers: usize,
    /// Trips whose rows were interleaved with another trip's rows.
    pub non_contiguous: BTreeSet<String>,
    /// Trips first created by an earlier calendar and extended by this one.
    pub merged_across_calendars: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TripAssembler {
    pub scope: TripScope,
}

impl TripAssembler {
    pub fn new(scope: TripScope) -> Self {
        TripAssembler { scope }
    }

    /// Turns the stop-time rows of one calendar into trips on `schedule`.
    ///
    /// Rows must arrive in storage order and the rows of a trip must be
    /// contiguous. Interleaved trips are reported in the returned
    /// [`AssemblyReport`]; their rollover may be wrong.
    ///
    /// Fails on the first row that references an unknown route, stop or
    /// direction.
    pub fn assemble<'a, I>(
        &self,
        schedule: &mut Schedule,
        calendar_id: &str,
        rows: I,
        directions: &DirectionLookup,
    ) -> Result<AssemblyReport, ConvertError>
    where
        I: IntoIterator<Item = &'a StopTimeRow>,
    {
        let mut report = AssemblyReport::default();
        let mut state = AssemblyState::default();
        let mut finished_trips = HashSet::new();

        for row in rows {
            let route_id = schedule.route(&row.line_id)?.id.clone();
            let stop_id = schedule.stop(&row.stop_id)?.id.clone();
            let headsign =
                directions
                    .get(&row.direction)
                    .ok_or_else(|| ConvertError::UnknownDirection {
                        calendar_id: calendar_id.to_string(),
                        direction: row.direction,
                    })?;
            let raw_time = u32::try_from(row.time)
                .ok()
                .filter(|time| time.checked_add(SECONDS_PER_DAY).is_some())
                .ok_or_else(|| ConvertError::InvalidTime {
                    run_id: row.run_id.clone(),
                    time: row.time,
                })?;
            let trip_id = self.scope.trip_id(&row.run_id, calendar_id);

            if let Some(previous) = state.last_trip_id.as_deref() {
                if previous != trip_id {
                    finished_trips.insert(previous.to_string());
                    if finished_trips.contains(&trip_id)
                        && report.non_contiguous.insert(trip_id.clone())
                    {
                        log::warn!(
                            "Rows of trip {} are not contiguous in calendar '{}'",
                            trip_id,
                            calendar_id
                        );
                    }
                }
            }

            let (next_state, time) = state.next(&trip_id, raw_time);
            state = next_state;
            if time != raw_time {
                report.rollovers += 1;
            }

            if schedule.trip_mut(&trip_id).is_none() {
                schedule.add_trip(Trip {
                    id: trip_id.clone(),
                    route_id,
                    calendar_id: calendar_id.to_string(),
                    headsign: headsign.clone(),
                    stop_times: vec![],
                })?;
                report.trips_created += 1;
            }
            let trip = schedule.trips.require_mut(&trip_id)?;
            if trip.calendar_id != calendar_id
                && report.merged_across_calendars.insert(trip_id.clone())
            {
                log::warn!(
                    "Trip {} of calendar '{}' is merged into calendar '{}'",
                    trip_id,
                    calendar_id,
                    trip.calendar_id
                );
            }

            let stop_sequence = trip.stop_times.len() as u32;
            trip.stop_times.push(StopTime {
                stop_id,
                arrival_time: time,
                departure_time: time,
                stop_sequence,
            });
            report.rows += 1;
        }

        Ok(report)
    }
}
