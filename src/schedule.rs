use std::collections::HashMap;

use gtfs_structures::RouteType;

use crate::calendar::ServiceCalendar;
use crate::error::ScheduleError;

/// Objects that are looked up by their feed identifier.
pub trait Id {
    const KIND: &'static str;

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub url: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub agency_id: String,
    pub short_name: Option<String>,
    pub long_name: String,
    pub route_type: RouteType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub calendar_id: String,
    pub headsign: String,
    pub stop_times: Vec<StopTime>,
}

/// Times are seconds after midnight of the service day and may exceed 86400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub stop_id: String,
    pub arrival_time: u32,
    pub departure_time: u32,
    pub stop_sequence: u32,
}

impl Id for Agency {
    const KIND: &'static str = "agency";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Id for Route {
    const KIND: &'static str = "route";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Id for Stop {
    const KIND: &'static str = "stop";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Id for Trip {
    const KIND: &'static str = "trip";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Id for ServiceCalendar {
    const KIND: &'static str = "calendar";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Insertion-ordered storage with an index by identifier.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection {
            items: vec![],
            index: HashMap::new(),
        }
    }
}

impl<T: Id> Collection<T> {
    /// Adds an object. An identifier that is already present is rejected and
    /// the stored object is left untouched.
    pub fn insert(&mut self, item: T) -> Result<&mut T, ScheduleError> {
        if self.index.contains_key(item.id()) {
            return Err(ScheduleError::Duplicate {
                kind: T::KIND,
                id: item.id().to_string(),
            });
        }
        let position = self.items.len();
        self.index.insert(item.id().to_string(), position);
        self.items.push(item);
        Ok(&mut self.items[position])
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.index.get(id).map(|&i| &mut self.items[i])
    }

    pub fn require(&self, id: &str) -> Result<&T, ScheduleError> {
        self.get(id).ok_or_else(|| ScheduleError::Unknown {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    pub fn require_mut(&mut self, id: &str) -> Result<&mut T, ScheduleError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.items[i]),
            None => Err(ScheduleError::Unknown {
                kind: T::KIND,
                id: id.to_string(),
            }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// In-memory feed. All entities of a conversion run are owned here and every
/// mutation goes through it.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub agencies: Collection<Agency>,
    pub routes: Collection<Route>,
    pub stops: Collection<Stop>,
    pub calendars: Collection<ServiceCalendar>,
    pub trips: Collection<Trip>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_agency(&mut self, agency: Agency) -> Result<(), ScheduleError> {
        self.agencies.insert(agency).map(|_| ())
    }

    pub fn add_route(&mut self, route: Route) -> Result<(), ScheduleError> {
        self.routes.insert(route).map(|_| ())
    }

    pub fn add_stop(&mut self, stop: Stop) -> Result<(), ScheduleError> {
        self.stops.insert(stop).map(|_| ())
    }

    pub fn add_calendar(&mut self, calendar: ServiceCalendar) -> Result<(), ScheduleError> {
        self.calendars.insert(calendar).map(|_| ())
    }

    pub fn add_trip(&mut self, trip: Trip) -> Result<&mut Trip, ScheduleError> {
        self.trips.insert(trip)
    }

    pub fn route(&self, id: &str) -> Result<&Route, ScheduleError> {
        self.routes.require(id)
    }

    pub fn stop(&self, id: &str) -> Result<&Stop, ScheduleError> {
        self.stops.require(id)
    }

    /// Absence is an ordinary answer here: callers decide between creating
    /// and extending a trip on it.
    pub fn trip_mut(&mut self, id: &str) -> Option<&mut Trip> {
        self.trips.get_mut(id)
    }

    pub fn stop_time_count(&self) -> usize {
        self.trips.iter().map(|trip| trip.stop_times.len()).sum()
    }
}
