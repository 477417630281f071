use chrono::NaiveDate;
use gtfs_structures::RouteType;

pub const AGENCY_URL: &str = "http://ptv.vic.gov.au";
pub const AGENCY_TIMEZONE: &str = "Australia/Melbourne";

/// Transport modes present in the source snapshot. Each mode lives in its own
/// set of tables and carries its own naming rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Mode {
    Train,
    Tram,
    Bus,
    Vline,
}

#[derive(Debug, Clone)]
pub struct ModeConfig {
    pub mode: Mode,
    pub agency_name: &'static str,
    pub table_prefix: &'static str,
    pub route_type: RouteType,
}

impl Mode {
    pub fn config(self) -> ModeConfig {
        let (agency_name, table_prefix, route_type) = match self {
            Mode::Train => ("Metro Trains", "train", RouteType::Subway),
            Mode::Tram => ("Yarra Trams", "tram", RouteType::Tramway),
            Mode::Bus => ("Melbourne Bus", "bus", RouteType::Bus),
            Mode::Vline => ("V/Line", "vline", RouteType::Rail),
        };
        ModeConfig {
            mode: self,
            agency_name,
            table_prefix,
            route_type,
        }
    }
}

impl ModeConfig {
    pub fn agency_id(&self) -> &'static str {
        self.table_prefix
    }

    pub fn lines_table(&self) -> String {
        format!("{}_lines", self.table_prefix)
    }

    pub fn locations_table(&self) -> String {
        format!("{}_locations", self.table_prefix)
    }

    pub fn direction_table(&self) -> String {
        format!("{}_direction", self.table_prefix)
    }

    pub fn stop_times_pattern(&self) -> String {
        format!("{}_stops%", self.table_prefix)
    }
}

/// Date range every service calendar of a run is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Default for ValidityWindow {
    fn default() -> Self {
        ValidityWindow {
            start_date: NaiveDate::from_ymd_opt(2014, 1, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2014, 12, 31).expect("valid date"),
        }
    }
}
