use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};

use crate::error::ConvertError;
use crate::mode::{ModeConfig, ValidityWindow};
use crate::source::SourceReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCalendar {
    pub id: String,
    /// Monday first.
    pub weekdays: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ServiceCalendar {
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        self.weekdays[weekday.num_days_from_monday() as usize]
    }

    pub fn has_service(&self) -> bool {
        self.weekdays.iter().any(|&day| day)
    }
}

fn active_weekdays(calendar_id: &str) -> Option<&'static [Weekday]> {
    use Weekday::*;
    let days: &'static [Weekday] = match calendar_id {
        "monthur" => &[Mon, Tue, Wed, Thu],
        "fri" => &[Fri],
        "monfri" => &[Mon, Tue, Wed, Thu, Fri],
        "sat" => &[Sat],
        "sun" => &[Sun],
        _ => return None,
    };
    Some(days)
}

pub fn build_calendar(
    calendar_id: &str,
    window: ValidityWindow,
) -> Result<ServiceCalendar, ConvertError> {
    let days = active_weekdays(calendar_id)
        .ok_or_else(|| ConvertError::UnknownCalendar(calendar_id.to_string()))?;
    let mut weekdays = [false; 7];
    for day in days {
        weekdays[day.num_days_from_monday() as usize] = true;
    }
    Ok(ServiceCalendar {
        id: calendar_id.to_string(),
        weekdays,
        start_date: window.start_date,
        end_date: window.end_date,
    })
}

/// Maps each calendar id to the stop-time table it is read from. The id is
/// the part of the table name after the last underscore, e.g.
/// `train_stops_monthur` is the `monthur` calendar. Iteration order is the
/// lexicographic order of calendar ids. Two tables resolving to the same id
/// are an error.
pub fn calendar_tables<I, S>(
    table_names: I,
) -> Result<BTreeMap<String, String>, ConvertError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tables: BTreeMap<String, String> = BTreeMap::new();
    for table_name in table_names {
        let table_name = table_name.as_ref();
        let calendar_id = table_name.rsplit('_').next().unwrap_or(table_name);
        if let Some(previous) = tables.get(calendar_id) {
            return Err(ConvertError::DuplicateCalendar {
                calendar_id: calendar_id.to_string(),
                tables: vec![previous.clone(), table_name.to_string()],
            });
        }
        tables.insert(calendar_id.to_string(), table_name.to_string());
    }
    Ok(tables)
}

pub async fn discover_calendars<S: SourceReader>(
    source: &mut S,
    config: &ModeConfig,
) -> Result<BTreeMap<String, String>, ConvertError> {
    let table_names = source.stop_time_tables(config).await?;
    calendar_tables(table_names)
}
