use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },
    #[error("unknown {kind} id '{id}'")]
    Unknown { kind: &'static str, id: String },
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("calendar '{0}' is not defined")]
    UnknownCalendar(String),
    #[error("calendar '{calendar_id}' is provided by more than one table: {}", .tables.join(", "))]
    DuplicateCalendar {
        calendar_id: String,
        tables: Vec<String>,
    },
    #[error("direction {direction} is not defined (calendar '{calendar_id}')")]
    UnknownDirection { calendar_id: String, direction: i64 },
    #[error("time {time} of run '{run_id}' is not a valid number of seconds")]
    InvalidTime { run_id: String, time: i64 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
