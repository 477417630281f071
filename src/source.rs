use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;

use crate::error::ConvertError;
use crate::mode::ModeConfig;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LineRow {
    pub line_id: String,
    pub line_name: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LocationRow {
    pub location_id: String,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DirectionRow {
    pub direction_id: i64,
    pub direction_name: String,
}

/// One scheduled call. `time` is in seconds after midnight.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StopTimeRow {
    pub line_id: String,
    pub stop_id: String,
    pub run_id: String,
    pub direction: i64,
    pub time: i64,
}

/// Read access to the relational snapshot of one agency.
///
/// `stop_times` must yield rows in the natural storage order of the table:
/// stop order within a trip and midnight rollover are both derived from it.
#[allow(async_fn_in_trait)]
pub trait SourceReader {
    async fn lines(&mut self, config: &ModeConfig) -> Result<Vec<LineRow>, ConvertError>;

    async fn locations(&mut self, config: &ModeConfig) -> Result<Vec<LocationRow>, ConvertError>;

    async fn directions(&mut self, config: &ModeConfig)
        -> Result<Vec<DirectionRow>, ConvertError>;

    /// Names of the per-weekday stop-time tables of the mode, sorted.
    async fn stop_time_tables(&mut self, config: &ModeConfig) -> Result<Vec<String>, ConvertError>;

    async fn stop_times(&mut self, table_name: &str) -> Result<Vec<StopTimeRow>, ConvertError>;
}

pub struct SqliteSource {
    conn: SqliteConnection,
}

fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

impl SqliteSource {
    pub async fn open(path: &Path) -> Result<Self, ConvertError> {
        log::info!("Opening source database {:?}", path);
        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        let conn = SqliteConnection::connect_with(&options).await?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self { conn }
    }
}

impl SourceReader for SqliteSource {
    async fn lines(&mut self, config: &ModeConfig) -> Result<Vec<LineRow>, ConvertError> {
        let sql = format!(
            "SELECT CAST(line_id AS TEXT) AS line_id, COALESCE(line_name, '') AS line_name FROM {}",
            quoted(&config.lines_table())
        );
        Ok(sqlx::query_as::<_, LineRow>(&sql)
            .fetch_all(&mut self.conn)
            .await?)
    }

    async fn locations(&mut self, config: &ModeConfig) -> Result<Vec<LocationRow>, ConvertError> {
        let sql = format!(
            "SELECT CAST(location_id AS TEXT) AS location_id, \
             COALESCE(location_name, '') AS location_name, \
             CAST(latitude AS REAL) AS latitude, CAST(longitude AS REAL) AS longitude \
             FROM {}",
            quoted(&config.locations_table())
        );
        Ok(sqlx::query_as::<_, LocationRow>(&sql)
            .fetch_all(&mut self.conn)
            .await?)
    }

    async fn directions(
        &mut self,
        config: &ModeConfig,
    ) -> Result<Vec<DirectionRow>, ConvertError> {
        let sql = format!(
            "SELECT CAST(direction_id AS INTEGER) AS direction_id, \
             COALESCE(direction_name, '') AS direction_name FROM {}",
            quoted(&config.direction_table())
        );
        Ok(sqlx::query_as::<_, DirectionRow>(&sql)
            .fetch_all(&mut self.conn)
            .await?)
    }

    async fn stop_time_tables(&mut self, config: &ModeConfig) -> Result<Vec<String>, ConvertError> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ? ORDER BY name",
        )
        .bind(config.stop_times_pattern())
        .fetch_all(&mut self.conn)
        .await?)
    }

    async fn stop_times(&mut self, table_name: &str) -> Result<Vec<StopTimeRow>, ConvertError> {
        // No ORDER BY: storage order is the stop order.
        let sql = format!(
            "SELECT CAST(line_id AS TEXT) AS line_id, CAST(stop_id AS TEXT) AS stop_id, \
             CAST(run_id AS TEXT) AS run_id, CAST(direction AS INTEGER) AS direction, \
             CAST(time AS INTEGER) AS time FROM {}",
            quoted(table_name)
        );
        Ok(sqlx::query_as::<_, StopTimeRow>(&sql)
            .fetch_all(&mut self.conn)
            .await?)
    }
}
