//! Converts a PTV timetable snapshot (SQLite) into a GTFS archive.

pub mod calendar;
pub mod convert;
pub mod error;
pub mod feed_writer;
pub mod mode;
pub mod route_namer;
pub mod schedule;
pub mod source;
pub mod stop_namer;
pub mod trip_assembler;
pub mod validate;
