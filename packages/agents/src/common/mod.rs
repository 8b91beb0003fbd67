// Common types and utilities shared across the application

pub mod record;

pub use record::{into_record, Record, RecordExt, RecordId};
