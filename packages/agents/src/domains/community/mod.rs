//! Rows of the shared community database, as the stages read them.

pub mod models;

pub use models::*;
