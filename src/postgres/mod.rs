//! Postgres backend: bb8 manager, parameter encoding and row decoding.

pub mod manager;
pub mod params;
pub mod query;

pub use manager::PgManager;
pub use query::{build_result_set_from_rows, postgres_extract_value};
