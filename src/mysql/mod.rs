//! `MySQL` backend: bb8 manager over `mysql_async` connections.

pub mod manager;
pub mod params;
pub mod query;

pub use manager::MyManager;
pub use query::{build_result_set, mysql_extract_value};
