pub mod browser;
pub mod config;
pub mod description;
pub mod error;
pub mod feature;
pub mod job_detail;
pub mod models;
pub mod navigation;
pub mod runner;
pub mod session;
pub mod steps;
pub mod test_log;
pub mod wait;

pub use description::ParsedDescription;
pub use error::{CareersError, Result};
