pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod report;
pub mod tasks;
pub mod utils;

pub use aggregator::{Aggregator, ResultSnapshot};
pub use dispatcher::{execute, run, start_load_test, WorkPlan};
pub use error::{LoadTestError, Result};
pub use tasks::{HttpTarget, Outcome, Target};
