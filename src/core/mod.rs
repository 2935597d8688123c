pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use calendar::{DayPeriod, SimulatedClock, Weekday};
pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
