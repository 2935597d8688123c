//! Simulation boundary - host facts in, scheduling orders out

pub mod host;
pub mod tick;

pub use host::{CityFacts, CitySnapshot, OccupancyProvider};
pub use tick::{RealTimeScheduler, SchedulerEvent};
