//! Citizens - per-citizen state, schedules and the engine that drives them

pub mod admission;
pub mod engine;
pub mod schedule;
pub mod state;
pub mod state_table;

pub use admission::{AdmissionGuard, AdmissionRejection, VisitPurpose};
pub use engine::{CitizenDecision, CitizenScheduleEngine, ScheduleContext};
pub use schedule::{CitizenSchedule, ScheduleTable};
pub use state::{
    AgeGroup, CitizenFacts, CitizenFlags, Education, Location, ResidentState, ScheduleHint,
    ScheduledState, SchoolClass, SchoolStatus, WorkStatus,
};
pub use state_table::{derive_state, BuildingContext};
