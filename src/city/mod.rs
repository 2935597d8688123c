//! City layer - buildings, unit rosters, work-time policies and their storage

pub mod activity;
pub mod building;
pub mod persistence;
pub mod profiles;
pub mod units;
pub mod work_time;

pub use activity::BuildingActivity;
pub use building::{
    BuildingFacts, BuildingFlags, BuildingKind, BuildingRegistry, BuildingService, RegisteredBuilding,
    SubService,
};
pub use persistence::PersistenceError;
pub use profiles::{
    GlobalProfiles, InstanceRecord, PolicyOrigin, PolicySource, ProfileTarget, ResolvedPolicy,
    WorkTimeProfileStore,
};
pub use units::{CitizenUnitArena, UnitKind};
pub use work_time::{HourWindow, WorkShift, WorkTimePolicy};
