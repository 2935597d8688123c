//! Host boundary - the facts the scheduler reads from the simulation it serves
//!
//! A host adapter implements `CityFacts` over its own data. `CitySnapshot` is
//! a plain in-memory implementation used by headless runs and tests.

use ahash::AHashMap;

use crate::citizen::state::CitizenFacts;
use crate::city::building::BuildingFacts;
use crate::city::units::{CitizenUnitArena, UnitKind};
use crate::core::types::{BuildingId, CitizenId};

/// Read-only building and citizen facts supplied by the host
pub trait CityFacts {
    fn building(&self, id: BuildingId) -> Option<BuildingFacts>;

    fn citizen(&self, id: CitizenId) -> Option<CitizenFacts>;

    /// Citizens the scheduler should update this tick, in a stable order
    fn active_citizens(&self) -> Vec<CitizenId>;

    /// Earliest hour any citizen in the city wakes up, if the host tracks it
    fn earliest_wake_up_hour(&self) -> Option<f32> {
        None
    }
}

/// Occupancy helpers used by admission and targeting decisions
pub trait OccupancyProvider {
    fn has_free_units(&self, building: BuildingId, kind: UnitKind) -> bool;

    fn workforce_count(&self, building: BuildingId) -> u32;
}

impl OccupancyProvider for CitizenUnitArena {
    fn has_free_units(&self, building: BuildingId, kind: UnitKind) -> bool {
        self.free_slots(building, kind) > 0
    }

    fn workforce_count(&self, building: BuildingId) -> u32 {
        self.citizens(building, UnitKind::Work).len() as u32
    }
}

/// In-memory facts table
#[derive(Debug, Clone, Default)]
pub struct CitySnapshot {
    pub buildings: AHashMap<BuildingId, BuildingFacts>,
    pub citizens: AHashMap<CitizenId, CitizenFacts>,
    pub earliest_wake_up_hour: Option<f32>,
}

impl CitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_building(&mut self, id: BuildingId, facts: BuildingFacts) {
        self.buildings.insert(id, facts);
    }

    pub fn set_citizen(&mut self, id: CitizenId, facts: CitizenFacts) {
        self.citizens.insert(id, facts);
    }

    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut BuildingFacts> {
        self.buildings.get_mut(&id)
    }

    pub fn citizen_mut(&mut self, id: CitizenId) -> Option<&mut CitizenFacts> {
        self.citizens.get_mut(&id)
    }

    /// Citizen ids in ascending order
    pub fn citizen_ids(&self) -> Vec<CitizenId> {
        let mut ids: Vec<CitizenId> = self.citizens.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl CityFacts for CitySnapshot {
    fn building(&self, id: BuildingId) -> Option<BuildingFacts> {
        self.buildings.get(&id).copied()
    }

    fn citizen(&self, id: CitizenId) -> Option<CitizenFacts> {
        self.citizens.get(&id).copied()
    }

    fn active_citizens(&self) -> Vec<CitizenId> {
        self.citizen_ids()
    }

    fn earliest_wake_up_hour(&self) -> Option<f32> {
        self.earliest_wake_up_hour
    }
}
