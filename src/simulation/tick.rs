//! Scheduler facade - owns every scheduling component and runs one tick
//!
//! The host adapter holds one `RealTimeScheduler`, forwards building
//! lifecycle hooks to it, and calls `tick` once per simulation frame with the
//! clock and a `CityFacts` view. Each tick runs the event calendar, then hotel
//! check-outs, then every active citizen, and returns the resulting orders as
//! `SchedulerEvent`s.

use std::path::Path;

use serde::Serialize;

use crate::citizen::engine::{CitizenDecision, CitizenScheduleEngine, ScheduleContext};
use crate::citizen::schedule::CitizenSchedule;
use crate::city::activity::BuildingActivity;
use crate::city::building::{BuildingFacts, BuildingRegistry, RegisteredBuilding};
use crate::city::persistence;
use crate::city::profiles::{GlobalProfiles, ProfileTarget, ResolvedPolicy, WorkTimeProfileStore};
use crate::city::units::{CitizenUnitArena, UnitKind};
use crate::city::work_time::WorkTimePolicy;
use crate::core::calendar::SimulatedClock;
use crate::core::config::SchedulerConfig;
use crate::core::error::{Result, SchedulerError};
use crate::core::types::{ArchetypeKey, BuildingId, CitizenId, EventId, Frame};
use crate::events::city_event::{CityEvent, EventKind, EventState};
use crate::events::hotel::{BookingRejection, HotelBookings};
use crate::events::manager::{EventManager, EventNotice};
use crate::simulation::host::CityFacts;

/// Output of a scheduler tick, consumed by the host adapter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SchedulerEvent {
    Event(EventNotice),
    Citizen(CitizenDecision),
    HotelCheckOut { citizen: CitizenId, hotel: BuildingId },
}

pub struct RealTimeScheduler {
    config: SchedulerConfig,
    profiles: WorkTimeProfileStore,
    registry: BuildingRegistry,
    units: CitizenUnitArena,
    engine: CitizenScheduleEngine,
    events: EventManager,
    hotels: HotelBookings,
}

impl RealTimeScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_globals(config, GlobalProfiles::new())
    }

    pub fn with_globals(config: SchedulerConfig, globals: GlobalProfiles) -> Self {
        Self {
            profiles: WorkTimeProfileStore::with_globals(globals),
            registry: BuildingRegistry::new(),
            units: CitizenUnitArena::new(config.citizens.max_unit_walk),
            engine: CitizenScheduleEngine::new(config.citizens.seed),
            events: EventManager::new(config.events.clone()),
            hotels: HotelBookings::new(config.events.hotel.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn profiles(&self) -> &WorkTimeProfileStore {
        &self.profiles
    }

    pub fn registry(&self) -> &BuildingRegistry {
        &self.registry
    }

    pub fn units(&self) -> &CitizenUnitArena {
        &self.units
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn hotels(&self) -> &HotelBookings {
        &self.hotels
    }

    /// Activity view without the city-wide wake-up statistic
    pub fn activity(&self) -> BuildingActivity<'_> {
        BuildingActivity::new(&self.config, &self.profiles, &self.registry, &self.units)
    }

    // ---- building lifecycle ----

    /// Register a constructed or loaded building and give it an instance record
    pub fn register_building(
        &mut self,
        id: BuildingId,
        archetype: ArchetypeKey,
        facts: &BuildingFacts,
        campus_area: Option<u16>,
    ) -> &RegisteredBuilding {
        let building = self.registry.register(id, archetype, facts, campus_area);
        if self.profiles.ensure_instance(building) {
            tracing::debug!("Created default work-time record for {}", id);
        }
        building
    }

    /// Forget a destroyed building: its instance record, units and hotel stays
    pub fn release_building(&mut self, id: BuildingId) -> bool {
        let Some(building) = self.registry.release(id) else {
            return false;
        };
        self.profiles.remove(id);
        self.units.release_building(id);
        let guests = self.hotels.release_hotel(id);
        tracing::debug!(
            "Released {} ({}), {} hotel guests dropped",
            id,
            building.archetype,
            guests.len()
        );
        true
    }

    pub fn allocate_units(&mut self, building: BuildingId, kind: UnitKind, count: usize) -> Result<()> {
        if !self.registry.contains(building) {
            return Err(SchedulerError::UnknownBuilding(building));
        }
        self.units.allocate(building, kind, count);
        Ok(())
    }

    /// Put a citizen on a building roster; false when every unit is full
    pub fn place_citizen(&mut self, building: BuildingId, kind: UnitKind, citizen: CitizenId) -> bool {
        self.units.add_citizen(building, kind, citizen)
    }

    pub fn remove_citizen(&mut self, building: BuildingId, citizen: CitizenId) -> bool {
        self.units.remove_citizen(building, citizen)
    }

    /// Drop every trace of a citizen who left the city
    pub fn forget_citizen(&mut self, citizen: CitizenId) {
        self.engine.forget(citizen);
        if let Some(stay) = self.hotels.check_out(citizen) {
            self.units.remove_citizen(stay.hotel, citizen);
        }
    }

    // ---- work-time profiles ----

    pub fn policy(&self, building: BuildingId) -> ResolvedPolicy {
        self.activity().policy(building)
    }

    pub fn set_policy(&mut self, target: ProfileTarget, policy: WorkTimePolicy) {
        self.profiles.set(target, policy);
    }

    /// Re-derive every unlocked instance of an archetype from its templates
    pub fn bulk_reset(&mut self, archetype: &ArchetypeKey, include_global: bool) -> usize {
        let removed = self.profiles.bulk_reset(archetype, include_global, &self.registry);
        let rebuilt: Vec<BuildingId> = self.registry.with_archetype(archetype).map(|b| b.id).collect();
        for id in rebuilt {
            if let Some(building) = self.registry.get(id) {
                self.profiles.ensure_instance(building);
            }
        }
        removed
    }

    /// Serialize the per-save records at the current format version
    pub fn save_profiles(&mut self) -> Vec<u8> {
        self.profiles.take_dirty();
        persistence::encode(&self.profiles)
    }

    /// Replace the per-save records; a corrupt stream leaves them empty
    pub fn load_profiles(&mut self, bytes: &[u8]) -> Result<()> {
        if let Err(err) = persistence::decode_into(&mut self.profiles, bytes) {
            tracing::warn!("Discarded unreadable work-time records: {}", err);
            return Err(err.into());
        }
        let registered: Vec<BuildingId> = self.registry.iter().map(|b| b.id).collect();
        for id in registered {
            if let Some(building) = self.registry.get(id) {
                self.profiles.ensure_instance(building);
            }
        }
        tracing::info!(
            "Loaded {} instance and {} prefab work-time records",
            self.profiles.instance_count(),
            self.profiles.prefab_count()
        );
        Ok(())
    }

    pub fn load_global_profiles(&mut self, path: &Path) -> Result<()> {
        *self.profiles.globals_mut() = GlobalProfiles::load_from_toml(path)?;
        tracing::info!("Loaded {} global work-time records", self.profiles.globals().len());
        Ok(())
    }

    pub fn save_global_profiles(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.profiles.globals().to_toml_string()?)?;
        Ok(())
    }

    // ---- host queries ----

    pub fn is_building_working(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        self.activity().is_working(building, clock)
    }

    pub fn is_mail_hours(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        self.activity().is_mail_hours(building, clock)
    }

    pub fn is_garbage_hours(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        self.activity().is_garbage_hours(building, clock)
    }

    pub fn is_park_maintenance_hours(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        self.activity().is_park_maintenance_hours(building, clock)
    }

    pub fn is_maintenance_snow_road_service_hours(
        &self,
        building: BuildingId,
        clock: &SimulatedClock,
    ) -> bool {
        self.activity().is_maintenance_snow_road_service_hours(building, clock)
    }

    pub fn citizen_schedule(&self, citizen: CitizenId) -> Option<&CitizenSchedule> {
        self.engine.schedule(citizen)
    }

    pub fn clear_citizen_schedule(&mut self, citizen: CitizenId) -> bool {
        self.engine.clear_schedule(citizen)
    }

    /// Latest event at a building, live or not
    pub fn city_event(&self, building: BuildingId) -> Option<&CityEvent> {
        self.events.latest_event(building)
    }

    pub fn event_state(&self, building: BuildingId, as_of: Frame) -> Option<EventState> {
        self.events.event_state(building, as_of)
    }

    // ---- commands ----

    pub fn schedule_event(
        &mut self,
        kind: EventKind,
        building: BuildingId,
        start_frame: Frame,
        end_frame: Frame,
    ) -> Result<EventId> {
        if !self.registry.contains(building) {
            return Err(SchedulerError::UnknownBuilding(building));
        }
        self.events.schedule_event(kind, building, start_frame, end_frame)
    }

    /// Check a tourist into a hotel and give them a room
    pub fn book_hotel(
        &mut self,
        citizen: CitizenId,
        hotel: BuildingId,
        nights: u32,
        clock: &SimulatedClock,
    ) -> std::result::Result<Frame, BookingRejection> {
        let check_out = self.hotels.book(citizen, hotel, nights, clock, &self.units)?;
        if !self.units.add_citizen(hotel, UnitKind::Hotel, citizen) {
            self.hotels.check_out(citizen);
            return Err(BookingRejection::NoFreeRooms);
        }
        Ok(check_out)
    }

    // ---- ticking ----

    pub fn tick_events(&mut self, clock: &SimulatedClock, facts: &dyn CityFacts) -> Vec<EventNotice> {
        let activity = BuildingActivity::new(&self.config, &self.profiles, &self.registry, &self.units)
            .with_earliest_wake_up(facts.earliest_wake_up_hour());
        self.events.tick(&activity, facts, clock)
    }

    pub fn update_citizen(
        &mut self,
        citizen: CitizenId,
        clock: &SimulatedClock,
        facts: &dyn CityFacts,
    ) -> Result<Option<CitizenDecision>> {
        let citizen_facts = facts
            .citizen(citizen)
            .ok_or(SchedulerError::UnknownCitizen(citizen))?;
        let activity = BuildingActivity::new(&self.config, &self.profiles, &self.registry, &self.units)
            .with_earliest_wake_up(facts.earliest_wake_up_hour());
        let ctx = ScheduleContext {
            activity: &activity,
            units: &self.units,
            events: &self.events,
            city: facts,
        };
        Ok(self.engine.update(citizen, &citizen_facts, &ctx, clock))
    }

    /// Run one scheduling tick
    pub fn tick(&mut self, clock: &SimulatedClock, facts: &dyn CityFacts) -> Vec<SchedulerEvent> {
        let mut out: Vec<SchedulerEvent> = self
            .tick_events(clock, facts)
            .into_iter()
            .map(SchedulerEvent::Event)
            .collect();

        for citizen in self.hotels.due_check_outs(clock) {
            if let Some(stay) = self.hotels.check_out(citizen) {
                self.units.remove_citizen(stay.hotel, citizen);
                tracing::debug!("{} checked out of {}", citizen, stay.hotel);
                out.push(SchedulerEvent::HotelCheckOut {
                    citizen,
                    hotel: stay.hotel,
                });
            }
        }

        let activity = BuildingActivity::new(&self.config, &self.profiles, &self.registry, &self.units)
            .with_earliest_wake_up(facts.earliest_wake_up_hour());
        let ctx = ScheduleContext {
            activity: &activity,
            units: &self.units,
            events: &self.events,
            city: facts,
        };
        for citizen in facts.active_citizens() {
            let Some(citizen_facts) = facts.citizen(citizen) else {
                tracing::warn!("Host listed {} without facts", citizen);
                continue;
            };
            if let Some(decision) = self.engine.update(citizen, &citizen_facts, &ctx, clock) {
                out.push(SchedulerEvent::Citizen(decision));
            }
        }
        out
    }
}
