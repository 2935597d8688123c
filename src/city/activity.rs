//! Building activity scheduler
//!
//! Answers "is this building staffed right now?" from its resolved work-time
//! policy and the clock, plus the service-specific predicates built on top of
//! that answer. Every query is a pure read of the profile store, the registry
//! and the host's occupancy facts.

use crate::city::building::{BuildingKind, BuildingRegistry, SubService};
use crate::city::profiles::{ResolvedPolicy, WorkTimeProfileStore};
use crate::city::units::UnitKind;
use crate::city::work_time::{HourWindow, WorkShift, WorkTimePolicy};
use crate::core::calendar::SimulatedClock;
use crate::core::config::SchedulerConfig;
use crate::core::types::BuildingId;
use crate::simulation::host::OccupancyProvider;

/// Borrowed view over everything a building query needs
pub struct BuildingActivity<'a> {
    config: &'a SchedulerConfig,
    profiles: &'a WorkTimeProfileStore,
    registry: &'a BuildingRegistry,
    occupancy: &'a dyn OccupancyProvider,
    earliest_wake_up_hour: Option<f32>,
}

impl<'a> BuildingActivity<'a> {
    pub fn new(
        config: &'a SchedulerConfig,
        profiles: &'a WorkTimeProfileStore,
        registry: &'a BuildingRegistry,
        occupancy: &'a dyn OccupancyProvider,
    ) -> Self {
        Self {
            config,
            profiles,
            registry,
            occupancy,
            earliest_wake_up_hour: None,
        }
    }

    /// City-wide earliest wake-up hour, used by extended shifts
    pub fn with_earliest_wake_up(mut self, hour: Option<f32>) -> Self {
        self.earliest_wake_up_hour = hour;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.config
    }

    pub fn registry(&self) -> &BuildingRegistry {
        self.registry
    }

    pub fn occupancy(&self) -> &dyn OccupancyProvider {
        self.occupancy
    }

    pub fn policy(&self, building: BuildingId) -> ResolvedPolicy {
        let archetype = self.registry.get(building).map(|b| &b.archetype);
        self.profiles.resolve(building, archetype)
    }

    pub fn is_working(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        let policy = self.policy(building).policy;
        self.is_policy_working(&policy, clock)
    }

    /// Core open/closed rule for a policy at a clock reading
    pub fn is_policy_working(&self, policy: &WorkTimePolicy, clock: &SimulatedClock) -> bool {
        if !policy.work_at_night && clock.is_night_time() {
            return false;
        }
        if !policy.work_at_weekends && clock.is_weekend() {
            return false;
        }
        let hour = clock.hour();
        self.open_windows(policy).iter().any(|w| w.contains(hour))
    }

    /// Hour windows the policy is open for, in shift order
    pub fn open_windows(&self, policy: &WorkTimePolicy) -> Vec<HourWindow> {
        policy
            .shifts()
            .into_iter()
            .filter_map(|shift| self.policy_shift_window(policy, shift))
            .collect()
    }

    /// Begin hour of an extended first shift
    pub fn extended_begin(&self) -> f32 {
        let day = &self.config.day;
        self.earliest_wake_up_hour
            .unwrap_or(day.wake_up_hour)
            .min(day.work_begin_hour)
    }

    /// Window a worker of `shift` spends at `building`, honoring the extended shift
    ///
    /// `None` when the building's policy does not staff `shift`.
    pub fn shift_window(&self, building: BuildingId, shift: WorkShift) -> Option<HourWindow> {
        let policy = self.policy(building).policy;
        self.policy_shift_window(&policy, shift)
    }

    fn policy_shift_window(&self, policy: &WorkTimePolicy, shift: WorkShift) -> Option<HourWindow> {
        if !policy.shifts().contains(&shift) {
            return None;
        }
        let window = shift.window(policy, &self.config.day)?;
        if shift == WorkShift::First && policy.has_extended_shift {
            let mut begin = self.extended_begin();
            if !policy.work_at_night {
                begin = begin.max(self.config.day.wake_up_hour);
            }
            return Some(HourWindow::new(begin, window.end));
        }
        Some(window)
    }

    fn kind(&self, building: BuildingId) -> Option<BuildingKind> {
        self.registry.kind(building)
    }

    pub fn is_mail_hours(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        let services = &self.config.services;
        self.kind(building) == Some(BuildingKind::PostOffice)
            && self.is_working(building, clock)
            && HourWindow::new(services.mail_begin_hour, services.mail_end_hour).contains(clock.hour())
    }

    pub fn is_garbage_hours(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        let services = &self.config.services;
        self.kind(building) == Some(BuildingKind::GarbageFacility)
            && self.is_working(building, clock)
            && HourWindow::new(services.garbage_begin_hour, services.garbage_end_hour)
                .contains(clock.hour())
    }

    /// Low-density homes only get garbage and mail pickups once a week
    pub fn weekly_pickups_only(&self, target: BuildingId) -> bool {
        self.registry
            .get(target)
            .is_some_and(|b| b.sub_service == SubService::ResidentialLow)
    }

    pub fn is_pickup_allowed(&self, target: BuildingId, clock: &SimulatedClock) -> bool {
        !self.weekly_pickups_only(target) || clock.weekday() == self.config.services.weekly_pickup_day
    }

    pub fn is_park_maintenance_hours(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        let services = &self.config.services;
        self.kind(building) == Some(BuildingKind::ParkMaintenance)
            && !clock.is_night_time()
            && self.is_working(building, clock)
            && HourWindow::new(
                services.park_maintenance_begin_hour,
                services.park_maintenance_end_hour,
            )
            .contains(clock.hour())
    }

    /// Road maintenance and snow dump trucks stay off the road during rush hours
    pub fn is_maintenance_snow_road_service_hours(
        &self,
        building: BuildingId,
        clock: &SimulatedClock,
    ) -> bool {
        matches!(
            self.kind(building),
            Some(BuildingKind::MaintenanceDepot | BuildingKind::SnowDump)
        ) && self.is_working(building, clock)
            && !self.is_rush_hour(clock)
    }

    pub fn is_rush_hour(&self, clock: &SimulatedClock) -> bool {
        if clock.is_weekend() {
            return false;
        }
        let services = &self.config.services;
        let hour = clock.hour();
        HourWindow::new(services.morning_rush_begin_hour, services.morning_rush_end_hour).contains(hour)
            || HourWindow::new(services.evening_rush_begin_hour, services.evening_rush_end_hour)
                .contains(hour)
    }

    /// Within walking/driving reach for a visit
    pub fn is_within_reach(&self, from: BuildingId, to: BuildingId) -> bool {
        self.registry
            .distance(from, to)
            .is_some_and(|d| d <= self.config.citizens.max_visit_distance)
    }

    /// Commercial buildings that sell goods to visitors right now
    pub fn is_shopping_target(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        let Some(info) = self.registry.get(building) else {
            return false;
        };
        info.is_commercial()
            && !matches!(info.kind, BuildingKind::Hotel | BuildingKind::LeisureCommercial)
            && self.is_working(building, clock)
            && self.occupancy.has_free_units(building, UnitKind::Visit)
    }

    /// Leisure buildings open for visitors right now
    pub fn is_entertainment_target(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        let Some(kind) = self.kind(building) else {
            return false;
        };
        kind.is_leisure()
            && kind != BuildingKind::Hotel
            && self.is_working(building, clock)
            && self.occupancy.has_free_units(building, UnitKind::Visit)
    }

    /// Commercial buildings only take goods deliveries while staffed
    pub fn accepts_deliveries(&self, building: BuildingId, clock: &SimulatedClock) -> bool {
        self.registry.get(building).is_some_and(|b| b.is_commercial()) && self.is_working(building, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::building::{BuildingFacts, BuildingService};
    use crate::city::profiles::ProfileTarget;
    use crate::city::units::CitizenUnitArena;
    use crate::core::calendar::Weekday;
    use crate::core::config::TimeConfig;
    use crate::core::types::ArchetypeKey;
    use glam::Vec2;

    struct Fixture {
        config: SchedulerConfig,
        profiles: WorkTimeProfileStore,
        registry: BuildingRegistry,
        units: CitizenUnitArena,
    }

    impl Fixture {
        fn new() -> Self {
            let mut config = SchedulerConfig::default();
            config.time = TimeConfig {
                frames_per_hour: 60.0,
                epoch_hour: 0.0,
                epoch_weekday: Weekday::Monday,
            };
            Self {
                config,
                profiles: WorkTimeProfileStore::new(),
                registry: BuildingRegistry::new(),
                units: CitizenUnitArena::default(),
            }
        }

        fn add(&mut self, id: u16, service: BuildingService, sub: SubService, ai: &str, x: f32) {
            let facts = BuildingFacts::new(service, sub, Vec2::new(x, 0.0));
            let info = self
                .registry
                .register(BuildingId(id), ArchetypeKey::new("Prefab", ai), &facts, None)
                .clone();
            self.profiles.ensure_instance(&info);
        }

        fn activity(&self) -> BuildingActivity<'_> {
            BuildingActivity::new(&self.config, &self.profiles, &self.registry, &self.units)
        }

        /// Clock on `weekday` at `hour`
        fn clock(&self, weekday: Weekday, hour: f64) -> SimulatedClock {
            let hours = weekday.index() as f64 * 24.0 + hour;
            SimulatedClock::from_config((hours * 60.0).round() as u64, &self.config)
        }
    }

    #[test]
    fn test_night_and_weekend_close() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Office, SubService::OfficeGeneric, "OfficeBuildingAI", 0.0);
        fx.profiles
            .set(ProfileTarget::Instance(BuildingId(1)), WorkTimePolicy::new(false, false, 2));
        let activity = fx.activity();

        assert!(activity.is_working(BuildingId(1), &fx.clock(Weekday::Tuesday, 14.0)));
        assert!(activity.is_working(BuildingId(1), &fx.clock(Weekday::Tuesday, 20.0)));
        assert!(!activity.is_working(BuildingId(1), &fx.clock(Weekday::Tuesday, 23.0)));
        assert!(!activity.is_working(BuildingId(1), &fx.clock(Weekday::Tuesday, 7.0)));
        assert!(!activity.is_working(BuildingId(1), &fx.clock(Weekday::Saturday, 10.0)));
    }

    #[test]
    fn test_two_day_shifts_end_at_bedtime() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Commercial, SubService::CommercialHigh, "CommercialBuildingAI", 0.0);
        fx.profiles
            .set(ProfileTarget::Instance(BuildingId(1)), WorkTimePolicy::new(false, true, 2));
        let activity = fx.activity();

        let second = activity.shift_window(BuildingId(1), WorkShift::Second).unwrap();
        assert_eq!((second.begin, second.end), (15.0, 22.0));
        assert!(activity.shift_window(BuildingId(1), WorkShift::Night).is_none());
        for hour in [15.0, 18.0, 21.9] {
            let clock = fx.clock(Weekday::Tuesday, hour);
            assert!(second.contains(clock.hour()));
            assert!(activity.is_working(BuildingId(1), &clock), "closed at {}", hour);
        }
        assert!(!second.contains(22.5));
        assert!(!activity.is_working(BuildingId(1), &fx.clock(Weekday::Tuesday, 22.5)));
    }

    #[test]
    fn test_extended_day_shift_never_starts_at_night() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Commercial, SubService::CommercialLow, "CommercialBuildingAI", 0.0);
        let policy = WorkTimePolicy::new(false, true, 1).with_extended_shift(true);
        fx.profiles.set(ProfileTarget::Instance(BuildingId(1)), policy);
        let activity = fx.activity().with_earliest_wake_up(Some(4.0));
        let first = activity.shift_window(BuildingId(1), WorkShift::First).unwrap();
        assert_eq!(first.begin, 6.0);
    }

    #[test]
    fn test_extended_shift_opens_early() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Commercial, SubService::CommercialLow, "CommercialBuildingAI", 0.0);
        let policy = WorkTimePolicy::new(false, true, 1).with_extended_shift(true);
        fx.profiles.set(ProfileTarget::Instance(BuildingId(1)), policy);

        let early = fx.clock(Weekday::Monday, 6.5);
        assert!(fx.activity().is_working(BuildingId(1), &early));
        let stat = fx.activity().with_earliest_wake_up(Some(7.0));
        assert!(!stat.is_working(BuildingId(1), &early));
        assert!(stat.is_working(BuildingId(1), &fx.clock(Weekday::Monday, 7.25)));
        // Late start is capped at the regular begin
        let late = fx.activity().with_earliest_wake_up(Some(10.0));
        assert_eq!(late.extended_begin(), 8.0);
    }

    #[test]
    fn test_continuous_band() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Commercial, SubService::CommercialHigh, "CommercialBuildingAI", 0.0);
        let day_only = WorkTimePolicy::new(false, true, 1).with_continuous_shift(true);
        fx.profiles.set(ProfileTarget::Instance(BuildingId(1)), day_only);
        assert!(fx.activity().is_working(BuildingId(1), &fx.clock(Weekday::Monday, 19.5)));
        assert!(!fx.activity().is_working(BuildingId(1), &fx.clock(Weekday::Monday, 20.5)));

        let around = day_only.with_night(true);
        fx.profiles.set(ProfileTarget::Instance(BuildingId(1)), around);
        assert!(fx.activity().is_working(BuildingId(1), &fx.clock(Weekday::Monday, 20.5)));
        assert!(fx.activity().is_working(BuildingId(1), &fx.clock(Weekday::Monday, 3.0)));
    }

    #[test]
    fn test_unregistered_building_uses_fallback() {
        let fx = Fixture::new();
        let activity = fx.activity();
        assert!(activity.is_working(BuildingId(77), &fx.clock(Weekday::Sunday, 3.0)));
        assert!(!activity.is_mail_hours(BuildingId(77), &fx.clock(Weekday::Monday, 10.0)));
    }

    #[test]
    fn test_service_hours() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Mail, SubService::None, "PostOfficeAI", 0.0);
        fx.add(2, BuildingService::Garbage, SubService::None, "LandfillSiteAI", 0.0);
        fx.add(3, BuildingService::Road, SubService::None, "MaintenanceDepotAI", 0.0);
        fx.add(4, BuildingService::Beautification, SubService::None, "ParkMaintenanceBuildingAI", 0.0);
        let activity = fx.activity();

        assert!(activity.is_mail_hours(BuildingId(1), &fx.clock(Weekday::Monday, 10.0)));
        assert!(!activity.is_mail_hours(BuildingId(1), &fx.clock(Weekday::Monday, 19.0)));
        assert!(activity.is_garbage_hours(BuildingId(2), &fx.clock(Weekday::Monday, 5.0)));
        assert!(!activity.is_garbage_hours(BuildingId(2), &fx.clock(Weekday::Monday, 13.0)));
        assert!(!activity.is_maintenance_snow_road_service_hours(BuildingId(3), &fx.clock(Weekday::Monday, 8.0)));
        assert!(activity.is_maintenance_snow_road_service_hours(BuildingId(3), &fx.clock(Weekday::Monday, 11.0)));
        assert!(activity.is_park_maintenance_hours(BuildingId(4), &fx.clock(Weekday::Monday, 11.0)));
        assert!(!activity.is_park_maintenance_hours(BuildingId(4), &fx.clock(Weekday::Monday, 6.5)));
    }

    #[test]
    fn test_weekly_pickups() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Residential, SubService::ResidentialLow, "ResidentialBuildingAI", 0.0);
        fx.add(2, BuildingService::Residential, SubService::ResidentialHigh, "ResidentialBuildingAI", 0.0);
        let activity = fx.activity();
        assert!(activity.weekly_pickups_only(BuildingId(1)));
        assert!(!activity.weekly_pickups_only(BuildingId(2)));
        assert!(activity.is_pickup_allowed(BuildingId(1), &fx.clock(Weekday::Wednesday, 9.0)));
        assert!(!activity.is_pickup_allowed(BuildingId(1), &fx.clock(Weekday::Thursday, 9.0)));
        assert!(activity.is_pickup_allowed(BuildingId(2), &fx.clock(Weekday::Thursday, 9.0)));
    }

    #[test]
    fn test_shopping_and_entertainment_targets() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Commercial, SubService::CommercialHigh, "CommercialBuildingAI", 0.0);
        fx.add(2, BuildingService::Commercial, SubService::CommercialLeisure, "CommercialBuildingAI", 0.0);
        fx.add(3, BuildingService::Commercial, SubService::CommercialHigh, "HotelAI", 0.0);
        fx.add(4, BuildingService::Beautification, SubService::None, "ParkAI", 3000.0);
        for id in 1..=4 {
            fx.units.allocate(BuildingId(id), UnitKind::Visit, 1);
        }
        let noon = fx.clock(Weekday::Monday, 12.0);
        let activity = fx.activity();

        assert!(activity.is_shopping_target(BuildingId(1), &noon));
        assert!(!activity.is_shopping_target(BuildingId(2), &noon));
        assert!(!activity.is_shopping_target(BuildingId(3), &noon));
        assert!(activity.is_entertainment_target(BuildingId(2), &noon));
        assert!(activity.is_entertainment_target(BuildingId(4), &noon));
        assert!(!activity.is_entertainment_target(BuildingId(3), &noon));
        assert!(activity.is_within_reach(BuildingId(1), BuildingId(2)));
        assert!(!activity.is_within_reach(BuildingId(1), BuildingId(4)));
        assert!(activity.accepts_deliveries(BuildingId(1), &noon));
        assert!(!activity.accepts_deliveries(BuildingId(4), &noon));
    }

    #[test]
    fn test_full_building_is_not_a_target() {
        let mut fx = Fixture::new();
        fx.add(1, BuildingService::Commercial, SubService::CommercialHigh, "CommercialBuildingAI", 0.0);
        fx.units.allocate(BuildingId(1), UnitKind::Visit, 1);
        for i in 0..5 {
            fx.units.add_citizen(BuildingId(1), UnitKind::Visit, crate::core::types::CitizenId(i));
        }
        assert!(!fx.activity().is_shopping_target(BuildingId(1), &fx.clock(Weekday::Monday, 12.0)));
    }
}
