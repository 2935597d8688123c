//! Integration tests for citizen scheduling
//!
//! Drives the schedule engine through the scheduler facade over a small
//! in-memory city: commutes, shift work across closing hours and weekends,
//! school trips, evacuation, vacations, hotel visits and the admission rules.

use city_rhythm::citizen::{
    AdmissionGuard, AdmissionRejection, CitizenDecision, CitizenFacts, CitizenScheduleEngine, Location,
    ResidentState, ScheduleContext, ScheduledState, VisitPurpose, WorkStatus,
};
use city_rhythm::city::{
    BuildingActivity, BuildingFacts, BuildingRegistry, BuildingService, CitizenUnitArena, ProfileTarget,
    SubService, UnitKind, WorkShift, WorkTimePolicy, WorkTimeProfileStore,
};
use city_rhythm::core::config::TimeConfig;
use city_rhythm::core::types::{ArchetypeKey, BuildingId, CitizenId, Frame};
use city_rhythm::core::{SchedulerConfig, SchedulerError, SimulatedClock, Weekday};
use city_rhythm::events::{EventKind, EventManager};
use city_rhythm::simulation::{CitySnapshot, RealTimeScheduler, SchedulerEvent};
use glam::Vec2;
use proptest::prelude::*;

const FRAMES_PER_HOUR: u64 = 60;

const HOME: BuildingId = BuildingId(1);
const OFFICE: BuildingId = BuildingId(2);
const SHOP: BuildingId = BuildingId(3);
const SCHOOL: BuildingId = BuildingId(4);
const UNIVERSITY: BuildingId = BuildingId(5);
const CAFETERIA: BuildingId = BuildingId(6);
const RIVAL_UNIVERSITY: BuildingId = BuildingId(7);
const NIGHTCLUB: BuildingId = BuildingId(8);
const SHELTER: BuildingId = BuildingId(9);
const HOTEL: BuildingId = BuildingId(10);

/// Calendar starting Monday 00:00 with no random leisure
fn quiet_config() -> SchedulerConfig {
    let mut config = SchedulerConfig::default();
    config.time = TimeConfig {
        frames_per_hour: FRAMES_PER_HOUR as f64,
        epoch_hour: 0.0,
        epoch_weekday: Weekday::Monday,
    };
    let citizens = &mut config.citizens;
    citizens.shopping_chance = 0.0;
    citizens.relax_chance = 0.0;
    citizens.after_work_leisure_chance = 0.0;
    citizens.breakfast_chance = 0.0;
    citizens.lunch_chance = 0.0;
    citizens.vacation_chance_per_day = 0.0;
    config
}

fn frame_at(weekday: Weekday, hour: f64) -> Frame {
    ((weekday.index() as f64 * 24.0 + hour) * FRAMES_PER_HOUR as f64).round() as Frame
}

struct Town {
    scheduler: RealTimeScheduler,
    city: CitySnapshot,
}

impl Town {
    fn new(config: SchedulerConfig) -> Self {
        let mut town = Self {
            scheduler: RealTimeScheduler::new(config),
            city: CitySnapshot::new(),
        };
        let buildings = [
            (HOME, "Low Residential", "ResidentialBuildingAI", BuildingService::Residential, SubService::ResidentialLow, 0.0, None),
            (OFFICE, "Office", "OfficeBuildingAI", BuildingService::Office, SubService::OfficeGeneric, 600.0, None),
            (SHOP, "Corner Shop", "CommercialBuildingAI", BuildingService::Commercial, SubService::CommercialLow, 300.0, None),
            (SCHOOL, "Elementary", "SchoolAI", BuildingService::Education, SubService::None, 400.0, None),
            (UNIVERSITY, "Lecture Hall", "CampusBuildingAI", BuildingService::PlayerEducation, SubService::None, 900.0, Some(1)),
            (CAFETERIA, "Cafeteria", "CampusCafeteriaAI", BuildingService::PlayerEducation, SubService::None, 950.0, Some(1)),
            (RIVAL_UNIVERSITY, "Lecture Hall", "CampusBuildingAI", BuildingService::PlayerEducation, SubService::None, 1_200.0, Some(2)),
            (NIGHTCLUB, "Nightclub", "CommercialBuildingAI", BuildingService::Commercial, SubService::CommercialLeisure, 350.0, None),
            (SHELTER, "Shelter", "ShelterAI", BuildingService::Disaster, SubService::None, 800.0, None),
            (HOTEL, "Hotel", "HotelAI", BuildingService::Commercial, SubService::CommercialTourist, 320.0, None),
        ];
        for (id, prefab, ai, service, sub_service, x, campus) in buildings {
            let facts = BuildingFacts::new(service, sub_service, Vec2::new(x, 0.0));
            town.scheduler
                .register_building(id, ArchetypeKey::new(prefab, ai), &facts, campus);
            town.city.set_building(id, facts);
        }
        town.scheduler.allocate_units(HOME, UnitKind::Home, 1).unwrap();
        town.scheduler.allocate_units(OFFICE, UnitKind::Work, 1).unwrap();
        town
    }

    fn add_citizen(&mut self, id: CitizenId, facts: CitizenFacts) {
        if let Some(home) = facts.home {
            assert!(self.scheduler.place_citizen(home, UnitKind::Home, id));
        }
        if let Some(work) = facts.workplace() {
            assert!(self.scheduler.place_citizen(work, UnitKind::Work, id));
        }
        self.city.set_citizen(id, facts);
    }

    fn clock(&self, frame: Frame) -> SimulatedClock {
        SimulatedClock::from_config(frame, self.scheduler.config())
    }

    /// Tick every frame in `from..to` and collect the decisions with their frame
    fn run(&mut self, from: Frame, to: Frame) -> Vec<(Frame, CitizenDecision)> {
        let mut decisions = Vec::new();
        for frame in from..to {
            let clock = self.clock(frame);
            for event in self.scheduler.tick(&clock, &self.city) {
                if let SchedulerEvent::Citizen(decision) = event {
                    decisions.push((frame, decision));
                }
            }
        }
        decisions
    }

    fn move_citizen(&mut self, id: CitizenId, location: Location, visit: Option<BuildingId>) {
        let facts = self.city.citizen_mut(id).unwrap();
        facts.location = location;
        facts.visit = visit;
    }

    fn set_evacuating(&mut self, building: BuildingId, evacuating: bool) {
        self.city.building_mut(building).unwrap().flags.evacuating = evacuating;
    }
}

#[test]
fn test_worker_commutes_and_returns_after_shift() {
    let mut town = Town::new(quiet_config());
    let worker = CitizenId(1);
    town.add_citizen(worker, CitizenFacts::resident(35, HOME).working_at(OFFICE));

    // Travel time is clamped to 15 minutes, so the worker leaves around 07:45
    let morning = town.run(frame_at(Weekday::Monday, 7.0), frame_at(Weekday::Monday, 8.0));
    assert_eq!(morning.len(), 1);
    let (left_at, decision) = morning[0];
    assert_eq!(decision.action, ScheduledState::GoToWork);
    assert_eq!(decision.target, OFFICE);
    assert!((frame_at(Weekday::Monday, 7.7)..=frame_at(Weekday::Monday, 7.8)).contains(&left_at));

    let schedule = town.scheduler.citizen_schedule(worker).unwrap();
    assert_eq!(schedule.work_shift, WorkShift::First);
    assert_eq!(schedule.work_status, WorkStatus::Working);

    town.move_citizen(worker, Location::Work, None);
    let day = town.run(frame_at(Weekday::Monday, 8.0), frame_at(Weekday::Monday, 16.0) + 1);
    assert_eq!(day.len(), 1);
    let (home_at, decision) = day[0];
    assert_eq!(decision.action, ScheduledState::GoHome);
    assert_eq!(decision.target, HOME);
    assert_eq!(home_at, frame_at(Weekday::Monday, 16.0));
    assert_eq!(
        town.scheduler.citizen_schedule(worker).unwrap().current_state,
        ResidentState::AtWork
    );
}

#[test]
fn test_weekday_office_is_skipped_on_weekends() {
    let mut town = Town::new(quiet_config());
    let worker = CitizenId(1);
    town.add_citizen(worker, CitizenFacts::resident(35, HOME).working_at(OFFICE));

    let saturday = town.run(frame_at(Weekday::Saturday, 6.5), frame_at(Weekday::Saturday, 12.0));
    assert!(saturday.is_empty());
}

#[test]
fn test_child_goes_to_school() {
    let mut town = Town::new(quiet_config());
    let pupil = CitizenId(2);
    town.add_citizen(pupil, CitizenFacts::resident(8, HOME).studying_at(SCHOOL));

    let morning = town.run(frame_at(Weekday::Tuesday, 7.0), frame_at(Weekday::Tuesday, 8.0));
    assert_eq!(morning.len(), 1);
    assert_eq!(morning[0].1.action, ScheduledState::GoToSchool);
    assert_eq!(morning[0].1.target, SCHOOL);
}

#[test]
fn test_no_lectures_without_academic_year() {
    let mut town = Town::new(quiet_config());
    let student = CitizenId(3);
    town.add_citizen(student, CitizenFacts::resident(20, HOME).studying_at(UNIVERSITY));

    // Stop before the admission window could open a new year
    let morning = town.run(frame_at(Weekday::Monday, 7.0), frame_at(Weekday::Monday, 8.9));
    assert!(morning
        .iter()
        .all(|(_, d)| d.action != ScheduledState::GoToSchool));
}

#[test]
fn test_evacuation_to_shelter_and_back() {
    let mut town = Town::new(quiet_config());
    town.scheduler.allocate_units(SHELTER, UnitKind::Visit, 1).unwrap();
    let retiree = CitizenId(4);
    town.add_citizen(retiree, CitizenFacts::resident(70, HOME));

    let start = frame_at(Weekday::Wednesday, 10.0);
    town.set_evacuating(HOME, true);
    let flee = town.run(start, start + 1);
    assert_eq!(flee.len(), 1);
    assert_eq!(flee[0].1.action, ScheduledState::GoToShelter);
    assert_eq!(flee[0].1.target, SHELTER);

    town.move_citizen(retiree, Location::Visit, Some(SHELTER));
    assert!(town.run(start + 1, start + 90).is_empty());
    assert_eq!(
        town.scheduler.citizen_schedule(retiree).unwrap().current_state,
        ResidentState::InShelter
    );

    town.set_evacuating(HOME, false);
    // The stay is re-checked hourly; the first check after the all-clear sends them home
    let back = town.run(start + 90, start + 200);
    assert_eq!(back[0].0, start + 1 + 2 * FRAMES_PER_HOUR);
    assert_eq!(back[0].1.action, ScheduledState::GoHome);
    assert_eq!(back[0].1.target, HOME);
}

#[test]
fn test_full_shelters_retry_later() {
    let mut town = Town::new(quiet_config());
    let retiree = CitizenId(4);
    town.add_citizen(retiree, CitizenFacts::resident(70, HOME));

    let start = frame_at(Weekday::Wednesday, 10.0);
    town.set_evacuating(HOME, true);
    assert!(town.run(start, start + 10).is_empty());

    town.scheduler.allocate_units(SHELTER, UnitKind::Visit, 1).unwrap();
    let retry = town.run(start + 10, start + 2 * FRAMES_PER_HOUR);
    assert_eq!(retry[0].0, start + FRAMES_PER_HOUR);
    assert_eq!(retry[0].1.action, ScheduledState::GoToShelter);
    assert_eq!(retry[0].1.target, SHELTER);
}

#[test]
fn test_admission_rules() {
    let mut town = Town::new(quiet_config());
    town.scheduler.allocate_units(CAFETERIA, UnitKind::Visit, 1).unwrap();
    town.scheduler.allocate_units(NIGHTCLUB, UnitKind::Visit, 1).unwrap();

    let monday_noon = town.clock(frame_at(Weekday::Monday, 12.0));
    let monday_late = town.clock(frame_at(Weekday::Monday, 23.0));
    let student = CitizenFacts::resident(21, HOME).studying_at(UNIVERSITY);
    let rival = CitizenFacts::resident(21, HOME).studying_at(RIVAL_UNIVERSITY);
    let worker = CitizenFacts::resident(40, HOME).working_at(OFFICE);

    let activity = town.scheduler.activity();
    let guard = AdmissionGuard::new(&activity, town.scheduler.events());

    assert_eq!(guard.check(&student, CAFETERIA, VisitPurpose::Meal, &monday_noon), Ok(()));
    assert_eq!(
        guard.check(&rival, CAFETERIA, VisitPurpose::Meal, &monday_noon),
        Err(AdmissionRejection::CampusOnly)
    );
    assert_eq!(
        guard.check(&worker, CAFETERIA, VisitPurpose::Meal, &monday_noon),
        Err(AdmissionRejection::CampusOnly)
    );

    assert_eq!(
        guard.check(&worker, SHOP, VisitPurpose::Shopping, &monday_late),
        Err(AdmissionRejection::Closed)
    );
    assert_eq!(
        guard.check(&worker, SHOP, VisitPurpose::Shopping, &monday_noon),
        Err(AdmissionRejection::NoCapacity)
    );
    assert_eq!(
        guard.check(&worker, NIGHTCLUB, VisitPurpose::Shopping, &monday_late),
        Err(AdmissionRejection::NotAShop)
    );
    assert_eq!(guard.check(&worker, NIGHTCLUB, VisitPurpose::Relax, &monday_late), Ok(()));
    assert_eq!(
        guard.check(&worker, SHOP, VisitPurpose::Shelter, &monday_noon),
        Err(AdmissionRejection::NotAShelter)
    );
    assert_eq!(
        guard.check(&worker, BuildingId(99), VisitPurpose::Relax, &monday_noon),
        Err(AdmissionRejection::UnknownBuilding)
    );
}

#[test]
fn test_shopping_trip_picks_an_open_shop() {
    let mut config = quiet_config();
    config.citizens.shopping_chance = 1.0;
    let mut town = Town::new(config);
    town.scheduler.allocate_units(SHOP, UnitKind::Visit, 1).unwrap();
    let retiree = CitizenId(5);
    town.add_citizen(retiree, CitizenFacts::resident(70, HOME));

    let start = frame_at(Weekday::Thursday, 10.0);
    let trip = town.run(start, start + 1);
    assert_eq!(trip.len(), 1);
    assert_eq!(trip[0].1.action, ScheduledState::GoShopping);
    assert_eq!(trip[0].1.target, SHOP);
}

#[test]
fn test_dummy_traffic_and_travellers_are_left_alone() {
    let mut town = Town::new(quiet_config());
    let ghost = CitizenId(6);
    let mut facts = CitizenFacts::resident(30, HOME);
    facts.flags.dummy_traffic = true;
    town.city.set_citizen(ghost, facts);
    let commuter = CitizenId(7);
    town.add_citizen(commuter, CitizenFacts::resident(30, HOME).at(Location::Moving, None));

    let start = frame_at(Weekday::Monday, 7.0);
    assert!(town.run(start, start + 2 * FRAMES_PER_HOUR).is_empty());
    assert_eq!(
        town.scheduler.citizen_schedule(ghost).unwrap().current_state,
        ResidentState::Ignored
    );
    assert_eq!(
        town.scheduler.citizen_schedule(commuter).unwrap().current_state,
        ResidentState::InTransition
    );
}

#[test]
fn test_clear_citizen_schedule() {
    let mut town = Town::new(quiet_config());
    let worker = CitizenId(1);
    town.add_citizen(worker, CitizenFacts::resident(35, HOME).working_at(OFFICE));
    town.run(frame_at(Weekday::Monday, 7.0), frame_at(Weekday::Monday, 7.1));
    assert!(town.scheduler.citizen_schedule(worker).unwrap().has_plan());

    assert!(town.scheduler.clear_citizen_schedule(worker));
    let cleared = town.scheduler.citizen_schedule(worker).unwrap();
    assert!(!cleared.has_plan());
    assert_eq!(cleared.work_shift, WorkShift::Unemployed);
    assert!(!town.scheduler.clear_citizen_schedule(CitizenId(404)));
}

#[test]
fn test_update_of_unknown_citizen_fails() {
    let mut town = Town::new(quiet_config());
    let clock = town.clock(0);
    let result = town.scheduler.update_citizen(CitizenId(50), &clock, &town.city);
    assert!(matches!(result, Err(SchedulerError::UnknownCitizen(CitizenId(50)))));
}

#[test]
fn test_household_vacation_over_cyclic_home_chain() {
    let mut config = quiet_config();
    config.citizens.vacation_chance_per_day = 1.0;
    config.citizens.vacation_length_days = 3;

    let mut registry = BuildingRegistry::new();
    let mut city = CitySnapshot::new();
    for (id, prefab, ai, service, sub_service) in [
        (HOME, "Low Residential", "ResidentialBuildingAI", BuildingService::Residential, SubService::ResidentialLow),
        (OFFICE, "Office", "OfficeBuildingAI", BuildingService::Office, SubService::OfficeGeneric),
    ] {
        let facts = BuildingFacts::new(service, sub_service, Vec2::new(id.0 as f32 * 300.0, 0.0));
        registry.register(id, ArchetypeKey::new(prefab, ai), &facts, None);
        city.set_building(id, facts);
    }

    // Home chain imported with its tail pointing back at the head
    let mut units = CitizenUnitArena::default();
    units.allocate(HOME, UnitKind::Home, 2);
    let head = units.head(HOME).unwrap();
    let tail = units.chain(HOME).last().unwrap().0;
    units.link(tail, Some(head));
    let (worker, partner) = (CitizenId(1), CitizenId(2));
    assert!(units.add_citizen(HOME, UnitKind::Home, worker));
    assert!(units.add_citizen(HOME, UnitKind::Home, partner));
    city.set_citizen(worker, CitizenFacts::resident(35, HOME).working_at(OFFICE));

    let profiles = WorkTimeProfileStore::new();
    let events = EventManager::new(config.events.clone());
    let activity = BuildingActivity::new(&config, &profiles, &registry, &units);
    let ctx = ScheduleContext {
        activity: &activity,
        units: &units,
        events: &events,
        city: &city,
    };
    let mut engine = CitizenScheduleEngine::new(7);

    let facts = city.citizens.get(&worker).copied().unwrap();
    for frame in frame_at(Weekday::Monday, 7.0)..frame_at(Weekday::Monday, 9.0) {
        let clock = SimulatedClock::from_config(frame, &config);
        assert_eq!(engine.update(worker, &facts, &ctx, &clock), None);
    }

    let schedule = engine.schedule(worker).unwrap();
    assert_eq!(schedule.vacation_days_left, 3);
    assert_eq!(schedule.work_status, WorkStatus::OnVacation);
    assert_eq!(engine.schedule(partner).unwrap().vacation_days_left, 3);
}

#[test]
fn test_second_shift_leaves_when_a_day_only_shop_closes() {
    let mut town = Town::new(quiet_config());
    town.scheduler
        .set_policy(ProfileTarget::Instance(SHOP), WorkTimePolicy::new(false, true, 2));
    town.scheduler.allocate_units(SHOP, UnitKind::Work, 1).unwrap();
    let (early, late) = (CitizenId(1), CitizenId(2));
    town.add_citizen(early, CitizenFacts::resident(30, HOME).working_at(SHOP));
    town.add_citizen(
        late,
        CitizenFacts::resident(30, HOME).working_at(SHOP).at(Location::Work, None),
    );

    let closing = frame_at(Weekday::Tuesday, 22.0);
    let evening: Vec<_> = town
        .run(frame_at(Weekday::Tuesday, 16.5), closing + 1)
        .into_iter()
        .filter(|(_, d)| d.citizen == late)
        .collect();

    assert_eq!(town.scheduler.citizen_schedule(late).unwrap().work_shift, WorkShift::Second);
    assert_eq!(evening.len(), 1);
    assert_eq!(evening[0].0, closing);
    assert_eq!(evening[0].1.action, ScheduledState::GoHome);
    assert!(town.scheduler.is_building_working(SHOP, &town.clock(closing - 1)));
    assert!(!town.scheduler.is_building_working(SHOP, &town.clock(closing)));
}

#[test]
fn test_night_shift_follows_the_day_the_shift_starts() {
    let mut town = Town::new(quiet_config());
    town.scheduler
        .set_policy(ProfileTarget::Instance(OFFICE), WorkTimePolicy::new(true, false, 3));
    let crew = [CitizenId(1), CitizenId(2), CitizenId(3)];
    for id in crew {
        town.add_citizen(id, CitizenFacts::resident(30, HOME).working_at(OFFICE));
    }
    let night_worker = crew[2];

    // Friday night leads into a closed Saturday
    let friday = town.run(frame_at(Weekday::Friday, 20.0), frame_at(Weekday::Saturday, 1.0));
    assert_eq!(
        town.scheduler.citizen_schedule(night_worker).unwrap().work_shift,
        WorkShift::Night
    );
    assert!(friday
        .iter()
        .filter(|(_, d)| d.citizen == night_worker)
        .all(|(_, d)| d.action != ScheduledState::GoToWork));
    assert!(!town
        .scheduler
        .is_building_working(OFFICE, &town.clock(frame_at(Weekday::Saturday, 0.5))));

    // Sunday night leads into Monday's first shift
    let sunday = town.run(frame_at(Weekday::Sunday, 20.0), frame_at(Weekday::Monday, 1.0));
    let commutes: Vec<_> = sunday
        .iter()
        .filter(|(_, d)| d.action == ScheduledState::GoToWork)
        .collect();
    assert_eq!(commutes.len(), 1);
    assert_eq!(commutes[0].1.citizen, night_worker);
    assert_eq!(commutes[0].0, frame_at(Weekday::Sunday, 23.75));
    assert!(town
        .scheduler
        .is_building_working(OFFICE, &town.clock(frame_at(Weekday::Monday, 0.0))));
}

#[test]
fn test_relaxing_at_a_hotel_only_during_an_event() {
    let mut config = quiet_config();
    config.citizens.relax_chance = 1.0;
    let mut town = Town::new(config);
    town.scheduler.allocate_units(HOTEL, UnitKind::Visit, 1).unwrap();
    let retiree = CitizenId(5);
    town.add_citizen(retiree, CitizenFacts::resident(70, HOME));

    let start = frame_at(Weekday::Thursday, 10.0);
    assert!(town.run(start, start + 1).is_empty());

    town.scheduler
        .schedule_event(EventKind::HotelConvention, HOTEL, start + 1, start + 600)
        .unwrap();
    let visit = town.run(start + 1, start + FRAMES_PER_HOUR + 1);
    assert_eq!(visit.len(), 1);
    assert_eq!(visit[0].0, start + FRAMES_PER_HOUR);
    assert_eq!(visit[0].1.action, ScheduledState::GoToRelax);
    assert_eq!(visit[0].1.target, HOTEL);

    town.move_citizen(retiree, Location::Visit, Some(HOTEL));
    town.run(start + FRAMES_PER_HOUR + 1, start + FRAMES_PER_HOUR + 2);
    assert_eq!(
        town.scheduler.citizen_schedule(retiree).unwrap().current_state,
        ResidentState::Relaxing
    );

    town.move_citizen(retiree, Location::Home, None);
    let after = town.run(start + 600, start + 900);
    assert!(after.iter().all(|(_, d)| d.target != HOTEL));
}

/// Tick `from..to` the way a host moves people: a decision puts the citizen on
/// the road and they arrive after their travel time. Returns the frames at
/// which a worker stood inside a closed workplace, and whether anyone worked.
fn run_commuting(
    town: &mut Town,
    workers: &[CitizenId],
    from: Frame,
    to: Frame,
) -> (Vec<(Frame, CitizenId)>, bool) {
    let mut on_the_road: Vec<(Frame, CitizenId, Location, Option<BuildingId>)> = Vec::new();
    let mut closed = Vec::new();
    let mut worked = false;
    for frame in from..to {
        let clock = town.clock(frame);
        let (arrived, still_moving): (Vec<_>, Vec<_>) =
            on_the_road.into_iter().partition(|trip| trip.0 <= frame);
        on_the_road = still_moving;
        for (_, citizen, location, visit) in arrived {
            town.move_citizen(citizen, location, visit);
        }

        for event in town.scheduler.tick(&clock, &town.city) {
            let SchedulerEvent::Citizen(decision) = event else {
                continue;
            };
            let travel = town
                .scheduler
                .citizen_schedule(decision.citizen)
                .map_or(0.25, |s| s.travel_hours);
            let (location, visit) = match decision.action {
                ScheduledState::GoHome => (Location::Home, None),
                ScheduledState::GoToWork | ScheduledState::GoToSchool => (Location::Work, None),
                _ => (Location::Visit, Some(decision.target)),
            };
            town.move_citizen(decision.citizen, Location::Moving, None);
            on_the_road.push((frame + clock.hours_to_frames(travel as f64), decision.citizen, location, visit));
        }

        for &worker in workers {
            let at_work = town.city.citizens.get(&worker).map(|f| f.location);
            if at_work == Some(Location::Work) {
                worked = true;
                if !town.scheduler.is_building_working(OFFICE, &clock) {
                    closed.push((frame, worker));
                }
            }
        }
    }
    (closed, worked)
}

fn legal_policy() -> impl Strategy<Value = WorkTimePolicy> {
    (any::<bool>(), any::<bool>(), 0u8..3, 1u8..4).prop_map(|(night, weekends, pattern, shifts)| {
        let policy = WorkTimePolicy::new(night, weekends, shifts);
        match pattern {
            1 => policy.with_extended_shift(true),
            2 => policy.with_continuous_shift(true),
            _ => policy,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Over a weekend, no worker is ever inside the workplace while it is closed
    #[test]
    fn prop_workers_only_inside_open_workplaces(policy in legal_policy()) {
        let mut town = Town::new(quiet_config());
        town.scheduler.set_policy(ProfileTarget::Instance(OFFICE), policy);
        let crew = [CitizenId(1), CitizenId(2), CitizenId(3)];
        for id in crew {
            town.add_citizen(id, CitizenFacts::resident(30, HOME).working_at(OFFICE));
        }

        let (closed, worked) = run_commuting(
            &mut town,
            &crew,
            frame_at(Weekday::Friday, 0.0),
            frame_at(Weekday::Monday, 12.0),
        );
        prop_assert!(worked, "{:?}: nobody went to work", policy);
        prop_assert!(
            closed.is_empty(),
            "{:?}: at work while closed {:?}",
            policy,
            &closed[..closed.len().min(5)]
        );
    }
}
