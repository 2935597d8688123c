//! Headless schedule simulation
//!
//! Builds a small synthetic city, runs the scheduler for a number of simulated
//! days and prints what citizens and events did.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ahash::AHashMap;
use city_rhythm::citizen::{CitizenDecision, CitizenFacts, Location, ScheduledState};
use city_rhythm::city::{BuildingFacts, BuildingService, SubService, UnitKind};
use city_rhythm::core::types::{ArchetypeKey, BuildingId, CitizenId, Frame};
use city_rhythm::core::{DayPeriod, Result, SchedulerConfig, SimulatedClock};
use city_rhythm::events::EventTransition;
use city_rhythm::simulation::{CityFacts, CitySnapshot, RealTimeScheduler, SchedulerEvent};
use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Headless schedule simulation - synthetic city, N simulated days
#[derive(Parser, Debug)]
#[command(name = "schedule_sim")]
#[command(about = "Run the citizen and building scheduler on a synthetic city")]
struct Args {
    /// Simulated days to run
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Random seed for city generation and citizen decisions
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of citizens
    #[arg(long, default_value_t = 200)]
    citizens: u32,

    /// Scheduler configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Global work-time profiles (TOML)
    #[arg(long)]
    globals: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize, Default)]
struct Summary {
    days: u32,
    frames: Frame,
    citizens: u32,
    decisions: BTreeMap<String, u64>,
    decisions_by_period: BTreeMap<String, u64>,
    events_created: u64,
    events_completed: u64,
    events_cancelled: u64,
    hotel_check_outs: u64,
    /// Citizens at work, sampled at each hour of day and averaged over the run
    at_work_by_hour: Vec<f64>,
}

/// Arrival of a moving citizen
struct Trip {
    arrive_at: Frame,
    decision: CitizenDecision,
}

struct SyntheticCity {
    facts: CitySnapshot,
    homes: Vec<BuildingId>,
    offices: Vec<BuildingId>,
    shops: Vec<BuildingId>,
    school: BuildingId,
    university: BuildingId,
    hotel: BuildingId,
}

#[allow(clippy::too_many_arguments)]
fn place(
    scheduler: &mut RealTimeScheduler,
    city: &mut CitySnapshot,
    id: BuildingId,
    prefab: &str,
    ai_class: &str,
    service: BuildingService,
    sub_service: SubService,
    position: Vec2,
    units: &[(UnitKind, usize)],
    campus: Option<u16>,
) -> Result<()> {
    let facts = BuildingFacts::new(service, sub_service, position);
    city.set_building(id, facts);
    scheduler.register_building(id, ArchetypeKey::new(prefab, ai_class), &facts, campus);
    for (kind, count) in units {
        scheduler.allocate_units(id, *kind, *count)?;
    }
    Ok(())
}

fn build_city(
    scheduler: &mut RealTimeScheduler,
    rng: &mut ChaCha8Rng,
    citizens: u32,
) -> Result<SyntheticCity> {
    let mut facts = CitySnapshot::new();
    let mut next_id = 1u16;
    let mut take_id = || {
        let id = BuildingId(next_id);
        next_id += 1;
        id
    };
    fn spot(rng: &mut ChaCha8Rng) -> Vec2 {
        Vec2::new(rng.gen_range(0.0..1200.0), rng.gen_range(0.0..1200.0))
    }

    let home_count = (citizens as usize).div_ceil(8).max(1);
    let mut homes = Vec::with_capacity(home_count);
    for _ in 0..home_count {
        let id = take_id();
        let pos = spot(&mut *rng);
        place(scheduler, &mut facts, id, "Low Residential", "ResidentialBuildingAI",
            BuildingService::Residential, SubService::ResidentialLow, pos, &[(UnitKind::Home, 2)], None)?;
        homes.push(id);
    }

    let mut offices = Vec::new();
    for _ in 0..(citizens as usize / 40).max(1) {
        let id = take_id();
        let pos = spot(&mut *rng);
        place(scheduler, &mut facts, id, "Office", "OfficeBuildingAI",
            BuildingService::Office, SubService::OfficeGeneric, pos, &[(UnitKind::Work, 8), (UnitKind::Visit, 2)], None)?;
        offices.push(id);
    }

    let mut shops = Vec::new();
    for _ in 0..(citizens as usize / 30).max(2) {
        let id = take_id();
        let pos = spot(&mut *rng);
        place(scheduler, &mut facts, id, "Shop", "CommercialBuildingAI",
            BuildingService::Commercial, SubService::CommercialLow, pos, &[(UnitKind::Work, 2), (UnitKind::Visit, 4)], None)?;
        shops.push(id);
    }

    let center = Vec2::new(600.0, 600.0);
    let school = take_id();
    place(scheduler, &mut facts, school, "Elementary School", "SchoolAI",
        BuildingService::Education, SubService::None, center, &[(UnitKind::Work, 2), (UnitKind::Student, 20)], None)?;
    let university = take_id();
    place(scheduler, &mut facts, university, "University", "CampusBuildingAI",
        BuildingService::PlayerEducation, SubService::None, center + Vec2::new(200.0, 0.0),
        &[(UnitKind::Work, 2), (UnitKind::Student, 10)], Some(1))?;
    let cafeteria = take_id();
    place(scheduler, &mut facts, cafeteria, "Campus Cafeteria", "CampusCafeteriaAI",
        BuildingService::PlayerEducation, SubService::None, center + Vec2::new(250.0, 0.0),
        &[(UnitKind::Work, 1), (UnitKind::Visit, 6)], Some(1))?;
    let park = take_id();
    place(scheduler, &mut facts, park, "Park", "ParkAI",
        BuildingService::Beautification, SubService::None, center - Vec2::new(150.0, 0.0), &[(UnitKind::Visit, 10)], None)?;
    let stadium = take_id();
    place(scheduler, &mut facts, stadium, "Stadium", "StadiumAI",
        BuildingService::Tourism, SubService::None, center + Vec2::new(0.0, 300.0),
        &[(UnitKind::Work, 2), (UnitKind::Visit, 20)], None)?;
    let hotel = take_id();
    place(scheduler, &mut facts, hotel, "Hotel", "HotelAI",
        BuildingService::Commercial, SubService::CommercialTourist, center + Vec2::new(0.0, -200.0),
        &[(UnitKind::Work, 2), (UnitKind::Hotel, 4), (UnitKind::Visit, 4)], None)?;
    let shelter = take_id();
    place(scheduler, &mut facts, shelter, "Shelter", "ShelterAI",
        BuildingService::Disaster, SubService::None, center + Vec2::new(-300.0, -300.0), &[(UnitKind::Visit, 20)], None)?;

    let schedule_config = scheduler.config().citizens.clone();
    for n in 0..citizens {
        let id = CitizenId(n + 1);
        let home = homes[n as usize % homes.len()];
        let age: u8 = rng.gen_range(6..80);
        let mut citizen = CitizenFacts::resident(age, home);
        if age < schedule_config.young_adult_age {
            citizen = citizen.studying_at(school);
            scheduler.place_citizen(school, UnitKind::Student, id);
        } else if age < schedule_config.adult_age && rng.gen_bool(0.4) {
            citizen = citizen.studying_at(university);
            scheduler.place_citizen(university, UnitKind::Student, id);
        } else if age < schedule_config.senior_age {
            let pool = if rng.gen_bool(0.7) { &offices } else { &shops };
            let work = pool[rng.gen_range(0..pool.len())];
            if scheduler.place_citizen(work, UnitKind::Work, id) {
                citizen = citizen.working_at(work);
            }
        }
        scheduler.place_citizen(home, UnitKind::Home, id);
        facts.set_citizen(id, citizen);
    }
    facts.earliest_wake_up_hour = Some(scheduler.config().day.wake_up_hour);

    Ok(SyntheticCity {
        facts,
        homes,
        offices,
        shops,
        school,
        university,
        hotel,
    })
}

/// Host side of a decision: leave now, arrive after the travel time
fn depart(
    city: &mut CitySnapshot,
    scheduler: &mut RealTimeScheduler,
    decision: CitizenDecision,
    clock: &SimulatedClock,
    trips: &mut AHashMap<CitizenId, Trip>,
) {
    let Some(citizen) = city.citizen_mut(decision.citizen) else {
        return;
    };
    if let (Location::Visit, Some(visit)) = (citizen.location, citizen.visit) {
        scheduler.remove_citizen(visit, decision.citizen);
    }
    let from = citizen.current_building().or(citizen.base());
    citizen.location = Location::Moving;
    citizen.visit = None;

    let config = &scheduler.config().citizens;
    let distance = from
        .and_then(|from| scheduler.registry().distance(from, decision.target))
        .unwrap_or(0.0);
    let hours = (distance / config.travel_speed_per_hour).clamp(config.min_travel_hours, config.max_travel_hours);
    trips.insert(
        decision.citizen,
        Trip {
            arrive_at: clock.frame_after_hours(hours as f64),
            decision,
        },
    );
}

fn arrive(city: &mut CitySnapshot, scheduler: &mut RealTimeScheduler, trip: &Trip) {
    let decision = trip.decision;
    let Some(citizen) = city.citizen_mut(decision.citizen) else {
        return;
    };
    match decision.action {
        ScheduledState::GoHome => {
            citizen.location = Location::Home;
        }
        ScheduledState::GoToWork | ScheduledState::GoToSchool => {
            citizen.location = Location::Work;
        }
        _ => {
            if citizen.hotel == Some(decision.target) {
                citizen.location = Location::Home;
            } else if scheduler.place_citizen(decision.target, UnitKind::Visit, decision.citizen) {
                citizen.location = Location::Visit;
                citizen.visit = Some(decision.target);
            } else {
                // Full on arrival: turn back home
                citizen.location = Location::Home;
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("city_rhythm=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => SchedulerConfig::load_from_toml(path)?,
        None => SchedulerConfig::default(),
    };
    config.citizens.seed = args.seed;

    let mut scheduler = RealTimeScheduler::new(config);
    if let Some(path) = &args.globals {
        scheduler.load_global_profiles(path)?;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut city = build_city(&mut scheduler, &mut rng, args.citizens)?;
    tracing::info!(
        "Built city: {} homes, {} offices, {} shops, school {}, university {}",
        city.homes.len(),
        city.offices.len(),
        city.shops.len(),
        city.school,
        city.university
    );

    let clock0 = SimulatedClock::from_config(0, scheduler.config());
    let frames_per_hour = scheduler.config().time.frames_per_hour;
    let total_frames = clock0.hours_to_frames(args.days as f64 * 24.0);

    let mut summary = Summary {
        days: args.days,
        frames: total_frames,
        citizens: args.citizens,
        at_work_by_hour: vec![0.0; 24],
        ..Summary::default()
    };
    let mut samples_by_hour = [0u32; 24];
    let mut trips: AHashMap<CitizenId, Trip> = AHashMap::new();
    let mut tourist_id = args.citizens + 1;

    for frame in 0..total_frames {
        let clock = clock0.at_frame(frame);

        let mut arrived: Vec<CitizenId> = trips
            .iter()
            .filter(|(_, trip)| trip.arrive_at <= frame)
            .map(|(id, _)| *id)
            .collect();
        arrived.sort();
        for id in arrived {
            if let Some(trip) = trips.remove(&id) {
                arrive(&mut city.facts, &mut scheduler, &trip);
            }
        }

        // A tourist checks in once a day at noon when a room is free
        let noon = clock.hour() >= 12.0 && clock.at_frame(frame.saturating_sub(1)).hour() < 12.0;
        if noon {
            let tourist = CitizenId(tourist_id);
            if scheduler.book_hotel(tourist, city.hotel, rng.gen_range(1..4), &clock).is_ok() {
                let mut facts = CitizenFacts {
                    age: 30,
                    hotel: Some(city.hotel),
                    ..CitizenFacts::default()
                };
                facts.flags.tourist = true;
                city.facts.set_citizen(tourist, facts);
                tourist_id += 1;
            }
        }

        for event in scheduler.tick(&clock, &city.facts) {
            match event {
                SchedulerEvent::Citizen(decision) => {
                    *summary.decisions.entry(format!("{:?}", decision.action)).or_default() += 1;
                    let period = DayPeriod::from_hour(clock.hour(), &scheduler.config().day);
                    *summary.decisions_by_period.entry(format!("{:?}", period)).or_default() += 1;
                    depart(&mut city.facts, &mut scheduler, decision, &clock, &mut trips);
                }
                SchedulerEvent::Event(notice) => match notice.transition {
                    EventTransition::Created => summary.events_created += 1,
                    EventTransition::Completed => summary.events_completed += 1,
                    EventTransition::Cancelled => summary.events_cancelled += 1,
                    EventTransition::Started => {}
                },
                SchedulerEvent::HotelCheckOut { citizen, .. } => {
                    summary.hotel_check_outs += 1;
                    city.facts.citizens.remove(&citizen);
                    trips.remove(&citizen);
                    scheduler.forget_citizen(citizen);
                }
            }
        }

        if frame % (frames_per_hour.round().max(1.0) as u64) == 0 {
            let hour = (clock.hour() as usize).min(23);
            let at_work = city
                .facts
                .active_citizens()
                .into_iter()
                .filter_map(|id| city.facts.citizen(id))
                .filter(|c| c.location == Location::Work && !c.flags.student)
                .count();
            summary.at_work_by_hour[hour] += at_work as f64;
            samples_by_hour[hour] += 1;
        }
    }

    for (total, samples) in summary.at_work_by_hour.iter_mut().zip(samples_by_hour) {
        if samples > 0 {
            *total /= samples as f64;
        }
    }

    if args.format == "json" {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(err) => tracing::error!("Failed to serialize summary: {}", err),
        }
    } else {
        println!("=== Schedule Simulation ===");
        println!("Days: {}  Frames: {}  Citizens: {}", summary.days, summary.frames, summary.citizens);
        println!("Decisions:");
        for (action, count) in &summary.decisions {
            println!("  {:<16} {}", action, count);
        }
        println!("Decisions by time of day:");
        for (period, count) in &summary.decisions_by_period {
            println!("  {:<16} {}", period, count);
        }
        println!(
            "Events: {} created, {} completed, {} cancelled",
            summary.events_created, summary.events_completed, summary.events_cancelled
        );
        println!("Hotel check-outs: {}", summary.hotel_check_outs);
        println!("Average workers on site by hour:");
        for (hour, workers) in summary.at_work_by_hour.iter().enumerate() {
            println!("  {:02}:00 {:>6.1}", hour, workers);
        }
    }
    Ok(())
}
