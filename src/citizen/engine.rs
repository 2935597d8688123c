//! Citizen schedule engine
//!
//! Once per tick and citizen the engine derives the current state, runs the
//! daily bookkeeping (vacations, shift assignment), plans the next action when
//! nothing is planned, and issues a `CitizenDecision` when the planned action
//! falls due. A change of the derived state drops a stale plan.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::citizen::admission::{AdmissionGuard, VisitPurpose};
use crate::citizen::schedule::{CitizenSchedule, ScheduleTable};
use crate::citizen::state::{
    AgeGroup, CitizenFacts, Location, ResidentState, ScheduleHint, ScheduledState, SchoolClass,
    SchoolStatus, WorkStatus,
};
use crate::citizen::state_table::{derive_state, BuildingContext};
use crate::city::activity::BuildingActivity;
use crate::city::building::{BuildingKind, RegisteredBuilding};
use crate::city::units::{CitizenUnitArena, UnitKind};
use crate::city::work_time::{HourWindow, WorkShift};
use crate::core::calendar::{SimulatedClock, Weekday};
use crate::core::types::{BuildingId, CitizenId, Frame};
use crate::events::manager::EventManager;
use crate::simulation::host::CityFacts;

/// Candidates considered when picking a destination
const NEAREST_CANDIDATES: usize = 3;

/// Everything the engine reads while updating one citizen
pub struct ScheduleContext<'a> {
    pub activity: &'a BuildingActivity<'a>,
    pub units: &'a CitizenUnitArena,
    pub events: &'a EventManager,
    pub city: &'a dyn CityFacts,
}

/// A move order for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenDecision {
    pub citizen: CitizenId,
    pub action: ScheduledState,
    pub target: BuildingId,
}

/// Work or school trip the citizen owes next
#[derive(Debug, Clone, Copy)]
struct Duty {
    action: ScheduledState,
    target: BuildingId,
    leave: Frame,
}

pub struct CitizenScheduleEngine {
    rng: ChaCha8Rng,
    schedules: ScheduleTable,
}

impl CitizenScheduleEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            schedules: ScheduleTable::new(),
        }
    }

    pub fn schedule(&self, citizen: CitizenId) -> Option<&CitizenSchedule> {
        self.schedules.get(citizen)
    }

    pub fn schedules(&self) -> &ScheduleTable {
        &self.schedules
    }

    /// Operator reset of one citizen's schedule
    pub fn clear_schedule(&mut self, citizen: CitizenId) -> bool {
        let cleared = self.schedules.clear(citizen);
        if cleared {
            tracing::info!("Cleared schedule of {}", citizen);
        }
        cleared
    }

    pub fn forget(&mut self, citizen: CitizenId) {
        self.schedules.remove(citizen);
    }

    pub fn update(
        &mut self,
        citizen: CitizenId,
        facts: &CitizenFacts,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) -> Option<CitizenDecision> {
        let mut schedule = self.schedules.get(citizen).copied().unwrap_or_default();
        let decision = self.update_schedule(citizen, facts, &mut schedule, ctx, clock);
        self.schedules.insert(citizen, schedule);
        decision
    }

    fn update_schedule(
        &mut self,
        citizen: CitizenId,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) -> Option<CitizenDecision> {
        let building = current_context(facts, ctx);
        let state = derive_state(facts, building, schedule.last_scheduled_state, schedule.work_status);
        let changed = state != schedule.current_state;
        schedule.current_state = state;

        match state {
            ResidentState::Ignored => {
                schedule.cancel_plan();
                return None;
            }
            ResidentState::InTransition => {
                if facts.flags.on_tour {
                    schedule.hint = ScheduleHint::OnTour;
                }
                return None;
            }
            _ => {}
        }
        if schedule.hint == ScheduleHint::OnTour {
            schedule.hint = ScheduleHint::None;
        }

        self.daily_bookkeeping(citizen, facts, schedule, ctx, clock);

        if changed {
            schedule.cancel_plan();
        }

        let evacuating = building.is_some_and(|b| b.evacuating);
        if evacuating
            && state != ResidentState::InShelter
            && schedule.scheduled_state != ScheduledState::GoToShelter
        {
            tracing::debug!("{} must evacuate", citizen);
            schedule.schedule(ScheduledState::GoToShelter, clock.frame(), clock);
        }

        if schedule.is_due(clock) && schedule.scheduled_state == ScheduledState::None {
            schedule.cancel_plan();
        }
        if !schedule.has_plan() {
            self.plan(facts, schedule, ctx, clock);
        }
        if !schedule.is_due(clock) {
            return None;
        }
        self.execute(citizen, facts, schedule, ctx, clock)
    }

    fn daily_bookkeeping(
        &mut self,
        citizen: CitizenId,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) {
        let today = clock.day_index();
        let new_day = schedule.last_day != Some(today);
        if new_day {
            if schedule.last_day.is_some() && schedule.vacation_days_left > 0 {
                schedule.vacation_days_left -= 1;
            }
            schedule.last_day = Some(today);
            self.maybe_start_vacation(citizen, facts, schedule, ctx);
        }

        if let Some(work) = facts.workplace() {
            let staffed = ctx.activity.policy(work).policy.shifts().contains(&schedule.work_shift);
            if new_day || schedule.shift_workplace != Some(work) || !staffed {
                schedule.work_shift = assign_shift(citizen, work, ctx);
                schedule.shift_workplace = Some(work);
                schedule.travel_hours = travel_hours(facts.base(), work, ctx);
            }
        } else {
            schedule.work_shift = WorkShift::Unemployed;
            schedule.shift_workplace = None;
        }

        let on_vacation = schedule.is_on_vacation();
        schedule.work_status = match (facts.workplace(), on_vacation) {
            (None, _) => WorkStatus::None,
            (Some(_), true) => WorkStatus::OnVacation,
            (Some(_), false) => WorkStatus::Working,
        };
        schedule.school_status = match (facts.school(), on_vacation) {
            (None, _) => SchoolStatus::None,
            (Some(_), true) => SchoolStatus::OnVacation,
            (Some(_), false) => SchoolStatus::Studying,
        };
        schedule.school_class = match facts.school().and_then(|s| ctx.activity.registry().kind(s)) {
            Some(BuildingKind::University) => SchoolClass::Lecture,
            Some(_) => SchoolClass::DayClass,
            None => SchoolClass::NoClass,
        };
        if let Some(school) = facts.school() {
            if facts.workplace().is_none() {
                schedule.travel_hours = travel_hours(facts.base(), school, ctx);
            }
        }
    }

    /// Vacations are taken by the whole household at once
    fn maybe_start_vacation(
        &mut self,
        citizen: CitizenId,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
    ) {
        let config = &ctx.activity.config().citizens;
        if schedule.is_on_vacation() || facts.work.is_none() || facts.flags.tourist {
            return;
        }
        if self.rng.gen::<f32>() >= config.vacation_chance_per_day {
            return;
        }
        let days = config.vacation_length_days.min(u8::MAX as u32) as u8;
        schedule.vacation_days_left = days;
        let Some(home) = facts.home else {
            return;
        };
        let household = ctx.units.household_of(home, citizen);
        for member in household.into_iter().filter(|m| *m != citizen) {
            let entry = self.schedules.entry(member);
            entry.vacation_days_left = entry.vacation_days_left.max(days);
        }
        tracing::debug!("{} and household start a {}-day vacation", citizen, days);
    }

    fn plan(
        &mut self,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) {
        let config = ctx.activity.config();
        let at_base = facts.current_building().is_some() && facts.current_building() == facts.base();
        match schedule.current_state {
            ResidentState::AtHome | ResidentState::Unknown => self.plan_from_home(facts, schedule, ctx, clock),
            ResidentState::Visiting if at_base => self.plan_from_home(facts, schedule, ctx, clock),
            ResidentState::AtWork => self.plan_at_work(facts, schedule, ctx, clock),
            ResidentState::AtSchool => self.plan_at_school(facts, schedule, ctx, clock),
            ResidentState::Breakfast | ResidentState::Lunch => {
                let back = clock.frame_after_hours(config.citizens.meal_stay_hours as f64);
                match self.duty_target(facts, schedule, ctx, clock) {
                    Some((action, target)) => schedule.schedule_to(action, target, back, clock),
                    None => schedule.schedule(ScheduledState::GoHome, back, clock),
                }
            }
            ResidentState::Shopping => {
                let leave = leave_after(config.citizens.shopping_stay_hours, ctx, clock);
                schedule.schedule(ScheduledState::GoHome, leave, clock);
            }
            ResidentState::Relaxing => {
                let leave = leave_after(config.citizens.relax_stay_hours, ctx, clock);
                schedule.schedule(ScheduledState::GoHome, leave, clock);
            }
            ResidentState::Visiting => {
                let leave = leave_after(config.citizens.visit_stay_hours, ctx, clock);
                schedule.schedule(ScheduledState::GoHome, leave, clock);
            }
            ResidentState::InShelter => {
                let base_evacuating = facts
                    .base()
                    .and_then(|b| ctx.city.building(b))
                    .is_some_and(|b| b.flags.evacuating);
                if base_evacuating {
                    schedule.schedule(ScheduledState::None, recheck_frame(ctx, clock), clock);
                } else {
                    schedule.schedule(ScheduledState::GoHome, clock.frame(), clock);
                }
            }
            ResidentState::Evacuating => {
                schedule.schedule(ScheduledState::GoToShelter, clock.frame(), clock);
            }
            ResidentState::Ignored | ResidentState::InTransition => {}
        }
    }

    fn plan_from_home(
        &mut self,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) {
        let config = ctx.activity.config();
        let duty = self.next_duty(facts, schedule, ctx, clock);
        let recheck = recheck_frame(ctx, clock);

        if clock.is_night_time() {
            let wake = clock.frame_at_next_hour(config.day.wake_up_hour);
            match duty {
                Some(duty) if duty.leave <= wake => schedule.schedule_to(duty.action, duty.target, duty.leave, clock),
                _ => schedule.schedule(ScheduledState::None, wake, clock),
            }
            return;
        }

        let free_hours = match duty {
            Some(duty) => clock.frames_to_hours(duty.leave.saturating_sub(clock.frame())) as f32,
            None => clock.hours_until(config.day.go_to_sleep_hour),
        };

        if let Some(duty) = duty {
            if duty.leave <= recheck {
                let meal = config.citizens.meal_stay_hours;
                let breakfast_at = duty.leave.saturating_sub(clock.hours_to_frames(meal as f64));
                let breakfast_hour = clock.at_frame(breakfast_at).hour();
                let breakfast_window = HourWindow::new(config.day.breakfast_begin_hour, config.day.breakfast_end_hour);
                if breakfast_at > clock.frame()
                    && breakfast_window.contains(breakfast_hour)
                    && self.rng.gen::<f32>() < config.citizens.breakfast_chance
                {
                    schedule.schedule(ScheduledState::GoToBreakfast, breakfast_at, clock);
                } else {
                    schedule.schedule_to(duty.action, duty.target, duty.leave, clock);
                }
                return;
            }
        }

        let group = AgeGroup::from_age(facts.age, &config.citizens);
        let roll = self.rng.gen::<f32>();
        let round_trip = 2.0 * config.citizens.min_travel_hours;
        let citizens = &config.citizens;
        let next = if group != AgeGroup::Child
            && roll < citizens.shopping_chance
            && free_hours >= citizens.shopping_stay_hours + round_trip
        {
            ScheduledState::GoShopping
        } else if roll < citizens.shopping_chance + citizens.relax_chance
            && free_hours >= citizens.relax_stay_hours + round_trip
        {
            ScheduledState::GoToRelax
        } else {
            ScheduledState::None
        };

        if next == ScheduledState::None {
            let at = duty.map_or(recheck, |d| d.leave.min(recheck));
            schedule.schedule(ScheduledState::None, at.max(clock.frame() + 1), clock);
        } else {
            schedule.schedule(next, clock.frame(), clock);
        }
    }

    fn plan_at_work(
        &mut self,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) {
        let config = ctx.activity.config();
        let (Some(work), false) = (facts.workplace(), schedule.is_on_vacation()) else {
            schedule.schedule(ScheduledState::GoHome, clock.frame(), clock);
            return;
        };
        let Some(window) = ctx.activity.shift_window(work, schedule.work_shift) else {
            schedule.schedule(ScheduledState::GoHome, clock.frame(), clock);
            return;
        };
        let hour = clock.hour();
        if !window.contains(hour) || !ctx.activity.is_working(work, clock) {
            schedule.schedule(ScheduledState::GoHome, clock.frame(), clock);
            return;
        }
        let mut end = clock.frame_at_next_hour(window.end);
        if !ctx.activity.policy(work).policy.work_at_weekends {
            // Night shifts must not run into a closed weekend
            let midnight = clock.frame_at_next_hour(0.0);
            if midnight > clock.frame() && clock.at_frame(midnight).is_weekend() {
                end = end.min(midnight);
            }
        }

        let lunch_shift = matches!(schedule.work_shift, WorkShift::First | WorkShift::ContinuousDay);
        let lunch = config.day.lunch_begin_hour;
        if lunch_shift
            && hour < lunch
            && window.contains(lunch)
            && schedule.last_scheduled_state != ScheduledState::GoToLunch
            && self.rng.gen::<f32>() < config.citizens.lunch_chance
        {
            schedule.schedule(ScheduledState::GoToLunch, clock.frame_at_next_hour(lunch), clock);
            return;
        }

        let end_hour = clock.at_frame(end).hour();
        let evening_free = !crate::core::calendar::is_night_hour(
            end_hour,
            config.day.wake_up_hour,
            config.day.go_to_sleep_hour,
        );
        let next = if evening_free && self.rng.gen::<f32>() < config.citizens.after_work_leisure_chance {
            if self.rng.gen_bool(0.5) {
                ScheduledState::GoShopping
            } else {
                ScheduledState::GoToRelax
            }
        } else {
            ScheduledState::GoHome
        };
        schedule.schedule(next, end, clock);
    }

    fn plan_at_school(
        &mut self,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) {
        let config = ctx.activity.config();
        let window = HourWindow::new(config.day.school_begin_hour, config.day.school_end_hour);
        if facts.school().is_none() || !window.contains(clock.hour()) {
            schedule.schedule(ScheduledState::GoHome, clock.frame(), clock);
            return;
        }
        let end = clock.frame_at_next_hour(window.end);
        let teen = AgeGroup::from_age(facts.age, &config.citizens) != AgeGroup::Child;
        let next = if teen && self.rng.gen::<f32>() < config.citizens.after_work_leisure_chance {
            ScheduledState::GoToRelax
        } else {
            ScheduledState::GoHome
        };
        schedule.schedule(next, end, clock);
    }

    /// Work or school destination for a citizen returning from a meal
    fn duty_target(
        &self,
        facts: &CitizenFacts,
        schedule: &CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) -> Option<(ScheduledState, BuildingId)> {
        if schedule.is_on_vacation() {
            return None;
        }
        if let Some(work) = facts.workplace() {
            let window = ctx.activity.shift_window(work, schedule.work_shift)?;
            return window.contains(clock.hour()).then_some((ScheduledState::GoToWork, work));
        }
        let config = ctx.activity.config();
        let school = facts.school()?;
        HourWindow::new(config.day.school_begin_hour, config.day.school_end_hour)
            .contains(clock.hour())
            .then_some((ScheduledState::GoToSchool, school))
    }

    fn next_duty(
        &self,
        facts: &CitizenFacts,
        schedule: &CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) -> Option<Duty> {
        if schedule.is_on_vacation() {
            return None;
        }
        let config = ctx.activity.config();
        let group = AgeGroup::from_age(facts.age, &config.citizens);
        let mut duties = Vec::with_capacity(2);

        if let Some(work) = facts.workplace().filter(|_| !group.attends_day_school()) {
            if let Some(window) = ctx.activity.shift_window(work, schedule.work_shift) {
                let policy = ctx.activity.policy(work).policy;
                let accept = move |day: Weekday| policy.work_at_weekends || !day.is_weekend();
                let leave = duty_departure(window, schedule.travel_hours, accept, clock);
                duties.push(Duty {
                    action: ScheduledState::GoToWork,
                    target: work,
                    leave,
                });
            }
        }

        if let Some(school) = facts.school() {
            let lectures_running = match ctx.activity.registry().kind(school) {
                Some(BuildingKind::University) => ctx
                    .events
                    .is_academic_year_active(school, ctx.activity.registry()),
                Some(_) => true,
                None => false,
            };
            if lectures_running {
                let window = HourWindow::new(config.day.school_begin_hour, config.day.school_end_hour);
                let leave = duty_departure(window, schedule.travel_hours, |d| !d.is_weekend(), clock);
                duties.push(Duty {
                    action: ScheduledState::GoToSchool,
                    target: school,
                    leave,
                });
            }
        }

        duties.into_iter().min_by_key(|d| d.leave)
    }

    fn execute(
        &mut self,
        citizen: CitizenId,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) -> Option<CitizenDecision> {
        let action = schedule.scheduled_state;
        let preset = schedule.scheduled_target;
        schedule.cancel_plan();

        let target = preset.or_else(|| self.find_destination(action, facts, ctx, clock));
        let Some(target) = target else {
            return self.fallback(citizen, action, facts, schedule, ctx, clock);
        };
        if Some(target) == facts.current_building() {
            schedule.last_scheduled_state = action;
            return None;
        }

        schedule.last_scheduled_state = action;
        schedule.hint = if action.is_leisure() && ctx.events.has_active_event(target) {
            ScheduleHint::AttendingEvent
        } else {
            ScheduleHint::None
        };
        tracing::debug!("{} {:?} -> {}", citizen, action, target);
        Some(CitizenDecision {
            citizen,
            action,
            target,
        })
    }

    /// No destination for `action`: retry later or head home
    fn fallback(
        &mut self,
        citizen: CitizenId,
        action: ScheduledState,
        facts: &CitizenFacts,
        schedule: &mut CitizenSchedule,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) -> Option<CitizenDecision> {
        let recheck = recheck_frame(ctx, clock);
        match action {
            ScheduledState::GoToShelter => {
                tracing::warn!("No shelter with free space for {}", citizen);
                schedule.schedule(ScheduledState::GoToShelter, recheck, clock);
                None
            }
            _ if action.is_leisure() && facts.location != Location::Home => {
                let base = facts.base()?;
                if Some(base) == facts.current_building() {
                    schedule.schedule(ScheduledState::None, recheck, clock);
                    return None;
                }
                schedule.last_scheduled_state = ScheduledState::GoHome;
                Some(CitizenDecision {
                    citizen,
                    action: ScheduledState::GoHome,
                    target: base,
                })
            }
            _ => {
                schedule.schedule(ScheduledState::None, recheck, clock);
                None
            }
        }
    }

    fn find_destination(
        &mut self,
        action: ScheduledState,
        facts: &CitizenFacts,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
    ) -> Option<BuildingId> {
        let activity = ctx.activity;
        match action {
            ScheduledState::None => None,
            ScheduledState::GoHome => facts.base(),
            ScheduledState::GoToWork => facts.workplace(),
            ScheduledState::GoToSchool => facts.school(),
            ScheduledState::GoShopping => self.search(facts, ctx, clock, VisitPurpose::Shopping, true, |b| {
                activity.is_shopping_target(b.id, clock)
            }),
            ScheduledState::GoToRelax => {
                // Hotels only take day visitors while they host an event
                let events = ctx.events;
                self.search(facts, ctx, clock, VisitPurpose::Relax, true, |b| {
                    activity.is_entertainment_target(b.id, clock)
                        || (b.kind == BuildingKind::Hotel && events.has_active_event(b.id))
                })
            }
            ScheduledState::GoToBreakfast | ScheduledState::GoToLunch => {
                let campus = self.search(facts, ctx, clock, VisitPurpose::Meal, true, |b| {
                    b.kind == BuildingKind::Cafeteria
                });
                campus.or_else(|| {
                    self.search(facts, ctx, clock, VisitPurpose::Meal, true, |b| {
                        b.is_commercial() && b.kind != BuildingKind::Hotel
                    })
                })
            }
            ScheduledState::GoToShelter => self.search(facts, ctx, clock, VisitPurpose::Shelter, false, |b| {
                b.kind == BuildingKind::Shelter
            }),
        }
    }

    /// Pick one of the nearest admissible buildings matching `filter`
    fn search(
        &mut self,
        facts: &CitizenFacts,
        ctx: &ScheduleContext<'_>,
        clock: &SimulatedClock,
        purpose: VisitPurpose,
        limit_distance: bool,
        filter: impl Fn(&RegisteredBuilding) -> bool,
    ) -> Option<BuildingId> {
        let registry = ctx.activity.registry();
        let from = facts.current_building().or_else(|| facts.base())?;
        let origin = registry.get(from)?.position;
        let max_distance = ctx.activity.config().citizens.max_visit_distance;
        let guard = AdmissionGuard::new(ctx.activity, ctx.events);

        let mut candidates: Vec<(f32, BuildingId)> = registry
            .iter()
            .filter(|b| b.id != from && filter(b))
            .map(|b| (b.position.distance(origin), b.id))
            .filter(|(distance, _)| !limit_distance || *distance <= max_distance)
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let nearest: Vec<BuildingId> = candidates
            .into_iter()
            .map(|(_, id)| id)
            .filter(|id| guard.admits(facts, *id, purpose, clock))
            .take(NEAREST_CANDIDATES)
            .collect();
        if nearest.is_empty() {
            return None;
        }
        Some(nearest[self.rng.gen_range(0..nearest.len())])
    }
}

fn current_context(facts: &CitizenFacts, ctx: &ScheduleContext<'_>) -> Option<BuildingContext> {
    let id = facts.current_building()?;
    let info = ctx.activity.registry().get(id)?;
    let evacuating = ctx.city.building(id).is_some_and(|b| b.flags.evacuating);
    Some(BuildingContext::of(info, evacuating))
}

/// Shift for a worker: position in the workplace roster modulo the staffed shifts
fn assign_shift(citizen: CitizenId, work: BuildingId, ctx: &ScheduleContext<'_>) -> WorkShift {
    let shifts = ctx.activity.policy(work).policy.shifts();
    if shifts.is_empty() {
        return WorkShift::Unemployed;
    }
    let roster = ctx.units.citizens(work, UnitKind::Work);
    let slot = roster
        .iter()
        .position(|c| *c == citizen)
        .unwrap_or(citizen.0 as usize);
    shifts[slot % shifts.len()]
}

/// One-way travel estimate in hours
fn travel_hours(from: Option<BuildingId>, to: BuildingId, ctx: &ScheduleContext<'_>) -> f32 {
    let citizens = &ctx.activity.config().citizens;
    let distance = from.and_then(|from| ctx.activity.registry().distance(from, to));
    match distance {
        Some(distance) => (distance / citizens.travel_speed_per_hour.max(f32::EPSILON))
            .clamp(citizens.min_travel_hours, citizens.max_travel_hours),
        None => citizens.min_travel_hours,
    }
}

/// Departure frame for a duty window; leaves now when already late but in time to matter
///
/// `accept` judges the day the duty starts, which differs from the departure day
/// for shifts beginning at midnight.
fn duty_departure(
    window: HourWindow,
    travel: f32,
    accept: impl Fn(Weekday) -> bool,
    clock: &SimulatedClock,
) -> Frame {
    let hour = clock.hour();
    let hours_left = (window.end - hour).rem_euclid(24.0);
    let arrival = clock.at_frame(clock.frame_after_hours(travel as f64));
    if window.contains(hour) && accept(arrival.weekday()) && hours_left > travel + 1.0 {
        return clock.frame();
    }
    clock.departure_for_next_hour_on(window.begin, travel, accept)
}

/// Leave after `stay_hours`, but no later than bedtime
fn leave_after(stay_hours: f32, ctx: &ScheduleContext<'_>, clock: &SimulatedClock) -> Frame {
    if clock.is_night_time() {
        return clock.frame();
    }
    let bedtime = clock.frame_at_next_hour(ctx.activity.config().day.go_to_sleep_hour);
    clock.frame_after_hours(stay_hours as f64).min(bedtime)
}

fn recheck_frame(ctx: &ScheduleContext<'_>, clock: &SimulatedClock) -> Frame {
    let hours = ctx.activity.config().citizens.idle_recheck_hours.max(0.01);
    clock.frame_after_hours(hours as f64).max(clock.frame() + 1)
}
