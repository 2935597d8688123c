//! Per-citizen schedule records

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::citizen::state::{
    ResidentState, ScheduleHint, ScheduledState, SchoolClass, SchoolStatus, WorkStatus,
};
use crate::city::work_time::WorkShift;
use crate::core::calendar::SimulatedClock;
use crate::core::types::{BuildingId, CitizenId, Frame};

/// Schedule of one citizen, owned by the schedule engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CitizenSchedule {
    /// Last action the citizen was sent on
    pub last_scheduled_state: ScheduledState,
    /// Derived each update; cached for change detection
    pub current_state: ResidentState,
    /// Planned next action
    pub scheduled_state: ScheduledState,
    /// Frame at which the planned action is due; never in the past once set
    pub scheduled_state_time: Option<Frame>,
    /// Destination picked for the planned action, if already known
    pub scheduled_target: Option<BuildingId>,
    pub work_status: WorkStatus,
    pub school_status: SchoolStatus,
    pub work_shift: WorkShift,
    /// Workplace the shift was assigned for
    pub shift_workplace: Option<BuildingId>,
    pub school_class: SchoolClass,
    pub vacation_days_left: u8,
    pub hint: ScheduleHint,
    /// One-way commute estimate in hours
    pub travel_hours: f32,
    /// Day index of the last daily bookkeeping pass
    pub last_day: Option<u64>,
}

impl CitizenSchedule {
    /// Plan `state` at `frame`, never earlier than now
    pub fn schedule(&mut self, state: ScheduledState, frame: Frame, clock: &SimulatedClock) {
        self.scheduled_state = state;
        self.scheduled_state_time = Some(frame.max(clock.frame()));
        self.scheduled_target = None;
    }

    pub fn schedule_to(
        &mut self,
        state: ScheduledState,
        target: BuildingId,
        frame: Frame,
        clock: &SimulatedClock,
    ) {
        self.schedule(state, frame, clock);
        self.scheduled_target = Some(target);
    }

    pub fn has_plan(&self) -> bool {
        self.scheduled_state_time.is_some()
    }

    pub fn is_due(&self, clock: &SimulatedClock) -> bool {
        self.scheduled_state_time.is_some_and(|frame| frame <= clock.frame())
    }

    /// Drop the pending plan
    pub fn cancel_plan(&mut self) {
        self.scheduled_state = ScheduledState::None;
        self.scheduled_state_time = None;
        self.scheduled_target = None;
    }

    pub fn is_on_vacation(&self) -> bool {
        self.vacation_days_left > 0
    }
}

/// Schedules of every known citizen
#[derive(Debug, Clone, Default)]
pub struct ScheduleTable {
    schedules: AHashMap<CitizenId, CitizenSchedule>,
}

impl ScheduleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, citizen: CitizenId) -> Option<&CitizenSchedule> {
        self.schedules.get(&citizen)
    }

    pub fn get_mut(&mut self, citizen: CitizenId) -> Option<&mut CitizenSchedule> {
        self.schedules.get_mut(&citizen)
    }

    pub fn entry(&mut self, citizen: CitizenId) -> &mut CitizenSchedule {
        self.schedules.entry(citizen).or_default()
    }

    pub fn insert(&mut self, citizen: CitizenId, schedule: CitizenSchedule) {
        self.schedules.insert(citizen, schedule);
    }

    /// Reset a citizen's schedule to the initial state
    pub fn clear(&mut self, citizen: CitizenId) -> bool {
        match self.schedules.get_mut(&citizen) {
            Some(schedule) => {
                *schedule = CitizenSchedule::default();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, citizen: CitizenId) -> Option<CitizenSchedule> {
        self.schedules.remove(&citizen)
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CitizenId, &CitizenSchedule)> + '_ {
        self.schedules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SchedulerConfig;

    #[test]
    fn test_schedule_never_in_past() {
        let clock = SimulatedClock::from_config(500, &SchedulerConfig::default());
        let mut schedule = CitizenSchedule::default();
        schedule.schedule(ScheduledState::GoHome, 100, &clock);
        assert_eq!(schedule.scheduled_state_time, Some(500));
        assert!(schedule.is_due(&clock));

        schedule.schedule_to(ScheduledState::GoToWork, BuildingId(4), 900, &clock);
        assert!(!schedule.is_due(&clock));
        assert_eq!(schedule.scheduled_target, Some(BuildingId(4)));
        schedule.cancel_plan();
        assert!(!schedule.has_plan());
    }

    #[test]
    fn test_clear_resets_record() {
        let mut table = ScheduleTable::new();
        table.entry(CitizenId(1)).vacation_days_left = 3;
        assert!(table.clear(CitizenId(1)));
        assert_eq!(table.get(CitizenId(1)), Some(&CitizenSchedule::default()));
        assert!(!table.clear(CitizenId(2)));
    }
}
