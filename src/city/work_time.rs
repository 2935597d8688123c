//! Work-time policies and the shift table
//!
//! A policy says when a building is staffed: night work, weekend work, the
//! shift pattern and how many shifts run. Policies are always kept in
//! normalized form, so the shift count agrees with the pattern flags.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::city::building::{BuildingKind, BuildingService, SubService};
use crate::core::config::DayConfig;

/// Work-time policy of a building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkTimePolicy {
    pub work_at_night: bool,
    pub work_at_weekends: bool,
    pub has_extended_shift: bool,
    pub has_continuous_shift: bool,
    pub shift_count: u8,
    /// Locked policies survive bulk resets
    pub is_locked: bool,
}

impl Default for WorkTimePolicy {
    fn default() -> Self {
        Self::ALWAYS_OPEN
    }
}

impl WorkTimePolicy {
    /// Fallback when nothing else resolves: staffed around the clock
    pub const ALWAYS_OPEN: WorkTimePolicy = WorkTimePolicy {
        work_at_night: true,
        work_at_weekends: true,
        has_extended_shift: false,
        has_continuous_shift: false,
        shift_count: 3,
        is_locked: false,
    };

    /// Build a normalized policy
    pub fn new(work_at_night: bool, work_at_weekends: bool, shift_count: u8) -> Self {
        Self {
            work_at_night,
            work_at_weekends,
            has_extended_shift: false,
            has_continuous_shift: false,
            shift_count,
            is_locked: false,
        }
        .normalized()
    }

    /// Legal shift counts for a shift pattern
    pub fn legal_shift_counts(continuous: bool, night: bool) -> RangeInclusive<u8> {
        match (continuous, night) {
            (true, true) => 2..=2,
            (true, false) => 1..=1,
            (false, true) => 3..=3,
            (false, false) => 1..=2,
        }
    }

    /// Clamp the policy into a legal combination
    ///
    /// Extended and continuous shifts are exclusive; when both are set the
    /// continuous pattern is kept.
    pub fn normalized(mut self) -> Self {
        if self.has_extended_shift && self.has_continuous_shift {
            tracing::debug!("Policy requested both extended and continuous shift; keeping continuous");
            self.has_extended_shift = false;
        }
        let legal = Self::legal_shift_counts(self.has_continuous_shift, self.work_at_night);
        let clamped = self.shift_count.clamp(*legal.start(), *legal.end());
        if clamped != self.shift_count {
            tracing::debug!("Clamped shift count {} to {}", self.shift_count, clamped);
            self.shift_count = clamped;
        }
        self
    }

    pub fn is_normalized(&self) -> bool {
        !(self.has_extended_shift && self.has_continuous_shift)
            && Self::legal_shift_counts(self.has_continuous_shift, self.work_at_night)
                .contains(&self.shift_count)
    }

    pub fn with_night(mut self, work_at_night: bool) -> Self {
        self.work_at_night = work_at_night;
        self.normalized()
    }

    pub fn with_weekends(mut self, work_at_weekends: bool) -> Self {
        self.work_at_weekends = work_at_weekends;
        self
    }

    /// Setting the extended shift clears the continuous shift
    pub fn with_extended_shift(mut self, enabled: bool) -> Self {
        self.has_extended_shift = enabled;
        if enabled {
            self.has_continuous_shift = false;
        }
        self.normalized()
    }

    /// Setting the continuous shift clears the extended shift
    pub fn with_continuous_shift(mut self, enabled: bool) -> Self {
        self.has_continuous_shift = enabled;
        if enabled {
            self.has_extended_shift = false;
        }
        self.normalized()
    }

    pub fn with_shift_count(mut self, shift_count: u8) -> Self {
        self.shift_count = shift_count;
        self.normalized()
    }

    pub fn locked(mut self, is_locked: bool) -> Self {
        self.is_locked = is_locked;
        self
    }

    /// Shifts this policy staffs, in day order
    pub fn shifts(&self) -> Vec<WorkShift> {
        if self.has_continuous_shift {
            let mut shifts = vec![WorkShift::ContinuousDay];
            if self.work_at_night {
                shifts.push(WorkShift::ContinuousNight);
            }
            return shifts;
        }
        [WorkShift::First, WorkShift::Second, WorkShift::Night]
            .into_iter()
            .take(self.shift_count as usize)
            .collect()
    }

    /// Category default used when a building is first registered
    pub fn default_for(kind: BuildingKind, service: BuildingService, sub_service: SubService) -> Self {
        use BuildingService as S;

        match kind {
            BuildingKind::Hotel
            | BuildingKind::NursingHome
            | BuildingKind::Shelter
            | BuildingKind::GarbageFacility
            | BuildingKind::SnowDump => return Self::ALWAYS_OPEN,
            BuildingKind::LeisureCommercial => return Self::new(true, true, 3),
            BuildingKind::TouristCommercial | BuildingKind::Venue => return Self::new(false, true, 2),
            BuildingKind::Cafeteria => return Self::new(false, false, 2),
            BuildingKind::Gym | BuildingKind::Park | BuildingKind::Monument => {
                return Self::new(false, true, 2).with_continuous_shift(true)
            }
            BuildingKind::University | BuildingKind::School => return Self::new(false, false, 1),
            BuildingKind::PostOffice
            | BuildingKind::MaintenanceDepot
            | BuildingKind::ParkMaintenance => return Self::new(false, true, 2),
            BuildingKind::Generic => {}
        }

        match (service, sub_service) {
            (S::Commercial, SubService::CommercialLow) => Self::new(false, true, 1).with_extended_shift(true),
            (S::Commercial, _) => Self::new(false, true, 2),
            (S::Office, _) => Self::new(false, false, 1),
            (S::Industrial, SubService::IndustrialSpecialized) => Self::new(false, false, 2),
            (S::Industrial, _) => Self::new(true, true, 3),
            (S::Education, _) | (S::PlayerEducation, _) => Self::new(false, false, 1),
            (S::Beautification, _) | (S::Monument, _) => Self::new(false, true, 2),
            // Health care, emergency services, utilities, transport, roads
            _ => Self::ALWAYS_OPEN,
        }
    }
}

/// A shift a building staffs and a worker is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkShift {
    #[default]
    Unemployed,
    First,
    Second,
    Night,
    ContinuousDay,
    ContinuousNight,
}

impl WorkShift {
    /// Hour window covered by the shift at a building staffed by `policy`
    ///
    /// Plain shifts split the open span evenly, starting at the work begin hour.
    /// The span is the whole day with night work and ends at bedtime without it.
    /// No shift runs longer than the configured shift length.
    pub fn window(self, policy: &WorkTimePolicy, day: &DayConfig) -> Option<HourWindow> {
        let begin = day.work_begin_hour;
        let span = if policy.work_at_night {
            24.0
        } else {
            (day.go_to_sleep_hour - begin).rem_euclid(24.0)
        };
        let len = (span / policy.shift_count.max(1) as f32).min(day.shift_length_hours);
        let block = |n: f32| HourWindow::new(begin + len * n, begin + len * (n + 1.0));
        match self {
            WorkShift::Unemployed => None,
            WorkShift::First => Some(block(0.0)),
            WorkShift::Second => Some(block(1.0)),
            WorkShift::Night => Some(block(2.0)),
            WorkShift::ContinuousDay => Some(HourWindow::new(
                day.continuous_day_begin_hour,
                day.continuous_day_end_hour,
            )),
            WorkShift::ContinuousNight => Some(HourWindow::new(
                day.continuous_day_end_hour,
                day.continuous_day_begin_hour,
            )),
        }
    }
}

/// Half-open window of hours that may wrap past midnight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourWindow {
    pub begin: f32,
    pub end: f32,
}

impl HourWindow {
    /// Hours are normalized into [0, 24)
    pub fn new(begin: f32, end: f32) -> Self {
        Self {
            begin: begin.rem_euclid(24.0),
            end: end.rem_euclid(24.0),
        }
    }

    pub fn contains(&self, hour: f32) -> bool {
        if self.begin < self.end {
            hour >= self.begin && hour < self.end
        } else if self.begin > self.end {
            hour >= self.begin || hour < self.end
        } else {
            // begin == end: a full day
            true
        }
    }

    pub fn length(&self) -> f32 {
        let len = (self.end - self.begin).rem_euclid(24.0);
        if len == 0.0 {
            24.0
        } else {
            len
        }
    }
}
