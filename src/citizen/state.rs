//! Citizen states, statuses and the host-supplied citizen facts

use serde::{Deserialize, Serialize};

use crate::core::config::CitizenConfig;
use crate::core::types::BuildingId;

/// What a citizen is doing right now, derived from location and context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResidentState {
    #[default]
    Unknown,
    /// Excluded from scheduling (dummy traffic)
    Ignored,
    AtHome,
    InTransition,
    AtWork,
    AtSchool,
    Shopping,
    Relaxing,
    Breakfast,
    Lunch,
    Visiting,
    InShelter,
    Evacuating,
}

/// The next action planned for a citizen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScheduledState {
    /// Nothing to do; re-evaluate at the scheduled time
    #[default]
    None,
    GoHome,
    GoToWork,
    GoToSchool,
    GoShopping,
    GoToRelax,
    GoToBreakfast,
    GoToLunch,
    GoToShelter,
}

impl ScheduledState {
    pub fn is_leisure(self) -> bool {
        matches!(
            self,
            ScheduledState::GoShopping
                | ScheduledState::GoToRelax
                | ScheduledState::GoToBreakfast
                | ScheduledState::GoToLunch
        )
    }
}

/// Raw location reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Home,
    Work,
    Visit,
    Moving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScheduleHint {
    #[default]
    None,
    /// Moving on a scripted tour
    OnTour,
    /// Heading to or attending a city event
    AttendingEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkStatus {
    #[default]
    None,
    Working,
    OnVacation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchoolStatus {
    #[default]
    None,
    Studying,
    OnVacation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchoolClass {
    #[default]
    NoClass,
    /// Elementary and high school day classes
    DayClass,
    /// University lectures, only during an academic year
    Lecture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Education {
    #[default]
    Uneducated,
    OneSchool,
    TwoSchools,
    ThreeSchools,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Child,
    Teen,
    YoungAdult,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn from_age(age: u8, config: &CitizenConfig) -> Self {
        if age < config.teen_age {
            AgeGroup::Child
        } else if age < config.young_adult_age {
            AgeGroup::Teen
        } else if age < config.adult_age {
            AgeGroup::YoungAdult
        } else if age < config.senior_age {
            AgeGroup::Adult
        } else {
            AgeGroup::Senior
        }
    }

    pub fn attends_day_school(self) -> bool {
        matches!(self, AgeGroup::Child | AgeGroup::Teen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitizenFlags {
    pub dummy_traffic: bool,
    pub tourist: bool,
    /// The work building is the citizen's school
    pub student: bool,
    pub on_tour: bool,
}

/// Read-only citizen facts supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitizenFacts {
    pub flags: CitizenFlags,
    pub age: u8,
    pub education: Education,
    pub home: Option<BuildingId>,
    /// Workplace, or school for students
    pub work: Option<BuildingId>,
    pub visit: Option<BuildingId>,
    pub hotel: Option<BuildingId>,
    pub location: Location,
}

impl CitizenFacts {
    pub fn resident(age: u8, home: BuildingId) -> Self {
        Self {
            age,
            home: Some(home),
            ..Self::default()
        }
    }

    pub fn working_at(mut self, work: BuildingId) -> Self {
        self.work = Some(work);
        self.flags.student = false;
        self
    }

    pub fn studying_at(mut self, school: BuildingId) -> Self {
        self.work = Some(school);
        self.flags.student = true;
        self
    }

    pub fn at(mut self, location: Location, visit: Option<BuildingId>) -> Self {
        self.location = location;
        if location == Location::Visit {
            self.visit = visit;
        }
        self
    }

    /// Where the citizen sleeps: home, or the hotel for tourists
    pub fn base(&self) -> Option<BuildingId> {
        self.home.or(self.hotel)
    }

    /// Building the citizen is currently inside
    pub fn current_building(&self) -> Option<BuildingId> {
        match self.location {
            Location::Home => self.base(),
            Location::Work => self.work,
            Location::Visit => self.visit.or(self.hotel),
            Location::Moving => None,
        }
    }

    pub fn school(&self) -> Option<BuildingId> {
        self.work.filter(|_| self.flags.student)
    }

    pub fn workplace(&self) -> Option<BuildingId> {
        self.work.filter(|_| !self.flags.student)
    }
}
