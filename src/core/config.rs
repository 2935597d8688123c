//! Scheduler configuration with documented constants
//!
//! Hours are always hour-of-day floats in [0, 24). All values can be loaded from
//! a TOML document; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::core::calendar::Weekday;
use crate::core::error::{Result, SchedulerError};

/// Complete configuration for the scheduler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub time: TimeConfig,
    pub day: DayConfig,
    pub services: ServiceHoursConfig,
    pub citizens: CitizenConfig,
    pub events: EventConfig,
}

/// Mapping between host frames and simulated hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Host frames per simulated hour
    pub frames_per_hour: f64,
    /// Hour of day 0 at which frame 0 happens
    pub epoch_hour: f64,
    /// Day of week of day 0
    pub epoch_weekday: Weekday,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            frames_per_hour: 60.0,
            epoch_hour: 8.0,
            epoch_weekday: Weekday::Monday,
        }
    }
}

impl TimeConfig {
    /// Build timing from the host's hours-per-frame primitive
    pub fn from_hours_per_frame(hours_per_frame: f64) -> Self {
        Self {
            frames_per_hour: 1.0 / hours_per_frame,
            ..Self::default()
        }
    }
}

/// Daily rhythm shared by buildings and citizens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayConfig {
    /// End of night; citizens start their day
    pub wake_up_hour: f32,
    /// Start of night; buildings without night work close
    pub go_to_sleep_hour: f32,
    /// Begin of the first work shift
    ///
    /// Shifts are consecutive blocks of `shift_length_hours`:
    /// first, second, then night shift.
    pub work_begin_hour: f32,
    pub shift_length_hours: f32,
    /// Continuous day band; the continuous night band is its complement
    pub continuous_day_begin_hour: f32,
    pub continuous_day_end_hour: f32,
    pub school_begin_hour: f32,
    pub school_end_hour: f32,
    pub lunch_begin_hour: f32,
    pub lunch_end_hour: f32,
    pub breakfast_begin_hour: f32,
    pub breakfast_end_hour: f32,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            wake_up_hour: 6.0,
            go_to_sleep_hour: 22.0,
            work_begin_hour: 8.0,
            shift_length_hours: 8.0,
            continuous_day_begin_hour: 8.0,
            continuous_day_end_hour: 20.0,
            school_begin_hour: 8.0,
            school_end_hour: 14.0,
            lunch_begin_hour: 12.0,
            lunch_end_hour: 13.0,
            breakfast_begin_hour: 6.5,
            breakfast_end_hour: 9.0,
        }
    }
}

/// Service windows layered on top of building work hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceHoursConfig {
    pub mail_begin_hour: f32,
    pub mail_end_hour: f32,
    /// Garbage trucks run early so streets are clear for the rush hour
    pub garbage_begin_hour: f32,
    pub garbage_end_hour: f32,
    /// Low-density residential is only served on this day
    pub weekly_pickup_day: Weekday,
    pub park_maintenance_begin_hour: f32,
    pub park_maintenance_end_hour: f32,
    /// Road and snow services stay off the streets during these rush windows
    pub morning_rush_begin_hour: f32,
    pub morning_rush_end_hour: f32,
    pub evening_rush_begin_hour: f32,
    pub evening_rush_end_hour: f32,
}

impl Default for ServiceHoursConfig {
    fn default() -> Self {
        Self {
            mail_begin_hour: 8.0,
            mail_end_hour: 18.0,
            garbage_begin_hour: 4.0,
            garbage_end_hour: 12.0,
            weekly_pickup_day: Weekday::Wednesday,
            park_maintenance_begin_hour: 7.0,
            park_maintenance_end_hour: 19.0,
            morning_rush_begin_hour: 7.0,
            morning_rush_end_hour: 9.0,
            evening_rush_begin_hour: 16.0,
            evening_rush_end_hour: 19.0,
        }
    }
}

/// Citizen behavior tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitizenConfig {
    /// Seed for the schedule engine's RNG
    pub seed: u64,
    /// Chance per free daytime decision to go shopping
    pub shopping_chance: f32,
    /// Chance per free decision to go out and relax
    pub relax_chance: f32,
    /// Chance to go shopping or relax right after work instead of going home
    pub after_work_leisure_chance: f32,
    /// Chance to eat breakfast out before work
    pub breakfast_chance: f32,
    /// Chance for first-shift workers to leave for lunch
    pub lunch_chance: f32,
    pub shopping_stay_hours: f32,
    pub relax_stay_hours: f32,
    pub meal_stay_hours: f32,
    pub visit_stay_hours: f32,
    /// How long to wait before re-deciding when nothing was scheduled
    pub idle_recheck_hours: f32,
    /// Max distance for shopping, leisure and meal destinations
    pub max_visit_distance: f32,
    /// Travel speed used to estimate commute times
    pub travel_speed_per_hour: f32,
    pub min_travel_hours: f32,
    pub max_travel_hours: f32,
    /// Chance per simulated day that a working household starts a vacation
    pub vacation_chance_per_day: f32,
    pub vacation_length_days: u32,
    /// Ages at which citizens move between life stages
    pub teen_age: u8,
    pub young_adult_age: u8,
    pub adult_age: u8,
    pub senior_age: u8,
    /// Hard ceiling for any citizen-unit chain walk
    pub max_unit_walk: usize,
}

impl Default for CitizenConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            shopping_chance: 0.25,
            relax_chance: 0.35,
            after_work_leisure_chance: 0.4,
            breakfast_chance: 0.2,
            lunch_chance: 0.5,
            shopping_stay_hours: 1.0,
            relax_stay_hours: 2.0,
            meal_stay_hours: 0.5,
            visit_stay_hours: 1.5,
            idle_recheck_hours: 1.0,
            max_visit_distance: 1500.0,
            travel_speed_per_hour: 6000.0,
            min_travel_hours: 0.25,
            max_travel_hours: 2.0,
            vacation_chance_per_day: 0.01,
            vacation_length_days: 5,
            teen_age: 13,
            young_adult_age: 19,
            adult_age: 26,
            senior_age: 65,
            max_unit_walk: 524_288,
        }
    }
}

/// Calendar-bound event rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub academic_year: AcademicYearConfig,
    pub toga_party: TogaPartyConfig,
    pub festival: FestivalConfig,
    pub hotel: HotelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicYearConfig {
    pub admission_begin_hour: f32,
    pub admission_end_hour: f32,
    pub duration_hours: f64,
    /// Minimum hours between the end of one year and the start of the next
    pub cooldown_hours: f64,
}

impl Default for AcademicYearConfig {
    fn default() -> Self {
        Self {
            admission_begin_hour: 9.0,
            admission_end_hour: 10.0,
            duration_hours: 24.0 * 14.0,
            cooldown_hours: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TogaPartyConfig {
    /// Fractions of academic-year progress at which a party becomes due
    pub progress_thresholds: Vec<f64>,
    pub evening_begin_hour: f32,
    pub evening_end_hour: f32,
    /// Only start on Friday or Saturday evenings
    pub weekend_eve_only: bool,
    pub duration_hours: f64,
}

impl Default for TogaPartyConfig {
    fn default() -> Self {
        Self {
            progress_thresholds: vec![0.25, 0.5, 0.75],
            evening_begin_hour: 20.0,
            evening_end_hour: 23.0,
            weekend_eve_only: true,
            duration_hours: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FestivalConfig {
    pub start_hour: f32,
    /// Festivals may only start within this many hours after `start_hour`
    pub admission_window_hours: f32,
    pub duration_hours: f64,
    pub cooldown_hours: f64,
    pub weekend_only: bool,
    pub ticket_price: u32,
    pub security_budget: u32,
}

impl Default for FestivalConfig {
    fn default() -> Self {
        Self {
            start_hour: 18.0,
            admission_window_hours: 1.0,
            duration_hours: 5.0,
            cooldown_hours: 24.0 * 6.0,
            weekend_only: true,
            ticket_price: 40,
            security_budget: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelConfig {
    pub check_out_hour: f32,
    pub max_nights: u32,
    pub convention_duration_hours: f64,
}

impl Default for HotelConfig {
    fn default() -> Self {
        Self {
            check_out_hour: 11.0,
            max_nights: 7,
            convention_duration_hours: 8.0,
        }
    }
}

impl SchedulerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SchedulerError::InvalidConfig(msg));

        if !(self.time.frames_per_hour > 0.0) {
            return invalid(format!(
                "frames_per_hour must be positive, got {}",
                self.time.frames_per_hour
            ));
        }

        let day = &self.day;
        let hours = [
            ("wake_up_hour", day.wake_up_hour),
            ("go_to_sleep_hour", day.go_to_sleep_hour),
            ("work_begin_hour", day.work_begin_hour),
            ("continuous_day_begin_hour", day.continuous_day_begin_hour),
            ("continuous_day_end_hour", day.continuous_day_end_hour),
            ("school_begin_hour", day.school_begin_hour),
            ("school_end_hour", day.school_end_hour),
            ("lunch_begin_hour", day.lunch_begin_hour),
            ("lunch_end_hour", day.lunch_end_hour),
            ("breakfast_begin_hour", day.breakfast_begin_hour),
            ("breakfast_end_hour", day.breakfast_end_hour),
            ("mail_begin_hour", self.services.mail_begin_hour),
            ("mail_end_hour", self.services.mail_end_hour),
            ("garbage_begin_hour", self.services.garbage_begin_hour),
            ("garbage_end_hour", self.services.garbage_end_hour),
            ("academic_year.admission_begin_hour", self.events.academic_year.admission_begin_hour),
            ("academic_year.admission_end_hour", self.events.academic_year.admission_end_hour),
            ("festival.start_hour", self.events.festival.start_hour),
            ("hotel.check_out_hour", self.events.hotel.check_out_hour),
        ];
        for (name, hour) in hours {
            if !(0.0..24.0).contains(&hour) {
                return invalid(format!("{} must be within [0, 24), got {}", name, hour));
            }
        }

        if !(1.0..=12.0).contains(&day.shift_length_hours) {
            return invalid(format!(
                "shift_length_hours must be within [1, 12], got {}",
                day.shift_length_hours
            ));
        }

        let windows = [
            ("school", day.school_begin_hour, day.school_end_hour),
            ("lunch", day.lunch_begin_hour, day.lunch_end_hour),
            ("breakfast", day.breakfast_begin_hour, day.breakfast_end_hour),
            ("continuous day", day.continuous_day_begin_hour, day.continuous_day_end_hour),
            (
                "academic year admission",
                self.events.academic_year.admission_begin_hour,
                self.events.academic_year.admission_end_hour,
            ),
        ];
        for (name, begin, end) in windows {
            if begin >= end {
                return invalid(format!("{} window is empty ({} >= {})", name, begin, end));
            }
        }

        let thresholds = &self.events.toga_party.progress_thresholds;
        if thresholds.len() > 8 {
            return invalid("at most 8 toga party thresholds are supported".into());
        }
        if thresholds.iter().any(|t| !(0.0..1.0).contains(t)) {
            return invalid("toga party thresholds must be within [0, 1)".into());
        }

        let citizens = &self.citizens;
        if citizens.min_travel_hours > citizens.max_travel_hours {
            return invalid(format!(
                "min_travel_hours ({}) must not exceed max_travel_hours ({})",
                citizens.min_travel_hours, citizens.max_travel_hours
            ));
        }
        if citizens.travel_speed_per_hour <= 0.0 {
            return invalid("travel_speed_per_hour must be positive".into());
        }

        Ok(())
    }
}
