//! Calendar system for simulated time
//!
//! The host advances a frame counter once per tick. Every scheduling decision
//! reads a `SimulatedClock` snapshot built from that frame: hour of day, day of
//! week, weekend and night flags, and frame/hour conversions.

use serde::{Deserialize, Serialize};

use crate::core::config::{DayConfig, SchedulerConfig, TimeConfig};
use crate::core::types::Frame;

/// Day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Weekday reached `days` days after `epoch`
    pub fn after(epoch: Weekday, days: u64) -> Self {
        Self::ALL[((epoch.index() as u64 + days) % 7) as usize]
    }

    pub fn next(self) -> Self {
        Self::after(self, 1)
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

/// Coarse periods of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPeriod {
    Morning,   // wake-up to 12:00
    Afternoon, // 12:00-18:00
    Evening,   // 18:00 to go-to-sleep
    Night,     // go-to-sleep to wake-up
}

impl DayPeriod {
    pub fn from_hour(hour: f32, day: &DayConfig) -> Self {
        if is_night_hour(hour, day.wake_up_hour, day.go_to_sleep_hour) {
            DayPeriod::Night
        } else if hour < 12.0 {
            DayPeriod::Morning
        } else if hour < 18.0 {
            DayPeriod::Afternoon
        } else {
            DayPeriod::Evening
        }
    }
}

/// True when `hour` lies outside the waking band [wake_up, go_to_sleep)
pub fn is_night_hour(hour: f32, wake_up_hour: f32, go_to_sleep_hour: f32) -> bool {
    if wake_up_hour <= go_to_sleep_hour {
        hour >= go_to_sleep_hour || hour < wake_up_hour
    } else {
        hour >= go_to_sleep_hour && hour < wake_up_hour
    }
}

/// Read-only view of the simulated time for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedClock {
    frame: Frame,
    timing: TimeConfig,
    wake_up_hour: f32,
    go_to_sleep_hour: f32,
}

impl SimulatedClock {
    pub fn new(frame: Frame, timing: TimeConfig, day: &DayConfig) -> Self {
        Self {
            frame,
            timing,
            wake_up_hour: day.wake_up_hour,
            go_to_sleep_hour: day.go_to_sleep_hour,
        }
    }

    pub fn from_config(frame: Frame, config: &SchedulerConfig) -> Self {
        Self::new(frame, config.time, &config.day)
    }

    /// Same calendar, different frame
    pub fn at_frame(&self, frame: Frame) -> Self {
        Self { frame, ..*self }
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn frames_per_hour(&self) -> f64 {
        self.timing.frames_per_hour
    }

    pub fn hours_per_frame(&self) -> f64 {
        1.0 / self.timing.frames_per_hour
    }

    /// Hours elapsed since midnight of day 0
    pub fn absolute_hours(&self) -> f64 {
        self.timing.epoch_hour + self.frame as f64 / self.timing.frames_per_hour
    }

    pub fn day_index(&self) -> u64 {
        (self.absolute_hours() / 24.0).floor().max(0.0) as u64
    }

    /// Hour of day in [0, 24)
    pub fn hour(&self) -> f32 {
        self.absolute_hours().rem_euclid(24.0) as f32
    }

    pub fn weekday(&self) -> Weekday {
        Weekday::after(self.timing.epoch_weekday, self.day_index())
    }

    pub fn is_weekend(&self) -> bool {
        self.weekday().is_weekend()
    }

    pub fn is_night_time(&self) -> bool {
        is_night_hour(self.hour(), self.wake_up_hour, self.go_to_sleep_hour)
    }

    /// Friday or Saturday: the next day is a weekend day
    pub fn is_weekend_eve(&self) -> bool {
        self.weekday().next().is_weekend()
    }

    pub fn hours_to_frames(&self, hours: f64) -> u64 {
        frames_ceil(hours.max(0.0) * self.timing.frames_per_hour)
    }

    pub fn frames_to_hours(&self, frames: u64) -> f64 {
        frames as f64 / self.timing.frames_per_hour
    }

    /// Signed hours between `frame` and now (positive when `frame` is in the past)
    pub fn hours_since(&self, frame: Frame) -> f64 {
        (self.frame as f64 - frame as f64) / self.timing.frames_per_hour
    }

    /// Hours from now until the clock next reads `hour` (0 when it reads it now)
    pub fn hours_until(&self, hour: f32) -> f32 {
        (hour - self.hour()).rem_euclid(24.0)
    }

    pub fn frame_after_hours(&self, hours: f64) -> Frame {
        self.frame + self.hours_to_frames(hours)
    }

    /// Frame at which the clock next reads `hour`
    pub fn frame_at_next_hour(&self, hour: f32) -> Frame {
        let frames_per_day = 24.0 * self.timing.frames_per_hour;
        let until = (hour as f64 - self.absolute_hours().rem_euclid(24.0)).rem_euclid(24.0);
        let frames = frames_ceil(until * self.timing.frames_per_hour);
        if frames as f64 >= frames_per_day {
            return self.frame;
        }
        self.frame + frames
    }

    /// Frame at which the clock next reads `hour` on a day accepted by `accept_day`
    ///
    /// Looks one week ahead at most; falls back to the next occurrence of `hour`.
    pub fn frame_at_next_hour_on(&self, hour: f32, accept_day: impl Fn(Weekday) -> bool) -> Frame {
        self.departure_for_next_hour_on(hour, 0.0, accept_day)
    }

    /// Frame `lead_hours` before the clock next reads `hour` on a day accepted by `accept_day`
    ///
    /// The day test applies to the moment `hour` is reached, not to the departure.
    pub fn departure_for_next_hour_on(
        &self,
        hour: f32,
        lead_hours: f32,
        accept_day: impl Fn(Weekday) -> bool,
    ) -> Frame {
        let lead = self.hours_to_frames(lead_hours as f64);
        let first = self.frame_at_next_hour((hour - lead_hours.max(0.0)).rem_euclid(24.0));
        for day in 0..8u64 {
            let candidate = first + self.hours_to_frames(24.0 * day as f64);
            if accept_day(self.at_frame(candidate + lead).weekday()) {
                return candidate;
            }
        }
        first
    }
}

/// Round a frame count up, ignoring float noise around whole frames
fn frames_ceil(frames: f64) -> u64 {
    let nearest = frames.round();
    if (frames - nearest).abs() < 1e-6 {
        nearest.max(0.0) as u64
    } else {
        frames.ceil().max(0.0) as u64
    }
}
