//! Calendar-bound city events

use serde::{Deserialize, Serialize};

use crate::core::calendar::SimulatedClock;
use crate::core::types::{BuildingId, EventId, Frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    AcademicYear,
    TogaParty,
    Festival,
    HotelConvention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    Created,
    Active,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn is_live(self) -> bool {
        matches!(self, EventStatus::Created | EventStatus::Active)
    }
}

/// Event timing as seen from a given frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventState {
    Upcoming,
    Ongoing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub building: BuildingId,
    pub start_frame: Frame,
    /// Planned end, or the frame the event was cancelled at
    pub end_frame: Frame,
    pub status: EventStatus,
    pub ticket_price: u32,
    pub security_budget: u32,
    /// Previous event of the same kind at the same building
    pub previous: Option<EventId>,
    /// Event this one belongs to (toga parties of an academic year)
    pub parent: Option<EventId>,
    /// Progress thresholds that already produced a sub-event
    pub fired_thresholds: Vec<usize>,
}

impl CityEvent {
    pub fn new(id: EventId, kind: EventKind, building: BuildingId, start_frame: Frame, end_frame: Frame) -> Self {
        Self {
            id,
            kind,
            building,
            start_frame,
            end_frame: end_frame.max(start_frame),
            status: EventStatus::Created,
            ticket_price: 0,
            security_budget: 0,
            previous: None,
            parent: None,
            fired_thresholds: Vec::new(),
        }
    }

    /// End frame of an event lasting `duration_hours` from `start_frame`
    pub fn end_after(clock: &SimulatedClock, start_frame: Frame, duration_hours: f64) -> Frame {
        start_frame + clock.hours_to_frames(duration_hours)
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    pub fn state_at(&self, frame: Frame) -> EventState {
        if matches!(self.status, EventStatus::Completed | EventStatus::Cancelled) {
            return EventState::Finished;
        }
        if frame < self.start_frame {
            EventState::Upcoming
        } else if frame < self.end_frame {
            EventState::Ongoing
        } else {
            EventState::Finished
        }
    }

    /// Fraction of the event's run elapsed at `frame`, in [0, 1]
    pub fn progress(&self, frame: Frame) -> f64 {
        let span = self.end_frame.saturating_sub(self.start_frame);
        if span == 0 {
            return 1.0;
        }
        (frame.saturating_sub(self.start_frame) as f64 / span as f64).clamp(0.0, 1.0)
    }

    /// Simulated hours since the event ended (negative while it runs)
    pub fn hours_since_end(&self, clock: &SimulatedClock) -> f64 {
        clock.hours_since(self.end_frame)
    }

    pub fn duration_hours(&self, clock: &SimulatedClock) -> f64 {
        clock.frames_to_hours(self.end_frame - self.start_frame)
    }
}
