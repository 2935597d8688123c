//! Event/calendar manager
//!
//! Owns every city event and runs their lifecycle once per tick:
//! `Created -> Active -> Completed`, or `Cancelled` when the owning building
//! is deactivated first. Events of one kind at one building form a linked
//! history through `CityEvent::previous`; the newest is kept in `heads`, so
//! "hours since the last one ended" is a single lookup. Finished events that
//! no head points at are dropped once they are older than every cooldown.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::Serialize;
use thiserror::Error;

use crate::city::activity::BuildingActivity;
use crate::city::building::{BuildingKind, BuildingRegistry};
use crate::city::work_time::HourWindow;
use crate::core::calendar::SimulatedClock;
use crate::core::config::EventConfig;
use crate::core::error::{Result, SchedulerError};
use crate::core::types::{BuildingId, EventId, Frame};
use crate::events::city_event::{CityEvent, EventKind, EventState, EventStatus};
use crate::simulation::host::CityFacts;

/// Why an event may not start now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartRejection {
    #[error("building is not working")]
    BuildingClosed,
    #[error("events do not start at night")]
    NightTime,
    #[error("events of this kind do not start on weekends")]
    Weekend,
    #[error("events of this kind only start on weekends")]
    NotWeekend,
    #[error("events of this kind only start on Friday or Saturday")]
    NotWeekendEve,
    #[error("outside the admission window")]
    OutsideWindow,
    #[error("cooldown runs until frame {ready_at}")]
    Cooldown { ready_at: Frame },
    #[error("an event of this kind is already running")]
    AlreadyRunning,
    #[error("no running parent event")]
    NoParentEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventTransition {
    Created,
    Started,
    Completed,
    Cancelled,
}

/// Lifecycle change reported by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventNotice {
    pub event: EventId,
    pub kind: EventKind,
    pub building: BuildingId,
    pub transition: EventTransition,
}

#[derive(Debug, Clone, Default)]
pub struct EventManager {
    config: EventConfig,
    events: BTreeMap<EventId, CityEvent>,
    next_id: u32,
    heads: AHashMap<(BuildingId, EventKind), EventId>,
    latest: AHashMap<BuildingId, EventId>,
}

impl EventManager {
    pub fn new(config: EventConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    pub fn event(&self, id: EventId) -> Option<&CityEvent> {
        self.events.get(&id)
    }

    /// Retained events in creation order
    pub fn events(&self) -> impl Iterator<Item = &CityEvent> + '_ {
        self.events.values()
    }

    /// Newest event at a building, of any kind
    pub fn latest_event(&self, building: BuildingId) -> Option<&CityEvent> {
        self.latest.get(&building).and_then(|id| self.event(*id))
    }

    /// Newest event of `kind` at a building
    pub fn last_of_kind(&self, building: BuildingId, kind: EventKind) -> Option<&CityEvent> {
        self.heads.get(&(building, kind)).and_then(|id| self.event(*id))
    }

    /// Events of `kind` at a building, newest first
    pub fn history(&self, building: BuildingId, kind: EventKind) -> impl Iterator<Item = &CityEvent> + '_ {
        let mut next = self.last_of_kind(building, kind);
        let mut remaining = self.events.len();
        std::iter::from_fn(move || {
            let event = next?;
            if remaining == 0 {
                tracing::warn!("Event history of {} does not terminate; stopping", building);
                return None;
            }
            remaining -= 1;
            next = event.previous.and_then(|id| self.event(id));
            Some(event)
        })
    }

    fn live_of_kind(&self, building: BuildingId, kind: EventKind) -> Option<&CityEvent> {
        self.last_of_kind(building, kind).filter(|e| e.is_live())
    }

    /// An event currently running at the building
    pub fn active_event(&self, building: BuildingId) -> Option<&CityEvent> {
        [
            EventKind::AcademicYear,
            EventKind::TogaParty,
            EventKind::Festival,
            EventKind::HotelConvention,
        ]
        .into_iter()
        .filter_map(|kind| self.last_of_kind(building, kind))
        .find(|e| e.status == EventStatus::Active)
    }

    pub fn has_active_event(&self, building: BuildingId) -> bool {
        self.active_event(building).is_some()
    }

    /// Timing of the building's newest event as seen at `as_of`
    pub fn event_state(&self, building: BuildingId, as_of: Frame) -> Option<EventState> {
        self.latest_event(building).map(|e| e.state_at(as_of))
    }

    /// True when an academic year runs at `building` or elsewhere on its campus
    pub fn is_academic_year_active(&self, building: BuildingId, registry: &BuildingRegistry) -> bool {
        self.heads
            .iter()
            .filter(|((host, kind), _)| {
                *kind == EventKind::AcademicYear && (*host == building || registry.same_campus(*host, building))
            })
            .filter_map(|(_, id)| self.event(*id))
            .any(|e| e.status == EventStatus::Active)
    }

    /// Start gating for an event of `kind` at `building` right now
    pub fn can_start(
        &self,
        kind: EventKind,
        building: BuildingId,
        activity: &BuildingActivity<'_>,
        clock: &SimulatedClock,
    ) -> std::result::Result<(), StartRejection> {
        if self.live_of_kind(building, kind).is_some() {
            return Err(StartRejection::AlreadyRunning);
        }
        let hour = clock.hour();
        match kind {
            EventKind::AcademicYear => {
                let year = &self.config.academic_year;
                if !activity.is_working(building, clock) {
                    return Err(StartRejection::BuildingClosed);
                }
                if clock.is_night_time() {
                    return Err(StartRejection::NightTime);
                }
                if clock.is_weekend() {
                    return Err(StartRejection::Weekend);
                }
                if !HourWindow::new(year.admission_begin_hour, year.admission_end_hour).contains(hour) {
                    return Err(StartRejection::OutsideWindow);
                }
                self.check_cooldown(building, kind, year.cooldown_hours, clock)
            }
            EventKind::Festival => {
                let festival = &self.config.festival;
                if !activity.is_working(building, clock) {
                    return Err(StartRejection::BuildingClosed);
                }
                if festival.weekend_only && !clock.is_weekend() {
                    return Err(StartRejection::NotWeekend);
                }
                let window = HourWindow::new(
                    festival.start_hour,
                    festival.start_hour + festival.admission_window_hours,
                );
                if !window.contains(hour) {
                    return Err(StartRejection::OutsideWindow);
                }
                self.check_cooldown(building, kind, festival.cooldown_hours, clock)
            }
            EventKind::TogaParty => {
                let party = &self.config.toga_party;
                let has_parent = self
                    .live_of_kind(building, EventKind::AcademicYear)
                    .is_some_and(|e| e.status == EventStatus::Active);
                if !has_parent {
                    return Err(StartRejection::NoParentEvent);
                }
                if party.weekend_eve_only && !clock.is_weekend_eve() {
                    return Err(StartRejection::NotWeekendEve);
                }
                if !HourWindow::new(party.evening_begin_hour, party.evening_end_hour).contains(hour) {
                    return Err(StartRejection::OutsideWindow);
                }
                Ok(())
            }
            EventKind::HotelConvention => {
                if !activity.is_working(building, clock) {
                    return Err(StartRejection::BuildingClosed);
                }
                if clock.is_night_time() {
                    return Err(StartRejection::NightTime);
                }
                Ok(())
            }
        }
    }

    fn check_cooldown(
        &self,
        building: BuildingId,
        kind: EventKind,
        cooldown_hours: f64,
        clock: &SimulatedClock,
    ) -> std::result::Result<(), StartRejection> {
        let Some(previous) = self.last_of_kind(building, kind) else {
            return Ok(());
        };
        let ready_at = previous.end_frame + clock.hours_to_frames(cooldown_hours);
        if clock.frame() < ready_at {
            return Err(StartRejection::Cooldown { ready_at });
        }
        Ok(())
    }

    fn duration_hours(&self, kind: EventKind) -> f64 {
        match kind {
            EventKind::AcademicYear => self.config.academic_year.duration_hours,
            EventKind::TogaParty => self.config.toga_party.duration_hours,
            EventKind::Festival => self.config.festival.duration_hours,
            EventKind::HotelConvention => self.config.hotel.convention_duration_hours,
        }
    }

    fn push(&mut self, mut event: CityEvent) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        event.id = id;
        event.previous = self.heads.insert((event.building, event.kind), id);
        self.latest.insert(event.building, id);
        if event.kind == EventKind::Festival {
            event.ticket_price = self.config.festival.ticket_price;
            event.security_budget = self.config.festival.security_budget;
        }
        tracing::info!(
            "Created {:?} {} at {} (frames {}..{})",
            event.kind,
            id,
            event.building,
            event.start_frame,
            event.end_frame
        );
        self.events.insert(id, event);
        id
    }

    /// Operator/host command: put an event on the calendar
    pub fn schedule_event(
        &mut self,
        kind: EventKind,
        building: BuildingId,
        start_frame: Frame,
        end_frame: Frame,
    ) -> Result<EventId> {
        if let Some(existing) = self.live_of_kind(building, kind) {
            return Err(SchedulerError::EventConflict {
                building,
                existing: existing.id,
            });
        }
        Ok(self.push(CityEvent::new(EventId(0), kind, building, start_frame, end_frame)))
    }

    /// Start an event now with the configured duration, if gating allows it
    pub fn try_start(
        &mut self,
        kind: EventKind,
        building: BuildingId,
        activity: &BuildingActivity<'_>,
        clock: &SimulatedClock,
    ) -> std::result::Result<EventId, StartRejection> {
        self.can_start(kind, building, activity, clock)?;
        let start = clock.frame();
        let end = CityEvent::end_after(clock, start, self.duration_hours(kind));
        Ok(self.push(CityEvent::new(EventId(0), kind, building, start, end)))
    }

    /// Cancel a live event; its end moves to now
    pub fn cancel(&mut self, id: EventId, clock: &SimulatedClock) -> bool {
        let Some(event) = self.events.get_mut(&id) else {
            return false;
        };
        if !event.is_live() {
            return false;
        }
        event.status = EventStatus::Cancelled;
        event.end_frame = clock.frame().clamp(event.start_frame, event.end_frame);
        tracing::info!("Cancelled {:?} {} at {}", event.kind, id, event.building);
        true
    }

    /// Run one tick: lifecycle transitions, then automatic starts
    pub fn tick(
        &mut self,
        activity: &BuildingActivity<'_>,
        city: &dyn CityFacts,
        clock: &SimulatedClock,
    ) -> Vec<EventNotice> {
        let mut notices = Vec::new();
        self.advance_lifecycle(activity.registry(), city, clock, &mut notices);
        self.start_toga_parties(activity, clock, &mut notices);
        self.auto_start(activity, city, clock, &mut notices);
        self.prune(clock);
        notices
    }

    /// Hours a finished event stays in the history
    fn retention_hours(&self) -> f64 {
        self.config
            .academic_year
            .cooldown_hours
            .max(self.config.festival.cooldown_hours)
    }

    /// Drop finished events past the retention horizon that no head refers to
    fn prune(&mut self, clock: &SimulatedClock) {
        let retention = clock.hours_to_frames(self.retention_hours());
        let frame = clock.frame();
        let heads = &self.heads;
        let latest = &self.latest;
        let before = self.events.len();
        self.events.retain(|id, e| {
            e.is_live()
                || e.end_frame.saturating_add(retention) > frame
                || heads.get(&(e.building, e.kind)) == Some(id)
                || latest.get(&e.building) == Some(id)
        });
        let dropped = before - self.events.len();
        if dropped > 0 {
            tracing::debug!("Pruned {} finished events", dropped);
        }
    }

    fn advance_lifecycle(
        &mut self,
        registry: &BuildingRegistry,
        city: &dyn CityFacts,
        clock: &SimulatedClock,
        notices: &mut Vec<EventNotice>,
    ) {
        let frame = clock.frame();
        for event in self.events.values_mut().filter(|e| e.is_live()) {
            let (id, kind, building) = (event.id, event.kind, event.building);
            let notice = move |transition| EventNotice {
                event: id,
                kind,
                building,
                transition,
            };
            let operational = registry.contains(event.building)
                && city
                    .building(event.building)
                    .is_some_and(|facts| facts.flags.is_operational());
            if !operational {
                event.status = EventStatus::Cancelled;
                event.end_frame = frame.clamp(event.start_frame, event.end_frame);
                tracing::info!("Cancelled {:?} {}: {} stopped working", event.kind, event.id, event.building);
                notices.push(notice(EventTransition::Cancelled));
                continue;
            }
            if event.status == EventStatus::Created && frame >= event.start_frame {
                event.status = EventStatus::Active;
                tracing::info!("Started {:?} {} at {}", event.kind, event.id, event.building);
                notices.push(notice(EventTransition::Started));
            }
            if event.status == EventStatus::Active && frame >= event.end_frame {
                event.status = EventStatus::Completed;
                tracing::info!("Completed {:?} {} at {}", event.kind, event.id, event.building);
                notices.push(notice(EventTransition::Completed));
            }
        }
    }

    /// Fire at most one toga party per academic year whose progress crossed a threshold
    fn start_toga_parties(
        &mut self,
        activity: &BuildingActivity<'_>,
        clock: &SimulatedClock,
        notices: &mut Vec<EventNotice>,
    ) {
        let frame = clock.frame();
        let due: Vec<(EventId, BuildingId, usize)> = self
            .events
            .values()
            .filter(|e| e.kind == EventKind::AcademicYear && e.status == EventStatus::Active)
            .filter_map(|year| {
                let progress = year.progress(frame);
                self.config
                    .toga_party
                    .progress_thresholds
                    .iter()
                    .enumerate()
                    .find(|(i, threshold)| progress >= **threshold && !year.fired_thresholds.contains(i))
                    .map(|(i, _)| (year.id, year.building, i))
            })
            .collect();

        for (parent, building, threshold) in due {
            if self.can_start(EventKind::TogaParty, building, activity, clock).is_err() {
                continue;
            }
            let end = CityEvent::end_after(clock, frame, self.config.toga_party.duration_hours);
            let mut party = CityEvent::new(EventId(0), EventKind::TogaParty, building, frame, end);
            party.parent = Some(parent);
            let id = self.push(party);
            if let Some(year) = self.events.get_mut(&parent) {
                year.fired_thresholds.push(threshold);
            }
            notices.push(EventNotice {
                event: id,
                kind: EventKind::TogaParty,
                building,
                transition: EventTransition::Created,
            });
        }
    }

    fn auto_start(
        &mut self,
        activity: &BuildingActivity<'_>,
        city: &dyn CityFacts,
        clock: &SimulatedClock,
        notices: &mut Vec<EventNotice>,
    ) {
        let candidates: Vec<(BuildingId, EventKind)> = activity
            .registry()
            .iter()
            .filter_map(|b| match b.kind {
                BuildingKind::University => Some((b.id, EventKind::AcademicYear)),
                BuildingKind::Venue => Some((b.id, EventKind::Festival)),
                _ => None,
            })
            .filter(|(id, _)| city.building(*id).is_some_and(|f| f.flags.is_operational()))
            .collect();

        for (building, kind) in candidates {
            match self.try_start(kind, building, activity, clock) {
                Ok(id) => notices.push(EventNotice {
                    event: id,
                    kind,
                    building,
                    transition: EventTransition::Created,
                }),
                Err(reason) => tracing::trace!("{:?} at {} not started: {}", kind, building, reason),
            }
        }
    }
}
