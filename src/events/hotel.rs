//! Hotel stays of tourists

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::city::units::UnitKind;
use crate::core::calendar::SimulatedClock;
use crate::core::config::HotelConfig;
use crate::core::types::{BuildingId, CitizenId, Frame};
use crate::simulation::host::OccupancyProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelStay {
    pub citizen: CitizenId,
    pub hotel: BuildingId,
    pub check_in: Frame,
    pub check_out: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookingRejection {
    #[error("hotel has no free rooms")]
    NoFreeRooms,
    #[error("citizen already has a stay at {0}")]
    AlreadyBooked(BuildingId),
}

#[derive(Debug, Clone, Default)]
pub struct HotelBookings {
    config: HotelConfig,
    stays: AHashMap<CitizenId, HotelStay>,
}

impl HotelBookings {
    pub fn new(config: HotelConfig) -> Self {
        Self {
            config,
            stays: AHashMap::new(),
        }
    }

    /// Frame of check-out after `nights` nights, at the configured check-out hour
    pub fn check_out_frame(&self, clock: &SimulatedClock, nights: u32) -> Frame {
        let nights = nights.clamp(1, self.config.max_nights.max(1));
        let mut first = clock.frame_at_next_hour(self.config.check_out_hour);
        if clock.at_frame(first).day_index() == clock.day_index() {
            first += clock.hours_to_frames(24.0);
        }
        first + clock.hours_to_frames(24.0 * (nights - 1) as f64)
    }

    /// Book a stay; the caller places the guest into a hotel unit
    pub fn book(
        &mut self,
        citizen: CitizenId,
        hotel: BuildingId,
        nights: u32,
        clock: &SimulatedClock,
        occupancy: &dyn OccupancyProvider,
    ) -> Result<Frame, BookingRejection> {
        if let Some(stay) = self.stays.get(&citizen) {
            return Err(BookingRejection::AlreadyBooked(stay.hotel));
        }
        if !occupancy.has_free_units(hotel, UnitKind::Hotel) {
            return Err(BookingRejection::NoFreeRooms);
        }
        let check_out = self.check_out_frame(clock, nights);
        self.stays.insert(
            citizen,
            HotelStay {
                citizen,
                hotel,
                check_in: clock.frame(),
                check_out,
            },
        );
        tracing::debug!("{} checked into {} until frame {}", citizen, hotel, check_out);
        Ok(check_out)
    }

    pub fn check_out(&mut self, citizen: CitizenId) -> Option<HotelStay> {
        self.stays.remove(&citizen)
    }

    pub fn stay(&self, citizen: CitizenId) -> Option<&HotelStay> {
        self.stays.get(&citizen)
    }

    /// Guests whose stay has ended, in id order
    pub fn due_check_outs(&self, clock: &SimulatedClock) -> Vec<CitizenId> {
        let mut due: Vec<CitizenId> = self
            .stays
            .values()
            .filter(|stay| stay.check_out <= clock.frame())
            .map(|stay| stay.citizen)
            .collect();
        due.sort();
        due
    }

    pub fn guests(&self, hotel: BuildingId) -> usize {
        self.stays.values().filter(|stay| stay.hotel == hotel).count()
    }

    /// Drop every stay at a released hotel, returning the guests
    pub fn release_hotel(&mut self, hotel: BuildingId) -> Vec<CitizenId> {
        let mut guests: Vec<CitizenId> = self
            .stays
            .values()
            .filter(|stay| stay.hotel == hotel)
            .map(|stay| stay.citizen)
            .collect();
        guests.sort();
        for guest in &guests {
            self.stays.remove(guest);
        }
        guests
    }

    pub fn len(&self) -> usize {
        self.stays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::units::CitizenUnitArena;
    use crate::core::calendar::Weekday;
    use crate::core::config::{SchedulerConfig, TimeConfig};

    fn clock_at(hours: f64) -> SimulatedClock {
        let mut config = SchedulerConfig::default();
        config.time = TimeConfig {
            frames_per_hour: 60.0,
            epoch_hour: 0.0,
            epoch_weekday: Weekday::Monday,
        };
        SimulatedClock::from_config((hours * 60.0).round() as u64, &config)
    }

    #[test]
    fn test_check_out_is_next_day() {
        let bookings = HotelBookings::new(HotelConfig::default());
        // Booked Monday 09:00 for one night: out Tuesday 11:00
        assert_eq!(bookings.check_out_frame(&clock_at(9.0), 1), (24 + 11) * 60);
        // Booked Monday 15:00 for two nights: out Wednesday 11:00
        assert_eq!(bookings.check_out_frame(&clock_at(15.0), 2), (48 + 11) * 60);
        // Nights are capped
        assert_eq!(bookings.check_out_frame(&clock_at(15.0), 30), (7 * 24 + 11) * 60);
    }

    #[test]
    fn test_booking_needs_rooms() {
        let mut arena = CitizenUnitArena::default();
        let hotel = BuildingId(5);
        let mut bookings = HotelBookings::new(HotelConfig::default());
        let clock = clock_at(14.0);

        assert_eq!(
            bookings.book(CitizenId(1), hotel, 1, &clock, &arena),
            Err(BookingRejection::NoFreeRooms)
        );
        arena.allocate(hotel, UnitKind::Hotel, 1);
        assert!(bookings.book(CitizenId(1), hotel, 1, &clock, &arena).is_ok());
        assert_eq!(
            bookings.book(CitizenId(1), hotel, 1, &clock, &arena),
            Err(BookingRejection::AlreadyBooked(hotel))
        );
        assert_eq!(bookings.guests(hotel), 1);
    }

    #[test]
    fn test_due_check_outs() {
        let mut arena = CitizenUnitArena::default();
        arena.allocate(BuildingId(5), UnitKind::Hotel, 1);
        let mut bookings = HotelBookings::new(HotelConfig::default());
        bookings.book(CitizenId(2), BuildingId(5), 1, &clock_at(14.0), &arena).unwrap();
        bookings.book(CitizenId(1), BuildingId(5), 2, &clock_at(14.0), &arena).unwrap();

        assert!(bookings.due_check_outs(&clock_at(30.0)).is_empty());
        assert_eq!(bookings.due_check_outs(&clock_at(35.0)), vec![CitizenId(2)]);
        assert_eq!(bookings.due_check_outs(&clock_at(60.0)), vec![CitizenId(1), CitizenId(2)]);
        assert!(bookings.check_out(CitizenId(2)).is_some());
        assert_eq!(bookings.len(), 1);
    }
}
