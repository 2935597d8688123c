//! City events - calendar-bound events and hotel stays

pub mod city_event;
pub mod hotel;
pub mod manager;

pub use city_event::{CityEvent, EventKind, EventState, EventStatus};
pub use hotel::{BookingRejection, HotelBookings, HotelStay};
pub use manager::{EventManager, EventNotice, EventTransition, StartRejection};
