//! City Rhythm - continuous-time work hours and citizen routines for city simulations
//!
//! Buildings open and close by resolved work-time policies, citizens follow a
//! daily routine of work, school, meals and leisure, and calendar events run
//! their lifecycle on simulated time. The host simulation supplies facts
//! through `simulation::CityFacts` and receives orders from
//! `simulation::RealTimeScheduler::tick`.

pub mod citizen;
pub mod city;
pub mod core;
pub mod events;
pub mod simulation;
