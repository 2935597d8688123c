//! Transfer-offer admission guards
//!
//! Checked before a citizen is routed to a building it does not live or work
//! in. A rejected visit is never issued.

use thiserror::Error;

use crate::citizen::state::CitizenFacts;
use crate::city::activity::BuildingActivity;
use crate::city::building::BuildingKind;
use crate::city::units::UnitKind;
use crate::core::calendar::SimulatedClock;
use crate::core::types::BuildingId;
use crate::events::manager::EventManager;

/// Why a citizen wants to enter a building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitPurpose {
    Shopping,
    Relax,
    Meal,
    Shelter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionRejection {
    #[error("building is not registered")]
    UnknownBuilding,
    #[error("building is closed")]
    Closed,
    #[error("no free visitor capacity")]
    NoCapacity,
    #[error("hotel has no active event")]
    HotelWithoutEvent,
    #[error("building does not sell goods")]
    NotAShop,
    #[error("campus facility is reserved for students of the same campus")]
    CampusOnly,
    #[error("building is not a shelter")]
    NotAShelter,
}

pub struct AdmissionGuard<'a> {
    activity: &'a BuildingActivity<'a>,
    events: &'a EventManager,
}

impl<'a> AdmissionGuard<'a> {
    pub fn new(activity: &'a BuildingActivity<'a>, events: &'a EventManager) -> Self {
        Self { activity, events }
    }

    /// Admission of `citizen` to `target` for `purpose`
    ///
    /// Guests are always let into their own hotel. Anyone else needs a running
    /// event at a hotel *and* free visitor capacity; either one missing rejects
    /// the visit.
    pub fn check(
        &self,
        citizen: &CitizenFacts,
        target: BuildingId,
        purpose: VisitPurpose,
        clock: &SimulatedClock,
    ) -> Result<(), AdmissionRejection> {
        let registry = self.activity.registry();
        let building = registry.get(target).ok_or(AdmissionRejection::UnknownBuilding)?;

        if citizen.hotel == Some(target) {
            return Ok(());
        }

        match purpose {
            VisitPurpose::Shelter => {
                if building.kind != BuildingKind::Shelter {
                    return Err(AdmissionRejection::NotAShelter);
                }
                return self.require_capacity(target);
            }
            VisitPurpose::Shopping
                if matches!(building.kind, BuildingKind::Hotel | BuildingKind::LeisureCommercial) =>
            {
                return Err(AdmissionRejection::NotAShop);
            }
            _ => {}
        }

        if building.kind == BuildingKind::Hotel && !self.events.has_active_event(target) {
            return Err(AdmissionRejection::HotelWithoutEvent);
        }

        if building.kind.is_campus_facility() {
            let enrolled = citizen
                .school()
                .is_some_and(|school| registry.same_campus(school, target));
            if !enrolled {
                return Err(AdmissionRejection::CampusOnly);
            }
        }

        if !self.activity.is_working(target, clock) {
            return Err(AdmissionRejection::Closed);
        }
        self.require_capacity(target)
    }

    fn require_capacity(&self, target: BuildingId) -> Result<(), AdmissionRejection> {
        if self.activity.occupancy().has_free_units(target, UnitKind::Visit) {
            Ok(())
        } else {
            Err(AdmissionRejection::NoCapacity)
        }
    }

    pub fn admits(
        &self,
        citizen: &CitizenFacts,
        target: BuildingId,
        purpose: VisitPurpose,
        clock: &SimulatedClock,
    ) -> bool {
        match self.check(citizen, target, purpose, clock) {
            Ok(()) => true,
            Err(reason) => {
                tracing::trace!("Rejected visit to {} ({:?}): {}", target, purpose, reason);
                false
            }
        }
    }
}
