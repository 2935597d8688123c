//! Current-state derivation
//!
//! A citizen's `ResidentState` is recomputed on every query from the raw host
//! location, the building the citizen is in and the last action it was sent
//! on. Precedence: ignored, moving, home, evacuation, work/school, the
//! commercial and leisure cases keyed by the last action, then `Visiting`.

use crate::citizen::state::{CitizenFacts, Location, ResidentState, ScheduledState, WorkStatus};
use crate::city::building::{BuildingKind, BuildingService, RegisteredBuilding};

/// Building context of the citizen's current location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingContext {
    pub kind: BuildingKind,
    pub service: BuildingService,
    pub evacuating: bool,
}

impl BuildingContext {
    pub fn of(building: &RegisteredBuilding, evacuating: bool) -> Self {
        Self {
            kind: building.kind,
            service: building.service,
            evacuating,
        }
    }
}

pub fn derive_state(
    facts: &CitizenFacts,
    building: Option<BuildingContext>,
    last_scheduled: ScheduledState,
    work_status: WorkStatus,
) -> ResidentState {
    if facts.flags.dummy_traffic {
        return ResidentState::Ignored;
    }
    if facts.location == Location::Moving {
        return ResidentState::InTransition;
    }
    let Some(building) = building else {
        return ResidentState::Unknown;
    };

    match facts.location {
        Location::Home => ResidentState::AtHome,
        Location::Moving => ResidentState::InTransition,
        _ if building.evacuating => ResidentState::Evacuating,
        Location::Work => work_state(facts, work_status),
        Location::Visit => visit_state(building, last_scheduled),
    }
}

fn work_state(facts: &CitizenFacts, work_status: WorkStatus) -> ResidentState {
    match (facts.flags.student, work_status) {
        (true, _) => ResidentState::AtSchool,
        (false, WorkStatus::OnVacation) => ResidentState::Visiting,
        (false, WorkStatus::None | WorkStatus::Working) => ResidentState::AtWork,
    }
}

fn visit_state(building: BuildingContext, last: ScheduledState) -> ResidentState {
    use BuildingKind as K;
    use ResidentState as R;
    use ScheduledState as S;

    match (building.kind, building.service, last) {
        (K::Shelter, _, _) => R::InShelter,
        (K::Hotel, _, S::GoToRelax) => R::Relaxing,
        (K::Hotel, _, _) => R::Visiting,

        (K::Cafeteria, _, S::GoToBreakfast) => R::Breakfast,
        (K::Cafeteria, _, S::GoToLunch) => R::Lunch,
        (K::Cafeteria, _, _) => R::Visiting,

        (K::University | K::School, _, S::GoToSchool) => R::AtSchool,

        (K::LeisureCommercial | K::TouristCommercial, BuildingService::Commercial, S::GoToBreakfast) => {
            R::Breakfast
        }
        (K::LeisureCommercial | K::TouristCommercial, BuildingService::Commercial, S::GoToLunch) => R::Lunch,
        (K::LeisureCommercial | K::TouristCommercial, BuildingService::Commercial, _) => R::Relaxing,

        (_, BuildingService::Commercial, S::GoShopping) => R::Shopping,
        (_, BuildingService::Commercial, S::GoToBreakfast) => R::Breakfast,
        (_, BuildingService::Commercial, S::GoToLunch) => R::Lunch,
        (_, BuildingService::Commercial, S::GoToRelax) => R::Relaxing,

        (K::Park | K::Monument | K::Venue | K::Gym, _, _) => R::Relaxing,
        (_, BuildingService::Beautification | BuildingService::Monument | BuildingService::Tourism, S::GoToRelax) => {
            R::Relaxing
        }

        _ => R::Visiting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BuildingId;

    fn ctx(kind: BuildingKind, service: BuildingService) -> Option<BuildingContext> {
        Some(BuildingContext {
            kind,
            service,
            evacuating: false,
        })
    }

    fn visitor() -> CitizenFacts {
        CitizenFacts::resident(30, BuildingId(1)).at(Location::Visit, Some(BuildingId(2)))
    }

    #[test]
    fn test_shopping_at_commercial() {
        let state = derive_state(
            &visitor(),
            ctx(BuildingKind::Generic, BuildingService::Commercial),
            ScheduledState::GoShopping,
            WorkStatus::None,
        );
        assert_eq!(state, ResidentState::Shopping);
    }

    #[test]
    fn test_unmatched_visit_falls_back_to_visiting() {
        let state = derive_state(
            &visitor(),
            ctx(BuildingKind::Generic, BuildingService::Office),
            ScheduledState::GoShopping,
            WorkStatus::None,
        );
        assert_eq!(state, ResidentState::Visiting);
        let state = derive_state(
            &visitor(),
            ctx(BuildingKind::Generic, BuildingService::Commercial),
            ScheduledState::GoHome,
            WorkStatus::None,
        );
        assert_eq!(state, ResidentState::Visiting);
    }

    #[test]
    fn test_precedence() {
        let mut dummy = visitor();
        dummy.flags.dummy_traffic = true;
        assert_eq!(
            derive_state(&dummy, None, ScheduledState::None, WorkStatus::None),
            ResidentState::Ignored
        );

        let moving = visitor().at(Location::Moving, None);
        assert_eq!(
            derive_state(&moving, None, ScheduledState::GoToWork, WorkStatus::None),
            ResidentState::InTransition
        );

        let evacuating = Some(BuildingContext {
            kind: BuildingKind::Generic,
            service: BuildingService::Commercial,
            evacuating: true,
        });
        assert_eq!(
            derive_state(&visitor(), evacuating, ScheduledState::GoShopping, WorkStatus::None),
            ResidentState::Evacuating
        );
        let home = visitor().at(Location::Home, None);
        assert_eq!(
            derive_state(&home, evacuating, ScheduledState::None, WorkStatus::None),
            ResidentState::AtHome
        );
    }

    #[test]
    fn test_work_and_school() {
        let worker = CitizenFacts::resident(30, BuildingId(1))
            .working_at(BuildingId(2))
            .at(Location::Work, None);
        let office = ctx(BuildingKind::Generic, BuildingService::Office);
        assert_eq!(
            derive_state(&worker, office, ScheduledState::GoToWork, WorkStatus::Working),
            ResidentState::AtWork
        );
        assert_eq!(
            derive_state(&worker, office, ScheduledState::GoToWork, WorkStatus::OnVacation),
            ResidentState::Visiting
        );

        let pupil = CitizenFacts::resident(10, BuildingId(1))
            .studying_at(BuildingId(3))
            .at(Location::Work, None);
        assert_eq!(
            derive_state(&pupil, ctx(BuildingKind::School, BuildingService::Education), ScheduledState::GoToSchool, WorkStatus::None),
            ResidentState::AtSchool
        );
    }

    #[test]
    fn test_leisure_and_meals() {
        let cases = [
            (BuildingKind::Park, BuildingService::Beautification, ScheduledState::GoToRelax, ResidentState::Relaxing),
            (BuildingKind::LeisureCommercial, BuildingService::Commercial, ScheduledState::GoShopping, ResidentState::Relaxing),
            (BuildingKind::Cafeteria, BuildingService::PlayerEducation, ScheduledState::GoToLunch, ResidentState::Lunch),
            (BuildingKind::Generic, BuildingService::Commercial, ScheduledState::GoToBreakfast, ResidentState::Breakfast),
            (BuildingKind::Shelter, BuildingService::Disaster, ScheduledState::GoToShelter, ResidentState::InShelter),
            (BuildingKind::Hotel, BuildingService::Commercial, ScheduledState::GoShopping, ResidentState::Visiting),
            (BuildingKind::Hotel, BuildingService::Commercial, ScheduledState::GoToRelax, ResidentState::Relaxing),
        ];
        for (kind, service, last, expected) in cases {
            assert_eq!(
                derive_state(&visitor(), ctx(kind, service), last, WorkStatus::None),
                expected,
                "{:?}/{:?}/{:?}",
                kind,
                service,
                last
            );
        }
    }
}
