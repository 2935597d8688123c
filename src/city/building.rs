//! Building facts and the registration-time building registry
//!
//! The host reports raw facts (service, sub-service, flags, position). The
//! registry classifies each building once, when it is registered, into a
//! `BuildingKind` capability tag so that per-tick queries never inspect the
//! host's AI class name again.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::types::{ArchetypeKey, BuildingId};

/// Host service category of a building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingService {
    None,
    Residential,
    Commercial,
    Industrial,
    Office,
    Education,
    PlayerEducation,
    HealthCare,
    Garbage,
    Mail,
    Road,
    Beautification,
    Monument,
    Tourism,
    Disaster,
    PublicTransport,
    FireDepartment,
    PoliceDepartment,
    Electricity,
    Water,
}

/// Host sub-service, refining the service category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubService {
    None,
    ResidentialLow,
    ResidentialHigh,
    CommercialLow,
    CommercialHigh,
    CommercialLeisure,
    CommercialTourist,
    CommercialEco,
    IndustrialGeneric,
    IndustrialSpecialized,
    OfficeGeneric,
    OfficeHightech,
}

/// Dynamic building state reported by the host each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingFlags {
    pub active: bool,
    pub completed: bool,
    pub abandoned: bool,
    pub evacuating: bool,
}

impl BuildingFlags {
    pub fn operational() -> Self {
        Self {
            active: true,
            completed: true,
            ..Self::default()
        }
    }

    /// Completed, active and not abandoned
    pub fn is_operational(&self) -> bool {
        self.active && self.completed && !self.abandoned
    }
}

/// Read-only building facts supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingFacts {
    pub flags: BuildingFlags,
    pub service: BuildingService,
    pub sub_service: SubService,
    pub position: Vec2,
}

impl BuildingFacts {
    pub fn new(service: BuildingService, sub_service: SubService, position: Vec2) -> Self {
        Self {
            flags: BuildingFlags::operational(),
            service,
            sub_service,
            position,
        }
    }
}

/// Capability tag resolved once at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Generic,
    Hotel,
    NursingHome,
    Shelter,
    Cafeteria,
    Gym,
    University,
    School,
    PostOffice,
    GarbageFacility,
    MaintenanceDepot,
    SnowDump,
    ParkMaintenance,
    Park,
    Monument,
    LeisureCommercial,
    TouristCommercial,
    Venue,
}

impl BuildingKind {
    /// Classify a building from its service data and host AI class name
    pub fn classify(service: BuildingService, sub_service: SubService, ai_class: &str) -> Self {
        let class = ai_class.to_ascii_lowercase();
        let has = |needle: &str| class.contains(needle);

        if has("hotel") {
            return BuildingKind::Hotel;
        }
        if has("nursinghome") || has("eldercare") {
            return BuildingKind::NursingHome;
        }
        if has("shelter") || service == BuildingService::Disaster {
            return BuildingKind::Shelter;
        }
        if has("cafeteria") {
            return BuildingKind::Cafeteria;
        }
        if has("gym") || has("varsitysports") {
            return BuildingKind::Gym;
        }
        if has("postoffice") || has("postsorting") {
            return BuildingKind::PostOffice;
        }
        if has("landfill") || has("incinerat") || has("recycling") {
            return BuildingKind::GarbageFacility;
        }
        if has("snowdump") {
            return BuildingKind::SnowDump;
        }
        if has("maintenancedepot") {
            return BuildingKind::MaintenanceDepot;
        }
        if has("parkmaintenance") {
            return BuildingKind::ParkMaintenance;
        }
        if has("stadium") || has("concert") || has("venue") || has("festival") {
            return BuildingKind::Venue;
        }

        match (service, sub_service) {
            (BuildingService::PlayerEducation, _) => BuildingKind::University,
            (BuildingService::Education, _) if has("university") || has("campus") => {
                BuildingKind::University
            }
            (BuildingService::Education, _) => BuildingKind::School,
            (BuildingService::Mail, _) => BuildingKind::PostOffice,
            (BuildingService::Garbage, _) => BuildingKind::GarbageFacility,
            (BuildingService::Beautification, _) => BuildingKind::Park,
            (BuildingService::Monument, _) => BuildingKind::Monument,
            (BuildingService::Tourism, _) => BuildingKind::Venue,
            (BuildingService::Commercial, SubService::CommercialLeisure) => {
                BuildingKind::LeisureCommercial
            }
            (BuildingService::Commercial, SubService::CommercialTourist) => {
                BuildingKind::TouristCommercial
            }
            _ => BuildingKind::Generic,
        }
    }

    /// Campus-internal facilities only open to enrolled students
    pub fn is_campus_facility(self) -> bool {
        matches!(self, BuildingKind::Cafeteria | BuildingKind::Gym)
    }

    /// Places people go to relax
    pub fn is_leisure(self) -> bool {
        matches!(
            self,
            BuildingKind::Park
                | BuildingKind::Monument
                | BuildingKind::Venue
                | BuildingKind::LeisureCommercial
                | BuildingKind::TouristCommercial
                | BuildingKind::Hotel
                | BuildingKind::Gym
        )
    }
}

/// A building known to the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredBuilding {
    pub id: BuildingId,
    pub archetype: ArchetypeKey,
    pub kind: BuildingKind,
    pub service: BuildingService,
    pub sub_service: SubService,
    pub position: Vec2,
    /// Park/campus area the building belongs to
    pub campus_area: Option<u16>,
}

impl RegisteredBuilding {
    pub fn is_commercial(&self) -> bool {
        self.service == BuildingService::Commercial
    }
}

/// Indexed arena of registered buildings, addressed by building id
#[derive(Debug, Clone, Default)]
pub struct BuildingRegistry {
    slots: Vec<Option<RegisteredBuilding>>,
    count: usize,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Register (or re-register) a building, classifying it once
    pub fn register(
        &mut self,
        id: BuildingId,
        archetype: ArchetypeKey,
        facts: &BuildingFacts,
        campus_area: Option<u16>,
    ) -> &RegisteredBuilding {
        let kind = BuildingKind::classify(facts.service, facts.sub_service, &archetype.ai_class);
        let index = id.index();
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        if self.slots[index].is_none() {
            self.count += 1;
        }
        tracing::debug!("Registered {} as {:?} ({})", id, kind, archetype);
        self.slots[index].insert(RegisteredBuilding {
            id,
            archetype,
            kind,
            service: facts.service,
            sub_service: facts.sub_service,
            position: facts.position,
            campus_area,
        })
    }

    pub fn release(&mut self, id: BuildingId) -> Option<RegisteredBuilding> {
        let removed = self.slots.get_mut(id.index()).and_then(Option::take);
        if removed.is_some() {
            self.count -= 1;
        }
        removed
    }

    pub fn get(&self, id: BuildingId) -> Option<&RegisteredBuilding> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: BuildingId) -> bool {
        self.get(id).is_some()
    }

    pub fn kind(&self, id: BuildingId) -> Option<BuildingKind> {
        self.get(id).map(|b| b.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredBuilding> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn with_archetype<'a>(
        &'a self,
        archetype: &'a ArchetypeKey,
    ) -> impl Iterator<Item = &'a RegisteredBuilding> + 'a {
        self.iter().filter(move |b| &b.archetype == archetype)
    }

    pub fn distance(&self, a: BuildingId, b: BuildingId) -> Option<f32> {
        Some(self.get(a)?.position.distance(self.get(b)?.position))
    }

    /// True when both buildings belong to the same campus area
    pub fn same_campus(&self, a: BuildingId, b: BuildingId) -> bool {
        match (self.get(a).and_then(|x| x.campus_area), self.get(b).and_then(|x| x.campus_area)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(service: BuildingService, sub: SubService) -> BuildingFacts {
        BuildingFacts::new(service, sub, Vec2::ZERO)
    }

    #[test]
    fn test_classify_by_ai_class() {
        assert_eq!(
            BuildingKind::classify(BuildingService::Commercial, SubService::CommercialHigh, "HotelAI"),
            BuildingKind::Hotel
        );
        assert_eq!(
            BuildingKind::classify(BuildingService::HealthCare, SubService::None, "EldercareAI"),
            BuildingKind::NursingHome
        );
        assert_eq!(
            BuildingKind::classify(BuildingService::PlayerEducation, SubService::None, "CampusBuildingAI"),
            BuildingKind::University
        );
        assert_eq!(
            BuildingKind::classify(BuildingService::PlayerEducation, SubService::None, "CampusCafeteriaAI"),
            BuildingKind::Cafeteria
        );
    }

    #[test]
    fn test_classify_by_service() {
        assert_eq!(
            BuildingKind::classify(BuildingService::Commercial, SubService::CommercialLeisure, "CommercialBuildingAI"),
            BuildingKind::LeisureCommercial
        );
        assert_eq!(
            BuildingKind::classify(BuildingService::Education, SubService::None, "SchoolAI"),
            BuildingKind::School
        );
        assert_eq!(
            BuildingKind::classify(BuildingService::Residential, SubService::ResidentialLow, "ResidentialBuildingAI"),
            BuildingKind::Generic
        );
    }

    #[test]
    fn test_registry_register_and_release() {
        let mut registry = BuildingRegistry::new();
        let key = ArchetypeKey::new("Shop", "CommercialBuildingAI");
        registry.register(
            BuildingId(10),
            key.clone(),
            &facts(BuildingService::Commercial, SubService::CommercialLow),
            None,
        );
        assert_eq!(registry.count(), 1);
        assert!(registry.contains(BuildingId(10)));
        assert!(!registry.contains(BuildingId(3)));

        // Re-registration does not double count
        registry.register(
            BuildingId(10),
            key,
            &facts(BuildingService::Commercial, SubService::CommercialLow),
            None,
        );
        assert_eq!(registry.count(), 1);

        assert!(registry.release(BuildingId(10)).is_some());
        assert_eq!(registry.count(), 0);
        assert!(registry.release(BuildingId(10)).is_none());
    }

    #[test]
    fn test_same_campus() {
        let mut registry = BuildingRegistry::new();
        let uni = facts(BuildingService::PlayerEducation, SubService::None);
        registry.register(BuildingId(1), ArchetypeKey::new("Uni", "CampusBuildingAI"), &uni, Some(3));
        registry.register(BuildingId(2), ArchetypeKey::new("Gym", "VarsitySportsArenaAI"), &uni, Some(3));
        registry.register(BuildingId(3), ArchetypeKey::new("Gym", "VarsitySportsArenaAI"), &uni, Some(4));
        assert!(registry.same_campus(BuildingId(1), BuildingId(2)));
        assert!(!registry.same_campus(BuildingId(1), BuildingId(3)));
        assert!(!registry.same_campus(BuildingId(1), BuildingId(99)));
    }
}
