//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation frame counter (advanced once per host tick)
pub type Frame = u64;

/// Host building identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u16);

impl BuildingId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "building#{}", self.0)
    }
}

/// Host citizen identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CitizenId(pub u32);

impl fmt::Display for CitizenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "citizen#{}", self.0)
    }
}

/// Identifier of a city event inside the event manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Index of a citizen unit inside the unit arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitIndex(pub u32);

impl UnitIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shared building template: the prefab name plus the AI behavior class
///
/// Many building instances share one archetype. Prefab and global work-time
/// records are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeKey {
    pub prefab: String,
    pub ai_class: String,
}

impl ArchetypeKey {
    pub fn new(prefab: impl Into<String>, ai_class: impl Into<String>) -> Self {
        Self {
            prefab: prefab.into(),
            ai_class: ai_class.into(),
        }
    }
}

impl fmt::Display for ArchetypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.prefab, self.ai_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_key_display() {
        let key = ArchetypeKey::new("Corner Cafe", "CommercialBuildingAI");
        assert_eq!(key.to_string(), "Corner Cafe (CommercialBuildingAI)");
    }

    #[test]
    fn test_ids_order_by_value() {
        let mut ids = vec![BuildingId(7), BuildingId(2), BuildingId(5)];
        ids.sort();
        assert_eq!(ids, vec![BuildingId(2), BuildingId(5), BuildingId(7)]);
    }
}
