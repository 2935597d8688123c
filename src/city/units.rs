//! Citizen units - per-building rosters of households, workplaces and visitors
//!
//! Each building owns a chain of fixed-size units linked by `next`. Chains may
//! be imported from the host as-is, so every walk goes through `UnitChain`,
//! which refuses to visit more links than the arena holds and logs when it
//! had to stop early.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, CitizenId, UnitIndex};

/// Citizens per unit
pub const UNIT_CAPACITY: usize = 5;

/// What a unit's slots are used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Home,
    Work,
    Visit,
    Student,
    Hotel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenUnit {
    pub kind: UnitKind,
    pub building: BuildingId,
    pub citizens: [Option<CitizenId>; UNIT_CAPACITY],
    pub next: Option<UnitIndex>,
}

impl CitizenUnit {
    fn new(kind: UnitKind, building: BuildingId) -> Self {
        Self {
            kind,
            building,
            citizens: [None; UNIT_CAPACITY],
            next: None,
        }
    }

    pub fn occupants(&self) -> impl Iterator<Item = CitizenId> + '_ {
        self.citizens.iter().flatten().copied()
    }

    pub fn free_slots(&self) -> usize {
        self.citizens.iter().filter(|c| c.is_none()).count()
    }
}

/// Arena of citizen units with per-building chain heads
#[derive(Debug, Clone)]
pub struct CitizenUnitArena {
    units: Vec<CitizenUnit>,
    heads: AHashMap<BuildingId, UnitIndex>,
    free: Vec<UnitIndex>,
    max_walk: usize,
}

impl Default for CitizenUnitArena {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl CitizenUnitArena {
    /// `max_walk` caps every chain walk in addition to the arena size
    pub fn new(max_walk: usize) -> Self {
        Self {
            units: Vec::new(),
            heads: AHashMap::new(),
            free: Vec::new(),
            max_walk,
        }
    }

    pub fn unit(&self, index: UnitIndex) -> Option<&CitizenUnit> {
        self.units.get(index.index())
    }

    pub fn head(&self, building: BuildingId) -> Option<UnitIndex> {
        self.heads.get(&building).copied()
    }

    /// Append `count` units of `kind` to the end of the building's chain
    pub fn allocate(&mut self, building: BuildingId, kind: UnitKind, count: usize) {
        let mut tail = self.tail(building);
        for _ in 0..count {
            let unit = CitizenUnit::new(kind, building);
            let index = match self.free.pop() {
                Some(index) => {
                    self.units[index.index()] = unit;
                    index
                }
                None => {
                    self.units.push(unit);
                    UnitIndex((self.units.len() - 1) as u32)
                }
            };
            match tail {
                Some(prev) => self.units[prev.index()].next = Some(index),
                None => {
                    self.heads.insert(building, index);
                }
            }
            tail = Some(index);
        }
    }

    /// Last unit of the building's chain
    ///
    /// Not capped by `max_walk`: every unit is visited at most once, so the walk
    /// is bounded by the arena size. A cyclic chain yields the unit that closes
    /// the cycle; appending after it cuts the cycle.
    fn tail(&self, building: BuildingId) -> Option<UnitIndex> {
        let mut tail = self.head(building).filter(|h| h.index() < self.units.len())?;
        let mut seen = vec![false; self.units.len()];
        loop {
            seen[tail.index()] = true;
            let Some(next) = self.units[tail.index()].next else {
                return Some(tail);
            };
            match seen.get(next.index()) {
                Some(false) => tail = next,
                Some(true) => {
                    tracing::warn!("Unit chain of {} is cyclic; appending after {:?}", building, tail);
                    return Some(tail);
                }
                None => {
                    tracing::warn!("Unit chain of {} points at missing unit {:?}", building, next);
                    return Some(tail);
                }
            }
        }
    }

    /// Overwrite a unit's `next` link, as imported from host data
    pub fn link(&mut self, from: UnitIndex, next: Option<UnitIndex>) {
        if let Some(unit) = self.units.get_mut(from.index()) {
            unit.next = next;
        }
    }

    /// Walk the building's chain with cycle protection
    pub fn chain(&self, building: BuildingId) -> UnitChain<'_> {
        UnitChain::new(self, self.head(building), building)
    }

    /// Place a citizen into the first free slot of a unit of `kind`
    pub fn add_citizen(&mut self, building: BuildingId, kind: UnitKind, citizen: CitizenId) -> bool {
        let target = self
            .chain(building)
            .find(|(_, unit)| unit.kind == kind && unit.free_slots() > 0)
            .map(|(index, _)| index);
        let Some(index) = target else {
            return false;
        };
        let unit = &mut self.units[index.index()];
        if let Some(slot) = unit.citizens.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(citizen);
            return true;
        }
        false
    }

    pub fn remove_citizen(&mut self, building: BuildingId, citizen: CitizenId) -> bool {
        let target = self
            .chain(building)
            .find(|(_, unit)| unit.occupants().any(|c| c == citizen))
            .map(|(index, _)| index);
        let Some(index) = target else {
            return false;
        };
        for slot in self.units[index.index()].citizens.iter_mut() {
            if *slot == Some(citizen) {
                *slot = None;
            }
        }
        true
    }

    /// All citizens in units of `kind`, in chain order
    pub fn citizens(&self, building: BuildingId, kind: UnitKind) -> Vec<CitizenId> {
        self.chain(building)
            .filter(|(_, unit)| unit.kind == kind)
            .flat_map(|(_, unit)| unit.occupants().collect::<Vec<_>>())
            .collect()
    }

    /// Household members sharing a home unit with `citizen`
    pub fn household_of(&self, home: BuildingId, citizen: CitizenId) -> Vec<CitizenId> {
        self.chain(home)
            .find(|(_, unit)| unit.kind == UnitKind::Home && unit.occupants().any(|c| c == citizen))
            .map(|(_, unit)| unit.occupants().collect())
            .unwrap_or_default()
    }

    pub fn free_slots(&self, building: BuildingId, kind: UnitKind) -> usize {
        self.chain(building)
            .filter(|(_, unit)| unit.kind == kind)
            .map(|(_, unit)| unit.free_slots())
            .sum()
    }

    /// Release every unit of the building back to the free list
    pub fn release_building(&mut self, building: BuildingId) {
        let indices: Vec<UnitIndex> = self.chain(building).map(|(index, _)| index).collect();
        for index in indices {
            let unit = &mut self.units[index.index()];
            unit.citizens = [None; UNIT_CAPACITY];
            unit.next = None;
            self.free.push(index);
        }
        self.heads.remove(&building);
    }
}

/// Bounded walk over a unit chain
///
/// Stops after `min(arena size, max_walk)` links: a longer chain must contain a
/// cycle. The walk then logs a warning and yields no further units.
pub struct UnitChain<'a> {
    arena: &'a CitizenUnitArena,
    next: Option<UnitIndex>,
    building: BuildingId,
    steps: usize,
    limit: usize,
    truncated: bool,
}

impl<'a> UnitChain<'a> {
    fn new(arena: &'a CitizenUnitArena, first: Option<UnitIndex>, building: BuildingId) -> Self {
        Self {
            arena,
            next: first,
            building,
            steps: 0,
            limit: arena.units.len().min(arena.max_walk),
            truncated: false,
        }
    }

    /// True when the walk was cut short by the cycle guard
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for UnitChain<'a> {
    type Item = (UnitIndex, &'a CitizenUnit);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        if self.steps >= self.limit {
            tracing::warn!(
                "Unit chain of {} exceeded {} links; assuming a cycle and stopping",
                self.building,
                self.limit
            );
            self.truncated = true;
            self.next = None;
            return None;
        }
        let Some(unit) = self.arena.units.get(index.index()) else {
            tracing::warn!("Unit chain of {} points at missing unit {:?}", self.building, index);
            self.truncated = true;
            self.next = None;
            return None;
        };
        self.steps += 1;
        self.next = unit.next;
        Some((index, unit))
    }
}
