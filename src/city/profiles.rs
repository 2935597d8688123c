//! Work-time profile store - three-tier policy lookup
//!
//! Lookup order for a building: its own instance record, then the prefab
//! record of its archetype, then the global record of its archetype, then
//! `WorkTimePolicy::ALWAYS_OPEN`. Instance and prefab records belong to one
//! save; global records are shared by every save and persist as TOML.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::city::building::{BuildingRegistry, RegisteredBuilding};
use crate::city::work_time::WorkTimePolicy;
use crate::core::error::Result;
use crate::core::types::{ArchetypeKey, BuildingId};

/// Where an instance record's values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyOrigin {
    /// Derived from the category default at registration
    Default,
    /// Copied from the archetype's prefab record
    Prefab,
    /// Copied from the archetype's global record
    Global,
    /// Edited for this building only
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub policy: WorkTimePolicy,
    pub origin: PolicyOrigin,
}

/// Which tier answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicySource {
    Instance,
    Prefab,
    Global,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub policy: WorkTimePolicy,
    pub source: PolicySource,
}

/// Tier and key of a record to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileTarget {
    Instance(BuildingId),
    Prefab(ArchetypeKey),
    Global(ArchetypeKey),
}

/// Cross-save global records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalProfiles {
    records: AHashMap<ArchetypeKey, WorkTimePolicy>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlGlobalProfiles {
    #[serde(default)]
    profiles: Vec<TomlGlobalProfile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlGlobalProfile {
    prefab: String,
    ai_class: String,
    #[serde(flatten)]
    policy: WorkTimePolicy,
}

impl GlobalProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ArchetypeKey) -> Option<&WorkTimePolicy> {
        self.records.get(key)
    }

    pub fn insert(&mut self, key: ArchetypeKey, policy: WorkTimePolicy) {
        self.records.insert(key, policy.normalized());
    }

    pub fn remove(&mut self, key: &ArchetypeKey) -> Option<WorkTimePolicy> {
        self.records.remove(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load global records from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        let data: TomlGlobalProfiles = toml::from_str(content)?;
        let mut profiles = Self::new();
        for entry in data.profiles {
            profiles.insert(ArchetypeKey::new(entry.prefab, entry.ai_class), entry.policy);
        }
        Ok(profiles)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let mut profiles: Vec<TomlGlobalProfile> = self
            .records
            .iter()
            .map(|(key, policy)| TomlGlobalProfile {
                prefab: key.prefab.clone(),
                ai_class: key.ai_class.clone(),
                policy: *policy,
            })
            .collect();
        profiles.sort_by(|a, b| (&a.prefab, &a.ai_class).cmp(&(&b.prefab, &b.ai_class)));
        Ok(toml::to_string_pretty(&TomlGlobalProfiles { profiles })?)
    }
}

/// The work-time profile store
#[derive(Debug, Clone, Default)]
pub struct WorkTimeProfileStore {
    instances: AHashMap<BuildingId, InstanceRecord>,
    prefabs: AHashMap<ArchetypeKey, WorkTimePolicy>,
    globals: GlobalProfiles,
    dirty: bool,
}

// Equality is about records; the dirty flag is bookkeeping
impl PartialEq for WorkTimeProfileStore {
    fn eq(&self, other: &Self) -> bool {
        self.instances == other.instances
            && self.prefabs == other.prefabs
            && self.globals == other.globals
    }
}

impl WorkTimeProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_globals(globals: GlobalProfiles) -> Self {
        Self {
            globals,
            ..Self::default()
        }
    }

    /// Resolve a building's policy; never fails
    pub fn resolve(&self, building: BuildingId, archetype: Option<&ArchetypeKey>) -> ResolvedPolicy {
        if let Some(record) = self.instances.get(&building) {
            return ResolvedPolicy {
                policy: record.policy,
                source: PolicySource::Instance,
            };
        }
        if let Some(key) = archetype {
            if let Some(policy) = self.prefabs.get(key) {
                return ResolvedPolicy {
                    policy: *policy,
                    source: PolicySource::Prefab,
                };
            }
            if let Some(policy) = self.globals.get(key) {
                return ResolvedPolicy {
                    policy: *policy,
                    source: PolicySource::Global,
                };
            }
        }
        ResolvedPolicy {
            policy: WorkTimePolicy::ALWAYS_OPEN,
            source: PolicySource::Fallback,
        }
    }

    /// True when some tier covers the building
    pub fn covers(&self, building: BuildingId, archetype: &ArchetypeKey) -> bool {
        self.resolve(building, Some(archetype)).source != PolicySource::Fallback
    }

    /// Insert or overwrite a record; the policy is normalized first
    pub fn set(&mut self, target: ProfileTarget, policy: WorkTimePolicy) {
        let policy = policy.normalized();
        match target {
            ProfileTarget::Instance(building) => {
                self.instances.insert(
                    building,
                    InstanceRecord {
                        policy,
                        origin: PolicyOrigin::Custom,
                    },
                );
                self.dirty = true;
            }
            ProfileTarget::Prefab(key) => {
                self.prefabs.insert(key, policy);
                self.dirty = true;
            }
            ProfileTarget::Global(key) => self.globals.insert(key, policy),
        }
    }

    /// Insert an instance record with an explicit origin
    pub fn set_instance(&mut self, building: BuildingId, record: InstanceRecord) {
        self.instances.insert(
            building,
            InstanceRecord {
                policy: record.policy.normalized(),
                origin: record.origin,
            },
        );
        self.dirty = true;
    }

    /// Create the instance record of a newly registered building
    ///
    /// Does nothing when a tier already covers the building. Returns whether a
    /// record was created.
    pub fn ensure_instance(&mut self, building: &RegisteredBuilding) -> bool {
        if self.covers(building.id, &building.archetype) {
            return false;
        }
        let policy = WorkTimePolicy::default_for(building.kind, building.service, building.sub_service);
        self.set_instance(
            building.id,
            InstanceRecord {
                policy,
                origin: PolicyOrigin::Default,
            },
        );
        true
    }

    /// Delete the instance record of a destroyed building
    pub fn remove(&mut self, building: BuildingId) -> Option<InstanceRecord> {
        let removed = self.instances.remove(&building);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn remove_prefab(&mut self, key: &ArchetypeKey) -> Option<WorkTimePolicy> {
        let removed = self.prefabs.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Delete every unlocked instance record of an archetype
    ///
    /// With `include_global` the archetype's prefab record goes too, so the
    /// global template becomes the effective policy. Returns the number of
    /// instance records removed.
    pub fn bulk_reset(
        &mut self,
        archetype: &ArchetypeKey,
        include_global: bool,
        registry: &BuildingRegistry,
    ) -> usize {
        let targets: Vec<BuildingId> = registry
            .with_archetype(archetype)
            .map(|b| b.id)
            .filter(|id| self.instances.get(id).is_some_and(|r| !r.policy.is_locked))
            .collect();
        for id in &targets {
            self.instances.remove(id);
        }
        if include_global {
            self.prefabs.remove(archetype);
        }
        if !targets.is_empty() || include_global {
            self.dirty = true;
        }
        tracing::info!(
            "Reset {} instance work-time records of {} (include_global: {})",
            targets.len(),
            archetype,
            include_global
        );
        targets.len()
    }

    pub fn instance(&self, building: BuildingId) -> Option<&InstanceRecord> {
        self.instances.get(&building)
    }

    pub fn prefab(&self, key: &ArchetypeKey) -> Option<&WorkTimePolicy> {
        self.prefabs.get(key)
    }

    pub fn globals(&self) -> &GlobalProfiles {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut GlobalProfiles {
        &mut self.globals
    }

    /// Instance records sorted by building id
    pub fn instances_sorted(&self) -> Vec<(BuildingId, InstanceRecord)> {
        let mut records: Vec<_> = self.instances.iter().map(|(id, r)| (*id, *r)).collect();
        records.sort_by_key(|(id, _)| *id);
        records
    }

    /// Prefab records sorted by archetype
    pub fn prefabs_sorted(&self) -> Vec<(ArchetypeKey, WorkTimePolicy)> {
        let mut records: Vec<_> = self.prefabs.iter().map(|(k, p)| (k.clone(), *p)).collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn prefab_count(&self) -> usize {
        self.prefabs.len()
    }

    /// Drop the per-save tables, keeping global records
    pub fn clear_save_data(&mut self) {
        self.instances.clear();
        self.prefabs.clear();
        self.dirty = false;
    }

    pub(crate) fn insert_loaded_prefab(&mut self, key: ArchetypeKey, policy: WorkTimePolicy) {
        self.prefabs.insert(key, policy.normalized());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Report and clear the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
