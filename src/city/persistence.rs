//! Versioned byte codec for the per-save work-time tables
//!
//! Little-endian layout:
//!
//! ```text
//! [version: u16][0xFEFEFEFE][count: i32]
//!   count x [0xFEFEFEFE][building: u16][night][weekends][extended][continuous]
//!           [shifts: i32][default][prefab][global][locked][0xFAFAFAFA]
//! v4+: [0xFEFEFEFE][count: i32]
//!   count x [0xFEFEFEFE][prefab: str][ai_class: str][night][weekends][extended]
//!           [continuous][shifts: i32][locked][0xFAFAFAFA]
//! ```
//!
//! Booleans are one byte, strings are an i32 byte length followed by UTF-8.
//! The origin flags exist from v2, `locked` from v3 and the prefab section
//! from v4. Global records are not part of the stream.

use thiserror::Error;

use crate::city::profiles::{InstanceRecord, PolicyOrigin, WorkTimeProfileStore};
use crate::city::work_time::WorkTimePolicy;
use crate::core::types::{ArchetypeKey, BuildingId};

pub const CURRENT_VERSION: u16 = 4;
pub const OLDEST_VERSION: u16 = 1;

const TUPLE_START: u32 = 0xFEFE_FEFE;
const TUPLE_END: u32 = 0xFAFA_FAFA;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Expected frame marker {expected:#010x} at offset {offset}, found {found:#010x}")]
    FrameMismatch { expected: u32, found: u32, offset: usize },

    #[error("Unexpected end of data at offset {offset} (wanted {wanted} bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },

    #[error("Unsupported work-time data version {0}")]
    UnsupportedVersion(u16),

    #[error("Negative record count {count} at offset {offset}")]
    NegativeCount { count: i32, offset: usize },

    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),
}

type CodecResult<T> = std::result::Result<T, PersistenceError>;

#[derive(Default)]
struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    fn str(&mut self, value: &str) {
        self.i32(value.len() as i32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn policy_flags(&mut self, policy: &WorkTimePolicy) {
        self.bool(policy.work_at_night);
        self.bool(policy.work_at_weekends);
        self.bool(policy.has_extended_shift);
        self.bool(policy.has_continuous_shift);
        self.i32(policy.shift_count as i32);
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let end = self.offset + N;
        let slice = self.bytes.get(self.offset..end).ok_or(PersistenceError::UnexpectedEof {
            offset: self.offset,
            wanted: N,
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.offset = end;
        Ok(out)
    }

    fn u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn bool(&mut self) -> CodecResult<bool> {
        Ok(self.take::<1>()?[0] != 0)
    }

    fn marker(&mut self, expected: u32) -> CodecResult<()> {
        let offset = self.offset;
        let found = self.u32()?;
        if found != expected {
            return Err(PersistenceError::FrameMismatch {
                expected,
                found,
                offset,
            });
        }
        Ok(())
    }

    fn count(&mut self) -> CodecResult<usize> {
        let offset = self.offset;
        let count = self.i32()?;
        usize::try_from(count).map_err(|_| PersistenceError::NegativeCount { count, offset })
    }

    fn str(&mut self) -> CodecResult<String> {
        let len = self.count()?;
        let offset = self.offset;
        let slice = self
            .bytes
            .get(offset..offset + len)
            .ok_or(PersistenceError::UnexpectedEof { offset, wanted: len })?;
        self.offset += len;
        String::from_utf8(slice.to_vec()).map_err(|_| PersistenceError::InvalidUtf8(offset))
    }

    fn policy_flags(&mut self) -> CodecResult<WorkTimePolicy> {
        let work_at_night = self.bool()?;
        let work_at_weekends = self.bool()?;
        let has_extended_shift = self.bool()?;
        let has_continuous_shift = self.bool()?;
        let shift_count = self.i32()?.clamp(0, u8::MAX as i32) as u8;
        Ok(WorkTimePolicy {
            work_at_night,
            work_at_weekends,
            has_extended_shift,
            has_continuous_shift,
            shift_count,
            is_locked: false,
        })
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }
}

fn origin_flags(origin: PolicyOrigin) -> [bool; 3] {
    match origin {
        PolicyOrigin::Default => [true, false, false],
        PolicyOrigin::Prefab => [false, true, false],
        PolicyOrigin::Global => [false, false, true],
        PolicyOrigin::Custom => [false, false, false],
    }
}

fn origin_from_flags(is_default: bool, is_prefab: bool, is_global: bool) -> PolicyOrigin {
    if is_default {
        PolicyOrigin::Default
    } else if is_prefab {
        PolicyOrigin::Prefab
    } else if is_global {
        PolicyOrigin::Global
    } else {
        PolicyOrigin::Custom
    }
}

/// Serialize the store's instance and prefab tables at the current version
pub fn encode(store: &WorkTimeProfileStore) -> Vec<u8> {
    let mut out = ByteWriter::default();
    write_version(&mut out, store, CURRENT_VERSION);
    out.buf
}

/// Serialize at an older layout version, dropping what that version lacks
pub fn encode_version(store: &WorkTimeProfileStore, version: u16) -> CodecResult<Vec<u8>> {
    if !(OLDEST_VERSION..=CURRENT_VERSION).contains(&version) {
        return Err(PersistenceError::UnsupportedVersion(version));
    }
    let mut out = ByteWriter::default();
    write_version(&mut out, store, version);
    Ok(out.buf)
}

fn write_version(out: &mut ByteWriter, store: &WorkTimeProfileStore, version: u16) {
    let instances = store.instances_sorted();
    out.u16(version);
    out.u32(TUPLE_START);
    out.i32(instances.len() as i32);
    for (building, record) in &instances {
        out.u32(TUPLE_START);
        out.u16(building.0);
        out.policy_flags(&record.policy);
        if version >= 2 {
            for flag in origin_flags(record.origin) {
                out.bool(flag);
            }
        }
        if version >= 3 {
            out.bool(record.policy.is_locked);
        }
        out.u32(TUPLE_END);
    }

    if version >= 4 {
        let prefabs = store.prefabs_sorted();
        out.u32(TUPLE_START);
        out.i32(prefabs.len() as i32);
        for (key, policy) in &prefabs {
            out.u32(TUPLE_START);
            out.str(&key.prefab);
            out.str(&key.ai_class);
            out.policy_flags(policy);
            out.bool(policy.is_locked);
            out.u32(TUPLE_END);
        }
    }
}

/// Replace the store's per-save tables with the contents of `bytes`
///
/// Global records are left untouched. An empty slice means nothing was saved.
/// On any decoding error the per-save tables are left empty.
pub fn decode_into(store: &mut WorkTimeProfileStore, bytes: &[u8]) -> CodecResult<()> {
    store.clear_save_data();
    if bytes.is_empty() {
        return Ok(());
    }
    match read_all(store, bytes) {
        Ok(()) => {
            store.take_dirty();
            tracing::info!(
                "Loaded {} instance and {} prefab work-time records",
                store.instance_count(),
                store.prefab_count()
            );
            Ok(())
        }
        Err(err) => {
            store.clear_save_data();
            tracing::error!("Work-time data unreadable, per-save records reset: {}", err);
            Err(err)
        }
    }
}

fn read_all(store: &mut WorkTimeProfileStore, bytes: &[u8]) -> CodecResult<()> {
    let mut reader = ByteReader::new(bytes);
    let version = reader.u16()?;
    if !(OLDEST_VERSION..=CURRENT_VERSION).contains(&version) {
        return Err(PersistenceError::UnsupportedVersion(version));
    }

    reader.marker(TUPLE_START)?;
    let count = reader.count()?;
    for _ in 0..count {
        reader.marker(TUPLE_START)?;
        let building = BuildingId(reader.u16()?);
        let mut policy = reader.policy_flags()?;
        let origin = if version >= 2 {
            let is_default = reader.bool()?;
            let is_prefab = reader.bool()?;
            let is_global = reader.bool()?;
            origin_from_flags(is_default, is_prefab, is_global)
        } else {
            PolicyOrigin::Custom
        };
        if version >= 3 {
            policy.is_locked = reader.bool()?;
        }
        reader.marker(TUPLE_END)?;
        store.set_instance(building, InstanceRecord { policy, origin });
    }

    if version >= 4 {
        reader.marker(TUPLE_START)?;
        let count = reader.count()?;
        for _ in 0..count {
            reader.marker(TUPLE_START)?;
            let key = ArchetypeKey::new(reader.str()?, reader.str()?);
            let mut policy = reader.policy_flags()?;
            policy.is_locked = reader.bool()?;
            reader.marker(TUPLE_END)?;
            store.insert_loaded_prefab(key, policy);
        }
    }

    if reader.remaining() > 0 {
        tracing::warn!("Ignoring {} trailing bytes after work-time data", reader.remaining());
    }
    Ok(())
}
