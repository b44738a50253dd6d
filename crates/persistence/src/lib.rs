#![deny(warnings)]

//! Save slots and snapshot codec over a pluggable key-value store.
//!
//! A save writes two keys per slot: `save/<slot>` holds the framed snapshot and
//! `meta/<slot>` a small JSON summary so slot listings never decode a state.
//!
//! Snapshot frame (little-endian):
//!   [0..4]  magic "SLOG"
//!   [4]     format (0 = JSON, 1 = bincode)
//!   [5..9]  snapshot version (u32)
//!   [9..]   encoded `SaveRecord`

pub mod store;

pub use store::{atomic_write, FileStore, KvStore, MemoryStore};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{validate_state, Difficulty, GameOverReason, GameState, ValidationError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Version written into every snapshot frame.
pub const SNAPSHOT_VERSION: u32 = 1;
/// Manual slots are numbered `1..=MAX_MANUAL_SLOTS`.
pub const MAX_MANUAL_SLOTS: u8 = 5;

const MAGIC: [u8; 4] = *b"SLOG";
const HEADER_SIZE: usize = 9;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(String),
    #[error("decoding error: {0}")]
    Decode(String),
    #[error("not a save snapshot")]
    BadHeader,
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("slot {0} is empty")]
    EmptySlot(SaveSlot),
    #[error("manual slot {0} out of range 1..={max}", max = MAX_MANUAL_SLOTS)]
    SlotOutOfRange(u8),
    #[error("invalid slot name: {0}")]
    InvalidSlot(String),
    #[error("unknown snapshot format: {0}")]
    UnknownFormat(String),
    #[error("invalid store key: {0}")]
    InvalidKey(String),
    #[error("snapshot failed validation: {0}")]
    Invalid(#[from] ValidationError),
}

/// Snapshot encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Json,
    Bincode,
}

impl Format {
    fn tag(self) -> u8 {
        match self {
            Format::Json => 0,
            Format::Bincode => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Format::Json),
            1 => Some(Format::Bincode),
            _ => None,
        }
    }
}

impl FromStr for Format {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "bincode" | "bin" => Ok(Format::Bincode),
            other => Err(PersistError::UnknownFormat(other.to_string())),
        }
    }
}

/// The reserved autosave slot or one of the manual slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveSlot {
    Auto,
    Manual(u8),
}

impl SaveSlot {
    /// Every valid slot, autosave first.
    pub fn all() -> impl Iterator<Item = SaveSlot> {
        std::iter::once(SaveSlot::Auto).chain((1..=MAX_MANUAL_SLOTS).map(SaveSlot::Manual))
    }

    pub fn check(self) -> Result<Self, PersistError> {
        match self {
            SaveSlot::Manual(n) if n == 0 || n > MAX_MANUAL_SLOTS => {
                Err(PersistError::SlotOutOfRange(n))
            }
            slot => Ok(slot),
        }
    }

    pub fn key(self) -> String {
        format!("save/{self}")
    }

    pub fn meta_key(self) -> String {
        format!("meta/{self}")
    }
}

impl fmt::Display for SaveSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveSlot::Auto => f.write_str("auto"),
            SaveSlot::Manual(n) => write!(f, "manual-{n}"),
        }
    }
}

impl FromStr for SaveSlot {
    type Err = PersistError;

    /// Accepts `auto`, `manual-N` or a bare slot number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "auto" {
            return Ok(SaveSlot::Auto);
        }
        let digits = s.strip_prefix("manual-").unwrap_or(&s);
        let n: u8 = digits
            .parse()
            .map_err(|_| PersistError::InvalidSlot(s.clone()))?;
        SaveSlot::Manual(n).check()
    }
}

/// What is stored under `save/<slot>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub saved_at: DateTime<Utc>,
    pub state: GameState,
}

/// Listing entry for an occupied slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub slot: SaveSlot,
    pub saved_at: DateTime<Utc>,
    pub turn: u32,
    pub year: i32,
    pub month: u32,
    pub budget: Decimal,
    pub total_score: f64,
    pub difficulty: Difficulty,
    pub game_over: Option<GameOverReason>,
}

impl SlotInfo {
    fn describe(slot: SaveSlot, record: &SaveRecord) -> Self {
        let s = &record.state;
        Self {
            slot,
            saved_at: record.saved_at,
            turn: s.turn,
            year: s.calendar.year,
            month: s.calendar.month,
            budget: s.budget,
            total_score: s.score.total_score,
            difficulty: s.difficulty,
            game_over: s.game_over,
        }
    }
}

/// Frame a record as snapshot bytes.
pub fn encode_snapshot(record: &SaveRecord, format: Format) -> Result<Vec<u8>, PersistError> {
    let payload = match format {
        Format::Json => {
            serde_json::to_vec(record).map_err(|e| PersistError::Encode(e.to_string()))?
        }
        Format::Bincode => {
            bincode::serialize(record).map_err(|e| PersistError::Encode(e.to_string()))?
        }
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.push(format.tag());
    out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Parse snapshot bytes. The format is read from the frame.
pub fn decode_snapshot(bytes: &[u8]) -> Result<SaveRecord, PersistError> {
    if bytes.len() < HEADER_SIZE || bytes[..4] != MAGIC {
        return Err(PersistError::BadHeader);
    }
    let format = Format::from_tag(bytes[4]).ok_or(PersistError::BadHeader)?;
    let version = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
    if version > SNAPSHOT_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_VERSION,
        });
    }
    let payload = &bytes[HEADER_SIZE..];
    match format {
        Format::Json => {
            serde_json::from_slice(payload).map_err(|e| PersistError::Decode(e.to_string()))
        }
        Format::Bincode => {
            bincode::deserialize(payload).map_err(|e| PersistError::Decode(e.to_string()))
        }
    }
}

/// Save slots over a [`KvStore`].
#[derive(Debug)]
pub struct SaveManager<S> {
    store: S,
    format: Format,
}

impl<S: KvStore> SaveManager<S> {
    pub fn new(store: S, format: Format) -> Self {
        Self { store, format }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Save at the current time. Returns the snapshot with `last_saved_at` stamped.
    pub fn save(&mut self, slot: SaveSlot, state: &GameState) -> Result<GameState, PersistError> {
        self.save_at(slot, state, Utc::now())
    }

    pub fn save_at(
        &mut self,
        slot: SaveSlot,
        state: &GameState,
        now: DateTime<Utc>,
    ) -> Result<GameState, PersistError> {
        let slot = slot.check()?;
        let mut stamped = state.clone();
        stamped.last_saved_at = Some(now);
        let record = SaveRecord {
            saved_at: now,
            state: stamped,
        };
        let bytes = encode_snapshot(&record, self.format)?;
        let info = SlotInfo::describe(slot, &record);
        let meta = serde_json::to_vec(&info).map_err(|e| PersistError::Encode(e.to_string()))?;

        self.store.set(&slot.key(), &bytes)?;
        self.store.set(&slot.meta_key(), &meta)?;
        info!(%slot, turn = info.turn, bytes = bytes.len(), format = ?self.format, "game saved");
        Ok(record.state)
    }

    /// Load and validate the snapshot in `slot`.
    pub fn load(&self, slot: SaveSlot) -> Result<GameState, PersistError> {
        let slot = slot.check()?;
        let bytes = self
            .store
            .get(&slot.key())?
            .ok_or(PersistError::EmptySlot(slot))?;
        let record = decode_snapshot(&bytes)?;
        validate_state(&record.state)?;
        info!(%slot, turn = record.state.turn, "game loaded");
        Ok(record.state)
    }

    /// Returns whether the slot held a save.
    pub fn delete(&mut self, slot: SaveSlot) -> Result<bool, PersistError> {
        let slot = slot.check()?;
        let existed = self.store.delete(&slot.key())?;
        self.store.delete(&slot.meta_key())?;
        debug!(%slot, existed, "slot deleted");
        Ok(existed)
    }

    /// Occupied slots, autosave first then manual slots in order.
    pub fn list(&self) -> Result<Vec<SlotInfo>, PersistError> {
        let keys = self.store.list("meta/")?;
        let mut infos = Vec::new();
        for slot in SaveSlot::all() {
            if !keys.contains(&slot.meta_key()) {
                continue;
            }
            if let Some(bytes) = self.store.get(&slot.meta_key())? {
                let info: SlotInfo = serde_json::from_slice(&bytes)
                    .map_err(|e| PersistError::Decode(e.to_string()))?;
                infos.push(info);
            }
        }
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use sim_core::{catalog, Depot, DepotType};

    fn played_game() -> GameState {
        let s0 = sim_runtime::initialize_game(Difficulty::Normal);
        let site = catalog::candidate_sites()
            .into_iter()
            .find(|s| s.id.0 == "mars-orbit")
            .unwrap();
        let s1 = sim_runtime::build_depot(&s0, Depot::new(site, DepotType::Small)).unwrap();
        let (s, _) = sim_runtime::run_turns(&s1, 4, true);
        s
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn roundtrip_both_formats() {
        let state = played_game();
        assert!(!state.routes.is_empty());
        for format in [Format::Json, Format::Bincode] {
            let mut mgr = SaveManager::new(MemoryStore::new(), format);
            let saved = mgr.save_at(SaveSlot::Manual(2), &state, noon()).unwrap();
            assert_eq!(saved.last_saved_at, Some(noon()));
            assert_eq!(state.last_saved_at, None);
            let loaded = mgr.load(SaveSlot::Manual(2)).unwrap();
            assert_eq!(loaded, saved, "{format:?}");
        }
    }

    #[test]
    fn slot_bounds_and_names() {
        let mut mgr = SaveManager::new(MemoryStore::new(), Format::Json);
        let state = sim_runtime::initialize_game(Difficulty::Easy);
        assert!(matches!(
            mgr.save(SaveSlot::Manual(0), &state),
            Err(PersistError::SlotOutOfRange(0))
        ));
        assert!(matches!(
            mgr.load(SaveSlot::Manual(6)),
            Err(PersistError::SlotOutOfRange(6))
        ));
        assert!(matches!(
            mgr.load(SaveSlot::Auto),
            Err(PersistError::EmptySlot(SaveSlot::Auto))
        ));
        assert_eq!("auto".parse::<SaveSlot>().unwrap(), SaveSlot::Auto);
        assert_eq!("manual-3".parse::<SaveSlot>().unwrap(), SaveSlot::Manual(3));
        assert_eq!("5".parse::<SaveSlot>().unwrap(), SaveSlot::Manual(5));
        assert!("9".parse::<SaveSlot>().is_err());
        assert!("quick".parse::<SaveSlot>().is_err());
        assert_eq!(SaveSlot::Manual(4).key(), "save/manual-4");
        assert_eq!(SaveSlot::all().count(), 1 + MAX_MANUAL_SLOTS as usize);
    }

    #[test]
    fn list_and_delete() {
        let mut mgr = SaveManager::new(MemoryStore::new(), Format::Bincode);
        let state = played_game();
        mgr.save_at(SaveSlot::Manual(3), &state, noon()).unwrap();
        mgr.save_at(SaveSlot::Auto, &state, noon()).unwrap();

        let infos = mgr.list().unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].slot, SaveSlot::Auto);
        assert_eq!(infos[1].slot, SaveSlot::Manual(3));
        assert_eq!(infos[1].turn, state.turn);
        assert_eq!(infos[1].budget, state.budget);

        assert!(mgr.delete(SaveSlot::Auto).unwrap());
        assert!(!mgr.delete(SaveSlot::Auto).unwrap());
        assert_eq!(mgr.list().unwrap().len(), 1);
        assert_eq!(mgr.store().len(), 2);
    }

    #[test]
    fn rejects_foreign_and_future_snapshots() {
        assert!(matches!(
            decode_snapshot(b"{\"state\":{}}"),
            Err(PersistError::BadHeader)
        ));
        let record = SaveRecord {
            saved_at: noon(),
            state: sim_runtime::initialize_game(Difficulty::Hard),
        };
        let mut bytes = encode_snapshot(&record, Format::Json).unwrap();
        assert_eq!(decode_snapshot(&bytes).unwrap(), record);
        bytes[5..9].copy_from_slice(&(SNAPSHOT_VERSION + 1).to_le_bytes());
        assert!(matches!(
            decode_snapshot(&bytes),
            Err(PersistError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn invalid_state_is_not_loaded() {
        let mut store = MemoryStore::new();
        let mut state = sim_runtime::initialize_game(Difficulty::Normal);
        state.colonies[0].satisfaction = 150.0;
        let record = SaveRecord {
            saved_at: noon(),
            state,
        };
        store
            .set(&SaveSlot::Auto.key(), &encode_snapshot(&record, Format::Json).unwrap())
            .unwrap();
        let mgr = SaveManager::new(store, Format::Json);
        assert!(matches!(
            mgr.load(SaveSlot::Auto),
            Err(PersistError::Invalid(ValidationError::SatisfactionOutOfRange(_)))
        ));
    }

    #[test]
    fn file_store_backs_save_manager() {
        let dir = std::env::temp_dir().join("solar_logistics_save_manager");
        let _ = std::fs::remove_dir_all(&dir);
        let state = played_game();
        let mut mgr = SaveManager::new(FileStore::new(&dir), Format::Json);
        let saved = mgr.save_at(SaveSlot::Manual(1), &state, noon()).unwrap();

        let reopened = SaveManager::new(FileStore::new(&dir), Format::Bincode);
        assert_eq!(reopened.load(SaveSlot::Manual(1)).unwrap(), saved);
        assert_eq!(reopened.list().unwrap()[0].slot, SaveSlot::Manual(1));
        let _ = std::fs::remove_dir_all(&dir);
    }

    proptest! {
        #[test]
        fn any_turn_count_roundtrips(turns in 0usize..24, bincode in any::<bool>()) {
            let s0 = sim_runtime::initialize_game(Difficulty::Hard);
            let (state, _) = sim_runtime::run_turns(&s0, turns, false);
            let format = if bincode { Format::Bincode } else { Format::Json };
            let record = SaveRecord { saved_at: noon(), state };
            let bytes = encode_snapshot(&record, format).unwrap();
            prop_assert_eq!(decode_snapshot(&bytes).unwrap(), record);
        }
    }
}
