//! Per-owner statue files.
//!
//! Each owner with at least one statue gets one JSON file under
//! `<data_dir>/owners/`, named by the owner identity's string form and
//! holding a `statues` map keyed by statue name. Saving replaces a file's
//! prior contents entirely; owners left without statues have their file
//! removed. Failures are deliberately soft: a file that cannot be read or
//! parsed is skipped with a warning on load, and a write failure is logged
//! without aborting the rest of the pass. In-memory state stays
//! authoritative until the next successful save.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use hashbrown::HashSet;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{Facing, InWorld, OwnerId, Statue, StatueId};
use crate::kind::StatueKind;
use crate::registry::StatueRegistry;

/// Errors surfaced by the statue store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing an owner file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An owner file held malformed JSON.
    #[error("malformed owner file: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A file name did not parse as an owner identity.
    #[error("file stem is not an owner id: {0}")]
    BadOwnerStem(String),
}

/// One persisted statue: everything needed to respawn it after a restart.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatueRecord {
    /// Name of the world the statue stands in.
    pub world: String,
    /// Block-space x coordinate.
    pub x: f64,
    /// Block-space y coordinate.
    pub y: f64,
    /// Block-space z coordinate.
    pub z: f64,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Lowercase creature-kind name; parsed on restore so an unknown kind
    /// only drops this record, not the whole file.
    pub kind: String,
    /// Identifier token. Absent in files written before identifiers
    /// existed; the restore path assigns one and rewrites the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StatueId>,
}

/// On-disk layout of one owner's file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct OwnerFile {
    /// Statue records keyed by statue name.
    pub statues: BTreeMap<String, StatueRecord>,
}

/// Filesystem adapter for owner files.
#[derive(Resource, Clone, Debug)]
pub struct StatueStore {
    owners_dir: PathBuf,
}

impl StatueStore {
    /// Creates a store rooted at the plugin's data directory.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            owners_dir: data_dir.join("owners"),
        }
    }

    /// Directory holding the per-owner files.
    #[must_use]
    pub fn owners_dir(&self) -> &Path {
        &self.owners_dir
    }

    /// Path of the file for one owner.
    #[must_use]
    pub fn owner_path(&self, owner: OwnerId) -> PathBuf {
        self.owners_dir.join(format!("{owner}.json"))
    }

    /// Writes `records` as the complete new contents of the owner's file.
    ///
    /// An empty record set removes the file instead.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the directory cannot be created or
    /// the file cannot be written.
    pub fn save_owner(
        &self,
        owner: OwnerId,
        records: &BTreeMap<String, StatueRecord>,
    ) -> Result<(), PersistenceError> {
        let path = self.owner_path(owner);
        if records.is_empty() {
            if path.exists() {
                fs::remove_file(&path)?;
            }
            return Ok(());
        }
        fs::create_dir_all(&self.owners_dir)?;
        let file = OwnerFile {
            statues: records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&path, json)?;
        Ok(())
    }

    /// Reads one owner file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the stem is not an owner identity
    /// or the contents cannot be read or parsed.
    pub fn load_owner(&self, path: &Path) -> Result<(OwnerId, OwnerFile), PersistenceError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let owner: OwnerId = stem
            .parse()
            .map_err(|_| PersistenceError::BadOwnerStem(stem.to_owned()))?;
        let contents = fs::read_to_string(path)?;
        let file: OwnerFile = serde_json::from_str(&contents)?;
        Ok((owner, file))
    }

    /// Reads every owner file, skipping unreadable ones with a warning.
    #[must_use]
    pub fn load_all(&self) -> Vec<(OwnerId, OwnerFile)> {
        let entries = match fs::read_dir(&self.owners_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                error!("cannot list {}: {err}", self.owners_dir.display());
                return Vec::new();
            }
        };

        let mut loaded = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match self.load_owner(&path) {
                Ok(parsed) => loaded.push(parsed),
                Err(err) => warn!("skipping owner file {}: {err}", path.display()),
            }
        }
        loaded
    }
}

/// Owners whose files must be rewritten at the end of the current tick.
///
/// Mutating systems mark the affected owner here; the persist system runs
/// after them in the same schedule and flushes each marked owner from live
/// entity state.
#[derive(Resource, Default)]
pub struct DirtyOwners(HashSet<OwnerId>);

impl DirtyOwners {
    /// Marks an owner's file for rewriting.
    pub fn mark(&mut self, owner: OwnerId) {
        self.0.insert(owner);
    }

    /// Takes every marked owner, leaving the set empty.
    pub fn drain(&mut self) -> Vec<OwnerId> {
        self.0.drain().collect()
    }

    /// Whether no owner is currently marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Compact alias for the component view serialised into a record.
pub(crate) type StatueRow<'w> = (
    &'w Statue,
    &'w StatueId,
    &'w StatueKind,
    &'w Transform,
    &'w Facing,
    &'w InWorld,
);

/// Builds the persisted record for one live statue.
#[must_use]
pub(crate) fn record_from_row(row: StatueRow<'_>) -> StatueRecord {
    let (_, id, kind, transform, facing, in_world) = row;
    StatueRecord {
        world: in_world.0.clone(),
        x: f64::from(transform.translation.x),
        y: f64::from(transform.translation.y),
        z: f64::from(transform.translation.z),
        yaw: facing.yaw,
        pitch: facing.pitch,
        kind: kind.name().to_owned(),
        id: Some(id.clone()),
    }
}

/// Rewrites the file of every owner marked dirty this tick.
///
/// Records are built from live component state, so this must run after the
/// mutating systems' commands have been applied. Write failures are logged
/// and do not stop the pass.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn persist_dirty_owners_system(
    mut dirty: ResMut<DirtyOwners>,
    registry: Res<StatueRegistry>,
    store: Res<StatueStore>,
    rows: Query<StatueRow<'_>>,
) {
    if dirty.is_empty() {
        return;
    }
    for owner in dirty.drain() {
        let mut records = BTreeMap::new();
        for name in registry.names(owner) {
            let Some(registered) = registry.get_registered(owner, &name) else {
                continue;
            };
            match rows.get(registered.entity) {
                Ok(row) => {
                    records.insert(name, record_from_row(row));
                }
                Err(_) => warn!("statue '{name}' of {owner} has no live components; not saved"),
            }
        }
        if let Err(err) = store.save_owner(owner, &records) {
            error!("failed to save statues for {owner}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(world: &str, kind: &str, id: Option<&str>) -> StatueRecord {
        StatueRecord {
            world: world.to_owned(),
            x: 10.0,
            y: 64.0,
            z: 10.0,
            yaw: 0.0,
            pitch: 0.0,
            kind: kind.to_owned(),
            id: id.map(StatueId::new),
        }
    }

    #[test]
    fn save_and_load_round_trips_records() {
        let dir = tempdir().expect("tempdir");
        let store = StatueStore::new(dir.path());
        let owner = OwnerId::random();

        let mut records = BTreeMap::new();
        records.insert("guard".to_owned(), record("world", "zombie", Some("abcd")));
        store.save_owner(owner, &records).expect("save");

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        let (loaded_owner, file) = loaded.into_iter().next().expect("one file");
        assert_eq!(loaded_owner, owner);
        assert_eq!(file.statues, records);
    }

    #[test]
    fn empty_record_set_removes_the_file() {
        let dir = tempdir().expect("tempdir");
        let store = StatueStore::new(dir.path());
        let owner = OwnerId::random();

        let mut records = BTreeMap::new();
        records.insert("guard".to_owned(), record("world", "zombie", Some("abcd")));
        store.save_owner(owner, &records).expect("save");
        assert!(store.owner_path(owner).exists());

        store.save_owner(owner, &BTreeMap::new()).expect("clear");
        assert!(!store.owner_path(owner).exists());
    }

    #[test]
    fn record_without_id_deserialises_as_none() {
        let json = r#"{
            "statues": {
                "guard": {
                    "world": "world",
                    "x": 1.0, "y": 2.0, "z": 3.0,
                    "yaw": 0.0, "pitch": 0.0,
                    "kind": "zombie"
                }
            }
        }"#;
        let file: OwnerFile = serde_json::from_str(json).expect("parses");
        let guard = file.statues.get("guard").expect("record present");
        assert!(guard.id.is_none());
    }

    #[test]
    fn load_all_skips_malformed_and_misnamed_files() {
        let dir = tempdir().expect("tempdir");
        let store = StatueStore::new(dir.path());
        let owner = OwnerId::random();

        let mut records = BTreeMap::new();
        records.insert("guard".to_owned(), record("world", "zombie", Some("abcd")));
        store.save_owner(owner, &records).expect("save");

        fs::write(store.owners_dir().join("broken.json"), "{ not json").expect("write");
        fs::write(
            store
                .owners_dir()
                .join(format!("{}.json", OwnerId::random())),
            "[]",
        )
        .expect("write");
        fs::write(store.owners_dir().join("notes.txt"), "ignored").expect("write");

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first().map(|(o, _)| *o), Some(owner));
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let dir = tempdir().expect("tempdir");
        let store = StatueStore::new(&dir.path().join("never-created"));
        assert!(store.load_all().is_empty());
    }
}
