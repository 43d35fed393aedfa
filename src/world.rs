//! Host world and chunk availability.
//!
//! Statue records carry the name of the world they stand in. The host may
//! keep several named worlds loaded at once, and within a world it loads
//! terrain in 16x16 chunk columns. [`WorldCatalog`] mirrors that state so
//! the restore path can skip records whose world is missing and the delete
//! path can refuse to touch a statue in an unloaded chunk.

use bevy::prelude::*;
use hashbrown::{HashMap, HashSet};

use crate::constants::CHUNK_SIDE;

/// Chunk-column coordinate on the x/z plane.
pub type ChunkPos = (i32, i32);

/// Converts block-space x/z coordinates to a chunk column.
#[must_use]
pub fn chunk_at(x: f64, z: f64) -> ChunkPos {
    let cx = (x / CHUNK_SIDE).floor() as i32;
    let cz = (z / CHUNK_SIDE).floor() as i32;
    (cx, cz)
}

#[derive(Debug, Clone, Default)]
struct WorldState {
    // Chunks are loaded unless explicitly marked otherwise.
    unloaded_chunks: HashSet<ChunkPos>,
}

/// The set of worlds the host currently has loaded.
#[derive(Resource, Debug, Clone)]
pub struct WorldCatalog {
    worlds: HashMap<String, WorldState>,
}

impl Default for WorldCatalog {
    fn default() -> Self {
        Self::with_worlds(["world"])
    }
}

impl WorldCatalog {
    /// Creates a catalog with the given loaded worlds.
    #[must_use]
    pub fn with_worlds<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let worlds = names
            .into_iter()
            .map(|name| (name.into(), WorldState::default()))
            .collect();
        Self { worlds }
    }

    /// Marks a world as loaded.
    pub fn add_world(&mut self, name: impl Into<String>) {
        self.worlds.entry(name.into()).or_default();
    }

    /// Whether the named world is loaded.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.worlds.contains_key(name)
    }

    /// Whether the chunk column containing `(x, z)` is loaded.
    ///
    /// An unknown world counts as unloaded.
    #[must_use]
    pub fn chunk_loaded(&self, world: &str, x: f64, z: f64) -> bool {
        self.worlds
            .get(world)
            .is_some_and(|state| !state.unloaded_chunks.contains(&chunk_at(x, z)))
    }

    /// Marks the chunk column containing `(x, z)` as loaded or unloaded.
    pub fn set_chunk_loaded(&mut self, world: &str, x: f64, z: f64, loaded: bool) {
        let Some(state) = self.worlds.get_mut(world) else {
            return;
        };
        let chunk = chunk_at(x, z);
        if loaded {
            state.unloaded_chunks.remove(&chunk);
        } else {
            state.unloaded_chunks.insert(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_at_floors_negative_coordinates() {
        assert_eq!(chunk_at(0.0, 0.0), (0, 0));
        assert_eq!(chunk_at(15.9, 15.9), (0, 0));
        assert_eq!(chunk_at(16.0, 0.0), (1, 0));
        assert_eq!(chunk_at(-0.1, -16.0), (-1, -1));
    }

    #[test]
    fn default_catalog_has_the_main_world_fully_loaded() {
        let catalog = WorldCatalog::default();
        assert!(catalog.is_loaded("world"));
        assert!(catalog.chunk_loaded("world", 100.0, -200.0));
    }

    #[test]
    fn unknown_world_counts_as_unloaded() {
        let catalog = WorldCatalog::default();
        assert!(!catalog.is_loaded("the_end"));
        assert!(!catalog.chunk_loaded("the_end", 0.0, 0.0));
    }

    #[test]
    fn chunks_can_be_unloaded_and_reloaded() {
        let mut catalog = WorldCatalog::default();
        catalog.set_chunk_loaded("world", 40.0, 40.0, false);

        assert!(!catalog.chunk_loaded("world", 47.9, 47.9));
        // The neighbouring column is unaffected.
        assert!(catalog.chunk_loaded("world", 48.0, 40.0));

        catalog.set_chunk_loaded("world", 40.0, 40.0, true);
        assert!(catalog.chunk_loaded("world", 40.0, 40.0));
    }
}
