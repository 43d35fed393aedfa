//! Plugin wiring: resources, observers, and schedules.
//!
//! [`StatuaryPlugin`] is the single entry point a host application adds. It
//! installs the registry, the command inbox and reply queue, the persistence
//! adapter, and the lifecycle observers, then restores persisted statues at
//! startup. The host integrates by:
//!
//! - pushing typed command lines into
//!   [`CommandInbox`](crate::commands::CommandInbox) and draining
//!   [`ReplyQueue`](crate::commands::ReplyQueue),
//! - triggering [`StatuePerished`] when a creature carrying a statue
//!   identifier dies,
//! - triggering [`RemnantScattered`](crate::spawn::RemnantScattered) when a
//!   despawned creature scatters item drops,
//! - triggering [`StatuaryShutdown`] before tearing the world down.
//!
//! All systems run on the host's single-threaded schedule, so registry
//! mutations are serialised by construction and need no locking.

use std::collections::BTreeMap;
use std::path::PathBuf;

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::{error, info};

use crate::commands::{dispatch_commands_system, CommandInbox, ReplyQueue};
use crate::components::{
    Facing, InWorld, Inert, Invulnerable, MarkerStand, Remnant, Silent, StatueId, Uncollidable,
    Weightless,
};
use crate::kind::StatueKind;
use crate::persistence::{
    persist_dirty_owners_system, record_from_row, DirtyOwners, StatueRow, StatueStore,
};
use crate::registry::StatueRegistry;
use crate::spawn::{
    absorb_suppressed_remnants, expire_drop_suppressions, remove_statue_entity,
    restore_statues_system, sweep_remnants_system, DropSuppressions,
};
use crate::world::WorldCatalog;

/// Runtime configuration for the statue plugin.
///
/// Insert this resource before adding [`StatuaryPlugin`] to override the
/// defaults; the plugin reads it once at build time.
#[derive(Resource, Clone, Debug)]
pub struct StatuarySettings {
    /// Directory the per-owner files live under.
    pub data_dir: PathBuf,
    /// World assumed loaded when the host registers no catalog of its own.
    pub default_world: String,
}

impl Default for StatuarySettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/statuary"),
            default_world: "world".to_owned(),
        }
    }
}

/// Host-integration event: a creature carrying this identifier died.
///
/// Unknown identifiers are ignored, so the host may forward every creature
/// death without filtering.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct StatuePerished {
    /// Identifier read from the dead creature's metadata.
    pub id: StatueId,
}

/// Host-integration event: persist everything and despawn all statues.
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatuaryShutdown;

/// Removes a perished statue's record; a no-op for unknown identifiers.
fn handle_statue_perished(
    event: On<StatuePerished>,
    mut registry: ResMut<StatueRegistry>,
    mut dirty: ResMut<DirtyOwners>,
) {
    let id = &event.event().id;
    if let Some((key, _)) = registry.remove_by_id(id) {
        info!("statue '{}' of {} perished", key.name, key.owner);
        dirty.mark(key.owner);
    } else {
        log::debug!("ignoring perish event for unknown identifier {id}");
    }
}

/// Flushes every owner's records to disk, then despawns all statues.
///
/// The flush happens first so the records are built from live entity state;
/// a write failure is logged and does not stop the teardown.
fn handle_shutdown(
    _event: On<StatuaryShutdown>,
    mut commands: Commands,
    mut registry: ResMut<StatueRegistry>,
    mut suppressions: ResMut<DropSuppressions>,
    mut dirty: ResMut<DirtyOwners>,
    store: Res<StatueStore>,
    rows: Query<StatueRow<'_>>,
) {
    // This flush supersedes any pending per-owner rewrites; dropping the
    // marks keeps the persist system from rewriting files from the
    // soon-to-be-empty registry.
    let _ = dirty.drain();

    for owner in registry.owners() {
        let mut records = BTreeMap::new();
        for name in registry.names(owner) {
            let Some(registered) = registry.get_registered(owner, &name) else {
                continue;
            };
            if let Ok(row) = rows.get(registered.entity) {
                records.insert(name, record_from_row(row));
            }
        }
        if let Err(err) = store.save_owner(owner, &records) {
            error!("failed to save statues for {owner} during shutdown: {err}");
        }
    }

    let drained = registry.drain_all();
    let count = drained.len();
    for (_, statue) in drained {
        remove_statue_entity(&mut commands, &mut suppressions, statue.entity, None);
    }
    if count > 0 {
        info!("despawned {count} statue(s) on shutdown");
    }
}

/// Bevy plugin exposing player-placed creature statues.
///
/// Safe to add once per app; reads [`StatuarySettings`] at build time and
/// leaves a host-provided [`WorldCatalog`] untouched.
#[derive(Debug, Default)]
pub struct StatuaryPlugin;

impl Plugin for StatuaryPlugin {
    fn build(&self, app: &mut App) {
        let settings = app
            .world()
            .get_resource::<StatuarySettings>()
            .cloned()
            .unwrap_or_default();
        let store = StatueStore::new(&settings.data_dir);
        if !app.world().contains_resource::<WorldCatalog>() {
            app.insert_resource(WorldCatalog::with_worlds([settings.default_world.clone()]));
        }
        app.insert_resource(settings);
        app.insert_resource(store);
        app.init_resource::<StatueRegistry>();
        app.init_resource::<CommandInbox>();
        app.init_resource::<ReplyQueue>();
        app.init_resource::<DropSuppressions>();
        app.init_resource::<DirtyOwners>();
        app.register_type::<StatueId>()
            .register_type::<StatueKind>()
            .register_type::<Facing>()
            .register_type::<InWorld>()
            .register_type::<Invulnerable>()
            .register_type::<Inert>()
            .register_type::<Uncollidable>()
            .register_type::<Weightless>()
            .register_type::<Silent>()
            .register_type::<MarkerStand>()
            .register_type::<Remnant>();
        app.add_observer(handle_statue_perished);
        app.add_observer(handle_shutdown);
        app.add_observer(absorb_suppressed_remnants);
        app.add_systems(Startup, restore_statues_system);
        app.add_systems(
            Update,
            (dispatch_commands_system, persist_dirty_owners_system).chain(),
        );
        app.add_systems(Update, sweep_remnants_system);
        app.add_systems(Last, expire_drop_suppressions);
    }
}
