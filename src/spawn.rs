//! Statue materialisation and removal.
//!
//! This module owns the shape of a live statue: the component bundle, the
//! decorative marker-stand child, the removal routine with its explicit
//! drop-suppression scope, the bounded remnant sweep that follows every
//! removal, and the startup system that respawns statues from persisted
//! records.
//!
//! Drop suppression is deliberately not a process-wide flag. The removal
//! routine registers the despawned entity in [`DropSuppressions`] with a
//! bounded tick lifetime; the host-integration observer consults that set
//! when the host scatters an item drop. The suppression scope is therefore
//! keyed to the removed entity and expires on its own, with no ambient
//! state left behind.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use hashbrown::HashMap;
use log::{error, info, warn};

use crate::components::{
    Facing, InWorld, Inert, Invulnerable, MarkerStand, OwnerId, Remnant, Silent, Statue, StatueId,
    Uncollidable, Weightless,
};
use crate::constants::{SWEEP_RADIUS, SWEEP_TICKS};
use crate::kind::StatueKind;
use crate::persistence::StatueStore;
use crate::registry::{RegisteredStatue, StatueRegistry};
use crate::world::WorldCatalog;

/// Complete component set of a freshly placed statue.
///
/// Every statue carries the record components (owner, name, kind, identifier,
/// placement) plus the fixed flag markers that make it decorative: it cannot
/// be hurt, acts on nothing, collides with nothing, ignores gravity, and
/// makes no sound.
#[derive(Bundle)]
pub struct StatueBundle {
    /// Owner and per-owner name.
    pub statue: Statue,
    /// Identifier token, persisted with the record.
    pub id: StatueId,
    /// Creature kind the statue displays as.
    pub kind: StatueKind,
    /// World-space placement.
    pub transform: Transform,
    /// Yaw and pitch in degrees.
    pub facing: Facing,
    /// World the statue stands in.
    pub in_world: InWorld,
    /// Human-readable name for inspection tools.
    pub name: Name,
    /// Damage immunity flag.
    pub invulnerable: Invulnerable,
    /// No-autonomous-behaviour flag.
    pub inert: Inert,
    /// No-collision flag.
    pub uncollidable: Uncollidable,
    /// No-gravity flag.
    pub weightless: Weightless,
    /// No-sound flag.
    pub silent: Silent,
}

impl StatueBundle {
    /// Assembles the bundle for a statue at `position` facing `facing`.
    #[must_use]
    pub fn new(
        owner: OwnerId,
        name: impl Into<String>,
        kind: StatueKind,
        world: impl Into<String>,
        position: Vec3,
        facing: Facing,
        id: StatueId,
    ) -> Self {
        let name = name.into();
        Self {
            name: Name::new(format!("Statue:{name}")),
            statue: Statue { owner, name },
            id,
            kind,
            transform: Transform::from_translation(position).with_rotation(facing.rotation()),
            facing,
            in_world: InWorld(world.into()),
            invulnerable: Invulnerable,
            inert: Inert,
            uncollidable: Uncollidable,
            weightless: Weightless,
            silent: Silent,
        }
    }
}

/// Spawns a statue entity with its decorative marker stand attached.
///
/// The stand rides the statue as a child, so despawning the statue takes
/// the stand with it.
pub fn spawn_statue(commands: &mut Commands, bundle: StatueBundle) -> Entity {
    let statue = commands.spawn(bundle).id();
    let stand = commands
        .spawn((MarkerStand, Name::new("MarkerStand"), Transform::default()))
        .id();
    commands.entity(statue).add_child(stand);
    statue
}

/// Entities whose item drops are currently suppressed.
///
/// Entries are written by [`remove_statue_entity`] immediately before the
/// despawn and carry a tick lifetime matching the remnant sweep, so drops
/// the host scatters a little late are still absorbed.
#[derive(Resource, Default)]
pub struct DropSuppressions(HashMap<Entity, u8>);

impl DropSuppressions {
    /// Registers an entity about to be despawned.
    pub fn suppress(&mut self, entity: Entity) {
        self.0.insert(entity, SWEEP_TICKS);
    }

    /// Whether drops from this entity are suppressed.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains_key(&entity)
    }

    /// Whether no suppression is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ages every entry by one tick, dropping the expired ones.
    pub fn tick(&mut self) {
        self.0.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
    }
}

/// Sweep entity despawning stray remnants around a removal site.
///
/// Fire-and-forget: lives for a fixed number of ticks, then removes itself.
/// There is no cancellation beyond the tick count.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemnantSweep {
    /// Ticks left before the sweep despawns itself.
    pub remaining: u8,
}

/// Removes a statue entity (and its stand) with drop suppression.
///
/// When `site` names the removal location, a bounded [`RemnantSweep`] is
/// left behind to absorb drops the host scatters a few ticks late.
pub fn remove_statue_entity(
    commands: &mut Commands,
    suppressions: &mut DropSuppressions,
    entity: Entity,
    site: Option<(&str, Vec3)>,
) {
    suppressions.suppress(entity);
    if let Some((world, center)) = site {
        commands.spawn((
            RemnantSweep {
                remaining: SWEEP_TICKS,
            },
            Transform::from_translation(center),
            InWorld(world.to_owned()),
            Name::new("RemnantSweep"),
        ));
    }
    commands.entity(entity).despawn();
}

/// Host-integration event: the host scattered an item drop from `source`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemnantScattered {
    /// The freshly spawned drop entity.
    pub remnant: Entity,
    /// The creature the drop came from.
    pub source: Entity,
}

/// Absorbs drops scattered by recently removed statues.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
pub fn absorb_suppressed_remnants(
    event: On<RemnantScattered>,
    mut commands: Commands,
    suppressions: Res<DropSuppressions>,
) {
    let scattered = event.event();
    if suppressions.contains(scattered.source) {
        commands.entity(scattered.remnant).despawn();
    }
}

/// Ages out the drop-suppression scope.
pub fn expire_drop_suppressions(mut suppressions: ResMut<DropSuppressions>) {
    if !suppressions.is_empty() {
        suppressions.tick();
    }
}

/// Despawns remnants near active sweeps and ages the sweeps out.
pub fn sweep_remnants_system(
    mut commands: Commands,
    mut sweeps: Query<(Entity, &mut RemnantSweep, &Transform, &InWorld), Without<Remnant>>,
    remnants: Query<(Entity, &Transform, &InWorld), With<Remnant>>,
) {
    if sweeps.is_empty() {
        return;
    }

    for (remnant, transform, in_world) in &remnants {
        let near_a_sweep = sweeps.iter().any(|(_, _, sweep_transform, sweep_world)| {
            sweep_world == in_world
                && sweep_transform
                    .translation
                    .distance(transform.translation)
                    <= SWEEP_RADIUS
        });
        if near_a_sweep {
            commands.entity(remnant).despawn();
        }
    }

    for (entity, mut sweep, _, _) in &mut sweeps {
        sweep.remaining = sweep.remaining.saturating_sub(1);
        if sweep.remaining == 0 {
            commands.entity(entity).despawn();
        }
    }
}

/// Respawns every persisted statue on startup.
///
/// Records with an unknown creature kind or an unloaded world are skipped
/// with a warning; the rest of the file continues loading. Records written
/// before identifiers existed are assigned a fresh one and the file is
/// rewritten in place.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
#[expect(
    clippy::cast_possible_truncation,
    reason = "Record coordinates fit comfortably in f32 world space."
)]
pub fn restore_statues_system(
    mut commands: Commands,
    store: Res<StatueStore>,
    catalog: Res<WorldCatalog>,
    mut registry: ResMut<StatueRegistry>,
) {
    let mut rng = rand::thread_rng();
    for (owner, mut file) in store.load_all() {
        let mut migrated = false;
        let mut restored = 0usize;
        let names: Vec<String> = file.statues.keys().cloned().collect();
        for name in names {
            let Some(record) = file.statues.get_mut(&name) else {
                continue;
            };
            let kind = match StatueKind::from_name(&record.kind) {
                Ok(kind) => kind,
                Err(err) => {
                    warn!("skipping statue '{name}' of {owner}: {err}");
                    continue;
                }
            };
            if !catalog.is_loaded(&record.world) {
                warn!(
                    "skipping statue '{name}' of {owner}: world '{}' is not loaded",
                    record.world
                );
                continue;
            }
            let id = if let Some(id) = record.id.clone() {
                id
            } else {
                // Compatibility path for files written before identifiers.
                let fresh = registry.fresh_id(&mut rng);
                info!("assigned identifier {fresh} to statue '{name}' of {owner}");
                record.id = Some(fresh.clone());
                migrated = true;
                fresh
            };
            let position = Vec3::new(record.x as f32, record.y as f32, record.z as f32);
            let facing = Facing::new(record.yaw, record.pitch);
            let entity = spawn_statue(
                &mut commands,
                StatueBundle::new(
                    owner,
                    name.clone(),
                    kind,
                    record.world.clone(),
                    position,
                    facing,
                    id.clone(),
                ),
            );
            if let Some(displaced) =
                registry.insert(owner, name.clone(), RegisteredStatue { entity, id })
            {
                commands.entity(displaced.entity).despawn();
            }
            restored += 1;
        }
        if migrated {
            if let Err(err) = store.save_owner(owner, &file.statues) {
                error!("failed to rewrite migrated file for {owner}: {err}");
            }
        }
        if restored > 0 {
            info!("restored {restored} statue(s) for {owner}");
        }
    }
}
