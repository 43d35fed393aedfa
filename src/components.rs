//! ECS component types used by the statue plugin.
//! Includes owner and statue identifiers, orientation, world placement, and
//! the fixed set of flag markers every statue carries.

use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{STATUE_ID_ALPHABET, STATUE_ID_LEN};

/// Identity of the player that owns a statue.
///
/// The underlying 128-bit [`Uuid`] is used directly as a map key; statues are
/// namespaced per owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    /// Generates a fresh random owner identity.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OwnerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Random token uniquely naming a statue instance.
///
/// Stored both on the live entity and in the owner's persisted file, so a
/// restart re-links records to freshly spawned entities. Generation draws
/// from an alphanumeric alphabet; global uniqueness is enforced by the
/// registry, which retries on collision.
#[derive(
    Component, Reflect, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[reflect(Component, Default)]
pub struct StatueId(String);

impl StatueId {
    /// Wraps an already-generated token, e.g. one read back from disk.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generates a fresh 16-character alphanumeric token.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let token = (0..STATUE_ID_LEN)
            .map(|_| {
                let index = rng.gen_range(0..STATUE_ID_ALPHABET.len());
                char::from(*STATUE_ID_ALPHABET.get(index).unwrap_or(&b'0'))
            })
            .collect();
        Self(token)
    }

    /// Borrows the token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record component tying a live entity to its owner and per-owner name.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Statue {
    /// Player that placed the statue.
    pub owner: OwnerId,
    /// Name unique within the owner's namespace (lowercased by the façade).
    pub name: String,
}

/// Yaw and pitch of a statue, in degrees.
#[derive(Component, Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[reflect(Component, Default)]
pub struct Facing {
    /// Rotation about the vertical axis.
    pub yaw: f32,
    /// Tilt of the head above or below the horizon.
    pub pitch: f32,
}

impl Facing {
    /// Creates a facing from yaw and pitch angles in degrees.
    #[must_use]
    pub const fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Converts the facing into a world-space rotation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            0.0,
        )
    }
}

/// Name of the world a statue stands in.
///
/// The host may run several named worlds; records carry the name so a restore
/// can skip statues whose world is not loaded.
#[derive(Component, Reflect, Clone, Debug, Default, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct InWorld(pub String);

/// Marker: the entity cannot take damage.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Invulnerable;

/// Marker: the entity has no autonomous behaviour.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Inert;

/// Marker: the entity does not collide with others.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Uncollidable;

/// Marker: gravity does not act on the entity.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Weightless;

/// Marker: the entity emits no sounds.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Silent;

/// Marker for the decorative stand attached to every statue.
///
/// The stand rides the statue as a child entity and is despawned with it.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct MarkerStand;

/// Marker for item-drop entities scattered by the host when a creature dies.
///
/// The plugin never spawns these; it only absorbs them around statue
/// removals.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Remnant;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_fixed_length_and_alphabet() {
        let mut rng = rand::thread_rng();
        let id = StatueId::generate(&mut rng);

        assert_eq!(id.as_str().len(), STATUE_ID_LEN);
        assert!(id
            .as_str()
            .bytes()
            .all(|b| STATUE_ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn generated_ids_differ() {
        let mut rng = rand::thread_rng();
        let first = StatueId::generate(&mut rng);
        let second = StatueId::generate(&mut rng);

        // A 62^16 space makes a collision here vanishingly unlikely.
        assert_ne!(first, second);
    }

    #[test]
    fn owner_id_round_trips_through_display() {
        let owner = OwnerId::random();
        let parsed: OwnerId = owner.to_string().parse().expect("display form must parse");
        assert_eq!(owner, parsed);
    }

    #[test]
    fn facing_zero_is_identity_rotation() {
        let facing = Facing::default();
        let rotation = facing.rotation();
        assert!(rotation.angle_between(Quat::IDENTITY) < 1e-6);
    }

    #[test]
    fn facing_yaw_rotates_about_vertical_axis() {
        let facing = Facing::new(90.0, 0.0);
        let forward = facing.rotation() * Vec3::Z;
        // A 90 degree yaw swings +Z onto +X.
        assert!((forward - Vec3::X).length() < 1e-5);
    }
}
