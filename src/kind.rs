//! Living-creature kinds a statue can take.
//!
//! The host can spawn many entity types; statues are restricted to the
//! living-creature subset enumerated here. Kind names are matched
//! case-insensitively on input and rendered lowercase everywhere, including
//! in persisted records and tab completion.

use bevy::prelude::*;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a kind name does not match any living creature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown creature kind '{0}'")]
pub struct KindParseError(pub String);

/// The living-creature types available as statues.
#[derive(
    Component,
    Reflect,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[reflect(Component, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatueKind {
    /// The default creature for doc examples and reflection defaults.
    #[default]
    Zombie,
    /// Ranged skeletal archer.
    Skeleton,
    /// Exploding green creature.
    Creeper,
    /// Wall-climbing arachnid.
    Spider,
    /// Tall teleporting figure.
    Enderman,
    /// Passive trading villager.
    Villager,
    /// Hostile witch.
    Witch,
    /// Bouncing cube.
    Slime,
    /// Waterlogged zombie variant.
    Drowned,
    /// Desert zombie variant.
    Husk,
    /// Frozen skeleton variant.
    Stray,
    /// Crossbow-wielding raider.
    Pillager,
    /// Axe-wielding raider.
    Vindicator,
    /// Village protector construct.
    IronGolem,
    /// Stacked snow construct.
    SnowGolem,
    /// Farmyard pig.
    Pig,
    /// Farmyard cow.
    Cow,
    /// Farmyard sheep.
    Sheep,
    /// Farmyard chicken.
    Chicken,
    /// Rideable horse.
    Horse,
    /// Pack-animal donkey.
    Donkey,
    /// Spitting pack animal.
    Llama,
    /// Tameable wolf.
    Wolf,
    /// Tameable cat.
    Cat,
    /// Skittish fox.
    Fox,
    /// Hopping rabbit.
    Rabbit,
    /// Bamboo-eating bear.
    Panda,
    /// Arctic bear.
    PolarBear,
    /// Flying helper sprite.
    Allay,
    /// Cave-dwelling axolotl.
    Axolotl,
}

impl StatueKind {
    /// Every kind, in declaration order. Used for parsing and completion.
    pub const ALL: &'static [Self] = &[
        Self::Zombie,
        Self::Skeleton,
        Self::Creeper,
        Self::Spider,
        Self::Enderman,
        Self::Villager,
        Self::Witch,
        Self::Slime,
        Self::Drowned,
        Self::Husk,
        Self::Stray,
        Self::Pillager,
        Self::Vindicator,
        Self::IronGolem,
        Self::SnowGolem,
        Self::Pig,
        Self::Cow,
        Self::Sheep,
        Self::Chicken,
        Self::Horse,
        Self::Donkey,
        Self::Llama,
        Self::Wolf,
        Self::Cat,
        Self::Fox,
        Self::Rabbit,
        Self::Panda,
        Self::PolarBear,
        Self::Allay,
        Self::Axolotl,
    ];

    /// Lowercase canonical name, as persisted and completed.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zombie => "zombie",
            Self::Skeleton => "skeleton",
            Self::Creeper => "creeper",
            Self::Spider => "spider",
            Self::Enderman => "enderman",
            Self::Villager => "villager",
            Self::Witch => "witch",
            Self::Slime => "slime",
            Self::Drowned => "drowned",
            Self::Husk => "husk",
            Self::Stray => "stray",
            Self::Pillager => "pillager",
            Self::Vindicator => "vindicator",
            Self::IronGolem => "iron_golem",
            Self::SnowGolem => "snow_golem",
            Self::Pig => "pig",
            Self::Cow => "cow",
            Self::Sheep => "sheep",
            Self::Chicken => "chicken",
            Self::Horse => "horse",
            Self::Donkey => "donkey",
            Self::Llama => "llama",
            Self::Wolf => "wolf",
            Self::Cat => "cat",
            Self::Fox => "fox",
            Self::Rabbit => "rabbit",
            Self::Panda => "panda",
            Self::PolarBear => "polar_bear",
            Self::Allay => "allay",
            Self::Axolotl => "axolotl",
        }
    }

    /// Parses a kind from its name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`KindParseError`] when the name matches no known creature.
    pub fn from_name(name: &str) -> Result<Self, KindParseError> {
        let wanted = name.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| KindParseError(name.to_owned()))
    }

    /// Kind names starting with the given prefix, for tab completion.
    ///
    /// The prefix is matched case-insensitively; an empty prefix yields every
    /// name. Results are in sorted order.
    #[must_use]
    pub fn completions(prefix: &str) -> Vec<&'static str> {
        let wanted = prefix.to_lowercase();
        SORTED_NAMES
            .iter()
            .copied()
            .filter(|name| name.starts_with(&wanted))
            .collect()
    }
}

/// All kind names, sorted once for completion output.
static SORTED_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names: Vec<&'static str> = StatueKind::ALL.iter().map(|kind| kind.name()).collect();
    names.sort_unstable();
    names
});
