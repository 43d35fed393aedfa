//! Library crate providing the statue plugin core.
//! Re-exports components, registry, and systems for the host application and
//! tests.
pub mod commands;
pub mod components;
pub mod constants;
pub mod kind;
pub mod logging;
pub mod persistence;
pub mod plugin;
pub mod registry;
pub mod spawn;
pub mod world;

pub use constants::*;

// Re-export commonly used items
pub use commands::{
    completions, CommandInbox, CommandSource, Invocation, Reply, ReplyQueue, StatueCommand,
    UsageError,
};
pub use components::{
    Facing, InWorld, Inert, Invulnerable, MarkerStand, OwnerId, Remnant, Silent, Statue, StatueId,
    Uncollidable, Weightless,
};
pub use kind::{KindParseError, StatueKind};
pub use logging::init as init_logging;
pub use persistence::{DirtyOwners, OwnerFile, PersistenceError, StatueRecord, StatueStore};
pub use plugin::{StatuaryPlugin, StatuarySettings, StatuePerished, StatuaryShutdown};
pub use registry::{RegisteredStatue, StatueKey, StatueRegistry};
pub use spawn::{
    remove_statue_entity, spawn_statue, DropSuppressions, RemnantScattered, RemnantSweep,
    StatueBundle,
};
pub use world::WorldCatalog;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use statuary::prelude::*;
    //! ```

    pub use crate::commands::{completions, CommandInbox, CommandSource, ReplyQueue};
    pub use crate::components::{Facing, OwnerId, StatueId};
    pub use crate::kind::StatueKind;
    pub use crate::plugin::{StatuaryPlugin, StatuarySettings, StatuePerished, StatuaryShutdown};
    pub use crate::registry::StatueRegistry;
    pub use crate::world::WorldCatalog;
}
