//! Shared helpers for statue integration tests.
//!
//! Builds headless apps against a temporary data directory, pushes command
//! lines the way the host's command hook would, and provides common queries
//! over the resulting world.

use std::path::Path;

use anyhow::{Context, Result};
use bevy::prelude::*;
use statuary::commands::{CommandInbox, CommandSource, ReplyQueue};
use statuary::components::{Facing, MarkerStand, OwnerId, Statue};
use statuary::persistence::{OwnerFile, StatueStore};
use statuary::plugin::{StatuaryPlugin, StatuarySettings};
use statuary::registry::StatueRegistry;

/// Creates a headless app with the statue plugin rooted at `data_dir`.
///
/// Runs one update so the startup restore pass has completed before the
/// test begins.
pub fn test_app(data_dir: &Path) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(StatuarySettings {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    });
    app.add_plugins(StatuaryPlugin);
    app.update();
    app
}

/// A command source standing in the default world at `position`.
pub fn source_at(owner: OwnerId, position: Vec3) -> CommandSource {
    CommandSource {
        owner,
        world: "world".to_owned(),
        position,
        facing: Facing::new(0.0, 0.0),
    }
}

/// Pushes one command line and runs an update so it is dispatched.
pub fn issue(app: &mut App, source: &CommandSource, line: &str) {
    app.world_mut()
        .resource_mut::<CommandInbox>()
        .push(source.clone(), line);
    app.update();
}

/// Takes the chat lines queued for `owner`.
pub fn replies_for(app: &mut App, owner: OwnerId) -> Vec<String> {
    app.world_mut()
        .resource_mut::<ReplyQueue>()
        .drain_for(owner)
}

/// Resolves a statue entity through the registry.
pub fn find_statue(app: &App, owner: OwnerId, name: &str) -> Option<Entity> {
    app.world().resource::<StatueRegistry>().get(owner, name)
}

/// Counts live statue entities in the world.
pub fn statue_count(app: &mut App) -> usize {
    let mut query = app.world_mut().query_filtered::<Entity, With<Statue>>();
    query.iter(app.world()).count()
}

/// Reads and parses the owner's persisted file.
pub fn read_owner_file(app: &App, owner: OwnerId) -> Result<OwnerFile> {
    let path = app.world().resource::<StatueStore>().owner_path(owner);
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("owner file {} should exist", path.display()))?;
    serde_json::from_str(&contents).context("owner file should parse")
}

/// Counts marker-stand entities in the world.
///
/// Stands ride their statue as children, so a statue removal must take its
/// stand with it; asserting on the global count checks that attachment.
pub fn marker_stand_count(app: &mut App) -> usize {
    let mut query = app
        .world_mut()
        .query_filtered::<Entity, With<MarkerStand>>();
    query.iter(app.world()).count()
}
