//! Command façade: textual invocations in, registry mutations out.
//!
//! The host forwards player-typed command lines into [`CommandInbox`]; the
//! dispatch system drains the inbox once per tick, validates each line, and
//! applies the matching registry operation. Validation failures produce a
//! usage reply and never mutate state. Replies are queued on [`ReplyQueue`]
//! for the host to deliver as chat lines.
//!
//! Completion is a pure function over the caller's own statue names and the
//! enumerated creature kinds, so the host can call it from its own
//! tab-completion hook without touching the schedule.

use std::collections::VecDeque;

use bevy::prelude::*;
use bevy_ecs::system::SystemParam;
use log::warn;
use thiserror::Error;

use crate::components::{Facing, InWorld, OwnerId, Statue};
use crate::kind::StatueKind;
use crate::persistence::DirtyOwners;
use crate::registry::{RegisteredStatue, StatueRegistry};
use crate::spawn::{remove_statue_entity, spawn_statue, DropSuppressions, StatueBundle};
use crate::world::WorldCatalog;

/// Who issued a command, and from where.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandSource {
    /// The issuing player.
    pub owner: OwnerId,
    /// World the player stands in.
    pub world: String,
    /// The player's position at invocation time.
    pub position: Vec3,
    /// The player's view direction at invocation time.
    pub facing: Facing,
}

/// A parsed statue command.
#[derive(Clone, Debug, PartialEq)]
pub enum StatueCommand {
    /// `ms <name> <kind>`: place a statue, replacing any prior one of the
    /// same name.
    Create {
        /// Statue name, lowercased.
        name: String,
        /// Raw kind name; resolved against [`StatueKind`] at dispatch.
        kind: String,
    },
    /// `msmove <name>`: relocate the statue to the caller's position.
    Move {
        /// Statue name, lowercased.
        name: String,
    },
    /// `msdel [name]`: delete the named statue, or list them all.
    Delete {
        /// Statue name, or `None` to list.
        name: Option<String>,
    },
    /// `msadjust <name> <yaw> <pitch>`: rotate the statue in place.
    Adjust {
        /// Statue name, lowercased.
        name: String,
        /// New yaw in degrees.
        yaw: f32,
        /// New pitch in degrees.
        pitch: f32,
    },
}

/// Validation failures produced by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// Nothing to parse.
    #[error("empty command line")]
    EmptyInput,
    /// Wrong shape for `ms`.
    #[error("usage: /ms <name> <creature kind>")]
    Create,
    /// Wrong shape for `msmove`.
    #[error("usage: /msmove <name>")]
    Move,
    /// Wrong shape for `msdel`.
    #[error("usage: /msdel [name]")]
    Delete,
    /// Wrong shape for `msadjust`.
    #[error("usage: /msadjust <name> <yaw> <pitch>")]
    Adjust,
    /// Yaw or pitch did not parse as a number.
    #[error("invalid yaw or pitch value; provide valid numbers")]
    BadAngle,
    /// The first token named no known command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// Parses one command line into a [`StatueCommand`].
///
/// Statue names are lowercased here so the per-owner namespace is
/// case-insensitive. Creature kinds are passed through raw and resolved at
/// dispatch, where an unknown kind is a chat reply rather than a usage
/// error.
///
/// # Errors
///
/// Returns [`UsageError`] on a wrong argument count or an unparsable angle;
/// the caller reports it and must not mutate state.
pub fn parse(line: &str) -> Result<StatueCommand, UsageError> {
    let mut tokens = line.split_whitespace();
    let label = tokens.next().ok_or(UsageError::EmptyInput)?;
    let label = label.trim_start_matches('/').to_lowercase();
    let args: Vec<&str> = tokens.collect();

    match label.as_str() {
        "ms" => match args.as_slice() {
            [name, kind] => Ok(StatueCommand::Create {
                name: name.to_lowercase(),
                kind: (*kind).to_owned(),
            }),
            _ => Err(UsageError::Create),
        },
        "msmove" => match args.as_slice() {
            [name] => Ok(StatueCommand::Move {
                name: name.to_lowercase(),
            }),
            _ => Err(UsageError::Move),
        },
        "msdel" => match args.as_slice() {
            [] => Ok(StatueCommand::Delete { name: None }),
            [name] => Ok(StatueCommand::Delete {
                name: Some(name.to_lowercase()),
            }),
            _ => Err(UsageError::Delete),
        },
        "msadjust" => match args.as_slice() {
            [name, yaw, pitch] => {
                let yaw: f32 = yaw.parse().map_err(|_| UsageError::BadAngle)?;
                let pitch: f32 = pitch.parse().map_err(|_| UsageError::BadAngle)?;
                Ok(StatueCommand::Adjust {
                    name: name.to_lowercase(),
                    yaw,
                    pitch,
                })
            }
            _ => Err(UsageError::Adjust),
        },
        other => Err(UsageError::UnknownCommand(other.to_owned())),
    }
}

/// A command line together with its source, ready for dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    /// Who issued the command, and from where.
    pub source: CommandSource,
    /// The raw command line as typed.
    pub line: String,
}

/// Queue of command lines awaiting dispatch.
///
/// The host pushes here from its command hook; the dispatch system drains
/// it once per tick, so mutations stay serialised on the schedule.
#[derive(Resource, Default)]
pub struct CommandInbox(VecDeque<Invocation>);

impl CommandInbox {
    /// Enqueues a command line from the given source.
    pub fn push(&mut self, source: CommandSource, line: impl Into<String>) {
        self.0.push_back(Invocation {
            source,
            line: line.into(),
        });
    }

    /// Takes every queued invocation in arrival order.
    pub fn drain(&mut self) -> Vec<Invocation> {
        self.0.drain(..).collect()
    }

    /// Whether the inbox holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One chat line addressed to a player.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    /// Addressee.
    pub owner: OwnerId,
    /// Chat line text.
    pub text: String,
}

/// Chat lines awaiting delivery by the host.
#[derive(Resource, Default)]
pub struct ReplyQueue(Vec<Reply>);

impl ReplyQueue {
    /// Queues a chat line for a player.
    pub fn push(&mut self, owner: OwnerId, text: impl Into<String>) {
        self.0.push(Reply {
            owner,
            text: text.into(),
        });
    }

    /// Takes every queued reply in emission order.
    pub fn drain(&mut self) -> Vec<Reply> {
        std::mem::take(&mut self.0)
    }

    /// Takes the texts addressed to one player, leaving the rest queued.
    pub fn drain_for(&mut self, owner: OwnerId) -> Vec<String> {
        let (mine, rest): (Vec<Reply>, Vec<Reply>) =
            std::mem::take(&mut self.0).into_iter().partition(|reply| reply.owner == owner);
        self.0 = rest;
        mine.into_iter().map(|reply| reply.text).collect()
    }

    /// Whether no reply is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Shared mutable state the dispatch helpers operate on.
#[derive(SystemParam)]
pub struct DispatchContext<'w, 's> {
    registry: ResMut<'w, StatueRegistry>,
    replies: ResMut<'w, ReplyQueue>,
    suppressions: ResMut<'w, DropSuppressions>,
    dirty: ResMut<'w, DirtyOwners>,
    catalog: Res<'w, WorldCatalog>,
    placements: Query<
        'w,
        's,
        (
            &'static mut Transform,
            &'static mut Facing,
            &'static mut InWorld,
        ),
        With<Statue>,
    >,
}

/// Drains the inbox and applies each command.
pub fn dispatch_commands_system(
    mut commands: Commands,
    mut inbox: ResMut<CommandInbox>,
    mut context: DispatchContext,
) {
    if inbox.is_empty() {
        return;
    }
    for invocation in inbox.drain() {
        let source = invocation.source;
        match parse(&invocation.line) {
            Ok(StatueCommand::Create { name, kind }) => {
                handle_create(&mut commands, &mut context, &source, &name, &kind);
            }
            Ok(StatueCommand::Move { name }) => {
                handle_move(&mut context, &source, &name);
            }
            Ok(StatueCommand::Delete { name: Some(name) }) => {
                handle_delete(&mut commands, &mut context, &source, &name);
            }
            Ok(StatueCommand::Delete { name: None }) => {
                handle_list(&mut context, &source);
            }
            Ok(StatueCommand::Adjust { name, yaw, pitch }) => {
                handle_adjust(&mut context, &source, &name, Facing::new(yaw, pitch));
            }
            Err(usage) => context.replies.push(source.owner, usage.to_string()),
        }
    }
}

fn handle_create(
    commands: &mut Commands,
    context: &mut DispatchContext,
    source: &CommandSource,
    name: &str,
    kind_name: &str,
) {
    // Validate the kind before touching any state; an existing statue of
    // this name must survive a failed create.
    let kind = match StatueKind::from_name(kind_name) {
        Ok(kind) => kind,
        Err(err) => {
            context.replies.push(source.owner, err.to_string());
            return;
        }
    };

    if let Some(displaced) = context.registry.remove(source.owner, name) {
        remove_statue_entity(
            commands,
            &mut context.suppressions,
            displaced.entity,
            Some((&source.world, source.position)),
        );
    }

    let mut rng = rand::thread_rng();
    let id = context.registry.fresh_id(&mut rng);
    let entity = spawn_statue(
        commands,
        StatueBundle::new(
            source.owner,
            name,
            kind,
            source.world.clone(),
            source.position,
            source.facing,
            id.clone(),
        ),
    );
    context
        .registry
        .insert(source.owner, name, RegisteredStatue { entity, id });
    context.dirty.mark(source.owner);
    context
        .replies
        .push(source.owner, format!("Statue '{name}' created."));
}

fn handle_move(context: &mut DispatchContext, source: &CommandSource, name: &str) {
    let Some(entity) = context.registry.get(source.owner, name) else {
        reply_not_found(context, source, name);
        return;
    };
    let Ok((mut transform, mut facing, mut in_world)) = context.placements.get_mut(entity) else {
        warn!("statue '{name}' of {} has no placement components", source.owner);
        context
            .replies
            .push(source.owner, format!("Statue data not found for '{name}'."));
        return;
    };
    transform.translation = source.position;
    transform.rotation = source.facing.rotation();
    *facing = source.facing;
    in_world.0 = source.world.clone();
    context.dirty.mark(source.owner);
    context
        .replies
        .push(source.owner, format!("Statue '{name}' moved to your position."));
}

fn handle_adjust(
    context: &mut DispatchContext,
    source: &CommandSource,
    name: &str,
    new_facing: Facing,
) {
    let Some(entity) = context.registry.get(source.owner, name) else {
        reply_not_found(context, source, name);
        return;
    };
    let Ok((mut transform, mut facing, _)) = context.placements.get_mut(entity) else {
        warn!("statue '{name}' of {} has no placement components", source.owner);
        context
            .replies
            .push(source.owner, format!("Statue data not found for '{name}'."));
        return;
    };
    *facing = new_facing;
    transform.rotation = new_facing.rotation();
    context.dirty.mark(source.owner);
    context.replies.push(
        source.owner,
        format!("Statue '{name}' yaw and pitch adjusted."),
    );
}

fn handle_delete(
    commands: &mut Commands,
    context: &mut DispatchContext,
    source: &CommandSource,
    name: &str,
) {
    if context.registry.get(source.owner, name).is_none() {
        reply_not_found(context, source, name);
        return;
    }

    // Abort before mutating anything when the statue's chunk is unloaded.
    let site = context
        .registry
        .get(source.owner, name)
        .and_then(|entity| context.placements.get(entity).ok())
        .map(|(transform, _, in_world)| (in_world.0.clone(), transform.translation));
    if let Some((world, position)) = &site {
        if !context.catalog.chunk_loaded(
            world,
            f64::from(position.x),
            f64::from(position.z),
        ) {
            context.replies.push(
                source.owner,
                format!("The chunk containing '{name}' is not loaded; the statue was not removed."),
            );
            return;
        }
    }

    let Some(removed) = context.registry.remove(source.owner, name) else {
        reply_not_found(context, source, name);
        return;
    };
    remove_statue_entity(
        commands,
        &mut context.suppressions,
        removed.entity,
        site.as_ref().map(|(world, position)| (world.as_str(), *position)),
    );
    context.dirty.mark(source.owner);
    context
        .replies
        .push(source.owner, format!("Statue '{name}' removed."));
}

fn handle_list(context: &mut DispatchContext, source: &CommandSource) {
    let names = context.registry.names(source.owner);
    if names.is_empty() {
        context
            .replies
            .push(source.owner, "You don't have any statues.");
        return;
    }
    context.replies.push(source.owner, "Your statues:");
    for name in names {
        context.replies.push(source.owner, format!("- {name}"));
    }
}

fn reply_not_found(context: &mut DispatchContext, source: &CommandSource, name: &str) {
    if context.registry.owner_is_empty(source.owner) {
        context
            .replies
            .push(source.owner, "You don't have any statues.");
    } else {
        context
            .replies
            .push(source.owner, format!("You don't have a statue named '{name}'."));
    }
}

/// Completion candidates for a partially typed command line.
///
/// Completes the caller's own statue names for `msmove`, `msdel`, and
/// `msadjust`, and creature-kind names for the second argument of `ms`.
/// Matching is prefix-based and case-insensitive; results are sorted.
#[must_use]
pub fn completions(registry: &StatueRegistry, owner: OwnerId, line: &str) -> Vec<String> {
    let mut tokens = line.split_whitespace();
    let Some(label) = tokens.next() else {
        return Vec::new();
    };
    let label = label.trim_start_matches('/').to_lowercase();
    let args: Vec<&str> = tokens.collect();
    let starting_new_arg = line.ends_with(char::is_whitespace);

    match label.as_str() {
        "ms" => {
            let prefix = match (args.len(), starting_new_arg) {
                (1, true) => "",
                (2, false) => args.get(1).copied().unwrap_or_default(),
                _ => return Vec::new(),
            };
            StatueKind::completions(prefix)
                .into_iter()
                .map(str::to_owned)
                .collect()
        }
        "msmove" | "msdel" | "msadjust" => {
            let prefix = match (args.len(), starting_new_arg) {
                (0, true) => String::new(),
                (1, false) => args.first().copied().unwrap_or_default().to_lowercase(),
                _ => return Vec::new(),
            };
            registry
                .names(owner)
                .into_iter()
                .filter(|name| name.starts_with(&prefix))
                .collect()
        }
        _ => Vec::new(),
    }
}
