//! A hierarchical command-tree dispatcher for Bevy developer consoles.
//!
//! Commands are nodes in a tree. A console line such as `aim fov 90` walks
//! the tree one token at a time, accepting exact names or unambiguous
//! prefixes (`ai f 90` works too), and the node it lands on parses its
//! options and runs its processors.
//!
//! - **CommandTree**: Arena of nodes with single-parent, acyclic structure
//! - **CommandBuilder**: Name, options, processors, callbacks, setting
//! - **Settings**: Typed values on nodes, serialized as a nested table
//!
//! # Features
//!
//! - `persist`: RON save/load of setting values
//! - `full`: Enable everything
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_command_tree::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(CommandTreePlugin)
//!         .add_systems(Startup, setup_commands)
//!         .run();
//! }
//!
//! fn setup_commands(mut tree: ResMut<CommandTree>) {
//!     let aim = tree
//!         .build(CommandBuilder::new("aim").description("Aim assist").parent(CommandTree::GLOBAL))
//!         .unwrap();
//!
//!     tree.build(
//!         CommandBuilder::new("fov")
//!             .parent(aim)
//!             .setting(Setting::new(90.0f32).min(1.0).max(180.0)),
//!     )
//!     .unwrap();
//! }
//! ```

use std::panic::{self, AssertUnwindSafe};

use bevy::prelude::*;

pub mod core;

pub use core::{
    AmbiguousCommandError, BuildError, Callback, CallbackData, CallbackKind, CallbackRegistry,
    ChildOrder, CommandBuilder, CommandError, CommandEventsPlugin, CommandFinishedEvent,
    CommandId, CommandInputEvent, CommandKey, CommandNode, CommandOutputEvent, CommandOutputLevel,
    CommandTree, ExecuteContext, ExecuteState, OptionSchema, ParentConflictError, ParsedOptions,
    Setting, SettingDyn, SettingValue, SettingsEntry, SettingsTable, TokenizeError, TreeError,
    split_commands, tokenize,
};

#[cfg(feature = "persist")]
pub mod persist;

#[cfg(feature = "persist")]
pub use persist::{ConfigError, SettingsFile, SettingsPath};

pub mod prelude {
    pub use crate::core::{
        CallbackData, CallbackKind, ChildOrder, CommandBuilder, CommandError,
        CommandFinishedEvent, CommandId, CommandInputEvent, CommandOutputEvent,
        CommandOutputLevel, CommandTree, ExecuteContext, ExecuteState, Setting, SettingsTable,
        split_commands, tokenize,
    };
    pub use crate::{CommandTreePlugin, DispatchConfig};
}

/// How console input is dispatched and reported.
#[derive(Resource, Debug, Clone)]
pub struct DispatchConfig {
    /// Echo each statement as a [`CommandOutputLevel::Command`] line.
    pub echo_input: bool,
    /// Report statements that match no command as errors.
    pub report_unknown: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            echo_input: true,
            report_unknown: true,
        }
    }
}

/// Main plugin.
///
/// Inserts an empty [`CommandTree`] and runs every [`CommandInputEvent`]
/// against it from the global root.
#[derive(Default)]
pub struct CommandTreePlugin;

impl Plugin for CommandTreePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandTree>()
            .init_resource::<DispatchConfig>()
            .init_resource::<PendingDispatch>()
            .add_plugins(CommandEventsPlugin);

        // 1. parse_command_input: split and tokenize input lines
        // 2. execute_pending_commands: run each statement against the tree
        // 3. send_pending_outputs: emit output and finished messages
        app.add_systems(
            Update,
            (
                parse_command_input,
                execute_pending_commands,
                send_pending_outputs,
            )
                .chain(),
        );

        #[cfg(feature = "persist")]
        {
            // After Startup so every command is registered before values load
            app.init_resource::<persist::SettingsPath>()
                .add_systems(PostStartup, persist::load_settings_on_startup);
        }
    }
}

/// One tokenized statement awaiting dispatch.
#[derive(Debug, Clone)]
struct QueuedStatement {
    raw: String,
    tokens: Vec<String>,
}

#[derive(Resource, Default)]
struct PendingDispatch {
    queue: Vec<QueuedStatement>,
    outputs: Vec<CommandOutputEvent>,
    finished: Vec<CommandFinishedEvent>,
}

fn parse_command_input(
    mut input: MessageReader<CommandInputEvent>,
    config: Res<DispatchConfig>,
    mut pending: ResMut<PendingDispatch>,
) {
    for event in input.read() {
        for statement in split_commands(&event.line) {
            if config.echo_input {
                pending
                    .outputs
                    .push(CommandOutputEvent::command(format!("$ {}", statement)));
            }

            match tokenize(statement) {
                Ok(tokens) if tokens.is_empty() => {}
                Ok(tokens) => pending.queue.push(QueuedStatement {
                    raw: statement.to_string(),
                    tokens,
                }),
                Err(e) => pending
                    .outputs
                    .push(CommandOutputEvent::error(format!("Parse error: {}", e))),
            }
        }
    }
}

fn execute_pending_commands(
    mut tree: ResMut<CommandTree>,
    config: Res<DispatchConfig>,
    mut pending: ResMut<PendingDispatch>,
) {
    let queue = std::mem::take(&mut pending.queue);

    for statement in queue {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            tree.run(CommandTree::GLOBAL, &statement.tokens)
        }));

        let ctx = match result {
            Ok(Ok(Some(ctx))) => ctx,
            Ok(Ok(None)) => continue,
            Ok(Err(err)) => {
                pending.outputs.push(CommandOutputEvent::error(err.to_string()));
                continue;
            }
            Err(payload) => {
                let message = crate::core::panic_message(payload.as_ref());
                error!("Command '{}' panicked: {}", statement.raw, message);
                pending.outputs.push(CommandOutputEvent::error(format!(
                    "Command '{}' panicked: {}",
                    statement.raw, message
                )));
                continue;
            }
        };

        if tree.is_global(ctx.command()) {
            if config.report_unknown {
                let name = statement.tokens.first().map_or("", String::as_str);
                pending
                    .outputs
                    .push(CommandOutputEvent::error(format!("Unknown command: '{}'", name)));
            }
            continue;
        }

        pending
            .outputs
            .extend(ctx.output().iter().map(|line| CommandOutputEvent::result(line.as_str())));
        if ctx.is_failed() && ctx.output().is_empty() {
            pending
                .outputs
                .push(CommandOutputEvent::error(format!("Command '{}' failed", ctx.name())));
        }

        pending.finished.push(CommandFinishedEvent {
            command: ctx.command(),
            name: ctx.name().into(),
            state: ctx.state(),
        });
    }
}

fn send_pending_outputs(
    mut pending: ResMut<PendingDispatch>,
    mut output: MessageWriter<CommandOutputEvent>,
    mut finished: MessageWriter<CommandFinishedEvent>,
) {
    for event in pending.outputs.drain(..) {
        output.write(event);
    }
    for event in pending.finished.drain(..) {
        finished.write(event);
    }
}
