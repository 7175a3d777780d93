//! The command tree and everything it is built from.
//!
//! - [`CommandTree`] - Arena of command nodes; build, mutate, dispatch, serialize
//! - [`CommandBuilder`] - Fluent configuration for a new node
//! - [`OptionSchema`] - Per-node option parsing on top of `clap`
//! - [`ExecuteContext`] - Per-invocation state handed to processors
//! - [`Setting`] - Typed values carried by setting nodes
//! - [`tokenize`] - Console line tokenizer
//! - Events for the Bevy pipeline

use std::any::Any;

mod builder;
mod callbacks;
mod context;
mod dispatch;
mod error;
mod events;
mod node;
mod options;
mod serialize;
mod setting;
mod tokenizer;
mod tree;

pub use builder::CommandBuilder;
pub use callbacks::{Callback, CallbackData, CallbackKind, CallbackRegistry};
pub use context::{ExecuteContext, ExecuteState};
pub use error::{AmbiguousCommandError, BuildError, CommandError, ParentConflictError, TreeError};
pub use events::{
    CommandEventsPlugin, CommandFinishedEvent, CommandInputEvent, CommandOutputEvent,
    CommandOutputLevel,
};
pub use node::{ChildOrder, CommandId, CommandNode, HelpHandler, Preprocessor, Processor};
pub use options::{OptionBuilder, OptionSchema, ParsedOptions, HELP_ID};
pub use serialize::{SettingsEntry, SettingsTable};
pub use setting::{Setting, SettingDyn, SettingValue};
pub use tokenizer::{split_commands, tokenize, TokenizeError};
pub use tree::{CommandKey, CommandTree};

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
