//! Messages connecting the command tree to the rest of the app.
//!
//! - Input: lines submitted for dispatch
//! - Output: text produced while running them
//! - Finished: the final state of each command that ran

use bevy::prelude::*;

use super::{CommandId, ExecuteState};

/// A console line submitted for dispatch from the global root.
///
/// The line may hold several `;`-separated statements.
///
/// # Examples
///
/// ```ignore
/// fn submit(mut input: MessageWriter<CommandInputEvent>) {
///     input.write(CommandInputEvent::new("aim fov 90; esp on"));
/// }
/// ```
#[derive(Message, Debug, Clone)]
pub struct CommandInputEvent {
    pub line: String,
}

impl CommandInputEvent {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

/// A line of text for whatever displays console output.
#[derive(Message, Debug, Clone)]
pub struct CommandOutputEvent {
    pub message: String,
    pub level: CommandOutputLevel,
}

/// Kind of output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandOutputLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Echo of a submitted statement.
    Command,
    /// Text written by a command while it ran.
    Result,
}

impl CommandOutputEvent {
    pub fn new(level: CommandOutputLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Debug, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Error, message)
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Command, message)
    }

    pub fn result(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Result, message)
    }
}

/// Sent after each statement that reached local execution.
///
/// Subscribe to react to commands without registering callbacks on nodes.
///
/// ```ignore
/// fn on_finished(mut finished: MessageReader<CommandFinishedEvent>) {
///     for event in finished.read() {
///         if event.name == "esp" && event.state == ExecuteState::Success {
///             info!("esp toggled");
///         }
///     }
/// }
/// ```
#[derive(Message, Debug, Clone)]
pub struct CommandFinishedEvent {
    pub command: CommandId,
    /// Absolute name of the command.
    pub name: Box<str>,
    pub state: ExecuteState,
}

/// Registers the command messages.
pub struct CommandEventsPlugin;

impl Plugin for CommandEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CommandInputEvent>()
            .add_message::<CommandOutputEvent>()
            .add_message::<CommandFinishedEvent>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event() {
        let event = CommandInputEvent::new("esp on");
        assert_eq!(event.line, "esp on");
    }

    #[test]
    fn test_output_levels() {
        assert_eq!(CommandOutputEvent::error("x").level, CommandOutputLevel::Error);
        assert_eq!(CommandOutputEvent::result("x").level, CommandOutputLevel::Result);
        assert_eq!(CommandOutputLevel::default(), CommandOutputLevel::Info);
    }
}
