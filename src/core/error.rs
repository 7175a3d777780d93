//! Error types for building, mutating and dispatching the command tree.

use super::CommandId;

/// Failure while constructing a command node.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The builder had no name, or an empty one.
    #[error("command requires a name")]
    MissingName,
    /// A caller-supplied option builder returned an error.
    #[error("failed to apply option builder for '{name}': {source}")]
    OptionBuilder {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    /// The finished option schema was rejected by the parser.
    #[error("invalid option schema for '{name}': {message}")]
    InvalidSchema { name: String, message: String },
    /// Every command handle has been handed out.
    #[error("command tree is full, cannot build '{name}'")]
    TreeFull { name: String },
}

/// Attempt to give an already-parented command a second parent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("command '{child}' already has parent '{parent}'")]
pub struct ParentConflictError {
    /// Absolute name of the child.
    pub child: String,
    /// Absolute name of the existing parent.
    pub parent: String,
}

/// Failure of a structural tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error(transparent)]
    ParentConflict(#[from] ParentConflictError),
    /// The child is the parent itself or one of its ancestors.
    #[error("adding '{child}' under '{parent}' would create a cycle")]
    Cycle { child: String, parent: String },
    /// The global root can never become a child.
    #[error("the global root cannot be added as a child")]
    GlobalRoot,
}

/// Two or more children matched an abbreviated token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Ambiguous command \"{lookup}\": {}", .candidates.join(", "))]
pub struct AmbiguousCommandError {
    /// The lower-cased token that was looked up.
    pub lookup: String,
    /// Names of every matching child, in child order.
    pub candidates: Vec<String>,
}

/// Failure while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousCommandError),
    /// The option schema rejected the arguments (e.g. a missing option value).
    #[error("invalid options for '{command}': {source}")]
    Options {
        command: String,
        #[source]
        source: clap::Error,
    },
    /// A processor returned an error. Failure callbacks have already fired.
    #[error("command '{command}' failed: {source}")]
    Processor {
        command: String,
        #[source]
        source: anyhow::Error,
    },
    /// The handle does not refer to a live node.
    #[error("unknown command handle {0}")]
    UnknownCommand(CommandId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message() {
        let err = AmbiguousCommandError {
            lookup: "fo".into(),
            candidates: vec!["foo".into(), "foobar".into()],
        };
        assert_eq!(err.to_string(), "Ambiguous command \"fo\": foo, foobar");
    }

    #[test]
    fn test_parent_conflict_converts() {
        let err: TreeError = ParentConflictError {
            child: "aim.fov".into(),
            parent: "aim".into(),
        }
        .into();
        assert_eq!(err.to_string(), "command 'aim.fov' already has parent 'aim'");
    }
}
