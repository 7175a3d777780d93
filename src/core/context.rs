//! Per-invocation execution state.

use super::{CommandId, ParsedOptions};

/// Outcome of a single command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecuteState {
    /// Nothing has decided the outcome yet.
    #[default]
    Pending,
    Success,
    /// Terminal. Fires failure callbacks.
    Failed,
    /// Terminal. Halts the processor chain without counting as a failure.
    Stopped,
}

impl ExecuteState {
    /// Whether the state can no longer change.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }
}

/// Everything a processor sees while a command runs.
///
/// A fresh context is built for every local execution and handed back to the
/// caller of [`CommandTree::run`](super::CommandTree::run).
#[derive(Debug, Clone)]
pub struct ExecuteContext {
    command: CommandId,
    name: Box<str>,
    options: ParsedOptions,
    args: Vec<String>,
    output: Vec<String>,
    state: ExecuteState,
}

impl ExecuteContext {
    pub(crate) fn new(command: CommandId, name: impl Into<Box<str>>, options: ParsedOptions) -> Self {
        let args = options.arguments().to_vec();
        Self {
            command,
            name: name.into(),
            options,
            args,
            output: Vec::new(),
            state: ExecuteState::Pending,
        }
    }

    /// Handle of the node that executed.
    #[inline]
    pub fn command(&self) -> CommandId {
        self.command
    }

    /// Absolute name of the node that executed.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn options(&self) -> &ParsedOptions {
        &self.options
    }

    #[inline]
    pub fn state(&self) -> ExecuteState {
        self.state
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.state == ExecuteState::Failed
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.state == ExecuteState::Stopped
    }

    /// Append a line to the output sink.
    pub fn write(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    /// Lines written so far.
    #[inline]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn mark_success(&mut self) {
        self.transition(ExecuteState::Success);
    }

    pub fn mark_failed(&mut self) {
        self.transition(ExecuteState::Failed);
    }

    /// Halt the remaining processors. Not treated as a failure.
    pub fn stop(&mut self) {
        self.transition(ExecuteState::Stopped);
    }

    fn transition(&mut self, next: ExecuteState) {
        if !self.state.is_terminal() {
            self.state = next;
        }
    }

    // Positional arguments

    /// Positional arguments left after option parsing.
    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        self.get(index).unwrap_or(default)
    }

    /// Try to parse an argument as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, index: usize) -> Option<T> {
        self.get(index).and_then(|s| s.parse().ok())
    }

    pub fn parse_or<T: std::str::FromStr>(&self, index: usize, default: T) -> T {
        self.parse(index).unwrap_or(default)
    }

    pub fn join(&self, separator: &str) -> String {
        self.args.join(separator)
    }

    /// Join arguments starting from an index.
    pub fn join_from(&self, start: usize, separator: &str) -> String {
        self.args.get(start..).unwrap_or(&[]).join(separator)
    }
}
