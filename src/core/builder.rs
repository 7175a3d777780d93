//! Fluent configuration for new command nodes.

use clap::Arg;

use super::{
    Callback, CallbackKind, CommandId, ExecuteContext, HelpHandler, OptionBuilder, Preprocessor,
    Processor, Setting, SettingDyn, SettingValue,
};

/// Everything needed to construct a command node.
///
/// Hand it to [`CommandTree::build`](super::CommandTree::build).
///
/// # Examples
///
/// ```
/// use bevy_command_tree::prelude::*;
///
/// let mut tree = CommandTree::default();
/// let say = tree
///     .build(
///         CommandBuilder::new("say")
///             .description("Print a message")
///             .parent(CommandTree::GLOBAL)
///             .required_args(1)
///             .processor(|ctx| {
///                 let line = ctx.join(" ");
///                 ctx.write(line);
///                 ctx.mark_success();
///                 Ok(())
///             }),
///     )
///     .unwrap();
///
/// let ctx = tree.run(say, &["hello", "there"]).unwrap().unwrap();
/// assert_eq!(ctx.output(), ["hello there"]);
/// ```
pub struct CommandBuilder {
    pub(crate) name: Option<String>,
    pub(crate) description: String,
    pub(crate) option_builders: Vec<OptionBuilder>,
    pub(crate) processors: Vec<Processor>,
    pub(crate) help: Option<HelpHandler>,
    pub(crate) preprocessor: Option<Preprocessor>,
    pub(crate) parent: Option<CommandId>,
    pub(crate) help_auto_gen: bool,
    pub(crate) callbacks: Vec<(CallbackKind, Callback)>,
    pub(crate) required_args: usize,
    pub(crate) setting: Option<Box<dyn SettingDyn>>,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self {
            name: None,
            description: String::new(),
            option_builders: Vec::new(),
            processors: Vec::new(),
            help: None,
            preprocessor: None,
            parent: None,
            help_auto_gen: true,
            callbacks: Vec::new(),
            required_args: 0,
            setting: None,
        }
    }
}

impl CommandBuilder {
    /// Start a builder for the named command.
    pub fn new(name: impl Into<String>) -> Self {
        Self::default().name(name)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a single option.
    pub fn option(self, arg: Arg) -> Self {
        self.option_builder(move |cmd| Ok(cmd.arg(arg)))
    }

    /// Register a schema mutator. Mutators run in registration order.
    pub fn option_builder<F>(mut self, builder: F) -> Self
    where
        F: FnOnce(clap::Command) -> anyhow::Result<clap::Command> + Send + Sync + 'static,
    {
        self.option_builders.push(Box::new(builder));
        self
    }

    /// Append a processor to the chain.
    pub fn processor<F>(mut self, processor: F) -> Self
    where
        F: Fn(&mut ExecuteContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.processors.push(Box::new(processor));
        self
    }

    /// Set the handler invoked when help is requested.
    pub fn help<F>(mut self, help: F) -> Self
    where
        F: Fn(&mut ExecuteContext) + Send + Sync + 'static,
    {
        self.help = Some(Box::new(help));
        self
    }

    /// Set a veto check run on the raw tokens before option parsing.
    pub fn preprocessor<F>(mut self, preprocessor: F) -> Self
    where
        F: Fn(&[&str]) -> bool + Send + Sync + 'static,
    {
        self.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// Attach the new node under `parent` once built.
    pub fn parent(mut self, parent: CommandId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Whether the schema gets `--help`/`-?`. Defaults to `true`.
    pub fn help_auto_gen(mut self, enabled: bool) -> Self {
        self.help_auto_gen = enabled;
        self
    }

    pub fn callback(mut self, kind: CallbackKind, callback: Callback) -> Self {
        self.callbacks.push((kind, callback));
        self
    }

    /// Minimum number of positional arguments. Negative values clamp to 0.
    pub fn required_args(mut self, count: i64) -> Self {
        self.required_args = usize::try_from(count.max(0)).unwrap_or(usize::MAX);
        self
    }

    /// Like [`required_args`](Self::required_args), from text. Anything that
    /// does not parse as an integer counts as 0.
    pub fn required_args_from(self, count: &str) -> Self {
        let count = count.trim().parse::<i64>().unwrap_or(0);
        self.required_args(count)
    }

    /// Make this node a setting backed by a typed value.
    pub fn setting<T: SettingValue>(mut self, setting: Setting<T>) -> Self {
        self.setting = Some(Box::new(setting));
        self
    }
}

impl std::fmt::Debug for CommandBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("option_builders", &self.option_builders.len())
            .field("processors", &self.processors.len())
            .field("parent", &self.parent)
            .field("help_auto_gen", &self.help_auto_gen)
            .field("required_args", &self.required_args)
            .finish_non_exhaustive()
    }
}
