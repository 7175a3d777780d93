//! Command nodes and their handles.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::{CallbackRegistry, ExecuteContext, OptionSchema, SettingDyn};

/// Stable handle to a node in a [`CommandTree`](super::CommandTree).
///
/// Handles are never reused: once a node is removed, its handle stays stale
/// and every lookup through it returns `None`. Freed slots are not reclaimed,
/// so a tree holds at most `u32::MAX` nodes over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u32);

impl CommandId {
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of behavior run against the context during local execution.
///
/// Returning an error marks the invocation failed and surfaces the error to
/// the caller of `run`.
pub type Processor = Box<dyn Fn(&mut ExecuteContext) -> anyhow::Result<()> + Send + Sync>;

/// Invoked before the option help text when `--help` is given.
pub type HelpHandler = Box<dyn Fn(&mut ExecuteContext) + Send + Sync>;

/// Veto check on the raw tokens. Returning `false` aborts the run silently.
pub type Preprocessor = Box<dyn Fn(&[&str]) -> bool + Send + Sync>;

/// Comparator deciding the order of a node's children.
#[derive(Clone)]
pub struct ChildOrder(Arc<dyn Fn(&CommandNode, &CommandNode) -> Ordering + Send + Sync>);

impl ChildOrder {
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&CommandNode, &CommandNode) -> Ordering + Send + Sync + 'static,
    {
        Self(Arc::new(compare))
    }

    /// Case-insensitive name order.
    pub fn by_name() -> Self {
        Self::new(|a, b| {
            a.name()
                .to_lowercase()
                .cmp(&b.name().to_lowercase())
                .then_with(|| a.name().cmp(b.name()))
        })
    }

    #[inline]
    pub fn compare(&self, a: &CommandNode, b: &CommandNode) -> Ordering {
        (self.0)(a, b)
    }
}

impl Default for ChildOrder {
    fn default() -> Self {
        Self::by_name()
    }
}

impl fmt::Debug for ChildOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChildOrder(..)")
    }
}

/// A named unit in the command tree.
///
/// Nodes are owned by the tree; structure is expressed through [`CommandId`]
/// handles (`parent` is non-owning, `children` is the owning direction).
pub struct CommandNode {
    pub(crate) name: Box<str>,
    pub(crate) description: String,
    pub(crate) schema: OptionSchema,
    pub(crate) processors: Vec<Processor>,
    pub(crate) help: Option<HelpHandler>,
    pub(crate) preprocessor: Option<Preprocessor>,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) required_args: usize,
    pub(crate) setting: Option<Box<dyn SettingDyn>>,
    pub(crate) parent: Option<CommandId>,
    pub(crate) children: Vec<CommandId>,
    pub(crate) order: ChildOrder,
}

impl CommandNode {
    /// The node the tree is rooted at. Excluded from absolute names.
    pub(crate) fn global() -> Self {
        Self::bare("global", OptionSchema::new("global", false).with_arguments())
    }

    pub(crate) fn bare(name: &str, schema: OptionSchema) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            schema,
            processors: Vec::new(),
            help: None,
            preprocessor: None,
            callbacks: CallbackRegistry::new(),
            required_args: 0,
            setting: None,
            parent: None,
            children: Vec::new(),
            order: ChildOrder::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `name - description`, as listed by help output.
    pub fn print_text(&self) -> String {
        format!("{} - {}", self.name, self.description)
    }

    #[inline]
    pub fn schema(&self) -> &OptionSchema {
        &self.schema
    }

    pub fn option_help_text(&self) -> String {
        self.schema.help_text()
    }

    #[inline]
    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    /// Child handles in the node's current order.
    #[inline]
    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    #[inline]
    pub fn required_args(&self) -> usize {
        self.required_args
    }

    #[inline]
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn setting(&self) -> Option<&dyn SettingDyn> {
        self.setting.as_deref()
    }

    #[inline]
    pub fn is_setting(&self) -> bool {
        self.setting.is_some()
    }

    /// Whether a run past the help check does any work of its own.
    pub(crate) fn has_work(&self) -> bool {
        !self.processors.is_empty() || self.setting.is_some()
    }

    /// Case-insensitive match against the node's local name.
    pub(crate) fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.name.to_lowercase() == name.to_lowercase()
    }

    /// Case-insensitive prefix match against the node's local name.
    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.name.to_lowercase().starts_with(&prefix.to_lowercase())
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("processors", &self.processors.len())
            .field("required_args", &self.required_args)
            .field("setting", &self.setting)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> CommandNode {
        CommandNode::bare(name, OptionSchema::new(name, true))
    }

    #[test]
    fn test_id_display() {
        let id = CommandId::from_index(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "#7");
    }

    #[test]
    fn test_default_order_ignores_case() {
        let order = ChildOrder::default();
        assert_eq!(order.compare(&node("Beta"), &node("alpha")), Ordering::Greater);
        assert_eq!(order.compare(&node("alpha"), &node("alpha")), Ordering::Equal);
    }

    #[test]
    fn test_name_matching() {
        let n = node("FooBar");
        assert!(n.is_named("foobar"));
        assert!(n.starts_with("foo"));
        assert!(n.starts_with("FOOB"));
        assert!(!n.starts_with("bar"));
        assert_eq!(n.print_text(), "FooBar - ");
    }
}
