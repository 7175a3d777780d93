//! The command tree: an arena of nodes addressed by [`CommandId`].

use std::cmp::Ordering;
use std::fmt;

use bevy::log::{debug, warn};
use bevy::prelude::Resource;

use super::{
    BuildError, Callback, CallbackKind, CallbackRegistry, ChildOrder, CommandBuilder, CommandId,
    CommandNode, OptionSchema, ParentConflictError, SettingValue, Setting, TreeError,
};

/// Case-insensitive absolute name, the external identity of a node.
///
/// Two nodes with the same key are the same command for sorting and set
/// purposes, wherever they live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandKey(String);

impl CommandKey {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of every command node.
///
/// The tree always holds a global root ([`CommandTree::GLOBAL`]). Commands
/// meant to be reachable from console input are attached under it; the root
/// itself never appears in absolute names.
///
/// # Examples
///
/// ```
/// use bevy_command_tree::prelude::*;
///
/// let mut tree = CommandTree::default();
/// let aim = tree
///     .build(CommandBuilder::new("aim").parent(CommandTree::GLOBAL))
///     .unwrap();
/// let fov = tree
///     .build(CommandBuilder::new("fov").parent(aim).setting(Setting::new(90.0f32)))
///     .unwrap();
///
/// assert_eq!(tree.absolute_name(fov).as_deref(), Some("aim.fov"));
/// assert_eq!(tree.find("AIM.Fov"), Some(fov));
/// ```
#[derive(Resource)]
pub struct CommandTree {
    nodes: Vec<Option<CommandNode>>,
}

impl Default for CommandTree {
    fn default() -> Self {
        Self {
            nodes: vec![Some(CommandNode::global())],
        }
    }
}

impl CommandTree {
    /// Handle of the global root.
    pub const GLOBAL: CommandId = CommandId::from_index(0);

    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a node from a builder and link it to its parent, if any.
    ///
    /// A parent link that cannot be made (name collision, stale handle,
    /// conflicting parent) is logged and leaves the node parentless.
    pub fn build(&mut self, builder: CommandBuilder) -> Result<CommandId, BuildError> {
        let CommandBuilder {
            name,
            description,
            option_builders,
            processors,
            help,
            preprocessor,
            parent,
            help_auto_gen,
            callbacks,
            required_args,
            setting,
        } = builder;

        let name = name
            .filter(|name| !name.is_empty())
            .ok_or(BuildError::MissingName)?;
        let index = u32::try_from(self.nodes.len())
            .map_err(|_| BuildError::TreeFull { name: name.clone() })?;

        let mut schema = OptionSchema::new(&name, help_auto_gen);
        for option_builder in option_builders {
            schema = schema
                .apply(option_builder)
                .map_err(|source| BuildError::OptionBuilder {
                    name: name.clone(),
                    source,
                })?;
        }
        let schema = schema.seal().map_err(|message| BuildError::InvalidSchema {
            name: name.clone(),
            message,
        })?;

        let mut registry = CallbackRegistry::new();
        for (kind, callback) in callbacks {
            registry.add(kind, callback);
        }

        let mut node = CommandNode::bare(&name, schema);
        node.description = description;
        node.processors = processors;
        node.help = help;
        node.preprocessor = preprocessor;
        node.callbacks = registry;
        node.required_args = required_args;
        node.setting = setting;

        let id = CommandId::from_index(index as usize);
        self.nodes.push(Some(node));

        if let Some(parent) = parent {
            match self.add_child(parent, id) {
                Ok(true) => {}
                Ok(false) => warn!(
                    "Command '{}' could not be attached to {}: name taken or parent missing",
                    name, parent
                ),
                Err(err) => warn!("Command '{}' could not be attached: {}", name, err),
            }
        }

        Ok(id)
    }

    // Node access

    pub fn node(&self, id: CommandId) -> Option<&CommandNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: CommandId) -> Option<&mut CommandNode> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Whether the handle refers to a live node.
    #[inline]
    pub fn contains(&self, id: CommandId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, not counting the global root.
    pub fn len(&self) -> usize {
        self.nodes.iter().skip(1).filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_global(&self, id: CommandId) -> bool {
        id == Self::GLOBAL
    }

    pub fn name(&self, id: CommandId) -> Option<&str> {
        self.node(id).map(CommandNode::name)
    }

    pub fn description(&self, id: CommandId) -> Option<&str> {
        self.node(id).map(CommandNode::description)
    }

    pub fn print_text(&self, id: CommandId) -> Option<String> {
        self.node(id).map(CommandNode::print_text)
    }

    pub fn option_help_text(&self, id: CommandId) -> Option<String> {
        self.node(id).map(CommandNode::option_help_text)
    }

    pub fn parent(&self, id: CommandId) -> Option<CommandId> {
        self.node(id).and_then(CommandNode::parent)
    }

    /// Direct children in their current order. Empty for a stale handle.
    pub fn children(&self, id: CommandId) -> &[CommandId] {
        self.node(id).map(CommandNode::children).unwrap_or_default()
    }

    /// Every descendant, depth first, parents before their children.
    pub fn children_deep(&self, id: CommandId) -> Vec<CommandId> {
        let mut all = Vec::new();
        let mut stack: Vec<CommandId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            all.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        all
    }

    // Naming

    /// Non-global ancestors, outermost first.
    fn lineage(&self, id: CommandId) -> Option<Vec<CommandId>> {
        self.node(id)?;
        let mut chain = vec![id];
        let mut current = self.parent(id);
        while let Some(parent) = current.filter(|&p| !self.is_global(p)) {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain.reverse();
        Some(chain)
    }

    /// Dot-joined names from the outermost non-global ancestor down to `id`.
    pub fn absolute_name(&self, id: CommandId) -> Option<String> {
        let names: Vec<&str> = self
            .lineage(id)?
            .into_iter()
            .filter_map(|node| self.name(node))
            .collect();
        Some(names.join("."))
    }

    /// Name of the outermost non-global ancestor (or the node itself).
    pub fn root_name(&self, id: CommandId) -> Option<&str> {
        let outermost = *self.lineage(id)?.first()?;
        self.name(outermost)
    }

    /// Names of the node's non-global ancestors, outermost first.
    pub fn hierarchy(&self, id: CommandId) -> Vec<String> {
        let mut chain = self.lineage(id).unwrap_or_default();
        chain.pop();
        chain
            .into_iter()
            .filter_map(|node| self.name(node).map(str::to_owned))
            .collect()
    }

    // Identity

    pub fn key(&self, id: CommandId) -> Option<CommandKey> {
        self.absolute_name(id).map(|name| CommandKey(name.to_lowercase()))
    }

    /// Order two nodes by case-insensitive absolute name.
    pub fn compare(&self, a: CommandId, b: CommandId) -> Option<Ordering> {
        Some(self.key(a)?.cmp(&self.key(b)?))
    }

    /// Whether two handles name the same command.
    pub fn same_command(&self, a: CommandId, b: CommandId) -> bool {
        matches!(self.compare(a, b), Some(Ordering::Equal))
    }

    /// Resolve a dotted absolute name, matching each segment exactly
    /// (case-insensitive) from the global root.
    pub fn find(&self, path: &str) -> Option<CommandId> {
        if path.is_empty() {
            return None;
        }
        path.split('.')
            .try_fold(Self::GLOBAL, |current, segment| self.child(current, segment))
    }

    // Lookup

    /// Direct child whose name equals `name`, ignoring case.
    pub fn child(&self, id: CommandId, name: &str) -> Option<CommandId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.node(child).is_some_and(|node| node.is_named(name)))
    }

    /// Direct children whose names start with `prefix`, ignoring case.
    pub fn possible_children(&self, id: CommandId, prefix: &str) -> Vec<CommandId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.node(child).is_some_and(|node| node.starts_with(prefix)))
            .collect()
    }

    /// Candidates for the segment where a path stops resolving.
    ///
    /// Walks `path` one segment at a time while each segment resolves to a
    /// single child and returns the candidates of the last segment visited.
    pub fn possible_children_deep<S: AsRef<str>>(&self, id: CommandId, path: &[S]) -> Vec<CommandId> {
        let mut current = id;
        let mut candidates = Vec::new();
        for segment in path.iter().map(AsRef::as_ref) {
            candidates = self.possible_children(current, segment);
            match self.closest_child(current, segment) {
                Some(next) => current = next,
                None => break,
            }
        }
        candidates
    }

    /// Exact child match, otherwise the only child starting with `name`.
    pub fn closest_child(&self, id: CommandId, name: &str) -> Option<CommandId> {
        if let Some(exact) = self.child(id, name) {
            return Some(exact);
        }
        match self.possible_children(id, name).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// [`closest_child`](Self::closest_child) applied segment by segment.
    pub fn closest_child_deep<S: AsRef<str>>(&self, id: CommandId, path: &[S]) -> Option<CommandId> {
        self.node(id)?;
        path.iter()
            .try_fold(id, |current, segment| self.closest_child(current, segment.as_ref()))
    }

    // Mutation

    fn is_ancestor(&self, ancestor: CommandId, id: CommandId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Link `child` under `parent`.
    ///
    /// Returns `Ok(false)` if either handle is stale or `parent` already has
    /// a child with the same name (ignoring case). On error the tree is left
    /// unchanged.
    pub fn add_child(&mut self, parent: CommandId, child: CommandId) -> Result<bool, TreeError> {
        let (Some(parent_node), Some(child_node)) = (self.node(parent), self.node(child)) else {
            return Ok(false);
        };

        let collides = parent_node
            .children
            .iter()
            .any(|&id| self.node(id).is_some_and(|node| node.is_named(child_node.name())));
        if collides {
            return Ok(false);
        }

        if let Some(existing) = child_node.parent {
            return Err(ParentConflictError {
                child: self.absolute_name(child).unwrap_or_default(),
                parent: self.absolute_name(existing).unwrap_or_default(),
            }
            .into());
        }
        if self.is_global(child) {
            return Err(TreeError::GlobalRoot);
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle {
                child: self.absolute_name(child).unwrap_or_default(),
                parent: self.absolute_name(parent).unwrap_or_default(),
            });
        }

        let position = parent_node.children.partition_point(|&id| {
            self.node(id)
                .is_some_and(|node| parent_node.order.compare(node, child_node) != Ordering::Greater)
        });

        if let Some(node) = self.node_mut(parent) {
            node.children.insert(position, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        Ok(true)
    }

    /// Unlink `child` from `parent`. Returns `false` if it was not a child.
    pub fn remove_child(&mut self, parent: CommandId, child: CommandId) -> bool {
        let Some(node) = self.node_mut(parent) else {
            return false;
        };
        let Some(position) = node.children.iter().position(|&id| id == child) else {
            return false;
        };
        node.children.remove(position);
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        true
    }

    /// Detach the node from its parent.
    pub fn leave_parent(&mut self, id: CommandId) -> bool {
        match self.parent(id) {
            Some(parent) => self.remove_child(parent, id),
            None => false,
        }
    }

    /// Detach every direct child. Grandchildren stay with their parents.
    pub fn abandon_children(&mut self, id: CommandId) {
        for child in self.children(id).to_vec() {
            self.remove_child(id, child);
        }
    }

    /// Sort this level and every level below it with `order`.
    ///
    /// The ordering is kept by each visited node and used for later
    /// insertions at that level.
    pub fn reorder(&mut self, id: CommandId, order: ChildOrder) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node_mut(current) else {
                continue;
            };
            node.order = order.clone();
            let mut children = std::mem::take(&mut node.children);

            children.sort_by(|&a, &b| match (self.node(a), self.node(b)) {
                (Some(a), Some(b)) => order.compare(a, b),
                _ => Ordering::Equal,
            });
            stack.extend(children.iter().copied());

            if let Some(node) = self.node_mut(current) {
                node.children = children;
            }
        }
    }

    /// Detach a node and free it along with its whole subtree.
    ///
    /// Every freed handle becomes stale. The global root cannot be removed.
    pub fn remove(&mut self, id: CommandId) -> bool {
        if self.is_global(id) || !self.contains(id) {
            return false;
        }
        self.leave_parent(id);

        let mut doomed = self.children_deep(id);
        doomed.push(id);
        debug!("Removing {} command(s) under {}", doomed.len(), id);
        for node in doomed {
            if let Some(slot) = self.nodes.get_mut(node.index()) {
                *slot = None;
            }
        }
        true
    }

    // Callbacks

    /// Register a callback on a node. Returns `false` for a duplicate or a
    /// stale handle.
    pub fn add_callback(&mut self, id: CommandId, kind: CallbackKind, callback: Callback) -> bool {
        self.node_mut(id)
            .is_some_and(|node| node.callbacks.add(kind, callback))
    }

    pub fn remove_callback(&mut self, id: CommandId, kind: CallbackKind, callback: &Callback) -> bool {
        self.node_mut(id)
            .is_some_and(|node| node.callbacks.remove(kind, callback))
    }

    // Settings

    /// Typed value of a setting node.
    pub fn setting<T: SettingValue>(&self, id: CommandId) -> Option<T> {
        let setting = self.node(id)?.setting.as_deref()?;
        setting.as_any().downcast_ref::<Setting<T>>().map(Setting::get)
    }

    /// Assign a typed value. Returns `false` if the node holds no setting of
    /// type `T`.
    pub fn set_setting<T: SettingValue>(&mut self, id: CommandId, value: T) -> bool {
        let Some(setting) = self.node_mut(id).and_then(|node| node.setting.as_deref_mut()) else {
            return false;
        };
        match setting.as_any_mut().downcast_mut::<Setting<T>>() {
            Some(setting) => {
                setting.set(value);
                true
            }
            None => false,
        }
    }

    pub fn setting_string(&self, id: CommandId) -> Option<String> {
        self.node(id)?.setting.as_deref().map(|setting| setting.get_string())
    }

    /// Parse and assign a value. Returns `false` if there is no setting or
    /// the value does not parse.
    pub fn set_setting_string(&mut self, id: CommandId, value: &str) -> bool {
        self.node_mut(id)
            .and_then(|node| node.setting.as_deref_mut())
            .is_some_and(|setting| setting.set_string(value))
    }
}

impl fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("nodes", &self.len())
            .finish()
    }
}
