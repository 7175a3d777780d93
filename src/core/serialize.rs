//! Settings trees mirroring the shape of the command tree.
//!
//! Every node contributes its local name as a key. Setting nodes store their
//! value; other nodes store a nested table of their children, and only when
//! that table is non-empty.

use std::collections::BTreeMap;

use bevy::log::{debug, warn};

use super::{CommandId, CommandTree};

/// A value or a nested table in a [`SettingsTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "persist", serde(untagged))]
pub enum SettingsEntry {
    Value(String),
    Table(SettingsTable),
}

/// Ordered key to entry map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "persist", serde(transparent))]
pub struct SettingsTable(BTreeMap<String, SettingsEntry>);

impl SettingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: SettingsEntry) -> Option<SettingsEntry> {
        self.0.insert(key.into(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&SettingsEntry> {
        self.0.get(key)
    }

    /// Exact key first, then the first key equal ignoring case.
    pub fn lookup(&self, key: &str) -> Option<&SettingsEntry> {
        self.0.get(key).or_else(|| {
            let lower = key.to_lowercase();
            self.0
                .iter()
                .find(|(candidate, _)| candidate.to_lowercase() == lower)
                .map(|(_, entry)| entry)
        })
    }

    /// Follow a dotted path, e.g. `aim.fov`, to a value.
    pub fn value(&self, path: &str) -> Option<&str> {
        let (table, last) = match path.rsplit_once('.') {
            Some((head, last)) => (self.table(head)?, last),
            None => (self, path),
        };
        match table.lookup(last)? {
            SettingsEntry::Value(value) => Some(value),
            SettingsEntry::Table(_) => None,
        }
    }

    /// Follow a dotted path to a nested table.
    pub fn table(&self, path: &str) -> Option<&SettingsTable> {
        path.split('.').try_fold(self, |table, key| match table.lookup(key)? {
            SettingsEntry::Table(inner) => Some(inner),
            SettingsEntry::Value(_) => None,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingsEntry)> {
        self.0.iter().map(|(key, entry)| (key.as_str(), entry))
    }
}

impl CommandTree {
    /// Write the node's state into `table` under its name.
    pub fn serialize(&self, id: CommandId, table: &mut SettingsTable) {
        let Some(node) = self.node(id) else {
            return;
        };

        if let Some(setting) = node.setting() {
            table.insert(node.name(), SettingsEntry::Value(setting.get_string()));
            return;
        }

        let mut children = SettingsTable::new();
        for &child in node.children() {
            self.serialize(child, &mut children);
        }
        if !children.is_empty() {
            table.insert(node.name(), SettingsEntry::Table(children));
        }
    }

    /// Read the node's state from its key in `table`, if present.
    pub fn deserialize(&mut self, id: CommandId, table: &SettingsTable) {
        let Some(node) = self.node(id) else {
            return;
        };
        let Some(entry) = table.lookup(node.name()) else {
            return;
        };

        match entry {
            SettingsEntry::Value(value) if node.is_setting() => {
                if self.set_setting_string(id, value) {
                    debug!("Loaded {} = {}", self.absolute_name(id).unwrap_or_default(), value);
                } else {
                    warn!(
                        "Ignoring invalid value '{}' for {}",
                        value,
                        self.absolute_name(id).unwrap_or_default()
                    );
                }
            }
            SettingsEntry::Table(nested) if !node.is_setting() => {
                for child in node.children().to_vec() {
                    self.deserialize(child, nested);
                }
            }
            _ => warn!(
                "Stored entry for {} does not match its shape",
                self.absolute_name(id).unwrap_or_default()
            ),
        }
    }

    /// Serialize every command under the global root.
    pub fn snapshot(&self) -> SettingsTable {
        let mut table = SettingsTable::new();
        for &child in self.children(Self::GLOBAL) {
            self.serialize(child, &mut table);
        }
        table
    }

    /// Deserialize every command under the global root.
    pub fn restore(&mut self, table: &SettingsTable) {
        for child in self.children(Self::GLOBAL).to_vec() {
            self.deserialize(child, table);
        }
    }

    /// Reset this node's setting and every setting below it.
    pub fn reset_defaults(&mut self, id: CommandId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node_mut(current) else {
                continue;
            };
            if let Some(setting) = node.setting.as_deref_mut() {
                setting.reset();
            }
            stack.extend(node.children.iter().copied());
        }
    }
}
