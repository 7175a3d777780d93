//! Success/failure observers attached to command nodes.

use std::sync::Arc;

use super::CommandId;

/// The outcome a callback observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// The command finished in the `Success` state.
    Success,
    /// The command finished in the `Failed` state, or a processor errored.
    Failure,
}

/// Data handed to every callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackData {
    /// Handle of the command that ran.
    pub command: CommandId,
    /// Absolute name of the command that ran.
    pub name: Box<str>,
    /// Which outcome fired the callback.
    pub kind: CallbackKind,
}

/// An observer notified when a command finishes.
///
/// Callbacks are compared by `Arc` identity: keep a clone of the `Arc` to
/// remove it later.
pub type Callback = Arc<dyn Fn(&CallbackData) + Send + Sync>;

/// Per-node callback storage, one insertion-ordered list per kind.
#[derive(Default)]
pub struct CallbackRegistry {
    success: Vec<Callback>,
    failure: Vec<Callback>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, kind: CallbackKind) -> &Vec<Callback> {
        match kind {
            CallbackKind::Success => &self.success,
            CallbackKind::Failure => &self.failure,
        }
    }

    fn list_mut(&mut self, kind: CallbackKind) -> &mut Vec<Callback> {
        match kind {
            CallbackKind::Success => &mut self.success,
            CallbackKind::Failure => &mut self.failure,
        }
    }

    /// Register a callback.
    ///
    /// Returns `false` if the same callback is already registered for `kind`.
    pub fn add(&mut self, kind: CallbackKind, callback: Callback) -> bool {
        let list = self.list_mut(kind);
        if list.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
            return false;
        }
        list.push(callback);
        true
    }

    /// Unregister a callback by identity.
    ///
    /// Returns `false` if it was not registered for `kind`.
    pub fn remove(&mut self, kind: CallbackKind, callback: &Callback) -> bool {
        let list = self.list_mut(kind);
        match list.iter().position(|existing| Arc::ptr_eq(existing, callback)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether the callback is registered for `kind`.
    pub fn contains(&self, kind: CallbackKind, callback: &Callback) -> bool {
        self.list(kind).iter().any(|existing| Arc::ptr_eq(existing, callback))
    }

    /// Number of callbacks registered for `kind`.
    pub fn len(&self, kind: CallbackKind) -> usize {
        self.list(kind).len()
    }

    /// Whether no callbacks of any kind are registered.
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.failure.is_empty()
    }

    /// Call every callback registered for `data.kind`, in registration order.
    pub fn invoke(&self, data: &CallbackData) {
        for callback in self.list(data.kind) {
            callback(data);
        }
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("success", &self.success.len())
            .field("failure", &self.failure.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn data(kind: CallbackKind) -> CallbackData {
        CallbackData {
            command: CommandId::from_index(1),
            name: "aim".into(),
            kind,
        }
    }

    #[test]
    fn test_dedup_by_identity() {
        let mut registry = CallbackRegistry::new();
        let cb: Callback = Arc::new(|_: &CallbackData| {});

        assert!(registry.add(CallbackKind::Success, cb.clone()));
        assert!(!registry.add(CallbackKind::Success, cb.clone()));
        // Same observer under another kind is a separate registration
        assert!(registry.add(CallbackKind::Failure, cb.clone()));

        assert_eq!(registry.len(CallbackKind::Success), 1);
        assert_eq!(registry.len(CallbackKind::Failure), 1);
    }

    #[test]
    fn test_remove_exact_match() {
        let mut registry = CallbackRegistry::new();
        let cb: Callback = Arc::new(|_: &CallbackData| {});
        let other: Callback = Arc::new(|_: &CallbackData| {});

        registry.add(CallbackKind::Success, cb.clone());
        assert!(!registry.remove(CallbackKind::Failure, &cb));
        assert!(!registry.remove(CallbackKind::Success, &other));
        assert!(registry.remove(CallbackKind::Success, &cb));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invoke_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();

        for tag in ["first", "second", "third"] {
            let log = log.clone();
            registry.add(
                CallbackKind::Success,
                Arc::new(move |_: &CallbackData| log.lock().unwrap().push(tag)),
            );
        }
        let log_failure = log.clone();
        registry.add(
            CallbackKind::Failure,
            Arc::new(move |_: &CallbackData| log_failure.lock().unwrap().push("failure")),
        );

        registry.invoke(&data(CallbackKind::Success));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }
}
