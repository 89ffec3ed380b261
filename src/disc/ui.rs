//! UI seam: action registration and message display.
//!
//! Editors describe their menu/toolbar actions as an [`ActionGroup`] and
//! merge it into the host's [`ActionHost`]. The returned [`UiHandle`]
//! removes the group again when the editor is deactivated.

use std::collections::BTreeMap;

/// Name of the action group every editor registers.
pub const DISC_ACTION_GROUP: &str = "DiscAction";

/// Identifier of a merged action group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UiHandle(pub u32);

/// One menu/toolbar action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    pub label: String,
    pub tooltip: String,
    pub accelerator: Option<String>,
}

impl Action {
    pub fn new(name: &str, label: &str, tooltip: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            tooltip: tooltip.to_string(),
            accelerator: None,
        }
    }

    pub fn with_accelerator(mut self, accelerator: &str) -> Self {
        self.accelerator = Some(accelerator.to_string());
        self
    }
}

/// Set of actions registered together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    pub name: String,
    pub actions: Vec<Action>,
}

impl ActionGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

/// Host-side registry that merges editors' actions into its UI.
pub trait ActionHost {
    /// Merge a group, returning a handle for later removal.
    fn merge(&mut self, group: ActionGroup) -> UiHandle;

    /// Remove a previously merged group. Unknown handles are ignored.
    fn remove(&mut self, handle: UiHandle);
}

/// Area where an editor can show short notices to the user.
pub trait MessageArea {
    fn show(&mut self, primary: &str, secondary: Option<&str>);

    fn clear(&mut self);
}

/// In-memory [`ActionHost`].
#[derive(Debug, Default)]
pub struct ActionRegistry {
    next_id: u32,
    groups: BTreeMap<UiHandle, ActionGroup>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, handle: UiHandle) -> Option<&ActionGroup> {
        self.groups.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl ActionHost for ActionRegistry {
    fn merge(&mut self, group: ActionGroup) -> UiHandle {
        // 0 is never handed out
        self.next_id += 1;
        let handle = UiHandle(self.next_id);
        self.groups.insert(handle, group);
        handle
    }

    fn remove(&mut self, handle: UiHandle) {
        self.groups.remove(&handle);
    }
}

/// In-memory [`MessageArea`] keeping the last message.
#[derive(Debug, Default)]
pub struct MessageLog {
    current: Option<(String, Option<String>)>,
    shown: usize,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<(&str, Option<&str>)> {
        self.current
            .as_ref()
            .map(|(primary, secondary)| (primary.as_str(), secondary.as_deref()))
    }

    /// Number of messages shown so far.
    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl MessageArea for MessageLog {
    fn show(&mut self, primary: &str, secondary: Option<&str>) {
        self.current = Some((primary.to_string(), secondary.map(str::to_string)));
        self.shown += 1;
    }

    fn clear(&mut self) {
        self.current = None;
    }
}
