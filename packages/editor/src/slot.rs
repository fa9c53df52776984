//! Copy-on-write component slots.
//!
//! A draft starts out sharing the committed components. The first write to a
//! slot clones its component; untouched slots never pay for a deep copy.

use std::ops::Deref;
use std::sync::Arc;

use deckhand_common::Component;

#[derive(Debug, Clone)]
pub enum ComponentSlot {
    /// Written at least once in this session
    Owned(Component),
    /// Still the committed value
    Shared(Arc<Component>),
}

impl ComponentSlot {
    pub fn is_shared(&self) -> bool {
        matches!(self, ComponentSlot::Shared(_))
    }

    /// Mutable access, realizing a shared slot first
    pub fn to_mut(&mut self) -> &mut Component {
        if let ComponentSlot::Shared(shared) = self {
            *self = ComponentSlot::Owned(Component::clone(shared));
        }
        match self {
            ComponentSlot::Owned(component) => component,
            ComponentSlot::Shared(_) => unreachable!("shared slot realized above"),
        }
    }

    pub fn into_owned(self) -> Component {
        match self {
            ComponentSlot::Owned(component) => component,
            ComponentSlot::Shared(shared) => Arc::unwrap_or_clone(shared),
        }
    }
}

impl Deref for ComponentSlot {
    type Target = Component;

    fn deref(&self) -> &Component {
        match self {
            ComponentSlot::Owned(component) => component,
            ComponentSlot::Shared(shared) => shared,
        }
    }
}

impl PartialEq for ComponentSlot {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl From<Component> for ComponentSlot {
    fn from(component: Component) -> Self {
        ComponentSlot::Owned(component)
    }
}

impl From<Arc<Component>> for ComponentSlot {
    fn from(component: Arc<Component>) -> Self {
        ComponentSlot::Shared(component)
    }
}

/// Who is replacing a slide's components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// A regular edit: recorded in history, components stay shared
    Internal,
    /// A history restore: deep copied, never recorded
    ExternalRestore,
}

/// Deep copy of a slot sequence
pub(crate) fn snapshot(slots: &[ComponentSlot]) -> Vec<Component> {
    slots.iter().map(|slot| Component::clone(slot)).collect()
}
