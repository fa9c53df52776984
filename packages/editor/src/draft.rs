//! # Draft Store
//!
//! Owns the working copy of every slide being edited. The committed document
//! is never written during a session: drafts are derived from it lazily,
//! edited here, and flushed back once on commit.
//!
//! ## Lifecycle
//!
//! ```text
//! Committed → Draft (shared slots) → Edits (owned slots + history) → Commit
//! ```
//!
//! Every edit goes through [`DraftStore::apply`], which records the state
//! before and after the change in the history engine, bumps the operation
//! token, and marks the slide dirty.
//!
//! Stale slide or component ids are no-ops: callers may hold ids across
//! async boundaries and are expected to re-query rather than fail.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use deckhand_common::{Component, EditorConfig, Props};
use serde_json::Value;

use crate::collaborators::{
    ChartTracker, CommittedSource, GenerationFlags, GenerationStatus, NoChartTracking,
};
use crate::defaults::apply_defaults;
use crate::errors::EditError;
use crate::history::HistoryEngine;
use crate::slot::{snapshot, ChangeSource, ComponentSlot};
use crate::transient::TransientGate;

/// Monotonic marker of the last content change, for redraw observers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationToken(u64);

impl OperationToken {
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        OperationToken(self.0 + 1)
    }
}

/// Partial update applied by [`DraftStore::update_component`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentUpdate {
    /// Shallow-merged into the existing props
    pub props: Props,

    /// `Some(None)` detaches from the current group
    pub parent_id: Option<Option<String>>,

    pub animating: Option<bool>,
}

impl ComponentUpdate {
    pub fn props(props: Props) -> Self {
        Self {
            props,
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_animating(mut self, animating: bool) -> Self {
        self.animating = Some(animating);
        self
    }

    /// Only toggles the animation flag; such updates never enter history
    pub fn is_animation_only(&self) -> bool {
        self.props.is_empty() && self.parent_id.is_none() && self.animating.is_some()
    }

    fn apply_to(self, component: &mut Component) {
        for (key, value) in self.props {
            component.props.insert(key, value);
        }
        if let Some(parent_id) = self.parent_id {
            component.parent_id = parent_id;
        }
        if let Some(animating) = self.animating {
            component.flags.animating = animating;
        }
    }
}

impl From<Props> for ComponentUpdate {
    fn from(props: Props) -> Self {
        ComponentUpdate::props(props)
    }
}

pub struct DraftStore {
    pub(crate) drafts: HashMap<String, Vec<ComponentSlot>>,
    pub(crate) selections: HashMap<String, Vec<String>>,
    pub(crate) dirty: BTreeSet<String>,
    pub(crate) history: HistoryEngine,
    last_operation: OperationToken,
    pub(crate) committed: Arc<dyn CommittedSource>,
    generation: Arc<dyn GenerationStatus>,
    charts: Box<dyn ChartTracker>,
}

impl DraftStore {
    pub fn new(committed: Arc<dyn CommittedSource>) -> Self {
        Self::with_config(committed, &EditorConfig::default(), TransientGate::new())
    }

    pub fn with_config(
        committed: Arc<dyn CommittedSource>,
        config: &EditorConfig,
        gate: TransientGate,
    ) -> Self {
        Self {
            drafts: HashMap::new(),
            selections: HashMap::new(),
            dirty: BTreeSet::new(),
            history: HistoryEngine::from_config(config, gate),
            last_operation: OperationToken::default(),
            committed,
            generation: Arc::new(GenerationFlags::new()),
            charts: Box::new(NoChartTracking),
        }
    }

    pub fn with_generation_status(mut self, generation: Arc<dyn GenerationStatus>) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_chart_tracker(mut self, charts: Box<dyn ChartTracker>) -> Self {
        self.charts = charts;
        self
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn gate(&self) -> &TransientGate {
        self.history.gate()
    }

    pub fn last_operation(&self) -> OperationToken {
        self.last_operation
    }

    pub fn has_draft(&self, slide_id: &str) -> bool {
        self.drafts.contains_key(slide_id)
    }

    /// Make sure a draft exists, deriving it from the committed slide.
    /// Returns false for unknown slides and for empty slides still being
    /// populated by a generator.
    pub(crate) fn ensure_draft(&mut self, slide_id: &str) -> bool {
        if self.drafts.contains_key(slide_id) {
            return true;
        }

        let Some(committed) = self.committed.load(slide_id) else {
            tracing::debug!("[DraftStore] unknown slide {}", slide_id);
            return false;
        };

        if committed.is_empty() && self.generation.is_generating(slide_id) {
            tracing::debug!(
                "[DraftStore] slide {} is still generating, not creating a draft",
                slide_id
            );
            return false;
        }

        let slots = committed.into_iter().map(ComponentSlot::Shared).collect();
        self.drafts.insert(slide_id.to_string(), slots);
        true
    }

    /// Current components of a slide (empty for unknown slides)
    pub fn components(&mut self, slide_id: &str) -> &[ComponentSlot] {
        if !self.ensure_draft(slide_id) {
            return &[];
        }
        self.drafts
            .get(slide_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Deep copy of a slide's components
    pub fn snapshot(&mut self, slide_id: &str) -> Vec<Component> {
        snapshot(self.components(slide_id))
    }

    pub fn component(&mut self, slide_id: &str, component_id: &str) -> Option<&Component> {
        self.components(slide_id)
            .iter()
            .find(|slot| slot.id == component_id)
            .map(|slot| &**slot)
    }

    /// Run an edit against a slide's draft. `edit` returns `None` when it
    /// found nothing to change; in that case history, token and dirty marks
    /// stay untouched.
    pub(crate) fn apply<R>(
        &mut self,
        slide_id: &str,
        record: bool,
        edit: impl FnOnce(&mut Vec<ComponentSlot>) -> Option<R>,
    ) -> Option<R> {
        if !self.ensure_draft(slide_id) {
            return None;
        }
        let slots = self.drafts.get_mut(slide_id)?;

        let before = record.then(|| snapshot(slots));
        let result = edit(slots)?;

        if let Some(before) = before {
            let after = snapshot(slots);
            self.history.record(slide_id, &before);
            self.history.record(slide_id, &after);
        }

        self.touch(slide_id);
        Some(result)
    }

    fn touch(&mut self, slide_id: &str) {
        self.last_operation = self.last_operation.next();
        self.dirty.insert(slide_id.to_string());
    }

    /// Merge a partial update into a component. Returns whether the
    /// component was found.
    pub fn update_component(
        &mut self,
        slide_id: &str,
        component_id: &str,
        update: impl Into<ComponentUpdate>,
        skip_history: bool,
    ) -> bool {
        let update = update.into();
        let record = !skip_history && !update.is_animation_only();

        self.apply(slide_id, record, |slots| {
            let slot = slots.iter_mut().find(|slot| slot.id == component_id)?;
            update.apply_to(slot.to_mut());
            Some(())
        })
        .is_some()
    }

    /// Insert a component with type defaults and a stacking order
    pub fn add_component(&mut self, slide_id: &str, component: Component, skip_history: bool) -> bool {
        let mut component = component;
        apply_defaults(&component.kind, &mut component.props);

        self.apply(slide_id, !skip_history, |slots| {
            if slots.iter().any(|slot| slot.id == component.id) {
                tracing::debug!("[DraftStore] duplicate component id {}", component.id);
                return None;
            }
            if component.z_index().is_none() {
                let z = next_z_index(slots);
                component.props.insert("zIndex".to_string(), Value::from(z));
            }
            slots.push(ComponentSlot::Owned(component));
            Some(())
        })
        .is_some()
    }

    /// Remove a component. Background components are refused. Removing a
    /// group detaches its members rather than deleting them.
    pub fn remove_component(
        &mut self,
        slide_id: &str,
        component_id: &str,
        skip_history: bool,
    ) -> Result<bool, EditError> {
        let protected = self
            .component(slide_id, component_id)
            .is_some_and(Component::is_background);
        if protected {
            return Err(EditError::ProtectedComponent {
                slide_id: slide_id.to_string(),
                component_id: component_id.to_string(),
            });
        }

        let removed = self.apply(slide_id, !skip_history, |slots| {
            let index = slots.iter().position(|slot| slot.id == component_id)?;
            let removed = slots.remove(index).into_owned();
            detach_members(slots, component_id);
            if let Some(parent_id) = &removed.parent_id {
                forget_member(slots, parent_id, component_id);
            }
            Some(removed)
        });

        let Some(removed) = removed else {
            return Ok(false);
        };

        if removed.is_chart() {
            self.charts.detach(slide_id, component_id);
        }
        if let Some(selection) = self.selections.get_mut(slide_id) {
            selection.retain(|id| id != component_id);
        }
        Ok(true)
    }

    /// Replace a slide's components wholesale. `Internal` replacements are
    /// recorded and keep the given components shared; `ExternalRestore`
    /// deep copies them and bypasses history.
    pub fn replace_components(
        &mut self,
        slide_id: &str,
        components: Vec<Arc<Component>>,
        source: ChangeSource,
    ) -> bool {
        let slots: Vec<ComponentSlot> = match source {
            ChangeSource::Internal => components.into_iter().map(ComponentSlot::Shared).collect(),
            ChangeSource::ExternalRestore => components
                .into_iter()
                .map(|c| ComponentSlot::Owned(Arc::unwrap_or_clone(c)))
                .collect(),
        };

        if source == ChangeSource::Internal && !self.drafts.contains_key(slide_id) {
            // Full content supplied, so the generator guard does not apply
            let Some(committed) = self.committed.load(slide_id) else {
                return false;
            };
            let base = committed.into_iter().map(ComponentSlot::Shared).collect();
            self.drafts.insert(slide_id.to_string(), base);
        }

        let record = source == ChangeSource::Internal;
        let replaced = self
            .apply(slide_id, record, |current| {
                *current = slots;
                Some(())
            })
            .is_some();

        if replaced {
            let ids: Vec<String> = self
                .drafts
                .get(slide_id)
                .map(|slots| slots.iter().map(|slot| slot.id.clone()).collect())
                .unwrap_or_default();
            if let Some(selection) = self.selections.get_mut(slide_id) {
                selection.retain(|id| ids.contains(id));
            }
        }
        replaced
    }

    pub fn undo(&mut self, slide_id: &str) -> bool {
        match self.history.undo(slide_id) {
            Some(components) => self.restore(slide_id, components),
            None => false,
        }
    }

    pub fn redo(&mut self, slide_id: &str) -> bool {
        match self.history.redo(slide_id) {
            Some(components) => self.restore(slide_id, components),
            None => false,
        }
    }

    fn restore(&mut self, slide_id: &str, components: Vec<Component>) -> bool {
        let components = components.into_iter().map(Arc::new).collect();
        self.replace_components(slide_id, components, ChangeSource::ExternalRestore)
    }

    pub fn can_undo(&self, slide_id: &str) -> bool {
        self.history.can_undo(slide_id)
    }

    pub fn can_redo(&self, slide_id: &str) -> bool {
        self.history.can_redo(slide_id)
    }

    /// Begin a continuous gesture; history is suppressed until it ends
    pub fn start_transient_operation(&mut self, slide_id: &str, component_id: &str) {
        self.history.start_transient(component_id, slide_id);
    }

    /// End a gesture, recording its net effect once. Returns whether a
    /// history entry was written.
    pub fn end_transient_operation(&mut self, slide_id: &str, component_id: &str) -> bool {
        match self.drafts.get(slide_id) {
            Some(slots) => {
                let current = snapshot(slots);
                self.history.end_transient(component_id, slide_id, &current)
            }
            None => {
                self.history.cancel_transient(component_id);
                false
            }
        }
    }

    /// Abandon a gesture without recording
    pub fn cancel_transient_operation(&mut self, component_id: &str) {
        self.history.cancel_transient(component_id);
    }

    pub fn clear_history(&mut self, slide_id: Option<&str>) {
        self.history.clear(slide_id);
    }

    /// Set the selection, dropping ids that are not on the slide
    pub fn select_components<I, S>(&mut self, slide_id: &str, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.ensure_draft(slide_id) {
            return;
        }
        let slots = self.drafts.get(slide_id).map(Vec::as_slice).unwrap_or_default();
        let mut selected: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if slots.iter().any(|slot| slot.id == id) && !selected.contains(&id) {
                selected.push(id);
            }
        }
        self.selections.insert(slide_id.to_string(), selected);
    }

    pub fn selection(&self, slide_id: &str) -> &[String] {
        self.selections
            .get(slide_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn clear_selection(&mut self, slide_id: &str) {
        self.selections.remove(slide_id);
    }
}

fn next_z_index(slots: &[ComponentSlot]) -> i64 {
    slots
        .iter()
        .filter_map(|slot| slot.z_index())
        .max()
        .map_or(slots.len() as i64, |z| z + 1)
}

/// Clear `parent_id` on every member of a removed group
fn detach_members(slots: &mut [ComponentSlot], group_id: &str) {
    for slot in slots.iter_mut() {
        if slot.parent_id.as_deref() == Some(group_id) {
            slot.to_mut().parent_id = None;
        }
    }
}

/// Drop a member id from its group's `children` list
pub(crate) fn forget_member(slots: &mut [ComponentSlot], group_id: &str, member_id: &str) {
    let Some(group) = slots.iter_mut().find(|slot| slot.id == group_id) else {
        return;
    };
    let children = group.children();
    if children.iter().any(|id| id == member_id) {
        let remaining: Vec<String> = children.into_iter().filter(|id| id != member_id).collect();
        group.to_mut().set_children(&remaining);
    }
}
