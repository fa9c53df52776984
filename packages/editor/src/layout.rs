//! # Layout Operations
//!
//! Grouping and pure-geometry arrangement of the current selection. Positions
//! are absolute: grouping never moves members, and moving a group moves its
//! members with it.

use std::collections::HashSet;

use deckhand_common::{Alignment, Axis, Component, ComponentType, Point, Rect};
use serde_json::Value;
use uuid::Uuid;

use crate::draft::{forget_member, DraftStore};
use crate::slot::ComponentSlot;

fn find<'a>(slots: &'a [ComponentSlot], id: &str) -> Option<&'a ComponentSlot> {
    slots.iter().find(|slot| slot.id == id)
}

fn find_mut<'a>(slots: &'a mut [ComponentSlot], id: &str) -> Option<&'a mut ComponentSlot> {
    slots.iter_mut().find(|slot| slot.id == id)
}

/// Group holding a component, by its `parentId` or a group's `children` list
fn parent_of(slots: &[ComponentSlot], id: &str) -> Option<String> {
    if let Some(parent_id) = find(slots, id).and_then(|slot| slot.parent_id.clone()) {
        return Some(parent_id);
    }
    slots
        .iter()
        .find(|slot| slot.is_group() && slot.children().iter().any(|child| child == id))
        .map(|slot| slot.id.clone())
}

/// Whether any group enclosing `id` is itself selected
fn has_selected_ancestor(slots: &[ComponentSlot], id: &str, selection: &[String]) -> bool {
    let mut visited = HashSet::from([id.to_string()]);
    let mut current = id.to_string();
    while let Some(parent) = parent_of(slots, &current) {
        if selection.contains(&parent) {
            return true;
        }
        if !visited.insert(parent.clone()) {
            return false;
        }
        current = parent;
    }
    false
}

/// Swap `member_id` in a group's `children` for `replacements`, in place
fn splice_member(
    slots: &mut [ComponentSlot],
    group_id: &str,
    member_id: &str,
    replacements: &[String],
) {
    let Some(group) = find_mut(slots, group_id) else {
        return;
    };
    let mut children: Vec<String> = Vec::new();
    for child in group.children() {
        let incoming = if child == member_id {
            replacements
        } else {
            std::slice::from_ref(&child)
        };
        for id in incoming {
            if !children.contains(id) {
                children.push(id.clone());
            }
        }
    }
    group.to_mut().set_children(&children);
}

/// Direct members of a group: its `children` list plus anything pointing at it
fn members(slots: &[ComponentSlot], group_id: &str) -> Vec<String> {
    let mut ids = find(slots, group_id)
        .map(|group| group.children())
        .unwrap_or_default();
    for slot in slots {
        if slot.parent_id.as_deref() == Some(group_id) && !ids.contains(&slot.id) {
            ids.push(slot.id.clone());
        }
    }
    ids
}

/// Expand an id to its leaf members, recording every group passed through
fn collect_leaves(
    slots: &[ComponentSlot],
    id: &str,
    leaves: &mut Vec<String>,
    groups: &mut Vec<String>,
    visited: &mut HashSet<String>,
) {
    if !visited.insert(id.to_string()) {
        return;
    }
    let Some(component) = find(slots, id) else {
        return;
    };
    if component.is_group() {
        groups.push(id.to_string());
        for member in members(slots, id) {
            collect_leaves(slots, &member, leaves, groups, visited);
        }
    } else {
        leaves.push(id.to_string());
    }
}

/// Move a component, and every member beneath it, by a delta
fn translate(slots: &mut [ComponentSlot], id: &str, dx: f64, dy: f64) {
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    let mut leaves = Vec::new();
    let mut groups = Vec::new();
    collect_leaves(slots, id, &mut leaves, &mut groups, &mut HashSet::new());

    for target in leaves.iter().chain(groups.iter()) {
        if let Some(slot) = find_mut(slots, target) {
            let Point { x, y } = slot.position();
            slot.to_mut().set_position(Point::new(x + dx, y + dy));
        }
    }
}

/// Start and size of a rect along an axis
fn extent_along(rect: &Rect, axis: Axis) -> (f64, f64) {
    match axis {
        Axis::Horizontal => (rect.x, rect.width),
        Axis::Vertical => (rect.y, rect.height),
    }
}

/// Rects of the selection, skipping members whose group is also selected
/// (they move with the group)
fn selected_rects(slots: &[ComponentSlot], selection: &[String]) -> Vec<(String, Rect)> {
    selection
        .iter()
        .filter(|id| !has_selected_ancestor(slots, id, selection))
        .filter_map(|id| find(slots, id).map(|slot| (id.clone(), slot.rect())))
        .collect()
}

impl DraftStore {
    /// Group the selection (at least two components) under a new group.
    /// Selected groups are dissolved into the new one, and members leave any
    /// unselected group they belonged to. When everything came from one
    /// enclosing group, the new group nests inside it. Returns the new
    /// group's id.
    pub fn group_components(&mut self, slide_id: &str) -> Option<String> {
        let selection = self.selection(slide_id).to_vec();
        if selection.len() < 2 {
            return None;
        }

        let group_id = format!("group-{}", Uuid::new_v4());
        let new_id = group_id.clone();

        let grouped = self.apply(slide_id, true, |slots| {
            let mut leaves = Vec::new();
            let mut groups = Vec::new();
            let mut visited = HashSet::new();
            for id in &selection {
                collect_leaves(slots, id, &mut leaves, &mut groups, &mut visited);
            }
            if leaves.len() < 2 {
                return None;
            }

            let bounds = Rect::bounding(
                leaves
                    .iter()
                    .filter_map(|id| find(slots, id).map(|slot| slot.rect())),
            )?;

            // Leaves and dissolved groups leave every group that survives
            let mut origins = Vec::new();
            for id in leaves.iter().chain(groups.iter()) {
                let parent = parent_of(slots, id);
                if parent.as_ref().is_some_and(|parent| groups.contains(parent)) {
                    continue;
                }
                if let Some(parent) = &parent {
                    forget_member(slots, parent, id);
                }
                origins.push(parent);
            }
            let enclosing = match origins.split_first() {
                Some((Some(first), rest)) if rest.iter().all(|p| p.as_ref() == Some(first)) => {
                    Some(first.clone())
                }
                _ => None,
            };

            // Dissolved groups stop existing; their leaves move to the new group
            slots.retain(|slot| !groups.contains(&slot.id));
            for slot in slots.iter_mut() {
                if leaves.contains(&slot.id) {
                    slot.to_mut().parent_id = Some(group_id.clone());
                }
            }

            let z = slots
                .iter()
                .filter_map(|slot| slot.z_index())
                .max()
                .map_or(0, |z| z + 1);

            let mut group = Component::new(group_id.clone(), ComponentType::Group)
                .with_rect(bounds)
                .with_prop("zIndex", Value::from(z));
            group.set_children(&leaves);
            if let Some(enclosing) = &enclosing {
                group.parent_id = Some(enclosing.clone());
                if let Some(outer) = find_mut(slots, enclosing) {
                    let mut children = outer.children();
                    children.push(group_id.clone());
                    outer.to_mut().set_children(&children);
                }
            }
            slots.push(ComponentSlot::Owned(group));
            Some(())
        });

        grouped?;
        self.selections
            .insert(slide_id.to_string(), vec![new_id.clone()]);
        tracing::debug!("[DraftStore] grouped selection on {} into {}", slide_id, new_id);
        Some(new_id)
    }

    /// Dissolve a group, leaving its members where they are. Members pass
    /// to the dissolved group's own enclosing group, if any.
    pub fn ungroup_components(&mut self, slide_id: &str, group_id: &str) -> bool {
        let released = self.apply(slide_id, true, |slots| {
            let group = find(slots, group_id)?;
            if !group.is_group() {
                return None;
            }
            let children = members(slots, group_id);
            let enclosing = parent_of(slots, group_id);

            for child in &children {
                if let Some(slot) = find_mut(slots, child) {
                    slot.to_mut().parent_id = enclosing.clone();
                }
            }
            if let Some(enclosing) = &enclosing {
                splice_member(slots, enclosing, group_id, &children);
            }
            slots.retain(|slot| slot.id != group_id);
            Some(children)
        });

        match released {
            Some(children) => {
                self.selections.insert(slide_id.to_string(), children);
                true
            }
            None => false,
        }
    }

    /// Align the selection (at least two) against its combined bounds
    pub fn align_components(&mut self, slide_id: &str, alignment: Alignment) -> bool {
        let selection = self.selection(slide_id).to_vec();
        if selection.len() < 2 {
            return false;
        }

        self.apply(slide_id, true, |slots| {
            let rects = selected_rects(slots, &selection);
            if rects.len() < 2 {
                return None;
            }
            let bounds = Rect::bounding(rects.iter().map(|(_, rect)| *rect))?;

            for (id, rect) in &rects {
                let (dx, dy) = match alignment {
                    Alignment::Left => (bounds.x - rect.x, 0.0),
                    Alignment::Center => (bounds.center_x() - rect.center_x(), 0.0),
                    Alignment::Right => (bounds.right() - rect.right(), 0.0),
                    Alignment::Top => (0.0, bounds.y - rect.y),
                    Alignment::Middle => (0.0, bounds.center_y() - rect.center_y()),
                    Alignment::Bottom => (0.0, bounds.bottom() - rect.bottom()),
                };
                translate(slots, id, dx, dy);
            }
            Some(())
        })
        .is_some()
    }

    /// Space the selection (at least three) evenly along an axis. The first
    /// and last components stay put; the gaps between neighbours are equalized.
    pub fn distribute_components(&mut self, slide_id: &str, axis: Axis) -> bool {
        let selection = self.selection(slide_id).to_vec();
        if selection.len() < 3 {
            return false;
        }

        self.apply(slide_id, true, |slots| {
            let mut rects = selected_rects(slots, &selection);
            if rects.len() < 3 {
                return None;
            }

            rects.sort_by(|(_, a), (_, b)| {
                let (a_start, _) = extent_along(a, axis);
                let (b_start, _) = extent_along(b, axis);
                a_start.total_cmp(&b_start)
            });

            let (first_start, _) = extent_along(&rects[0].1, axis);
            let (last_start, last_size) = extent_along(&rects[rects.len() - 1].1, axis);
            let span = last_start + last_size - first_start;
            let occupied: f64 = rects.iter().map(|(_, r)| extent_along(r, axis).1).sum();
            let gap = (span - occupied) / (rects.len() - 1) as f64;

            let mut cursor = first_start;
            for (id, rect) in &rects {
                let (start, size) = extent_along(rect, axis);
                let delta = cursor - start;
                match axis {
                    Axis::Horizontal => translate(slots, id, delta, 0.0),
                    Axis::Vertical => translate(slots, id, 0.0, delta),
                }
                cursor += size + gap;
            }
            Some(())
        })
        .is_some()
    }
}
