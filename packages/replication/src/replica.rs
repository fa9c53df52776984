//! # Replicated Deck Document
//!
//! The CRDT side of replication. A [`ReplicaBackend`] receives the deck one
//! piece at a time, each call in its own transaction, so collaborators see
//! content appear incrementally.
//!
//! [`YrsReplica`] lays the deck out in a `yrs::Doc`:
//!
//! ```text
//! "deck"   : Map   { id, title, theme?, createdAt?, updatedAt?, ...extra }
//! "slides" : Array [
//!     Map { id, title, background?, components: Array [
//!         Map { id, type, parentId?, background?, props: Map { ... } }
//!     ] }
//! ]
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use deckhand_common::{Component, DeckMeta, SlideSnapshot};
use yrs::{
    Any, Array, ArrayPrelim, ArrayRef, Doc, Map, MapPrelim, MapRef, Out, ReadTxn, Transact,
    TransactionMut,
};

use crate::errors::ReplicationError;
use crate::sanitize::Sanitize;

/// Destination for replicated deck content
pub trait ReplicaBackend: Send + Sync + 'static {
    /// Clear and repopulate deck-level metadata
    fn reset_deck(&self, deck: &DeckMeta) -> Result<(), ReplicationError>;

    /// Append an empty slide (its components arrive separately)
    fn create_slide(&self, slide: &SlideSnapshot) -> Result<(), ReplicationError>;

    /// Append a component to an existing slide
    fn append_component(&self, slide_id: &str, component: &Component)
        -> Result<(), ReplicationError>;
}

/// Deck replica backed by a `yrs` document
pub struct YrsReplica {
    doc: Doc,
    deck: MapRef,
    slides: ArrayRef,

    /// Components array of each slide created through this replica
    slide_components: Mutex<HashMap<String, ArrayRef>>,
}

impl Default for YrsReplica {
    fn default() -> Self {
        Self::new()
    }
}

impl YrsReplica {
    pub fn new() -> Self {
        Self::from_doc(Doc::new())
    }

    /// Wrap an existing document, e.g. one already bound to a sync provider
    pub fn from_doc(doc: Doc) -> Self {
        let deck = doc.get_or_insert_map("deck");
        let slides = doc.get_or_insert_array("slides");
        Self {
            doc,
            deck,
            slides,
            slide_components: Mutex::new(HashMap::new()),
        }
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// Encode the full document state for a joining client
    pub fn encode_state(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.encode_state_as_update_v1(&Default::default())
    }

    fn transact(&self) -> Result<TransactionMut<'_>, ReplicationError> {
        self.doc
            .try_transact_mut()
            .map_err(|e| ReplicationError::Transaction(e.to_string()))
    }

    fn slide_components(&self) -> MutexGuard<'_, HashMap<String, ArrayRef>> {
        self.slide_components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn find_slide<T: ReadTxn>(&self, txn: &T, slide_id: &str) -> Option<MapRef> {
        self.slides.iter(txn).find_map(|item| match item {
            Out::YMap(slide) if read_string(&slide, txn, "id").as_deref() == Some(slide_id) => {
                Some(slide)
            }
            _ => None,
        })
    }

    fn components_of<T: ReadTxn>(
        &self,
        txn: &T,
        slide_id: &str,
    ) -> Result<ArrayRef, ReplicationError> {
        if let Some(components) = self.slide_components().get(slide_id) {
            return Ok(components.clone());
        }

        // Slides already in the document before this replica wrapped it
        let slide = self
            .find_slide(txn, slide_id)
            .ok_or_else(|| ReplicationError::SlideNotFound(slide_id.to_string()))?;
        match slide.get(txn, "components") {
            Some(Out::YArray(components)) => Ok(components),
            _ => Err(ReplicationError::Malformed(format!(
                "slide {slide_id} has no components array"
            ))),
        }
    }

    pub fn slide_count(&self) -> usize {
        let txn = self.doc.transact();
        self.slides.len(&txn) as usize
    }

    /// Slide ids in replicated order
    pub fn slide_ids(&self) -> Vec<String> {
        let txn = self.doc.transact();
        self.slides
            .iter(&txn)
            .filter_map(|item| match item {
                Out::YMap(slide) => read_string(&slide, &txn, "id"),
                _ => None,
            })
            .collect()
    }

    /// Component ids of a slide in replicated order
    pub fn component_ids(&self, slide_id: &str) -> Option<Vec<String>> {
        let txn = self.doc.transact();
        let components = self.components_of(&txn, slide_id).ok()?;
        let ids = components
            .iter(&txn)
            .filter_map(|item| match item {
                Out::YMap(component) => read_string(&component, &txn, "id"),
                _ => None,
            })
            .collect();
        Some(ids)
    }

    pub fn component_count(&self, slide_id: &str) -> Option<usize> {
        self.component_ids(slide_id).map(|ids| ids.len())
    }

    /// Components across every slide
    pub fn total_components(&self) -> usize {
        self.slide_ids()
            .iter()
            .filter_map(|id| self.component_count(id))
            .sum()
    }

    /// Deck metadata field
    pub fn deck_field(&self, key: &str) -> Option<Any> {
        let txn = self.doc.transact();
        match self.deck.get(&txn, key)? {
            Out::Any(value) => Some(value),
            _ => None,
        }
    }

    fn find_component<T: ReadTxn>(
        &self,
        txn: &T,
        slide_id: &str,
        component_id: &str,
    ) -> Option<MapRef> {
        let components = self.components_of(txn, slide_id).ok()?;
        components.iter(txn).find_map(|item| match item {
            Out::YMap(component)
                if read_string(&component, txn, "id").as_deref() == Some(component_id) =>
            {
                Some(component)
            }
            _ => None,
        })
    }

    /// Top-level field of a replicated component (`type`, `parentId`, ...)
    pub fn component_field(&self, slide_id: &str, component_id: &str, key: &str) -> Option<Any> {
        let txn = self.doc.transact();
        let component = self.find_component(&txn, slide_id, component_id)?;
        match component.get(&txn, key)? {
            Out::Any(value) => Some(value),
            _ => None,
        }
    }

    /// One replicated prop of a component
    pub fn component_prop(&self, slide_id: &str, component_id: &str, key: &str) -> Option<Any> {
        let txn = self.doc.transact();
        let component = self.find_component(&txn, slide_id, component_id)?;
        let Some(Out::YMap(props)) = component.get(&txn, "props") else {
            return None;
        };
        match props.get(&txn, key)? {
            Out::Any(value) => Some(value),
            _ => None,
        }
    }
}

fn read_string<T: ReadTxn>(map: &MapRef, txn: &T, key: &str) -> Option<String> {
    match map.get(txn, key)? {
        Out::Any(Any::String(value)) => Some(value.to_string()),
        _ => None,
    }
}

fn text(value: &str) -> Any {
    Any::String(Arc::from(value))
}

impl ReplicaBackend for YrsReplica {
    fn reset_deck(&self, deck: &DeckMeta) -> Result<(), ReplicationError> {
        let mut txn = self.transact()?;

        self.deck.clear(&mut txn);
        for (key, value) in &deck.extra {
            self.deck.insert(&mut txn, key.as_str(), value.sanitize());
        }
        self.deck.insert(&mut txn, "id", text(&deck.id));
        self.deck.insert(&mut txn, "title", text(&deck.title));
        if let Some(theme) = &deck.theme {
            self.deck.insert(&mut txn, "theme", theme.sanitize());
        }
        if let Some(created_at) = &deck.created_at {
            self.deck.insert(&mut txn, "createdAt", created_at.sanitize());
        }
        if let Some(updated_at) = &deck.updated_at {
            self.deck.insert(&mut txn, "updatedAt", updated_at.sanitize());
        }
        Ok(())
    }

    fn create_slide(&self, slide: &SlideSnapshot) -> Result<(), ReplicationError> {
        let mut txn = self.transact()?;

        let map = self.slides.push_back(&mut txn, MapPrelim::default());
        map.insert(&mut txn, "id", text(&slide.id));
        map.insert(&mut txn, "title", text(&slide.title));
        if let Some(background) = &slide.background {
            map.insert(&mut txn, "background", background.sanitize());
        }
        let components = map.insert(&mut txn, "components", ArrayPrelim::default());
        self.slide_components()
            .entry(slide.id.clone())
            .or_insert(components);
        Ok(())
    }

    fn append_component(
        &self,
        slide_id: &str,
        component: &Component,
    ) -> Result<(), ReplicationError> {
        let mut txn = self.transact()?;
        let components = self.components_of(&txn, slide_id)?;

        let map = components.push_back(&mut txn, MapPrelim::default());
        map.insert(&mut txn, "id", text(&component.id));
        map.insert(&mut txn, "type", text(component.kind.as_str()));
        if let Some(parent_id) = &component.parent_id {
            map.insert(&mut txn, "parentId", text(parent_id));
        }
        if component.flags.background {
            map.insert(&mut txn, "background", Any::Bool(true));
        }
        let props = map.insert(&mut txn, "props", MapPrelim::default());
        for (key, value) in &component.props {
            props.insert(&mut txn, key.as_str(), value.sanitize());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_common::{ComponentType, Rect};
    use serde_json::json;

    fn deck_meta() -> DeckMeta {
        DeckMeta {
            id: "deck-1".to_string(),
            title: "Quarterly".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_reset_deck_replaces_fields() {
        let replica = YrsReplica::new();
        let mut meta = deck_meta();
        meta.theme = Some("dark".to_string());
        replica.reset_deck(&meta).unwrap();
        assert_eq!(replica.deck_field("theme"), Some(text("dark")));

        meta.theme = None;
        meta.title = "Annual".to_string();
        replica.reset_deck(&meta).unwrap();
        assert_eq!(replica.deck_field("theme"), None);
        assert_eq!(replica.deck_field("title"), Some(text("Annual")));
    }

    #[test]
    fn test_slide_then_components() {
        let replica = YrsReplica::new();
        replica
            .create_slide(&SlideSnapshot::new("s1", "Intro"))
            .unwrap();

        let shape = Component::new("a", ComponentType::Shape)
            .with_rect(Rect::new(1.0, 2.0, 3.0, 4.0))
            .with_prop("label", json!(null));
        replica.append_component("s1", &shape).unwrap();
        replica
            .append_component("s1", &Component::new("b", ComponentType::Text))
            .unwrap();

        assert_eq!(replica.slide_ids(), vec!["s1"]);
        assert_eq!(replica.component_ids("s1").unwrap(), vec!["a", "b"]);
        assert_eq!(replica.component_prop("s1", "a", "width"), Some(Any::Number(3.0)));
        assert_eq!(replica.component_prop("s1", "a", "label"), Some(Any::Null));
        assert_eq!(replica.total_components(), 2);
    }

    #[test]
    fn test_component_for_missing_slide_fails() {
        let replica = YrsReplica::new();
        let result = replica.append_component("ghost", &Component::new("a", ComponentType::Shape));
        assert_eq!(result, Err(ReplicationError::SlideNotFound("ghost".to_string())));
    }

    #[test]
    fn test_background_flag_replicated() {
        let replica = YrsReplica::new();
        replica.create_slide(&SlideSnapshot::new("s1", "Intro")).unwrap();

        let mut backdrop = Component::new("bg", ComponentType::Shape);
        backdrop.flags.background = true;
        replica.append_component("s1", &backdrop).unwrap();
        replica
            .append_component("s1", &Component::new("a", ComponentType::Shape))
            .unwrap();

        assert_eq!(replica.component_field("s1", "bg", "background"), Some(Any::Bool(true)));
        assert_eq!(replica.component_field("s1", "a", "background"), None);
        assert_eq!(replica.component_field("s1", "a", "type"), Some(text("shape")));
    }

    #[test]
    fn test_components_land_on_their_own_slide() {
        let replica = YrsReplica::new();
        for i in 0..50 {
            replica
                .create_slide(&SlideSnapshot::new(format!("s{i}"), ""))
                .unwrap();
        }
        replica
            .append_component("s49", &Component::new("last", ComponentType::Text))
            .unwrap();
        replica
            .append_component("s0", &Component::new("first", ComponentType::Text))
            .unwrap();

        assert_eq!(replica.component_ids("s49").unwrap(), vec!["last"]);
        assert_eq!(replica.component_ids("s0").unwrap(), vec!["first"]);
        assert_eq!(replica.total_components(), 2);
    }

    #[test]
    fn test_wrapped_document_finds_existing_slides() {
        let source = YrsReplica::new();
        source.create_slide(&SlideSnapshot::new("s1", "Intro")).unwrap();

        // A second replica over the same document has an empty cache
        let wrapped = YrsReplica::from_doc(source.doc().clone());
        wrapped
            .append_component("s1", &Component::new("a", ComponentType::Shape))
            .unwrap();
        assert_eq!(source.component_ids("s1").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_state_encodes() {
        let replica = YrsReplica::new();
        replica.reset_deck(&deck_meta()).unwrap();
        assert!(!replica.encode_state().is_empty());
    }
}
