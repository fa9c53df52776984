//! Full-document snapshots handed to the replication initializer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::component::{Component, Props};

/// Deck-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckMeta {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Any other metadata fields, carried through untouched
    #[serde(flatten)]
    pub extra: Props,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSnapshot {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<serde_json::Value>,

    #[serde(default)]
    pub components: Vec<Component>,
}

impl SlideSnapshot {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            background: None,
            components: Vec::new(),
        }
    }
}

/// Deck plus every slide and component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub deck: DeckMeta,

    #[serde(default)]
    pub slides: Vec<SlideSnapshot>,
}

impl DocumentSnapshot {
    pub fn total_components(&self) -> usize {
        self.slides.iter().map(|s| s.components.len()).sum()
    }
}
