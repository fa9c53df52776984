//! # Component Model
//!
//! A component is a positioned, typed visual element on a slide. Everything
//! beyond identity and type lives in an open property bag so that widgets the
//! engine knows nothing about (charts, rich text) can carry their own data.
//!
//! Geometry is stored in the bag under well-known keys:
//!
//! ```text
//! position: { x, y }   width   height   zIndex   children: [id, ...]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::geometry::{Point, Rect};

/// Open key → value property bag
pub type Props = Map<String, Value>;

/// Build a property bag from a JSON object literal; anything else yields an
/// empty bag.
pub fn props(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}

/// Component type tag. Unknown tags survive a round trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentType {
    Shape,
    Text,
    Chart,
    Image,
    Table,
    Video,
    Group,
    Background,
    Other(String),
}

impl ComponentType {
    pub fn as_str(&self) -> &str {
        match self {
            ComponentType::Shape => "shape",
            ComponentType::Text => "text",
            ComponentType::Chart => "chart",
            ComponentType::Image => "image",
            ComponentType::Table => "table",
            ComponentType::Video => "video",
            ComponentType::Group => "group",
            ComponentType::Background => "background",
            ComponentType::Other(tag) => tag,
        }
    }
}

impl From<String> for ComponentType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "shape" => ComponentType::Shape,
            "text" => ComponentType::Text,
            "chart" => ComponentType::Chart,
            "image" => ComponentType::Image,
            "table" => ComponentType::Table,
            "video" => ComponentType::Video,
            "group" => ComponentType::Group,
            "background" => ComponentType::Background,
            _ => ComponentType::Other(tag),
        }
    }
}

impl From<&str> for ComponentType {
    fn from(tag: &str) -> Self {
        ComponentType::from(tag.to_string())
    }
}

impl From<ComponentType> for String {
    fn from(kind: ComponentType) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived and transient flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFlags {
    /// Slide background role
    #[serde(default)]
    pub background: bool,

    /// Set while an entrance/exit animation is playing
    #[serde(default)]
    pub animating: bool,
}

impl ComponentFlags {
    pub fn is_empty(&self) -> bool {
        !self.background && !self.animating
    }
}

/// A positioned, typed visual element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Stable identifier, unique within a slide
    pub id: String,

    /// Type tag (never changes after creation)
    #[serde(rename = "type")]
    pub kind: ComponentType,

    #[serde(default)]
    pub props: Props,

    /// Owning group, if any. Non-owning: removing the group detaches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "ComponentFlags::is_empty")]
    pub flags: ComponentFlags,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: ComponentType) -> Self {
        Self {
            id: id.into(),
            kind,
            props: Props::new(),
            parent_id: None,
            flags: ComponentFlags::default(),
        }
    }

    /// Replace the property bag
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Set a single property
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Set position and size in one go
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.set_rect(rect);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Background components are protected from deletion
    pub fn is_background(&self) -> bool {
        self.kind == ComponentType::Background
            || self.flags.background
            || self.id.to_lowercase().contains("background")
    }

    pub fn is_group(&self) -> bool {
        self.kind == ComponentType::Group
    }

    /// Chart-like components, including vendor tags such as `bar-chart`
    pub fn is_chart(&self) -> bool {
        match &self.kind {
            ComponentType::Chart => true,
            ComponentType::Other(tag) => tag.to_lowercase().contains("chart"),
            _ => false,
        }
    }

    pub fn position(&self) -> Point {
        let pos = self.props.get("position");
        Point {
            x: pos.and_then(|p| p.get("x")).and_then(Value::as_f64).unwrap_or(0.0),
            y: pos.and_then(|p| p.get("y")).and_then(Value::as_f64).unwrap_or(0.0),
        }
    }

    pub fn set_position(&mut self, point: Point) {
        self.props
            .insert("position".to_string(), json!({ "x": point.x, "y": point.y }));
    }

    pub fn width(&self) -> f64 {
        self.props.get("width").and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn height(&self) -> f64 {
        self.props.get("height").and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn rect(&self) -> Rect {
        let Point { x, y } = self.position();
        Rect::new(x, y, self.width(), self.height())
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.set_position(rect.origin());
        self.props.insert("width".to_string(), json!(rect.width));
        self.props.insert("height".to_string(), json!(rect.height));
    }

    /// Stacking order, when one has been assigned
    pub fn z_index(&self) -> Option<i64> {
        match self.props.get("zIndex")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    /// Member ids of a group (empty for everything else)
    pub fn children(&self) -> Vec<String> {
        self.props
            .get("children")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_children(&mut self, ids: &[String]) {
        self.props.insert("children".to_string(), json!(ids));
    }

    /// Number of data rows for table components
    pub fn table_row_count(&self) -> usize {
        ["data", "rows"]
            .iter()
            .find_map(|key| self.props.get(*key).and_then(Value::as_array))
            .map(Vec::len)
            .unwrap_or(0)
    }
}
