//! Type-specific default properties for newly added components.

use deckhand_common::{ComponentType, Props};
use serde_json::json;

/// Defaults for a component type
pub fn defaults_for(kind: &ComponentType) -> Props {
    let defaults = match kind {
        ComponentType::Shape => json!({
            "width": 200,
            "height": 120,
            "shapeType": "rectangle",
            "fill": "#3b82f6",
            "stroke": "#1e3a8a",
            "strokeWidth": 0,
            "opacity": 1,
            "rotation": 0
        }),
        ComponentType::Text => json!({
            "width": 320,
            "height": 60,
            "text": "",
            "fontFamily": "Inter",
            "fontSize": 24,
            "fontWeight": "normal",
            "lineHeight": 1.2,
            "color": "#111827",
            "textAlign": "left",
            "rotation": 0
        }),
        ComponentType::Chart => json!({
            "width": 480,
            "height": 320,
            "chartType": "bar",
            "data": [],
            "showLegend": true
        }),
        ComponentType::Image => json!({
            "width": 320,
            "height": 240,
            "src": "",
            "objectFit": "cover",
            "rotation": 0
        }),
        ComponentType::Table => json!({
            "width": 480,
            "height": 240,
            "data": [],
            "headerRow": true
        }),
        ComponentType::Video => json!({
            "width": 480,
            "height": 270,
            "src": "",
            "autoplay": false,
            "controls": true
        }),
        ComponentType::Group => json!({ "children": [] }),
        ComponentType::Background => json!({ "fill": "#ffffff" }),
        ComponentType::Other(_) => json!({}),
    };
    deckhand_common::props(defaults)
}

/// Fill in defaults beneath caller-supplied props (caller values win)
pub fn apply_defaults(kind: &ComponentType, props: &mut Props) {
    for (key, value) in defaults_for(kind) {
        props.entry(key).or_insert(value);
    }
    props
        .entry("position".to_string())
        .or_insert_with(|| json!({ "x": 0, "y": 0 }));
}
