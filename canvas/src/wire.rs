//! Wire form of canvas objects.
//!
//! `serialize` flattens an object into a plain attribute mapping that always
//! carries `id` (once assigned) and `kind`. `deserialize` rebuilds a live
//! object from such a mapping and takes its `id` from the wire, never
//! generating one, so remote identity is preserved exactly.
//!
//! Geometry and style use camelCase keys (`left`, `strokeWidth`, ...). Any key
//! that is not typed geometry or style for the object's kind is kept in
//! `CanvasObject::extra` and written back untouched, which makes the mapping
//! lossless for attributes this replica does not understand.

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use serde_json::{Value, json};

use crate::doc::{
    CanvasObject, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, ObjectKind, Point, Shape, Style, WireObject,
};

pub const KEY_ID: &str = "id";
pub const KEY_KIND: &str = "kind";
/// Alternate kind key used by fabric-style payloads.
pub const KEY_TYPE: &str = "type";

const KEY_STROKE: &str = "stroke";
const KEY_STROKE_WIDTH: &str = "strokeWidth";
const KEY_FILL: &str = "fill";

const COMMON_KEYS: [&str; 6] = [KEY_ID, KEY_KIND, KEY_TYPE, KEY_STROKE, KEY_STROKE_WIDTH, KEY_FILL];

/// Error returned by [`deserialize`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    /// A required field is absent or has the wrong type.
    #[error("malformed {kind} object: missing or invalid `{field}`")]
    MalformedObject { kind: String, field: &'static str },
}

/// Geometry keys owned by a kind. Everything else goes to `extra`.
fn geometry_keys(kind: &ObjectKind) -> &'static [&'static str] {
    match kind {
        ObjectKind::Rect => &["left", "top", "width", "height"],
        ObjectKind::Ellipse => &["left", "top", "rx", "ry"],
        ObjectKind::Line => &["x1", "y1", "x2", "y2"],
        ObjectKind::Path => &["points"],
        ObjectKind::Other(_) => &[],
    }
}

/// Serialize an object into its wire mapping.
#[must_use]
pub fn serialize(obj: &CanvasObject) -> WireObject {
    let kind = obj.kind();
    let mut wire = WireObject::new();

    for (k, v) in &obj.extra {
        if !COMMON_KEYS.contains(&k.as_str()) && !geometry_keys(&kind).contains(&k.as_str()) {
            wire.insert(k.clone(), v.clone());
        }
    }

    if let Some(id) = &obj.id {
        wire.insert(KEY_ID.into(), json!(id));
    }
    wire.insert(KEY_KIND.into(), json!(kind.as_str()));

    match &obj.shape {
        Shape::Rect { left, top, width, height } => {
            wire.insert("left".into(), json!(left));
            wire.insert("top".into(), json!(top));
            wire.insert("width".into(), json!(width));
            wire.insert("height".into(), json!(height));
        }
        Shape::Ellipse { left, top, rx, ry } => {
            wire.insert("left".into(), json!(left));
            wire.insert("top".into(), json!(top));
            wire.insert("rx".into(), json!(rx));
            wire.insert("ry".into(), json!(ry));
        }
        Shape::Line { x1, y1, x2, y2 } => {
            wire.insert("x1".into(), json!(x1));
            wire.insert("y1".into(), json!(y1));
            wire.insert("x2".into(), json!(x2));
            wire.insert("y2".into(), json!(y2));
        }
        Shape::Path { points } => {
            let points: Vec<Value> = points.iter().map(|p| json!([p.x, p.y])).collect();
            wire.insert("points".into(), Value::Array(points));
        }
        Shape::Other { .. } => {}
    }

    wire.insert(KEY_STROKE.into(), json!(obj.style.stroke));
    wire.insert(KEY_STROKE_WIDTH.into(), json!(obj.style.stroke_width));
    wire.insert(KEY_FILL.into(), obj.style.fill.as_ref().map_or(Value::Null, |f| json!(f)));

    wire
}

/// Rebuild an object from its wire mapping.
///
/// # Errors
///
/// Returns [`ObjectError::MalformedObject`] when `id`, the kind tag, or a
/// geometry field required by the kind is missing or not of the right type.
pub fn deserialize(wire: &WireObject) -> Result<CanvasObject, ObjectError> {
    let tag = wire
        .get(KEY_KIND)
        .or_else(|| wire.get(KEY_TYPE))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("unknown", KEY_KIND))?;
    let kind = ObjectKind::from_tag(tag);

    let id = wire
        .get(KEY_ID)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| malformed(kind.as_str(), KEY_ID))?;

    let shape = match &kind {
        ObjectKind::Rect => Shape::Rect {
            left: number(wire, &kind, "left")?,
            top: number(wire, &kind, "top")?,
            width: number(wire, &kind, "width")?,
            height: number(wire, &kind, "height")?,
        },
        ObjectKind::Ellipse => Shape::Ellipse {
            left: number(wire, &kind, "left")?,
            top: number(wire, &kind, "top")?,
            rx: number(wire, &kind, "rx")?,
            ry: number(wire, &kind, "ry")?,
        },
        ObjectKind::Line => Shape::Line {
            x1: number(wire, &kind, "x1")?,
            y1: number(wire, &kind, "y1")?,
            x2: number(wire, &kind, "x2")?,
            y2: number(wire, &kind, "y2")?,
        },
        ObjectKind::Path => Shape::Path { points: points(wire, &kind)? },
        ObjectKind::Other(tag) => Shape::Other { tag: tag.clone() },
    };

    let style = Style {
        stroke: wire
            .get(KEY_STROKE)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_STROKE)
            .to_owned(),
        stroke_width: wire
            .get(KEY_STROKE_WIDTH)
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_STROKE_WIDTH),
        fill: wire
            .get(KEY_FILL)
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty() && *f != "transparent")
            .map(str::to_owned),
    };

    let owned = geometry_keys(&kind);
    let extra = wire
        .iter()
        .filter(|(k, _)| !COMMON_KEYS.contains(&k.as_str()) && !owned.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(CanvasObject { id: Some(id.to_owned()), shape, style, extra })
}

/// The `id` carried by a wire mapping, if any.
#[must_use]
pub fn wire_id(wire: &WireObject) -> Option<&str> {
    wire.get(KEY_ID).and_then(Value::as_str)
}

fn malformed(kind: &str, field: &'static str) -> ObjectError {
    ObjectError::MalformedObject { kind: kind.to_owned(), field }
}

fn number(wire: &WireObject, kind: &ObjectKind, field: &'static str) -> Result<f64, ObjectError> {
    wire.get(field)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed(kind.as_str(), field))
}

fn points(wire: &WireObject, kind: &ObjectKind) -> Result<Vec<Point>, ObjectError> {
    let bad = || malformed(kind.as_str(), "points");
    let list = wire.get("points").and_then(Value::as_array).ok_or_else(bad)?;
    list.iter()
        .map(|entry| {
            let pair = entry.as_array().filter(|pair| pair.len() == 2).ok_or_else(bad)?;
            let x = pair[0].as_f64().ok_or_else(bad)?;
            let y = pair[1].as_f64().ok_or_else(bad)?;
            Ok(Point::new(x, y))
        })
        .collect()
}
