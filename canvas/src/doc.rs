//! Document model: canvas objects, their geometry and style, and the store.
//!
//! This module defines what is on a canvas (`CanvasObject`, `ObjectKind`,
//! `Shape`, `Style`) and the owned collection that holds every live object of
//! one replica (`DocStore`). Wire conversion lives in [`crate::wire`]; the
//! notification-emitting canvas wrapper lives in [`crate::surface`].
//!
//! Every object inserted into a `DocStore` receives an [`InstanceKey`]. The
//! key names that in-memory instance, not the logical object: replacing an
//! object with a freshly deserialized copy yields a new key even when the
//! `id` is the same. Keys are never reused within a store.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Globally unique, sender-assigned identifier of a logical object.
pub type ObjectId = String;

/// Serialized attribute mapping of one object, as carried on the wire.
pub type WireObject = Map<String, Value>;

/// Default stroke color for objects that do not specify one.
pub const DEFAULT_STROKE: &str = "#000000";

/// Default stroke width for objects that do not specify one.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

/// Background color a canvas returns to when cleared.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// The kind of a canvas object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Axis-aligned rectangle.
    Rect,
    /// Straight segment between two endpoints.
    Line,
    /// Ellipse anchored at its bounding-box corner.
    Ellipse,
    /// Freehand stroke.
    Path,
    /// Any kind this replica has no typed geometry for. The tag is kept
    /// verbatim so the object still relays and round-trips.
    Other(String),
}

impl ObjectKind {
    /// Parse a wire tag. Matching is case-insensitive so both `"rect"` and
    /// `"Rect"` resolve to [`ObjectKind::Rect`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "rect" | "rectangle" => Self::Rect,
            "line" => Self::Line,
            "ellipse" => Self::Ellipse,
            "path" | "freehand" => Self::Path,
            _ => Self::Other(tag.to_owned()),
        }
    }

    /// Wire tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rect => "rect",
            Self::Line => "line",
            Self::Ellipse => "ellipse",
            Self::Path => "path",
            Self::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Kind-specific geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { left: f64, top: f64, width: f64, height: f64 },
    Ellipse { left: f64, top: f64, rx: f64, ry: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Path { points: Vec<Point> },
    /// Geometry is opaque to this replica and lives in `CanvasObject::extra`.
    Other { tag: String },
}

impl Shape {
    /// The kind this geometry belongs to.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Rect { .. } => ObjectKind::Rect,
            Self::Ellipse { .. } => ObjectKind::Ellipse,
            Self::Line { .. } => ObjectKind::Line,
            Self::Path { .. } => ObjectKind::Path,
            Self::Other { tag } => ObjectKind::Other(tag.clone()),
        }
    }
}

/// Stroke and fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Stroke color as a CSS color string.
    pub stroke: String,
    /// Stroke width in canvas units.
    pub stroke_width: f64,
    /// Fill color; `None` means transparent.
    pub fill: Option<String>,
}

impl Style {
    /// Unfilled style with the given stroke, the way drawing tools create shapes.
    #[must_use]
    pub fn stroked(stroke: impl Into<String>, stroke_width: f64) -> Self {
        Self { stroke: stroke.into(), stroke_width, fill: None }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self { stroke: DEFAULT_STROKE.to_owned(), stroke_width: DEFAULT_STROKE_WIDTH, fill: None }
    }
}

/// A drawable object as held by one replica.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasObject {
    /// Identity. `None` only for a freshly drawn local object that has not
    /// been observed yet; assigned once and never changed afterwards.
    pub id: Option<ObjectId>,
    /// Geometry; also determines the kind.
    pub shape: Shape,
    /// Stroke and fill.
    pub style: Style,
    /// Every other wire attribute, carried verbatim.
    pub extra: WireObject,
}

impl CanvasObject {
    /// New unidentified object with no extra attributes.
    #[must_use]
    pub fn new(shape: Shape, style: Style) -> Self {
        Self { id: None, shape, style, extra: WireObject::new() }
    }

    #[must_use]
    pub fn rect(left: f64, top: f64, width: f64, height: f64, style: Style) -> Self {
        Self::new(Shape::Rect { left, top, width, height }, style)
    }

    #[must_use]
    pub fn ellipse(left: f64, top: f64, rx: f64, ry: f64, style: Style) -> Self {
        Self::new(Shape::Ellipse { left, top, rx, ry }, style)
    }

    #[must_use]
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, style: Style) -> Self {
        Self::new(Shape::Line { x1, y1, x2, y2 }, style)
    }

    #[must_use]
    pub fn path(points: Vec<Point>, style: Style) -> Self {
        Self::new(Shape::Path { points }, style)
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<ObjectId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.shape.kind()
    }

    /// Overwrite every attribute with `incoming`'s, keeping this object's
    /// identity. No per-field merge: the last writer wins wholesale.
    pub fn replace_attributes(&mut self, incoming: CanvasObject) {
        self.shape = incoming.shape;
        self.style = incoming.style;
        self.extra = incoming.extra;
    }

    /// Move the object by `(dx, dy)`. Used by hosts for drag edits.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.shape {
            Shape::Rect { left, top, .. } | Shape::Ellipse { left, top, .. } => {
                *left += dx;
                *top += dy;
            }
            Shape::Line { x1, y1, x2, y2 } => {
                *x1 += dx;
                *y1 += dy;
                *x2 += dx;
                *y2 += dy;
            }
            Shape::Path { points } => {
                for p in points {
                    p.x += dx;
                    p.y += dy;
                }
            }
            Shape::Other { .. } => {}
        }
    }
}

/// Handle naming one in-memory object instance inside a [`DocStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(u64);

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// In-memory store of live canvas objects.
///
/// Objects are kept in insertion order, which is also draw order, and are
/// indexed by `id` once they have one. At most one live instance per `id`.
#[derive(Debug, Default)]
pub struct DocStore {
    objects: BTreeMap<InstanceKey, CanvasObject>,
    by_id: HashMap<ObjectId, InstanceKey>,
    next_key: u64,
}

impl DocStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object and return its fresh instance key. If another
    /// instance already holds the same `id`, that instance is dropped.
    pub fn insert(&mut self, obj: CanvasObject) -> InstanceKey {
        let key = InstanceKey(self.next_key);
        self.next_key += 1;
        if let Some(id) = &obj.id {
            if let Some(displaced) = self.by_id.insert(id.clone(), key) {
                self.objects.remove(&displaced);
            }
        }
        self.objects.insert(key, obj);
        key
    }

    /// Remove an instance, returning the object if it was present.
    pub fn remove(&mut self, key: InstanceKey) -> Option<CanvasObject> {
        let obj = self.objects.remove(&key)?;
        if let Some(id) = &obj.id {
            self.by_id.remove(id);
        }
        Some(obj)
    }

    /// Remove by `id`, returning the object if it was present.
    pub fn remove_id(&mut self, id: &str) -> Option<CanvasObject> {
        let key = self.find(id)?;
        self.remove(key)
    }

    /// Resolve an `id` to the live instance holding it.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<InstanceKey> {
        self.by_id.get(id).copied()
    }

    #[must_use]
    pub fn get(&self, key: InstanceKey) -> Option<&CanvasObject> {
        self.objects.get(&key)
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&CanvasObject> {
        self.find(id).and_then(|key| self.objects.get(&key))
    }

    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Mutate an instance in place. The object's `id` is restored after `f`
    /// runs, so identity cannot change through this path. Returns false if
    /// the instance is gone.
    pub fn modify(&mut self, key: InstanceKey, f: impl FnOnce(&mut CanvasObject)) -> bool {
        let Some(obj) = self.objects.get_mut(&key) else {
            return false;
        };
        let id = obj.id.clone();
        f(obj);
        obj.id = id;
        true
    }

    /// Give an unidentified instance its `id`. Returns false if the instance
    /// is gone or already has one.
    pub fn assign_id(&mut self, key: InstanceKey, id: ObjectId) -> bool {
        if !self.objects.get(&key).is_some_and(|obj| obj.id.is_none()) {
            return false;
        }
        if let Some(displaced) = self.by_id.insert(id.clone(), key) {
            self.objects.remove(&displaced);
        }
        let Some(obj) = self.objects.get_mut(&key) else {
            return false;
        };
        obj.id = Some(id);
        true
    }

    /// Drop every object. Instance keys keep counting up.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.by_id.clear();
    }

    /// Objects in draw order.
    pub fn objects(&self) -> impl Iterator<Item = &CanvasObject> {
        self.objects.values()
    }

    /// Instance keys and objects in draw order.
    pub fn entries(&self) -> impl Iterator<Item = (InstanceKey, &CanvasObject)> {
        self.objects.iter().map(|(k, v)| (*k, v))
    }

    /// Ids of all identified objects in draw order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.values().filter_map(|o| o.id.clone()).collect()
    }

    /// Number of objects currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the store contains no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
