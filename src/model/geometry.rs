//! Geometry primitives shared by the resolver, the host surface and the runtime
//!
//! All boxes are in viewport coordinates (what a bounding-client-rect query
//! returns). Document coordinates are derived by adding the viewport's
//! scroll offsets.

use serde::{Deserialize, Serialize};

/// Opaque handle for a node in the host's tree (anchor, content, container)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A box of the given size at the origin
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Zero-area boxes come from detached or hidden nodes
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.left && px < self.right() && py >= self.top && py < self.bottom()
    }

    /// Same size, moved to `origin`
    pub fn at(&self, origin: Point) -> Self {
        Self::new(origin.left, origin.top, self.width, self.height)
    }
}

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A `{left, top}` position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub left: f32,
    pub top: f32,
}

impl Point {
    pub fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }

    pub fn offset(self, by: Offset) -> Self {
        Self::new(self.left + by.left, self.top + by.top)
    }
}

/// Fixed `{top, left}` nudge applied after side placement
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub left: f32,
}

impl Offset {
    pub fn new(top: f32, left: f32) -> Self {
        Self { top, left }
    }
}

/// Visible area plus its scroll position within the document
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub scroll_left: f32,
    #[serde(default)]
    pub scroll_top: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_left: 0.0,
            scroll_top: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_left: f32, scroll_top: f32) -> Self {
        self.scroll_left = scroll_left;
        self.scroll_top = scroll_top;
        self
    }

    /// True if `rect` crosses any viewport edge
    pub fn overflows(&self, rect: &Rect) -> bool {
        rect.left < 0.0
            || rect.top < 0.0
            || rect.right() > self.width
            || rect.bottom() > self.height
    }

    /// Convert a viewport position into document coordinates
    pub fn to_document(&self, point: Point) -> Point {
        Point::new(point.left + self.scroll_left, point.top + self.scroll_top)
    }
}
