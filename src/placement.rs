//! Adaptive side placement for anchored overlays
//!
//! Computes where a floating panel goes relative to its anchor: the desired
//! side is tried first, then the fallback order, stopping at the first side
//! whose box stays inside the viewport. Pure and deterministic; the
//! lifecycle controller feeds it geometry read from the host surface.

use serde::{Deserialize, Serialize};

use crate::model::geometry::{Offset, Point, Rect, Size, Viewport};

/// Anchor-relative side an overlay is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    #[default]
    Right,
}

/// Main axis of a side: the axis the overlay is pushed along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    fn axis(self) -> Axis {
        match self {
            Side::Top | Side::Bottom => Axis::Vertical,
            Side::Left | Side::Right => Axis::Horizontal,
        }
    }

    /// Whether the overlay sits before the anchor along the main axis
    fn is_leading(self) -> bool {
        matches!(self, Side::Top | Side::Left)
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Priority list used when the caller does not supply one
    ///
    /// Opposite side first, then the two sides of the other axis.
    pub fn default_fallback(self) -> [Side; 4] {
        match self {
            Side::Top => [Side::Top, Side::Bottom, Side::Right, Side::Left],
            Side::Bottom => [Side::Bottom, Side::Top, Side::Right, Side::Left],
            Side::Left => [Side::Left, Side::Right, Side::Top, Side::Bottom],
            Side::Right => [Side::Right, Side::Left, Side::Top, Side::Bottom],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Side::Top),
            "bottom" => Ok(Side::Bottom),
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

/// Input to [`resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest<'a> {
    pub anchor: Rect,
    pub overlay: Size,
    pub viewport: Viewport,
    pub side: Side,
    pub fallback_order: &'a [Side],
    pub offset: Offset,
    /// Corner inset subtracted twice from the arrow offset (panel border radius)
    pub arrow_inset: f32,
}

impl<'a> PlacementRequest<'a> {
    pub fn new(anchor: Rect, overlay: Size, viewport: Viewport, side: Side) -> Self {
        Self {
            anchor,
            overlay,
            viewport,
            side,
            fallback_order: &[],
            offset: Offset::default(),
            arrow_inset: 0.0,
        }
    }

    pub fn with_fallback(mut self, order: &'a [Side]) -> Self {
        self.fallback_order = order;
        self
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_arrow_inset(mut self, inset: f32) -> Self {
        self.arrow_inset = inset;
        self
    }

    /// Sides in the order they will be tried: desired first, no repeats
    fn candidates(&self) -> Vec<Side> {
        let mut sides = Vec::with_capacity(4);
        for side in std::iter::once(self.side).chain(self.fallback_order.iter().copied()) {
            if !sides.contains(&side) {
                sides.push(side);
            }
        }
        sides
    }

    pub fn resolve(&self) -> PlacementResult {
        let mut attempts = Vec::with_capacity(4);

        for side in self.candidates() {
            let position = candidate_position(&self.anchor, self.overlay, side).offset(self.offset);
            let out_of_bounds = self.viewport.overflows(&Rect::new(
                position.left,
                position.top,
                self.overlay.width,
                self.overlay.height,
            ));
            attempts.push(Attempt {
                side,
                position,
                out_of_bounds,
            });
            if !out_of_bounds {
                break;
            }
        }

        // candidates() always yields the desired side
        let last = attempts[attempts.len() - 1];
        let (arrow_offset, flipped) =
            arrow_geometry(&self.anchor, last.position, last.side, self.arrow_inset);

        PlacementResult {
            position: last.position,
            side: last.side,
            attempts,
            arrow_offset,
            flipped,
        }
    }
}

/// One side that was tried during resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub side: Side,
    pub position: Point,
    pub out_of_bounds: bool,
}

/// Output of [`resolve`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    /// Overlay top-left in viewport coordinates
    pub position: Point,
    /// Side actually used; differs from the desired one after fallback
    pub side: Side,
    /// Every side tried, in order, with its out-of-bounds flag
    pub attempts: Vec<Attempt>,
    /// Arrow distance from the overlay's cross-axis leading edge
    pub arrow_offset: f32,
    /// Overlay starts before the anchor along the main axis
    pub flipped: bool,
}

impl PlacementResult {
    /// True if the chosen side keeps the overlay inside the viewport
    pub fn fits(&self) -> bool {
        self.attempts.last().is_some_and(|a| !a.out_of_bounds)
    }

    pub fn document_position(&self, viewport: &Viewport) -> Point {
        viewport.to_document(self.position)
    }
}

/// Resolve placement for `side`, falling back through `fallback_order`
pub fn resolve(
    anchor: Rect,
    overlay: Size,
    viewport: Viewport,
    side: Side,
    fallback_order: &[Side],
    offset: Offset,
) -> PlacementResult {
    PlacementRequest::new(anchor, overlay, viewport, side)
        .with_fallback(fallback_order)
        .with_offset(offset)
        .resolve()
}

/// Flush on the main axis, centered on the cross axis
fn candidate_position(anchor: &Rect, overlay: Size, side: Side) -> Point {
    let (a_main, a_main_len, a_cross, a_cross_len, o_main_len, o_cross_len) = match side.axis() {
        Axis::Vertical => (
            anchor.top,
            anchor.height,
            anchor.left,
            anchor.width,
            overlay.height,
            overlay.width,
        ),
        Axis::Horizontal => (
            anchor.left,
            anchor.width,
            anchor.top,
            anchor.height,
            overlay.width,
            overlay.height,
        ),
    };

    let main = if side.is_leading() {
        a_main - o_main_len
    } else {
        a_main + a_main_len
    };
    let cross = a_cross + (a_cross_len - o_cross_len) / 2.0;

    match side.axis() {
        Axis::Vertical => Point::new(cross, main),
        Axis::Horizontal => Point::new(main, cross),
    }
}

/// Arrow offset along the cross axis and the flipped flag along the main axis
fn arrow_geometry(anchor: &Rect, position: Point, side: Side, inset: f32) -> (f32, bool) {
    let (a_cross, o_cross, a_main, o_main) = match side.axis() {
        Axis::Vertical => (anchor.left, position.left, anchor.top, position.top),
        Axis::Horizontal => (anchor.top, position.top, anchor.left, position.left),
    };

    let arrow_offset = if o_cross < a_cross {
        (a_cross - o_cross - inset * 2.0).max(0.0)
    } else {
        0.0
    };

    (arrow_offset, o_main < a_main)
}
