use serde::{Deserialize, Serialize};

/// Axis-aligned page rectangle. `y` grows downward, so a smaller `y0` is higher on the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalOrder {
    Above,
    Below,
    Level,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Builds a box from a raw `[x1, y1, x2, y2]` list. Short lists carry no usable geometry.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x0, y0, x1, y1, ..] => Some(Self::new(*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Where `self` sits relative to `other`, compared by top edge.
    pub fn vertical_order(&self, other: &Self) -> VerticalOrder {
        if self.y0 < other.y0 {
            VerticalOrder::Above
        } else if self.y0 > other.y0 {
            VerticalOrder::Below
        } else {
            VerticalOrder::Level
        }
    }
}

impl From<[f32; 4]> for BBox {
    fn from(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.x0, bbox.y0, bbox.x1, bbox.y1]
    }
}
