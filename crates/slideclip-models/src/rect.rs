use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A normalized rectangle (0.0 to 1.0) restricting scene analysis to part of
/// the frame, e.g. to ignore animated buttons in the lower half of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegionOfInterest {
    /// X coordinate of the top-left corner (0.0 = left, 1.0 = right)
    pub x: f64,
    /// Y coordinate of the top-left corner (0.0 = top, 1.0 = bottom)
    pub y: f64,
    /// Width of the rectangle (0.0 to 1.0)
    pub width: f64,
    /// Height of the rectangle (0.0 to 1.0)
    pub height: f64,
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self::upper_half()
    }
}

impl RegionOfInterest {
    /// Create a new region.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The whole frame.
    pub fn full_frame() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// The top half of the frame.
    pub fn upper_half() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.5)
    }

    /// Check if the region is valid (within 0.0-1.0 range).
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.001 // Allow small epsilon for float precision
            && self.y + self.height <= 1.001
    }

    /// Whether the region covers the whole frame.
    pub fn is_full_frame(&self) -> bool {
        self.x <= 0.0 && self.y <= 0.0 && self.width >= 1.0 && self.height >= 1.0
    }

    /// Pixel rectangle `(width, height, x, y)` for a frame of the given size.
    ///
    /// Width and height are at least one pixel and stay inside the frame.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (u32, u32, u32, u32) {
        let fw = f64::from(frame_width);
        let fh = f64::from(frame_height);

        let x = (self.x.clamp(0.0, 1.0) * fw).floor() as u32;
        let y = (self.y.clamp(0.0, 1.0) * fh).floor() as u32;
        let x = x.min(frame_width.saturating_sub(1));
        let y = y.min(frame_height.saturating_sub(1));

        let w = (self.width.clamp(0.0, 1.0) * fw).floor() as u32;
        let h = (self.height.clamp(0.0, 1.0) * fh).floor() as u32;
        let w = w.clamp(1, frame_width.saturating_sub(x).max(1));
        let h = h.clamp(1, frame_height.saturating_sub(y).max(1));

        (w, h, x, y)
    }
}
