//! Regions of interest on a normalized frame.

use serde::{Deserialize, Serialize};

/// Frames are resized to this resolution before any region is cropped.
pub const REFERENCE_WIDTH: u32 = 1280;
pub const REFERENCE_HEIGHT: u32 = 720;

/// Axis-aligned rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning `(x1, y1)` inclusive to `(x2, y2)` exclusive.
    pub const fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
}

/// Where each check looks on a reference-sized frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenLayout {
    /// Region emblem next to the coin counter. Must match the classifier's
    /// 50x50 input.
    pub region_emblem: Rect,
    /// Name line shown when a collectible is picked up.
    pub collectible_name: Rect,
    /// Corner of the full-screen celebration overlay.
    pub celebration_banner: Rect,
    pub story_badge: Rect,
    pub multi_badge: Rect,
    /// Name line of the celebration overlay, after tilt correction.
    pub story_text: Rect,
    /// Dialogue box of the informant.
    pub narration: Rect,
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            region_emblem: Rect::from_corners(161, 27, 211, 77),
            collectible_name: Rect::from_corners(400, 525, 900, 575),
            celebration_banner: Rect::from_corners(0, 0, 128, 50),
            story_badge: Rect::from_corners(210, 240, 260, 368),
            multi_badge: Rect::from_corners(870, 170, 950, 250),
            story_text: Rect::from_corners(300, 550, 950, 610),
            narration: Rect::from_corners(350, 565, 1000, 615),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fit_the_reference_frame() {
        let layout = ScreenLayout::default();
        assert_eq!((layout.region_emblem.w, layout.region_emblem.h), (50, 50));
        for rect in [
            layout.region_emblem,
            layout.collectible_name,
            layout.celebration_banner,
            layout.story_badge,
            layout.multi_badge,
            layout.story_text,
            layout.narration,
        ] {
            assert!(rect.right() <= REFERENCE_WIDTH && rect.bottom() <= REFERENCE_HEIGHT, "{rect:?}");
        }
    }

    #[test]
    fn partial_layouts_keep_defaults() {
        let layout: ScreenLayout = serde_json::from_str(r#"{"narration": {"x": 1, "y": 2, "w": 3, "h": 4}}"#).unwrap();
        assert_eq!(layout.narration, Rect::new(1, 2, 3, 4));
        assert_eq!(layout.story_text, ScreenLayout::default().story_text);
    }
}
