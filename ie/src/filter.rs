//! Cheap pixel statistics that decide whether a crop deserves OCR.

use serde::{Deserialize, Serialize};

use crate::{Color, Image, OwnedImage};

/// Two-colour crop. Ink is what OCR should read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    ink: Vec<bool>,
}

impl Bitmap {
    pub fn from_fn(image: Image, is_ink: impl Fn(Color) -> bool) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            ink: image.pixels().map(is_ink).collect(),
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline(always)]
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.ink[(x + y * self.width) as usize]
    }

    pub fn ink_count(&self) -> usize {
        self.ink.iter().filter(|v| **v).count()
    }

    /// Black ink on white, the form OCR reads best.
    pub fn to_owned_image(&self) -> OwnedImage {
        let mut img = OwnedImage::new(self.width, self.height, Color::WHITE);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_ink(x, y) {
                    img.set(x, y, Color::BLACK);
                }
            }
        }
        img
    }
}

/// Ink where every channel is brighter than `white`.
pub fn monochrome(image: Image, white: u8) -> Bitmap {
    Bitmap::from_fn(image, |c| c.r > white && c.g > white && c.b > white)
}

/// Colour window for yellow dialogue text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tint {
    pub r_min: u8,
    pub g_min: u8,
    pub b_max: u8,
}

impl Tint {
    /// Regions whose scenery is itself yellowish.
    pub const STRICT: Self = Self::new(220, 220, 120);
    pub const MIDDLE: Self = Self::new(210, 210, 140);
    pub const LOOSE: Self = Self::new(200, 200, 150);

    pub const fn new(r_min: u8, g_min: u8, b_max: u8) -> Self {
        Self { r_min, g_min, b_max }
    }
}

/// Ink where the pixel falls inside the `tint` window.
pub fn tinted(image: Image, tint: Tint) -> Bitmap {
    Bitmap::from_fn(image, |c| c.r > tint.r_min && c.g > tint.g_min && c.b < tint.b_max)
}

// A row is part of the text box once it has more ink than this.
const ROW_INK: u32 = 20;
const COL_INK: u32 = 10;
const MIN_TOP: u32 = 3;
const MAX_TOP: u32 = 30;
const MIN_BOTTOM: u32 = 3;
const MIN_SIDE: u32 = 5;
const MIN_WIDTH: u32 = 30;
const PEAK_ROW: u32 = 20;
const MAX_EMPTY_ROWS: usize = 3;

/// Bounding-box and ink-density test for "this crop shows a line of text".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDensity {
    /// Minimum height of the text box.
    pub text_height: u32,
    pub lower: f32,
    pub upper: f32,
}

impl TextDensity {
    pub fn new(text_height: u32, (lower, upper): (f32, f32)) -> Self {
        Self {
            text_height,
            lower,
            upper,
        }
    }

    pub fn is_text(&self, bitmap: &Bitmap) -> bool {
        let (w, h) = (bitmap.width(), bitmap.height());
        let rows = (0..h)
            .map(|y| (0..w).filter(|x| bitmap.is_ink(*x, y)).count() as u32)
            .collect::<Vec<_>>();

        // No qualifying row leaves top at 0, which fails the margin check.
        let top = rows.iter().position(|v| *v > ROW_INK).unwrap_or(0) as u32;
        if !(MIN_TOP..=MAX_TOP).contains(&top) {
            return false;
        }
        let bottom = rows.iter().rposition(|v| *v > ROW_INK).unwrap_or(0) as u32;
        if bottom + MIN_BOTTOM >= h || bottom - top < self.text_height {
            return false;
        }

        let body = &rows[top as usize..bottom as usize];
        let peak = body.iter().max().copied().unwrap_or(0);
        if peak < PEAK_ROW || body.iter().filter(|v| **v == 0).count() > MAX_EMPTY_ROWS {
            return false;
        }

        let cols = (0..w)
            .map(|x| (top..bottom).filter(|y| bitmap.is_ink(x, *y)).count() as u32)
            .collect::<Vec<_>>();
        let left = cols.iter().position(|v| *v > COL_INK).unwrap_or(0) as u32;
        if left < MIN_SIDE {
            return false;
        }
        let right = cols.iter().rposition(|v| *v > COL_INK).unwrap_or(0) as u32;
        if right + MIN_SIDE >= w || right - left < MIN_WIDTH {
            return false;
        }

        let ink = cols[left as usize..right as usize].iter().sum::<u32>();
        let density = ink as f32 / ((bottom - top) * (right - left)) as f32;
        let pass = self.lower < density && density < self.upper;
        log::debug!("text density {density:.3} -> {}", if pass { "pass" } else { "reject" });
        pass
    }
}

/// Pixel counts of the three celebration colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorCounts {
    pub red: u32,
    pub white: u32,
    pub blue: u32,
}

impl ColorCounts {
    pub fn of(image: Image) -> Self {
        let mut counts = Self::default();
        for c in image.pixels() {
            let red = c.r > 200;
            let cyan = c.g > 200 && c.b > 200;
            match (red, cyan) {
                (true, true) => counts.white += 1,
                (true, false) => counts.red += 1,
                (false, true) => counts.blue += 1,
                (false, false) => {}
            }
        }
        counts
    }
}

/// Inclusive pixel-count ranges expected for one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSignature {
    pub red: (u32, u32),
    pub white: (u32, u32),
    pub blue: (u32, u32),
}

impl ColorSignature {
    /// Solid red banner present on every celebration overlay.
    pub const CELEBRATION: Self = Self {
        red: (4000, 6400),
        white: (0, 0),
        blue: (0, 0),
    };
    pub const STORY: Self = Self {
        red: (4350, 4600),
        white: (425, 700),
        blue: (425, 700),
    };
    pub const MULTI: Self = Self {
        red: (4050, 4250),
        white: (200, 500),
        blue: (700, 900),
    };

    pub fn matches(&self, image: Image) -> bool {
        let counts = ColorCounts::of(image);
        let within = |v: u32, (lo, hi): (u32, u32)| lo <= v && v <= hi;
        within(counts.red, self.red) && within(counts.white, self.white) && within(counts.blue, self.blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;

    /// Crop the size of the dialogue box with a striped block of `ink`.
    fn striped(block: Rect, ink: Color) -> OwnedImage {
        let mut img = OwnedImage::new(650, 50, Color::new(20, 20, 60));
        for x in (block.x..block.right()).step_by(2) {
            img.fill_rect(Rect::new(x, block.y, 1, block.h), ink);
        }
        img
    }

    fn logogram() -> TextDensity {
        TextDensity::new(20, (0.15, 0.75))
    }

    #[test]
    fn monochrome_keeps_only_bright_pixels() {
        let mut img = OwnedImage::new(3, 1, Color::WHITE);
        img.set(1, 0, Color::new(250, 250, 200));
        img.set(2, 0, Color::new(235, 235, 235));
        let bw = monochrome(img.as_image(), 230);
        assert!(bw.is_ink(0, 0) && !bw.is_ink(1, 0) && bw.is_ink(2, 0));
        assert!(!monochrome(img.as_image(), 240).is_ink(2, 0));

        let out = bw.to_owned_image();
        assert_eq!(out.as_image().get(0, 0), Color::BLACK);
        assert_eq!(out.as_image().get(1, 0), Color::WHITE);
    }

    #[test]
    fn tint_windows_are_exclusive() {
        let img = OwnedImage::new(1, 1, Color::new(215, 215, 130));
        assert!(tinted(img.as_image(), Tint::LOOSE).is_ink(0, 0));
        assert!(tinted(img.as_image(), Tint::MIDDLE).is_ink(0, 0));
        assert!(!tinted(img.as_image(), Tint::STRICT).is_ink(0, 0));

        let edge = OwnedImage::new(1, 1, Color::new(200, 250, 100));
        assert!(!tinted(edge.as_image(), Tint::LOOSE).is_ink(0, 0));
    }

    #[test]
    fn striped_line_is_text() {
        let img = striped(Rect::new(20, 10, 380, 30), Color::WHITE);
        let bw = monochrome(img.as_image(), 230);
        assert!(logogram().is_text(&bw));
        assert!(TextDensity::new(16, (0.10, 0.60)).is_text(&bw));
    }

    #[test]
    fn margins_are_required() {
        let top = striped(Rect::new(20, 1, 380, 30), Color::WHITE);
        assert!(!logogram().is_text(&monochrome(top.as_image(), 230)));

        let bottom = striped(Rect::new(20, 15, 380, 34), Color::WHITE);
        assert!(!logogram().is_text(&monochrome(bottom.as_image(), 230)));

        let left = striped(Rect::new(2, 10, 380, 30), Color::WHITE);
        assert!(!logogram().is_text(&monochrome(left.as_image(), 230)));

        let right = striped(Rect::new(260, 10, 390, 30), Color::WHITE);
        assert!(!logogram().is_text(&monochrome(right.as_image(), 230)));
    }

    #[test]
    fn short_or_blank_crops_are_rejected() {
        let short = striped(Rect::new(20, 10, 380, 12), Color::WHITE);
        assert!(!logogram().is_text(&monochrome(short.as_image(), 230)));

        let blank = OwnedImage::new(650, 50, Color::BLACK);
        assert!(!logogram().is_text(&monochrome(blank.as_image(), 230)));
    }

    #[test]
    fn density_outside_band_is_rejected() {
        let mut solid = OwnedImage::new(650, 50, Color::BLACK);
        solid.fill_rect(Rect::new(20, 10, 380, 30), Color::WHITE);
        assert!(!logogram().is_text(&monochrome(solid.as_image(), 230)));
    }

    #[test]
    fn gaps_inside_the_box_are_limited() {
        let mut img = striped(Rect::new(20, 10, 380, 30), Color::WHITE);
        img.fill_rect(Rect::new(0, 20, 650, 4), Color::BLACK);
        assert!(!logogram().is_text(&monochrome(img.as_image(), 230)));

        let mut img = striped(Rect::new(20, 10, 380, 30), Color::WHITE);
        img.fill_rect(Rect::new(0, 20, 650, 3), Color::BLACK);
        assert!(logogram().is_text(&monochrome(img.as_image(), 230)));
    }

    #[test]
    fn celebration_signatures() {
        let red = Color::new(230, 20, 20);
        let banner = OwnedImage::new(128, 50, red);
        assert!(ColorSignature::CELEBRATION.matches(banner.as_image()));

        let mut tainted = banner.clone();
        tainted.set(3, 3, Color::WHITE);
        assert!(!ColorSignature::CELEBRATION.matches(tainted.as_image()));

        // 50x128 badge: 4400 red, 500 white, 500 blue, rest dark.
        let mut badge = OwnedImage::new(50, 128, Color::BLACK);
        badge.fill_rect(Rect::new(0, 0, 50, 88), red);
        badge.fill_rect(Rect::new(0, 88, 50, 10), Color::WHITE);
        badge.fill_rect(Rect::new(0, 98, 50, 10), Color::new(40, 230, 240));
        assert_eq!(
            ColorCounts::of(badge.as_image()),
            ColorCounts {
                red: 4400,
                white: 500,
                blue: 500
            }
        );
        assert!(ColorSignature::STORY.matches(badge.as_image()));
        assert!(!ColorSignature::MULTI.matches(badge.as_image()));
    }
}
