//! Image primitives.
//!
//! Frames are kept as a lightweight owned RGB raster (`OwnedImage`). Every
//! check works on a borrowed view (`Image<'a>`) of a region of interest, so a
//! frame is cropped many times per cycle without copying pixels. Copies are
//! only made when a crop is binarized, rotated, resized, or handed to OCR.

use anyhow::{Context, Result};

use crate::Rect;

pub struct OwnedMask(pub Vec<u8>);
#[derive(Clone, Copy)]
pub struct Mask<'a>(pub &'a [u8]);

impl OwnedMask {
    pub fn as_mask(&self) -> Mask<'_> {
        Mask(&self.0)
    }
}

impl Mask<'_> {
    #[inline]
    fn is_set(&self, i: usize) -> bool {
        ((self.0[i / 8] >> (i % 8)) & 1) == 1
    }
}

/// Owned RGB image (no alpha).
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        Self {
            width,
            height,
            data: vec![fill; (width * height) as usize],
        }
    }

    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = bytes.len() / width.max(1) / 4;
        let data = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    pub fn from_rgb_image(img: &image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img
            .pixels()
            .map(|p| Color::new(p.0[0], p.0[1], p.0[2]))
            .collect();

        Self {
            width,
            height,
            data,
        }
    }

    /// Load an RGBA PNG and return an `(OwnedImage, OwnedMask)` pair.
    ///
    /// The mask is a packed bitset (row-major) where each bit indicates whether
    /// the original alpha value was >= `alpha_threshold`.
    pub fn from_png_mask(bytes: &[u8], alpha_threshold: u8) -> Result<(Self, OwnedMask)> {
        let img = image::load_from_memory(bytes)
            .context("decode png (with alpha)")?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let mut data = Vec::with_capacity((width * height) as usize);
        let mut mask = vec![0u8; (width * height) as usize / 8 + 1];

        for (i, p) in img.pixels().enumerate() {
            let [r, g, b, a] = p.0;
            data.push(Color::new(r, g, b));
            if a >= alpha_threshold {
                mask[i / 8] |= 1 << (i % 8);
            }
        }

        Ok((
            Self {
                width,
                height,
                data,
            },
            OwnedMask(mask),
        ))
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            self.data[(x + y * self.width) as usize] = color;
        }
    }

    /// Paint `rect`, clipped to the image.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        for y in rect.y..rect.bottom().min(self.height) {
            for x in rect.x..rect.right().min(self.width) {
                self.data[(x + y * self.width) as usize] = color;
            }
        }
    }

    /// Resize to exactly `width` x `height`.
    ///
    /// Uses `fast_image_resize` (SIMD-optimized) and keeps output in `Vec<Color>`.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self> {
        if self.width == width && self.height == height {
            return Ok(self.clone());
        }

        let width = width.max(1);
        let height = height.max(1);

        // SAFETY: `Color` is `#[repr(C)]` with 3 x `u8`, so it is layout-compatible
        // with `fast_image_resize::pixels::U8x3` (alignment 1).
        let src_pixels = unsafe {
            std::slice::from_raw_parts(
                self.data.as_ptr() as *const fast_image_resize::pixels::U8x3,
                self.data.len(),
            )
        };

        let src = fast_image_resize::images::ImageRef::from_pixels(self.width, self.height, src_pixels)
            .context("fast_image_resize: wrap source pixels")?;

        let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);

        let mut resizer = fast_image_resize::Resizer::new();
        let options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
        );

        resizer
            .resize(&src, &mut dst, &Some(options))
            .context("fast_image_resize: resize")?;

        let data = dst
            .into_vec()
            .chunks_exact(3)
            .map(|px| Color::new(px[0], px[1], px[2]))
            .collect();

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self.data[(x + y * self.width) as usize];
            image::Rgb([c.r, c.g, c.b])
        })
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image<'a>(&'a self) -> Image<'a> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    #[inline(always)]
    fn pixel(&self, x: u32, y: u32) -> &Color {
        &self.data[(x + y * self.true_width) as usize]
    }

    /// Pixel at view-relative coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        *self.pixel(self.x1 + x, self.y1 + y)
    }

    /// Row-major pixels of the view.
    pub fn pixels(&self) -> impl Iterator<Item = Color> + 'a {
        let Self { x1, y1, x2, y2, true_width, data } = *self;
        (y1..y2).flat_map(move |y| (x1..x2).map(move |x| data[(x + y * true_width) as usize]))
    }

    pub fn to_owned_image(self) -> OwnedImage {
        OwnedImage {
            width: self.width(),
            height: self.height(),
            data: self.pixels().collect(),
        }
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        self.pixels().flat_map(|c| [c.r, c.g, c.b]).collect()
    }

    /// Create an arbitrary subimage (relative coordinates).
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }

    #[inline]
    pub fn crop(&self, rect: Rect) -> Self {
        self.sub_image(rect.x, rect.y, rect.w, rect.h)
    }

    /// Rotate clockwise by `degrees` about the view's center. Uncovered corners
    /// are filled with black.
    pub fn rotated(&self, degrees: f32) -> OwnedImage {
        let rgb = self.to_owned_image().to_rgb_image();
        let rotated = imageproc::geometric_transformations::rotate_about_center(
            &rgb,
            degrees.to_radians(),
            imageproc::geometric_transformations::Interpolation::Nearest,
            image::Rgb([0, 0, 0]),
        );
        OwnedImage::from_rgb_image(&rotated)
    }

    /// Fraction of masked pixels that differ between `self` and `other`.
    ///
    /// Returns `1.0` when the sizes differ or the mask is empty.
    pub fn mismatch_masked(&self, other: Image, mask: Mask) -> f32 {
        if self.width() != other.width() || self.height() != other.height() {
            return 1.0;
        }

        let mut count = 0u32;
        let mut mismatched = 0u32;

        let mut i = 0usize;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let yes = mask.is_set(i);
                i += 1;
                if !yes {
                    continue;
                }

                if self.get(x, y) != other.get(x, y) {
                    mismatched += 1;
                }
                count += 1;
            }
        }

        if count == 0 {
            return 1.0;
        }
        mismatched as f32 / count as f32
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn channel_sum(&self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> OwnedImage {
        let mut img = OwnedImage::new(width, height, Color::BLACK);
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    img.set(x, y, Color::WHITE);
                }
            }
        }
        img
    }

    #[test]
    fn sub_image_is_clamped() {
        let img = checker(10, 8);
        let view = img.as_image().sub_image(6, 5, 10, 10);
        assert_eq!((view.width(), view.height()), (4, 3));
        assert_eq!(view.get(0, 0), Color::BLACK);
        assert_eq!(view.get(1, 0), Color::WHITE);

        let nested = view.crop(Rect::new(1, 1, 2, 2));
        assert_eq!(nested.get(0, 0), img.as_image().get(7, 6));
        assert_eq!(nested.to_owned_image().width(), 2);
    }

    #[test]
    fn from_rgba_drops_alpha() {
        let bytes = [1, 2, 3, 255, 4, 5, 6, 0, 7, 8, 9, 128, 10, 11, 12, 1];
        let img = OwnedImage::from_rgba(2, &bytes);
        assert_eq!((img.width(), img.height()), (2, 2));
        assert_eq!(img.as_image().get(1, 1), Color::new(10, 11, 12));
        assert_eq!(img.as_image().get_bytes().len(), 12);
    }

    #[test]
    fn resized_hits_exact_size() {
        let img = OwnedImage::new(1920, 1080, Color::new(40, 80, 120));
        let out = img.resized(1280, 720).unwrap();
        assert_eq!((out.width(), out.height()), (1280, 720));
        assert_eq!(out.as_image().get(640, 360), Color::new(40, 80, 120));
    }

    #[test]
    fn rotation_keeps_size_and_center() {
        let mut img = OwnedImage::new(101, 51, Color::BLACK);
        img.fill_rect(Rect::new(49, 24, 3, 3), Color::WHITE);
        let out = img.as_image().rotated(3.0);
        assert_eq!((out.width(), out.height()), (101, 51));
        assert_eq!(out.as_image().get(50, 25), Color::WHITE);
    }

    #[test]
    fn png_mask_and_mismatch() {
        let mut rgba = image::RgbaImage::new(4, 1);
        rgba.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        rgba.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        rgba.put_pixel(2, 0, image::Rgba([0, 0, 0, 0]));
        rgba.put_pixel(3, 0, image::Rgba([255, 255, 255, 255]));
        let mut png = Vec::new();
        rgba.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let (template, mask) = OwnedImage::from_png_mask(&png, 128).unwrap();

        let mut crop = OwnedImage::new(4, 1, Color::WHITE);
        crop.set(1, 0, Color::BLACK);
        assert_eq!(crop.as_image().mismatch_masked(template.as_image(), mask.as_mask()), 0.0);

        // Unmasked pixel changes are ignored; masked ones count.
        crop.set(2, 0, Color::BLACK);
        crop.set(3, 0, Color::BLACK);
        let mismatch = crop.as_image().mismatch_masked(template.as_image(), mask.as_mask());
        assert!((mismatch - 1.0 / 3.0).abs() < 1e-6);

        let small = OwnedImage::new(2, 1, Color::WHITE);
        assert_eq!(small.as_image().mismatch_masked(template.as_image(), mask.as_mask()), 1.0);
    }
}
