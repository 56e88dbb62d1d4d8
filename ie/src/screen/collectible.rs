//! Name banner shown when a regular collectible is picked up.

use anyhow::Result;

use crate::{Image, Recognizer, ScreenLayout, TextDensity, filter};

/// The banner text is slightly off-white, so the cutoff is lower than for
/// the emblem.
pub const NAME_WHITE: u8 = 230;

/// Text of the pickup banner, or `None` when the crop does not look like a
/// line of text.
pub fn name(image: Image, layout: &ScreenLayout, density: &TextDensity, ocr: &impl Recognizer) -> Result<Option<String>> {
    let bw = filter::monochrome(image.crop(layout.collectible_name), NAME_WHITE);
    if !density.is_text(&bw) {
        return Ok(None);
    }

    ocr.recognize(bw.to_owned_image().as_image()).map(Some)
}
