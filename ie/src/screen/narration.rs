use anyhow::Result;

use crate::{Bitmap, Image, Recognizer, ScreenLayout, TextDensity, Tint, filter};

/// Yellow dialogue text of the informant's box.
pub fn ink(image: Image, layout: &ScreenLayout, tint: Tint) -> Bitmap {
    filter::tinted(image.crop(layout.narration), tint)
}

/// Second-opinion density gate, then OCR.
pub fn name(bitmap: &Bitmap, density: &TextDensity, ocr: &impl Recognizer) -> Result<Option<String>> {
    if !density.is_text(bitmap) {
        return Ok(None);
    }

    ocr.recognize(bitmap.to_owned_image().as_image()).map(Some)
}
