use crate::{Image, OwnedImage, ScreenLayout, filter};

/// Emblem pixels brighter than this on every channel become ink.
pub const EMBLEM_WHITE: u8 = 240;

/// Monochrome region emblem, the classifier's input.
pub fn emblem(image: Image, layout: &ScreenLayout) -> OwnedImage {
    filter::monochrome(image.crop(layout.region_emblem), EMBLEM_WHITE).to_owned_image()
}
