//! Full-screen overlay for story and multi collectibles.
//!
//! The overlay is detected from colour counts alone. Its name line is drawn
//! at a slight tilt, so the frame is rotated back before the crop is read.

use anyhow::Result;

use crate::{ColorSignature, Image, Recognizer, ScreenLayout, filter};

pub const TEXT_WHITE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Celebration {
    Story,
    Multi,
}

pub fn detect(image: Image, layout: &ScreenLayout) -> Option<Celebration> {
    if !ColorSignature::CELEBRATION.matches(image.crop(layout.celebration_banner)) {
        return None;
    }

    if ColorSignature::STORY.matches(image.crop(layout.story_badge)) {
        Some(Celebration::Story)
    } else if ColorSignature::MULTI.matches(image.crop(layout.multi_badge)) {
        Some(Celebration::Multi)
    } else {
        log::debug!("celebration banner without a story or multi badge");
        None
    }
}

/// Read the overlay's name line. `tilt_degrees` is the clockwise correction.
pub fn name(image: Image, layout: &ScreenLayout, tilt_degrees: f32, ocr: &impl Recognizer) -> Result<String> {
    let upright = image.rotated(tilt_degrees);
    let bw = filter::monochrome(upright.as_image().crop(layout.story_text), TEXT_WHITE);
    ocr.recognize(bw.to_owned_image().as_image())
}
