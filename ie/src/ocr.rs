//! OCR wrapper.
//!
//! The default engine is `ocr-rs` (Rust PaddleOCR bindings). The checks only
//! need plain text out of a prepared crop, so the engine sits behind the
//! [`Recognizer`] trait and can be swapped in tests.

use std::path::Path;

use anyhow::{Context, Result};

use crate::Image;

/// Turns a binarized crop into text.
pub trait Recognizer {
    /// Recognized fragments concatenated in reading order, without positions.
    fn recognize(&self, image: Image<'_>) -> Result<String>;
}

pub struct Ocr {
    engine: ocr_rs::OcrEngine,
}

impl Ocr {
    /// Initialize the OCR engine with the given model paths.
    ///
    /// The recognition model and charset select the script; pick them from
    /// the source language's OCR code.
    pub fn try_new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charset: impl AsRef<Path>,
    ) -> Result<Self> {
        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let engine = ocr_rs::OcrEngine::new(
            detection,
            recognition,
            charset,
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                thread_count: thread_count as i32,
                // Crops are already binarized, so High mostly pays off on the
                // smaller dialogue glyphs.
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: thread_count > 1,
                min_result_confidence: 0.5,
                ..Default::default()
            }),
        )
        .context("failed to initialize OCR engine (missing or invalid model files?)")?;

        Ok(Self { engine })
    }
}

impl Recognizer for Ocr {
    fn recognize(&self, image: Image<'_>) -> Result<String> {
        let image = ocr_rs::preprocess::rgb_to_image(&image.get_bytes(), image.width(), image.height());

        let results = self.engine.recognize(&image).context("OCR recognize")?;
        Ok(results.into_iter().map(|v| v.text).collect::<String>())
    }
}
