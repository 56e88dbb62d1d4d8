//! Region emblem classification.
//!
//! A [`RegionModel`] maps the monochrome emblem crop to a probability vector
//! whose last class means "indeterminate". [`RegionClassifier`] turns that
//! vector into an optional class index. Debouncing belongs to the caller.

use std::path::Path;

use anyhow::{Context, Result};

use crate::{Image, OwnedImage, OwnedMask};

pub trait RegionModel {
    /// One probability per class, indeterminate last.
    fn probabilities(&self, crop: Image<'_>) -> Result<Vec<f32>>;
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.iter().map(|v| (v - max).exp()).collect::<Vec<_>>();
    let total = exps.iter().sum::<f32>();
    exps.into_iter().map(|v| v / total).collect()
}

pub struct RegionClassifier<M> {
    model: M,
    classes: usize,
    certainty: f32,
}

impl<M: RegionModel> RegionClassifier<M> {
    /// `classes` counts the indeterminate class.
    pub fn new(model: M, classes: usize, certainty: f32) -> Self {
        Self {
            model,
            classes,
            certainty,
        }
    }

    pub fn set_certainty(&mut self, certainty: f32) {
        self.certainty = certainty;
    }

    /// Index of the winning class, or `None` when the model fails, lands on
    /// the indeterminate class, or is less sure than the certainty floor.
    pub fn classify(&self, crop: Image<'_>) -> Option<usize> {
        let probabilities = match self.model.probabilities(crop) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("region classifier failed: {err:#}");
                return None;
            }
        };
        if probabilities.len() != self.classes {
            log::warn!("region classifier returned {} classes, expected {}", probabilities.len(), self.classes);
            return None;
        }

        let (index, p) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        if index + 1 == self.classes || p < self.certainty {
            log::debug!("region class {index} at {p:.3} not accepted");
            return None;
        }
        Some(index)
    }
}

/// Nearest-template model over masked emblem images.
///
/// Logits are the negated masked mismatch scaled by `sharpness`; the
/// indeterminate class sits at a fixed mismatch `cutoff`, so a crop unlike
/// every template ends up indeterminate.
pub struct TemplateModel {
    templates: Vec<(OwnedImage, OwnedMask)>,
    sharpness: f32,
    cutoff: f32,
}

impl TemplateModel {
    pub const SHARPNESS: f32 = 40.0;
    pub const CUTOFF: f32 = 0.2;

    pub fn new(templates: Vec<(OwnedImage, OwnedMask)>) -> Self {
        Self {
            templates,
            sharpness: Self::SHARPNESS,
            cutoff: Self::CUTOFF,
        }
    }

    /// Load `<dir>/<class>.png` for every real class. Alpha selects the
    /// pixels that take part in the comparison.
    pub fn load(dir: impl AsRef<Path>, classes: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let templates = (0..classes.saturating_sub(1))
            .map(|i| {
                let path = dir.join(format!("{i}.png"));
                let bytes = std::fs::read(&path).with_context(|| format!("read region template {}", path.display()))?;
                OwnedImage::from_png_mask(&bytes, 128).with_context(|| format!("decode region template {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(templates))
    }
}

impl RegionModel for TemplateModel {
    fn probabilities(&self, crop: Image<'_>) -> Result<Vec<f32>> {
        let mut logits = self
            .templates
            .iter()
            .map(|(template, mask)| -crop.mismatch_masked(template.as_image(), mask.as_mask()) * self.sharpness)
            .collect::<Vec<_>>();
        logits.push(-self.cutoff * self.sharpness);
        Ok(softmax(&logits))
    }
}

/// The pretrained emblem classifier exported to ONNX.
///
/// Input is `[1, 3, H, W]` raw channel values (0-255 as floats).
#[cfg(feature = "onnx")]
pub struct OnnxModel {
    session: std::sync::Mutex<ort::session::Session>,
}

#[cfg(feature = "onnx")]
impl OnnxModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let session = ort::session::Session::builder()?
            .commit_from_file(path)
            .with_context(|| format!("load region model {}", path.display()))?;
        Ok(Self {
            session: std::sync::Mutex::new(session),
        })
    }
}

#[cfg(feature = "onnx")]
impl RegionModel for OnnxModel {
    fn probabilities(&self, crop: Image<'_>) -> Result<Vec<f32>> {
        let (w, h) = (crop.width() as usize, crop.height() as usize);
        let plane = w * h;
        let mut data = vec![0f32; plane * 3];
        for (i, c) in crop.pixels().enumerate() {
            data[i] = c.r as f32;
            data[plane + i] = c.g as f32;
            data[plane * 2 + i] = c.b as f32;
        }

        let input = ort::value::Tensor::from_array(([1usize, 3, h, w], data))?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("region model session poisoned"))?;
        let outputs = session.run(ort::inputs![input])?;
        let (_, logits) = outputs[0].try_extract_tensor::<f32>()?;
        Ok(softmax(logits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Rect};

    struct Fixed(anyhow::Result<Vec<f32>>);

    impl RegionModel for Fixed {
        fn probabilities(&self, _: Image<'_>) -> Result<Vec<f32>> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    fn crop() -> OwnedImage {
        OwnedImage::new(50, 50, Color::WHITE)
    }

    fn classifier(probabilities: Vec<f32>) -> RegionClassifier<Fixed> {
        RegionClassifier::new(Fixed(Ok(probabilities)), 4, 0.85)
    }

    #[test]
    fn certain_class_is_returned() {
        let c = classifier(vec![0.02, 0.95, 0.02, 0.01]);
        assert_eq!(c.classify(crop().as_image()), Some(1));
        let c = classifier(vec![0.85, 0.05, 0.05, 0.05]);
        assert_eq!(c.classify(crop().as_image()), Some(0));
    }

    #[test]
    fn uncertain_or_indeterminate_is_none() {
        assert_eq!(classifier(vec![0.3, 0.6, 0.05, 0.05]).classify(crop().as_image()), None);
        assert_eq!(classifier(vec![0.01, 0.01, 0.01, 0.97]).classify(crop().as_image()), None);
    }

    #[test]
    fn model_faults_are_none() {
        assert_eq!(classifier(vec![0.0, 1.0]).classify(crop().as_image()), None);
        let failing = RegionClassifier::new(Fixed(Err(anyhow::anyhow!("boom"))), 4, 0.85);
        assert_eq!(failing.classify(crop().as_image()), None);
    }

    fn emblem(offset: u32) -> (OwnedImage, OwnedMask) {
        let mut img = OwnedImage::new(50, 50, Color::WHITE);
        img.fill_rect(Rect::new(offset, 10, 10, 30), Color::BLACK);
        let mask = OwnedMask(vec![0xff; 50 * 50 / 8 + 1]);
        (img, mask)
    }

    #[test]
    fn templates_pick_the_closest_emblem() {
        let model = TemplateModel::new(vec![emblem(5), emblem(20), emblem(35)]);
        let classifier = RegionClassifier::new(model, 4, 0.85);

        let (seen, _) = emblem(20);
        assert_eq!(classifier.classify(seen.as_image()), Some(1));

        // Nothing like any template: indeterminate wins.
        let mut noise = OwnedImage::new(50, 50, Color::BLACK);
        noise.fill_rect(Rect::new(0, 0, 50, 5), Color::WHITE);
        assert_eq!(classifier.classify(noise.as_image()), None);
    }

    #[test]
    fn softmax_is_normalized() {
        let p = softmax(&[1.0, 1.0, 1.0, 1.0]);
        assert!(p.iter().all(|v| (*v - 0.25).abs() < 1e-6));
        let p = softmax(&[1000.0, 0.0]);
        assert!((p[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn load_reports_missing_templates() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateModel::load(dir.path(), 4).err().unwrap();
        assert!(format!("{err:#}").contains("0.png"));
    }
}
