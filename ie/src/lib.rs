mod borders;
pub use borders::*;
mod classifier;
pub use classifier::*;
mod filter;
pub use filter::*;
mod image;
pub use self::image::*;
mod layout;
pub use layout::*;
mod ocr;
pub use ocr::*;

pub mod screen;

pub use screen::celebration::Celebration;

/// Screen reader for one configured language and layout.
pub struct Ie<R = Ocr> {
	layout: ScreenLayout,
	density: TextDensity,
	ocr: R,
}

impl Ie<Ocr> {
	pub fn try_new(
		layout: ScreenLayout,
		density: TextDensity,
		ocr_detection: impl AsRef<std::path::Path>,
		ocr_recognition: impl AsRef<std::path::Path>,
		ocr_charset: impl AsRef<std::path::Path>,
	) -> anyhow::Result<Self> {
		Ok(Self::new(layout, density, Ocr::try_new(ocr_detection, ocr_recognition, ocr_charset)?))
	}
}

impl<R: Recognizer> Ie<R> {
	pub fn new(layout: ScreenLayout, density: TextDensity, ocr: R) -> Self {
		Self { layout, density, ocr }
	}

	pub fn layout(&self) -> &ScreenLayout {
		&self.layout
	}

	pub fn density(&self) -> &TextDensity {
		&self.density
	}

	pub fn set_layout(&mut self, layout: ScreenLayout) {
		self.layout = layout;
	}

	pub fn set_density(&mut self, density: TextDensity) {
		self.density = density;
	}

	pub fn region_emblem(&self, image: Image) -> OwnedImage {
		screen::emblem::emblem(image, &self.layout)
	}

	pub fn collectible_name(&self, image: Image) -> anyhow::Result<Option<String>> {
		screen::collectible::name(image, &self.layout, &self.density, &self.ocr)
	}

	/// Cheap colour check for the story/multi overlay (no OCR).
	pub fn celebration(&self, image: Image) -> Option<Celebration> {
		screen::celebration::detect(image, &self.layout)
	}

	pub fn celebration_name(&self, image: Image, tilt_degrees: f32) -> anyhow::Result<String> {
		screen::celebration::name(image, &self.layout, tilt_degrees, &self.ocr)
	}

	pub fn narration_ink(&self, image: Image, tint: Tint) -> Bitmap {
		screen::narration::ink(image, &self.layout, tint)
	}

	pub fn narration_name(&self, ink: &Bitmap) -> anyhow::Result<Option<String>> {
		screen::narration::name(ink, &self.density, &self.ocr)
	}
}
