//! Per-frame detection.
//!
//! Four checks run in a fixed order on every frame: region, collectible,
//! celebration, narration. The first three are gated by their own
//! [`Cadence`]; narration runs every frame and gates itself on accumulated
//! evidence. A check that finds something can end the frame early, because
//! the screens involved never overlap.

use std::{ops::ControlFlow, sync::Arc, time::Instant};

use anyhow::Result;
use data::{DetectionResult, Dictionary, LanguageProfile, Matcher, RegionId};
use ie::{Celebration, Ie, Image, Recognizer, RegionClassifier, RegionModel, ScreenLayout, TextDensity, Tint};

use crate::{
	cadence::Cadence,
	config::Timings,
	session::{RegionObservation, Reports, Session},
};

/// Tunables that can change while running.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
	pub timings: Timings,
	pub region_certainty: f32,
	pub min_possibility: f32,
	pub min_text_pixels: usize,
	pub score_threshold: f32,
	pub density: TextDensity,
	pub layout: ScreenLayout,
	pub overlay_tilt_degrees: f32,
	pub exclude_collected: bool,
	pub active_regions: Vec<RegionId>,
}

/// Dialogue text is rendered with a different yellow depending on the
/// region's lighting.
pub fn narration_tint(region: RegionId) -> Tint {
	match region {
		RegionId::Metro | RegionId::Seaside => Tint::STRICT,
		RegionId::Sand => Tint::MIDDLE,
		_ => Tint::LOOSE,
	}
}

pub struct Detector<R, M> {
	ie: Ie<R>,
	classifier: RegionClassifier<M>,
	dictionary: Arc<Dictionary>,
	profile: &'static LanguageProfile,
	matcher: Matcher,
	settings: Settings,
	session: Session,

	region_check: Cadence,
	collectible_check: Cadence,
	story_check: Cadence,
	last_frame: Instant,
}

impl<R: Recognizer, M: RegionModel> Detector<R, M> {
	pub fn new(
		ocr: R,
		model: M,
		dictionary: Arc<Dictionary>,
		settings: Settings,
		start_region: RegionId,
		reports: Reports,
		start: Instant,
	) -> Self {
		let profile = dictionary.source().profile();
		Self {
			ie: Ie::new(settings.layout, settings.density, ocr),
			classifier: RegionClassifier::new(model, RegionId::CLASS_COUNT, settings.region_certainty),
			matcher: Matcher::new(profile.scorer, settings.score_threshold, settings.min_possibility),
			dictionary,
			profile,
			settings,
			session: Session::new(start_region, reports),
			region_check: Cadence::new(start),
			collectible_check: Cadence::new(start),
			story_check: Cadence::new(start),
			last_frame: start,
		}
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Swap in new tunables. Rejected, leaving the old ones in place, when an
	/// active region has no names or a timing is out of range.
	pub fn apply_settings(&mut self, settings: Settings) -> Result<()> {
		settings.timings.validate()?;
		self.dictionary.ensure_regions(&settings.active_regions)?;

		self.ie.set_layout(settings.layout);
		self.ie.set_density(settings.density);
		self.classifier.set_certainty(settings.region_certainty);
		self.matcher.threshold = settings.score_threshold;
		self.matcher.min_possibility = settings.min_possibility;
		self.settings = settings;
		Ok(())
	}

	/// Run every due check against one reference-sized frame captured at `now`.
	pub fn process_frame(&mut self, frame: Image<'_>, now: Instant) {
		let frame_secs = now.saturating_duration_since(self.last_frame).as_secs_f32();
		self.last_frame = now;

		if self.check_region(frame, now).is_break() {
			return;
		}
		if self.check_collectible(frame, now).is_break() {
			return;
		}
		if self.check_celebration(frame, now).is_break() {
			return;
		}
		self.check_narration(frame, frame_secs);
	}

	fn check_region(&mut self, frame: Image<'_>, now: Instant) -> ControlFlow<()> {
		if !self.region_check.is_due(now) {
			return ControlFlow::Continue(());
		}

		let emblem = self.ie.region_emblem(frame);
		let candidate = self
			.classifier
			.classify(emblem.as_image())
			.and_then(RegionId::from_class_index)
			.filter(|region| self.settings.active_regions.contains(region));

		let timings = self.settings.timings;
		match self.session.observe_region(candidate) {
			RegionObservation::Unchanged => {
				self.region_check.defer(now, timings.region_interval);
				ControlFlow::Continue(())
			}
			RegionObservation::Provisional(region) => {
				tracing::debug!(region = %region, "region sighted, rechecking");
				self.region_check.defer(now, timings.region_recheck);
				ControlFlow::Break(())
			}
			RegionObservation::Committed(region) => {
				tracing::info!(region = %region, "entered region");
				self.region_check.defer(now, timings.region_interval);
				ControlFlow::Break(())
			}
		}
	}

	fn check_collectible(&mut self, frame: Image<'_>, now: Instant) -> ControlFlow<()> {
		if !self.collectible_check.is_due(now) {
			return ControlFlow::Continue(());
		}

		let timings = self.settings.timings;
		let text = match self.ie.collectible_name(frame) {
			Ok(Some(text)) => self.profile.correct(&text),
			Ok(None) => {
				self.collectible_check.defer(now, timings.collectible_interval);
				return ControlFlow::Continue(());
			}
			Err(err) => {
				tracing::warn!(error = %err, "collectible OCR failed");
				self.collectible_check.defer(now, timings.collectible_interval);
				return ControlFlow::Continue(());
			}
		};

		let region = self.session.current_region();
		let exclude = self.settings.exclude_collected;
		let session = &self.session;
		let scope = self
			.dictionary
			.collectible_scope(region)
			.filter(|entry| !(exclude && session.is_collected(entry)));
		let Some(result) = self.matcher.best_match(scope, &text) else {
			self.collectible_check.defer(now, timings.collectible_interval);
			return ControlFlow::Continue(());
		};

		// Cooldown applies even to a repeat, which is the same pickup banner
		// still on screen.
		self.collectible_check.defer(now, timings.collectible_cooldown);
		self.session.mark_collected(&result);
		if self.session.reports().push_collected(result.clone()) {
			tracing::info!(detection = %result, "collected");
			ControlFlow::Break(())
		} else {
			tracing::debug!(detection = %result, "repeat of the last collected name");
			ControlFlow::Continue(())
		}
	}

	fn check_celebration(&mut self, frame: Image<'_>, now: Instant) -> ControlFlow<()> {
		if !self.story_check.is_due(now) {
			return ControlFlow::Continue(());
		}

		let timings = self.settings.timings;
		let Some(kind) = self.ie.celebration(frame) else {
			self.story_check.defer(now, timings.story_interval);
			return ControlFlow::Continue(());
		};
		self.story_check.defer(now, timings.story_cooldown);

		let text = match self.ie.celebration_name(frame, self.settings.overlay_tilt_degrees) {
			Ok(text) => self.profile.correct(&text),
			Err(err) => {
				tracing::warn!(error = %err, "celebration OCR failed");
				String::new()
			}
		};

		let region = self.session.current_region();
		let result = match kind {
			Celebration::Story => self.matcher.forced_match(self.dictionary.story_scope(region), &text),
			Celebration::Multi => self.matcher.forced_match(self.dictionary.multi_scope(region), &text),
		};
		match result {
			Some(result) => self.report_collected(result),
			None => tracing::debug!(?kind, text = %text, "celebration without a readable name"),
		}
		ControlFlow::Break(())
	}

	fn check_narration(&mut self, frame: Image<'_>, frame_secs: f32) {
		let region = self.session.current_region();
		let ink = self.ie.narration_ink(frame, narration_tint(region));
		if ink.ink_count() <= self.settings.min_text_pixels {
			self.session.reset_text();
			return;
		}

		let timings = self.settings.timings;
		if !self
			.session
			.accumulate_text(frame_secs, timings.narration_dwell, timings.narration_max_frame)
		{
			return;
		}

		let text = match self.ie.narration_name(&ink) {
			Ok(Some(text)) => self.profile.correct(&text),
			Ok(None) => return,
			Err(err) => {
				tracing::warn!(error = %err, "narration OCR failed");
				return;
			}
		};

		let Some(result) = self.matcher.best_match(self.dictionary.narration_scope(region), &text) else {
			return;
		};
		if self.session.reports().push_narrated(result.clone()) {
			tracing::info!(detection = %result, "narrated");
		}
	}

	fn report_collected(&mut self, result: DetectionResult) {
		self.session.mark_collected(&result);
		if self.session.reports().push_collected(result.clone()) {
			tracing::info!(detection = %result, "collected");
		}
	}
}
