use std::{collections::BTreeMap, sync::Arc};

use crate::{NameEntry, Scorer, confidence};

/// Outcome of one successful recognition pass.
#[derive(Debug, Clone)]
pub struct DetectionResult {
	/// Every entry tied at the best raw score, in dictionary order.
	pub candidates: Vec<Arc<NameEntry>>,
	/// Display percentages by target name.
	pub confidence: BTreeMap<String, f32>,
	pub raw_score: f32,
}

impl DetectionResult {
	/// Same candidate set, ignoring scores. This is the equality used to
	/// suppress repeated reports.
	pub fn same_candidates(&self, other: &DetectionResult) -> bool {
		self.candidates.len() == other.candidates.len()
			&& self
				.candidates
				.iter()
				.zip(&other.candidates)
				.all(|(a, b)| a.same_entry(b))
	}

	/// The single entry, when the match is unambiguous.
	pub fn unique(&self) -> Option<&Arc<NameEntry>> {
		match self.candidates.as_slice() {
			[entry] => Some(entry),
			_ => None,
		}
	}

	pub fn target_names(&self) -> Vec<&str> {
		self.candidates.iter().map(|v| v.target_text.as_str()).collect()
	}
}

impl std::fmt::Display for DetectionResult {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} (score={}) -> {:?}", self.target_names().join(" OR "), self.raw_score, self.confidence)
	}
}

/// Picks the best dictionary entries for an OCR string.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
	pub scorer: Scorer,
	pub threshold: f32,
	/// Minimum share shown in [`DetectionResult::confidence`].
	pub min_possibility: f32,
}

impl Matcher {
	pub fn new(scorer: Scorer, threshold: f32, min_possibility: f32) -> Self {
		Self {
			scorer,
			threshold,
			min_possibility,
		}
	}

	/// Best matches at or above the threshold, or `None`.
	pub fn best_match<'a>(&self, entries: impl IntoIterator<Item = &'a Arc<NameEntry>>, text: &str) -> Option<DetectionResult> {
		if text.chars().count() < 2 {
			return None;
		}

		let mut best = f32::NEG_INFINITY;
		let mut candidates = Vec::new();
		let mut scores = BTreeMap::new();

		for entry in entries {
			let score = self.scorer.score(&entry.source_text, text, self.threshold, true);
			if score < self.threshold {
				continue;
			}

			scores.insert(entry.target_text.clone(), score);
			if score > best {
				best = score;
				candidates.clear();
				candidates.push(entry.clone());
			} else if score == best {
				candidates.push(entry.clone());
			}
		}

		let confidence = confidence::to_percentages(&scores, self.threshold, false, self.min_possibility);
		if candidates.is_empty() {
			log::debug!("no good matches for {text:?} -> {confidence:?}");
			return None;
		}

		Some(DetectionResult {
			candidates,
			confidence,
			raw_score: best,
		})
	}

	/// Best matches regardless of the threshold.
	///
	/// Used when presence is already established by other means, so the
	/// scope is small and a name must be picked. Returns `None` only when the
	/// scope is empty or the text is too short.
	pub fn forced_match<'a>(&self, entries: impl IntoIterator<Item = &'a Arc<NameEntry>>, text: &str) -> Option<DetectionResult> {
		if text.chars().count() < 2 {
			return None;
		}

		let mut best = f32::NEG_INFINITY;
		let mut candidates = Vec::new();
		let mut scores = BTreeMap::new();

		for entry in entries {
			let score = self.scorer.score(&entry.source_text, text, self.threshold, false);
			scores.insert(entry.target_text.clone(), score);
			if score > best {
				best = score;
				candidates.clear();
				candidates.push(entry.clone());
			} else if score == best {
				candidates.push(entry.clone());
			}
		}

		if candidates.is_empty() {
			return None;
		}

		Some(DetectionResult {
			candidates,
			confidence: confidence::to_percentages(&scores, self.threshold, true, self.min_possibility),
			raw_score: best.max(self.threshold),
		})
	}
}
