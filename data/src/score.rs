//! Approximate string scoring between a known name and an OCR result.
//!
//! Neither strategy is a full edit distance. Both can abandon a comparison
//! early once it cannot reach the caller's floor, which keeps a scan over a
//! whole region's names within a frame's time budget.

/// Score returned when a comparison is abandoned early.
pub const PRUNED: f32 = -10.0;

/// Scoring strategy, chosen once per source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scorer {
	/// Ordered character containment. Suited to scripts where OCR mostly drops
	/// or inserts characters.
	Logogram,
	/// Sliding-window positional match. Suited to Latin scripts where OCR
	/// misreads whole runs of characters.
	Alphabetic,
}

impl Scorer {
	/// Similarity of `recognized` to `known`; higher is better.
	///
	/// `low_point` is the acceptance threshold the caller will apply. With
	/// `allow_early_exit`, comparisons that fall to `low_point - 2 - len/4`
	/// return [`PRUNED`].
	pub fn score(&self, known: &str, recognized: &str, low_point: f32, allow_early_exit: bool) -> f32 {
		match self {
			Self::Logogram => score_logogram(known, recognized, low_point, allow_early_exit),
			Self::Alphabetic => score_alphabetic(known, recognized, low_point, allow_early_exit),
		}
	}

	/// Score of a perfect match against `known`.
	pub fn max_score(&self, known: &str) -> f32 {
		match self {
			Self::Logogram => known.chars().count() as f32 + 0.5,
			Self::Alphabetic => known.chars().filter(|c| *c != ' ').count() as f32,
		}
	}
}

#[inline]
fn fail_out(low_point: f32, known_len: usize) -> f32 {
	low_point - 2.0 - known_len as f32 / 4.0
}

fn score_logogram(known: &str, recognized: &str, low_point: f32, allow_early_exit: bool) -> f32 {
	let known = known.chars().collect::<Vec<_>>();
	let recognized = recognized.chars().collect::<Vec<_>>();

	let len_diff = known.len() as isize - recognized.len() as isize;
	if allow_early_exit && len_diff > 3 {
		return PRUNED;
	}

	let floor = fail_out(low_point, known.len());
	// Missing characters cost half a point each on top of the per-character miss.
	let mut cost = (len_diff as f32 / 2.0).max(0.0);
	let mut correct = if len_diff == 0 { 0.5 } else { 0.0 };

	let mut cursor = 0;
	for c in &known {
		match recognized[cursor..].iter().position(|v| v == c) {
			Some(offset) => {
				correct += 1.0;
				cursor += offset + 1;
			}
			None => cost += 1.0,
		}

		if allow_early_exit && correct - cost <= floor {
			return PRUNED;
		}
	}

	correct - cost
}

fn score_alphabetic(known: &str, recognized: &str, low_point: f32, allow_early_exit: bool) -> f32 {
	let known = known.chars().filter(|c| *c != ' ').collect::<Vec<_>>();
	let recognized = recognized.chars().filter(|c| *c != ' ').collect::<Vec<_>>();

	let floor = fail_out(low_point, known.len());
	let (longer, shorter) = if known.len() < recognized.len() {
		(&recognized, &known)
	} else {
		(&known, &recognized)
	};

	let mut best = PRUNED;
	for offset in 0..=(longer.len() - shorter.len()) {
		let mut score = 0.0f32;
		for (i, c) in shorter.iter().enumerate() {
			score += if *c == longer[offset + i] { 1.0 } else { -1.0 };
			if allow_early_exit && score < floor {
				break;
			}
		}
		best = best.max(score);
	}

	best
}
