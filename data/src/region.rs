use serde::{Deserialize, Serialize};

/// A game region (kingdom).
///
/// The first 13 variants are the classifier's output classes, in classifier
/// order. Do not reorder them without shipping a new classifier model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionId {
	Cap,
	Cascade,
	Sand,
	Lake,
	Wooded,
	Lost,
	Metro,
	Seaside,
	Snow,
	Luncheon,
	Bowsers,
	Moon,
	Mushroom,

	// Never emitted by the classifier.
	Cloud,
	Ruined,
	#[serde(rename = "Dark Side")]
	DarkSide,
	#[serde(rename = "Darker Side")]
	DarkerSide,
}

impl RegionId {
	/// Classifier output order. Class index `CLASSIFIED.len()` is "indeterminate".
	pub const CLASSIFIED: [RegionId; 13] = [
		Self::Cap,
		Self::Cascade,
		Self::Sand,
		Self::Lake,
		Self::Wooded,
		Self::Lost,
		Self::Metro,
		Self::Seaside,
		Self::Snow,
		Self::Luncheon,
		Self::Bowsers,
		Self::Moon,
		Self::Mushroom,
	];

	/// Number of classifier classes including the indeterminate one.
	pub const CLASS_COUNT: usize = Self::CLASSIFIED.len() + 1;

	pub const ALL: [RegionId; 17] = [
		Self::Cap,
		Self::Cascade,
		Self::Sand,
		Self::Lake,
		Self::Wooded,
		Self::Lost,
		Self::Metro,
		Self::Seaside,
		Self::Snow,
		Self::Luncheon,
		Self::Bowsers,
		Self::Moon,
		Self::Mushroom,
		Self::Cloud,
		Self::Ruined,
		Self::DarkSide,
		Self::DarkerSide,
	];

	pub fn from_class_index(index: usize) -> Option<Self> {
		Self::CLASSIFIED.get(index).copied()
	}

	pub fn class_index(&self) -> Option<usize> {
		Self::CLASSIFIED.iter().position(|v| v == self)
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::Cap => "Cap",
			Self::Cascade => "Cascade",
			Self::Sand => "Sand",
			Self::Lake => "Lake",
			Self::Wooded => "Wooded",
			Self::Lost => "Lost",
			Self::Metro => "Metro",
			Self::Seaside => "Seaside",
			Self::Snow => "Snow",
			Self::Luncheon => "Luncheon",
			Self::Bowsers => "Bowsers",
			Self::Moon => "Moon",
			Self::Mushroom => "Mushroom",
			Self::Cloud => "Cloud",
			Self::Ruined => "Ruined",
			Self::DarkSide => "Dark Side",
			Self::DarkerSide => "Darker Side",
		}
	}

	/// 1-based local indices of the story collectibles in this region.
	pub fn story_indices(&self) -> &'static [u32] {
		match self {
			Self::Cascade => &[1],
			Self::Sand => &[1, 2],
			Self::Wooded => &[1, 3],
			Self::Metro => &[2, 3, 4, 5, 6],
			Self::Snow => &[1, 2, 3, 4],
			Self::Seaside => &[1, 2, 3, 4],
			Self::Luncheon => &[1, 2, 4],
			Self::Bowsers => &[1, 2, 3],
			_ => &[],
		}
	}

	/// 1-based local indices of the multi collectibles in this region.
	pub fn multi_indices(&self) -> &'static [u32] {
		match self {
			Self::Cascade => &[2],
			Self::Sand => &[3, 4],
			Self::Lake => &[1],
			Self::Wooded => &[2, 4],
			Self::Metro => &[1, 7],
			Self::Snow => &[5],
			Self::Seaside => &[5],
			Self::Luncheon => &[3, 5],
			Self::Bowsers => &[4],
			Self::Mushroom => &[33, 34, 35, 36, 37, 38],
			_ => &[],
		}
	}

	/// Multi collectibles that can appear regardless of the current region
	/// (boss rematches in the post-game regions).
	pub fn is_special_multi(&self, local_index: u32) -> bool {
		matches!(self, Self::Ruined | Self::DarkSide | Self::DarkerSide) && local_index == 1
	}
}

impl std::fmt::Display for RegionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}
