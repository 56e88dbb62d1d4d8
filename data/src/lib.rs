use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};

pub mod confidence;
mod matcher;
pub use matcher::*;
mod region;
pub use region::*;
mod schema;
mod score;
pub use score::*;
mod structs;
pub use structs::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct NameFlags {
	pub is_story: bool,
	pub is_multi: bool,
	/// Belongs to one region but is collected in another.
	pub is_bonus: bool,
}

/// A known collectible name in the configured languages.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NameEntry {
	pub region: RegionId,
	/// 1-based index within `region`.
	pub local_index: u32,
	pub source_text: String,
	pub target_text: String,
	/// Optional third language for display; empty when not configured.
	pub aux_text: String,
	pub flags: NameFlags,
}

impl NameEntry {
	pub fn same_entry(&self, other: &NameEntry) -> bool {
		self.region == other.region && self.local_index == other.local_index
	}
}

impl std::fmt::Display for NameEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} #{} - {} - {}", self.region, self.local_index, self.target_text, self.source_text)
	}
}

/// Read-only name dictionary, partitioned by region.
#[derive(Debug)]
pub struct Dictionary {
	source: Language,
	target: Language,
	regions: HashMap<RegionId, Vec<Arc<NameEntry>>>,
	/// Bonus names keyed by the region they are collected in.
	bonus: HashMap<RegionId, Vec<Arc<NameEntry>>>,
	special_multi: Vec<Arc<NameEntry>>,
}

impl Dictionary {
	pub fn load(path: impl AsRef<Path>, source: Language, target: Language, aux: Option<Language>) -> Result<Self> {
		let path = path.as_ref();
		let json = std::fs::read_to_string(path).with_context(|| format!("Read name dictionary {}", path.display()))?;
		Self::from_json(&json, source, target, aux).with_context(|| format!("Parse name dictionary {}", path.display()))
	}

	pub fn from_json(json: &str, source: Language, target: Language, aux: Option<Language>) -> Result<Self> {
		let records = serde_json::from_str::<Vec<schema::names::NameRecord>>(json).context("Decode name records")?;
		if records.is_empty() {
			bail!("name dictionary is empty");
		}

		let mut s = Self {
			source,
			target,
			regions: HashMap::new(),
			bonus: HashMap::new(),
			special_multi: Vec::new(),
		};

		for record in records {
			let region = record.kingdom;
			let index = record.id;
			let column = |lang: Language| {
				record
					.column(lang.key())
					.map(str::to_owned)
					.with_context(|| format!("{region} #{index} has no {} name", lang.key()))
			};

			let entry = Arc::new(NameEntry {
				region,
				local_index: index,
				source_text: column(source)?,
				target_text: column(target)?,
				aux_text: aux.and_then(|lang| column(lang).ok()).unwrap_or_default(),
				flags: NameFlags {
					is_story: region.story_indices().contains(&index),
					is_multi: region.multi_indices().contains(&index) || region.is_special_multi(index),
					is_bonus: record.collection_kingdom.is_some(),
				},
			});

			if region.is_special_multi(index) {
				s.special_multi.push(entry.clone());
			}
			if let Some(collected_in) = record.collection_kingdom {
				s.bonus.entry(collected_in).or_default().push(entry.clone());
			}
			s.regions.entry(region).or_default().push(entry);
		}

		Ok(s)
	}

	pub fn source(&self) -> Language {
		self.source
	}

	pub fn target(&self) -> Language {
		self.target
	}

	pub fn len(&self) -> usize {
		self.regions.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Every name belonging to `region`, in file order.
	pub fn region(&self, region: RegionId) -> &[Arc<NameEntry>] {
		self.regions.get(&region).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Bonus names collected in `region`.
	pub fn bonus(&self, region: RegionId) -> &[Arc<NameEntry>] {
		self.bonus.get(&region).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Names an informant can speak while in `region`.
	pub fn narration_scope(&self, region: RegionId) -> impl Iterator<Item = &Arc<NameEntry>> {
		self.region(region).iter().filter(|v| !v.flags.is_bonus)
	}

	/// Names whose pickup banner can show while in `region`. Story names have
	/// their own overlay and are excluded.
	pub fn collectible_scope(&self, region: RegionId) -> impl Iterator<Item = &Arc<NameEntry>> {
		self.region(region)
			.iter()
			.filter(|v| !v.flags.is_story && !v.flags.is_bonus)
			.chain(self.bonus(region))
	}

	pub fn story_scope(&self, region: RegionId) -> impl Iterator<Item = &Arc<NameEntry>> {
		self.region(region).iter().filter(|v| v.flags.is_story)
	}

	pub fn multi_scope(&self, region: RegionId) -> impl Iterator<Item = &Arc<NameEntry>> {
		self.region(region)
			.iter()
			.filter(|v| v.flags.is_multi && !v.region.is_special_multi(v.local_index))
			.chain(&self.special_multi)
	}

	/// Fail unless every region in `regions` has at least one name.
	pub fn ensure_regions(&self, regions: &[RegionId]) -> Result<()> {
		let missing = regions
			.iter()
			.filter(|r| self.region(**r).is_empty())
			.map(|r| r.name())
			.collect::<Vec<_>>();
		if !missing.is_empty() {
			bail!("name dictionary has no {} names for: {}", self.source.key(), missing.join(", "));
		}
		Ok(())
	}
}
