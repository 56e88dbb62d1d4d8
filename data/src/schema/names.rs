use std::collections::HashMap;

use serde::Deserialize;

use crate::RegionId;

/// One record of the name dictionary file.
///
/// Every language column is a top-level string keyed by [`crate::Language::key`].
#[derive(Deserialize)]
pub struct NameRecord {
	/// 1-based index within `kingdom`.
	pub id: u32,
	pub kingdom: RegionId,
	/// Set for bonus names that are collected in a different region than the
	/// one they belong to.
	#[serde(default)]
	pub collection_kingdom: Option<RegionId>,
	#[serde(flatten)]
	pub columns: HashMap<String, serde_json::Value>,
}

impl NameRecord {
	pub fn column(&self, key: &str) -> Option<&str> {
		self.columns.get(key).and_then(|v| v.as_str())
	}
}
