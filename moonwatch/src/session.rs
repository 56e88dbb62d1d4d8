//! Mutable state of one running session.
//!
//! The scheduler owns the [`Session`]. Other threads only see detections
//! through a [`Reports`] handle, which copies or drains under a mutex.

use std::{
	collections::HashSet,
	sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use data::{DetectionResult, NameEntry, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionObservation {
	/// No change to the region belief.
	Unchanged,
	/// First sighting of a different region, waiting for a second one.
	Provisional(RegionId),
	Committed(RegionId),
}

pub struct Session {
	current_region: RegionId,
	pending_region: Option<RegionId>,
	text_potential: u32,
	collected: HashSet<(RegionId, u32)>,
	reports: Reports,
}

impl Session {
	pub fn new(start_region: RegionId, reports: Reports) -> Self {
		reports.lock().region = Some(start_region);
		Self {
			current_region: start_region,
			pending_region: None,
			text_potential: 0,
			collected: HashSet::new(),
			reports,
		}
	}

	pub fn current_region(&self) -> RegionId {
		self.current_region
	}

	pub fn pending_region(&self) -> Option<RegionId> {
		self.pending_region
	}

	/// Two-hit debounce. A region becomes current only when the same
	/// candidate is seen on two consecutive observations. Anything else
	/// (no candidate, the current region, another region) replaces or clears
	/// the pending one.
	pub fn observe_region(&mut self, candidate: Option<RegionId>) -> RegionObservation {
		match candidate {
			Some(region) if region != self.current_region => {
				if self.pending_region == Some(region) {
					self.current_region = region;
					self.pending_region = None;
					self.reports.lock().region = Some(region);
					RegionObservation::Committed(region)
				} else {
					self.pending_region = Some(region);
					RegionObservation::Provisional(region)
				}
			}
			_ => {
				self.pending_region = None;
				RegionObservation::Unchanged
			}
		}
	}

	pub fn text_potential(&self) -> u32 {
		self.text_potential
	}

	/// Count one more frame that looks like dialogue text. Returns `true`, and
	/// starts over, once enough has been seen to be worth reading.
	pub fn accumulate_text(&mut self, frame_secs: f32, dwell_secs: f32, max_frame_secs: f32) -> bool {
		self.text_potential += 1;
		let ready = self.text_potential as f32 * frame_secs > dwell_secs
			&& self.text_potential >= 2
			&& frame_secs <= max_frame_secs;
		if ready {
			self.text_potential = 0;
		}
		ready
	}

	pub fn reset_text(&mut self) {
		self.text_potential = 0;
	}

	/// Remember an unambiguous pickup.
	pub fn mark_collected(&mut self, result: &DetectionResult) {
		if let Some(entry) = result.unique() {
			self.collected.insert((entry.region, entry.local_index));
		}
	}

	pub fn is_collected(&self, entry: &NameEntry) -> bool {
		self.collected.contains(&(entry.region, entry.local_index))
	}

	pub fn reports(&self) -> &Reports {
		&self.reports
	}
}

#[derive(Debug, Default)]
pub struct ReportLog {
	collected: Vec<DetectionResult>,
	/// Last collected detection, kept across drains for deduplication.
	last_collected: Option<DetectionResult>,
	narrated: Vec<DetectionResult>,
	region: Option<RegionId>,
}

/// Shared, append-only view of the session's detections.
#[derive(Debug, Clone, Default)]
pub struct Reports(Arc<Mutex<ReportLog>>);

impl Reports {
	fn lock(&self) -> MutexGuard<'_, ReportLog> {
		// Appends cannot leave the log half-written, so a poisoned lock is still usable.
		self.0.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Append unless equal to the previous collected detection.
	pub fn push_collected(&self, result: DetectionResult) -> bool {
		let mut log = self.lock();
		if log.last_collected.as_ref().is_some_and(|last| last.same_candidates(&result)) {
			return false;
		}
		log.last_collected = Some(result.clone());
		log.collected.push(result);
		true
	}

	/// Append unless equal to the previous narrated detection.
	pub fn push_narrated(&self, result: DetectionResult) -> bool {
		let mut log = self.lock();
		if log.narrated.last().is_some_and(|last| last.same_candidates(&result)) {
			return false;
		}
		log.narrated.push(result);
		true
	}

	/// Collected detections since the last drain.
	pub fn drain_collected(&self) -> Vec<DetectionResult> {
		std::mem::take(&mut self.lock().collected)
	}

	/// Narrated detections after the first `seen`.
	pub fn narrated_since(&self, seen: usize) -> Vec<DetectionResult> {
		self.lock().narrated.get(seen..).map(<[_]>::to_vec).unwrap_or_default()
	}

	pub fn current_region(&self) -> Option<RegionId> {
		self.lock().region
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use data::NameFlags;

	use super::*;

	fn result(region: RegionId, indices: &[u32]) -> DetectionResult {
		DetectionResult {
			candidates: indices
				.iter()
				.map(|i| {
					Arc::new(NameEntry {
						region,
						local_index: *i,
						source_text: format!("source {i}"),
						target_text: format!("target {i}"),
						aux_text: String::new(),
						flags: NameFlags::default(),
					})
				})
				.collect(),
			confidence: BTreeMap::new(),
			raw_score: 1.0,
		}
	}

	fn names_of(results: &[DetectionResult]) -> Vec<u32> {
		results.iter().flat_map(|r| r.candidates.iter().map(|e| e.local_index)).collect()
	}

	fn session() -> Session {
		Session::new(RegionId::Cascade, Reports::default())
	}

	#[test]
	fn single_sighting_never_commits() {
		let mut s = session();
		assert_eq!(s.observe_region(Some(RegionId::Cap)), RegionObservation::Provisional(RegionId::Cap));
		assert_eq!(s.current_region(), RegionId::Cascade);
		assert_eq!(s.observe_region(Some(RegionId::Sand)), RegionObservation::Provisional(RegionId::Sand));
		assert_eq!(s.current_region(), RegionId::Cascade);
		assert_eq!(s.pending_region(), Some(RegionId::Sand));
	}

	#[test]
	fn two_sightings_commit_once() {
		let mut s = session();
		s.observe_region(Some(RegionId::Cap));
		assert_eq!(s.observe_region(Some(RegionId::Cap)), RegionObservation::Committed(RegionId::Cap));
		assert_eq!(s.current_region(), RegionId::Cap);
		assert_eq!(s.reports().current_region(), Some(RegionId::Cap));
		assert_eq!(s.observe_region(Some(RegionId::Cap)), RegionObservation::Unchanged);
		assert_eq!(s.pending_region(), None);
	}

	#[test]
	fn gap_clears_pending() {
		let mut s = session();
		s.observe_region(Some(RegionId::Cap));
		assert_eq!(s.observe_region(None), RegionObservation::Unchanged);
		assert_eq!(s.observe_region(Some(RegionId::Cap)), RegionObservation::Provisional(RegionId::Cap));

		s.observe_region(Some(RegionId::Cascade));
		assert_eq!(s.pending_region(), None);
	}

	#[test]
	fn text_potential_formula() {
		let mut s = session();
		assert!(!s.accumulate_text(0.07, 0.19, 0.3));
		assert!(!s.accumulate_text(0.07, 0.19, 0.3));
		assert!(s.accumulate_text(0.07, 0.19, 0.3));
		assert_eq!(s.text_potential(), 0);

		// One slow frame is not sustained evidence, however long it is.
		assert!(!s.accumulate_text(0.25, 0.19, 0.3));
		// Two frames over the frame cap never fire.
		assert!(!s.accumulate_text(0.4, 0.19, 0.3));
		assert_eq!(s.text_potential(), 2);

		s.reset_text();
		assert_eq!(s.text_potential(), 0);
	}

	#[test]
	fn adjacent_duplicates_are_dropped() {
		let reports = Reports::default();
		assert!(reports.push_narrated(result(RegionId::Cap, &[1])));
		assert!(!reports.push_narrated(result(RegionId::Cap, &[1])));
		assert!(reports.push_narrated(result(RegionId::Cap, &[2])));
		assert!(reports.push_narrated(result(RegionId::Cap, &[1])));
		assert_eq!(reports.narrated_since(0).len(), 3);
		assert_eq!(names_of(&reports.narrated_since(2)), vec![1]);
		assert!(reports.narrated_since(3).is_empty());
		assert!(reports.narrated_since(7).is_empty());

		assert!(reports.push_collected(result(RegionId::Cap, &[1, 2])));
		assert!(!reports.push_collected(result(RegionId::Cap, &[1, 2])));
		assert!(reports.push_collected(result(RegionId::Cap, &[1])));
		assert_eq!(reports.drain_collected().len(), 2);
		assert!(reports.drain_collected().is_empty());
	}

	#[test]
	fn collected_dedup_survives_drain() {
		let reports = Reports::default();
		reports.push_collected(result(RegionId::Sand, &[3]));
		assert_eq!(reports.drain_collected().len(), 1);
		assert!(!reports.push_collected(result(RegionId::Sand, &[3])));
		assert!(reports.push_collected(result(RegionId::Sand, &[4])));
	}

	#[test]
	fn only_unique_results_are_marked() {
		let mut s = session();
		s.mark_collected(&result(RegionId::Cascade, &[1, 2]));
		let single = result(RegionId::Cascade, &[1]);
		let entry = &single.candidates[0];
		assert!(!s.is_collected(entry));
		s.mark_collected(&result(RegionId::Cascade, &[1]));
		assert!(s.is_collected(entry));
	}
}
