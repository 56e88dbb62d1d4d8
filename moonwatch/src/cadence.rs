use std::time::{Duration, Instant};

/// Longest delay any check can be pushed back by.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Next-due time of one periodic check.
///
/// Only the check that owns a cadence moves it.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
	next_due: Instant,
}

impl Cadence {
	/// Due on the first frame after `start`.
	pub fn new(start: Instant) -> Self {
		Self { next_due: start }
	}

	/// Strictly after the due time.
	pub fn is_due(&self, now: Instant) -> bool {
		now > self.next_due
	}

	/// Due again `secs` after `now`. Negative or NaN is zero, anything past
	/// [`MAX_DELAY`] is clamped.
	pub fn defer(&mut self, now: Instant, secs: f32) {
		let delay = Duration::try_from_secs_f32(secs.max(0.0)).map_or(MAX_DELAY, |d| d.min(MAX_DELAY));
		self.next_due = now + delay;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn due_strictly_after() {
		let start = Instant::now();
		let mut cadence = Cadence::new(start);
		assert!(!cadence.is_due(start));
		assert!(cadence.is_due(start + Duration::from_millis(1)));

		let now = start + Duration::from_secs(1);
		cadence.defer(now, 0.5);
		assert!(!cadence.is_due(now + Duration::from_millis(500)));
		assert!(cadence.is_due(now + Duration::from_millis(501)));
	}

	#[test]
	fn defer_replaces_rather_than_extends() {
		let start = Instant::now();
		let mut cadence = Cadence::new(start);
		cadence.defer(start, 6.0);
		cadence.defer(start, 0.5);
		assert!(cadence.is_due(start + Duration::from_secs(1)));
	}

	#[test]
	fn out_of_range_delays_are_clamped() {
		let start = Instant::now();
		let mut cadence = Cadence::new(start);
		cadence.defer(start, 1e30);
		assert!(!cadence.is_due(start + MAX_DELAY));
		assert!(cadence.is_due(start + MAX_DELAY + Duration::from_millis(1)));

		cadence.defer(start, f32::NAN);
		assert!(cadence.is_due(start + Duration::from_millis(1)));
		cadence.defer(start, -3.0);
		assert!(cadence.is_due(start + Duration::from_millis(1)));
	}
}
