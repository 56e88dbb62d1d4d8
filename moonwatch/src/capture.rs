//! Frame capture.
//!
//! A producer thread grabs the game window, trims capture borders and scales
//! to the reference resolution, then publishes into a [`LatestFrame`] slot.
//! The detector always takes the newest frame; anything it was too slow for
//! is dropped.

use std::{
	sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
	thread::{self, JoinHandle},
	time::{Duration, Instant},
};

use anyhow::Result;
use ie::{OwnedImage, REFERENCE_HEIGHT, REFERENCE_WIDTH, Rect};
use xcap::image::EncodableLayout;

pub fn find_window(app_name: &str) -> Option<xcap::Window> {
	let windows = xcap::Window::all().ok()?;
	windows
		.into_iter()
		.find(|window| window.app_name().ok().as_deref() == Some(app_name))
}

pub fn capture_specific(app_name: &str) -> Option<OwnedImage> {
	let window = find_window(app_name)?;
	let img = window.capture_image().ok()?;
	Some(OwnedImage::from_rgba(img.width() as usize, img.as_bytes()))
}

pub trait FrameSource {
	/// Next raw frame, or `None` when the grab failed.
	fn read(&mut self) -> Option<OwnedImage>;
}

/// Captures the first window whose app name matches.
pub struct WindowSource {
	app_name: String,
}

impl WindowSource {
	pub fn new(app_name: impl Into<String>) -> Self {
		Self { app_name: app_name.into() }
	}
}

impl FrameSource for WindowSource {
	fn read(&mut self) -> Option<OwnedImage> {
		capture_specific(&self.app_name)
	}
}

/// Crops capture borders and scales to the reference resolution.
///
/// Borders are detected on the first frame and again whenever the raw frame
/// size changes.
#[derive(Default)]
pub struct Normalizer {
	area: Option<((u32, u32), Rect)>,
}

impl Normalizer {
	pub fn normalize(&mut self, raw: &OwnedImage) -> Result<OwnedImage> {
		let size = (raw.width(), raw.height());
		let area = match self.area {
			Some((known, area)) if known == size => area,
			_ => {
				let area = ie::detect_borders(raw.as_image());
				tracing::info!(width = size.0, height = size.1, ?area, "detected game area");
				self.area = Some((size, area));
				area
			}
		};

		raw.as_image()
			.crop(area)
			.to_owned_image()
			.resized(REFERENCE_WIDTH, REFERENCE_HEIGHT)
	}
}

#[derive(Debug)]
pub struct Frame {
	pub image: OwnedImage,
	pub captured_at: Instant,
}

#[derive(Default)]
struct Slot {
	frame: Option<Frame>,
	closed: bool,
}

/// Single-frame conflating buffer between the producer and the detector.
#[derive(Clone, Default)]
pub struct LatestFrame(Arc<(Mutex<Slot>, Condvar)>);

impl LatestFrame {
	fn lock(&self) -> MutexGuard<'_, Slot> {
		self.0.0.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Replace any pending frame. Returns `true` if one was dropped unread.
	pub fn publish(&self, frame: Frame) -> bool {
		let mut slot = self.lock();
		let dropped = slot.frame.replace(frame).is_some();
		self.0.1.notify_one();
		dropped
	}

	/// Wait for the next frame. `None` once closed and drained.
	pub fn take(&self) -> Option<Frame> {
		let mut slot = self.lock();
		while slot.frame.is_none() && !slot.closed {
			slot = self.0.1.wait(slot).unwrap_or_else(PoisonError::into_inner);
		}
		slot.frame.take()
	}

	/// Wake the consumer and stop the producer.
	pub fn close(&self) {
		self.lock().closed = true;
		self.0.1.notify_all();
	}

	pub fn is_closed(&self) -> bool {
		self.lock().closed
	}
}

/// Capture at most once per `period` until `slot` is closed.
///
/// A failed grab publishes nothing, so the detector skips that cycle.
pub fn spawn_producer(mut source: impl FrameSource + Send + 'static, slot: LatestFrame, period: Duration) -> JoinHandle<()> {
	thread::spawn(move || {
		let mut normalizer = Normalizer::default();
		let mut dropped = 0u64;

		while !slot.is_closed() {
			let started = Instant::now();
			match source.read() {
				Some(raw) => match normalizer.normalize(&raw) {
					Ok(image) => {
						if slot.publish(Frame { image, captured_at: started }) {
							dropped += 1;
							if dropped % 100 == 0 {
								tracing::debug!(dropped, "detector is behind capture");
							}
						}
					}
					Err(err) => tracing::warn!(error = %err, "frame normalization failed"),
				},
				None => tracing::debug!("frame grab failed"),
			}

			if let Some(rest) = period.checked_sub(started.elapsed()) {
				thread::sleep(rest);
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use ie::Color;

	use super::*;

	fn frame(shade: u8) -> Frame {
		Frame {
			image: OwnedImage::new(4, 4, Color::new(shade, shade, shade)),
			captured_at: Instant::now(),
		}
	}

	#[test]
	fn latest_frame_wins() {
		let slot = LatestFrame::default();
		assert!(!slot.publish(frame(1)));
		assert!(slot.publish(frame(2)));
		assert!(slot.publish(frame(3)));

		let taken = slot.take().unwrap();
		assert_eq!(taken.image.as_image().get(0, 0), Color::new(3, 3, 3));
		slot.close();
		assert!(slot.take().is_none());
	}

	#[test]
	fn close_wakes_a_waiting_consumer() {
		let slot = LatestFrame::default();
		let consumer = {
			let slot = slot.clone();
			thread::spawn(move || slot.take().is_none())
		};
		thread::sleep(Duration::from_millis(20));
		slot.close();
		assert!(consumer.join().unwrap());
	}

	#[test]
	fn pending_frame_survives_close() {
		let slot = LatestFrame::default();
		slot.publish(frame(7));
		slot.close();
		assert!(slot.take().is_some());
		assert!(slot.take().is_none());
	}

	#[test]
	fn normalizer_trims_borders_and_scales() {
		let mut raw = OwnedImage::new(700, 400, Color::BLACK);
		raw.fill_rect(Rect::new(30, 0, 640, 360), Color::new(20, 60, 120));

		let mut normalizer = Normalizer::default();
		let image = normalizer.normalize(&raw).unwrap();
		assert_eq!((image.width(), image.height()), (REFERENCE_WIDTH, REFERENCE_HEIGHT));
		assert_eq!(normalizer.area.map(|(_, area)| area), Some(Rect::new(30, 0, 640, 360)));
		for (x, y) in [(0, 0), (REFERENCE_WIDTH - 1, REFERENCE_HEIGHT - 1)] {
			assert!(image.as_image().get(x, y).b > 100);
		}
	}

	struct Scripted(Vec<Option<OwnedImage>>);

	impl FrameSource for Scripted {
		fn read(&mut self) -> Option<OwnedImage> {
			self.0.pop().flatten()
		}
	}

	#[test]
	fn producer_skips_failed_grabs() {
		let slot = LatestFrame::default();
		let raw = OwnedImage::new(640, 360, Color::new(20, 60, 120));
		let source = Scripted(vec![Some(raw), None, None]);
		let producer = spawn_producer(source, slot.clone(), Duration::from_millis(1));

		let frame = slot.take().unwrap();
		assert_eq!(frame.image.width(), REFERENCE_WIDTH);
		slot.close();
		producer.join().unwrap();
	}
}
