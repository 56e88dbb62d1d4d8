//! Moonwatch.
//!
//! Watches a game capture window and reports collectible names as they are
//! picked up or mentioned in dialogue. Reports go to stdout, logs to stderr.

mod cadence;
mod capture;
mod config;
mod scheduler;
mod session;
mod util;

use std::{
	sync::{Arc, mpsc},
	thread,
	time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use data::{DetectionResult, Dictionary, RegionId};

use crate::{
	capture::{LatestFrame, WindowSource},
	config::Config,
	scheduler::Detector,
	session::Reports,
	util::assets,
};

/// Upper bound on the capture rate.
const CAPTURE_PERIOD: Duration = Duration::from_millis(33);

fn main() -> Result<()> {
	let config = Config::try_load()?;

	// Structured logging. Use `RUST_LOG=info` etc.
	let default_filter = if config.verbose { "info,moonwatch=debug,ie=debug,data=debug" } else { "info" };
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	if let Ok(path) = Config::path()
		&& !path.exists()
	{
		match config.save() {
			Ok(()) => tracing::info!(path = %path.display(), "wrote default settings"),
			Err(err) => tracing::warn!(error = %err, "could not write default settings"),
		}
	}

	run(config)
}

#[cfg(not(feature = "onnx"))]
fn region_model() -> Result<ie::TemplateModel> {
	let dir = assets::resolve_asset("regions")?;
	ie::TemplateModel::load(&dir, RegionId::CLASS_COUNT).with_context(|| format!("load region templates from {}", dir.display()))
}

#[cfg(feature = "onnx")]
fn region_model() -> Result<ie::OnnxModel> {
	let path = assets::resolve_asset("region_classifier.onnx")?;
	ie::OnnxModel::load(&path).with_context(|| format!("load region classifier {}", path.display()))
}

fn run(config: Config) -> Result<()> {
	if !config.active_regions.contains(&config.start_region) {
		bail!("start region {} is not one of the active regions", config.start_region);
	}

	let dictionary_path = match &config.dictionary {
		Some(path) => path.clone(),
		None => assets::resolve_asset("names.json")?,
	};
	let dictionary = Dictionary::load(
		&dictionary_path,
		config.source_language,
		config.target_language,
		config.aux_language,
	)?;
	dictionary.ensure_regions(&config.active_regions)?;
	tracing::info!(
		names = dictionary.len(),
		target = dictionary.target().key(),
		path = %dictionary_path.display(),
		"loaded name dictionary"
	);

	let ocr_assets = assets::resolve_ocr_assets(config.source_language.ocr_code())?;
	let ocr = ie::Ocr::try_new(&ocr_assets.detection, &ocr_assets.recognition, &ocr_assets.charset)?;
	let model = region_model()?;

	let reports = Reports::default();
	let mut detector = Detector::new(
		ocr,
		model,
		Arc::new(dictionary),
		config.settings(),
		config.start_region,
		reports.clone(),
		Instant::now(),
	);

	let slot = LatestFrame::default();
	let producer = capture::spawn_producer(WindowSource::new(config.app_name.clone()), slot.clone(), CAPTURE_PERIOD);
	stop_on_ctrl_c(slot.clone())?;

	let (tx, edits) = mpsc::channel();
	let _watcher = match Config::path().and_then(|path| crate::config::watch(path, tx)) {
		Ok(watcher) => Some(watcher),
		Err(err) => {
			tracing::warn!(error = %err, "settings will not reload while running");
			None
		}
	};

	tracing::info!(window = %config.app_name, region = %config.start_region, "watching");

	let mut active = config;
	let mut narrated_seen = 0;
	while let Some(frame) = slot.take() {
		for edited in edits.try_iter() {
			if active.needs_restart(&edited) {
				tracing::warn!("window, language or dictionary changes apply after a restart");
			}
			match detector.apply_settings(edited.settings()) {
				Ok(()) => tracing::info!("settings updated"),
				Err(err) => tracing::warn!(error = %err, "rejected settings update"),
			}
			active = edited;
		}

		detector.process_frame(frame.image.as_image(), frame.captured_at);

		let region = reports.current_region().unwrap_or(active.start_region);
		for result in reports.drain_collected() {
			print_report("collected", region, &result);
		}
		let narrated = reports.narrated_since(narrated_seen);
		narrated_seen += narrated.len();
		for result in &narrated {
			print_report("narrated", region, result);
		}
	}

	if producer.join().is_err() {
		tracing::warn!("capture thread panicked");
	}
	tracing::info!("stopped");
	Ok(())
}

/// Close `slot` on Ctrl-C. The frame loop finishes the pending frame and ends.
fn stop_on_ctrl_c(slot: LatestFrame) -> Result<()> {
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.context("create signal runtime")?;
	thread::spawn(move || {
		match runtime.block_on(tokio::signal::ctrl_c()) {
			Ok(()) => tracing::info!("stopping"),
			Err(err) => {
				tracing::warn!(error = %err, "cannot listen for Ctrl-C; stop the process to quit");
				return;
			}
		}
		slot.close();
	});
	Ok(())
}

fn print_report(kind: &str, region: RegionId, result: &DetectionResult) {
	let names = result
		.candidates
		.iter()
		.map(|entry| {
			if entry.aux_text.is_empty() {
				format!("{} #{} {}", entry.region, entry.local_index, entry.target_text)
			} else {
				format!("{} #{} {} ({})", entry.region, entry.local_index, entry.target_text, entry.aux_text)
			}
		})
		.collect::<Vec<_>>();
	println!("[{kind} in {region}] {}", names.join(" OR "));
	for (name, share) in &result.confidence {
		println!("    {share:>6.2}% {name}");
	}
}
