//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory. The file is
//! watched while running; tunables from a valid edit are applied between
//! frames.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use anyhow::{Context, Result, bail};
use data::{Language, RegionId};
use notify::Watcher;
use serde::{Deserialize, Serialize};

use crate::{cadence::MAX_DELAY, scheduler::Settings};

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture window application name (from `xcap::Window::app_name()`).
    ///
    /// If multiple windows share the same app name, the first match is used.
    pub app_name: String,

    /// Language the game is displayed in; selects the OCR model and scorer.
    pub source_language: Language,
    /// Language names are reported in.
    pub target_language: Language,
    pub aux_language: Option<Language>,

    /// Regions the classifier may switch to. Every one must have names in the
    /// dictionary.
    pub active_regions: Vec<RegionId>,
    pub start_region: RegionId,

    /// Name dictionary; `names.json` from the assets dir when unset.
    pub dictionary: Option<PathBuf>,

    pub timings: Timings,
    pub thresholds: Thresholds,
    pub layout: ie::ScreenLayout,

    /// Clockwise correction for the tilted celebration text.
    pub overlay_tilt_degrees: f32,
    /// Drop already-collected names from later collectible matches.
    pub exclude_collected: bool,
    /// Debug logging when `RUST_LOG` is unset.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "OBS".to_string(),
            source_language: Language::ChineseTraditional,
            target_language: Language::English,
            aux_language: None,
            active_regions: RegionId::ALL.to_vec(),
            start_region: RegionId::Cascade,
            dictionary: None,
            timings: Timings::default(),
            thresholds: Thresholds::default(),
            layout: ie::ScreenLayout::default(),
            overlay_tilt_degrees: 3.0,
            exclude_collected: false,
            verbose: false,
        }
    }
}

/// Check cadences and dwell bounds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub region_interval: f32,
    /// Follow-up after a first sighting of a new region.
    pub region_recheck: f32,
    pub collectible_interval: f32,
    /// A collectible cannot repeat within this window.
    pub collectible_cooldown: f32,
    pub story_interval: f32,
    pub story_cooldown: f32,
    /// Dialogue must stay on screen at least this long before it is read.
    pub narration_dwell: f32,
    /// Longer frames do not count as sustained evidence.
    pub narration_max_frame: f32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            region_interval: 3.0,
            region_recheck: 1.0,
            collectible_interval: 0.5,
            collectible_cooldown: 6.0,
            story_interval: 0.5,
            story_cooldown: 10.0,
            narration_dwell: 0.19,
            narration_max_frame: 0.3,
        }
    }
}

impl Timings {
    /// Every value must be a number of seconds between zero and [`MAX_DELAY`].
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("region_interval", self.region_interval),
            ("region_recheck", self.region_recheck),
            ("collectible_interval", self.collectible_interval),
            ("collectible_cooldown", self.collectible_cooldown),
            ("story_interval", self.story_interval),
            ("story_cooldown", self.story_cooldown),
            ("narration_dwell", self.narration_dwell),
            ("narration_max_frame", self.narration_max_frame),
        ];
        let max = MAX_DELAY.as_secs_f32();
        for (name, secs) in fields {
            if !(0.0..=max).contains(&secs) {
                bail!("timings.{name} must be between 0 and {max} seconds, got {secs}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub region_certainty: f32,
    /// Confidence shares at or below this are not displayed.
    pub min_possibility: f32,
    /// Tinted pixels needed before the dialogue box counts as text.
    pub min_text_pixels: usize,
    /// Overrides the source language's score threshold.
    pub score_threshold: Option<f32>,
    /// Overrides the source language's ink-density band.
    pub text_band: Option<(f32, f32)>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            region_certainty: 0.85,
            min_possibility: 0.1,
            min_text_pixels: 500,
            score_threshold: None,
            text_band: None,
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("moonwatch.json"))
    }

    /// Try to load configuration from disk, falling back to defaults on a
    /// missing file.
    pub fn try_load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg: Self = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        cfg.validate().with_context(|| format!("invalid {:?}", path))?;
        Ok(cfg)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        self.timings.validate()?;
        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.region_certainty) {
            bail!("thresholds.region_certainty must be between 0 and 1, got {}", t.region_certainty);
        }
        if !(0.0..1.0).contains(&t.min_possibility) {
            bail!("thresholds.min_possibility must be at least 0 and below 1, got {}", t.min_possibility);
        }
        Ok(())
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    /// Scheduler tunables for the configured source language.
    pub fn settings(&self) -> Settings {
        let profile = self.source_language.profile();
        Settings {
            timings: self.timings,
            region_certainty: self.thresholds.region_certainty,
            min_possibility: self.thresholds.min_possibility,
            min_text_pixels: self.thresholds.min_text_pixels,
            score_threshold: self.thresholds.score_threshold.unwrap_or(profile.score_threshold),
            density: ie::TextDensity::new(profile.text_height, self.thresholds.text_band.unwrap_or(profile.text_band)),
            layout: self.layout,
            overlay_tilt_degrees: self.overlay_tilt_degrees,
            exclude_collected: self.exclude_collected,
            active_regions: self.active_regions.clone(),
        }
    }

    /// Whether switching from `self` to `other` needs a restart (new OCR
    /// model, dictionary, or capture window).
    pub fn needs_restart(&self, other: &Config) -> bool {
        self.app_name != other.app_name
            || self.source_language != other.source_language
            || self.target_language != other.target_language
            || self.aux_language != other.aux_language
            || self.dictionary != other.dictionary
    }
}

/// Send every valid edit of the file at `path` to `tx`.
///
/// The parent directory is watched so editors that replace the file are
/// still seen. Drop the returned watcher to stop.
pub fn watch(path: PathBuf, tx: Sender<Config>) -> Result<notify::RecommendedWatcher> {
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .context("config path has no parent")?;
    let file = path.clone();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "config watch error");
                return;
            }
        };
        if !(event.kind.is_modify() || event.kind.is_create()) || !event.paths.iter().any(|p| p == &file) {
            return;
        }

        match Config::load_from(&file) {
            Ok(cfg) => {
                let _ = tx.send(cfg);
            }
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "ignoring invalid config edit"),
        }
    })
    .context("create config watcher")?;

    fs::create_dir_all(&dir).with_context(|| format!("create {:?}", dir))?;
    watcher
        .watch(&dir, notify::RecursiveMode::NonRecursive)
        .with_context(|| format!("watch {:?}", dir))?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("moonwatch.json")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("moonwatch.json");
        let mut cfg = Config::default();
        cfg.source_language = Language::Japanese;
        cfg.active_regions = vec![RegionId::Cap, RegionId::Cascade];
        cfg.thresholds.score_threshold = Some(-1.5);
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moonwatch.json");
        fs::write(&path, r#"{"source_language": "english", "timings": {"story_cooldown": 12.0}}"#).unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.source_language, Language::English);
        assert_eq!(cfg.timings.story_cooldown, 12.0);
        assert_eq!(cfg.timings.region_interval, 3.0);
        assert_eq!(cfg.start_region, RegionId::Cascade);
    }

    #[test]
    fn unknown_language_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moonwatch.json");
        fs::write(&path, r#"{"source_language": "klingon"}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn out_of_range_values_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moonwatch.json");
        fs::write(&path, r#"{"timings": {"collectible_interval": 1e30}}"#).unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("collectible_interval"), "{err:#}");

        fs::write(&path, r#"{"timings": {"story_cooldown": -1.0}}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
        fs::write(&path, r#"{"thresholds": {"min_possibility": 1.5}}"#).unwrap();
        assert!(Config::load_from(&path).is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn settings_follow_the_language_unless_overridden() {
        let mut cfg = Config::default();
        cfg.source_language = Language::English;
        let settings = cfg.settings();
        assert_eq!(settings.score_threshold, 4.0);
        assert_eq!(settings.density, ie::TextDensity::new(16, (0.10, 0.60)));

        cfg.thresholds.score_threshold = Some(3.0);
        cfg.thresholds.text_band = Some((0.2, 0.5));
        let settings = cfg.settings();
        assert_eq!(settings.score_threshold, 3.0);
        assert_eq!((settings.density.lower, settings.density.upper), (0.2, 0.5));
    }

    #[test]
    fn tunable_edits_apply_live() {
        let cfg = Config::default();
        let mut edited = cfg.clone();
        edited.timings.collectible_cooldown = 8.0;
        edited.layout.narration.y += 2;
        assert!(!cfg.needs_restart(&edited));

        edited.source_language = Language::Korean;
        assert!(cfg.needs_restart(&edited));
    }
}
