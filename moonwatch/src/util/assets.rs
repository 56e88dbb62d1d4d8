use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

#[derive(Debug, Clone)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

/// Places assets are looked for, most specific first.
///
/// `MOONWATCH_ASSETS_DIR` overrides discovery. Otherwise the executable's
/// directory and the working directory are tried, plus the workspace root in
/// debug builds.
fn search_roots() -> Vec<PathBuf> {
	let mut roots = Vec::new();
	if let Some(dir) = std::env::var_os("MOONWATCH_ASSETS_DIR") {
		roots.push(PathBuf::from(dir));
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		roots.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		roots.push(cwd);
	}
	#[cfg(debug_assertions)]
	roots.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));
	roots
}

fn tried_list(tried: Vec<PathBuf>) -> String {
	tried
		.into_iter()
		.map(|p| format!("  - {}", p.display()))
		.collect::<Vec<_>>()
		.join("\n")
}

/// Allow a root to be either the app folder (containing `ocr/`) or the `ocr/`
/// folder itself.
fn normalize_ocr_dir(dir: PathBuf) -> PathBuf {
	if dir.join("detection.mnn").is_file() { dir } else { dir.join("ocr") }
}

pub fn resolve_ocr_assets(ocr_code: &str) -> Result<OcrAssets> {
	resolve_ocr_assets_in(search_roots(), ocr_code)
}

fn resolve_ocr_assets_in(roots: Vec<PathBuf>, ocr_code: &str) -> Result<OcrAssets> {
	let recognition_name = format!("{ocr_code}_recognition.mnn");
	let charset_name = format!("{ocr_code}_charset.txt");

	let mut tried = Vec::new();
	for root in roots {
		let ocr_dir = normalize_ocr_dir(root);
		let detection = ocr_dir.join("detection.mnn");
		let recognition = ocr_dir.join(&recognition_name);
		let charset = ocr_dir.join(&charset_name);

		if detection.is_file() && recognition.is_file() && charset.is_file() {
			return Ok(OcrAssets { detection, recognition, charset });
		}
		tried.push(ocr_dir);
	}

	bail!(
		"OCR model files not found. Expected these files:\n  - ocr/detection.mnn\n  - ocr/{recognition_name}\n  - ocr/{charset_name}\n\nSearched in:\n{}\n\nFix: copy the 'ocr/' folder next to the executable (or set MOONWATCH_ASSETS_DIR to the folder that contains it).",
		tried_list(tried)
	)
}

/// Find a file or directory named `name` in the first root that has it.
pub fn resolve_asset(name: impl AsRef<Path>) -> Result<PathBuf> {
	resolve_asset_in(search_roots(), name.as_ref())
}

fn resolve_asset_in(roots: Vec<PathBuf>, name: &Path) -> Result<PathBuf> {
	let mut tried = Vec::new();
	for root in roots {
		let path = root.join(name);
		if path.exists() {
			return Ok(path);
		}
		tried.push(path);
	}

	bail!(
		"Asset '{}' not found. Searched:\n{}\n\nFix: set MOONWATCH_ASSETS_DIR to the folder that contains it.",
		name.display(),
		tried_list(tried)
	)
}
