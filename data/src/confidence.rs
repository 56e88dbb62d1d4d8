use std::collections::BTreeMap;

/// Synthetic entry standing for "none of the candidates".
pub const UNCERTAIN: &str = "Uncertain";

/// Turn raw scores into display percentages.
///
/// Scores are treated as logits of a softmax. Unless `force_all_pass` is set,
/// an [`UNCERTAIN`] entry scored at `threshold` competes with the candidates.
/// Entries whose share is not above `min_possibility` (a fraction, e.g. `0.1`)
/// are dropped. Percentages are truncated to two decimals, so the values never
/// sum to more than 100.
///
/// The result is informational only; it never decides the best match.
pub fn to_percentages(
	scores: &BTreeMap<String, f32>,
	threshold: f32,
	force_all_pass: bool,
	min_possibility: f32,
) -> BTreeMap<String, f32> {
	let mut logits = scores.iter().map(|(k, v)| (k.as_str(), *v)).collect::<Vec<_>>();
	if !force_all_pass {
		logits.push((UNCERTAIN, threshold));
	}
	if logits.is_empty() {
		return BTreeMap::new();
	}

	let max = logits.iter().map(|(_, v)| *v).fold(f32::NEG_INFINITY, f32::max);
	let exps = logits.iter().map(|(_, v)| (v - max).exp()).collect::<Vec<_>>();
	let total = exps.iter().sum::<f32>();

	logits
		.iter()
		.zip(exps)
		.map(|((name, _), e)| (*name, ((e / total) * 10_000.0).floor() / 100.0))
		.filter(|(_, pct)| *pct > min_possibility * 100.0)
		.map(|(name, pct)| (name.to_owned(), pct))
		.collect()
}
