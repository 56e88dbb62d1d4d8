use crate::Scorer;

/// Game/display language. Serialized with the same keys as the columns of the
/// name dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
	English,
	ChineseTraditional,
	ChineseSimplified,
	Japanese,
	Korean,
	Dutch,
	FrenchCanada,
	FrenchFrance,
	German,
	Italian,
	SpanishSpain,
	SpanishLatinAmerica,
	Russian,
}

impl Language {
	pub const ALL: [Language; 13] = [
		Self::English,
		Self::ChineseTraditional,
		Self::ChineseSimplified,
		Self::Japanese,
		Self::Korean,
		Self::Dutch,
		Self::FrenchCanada,
		Self::FrenchFrance,
		Self::German,
		Self::Italian,
		Self::SpanishSpain,
		Self::SpanishLatinAmerica,
		Self::Russian,
	];

	/// Dictionary column key.
	pub fn key(&self) -> &'static str {
		match self {
			Self::English => "english",
			Self::ChineseTraditional => "chinese_traditional",
			Self::ChineseSimplified => "chinese_simplified",
			Self::Japanese => "japanese",
			Self::Korean => "korean",
			Self::Dutch => "dutch",
			Self::FrenchCanada => "french_canada",
			Self::FrenchFrance => "french_france",
			Self::German => "german",
			Self::Italian => "italian",
			Self::SpanishSpain => "spanish_spain",
			Self::SpanishLatinAmerica => "spanish_latin_america",
			Self::Russian => "russian",
		}
	}

	pub fn ocr_code(&self) -> &'static str {
		self.profile().ocr_code
	}

	pub fn profile(&self) -> &'static LanguageProfile {
		match self {
			Self::ChineseTraditional => &CHINESE_TRADITIONAL,
			Self::ChineseSimplified => &CHINESE_SIMPLIFIED,
			Self::Japanese => &JAPANESE,
			Self::Korean => &KOREAN,
			Self::Russian => &RUSSIAN,
			Self::English => &ENGLISH,
			Self::Dutch
			| Self::FrenchCanada
			| Self::FrenchFrance
			| Self::German
			| Self::Italian
			| Self::SpanishSpain
			| Self::SpanishLatinAmerica => &LATIN,
		}
	}
}

/// Per-language recognition settings.
#[derive(Debug)]
pub struct LanguageProfile {
	/// OCR model family used for this script.
	pub ocr_code: &'static str,
	pub scorer: Scorer,
	/// Exclusive `(lower, upper)` ink-density band of a text crop.
	pub text_band: (f32, f32),
	/// Minimum text bounding-box height at the reference resolution.
	pub text_height: u32,
	pub score_threshold: f32,
	/// Replacements applied in order to every OCR result.
	pub corrections: &'static [(&'static str, &'static str)],
}

impl LanguageProfile {
	/// Replace characters the OCR engine is known to confuse.
	pub fn correct(&self, text: &str) -> String {
		let mut text = text.to_owned();
		for (from, to) in self.corrections {
			text = text.replace(from, to);
		}
		text
	}
}

const CHINESE_CORRECTIONS: &[(&str, &str)] = &[
	(" ", ""),
	("!", "！"),
	("(", ""),
	(";", " "),
	("@", " "),
	("1", "１"),
	("2", "２"),
	("3", "３"),
	("4", "４"),
	("5", "５"),
	("6", "６"),
	("7", "７"),
	("8", "８"),
	("9", "９"),
	("0", "０"),
];

// Logogram scripts render denser glyphs at the same point size.
const LOGOGRAM_BAND: (f32, f32) = (0.15, 0.75);
const ALPHABET_BAND: (f32, f32) = (0.10, 0.60);

static CHINESE_TRADITIONAL: LanguageProfile = LanguageProfile {
	ocr_code: "chinese_cht",
	scorer: Scorer::Logogram,
	text_band: LOGOGRAM_BAND,
	text_height: 20,
	score_threshold: -2.0,
	corrections: CHINESE_CORRECTIONS,
};

static CHINESE_SIMPLIFIED: LanguageProfile = LanguageProfile {
	ocr_code: "ch",
	scorer: Scorer::Logogram,
	text_band: LOGOGRAM_BAND,
	text_height: 20,
	score_threshold: -2.0,
	corrections: CHINESE_CORRECTIONS,
};

static JAPANESE: LanguageProfile = LanguageProfile {
	ocr_code: "japan",
	scorer: Scorer::Logogram,
	text_band: LOGOGRAM_BAND,
	text_height: 20,
	score_threshold: -2.0,
	corrections: &[],
};

static KOREAN: LanguageProfile = LanguageProfile {
	ocr_code: "korean",
	scorer: Scorer::Logogram,
	text_band: LOGOGRAM_BAND,
	text_height: 20,
	score_threshold: -2.0,
	corrections: &[],
};

static RUSSIAN: LanguageProfile = LanguageProfile {
	ocr_code: "cyrillic",
	scorer: Scorer::Alphabetic,
	text_band: ALPHABET_BAND,
	text_height: 16,
	score_threshold: 4.0,
	corrections: &[(" ", ""), ("<", ""), (">", ""), ("{", ""), ("}", "")],
};

static ENGLISH: LanguageProfile = LanguageProfile {
	ocr_code: "en",
	scorer: Scorer::Alphabetic,
	text_band: ALPHABET_BAND,
	text_height: 16,
	score_threshold: 4.0,
	corrections: &[(" ", "")],
};

static LATIN: LanguageProfile = LanguageProfile {
	ocr_code: "latin",
	scorer: Scorer::Alphabetic,
	text_band: ALPHABET_BAND,
	text_height: 16,
	score_threshold: 4.0,
	corrections: &[(" ", "")],
};
