use once_cell::sync::Lazy;
use regex::Regex;

use frontmatter_core::config_file::ParsingSection;

/// Journal name every retained header is expected to start with.
pub const DEFAULT_JOURNAL_LITERAL: &str = "Journal of Machine Learning Research";

/// Footnote glyphs that may stand in for author ids.
pub const DEFAULT_FOOTNOTE_GLYPHS: &[char] = &['*', '†', '♢', '♯', '♭', '‡', '∗'];

/// Glyphs stripped from the end of an author name.
pub const DEFAULT_NAME_MARKERS: &[char] = &['*', '†'];

/// Single-character affiliation tokens accepted besides ASCII alphanumerics.
pub const DEFAULT_AFFILIATION_PUNCTUATION: &[char] = &[' ', ',', '.', '-', '&', '(', ')', '/'];

/// Maximum left-edge offset (layout units) between author rows.
pub const DEFAULT_ALIGNMENT_TOLERANCE: f32 = 5.0;

static DEFAULT_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&header_pattern(DEFAULT_JOURNAL_LITERAL)).unwrap());

static DEFAULT_ID_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&id_token_pattern(DEFAULT_FOOTNOTE_GLYPHS)).unwrap());

static DEFAULT_LONE_GLYPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&lone_glyph_pattern(DEFAULT_FOOTNOTE_GLYPHS)).unwrap());

/// Citation-line grammar for a given journal literal.
///
/// Groups: 1 volume, 2 year, 3 start page, 4 end page, 5 submitted,
/// 6 revised (one or more `M/Y` joined by `&`), 7 published.
pub(crate) fn header_pattern(literal: &str) -> String {
    let date = r"\d{1,2}/\d{1,2}";
    format!(
        r"(?i)^\s*{lit}\s*(?:volume\s*)?(\d+)?\s*\((\d{{4}})\)\s*(\d+)\s*[-–]\s*(\d+)\s*Submitted\s*:?\s*({date})\s*[,;]?\s*(?:Revised\s*:?\s*((?:{date})(?:\s*&\s*{date})*)?\s*;)?\s*Published\s*:?\s*({date})?\s*$",
        lit = regex::escape(literal),
        date = date,
    )
}

fn glyph_class(glyphs: &[char]) -> String {
    let escaped: String = glyphs
        .iter()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    format!("[{}]", escaped)
}

/// Comma/space separated list of numbers and footnote glyphs.
pub(crate) fn id_token_pattern(glyphs: &[char]) -> String {
    let token = format!(r"(?:\d+|{})", glyph_class(glyphs));
    format!(r"^(?:\s*\d+\s*$|\s*{token}(?:\s*,\s*{token})*\s*,?\s*$)", token = token)
}

pub(crate) fn lone_glyph_pattern(glyphs: &[char]) -> String {
    format!(r"^\s*{}\s*$", glyph_class(glyphs))
}

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Inclusive character-count bounds for a label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

/// Configuration for the front-matter extraction pipeline.
///
/// Regexes are compiled once, either from the built-in defaults or by
/// [`ParsingConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── header.rs ──
    pub(crate) journal_literal: String,
    pub(crate) header_re: Regex,

    // ── format.rs ──
    pub(crate) id_token_re: Regex,
    pub(crate) lone_glyph_re: Regex,

    // ── authors.rs ──
    pub(crate) alignment_tolerance: f32,
    pub(crate) name_markers: Vec<char>,
    pub(crate) affiliation_punctuation: Vec<char>,

    // ── labels.rs ──
    pub(crate) editor_bounds: LengthBounds,
    pub(crate) keywords_bounds: LengthBounds,
    pub(crate) keywords_second_page: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            journal_literal: DEFAULT_JOURNAL_LITERAL.to_string(),
            header_re: DEFAULT_HEADER_RE.clone(),
            id_token_re: DEFAULT_ID_TOKEN_RE.clone(),
            lone_glyph_re: DEFAULT_LONE_GLYPH_RE.clone(),
            alignment_tolerance: DEFAULT_ALIGNMENT_TOLERANCE,
            name_markers: DEFAULT_NAME_MARKERS.to_vec(),
            affiliation_punctuation: DEFAULT_AFFILIATION_PUNCTUATION.to_vec(),
            editor_bounds: LengthBounds { min: 5, max: 100 },
            keywords_bounds: LengthBounds { min: 8, max: 1000 },
            keywords_second_page: true,
        }
    }
}

impl ParsingConfig {
    pub fn journal_literal(&self) -> &str {
        &self.journal_literal
    }

    pub fn alignment_tolerance(&self) -> f32 {
        self.alignment_tolerance
    }

    /// Number of leading pages the pipeline wants from the backend.
    pub fn pages_needed(&self) -> usize {
        if self.keywords_second_page { 2 } else { 1 }
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    journal_literal: Option<String>,
    header_re: Option<String>,
    id_token_re: Option<String>,
    alignment_tolerance: Option<f32>,
    footnote_glyphs: ListOverride<char>,
    name_markers: ListOverride<char>,
    affiliation_punctuation: ListOverride<char>,
    editor_bounds: Option<LengthBounds>,
    keywords_bounds: Option<LengthBounds>,
    keywords_second_page: Option<bool>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the `[parsing]` table of a config file.
    pub fn from_section(section: &ParsingSection) -> Self {
        let mut builder = Self::new();
        if let Some(literal) = &section.journal_literal {
            builder = builder.journal_literal(literal);
        }
        if let Some(pattern) = &section.header_regex {
            builder = builder.header_regex(pattern);
        }
        if let Some(pattern) = &section.id_token_regex {
            builder = builder.id_token_regex(pattern);
        }
        if let Some(tolerance) = section.alignment_tolerance {
            builder = builder.alignment_tolerance(tolerance);
        }
        if let Some(glyphs) = &section.footnote_glyphs {
            builder = builder.set_footnote_glyphs(first_chars(glyphs));
        }
        if let Some(extra) = &section.extra_affiliation_punctuation {
            for c in first_chars(extra) {
                builder = builder.add_affiliation_punctuation(c);
            }
        }
        let defaults = ParsingConfig::default();
        if section.editor_len_min.is_some() || section.editor_len_max.is_some() {
            builder = builder.editor_bounds(
                section.editor_len_min.unwrap_or(defaults.editor_bounds.min),
                section.editor_len_max.unwrap_or(defaults.editor_bounds.max),
            );
        }
        if section.keywords_len_min.is_some() || section.keywords_len_max.is_some() {
            builder = builder.keywords_bounds(
                section.keywords_len_min.unwrap_or(defaults.keywords_bounds.min),
                section.keywords_len_max.unwrap_or(defaults.keywords_bounds.max),
            );
        }
        if let Some(flag) = section.keywords_second_page {
            builder = builder.keywords_second_page(flag);
        }
        builder
    }

    // ── Header ──

    pub fn journal_literal(mut self, literal: &str) -> Self {
        self.journal_literal = Some(literal.to_string());
        self
    }

    /// Replace the whole citation grammar. Must keep the seven capture groups
    /// of the default pattern.
    pub fn header_regex(mut self, pattern: &str) -> Self {
        self.header_re = Some(pattern.to_string());
        self
    }

    // ── Format classifier ──

    pub fn id_token_regex(mut self, pattern: &str) -> Self {
        self.id_token_re = Some(pattern.to_string());
        self
    }

    pub fn set_footnote_glyphs(mut self, glyphs: Vec<char>) -> Self {
        self.footnote_glyphs = ListOverride::Replace(glyphs);
        self
    }

    pub fn add_footnote_glyph(mut self, glyph: char) -> Self {
        match &mut self.footnote_glyphs {
            ListOverride::Extend(v) => v.push(glyph),
            _ => self.footnote_glyphs = ListOverride::Extend(vec![glyph]),
        }
        self
    }

    // ── Authors ──

    pub fn alignment_tolerance(mut self, tolerance: f32) -> Self {
        self.alignment_tolerance = Some(tolerance);
        self
    }

    pub fn set_name_markers(mut self, markers: Vec<char>) -> Self {
        self.name_markers = ListOverride::Replace(markers);
        self
    }

    pub fn add_affiliation_punctuation(mut self, c: char) -> Self {
        match &mut self.affiliation_punctuation {
            ListOverride::Extend(v) => v.push(c),
            _ => self.affiliation_punctuation = ListOverride::Extend(vec![c]),
        }
        self
    }

    pub fn set_affiliation_punctuation(mut self, chars: Vec<char>) -> Self {
        self.affiliation_punctuation = ListOverride::Replace(chars);
        self
    }

    // ── Labels ──

    pub fn editor_bounds(mut self, min: usize, max: usize) -> Self {
        self.editor_bounds = Some(LengthBounds { min, max });
        self
    }

    pub fn keywords_bounds(mut self, min: usize, max: usize) -> Self {
        self.keywords_bounds = Some(LengthBounds { min, max });
        self
    }

    pub fn keywords_second_page(mut self, enabled: bool) -> Self {
        self.keywords_second_page = Some(enabled);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let defaults = ParsingConfig::default();
        let journal_literal = self
            .journal_literal
            .unwrap_or_else(|| DEFAULT_JOURNAL_LITERAL.to_string());

        let header_re = match self.header_re {
            Some(pattern) => Regex::new(&pattern)?,
            None if journal_literal == DEFAULT_JOURNAL_LITERAL => defaults.header_re.clone(),
            None => Regex::new(&header_pattern(&journal_literal))?,
        };

        let glyphs = self.footnote_glyphs.resolve(DEFAULT_FOOTNOTE_GLYPHS);
        let id_token_re = match self.id_token_re {
            Some(pattern) => Regex::new(&pattern)?,
            None => Regex::new(&id_token_pattern(&glyphs))?,
        };
        let lone_glyph_re = Regex::new(&lone_glyph_pattern(&glyphs))?;

        Ok(ParsingConfig {
            journal_literal,
            header_re,
            id_token_re,
            lone_glyph_re,
            alignment_tolerance: self
                .alignment_tolerance
                .unwrap_or(DEFAULT_ALIGNMENT_TOLERANCE),
            name_markers: self.name_markers.resolve(DEFAULT_NAME_MARKERS),
            affiliation_punctuation: self
                .affiliation_punctuation
                .resolve(DEFAULT_AFFILIATION_PUNCTUATION),
            editor_bounds: self.editor_bounds.unwrap_or(defaults.editor_bounds),
            keywords_bounds: self.keywords_bounds.unwrap_or(defaults.keywords_bounds),
            keywords_second_page: self
                .keywords_second_page
                .unwrap_or(defaults.keywords_second_page),
        })
    }
}

fn first_chars(values: &[String]) -> Vec<char> {
    values.iter().filter_map(|s| s.chars().next()).collect()
}
