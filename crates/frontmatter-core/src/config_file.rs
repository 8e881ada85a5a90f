use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub batch: Option<BatchSection>,
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingSection {
    pub journal_literal: Option<String>,
    pub header_regex: Option<String>,
    pub id_token_regex: Option<String>,
    pub alignment_tolerance: Option<f32>,
    pub footnote_glyphs: Option<Vec<String>>,
    pub extra_affiliation_punctuation: Option<Vec<String>>,
    pub editor_len_min: Option<usize>,
    pub editor_len_max: Option<usize>,
    pub keywords_len_min: Option<usize>,
    pub keywords_len_max: Option<usize>,
    pub keywords_second_page: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSection {
    pub num_workers: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    pub format: Option<String>,
    pub failures_path: Option<String>,
}

/// Platform config directory path: `<config_dir>/frontmatter/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("frontmatter").join("config.toml"))
}

/// Load config by cascading CWD `.frontmatter.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".frontmatter.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Pick the overlay value when set, otherwise the base value.
fn pick<S, T: Clone>(
    overlay: &Option<S>,
    base: &Option<S>,
    field: impl Fn(&S) -> &Option<T>,
) -> Option<T> {
    overlay
        .as_ref()
        .and_then(|s| field(s).clone())
        .or_else(|| base.as_ref().and_then(|s| field(s).clone()))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bp, op) = (&base.parsing, &overlay.parsing);
    let (bb, ob) = (&base.batch, &overlay.batch);
    let (bo, oo) = (&base.output, &overlay.output);

    ConfigFile {
        parsing: Some(ParsingSection {
            journal_literal: pick(op, bp, |s| &s.journal_literal),
            header_regex: pick(op, bp, |s| &s.header_regex),
            id_token_regex: pick(op, bp, |s| &s.id_token_regex),
            alignment_tolerance: pick(op, bp, |s| &s.alignment_tolerance),
            footnote_glyphs: pick(op, bp, |s| &s.footnote_glyphs),
            extra_affiliation_punctuation: pick(op, bp, |s| &s.extra_affiliation_punctuation),
            editor_len_min: pick(op, bp, |s| &s.editor_len_min),
            editor_len_max: pick(op, bp, |s| &s.editor_len_max),
            keywords_len_min: pick(op, bp, |s| &s.keywords_len_min),
            keywords_len_max: pick(op, bp, |s| &s.keywords_len_max),
            keywords_second_page: pick(op, bp, |s| &s.keywords_second_page),
        }),
        batch: Some(BatchSection {
            num_workers: pick(ob, bb, |s| &s.num_workers),
            timeout_secs: pick(ob, bb, |s| &s.timeout_secs),
        }),
        output: Some(OutputSection {
            format: pick(oo, bo, |s| &s.format),
            failures_path: pick(oo, bo, |s| &s.failures_path),
        }),
    }
}
