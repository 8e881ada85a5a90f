use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Expand common typographic ligatures found in PDFs.
///
/// NFKD already decomposes the Latin ligature block; this covers callers that
/// want readable text without the full compatibility decomposition.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Comparison projection used for title matching: NFKD, lowercase, ASCII
/// letters and digits only.
///
/// `"Scalable ﬁltering"` and `"scalable-filtering"` both project to
/// `"scalablefiltering"`.
pub fn projection(text: &str) -> String {
    text.nfkd()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Collapse runs of whitespace (including newlines) into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    WS_RE.replace_all(text.trim(), " ").into_owned()
}

/// Strip trailing footnote markers (and whitespace between them) from a name.
pub fn strip_trailing_markers(text: &str, markers: &[char]) -> String {
    text.trim_end_matches(|c: char| c.is_whitespace() || markers.contains(&c))
        .trim_start()
        .to_string()
}

/// Concatenate span texts with single spaces.
pub(crate) fn join_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    let joined: Vec<&str> = texts.into_iter().collect();
    normalize_whitespace(&joined.join(" "))
}
