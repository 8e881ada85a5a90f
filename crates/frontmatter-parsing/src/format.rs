use frontmatter_core::Span;

use crate::config::ParsingConfig;

/// Author-block layout family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutFormat {
    /// Name, affiliation lines, email per author.
    Normal,
    /// Names tagged with footnote ids, institutions listed separately.
    Id,
}

/// Whether `text` is a comma/space separated list of numbers and footnote
/// glyphs. A lone glyph is not an id list.
pub fn is_id_tokens(text: &str, config: &ParsingConfig) -> bool {
    config.id_token_re.is_match(text) && !config.lone_glyph_re.is_match(text)
}

fn could_extend_to_ids(text: &str, config: &ParsingConfig) -> bool {
    text.chars().all(|c| {
        c.is_ascii_digit()
            || c.is_whitespace()
            || c == ','
            || config.lone_glyph_re.is_match(c.encode_utf8(&mut [0; 4]))
    })
}

/// Decide the layout from the spans following the title block.
///
/// The span directly after the title block (normally the first author name)
/// is skipped; texts are accumulated from the one after it until they form
/// an id list. Accumulation stops once a character appears that no id list
/// can contain.
pub fn classify(spans: &[Span], start: usize, config: &ParsingConfig) -> LayoutFormat {
    let mut accumulated = String::new();
    for span in spans.iter().skip(start + 1) {
        accumulated.push_str(&span.text);
        if is_id_tokens(&accumulated, config) {
            tracing::debug!(ids = %accumulated, "id-format author block");
            return LayoutFormat::Id;
        }
        if !could_extend_to_ids(&accumulated, config) {
            break;
        }
    }
    LayoutFormat::Normal
}
