use std::path::Path;

use mupdf::{Document, TextPageFlags};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use frontmatter_core::{BackendError, Rect, Span, SpanSource, StyleFlags};

/// MuPDF-based implementation of [`SpanSource`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the parsing engine does not transitively
/// depend on it.
///
/// Pages are read through MuPDF's structured-text XML, which carries the
/// font of every character. Each text line is split into one span per run
/// of characters sharing a font name and size, so a bold `Editor:` label and
/// a superscript author id come out as spans of their own. Image blocks are
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<Document, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;
        Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))
    }

    fn page_spans(&self, document: &Document, page: usize) -> Result<Vec<Span>, BackendError> {
        let count = document_pages(document)?;
        if page >= count {
            return Err(BackendError::PageOutOfRange { page, count });
        }
        let loaded = document
            .load_page(page as i32)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let text_page = loaded
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let xml = text_page
            .to_xml(page as i32)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        spans_from_stext_xml(&xml)
    }
}

fn document_pages(document: &Document) -> Result<usize, BackendError> {
    let count = document
        .page_count()
        .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
    Ok(count.max(0) as usize)
}

impl SpanSource for MupdfBackend {
    fn page_count(&self, path: &Path) -> Result<usize, BackendError> {
        document_pages(&Self::open(path)?)
    }

    fn extract_spans(&self, path: &Path, page: usize) -> Result<Vec<Span>, BackendError> {
        self.page_spans(&Self::open(path)?, page)
    }

    fn extract_leading_pages(
        &self,
        path: &Path,
        max_pages: usize,
    ) -> Result<Vec<Vec<Span>>, BackendError> {
        let document = Self::open(path)?;
        let count = document_pages(&document)?;
        if count == 0 {
            return Err(BackendError::PageOutOfRange { page: 0, count });
        }
        (0..max_pages.min(count))
            .map(|page| self.page_spans(&document, page))
            .collect()
    }
}

// ── Font names ──

/// Drop a subset tag such as `ABCDEF+` from an embedded font name.
fn base_font_name(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// Style flags guessed from a font name, covering the PostScript naming
/// conventions and the Computer Modern families TeX papers embed.
fn style_from_font_name(name: &str) -> StyleFlags {
    let lower = name.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
    let tex = |prefixes: &[&str]| prefixes.iter().any(|p| lower.starts_with(p));

    let mut flags = StyleFlags::empty();
    if has(&["bold", "heavy", "black", "semibold"]) || tex(&["cmbx", "cmb", "sfbx"]) {
        flags.insert(StyleFlags::BOLD);
    }
    if has(&["italic", "oblique"]) || tex(&["cmti", "cmmi", "cmsl", "cmbxti"]) {
        flags.insert(StyleFlags::ITALIC);
    }
    if has(&["courier", "mono", "consolas", "menlo"]) || tex(&["cmtt", "sftt"]) {
        flags.insert(StyleFlags::MONOSPACE);
    } else if !has(&["sans"]) && !tex(&["cmss", "sfss"]) {
        let serif = has(&["times", "georgia", "garamond", "palatino", "serif", "roman"])
            || tex(&["cm", "sfrm", "nimbusrom", "lmroman"]);
        if serif {
            flags.insert(StyleFlags::SERIF);
        }
    }
    flags
}

// ── Structured-text XML as printed by MuPDF ──

/// Font in effect for the characters that follow.
#[derive(Debug, Clone, Default)]
struct FontState {
    name: String,
    size: f32,
}

impl FontState {
    /// `<font name=.. size=..>` in current MuPDF, `<span font=.. size=..>`
    /// in older releases.
    fn from_element(e: &BytesStart) -> Result<Self, BackendError> {
        let mut font = Self::default();
        for attr in e.attributes().flatten() {
            let value = attr.unescape_value().map_err(xml_error)?;
            match attr.key.as_ref() {
                b"name" | b"font" => font.name = base_font_name(&value).to_string(),
                b"size" => font.size = value.trim().parse().unwrap_or(0.0),
                _ => {}
            }
        }
        Ok(font)
    }

    fn same_as(&self, name: &str, size: f32) -> bool {
        self.name == name && (self.size - size).abs() < 0.01
    }
}

/// One `<char>` element.
#[derive(Debug)]
struct Glyph {
    text: String,
    rect: Option<Rect>,
    baseline: Option<f32>,
}

impl Glyph {
    fn from_element(e: &BytesStart) -> Result<Self, BackendError> {
        let mut glyph = Glyph {
            text: String::new(),
            rect: None,
            baseline: None,
        };
        for attr in e.attributes().flatten() {
            let value = attr.unescape_value().map_err(xml_error)?;
            match attr.key.as_ref() {
                b"c" => glyph.text = value.into_owned(),
                b"quad" => glyph.rect = rect_from_numbers(&value, 8),
                b"bbox" if glyph.rect.is_none() => glyph.rect = rect_from_numbers(&value, 4),
                b"y" => glyph.baseline = value.trim().parse().ok(),
                _ => {}
            }
        }
        Ok(glyph)
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Bounding box of a `quad` (four corners) or `bbox` (two corners) attribute.
fn rect_from_numbers(value: &str, expected: usize) -> Option<Rect> {
    let numbers: Vec<f32> = value
        .split_whitespace()
        .filter_map(|n| n.parse().ok())
        .collect();
    if numbers.len() != expected {
        return None;
    }
    let xs = numbers.iter().step_by(2);
    let ys = numbers.iter().skip(1).step_by(2);
    Some(Rect::new(
        xs.clone().copied().fold(f32::INFINITY, f32::min),
        ys.clone().copied().fold(f32::INFINITY, f32::min),
        xs.copied().fold(f32::NEG_INFINITY, f32::max),
        ys.copied().fold(f32::NEG_INFINITY, f32::max),
    ))
}

fn union(a: Rect, b: Rect) -> Rect {
    Rect::new(a.x0.min(b.x0), a.y0.min(b.y0), a.x1.max(b.x1), a.y1.max(b.y1))
}

/// Characters of one line sharing a font name and size.
#[derive(Debug)]
struct Run {
    font: FontState,
    text: String,
    rect: Option<Rect>,
    baseline: Option<f32>,
}

impl Run {
    fn new(font: &FontState) -> Self {
        Run {
            font: font.clone(),
            text: String::new(),
            rect: None,
            baseline: None,
        }
    }

    fn push(&mut self, glyph: Glyph) {
        self.text.push_str(&glyph.text);
        if glyph.is_blank() {
            return;
        }
        if let Some(rect) = glyph.rect {
            self.rect = Some(self.rect.map_or(rect, |acc| union(acc, rect)));
        }
        if self.baseline.is_none() {
            self.baseline = glyph.baseline;
        }
    }
}

/// A finished run with its position, before superscript marking.
#[derive(Debug)]
struct Piece {
    span: Span,
    baseline: f32,
}

/// Runs of the line being read.
#[derive(Debug, Default)]
struct LineRuns(Vec<Run>);

impl LineRuns {
    fn push(&mut self, font: &FontState, glyph: Glyph) {
        if let Some(run) = self.0.last_mut() {
            if run.font.same_as(&font.name, font.size) {
                run.push(glyph);
                return;
            }
            // Spaces never open a run of their own.
            if glyph.is_blank() {
                run.text.push_str(&glyph.text);
                return;
            }
        } else if glyph.is_blank() {
            return;
        }
        let mut run = Run::new(font);
        run.push(glyph);
        self.0.push(run);
    }

    fn finish(&mut self, pieces: &mut Vec<Piece>) {
        for run in self.0.drain(..) {
            let text = collapse_whitespace(&run.text);
            let Some(rect) = run.rect else { continue };
            if text.is_empty() {
                continue;
            }
            let flags = style_from_font_name(&run.font.name);
            pieces.push(Piece {
                baseline: run.baseline.unwrap_or(rect.y1),
                span: Span::new(text, rect, run.font.name, run.font.size).with_flags(flags),
            });
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Runs this much smaller than their neighbour count as superscript...
const SUPERSCRIPT_SIZE_RATIO: f32 = 0.9;
/// ...when raised by at least this fraction of the neighbour's size.
const SUPERSCRIPT_RISE: f32 = 0.15;

fn is_raised_over(small: &Piece, host: &Piece) -> bool {
    let (s, h) = (&small.span, &host.span);
    s.font_size < h.font_size * SUPERSCRIPT_SIZE_RATIO
        && s.rect.y0 < h.rect.y1
        && s.rect.y1 > h.rect.y0
        && small.baseline < host.baseline - h.font_size * SUPERSCRIPT_RISE
}

/// Flag raised small runs as superscript and move their top edge onto the
/// text they annotate, so that sorting keeps them right after it.
///
/// MuPDF sometimes puts a raised run in a `<line>` of its own, so hosts are
/// looked up across the whole page rather than within one line.
fn mark_superscripts(pieces: &mut [Piece]) {
    let raised: Vec<(usize, f32)> = pieces
        .iter()
        .enumerate()
        .filter_map(|(i, small)| {
            pieces
                .iter()
                .enumerate()
                .filter(|(j, host)| *j != i && is_raised_over(small, host))
                .min_by(|(_, a), (_, b)| {
                    let gap = |h: &Piece| (small.span.rect.x0 - h.span.rect.x1).abs();
                    gap(*a).total_cmp(&gap(*b))
                })
                .map(|(_, host)| (i, host.span.rect.y0))
        })
        .collect();

    for (i, host_y0) in raised {
        let span = &mut pieces[i].span;
        span.style_flags.insert(StyleFlags::SUPERSCRIPT);
        span.rect.y1 = span.rect.y1.max(host_y0);
        span.rect.y0 = host_y0;
    }
}

fn xml_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::ExtractionError(format!("structured-text XML: {e}"))
}

/// Convert MuPDF structured-text XML into spans, in extraction order.
pub fn spans_from_stext_xml(xml: &str) -> Result<Vec<Span>, BackendError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pieces = Vec::new();
    let mut line = LineRuns::default();
    let mut font = FontState::default();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.name().as_ref() {
                    b"font" | b"span" => font = FontState::from_element(&e)?,
                    b"char" => line.push(&font, Glyph::from_element(&e)?),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"char" => line.push(&font, Glyph::from_element(&e)?),
                b"font" | b"span" => font = FontState::from_element(&e)?,
                _ => {}
            },
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == b"line" {
                    line.finish(&mut pieces);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(xml_error(format_args!(
                    "{} at byte {}",
                    e,
                    reader.buffer_position()
                )));
            }
        }
    }
    if depth != 0 {
        return Err(xml_error("unexpected end of document"));
    }

    mark_superscripts(&mut pieces);
    Ok(pieces.into_iter().map(|p| p.span).collect())
}
