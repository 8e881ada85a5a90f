//! Positioned text fragments and their reading order.

use std::cmp::Ordering;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page coordinates (origin top-left, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Font style bitset reported by the extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleFlags(u8);

impl StyleFlags {
    pub const SUPERSCRIPT: StyleFlags = StyleFlags(1);
    pub const ITALIC: StyleFlags = StyleFlags(1 << 1);
    pub const SERIF: StyleFlags = StyleFlags(1 << 2);
    pub const MONOSPACE: StyleFlags = StyleFlags(1 << 3);
    pub const BOLD: StyleFlags = StyleFlags(1 << 4);

    pub const fn empty() -> Self {
        StyleFlags(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: StyleFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: StyleFlags) {
        self.0 |= other.0;
    }

    /// Human-readable style list, `"Regular"` when no bit is set.
    pub fn describe(self) -> String {
        let names = [
            (Self::SUPERSCRIPT, "Superscripted"),
            (Self::ITALIC, "Italic"),
            (Self::SERIF, "Serifed"),
            (Self::MONOSPACE, "Monospaced"),
            (Self::BOLD, "Bold"),
        ];
        let styles: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if styles.is_empty() {
            "Regular".to_string()
        } else {
            styles.join(", ")
        }
    }
}

impl std::ops::BitOr for StyleFlags {
    type Output = StyleFlags;

    fn bitor(self, rhs: StyleFlags) -> StyleFlags {
        StyleFlags(self.0 | rhs.0)
    }
}

/// A single positioned text fragment as emitted by a [`crate::SpanSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub rect: Rect,
    pub font_name: String,
    pub font_size: f32,
    #[serde(default)]
    pub style_flags: StyleFlags,
}

impl Span {
    pub fn new(
        text: impl Into<String>,
        rect: Rect,
        font_name: impl Into<String>,
        font_size: f32,
    ) -> Self {
        Self {
            text: text.into(),
            rect,
            font_name: font_name.into(),
            font_size,
            style_flags: StyleFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.style_flags = flags;
        self
    }

    /// Whether `other` uses exactly the same font name and size.
    pub fn same_font(&self, other: &Span) -> bool {
        self.font_name == other.font_name && self.font_size == other.font_size
    }

    /// Whether `other` starts above this span's bottom edge, i.e. sits on the
    /// same text line or overlaps it vertically.
    pub fn shares_line_with(&self, other: &Span) -> bool {
        other.rect.y0 < self.rect.y1
    }
}

/// Reading-order comparison: top-to-bottom, then left-to-right.
pub fn reading_order(a: &Span, b: &Span) -> Ordering {
    a.rect
        .y0
        .total_cmp(&b.rect.y0)
        .then_with(|| a.rect.x0.total_cmp(&b.rect.x0))
}

/// Stable sort into reading order.
pub fn sort_spans(spans: &mut [Span]) {
    spans.sort_by(reading_order);
}

/// The spans of one page, sorted into reading order on construction.
///
/// Read-only after construction; every parsing stage borrows it as `&[Span]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSpans(Vec<Span>);

impl PageSpans {
    pub fn new(mut spans: Vec<Span>) -> Self {
        sort_spans(&mut spans);
        Self(spans)
    }

    pub fn into_inner(self) -> Vec<Span> {
        self.0
    }
}

impl Deref for PageSpans {
    type Target = [Span];

    fn deref(&self) -> &[Span] {
        &self.0
    }
}

impl From<Vec<Span>> for PageSpans {
    fn from(spans: Vec<Span>) -> Self {
        Self::new(spans)
    }
}

impl<'a> IntoIterator for &'a PageSpans {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
