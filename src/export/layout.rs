//! Turns an ordered setlist into positioned, styled rows on landscape pages.
//! Kept free of any PDF types so sizing, wrapping and pagination can be tested
//! directly.

use std::cmp::min;

use crate::models::SetlistItem;

use super::markup::{tokenize, ChordToken, ARROW};

/// A4 landscape.
pub const PAGE_WIDTH_MM: f32 = 297.0;
pub const PAGE_HEIGHT_MM: f32 = 210.0;
/// Body padding plus container padding.
pub const MARGIN_MM: f32 = 15.0;
/// Extra space after each song.
pub const SONG_GAP_MM: f32 = 3.0;
const LINE_HEIGHT: f32 = 1.2;
const MM_PER_PT: f32 = 0.352_778;
/// Average advance of Helvetica Bold, as a fraction of the font size.
const AVG_CHAR_WIDTH_EM: f32 = 0.6;

const MAX_FONT_SIZE: usize = 40;
const BASE_FONT_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Arrow,
    Name,
    Key,
    Chords,
    Annotation,
    Transition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

impl StyledSpan {
    fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One visual row at a fixed baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub baseline_mm: f32,
    pub spans: Vec<StyledSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub font_size_pt: f32,
    pub pages: Vec<Vec<PlacedRow>>,
}

/// Representative text length of a setlist line: arrow, name, key and the raw
/// chord sheet separated by spaces. A missing key or chord sheet counts as
/// empty, so sizes can differ slightly from older exports that printed `None`.
pub fn line_length(item: &SetlistItem) -> usize {
    format!(
        "{ARROW} {} {} {}",
        item.song_name,
        item.key.as_deref().unwrap_or_default(),
        item.chords.as_deref().unwrap_or_default()
    )
    .chars()
    .count()
}

/// Auto-fit font size: `min(40, 32 + longest / 3)`.
pub fn font_size(items: &[SetlistItem]) -> usize {
    let longest = items.iter().map(line_length).max().unwrap_or(0);
    min(MAX_FONT_SIZE, BASE_FONT_SIZE + longest / 3)
}

/// Styled spans of one song line, chord markup already applied.
pub fn build_line(item: &SetlistItem) -> Vec<StyledSpan> {
    let mut spans = vec![
        StyledSpan::new(ARROW, SpanStyle::Arrow),
        StyledSpan::new(format!(" {}", item.song_name), SpanStyle::Name),
    ];

    if let Some(key) = item.key.as_deref().filter(|key| !key.is_empty()) {
        spans.push(StyledSpan::new(format!(" {key}"), SpanStyle::Key));
    }

    if let Some(chords) = item.chords.as_deref().filter(|text| !text.trim().is_empty()) {
        spans.push(StyledSpan::new(" ", SpanStyle::Chords));
        for token in tokenize(chords) {
            spans.push(match token {
                ChordToken::Text(text) => StyledSpan::new(text, SpanStyle::Chords),
                ChordToken::Annotation(text) => StyledSpan::new(text, SpanStyle::Annotation),
                ChordToken::Transition => StyledSpan::new(ARROW, SpanStyle::Transition),
            });
        }
    }

    spans
}

/// Greedy word wrap across styled spans. Words longer than a full row are cut.
pub fn wrap_spans(spans: &[StyledSpan], max_chars: usize) -> Vec<Vec<StyledSpan>> {
    let max_chars = max_chars.max(1);
    let mut rows: Vec<Vec<StyledSpan>> = Vec::new();
    let mut row: Vec<StyledSpan> = Vec::new();
    let mut used = 0usize;

    for span in spans {
        for word in span.text.split_inclusive(' ') {
            let mut piece: String = word.to_string();
            loop {
                let len = piece.chars().count();
                if used + len <= max_chars {
                    push_piece(&mut row, piece, span.style);
                    used += len;
                    break;
                }
                if used > 0 {
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                    piece = piece.trim_start().to_string();
                    if piece.is_empty() {
                        break;
                    }
                    continue;
                }
                let head: String = piece.chars().take(max_chars).collect();
                let tail: String = piece.chars().skip(max_chars).collect();
                push_piece(&mut row, head, span.style);
                rows.push(std::mem::take(&mut row));
                piece = tail;
                if piece.is_empty() {
                    break;
                }
            }
        }
    }

    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

fn push_piece(row: &mut Vec<StyledSpan>, text: String, style: SpanStyle) {
    if text.is_empty() {
        return;
    }
    match row.last_mut() {
        Some(last) if last.style == style => last.text.push_str(&text),
        _ => row.push(StyledSpan::new(text, style)),
    }
}

/// Lay the whole setlist out on as many pages as needed. Returns `None` for an
/// empty setlist.
pub fn plan_document(items: &[SetlistItem]) -> Option<DocumentPlan> {
    if items.is_empty() {
        return None;
    }

    let font_size_pt = font_size(items) as f32;
    let font_mm = font_size_pt * MM_PER_PT;
    let row_height = font_mm * LINE_HEIGHT;
    let usable_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let chars_per_row = (usable_width / (font_mm * AVG_CHAR_WIDTH_EM)).floor() as usize;
    let top = PAGE_HEIGHT_MM - MARGIN_MM - font_mm;

    let mut pages = vec![Vec::new()];
    let mut baseline = top;

    for item in items {
        for spans in wrap_spans(&build_line(item), chars_per_row) {
            let page_has_rows = pages.last().is_some_and(|page: &Vec<PlacedRow>| !page.is_empty());
            if baseline < MARGIN_MM && page_has_rows {
                pages.push(Vec::new());
                baseline = top;
            }
            if let Some(page) = pages.last_mut() {
                page.push(PlacedRow {
                    baseline_mm: baseline,
                    spans,
                });
            }
            baseline -= row_height;
        }
        baseline -= SONG_GAP_MM;
    }

    Some(DocumentPlan {
        font_size_pt,
        pages,
    })
}
