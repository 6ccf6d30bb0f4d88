//! printpdf backend for a laid-out setlist.

use std::fmt;

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};

use crate::error::RepertoireError;

use super::layout::{DocumentPlan, PlacedRow, SpanStyle, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::markup::ARROW;

const LAYER_NAME: &str = "Setlist";
/// Builtin fonts only cover WinAnsi, so the arrow is drawn with the closest
/// glyph that encoding has.
const PDF_ARROW: &str = "»";

fn rgb(style: SpanStyle) -> (u8, u8, u8) {
    match style {
        SpanStyle::Arrow | SpanStyle::Transition => (255, 0, 0),
        SpanStyle::Key => (139, 69, 19),
        SpanStyle::Annotation => (0, 0, 255),
        SpanStyle::Name | SpanStyle::Chords => (0, 0, 0),
    }
}

fn color(style: SpanStyle) -> Color {
    let (r, g, b) = rgb(style);
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn pdf_text(text: &str) -> String {
    text.replace(ARROW, PDF_ARROW)
}

fn pdf_error(err: impl fmt::Debug) -> RepertoireError {
    RepertoireError::Pdf(format!("{err:?}"))
}

fn draw_row(layer: &PdfLayerReference, font: &IndirectFontRef, size: f32, row: &PlacedRow) {
    layer.begin_text_section();
    layer.set_font(font, size);
    layer.set_text_cursor(Mm(MARGIN_MM), Mm(row.baseline_mm));
    for span in &row.spans {
        layer.set_fill_color(color(span.style));
        layer.write_text(pdf_text(&span.text), font);
    }
    layer.end_text_section();
}

/// Render every page of the plan and return the encoded document.
pub fn render(title: &str, plan: &DocumentPlan) -> Result<Vec<u8>, RepertoireError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
    let font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (index, rows) in plan.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
            doc.get_page(page).get_layer(layer)
        };
        for row in rows {
            draw_row(&layer, &font, plan.font_size_pt, row);
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}
