//! Printable setlist export: chord markup, page layout and the PDF backend.

mod layout;
mod markup;
mod pdf;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;
use tracing::info;

use crate::db::{fetch_setlist, fetch_show};
use crate::error::RepertoireError;
use crate::models::{SetlistItem, Show};

pub use layout::{font_size, line_length};
pub use markup::{tokenize, ChordToken, ARROW};

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("file name pattern is valid"));

/// Render a show's setlist to PDF bytes. An empty setlist is rejected.
pub fn render_setlist_pdf(show: &Show, items: &[SetlistItem]) -> Result<Vec<u8>> {
    let plan = layout::plan_document(items).ok_or(RepertoireError::NothingToExport)?;
    let bytes = pdf::render(&show.heading(), &plan).context("failed to render setlist")?;
    Ok(bytes)
}

/// Load the show and its setlist, render them and write the PDF to `path`.
/// Nothing is written when the setlist is empty.
pub fn export_setlist_pdf(conn: &Connection, show_id: i64, path: &Path) -> Result<()> {
    let show = fetch_show(conn, show_id)?;
    let items = fetch_setlist(conn, show_id)?;
    let bytes = render_setlist_pdf(&show, &items)?;

    fs::write(path, bytes)
        .map_err(RepertoireError::Io)
        .with_context(|| format!("failed to write PDF to {}", path.display()))?;
    info!(show_id, songs = items.len(), path = %path.display(), "setlist exported");
    Ok(())
}

/// `{DD-MM-YYYY}-{performer}-{venue}.pdf`, restricted to safe characters.
pub fn pdf_file_name(show: &Show) -> String {
    let date = match NaiveDate::parse_from_str(show.date.trim(), "%d/%m/%Y") {
        Ok(date) => date.format("%d-%m-%Y").to_string(),
        Err(_) => show.date.replace('/', "-"),
    };
    let raw = format!("{date}-{}-{}", show.performer, show.venue);
    let cleaned = UNSAFE_CHARS.replace_all(&raw, "");
    format!("{}.pdf", cleaned.replace(' ', "-"))
}

/// Default destination for a show's PDF inside `dir`.
pub fn default_pdf_path(dir: &Path, show: &Show) -> PathBuf {
    dir.join(pdf_file_name(show))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(date: &str, venue: &str, performer: &str) -> Show {
        Show {
            id: 1,
            date: date.to_string(),
            venue: venue.to_string(),
            performer: performer.to_string(),
        }
    }

    #[test]
    fn file_name_uses_dashed_date_and_drops_unsafe_characters() {
        let show = show("05/03/2025", "Bar do Zé!", "Trio Jazz & Cia");
        assert_eq!(pdf_file_name(&show), "05-03-2025-Trio-Jazz--Cia-Bar-do-Zé.pdf");
    }

    #[test]
    fn unparseable_dates_only_swap_slashes() {
        let show = show("Mar/2025", "Bar", "Trio");
        assert_eq!(pdf_file_name(&show), "Mar-2025-Trio-Bar.pdf");
    }

    #[test]
    fn empty_setlist_is_not_rendered() {
        let err = render_setlist_pdf(&show("01/01/2025", "Bar", "Trio"), &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RepertoireError>(),
            Some(RepertoireError::NothingToExport)
        ));
    }

    #[test]
    fn rendered_document_is_a_pdf() {
        let items = vec![SetlistItem {
            entry_id: 1,
            song_id: 1,
            song_name: "Águas de Março".to_string(),
            song_author: Some("Tom Jobim".to_string()),
            key: Some("(C)".to_string()),
            chords: Some("C/Bb [intro] -- A7".to_string()),
            position: 1,
            rank: 1,
        }];
        let bytes = render_setlist_pdf(&show("01/01/2025", "Bar", "Trio"), &items).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
