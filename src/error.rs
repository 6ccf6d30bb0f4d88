//! Domain error taxonomy. Persistence helpers still return `anyhow::Result` so
//! every step can attach context, but the failures a user can act on are raised
//! as `RepertoireError` values inside the chain. The UI surfaces the root cause
//! and tests downcast to assert on the exact variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepertoireError {
    /// A required form field was left blank.
    #[error("{0}")]
    Validation(String),

    /// A song with the same name/author pair is already in the catalog.
    #[error("This song already exists in the catalog.")]
    DuplicateSong,

    /// The song is already linked to the show.
    #[error("This song is already in the setlist at position {position}: {song_name}")]
    DuplicateEntry { position: i64, song_name: String },

    #[error("Song {0} not found.")]
    SongNotFound(i64),

    #[error("Show {0} not found.")]
    ShowNotFound(i64),

    #[error("Setlist entry {0} not found.")]
    EntryNotFound(i64),

    /// PDF export was requested for a show without songs.
    #[error("No songs in the setlist to export.")]
    NothingToExport,

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// The backup file could not be decoded.
    #[error("Invalid backup file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to render PDF: {0}")]
    Pdf(String),
}

impl RepertoireError {
    /// Convenience for the common "field is required" case.
    pub fn required(field: &str) -> Self {
        RepertoireError::Validation(format!("{field} is required."))
    }
}

/// Find the domain error inside an `anyhow` chain, if any.
pub fn domain_error(err: &anyhow::Error) -> Option<&RepertoireError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<RepertoireError>())
}
