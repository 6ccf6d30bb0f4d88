//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. They stay light-weight data holders; validation of form input happens
//! in the `*Input` constructors so the persistence layer only ever sees
//! normalized values.

use std::fmt;

use crate::error::RepertoireError;

/// Styles offered by the song form. Any other free text is accepted as well.
pub const MUSIC_STYLES: &[&str] = &[
    "Samba",
    "Salsa",
    "Bossa Nova",
    "MPB",
    "Rock",
    "Pop",
    "Jazz",
    "Blues",
    "Funk",
    "Forró",
    "Axé",
    "Pagode",
    "Sertanejo",
    "Rap",
    "Hip Hop",
    "Reggae",
    "Eletrônica",
    "Clássica",
    "Gospel",
    "Outro",
];

#[derive(Debug, Clone, PartialEq, Eq)]
/// A song in the catalog (`musicas` table).
pub struct Song {
    /// Primary key from the SQLite store.
    pub id: i64,
    pub name: String,
    pub author: Option<String>,
    pub style: Option<String>,
    /// Always stored in its parenthesized form, see [`format_key`].
    pub key: Option<String>,
    /// Chord sheet with inline `[...]` annotations and `--` transitions.
    pub chords: Option<String>,
}

impl Song {
    /// Compose a `Name - Author` string that omits the hyphen when the author is
    /// missing. Lists and confirmation dialogs use this directly.
    pub fn display_title(&self) -> String {
        match self.author.as_deref() {
            Some(author) if !author.trim().is_empty() => format!("{} - {}", self.name, author),
            _ => self.name.clone(),
        }
    }

    /// Case-insensitive substring match over name, author and style, as used by
    /// the search boxes.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let contains = |value: Option<&str>| {
            value
                .map(|text| text.to_lowercase().contains(&query))
                .unwrap_or(false)
        };
        contains(Some(&self.name)) || contains(self.author.as_deref()) || contains(self.style.as_deref())
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_title())
    }
}

/// Validated, normalized values for inserting or updating a song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInput {
    pub name: String,
    pub author: Option<String>,
    pub style: Option<String>,
    pub key: Option<String>,
    pub chords: Option<String>,
}

impl SongInput {
    /// Trim every field, turn blanks into `None`, canonicalize the key and
    /// reject a missing name.
    pub fn new(
        name: &str,
        author: Option<&str>,
        style: Option<&str>,
        key: Option<&str>,
        chords: Option<&str>,
    ) -> Result<Self, RepertoireError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepertoireError::required("Song name"));
        }
        Ok(Self {
            name: name.to_string(),
            author: non_blank(author),
            style: non_blank(style),
            key: key.and_then(format_key),
            // Chord sheets keep their inner spacing; only fully blank text is dropped.
            chords: chords
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A performance date (`shows` table).
pub struct Show {
    pub id: i64,
    /// Free-form, conventionally `DD/MM/YYYY`.
    pub date: String,
    pub venue: String,
    pub performer: String,
}

impl Show {
    /// Heading used by the setlist screen: `performer - venue - date`.
    pub fn heading(&self) -> String {
        format!("{} - {} - {}", self.performer, self.venue, self.date)
    }
}

/// Validated values for inserting or updating a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowInput {
    pub date: String,
    pub venue: String,
    pub performer: String,
}

impl ShowInput {
    pub fn new(date: &str, venue: &str, performer: &str) -> Result<Self, RepertoireError> {
        let performer = performer.trim();
        if performer.is_empty() {
            return Err(RepertoireError::required("Performer"));
        }
        Ok(Self {
            date: date.trim().to_string(),
            venue: venue.trim().to_string(),
            performer: performer.to_string(),
        })
    }
}

/// A raw row of `repertorios_shows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetlistEntry {
    pub id: i64,
    pub show_id: i64,
    pub song_id: i64,
    /// Internal ordering key. Not necessarily dense, see [`SetlistItem::rank`].
    pub position: i64,
}

/// One row of a show's setlist joined with its song, ready for display/export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetlistItem {
    pub entry_id: i64,
    pub song_id: i64,
    pub song_name: String,
    pub song_author: Option<String>,
    pub key: Option<String>,
    pub chords: Option<String>,
    pub position: i64,
    /// 1-based index in iteration order, the "song #N" shown to the user.
    pub rank: usize,
}

/// Canonicalize a musical key: trim, strip every parenthesis, re-wrap in one
/// pair. Blank input yields `None`. Applying it twice is a no-op.
pub fn format_key(raw: &str) -> Option<String> {
    let bare: String = raw.trim().chars().filter(|ch| !matches!(ch, '(' | ')')).collect();
    let bare = bare.trim();
    if bare.is_empty() {
        None
    } else {
        Some(format!("({bare})"))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_key_wraps_bare_keys() {
        assert_eq!(format_key("C"), Some("(C)".to_string()));
        assert_eq!(format_key("  Am7 "), Some("(Am7)".to_string()));
    }

    #[test]
    fn format_key_is_idempotent() {
        for raw in ["C", "(C)", "((G#m))", " ( Bb ) ", "D)", "(E"] {
            let once = format_key(raw);
            let twice = once.as_deref().and_then(format_key);
            assert_eq!(once, twice, "input {raw:?}");
        }
        assert_eq!(format_key("((G#m))"), Some("(G#m)".to_string()));
    }

    #[test]
    fn format_key_drops_blank_values() {
        assert_eq!(format_key(""), None);
        assert_eq!(format_key("   "), None);
        assert_eq!(format_key("()"), None);
    }

    #[test]
    fn song_input_requires_a_name() {
        let err = SongInput::new("   ", None, None, None, None).unwrap_err();
        assert!(matches!(err, RepertoireError::Validation(_)));
    }

    #[test]
    fn song_input_normalizes_optional_fields() {
        let input = SongInput::new(" Garota ", Some("  "), Some("Bossa Nova"), Some("F"), Some(" "))
            .unwrap();
        assert_eq!(input.name, "Garota");
        assert_eq!(input.author, None);
        assert_eq!(input.style.as_deref(), Some("Bossa Nova"));
        assert_eq!(input.key.as_deref(), Some("(F)"));
        assert_eq!(input.chords, None);
    }

    #[test]
    fn show_input_requires_a_performer() {
        assert!(ShowInput::new("01/01/2025", "Bar X", " ").is_err());
        let show = ShowInput::new(" 01/01/2025 ", "Bar X", "Trio Y").unwrap();
        assert_eq!(show.date, "01/01/2025");
    }

    #[test]
    fn song_search_matches_name_author_and_style() {
        let song = Song {
            id: 1,
            name: "Águas de Março".to_string(),
            author: Some("Tom Jobim".to_string()),
            style: Some("MPB".to_string()),
            key: None,
            chords: None,
        };
        assert!(song.matches("águas"));
        assert!(song.matches("JOBIM"));
        assert!(song.matches("mpb"));
        assert!(!song.matches("samba"));
        assert!(song.matches(""));
    }
}
