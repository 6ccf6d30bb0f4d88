//! Backup and restore of the whole catalog as a portable JSON document.
//!
//! Surrogate ids never leave the database: setlist links are written with the
//! natural keys of their show and song, and resolved again on import. Imports
//! only ever insert, so running the same file twice adds nothing the second
//! time.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RepertoireError;
use crate::models::{ShowInput, SongInput};

/// `(name, author, style, key, chords)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord(
    pub String,
    pub Option<String>,
    pub Option<String>,
    pub Option<String>,
    pub Option<String>,
);

/// `(date, venue, performer)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRecord(pub String, pub String, pub String);

/// `(show date, venue, performer, song name, song author, position)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord(
    pub String,
    pub String,
    pub String,
    pub String,
    pub Option<String>,
    pub i64,
);

/// On-disk layout of a backup file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub musicas: Vec<SongRecord>,
    pub shows: Vec<ShowRecord>,
    pub repertorios: Vec<LinkRecord>,
}

/// What an import actually added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub songs: usize,
    pub shows: usize,
    pub links: usize,
    /// Records that could not be applied (songs or shows failing the same
    /// validation as the forms, links whose show or song is missing from both
    /// the file and the database).
    pub skipped: usize,
}

impl ImportSummary {
    pub fn is_empty(&self) -> bool {
        self.songs == 0 && self.shows == 0 && self.links == 0
    }
}

/// Default file name offered when saving a backup.
pub fn backup_file_name(today: NaiveDate) -> String {
    format!("repertorio-backup-{}.json", today.format("%Y-%m-%d"))
}

/// Snapshot the three tables.
pub fn export_backup(conn: &Connection) -> Result<Backup> {
    let mut stmt = conn
        .prepare("SELECT musica, autor, estilo, tom, cifra FROM musicas ORDER BY id")
        .context("failed to prepare song export")?;
    let musicas = stmt
        .query_map([], |row| {
            Ok(SongRecord(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })
        .context("failed to export songs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect exported songs")?;

    let mut stmt = conn
        .prepare("SELECT data_show, local_show, artista FROM shows ORDER BY id")
        .context("failed to prepare show export")?;
    let shows = stmt
        .query_map([], |row| Ok(ShowRecord(row.get(0)?, row.get(1)?, row.get(2)?)))
        .context("failed to export shows")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect exported shows")?;

    let mut stmt = conn
        .prepare(
            "SELECT s.data_show, s.local_show, s.artista, m.musica, m.autor, rs.sequencia
             FROM repertorios_shows rs
             INNER JOIN shows s ON rs.id_show = s.id
             INNER JOIN musicas m ON rs.id_musica = m.id
             ORDER BY s.id, rs.sequencia, rs.id",
        )
        .context("failed to prepare setlist export")?;
    let repertorios = stmt
        .query_map([], |row| {
            Ok(LinkRecord(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })
        .context("failed to export setlists")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect exported setlists")?;

    Ok(Backup {
        musicas,
        shows,
        repertorios,
    })
}

/// Merge a backup into the database. Nothing is ever updated; songs, shows
/// and links are inserted only when no matching row exists. Records are
/// normalized exactly as the forms normalize them before matching. The whole
/// import is committed once at the end.
pub fn import_backup(conn: &Connection, backup: &Backup) -> Result<ImportSummary> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start backup import")?;
    let mut summary = ImportSummary::default();

    for SongRecord(name, author, style, key, chords) in &backup.musicas {
        let input = match SongInput::new(
            name,
            author.as_deref(),
            style.as_deref(),
            key.as_deref(),
            chords.as_deref(),
        ) {
            Ok(input) => input,
            Err(err) => {
                warn!(%name, %err, "skipping invalid song");
                summary.skipped += 1;
                continue;
            }
        };
        if find_song(&tx, &input.name, input.author.as_deref())?.is_some() {
            continue;
        }
        tx.execute(
            "INSERT INTO musicas (musica, autor, estilo, tom, cifra) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![input.name, input.author, input.style, input.key, input.chords],
        )
        .context("failed to import song")?;
        summary.songs += 1;
    }

    for ShowRecord(date, venue, performer) in &backup.shows {
        let input = match ShowInput::new(date, venue, performer) {
            Ok(input) => input,
            Err(err) => {
                warn!(%date, %venue, %err, "skipping invalid show");
                summary.skipped += 1;
                continue;
            }
        };
        if find_show(&tx, &input.date, &input.venue, &input.performer)?.is_some() {
            continue;
        }
        tx.execute(
            "INSERT INTO shows (data_show, local_show, artista) VALUES (?1, ?2, ?3)",
            params![input.date, input.venue, input.performer],
        )
        .context("failed to import show")?;
        summary.shows += 1;
    }

    for LinkRecord(date, venue, performer, song_name, song_author, position) in &backup.repertorios
    {
        let show = ShowInput::new(date, venue, performer).ok();
        let song = SongInput::new(song_name, song_author.as_deref(), None, None, None).ok();
        let show_id = match &show {
            Some(show) => find_show(&tx, &show.date, &show.venue, &show.performer)?,
            None => None,
        };
        let song_id = match &song {
            Some(song) => find_song(&tx, &song.name, song.author.as_deref())?,
            None => None,
        };
        let (Some(show_id), Some(song_id)) = (show_id, song_id) else {
            warn!(%song_name, %performer, %date, "skipping setlist link with unknown show or song");
            summary.skipped += 1;
            continue;
        };

        if link_exists(&tx, show_id, song_id)? {
            continue;
        }

        let position = import_position(&tx, show_id, *position)?;
        tx.execute(
            "INSERT INTO repertorios_shows (id_show, id_musica, sequencia) VALUES (?1, ?2, ?3)",
            params![show_id, song_id, position],
        )
        .context("failed to import setlist link")?;
        summary.links += 1;
    }

    tx.commit().context("failed to commit backup import")?;
    info!(
        songs = summary.songs,
        shows = summary.shows,
        links = summary.links,
        skipped = summary.skipped,
        "backup imported"
    );
    Ok(summary)
}

/// Export the database to `path` as pretty-printed JSON.
pub fn write_backup(conn: &Connection, path: &Path) -> Result<Backup> {
    let backup = export_backup(conn)?;
    let json = serde_json::to_string_pretty(&backup).map_err(RepertoireError::Parse)?;
    fs::write(path, json)
        .map_err(RepertoireError::Io)
        .with_context(|| format!("failed to write backup to {}", path.display()))?;
    info!(
        path = %path.display(),
        songs = backup.musicas.len(),
        shows = backup.shows.len(),
        links = backup.repertorios.len(),
        "backup written"
    );
    Ok(backup)
}

/// Decode a backup file without touching the database.
pub fn read_backup(path: &Path) -> Result<Backup> {
    let text = fs::read_to_string(path)
        .map_err(RepertoireError::Io)
        .with_context(|| format!("failed to read backup from {}", path.display()))?;
    let backup = serde_json::from_str(&text)
        .map_err(RepertoireError::Parse)
        .with_context(|| format!("failed to decode backup {}", path.display()))?;
    Ok(backup)
}

/// Read `path` and merge it into the database.
pub fn restore_backup(conn: &Connection, path: &Path) -> Result<ImportSummary> {
    let backup = read_backup(path)?;
    import_backup(conn, &backup)
}

/// Case-insensitive name match where a missing author equals a blank one.
fn find_song(conn: &Connection, name: &str, author: Option<&str>) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM musicas
         WHERE LOWER(musica) = LOWER(?1)
           AND COALESCE(LOWER(autor), '') = COALESCE(LOWER(?2), '')
         ORDER BY id LIMIT 1",
        params![name, author],
        |row| row.get(0),
    )
    .optional()
    .context("failed to match song by natural key")
}

fn find_show(conn: &Connection, date: &str, venue: &str, performer: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM shows
         WHERE data_show IS ?1 AND local_show IS ?2 AND artista IS ?3
         ORDER BY id LIMIT 1",
        params![date, venue, performer],
        |row| row.get(0),
    )
    .optional()
    .context("failed to match show by natural key")
}

fn link_exists(conn: &Connection, show_id: i64, song_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM repertorios_shows WHERE id_show = ?1 AND id_musica = ?2",
            params![show_id, song_id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to match setlist link")?;
    Ok(found.is_some())
}

/// Keep the backed-up position when it is free in the target show, otherwise
/// append after the current last entry.
fn import_position(conn: &Connection, show_id: i64, wanted: i64) -> Result<i64> {
    if wanted >= 1 {
        let taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM repertorios_shows WHERE id_show = ?1 AND sequencia = ?2 LIMIT 1",
                params![show_id, wanted],
                |row| row.get(0),
            )
            .optional()
            .context("failed to check imported position")?;
        if taken.is_none() {
            return Ok(wanted);
        }
    }

    conn.query_row(
        "SELECT COALESCE(MAX(sequencia), 0) + 1 FROM repertorios_shows WHERE id_show = ?1",
        params![show_id],
        |row| row.get(0),
    )
    .context("failed to compute imported position")
}
