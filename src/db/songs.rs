use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::error::RepertoireError;
use crate::models::{Song, SongInput};

use super::setlist::detach_song;

const SONG_COLUMNS: &str = "id, musica, autor, estilo, tom, cifra";

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        name: row.get(1)?,
        author: row.get(2)?,
        style: row.get(3)?,
        key: row.get(4)?,
        chords: row.get(5)?,
    })
}

/// Fetch the whole catalog in insertion order.
pub fn fetch_all_songs(conn: &Connection) -> Result<Vec<Song>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {SONG_COLUMNS} FROM musicas ORDER BY id"))
        .context("failed to prepare all songs query")?;

    let songs = stmt
        .query_map([], song_from_row)
        .context("failed to iterate songs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect songs")?;

    Ok(songs)
}

/// Load one song, failing with `SongNotFound` when the id is unknown.
pub fn fetch_song(conn: &Connection, id: i64) -> Result<Song> {
    conn.query_row(
        &format!("SELECT {SONG_COLUMNS} FROM musicas WHERE id = ?1"),
        params![id],
        song_from_row,
    )
    .optional()
    .context("failed to load song")?
    .ok_or_else(|| RepertoireError::SongNotFound(id).into())
}

/// Retrieve distinct authors for the auto-complete in the song form. The
/// ordering sorts by lowercase first but falls back to the original text to
/// keep accents and capitalization intact.
pub fn fetch_authors(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT autor FROM musicas
             WHERE autor IS NOT NULL AND autor <> ''
             ORDER BY LOWER(autor), autor",
        )
        .context("failed to prepare author query")?;

    let mut rows = stmt.query([]).context("failed to execute author query")?;

    let mut authors = Vec::new();
    while let Some(row) = rows.next().context("failed to fetch author row")? {
        let author: String = row.get(0).context("failed to read author value")?;
        authors.push(author);
    }

    Ok(authors)
}

/// Whether another song already uses this name/author pair, compared
/// case-insensitively. Without an author any song with the same name counts.
/// `exclude_id` skips the row being edited.
pub fn song_exists(
    conn: &Connection,
    name: &str,
    author: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM musicas
             WHERE LOWER(musica) = LOWER(?1)
               AND (?2 IS NULL OR LOWER(autor) = LOWER(?2))
               AND (?3 IS NULL OR id <> ?3)
             LIMIT 1",
            params![name, author, exclude_id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to check for duplicate song")?;

    Ok(found.is_some())
}

/// Insert a brand new song after the duplicate check. We echo the hydrated
/// struct so callers can update UI state without re-querying.
pub fn create_song(conn: &Connection, input: &SongInput) -> Result<Song> {
    if song_exists(conn, &input.name, input.author.as_deref(), None)? {
        return Err(RepertoireError::DuplicateSong.into());
    }

    conn.execute(
        "INSERT INTO musicas (musica, autor, estilo, tom, cifra) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![input.name, input.author, input.style, input.key, input.chords],
    )
    .context("failed to insert song")?;

    let id = conn.last_insert_rowid();
    info!(song_id = id, name = %input.name, "song created");
    Ok(Song {
        id,
        name: input.name.clone(),
        author: input.author.clone(),
        style: input.style.clone(),
        key: input.key.clone(),
        chords: input.chords.clone(),
    })
}

/// Update all editable song fields, re-running the duplicate check against
/// every other row.
pub fn update_song(conn: &Connection, id: i64, input: &SongInput) -> Result<()> {
    if song_exists(conn, &input.name, input.author.as_deref(), Some(id))? {
        return Err(RepertoireError::DuplicateSong.into());
    }

    let updated = conn
        .execute(
            "UPDATE musicas SET musica = ?1, autor = ?2, estilo = ?3, tom = ?4, cifra = ?5
             WHERE id = ?6",
            params![input.name, input.author, input.style, input.key, input.chords, id],
        )
        .context("failed to update song")?;

    if updated == 0 {
        Err(RepertoireError::SongNotFound(id).into())
    } else {
        info!(song_id = id, "song updated");
        Ok(())
    }
}

/// Permanently delete a song. The schema does not cascade, so the song is first
/// detached from every setlist; both steps share one transaction.
pub fn delete_song(conn: &Connection, id: i64) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start song deletion")?;

    let detached = detach_song(&tx, id)?;
    let deleted = tx
        .execute("DELETE FROM musicas WHERE id = ?1", params![id])
        .context("failed to delete song")?;

    if deleted == 0 {
        return Err(RepertoireError::SongNotFound(id).into());
    }

    tx.commit().context("failed to commit song deletion")?;
    info!(song_id = id, detached, "song deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{append_song, create_show, fetch_setlist, open_in_memory};
    use crate::error::domain_error;
    use crate::models::ShowInput;

    fn input(name: &str, author: Option<&str>) -> SongInput {
        SongInput::new(name, author, None, None, None).unwrap()
    }

    #[test]
    fn rejects_case_insensitive_duplicates() {
        let conn = open_in_memory().unwrap();
        create_song(&conn, &input("Garota de Ipanema", Some("Tom Jobim"))).unwrap();

        let err = create_song(&conn, &input("GAROTA DE IPANEMA", Some("tom jobim"))).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::DuplicateSong)));
        assert_eq!(fetch_all_songs(&conn).unwrap().len(), 1);
    }

    #[test]
    fn same_name_with_other_author_is_allowed() {
        let conn = open_in_memory().unwrap();
        create_song(&conn, &input("Carinhoso", Some("Pixinguinha"))).unwrap();
        create_song(&conn, &input("Carinhoso", Some("Marisa Monte"))).unwrap();
        assert_eq!(fetch_all_songs(&conn).unwrap().len(), 2);
    }

    #[test]
    fn missing_author_matches_on_name_alone() {
        let conn = open_in_memory().unwrap();
        create_song(&conn, &input("Carinhoso", Some("Pixinguinha"))).unwrap();
        let err = create_song(&conn, &input("carinhoso", None)).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::DuplicateSong)));
    }

    #[test]
    fn update_excludes_the_edited_row_from_the_duplicate_check() {
        let conn = open_in_memory().unwrap();
        let song = create_song(&conn, &input("Garota de Ipanema", Some("Tom Jobim"))).unwrap();
        let other = create_song(&conn, &input("Wave", Some("Tom Jobim"))).unwrap();

        let renamed = SongInput::new("garota de ipanema", Some("Tom Jobim"), None, Some("F"), None)
            .unwrap();
        update_song(&conn, song.id, &renamed).unwrap();
        assert_eq!(fetch_song(&conn, song.id).unwrap().key.as_deref(), Some("(F)"));

        let err = update_song(&conn, other.id, &renamed).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::DuplicateSong)));
    }

    #[test]
    fn update_unknown_song_fails() {
        let conn = open_in_memory().unwrap();
        let err = update_song(&conn, 99, &input("Wave", None)).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::SongNotFound(99))));
    }

    #[test]
    fn delete_song_removes_it_from_setlists() {
        let conn = open_in_memory().unwrap();
        let song = create_song(&conn, &input("Wave", Some("Tom Jobim"))).unwrap();
        let keep = create_song(&conn, &input("Corcovado", Some("Tom Jobim"))).unwrap();
        let show = create_show(&conn, &ShowInput::new("01/01/2025", "Bar X", "Trio Y").unwrap())
            .unwrap();
        append_song(&conn, show.id, song.id).unwrap();
        append_song(&conn, show.id, keep.id).unwrap();

        delete_song(&conn, song.id).unwrap();

        let setlist = fetch_setlist(&conn, show.id).unwrap();
        assert_eq!(setlist.len(), 1);
        assert_eq!(setlist[0].song_id, keep.id);
        assert!(fetch_song(&conn, song.id).is_err());
    }

    #[test]
    fn authors_are_distinct_and_sorted() {
        let conn = open_in_memory().unwrap();
        create_song(&conn, &input("Wave", Some("Tom Jobim"))).unwrap();
        create_song(&conn, &input("Corcovado", Some("Tom Jobim"))).unwrap();
        create_song(&conn, &input("Carinhoso", Some("anônimo"))).unwrap();
        create_song(&conn, &input("Asa Branca", None)).unwrap();

        assert_eq!(fetch_authors(&conn).unwrap(), ["anônimo", "Tom Jobim"]);
    }
}
