use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::error::RepertoireError;
use crate::models::{Show, ShowInput};

use super::setlist::clear_setlist;

fn show_from_row(row: &Row<'_>) -> rusqlite::Result<Show> {
    Ok(Show {
        id: row.get(0)?,
        date: row.get(1)?,
        venue: row.get(2)?,
        performer: row.get(3)?,
    })
}

/// Retrieve every show. Dates are free text, so the descending order is the
/// textual one the legacy screen used.
pub fn fetch_shows(conn: &Connection) -> Result<Vec<Show>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, data_show, local_show, artista FROM shows
             ORDER BY data_show DESC, id DESC",
        )
        .context("failed to prepare show query")?;

    let shows = stmt
        .query_map([], show_from_row)
        .context("failed to load shows")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect shows")?;

    Ok(shows)
}

/// Load one show, failing with `ShowNotFound` when the id is unknown.
pub fn fetch_show(conn: &Connection, id: i64) -> Result<Show> {
    conn.query_row(
        "SELECT id, data_show, local_show, artista FROM shows WHERE id = ?1",
        params![id],
        show_from_row,
    )
    .optional()
    .context("failed to load show")?
    .ok_or_else(|| RepertoireError::ShowNotFound(id).into())
}

/// Insert a new show, returning the hydrated struct.
pub fn create_show(conn: &Connection, input: &ShowInput) -> Result<Show> {
    conn.execute(
        "INSERT INTO shows (data_show, local_show, artista) VALUES (?1, ?2, ?3)",
        params![input.date, input.venue, input.performer],
    )
    .context("failed to insert show")?;

    let id = conn.last_insert_rowid();
    info!(show_id = id, performer = %input.performer, "show created");
    Ok(Show {
        id,
        date: input.date.clone(),
        venue: input.venue.clone(),
        performer: input.performer.clone(),
    })
}

/// Update the date, venue and performer of an existing show.
pub fn update_show(conn: &Connection, id: i64, input: &ShowInput) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE shows SET data_show = ?1, local_show = ?2, artista = ?3 WHERE id = ?4",
            params![input.date, input.venue, input.performer, id],
        )
        .context("failed to update show")?;

    if updated == 0 {
        Err(RepertoireError::ShowNotFound(id).into())
    } else {
        info!(show_id = id, "show updated");
        Ok(())
    }
}

/// Remove a show together with its setlist. Links go first, then the show,
/// inside one transaction that rolls back if either step fails.
pub fn delete_show(conn: &Connection, id: i64) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start show deletion")?;

    let cleared = clear_setlist(&tx, id)?;
    let deleted = tx
        .execute("DELETE FROM shows WHERE id = ?1", params![id])
        .context("failed to delete show")?;

    if deleted == 0 {
        return Err(RepertoireError::ShowNotFound(id).into());
    }

    tx.commit().context("failed to commit show deletion")?;
    info!(show_id = id, cleared, "show deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{append_song, count_entries, create_song, open_in_memory};
    use crate::error::domain_error;
    use crate::models::SongInput;

    fn show_input(date: &str) -> ShowInput {
        ShowInput::new(date, "Bar X", "Trio Y").unwrap()
    }

    #[test]
    fn create_update_and_fetch() {
        let conn = open_in_memory().unwrap();
        let show = create_show(&conn, &show_input("01/01/2025")).unwrap();

        let edited = ShowInput::new("02/01/2025", "Teatro", "Trio Y").unwrap();
        update_show(&conn, show.id, &edited).unwrap();

        let stored = fetch_show(&conn, show.id).unwrap();
        assert_eq!(stored.date, "02/01/2025");
        assert_eq!(stored.venue, "Teatro");
    }

    #[test]
    fn shows_are_listed_by_date_text_descending() {
        let conn = open_in_memory().unwrap();
        create_show(&conn, &show_input("01/01/2025")).unwrap();
        create_show(&conn, &show_input("15/03/2024")).unwrap();

        let dates: Vec<String> = fetch_shows(&conn).unwrap().into_iter().map(|s| s.date).collect();
        assert_eq!(dates, ["15/03/2024", "01/01/2025"]);
    }

    #[test]
    fn delete_show_clears_its_setlist() {
        let conn = open_in_memory().unwrap();
        let show = create_show(&conn, &show_input("01/01/2025")).unwrap();
        let other = create_show(&conn, &show_input("02/01/2025")).unwrap();
        let song = create_song(&conn, &SongInput::new("Wave", None, None, None, None).unwrap())
            .unwrap();
        append_song(&conn, show.id, song.id).unwrap();
        append_song(&conn, other.id, song.id).unwrap();

        delete_show(&conn, show.id).unwrap();

        assert_eq!(count_entries(&conn, show.id).unwrap(), 0);
        assert_eq!(count_entries(&conn, other.id).unwrap(), 1);
        let err = fetch_show(&conn, show.id).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::ShowNotFound(_))));
    }

    #[test]
    fn deleting_unknown_show_rolls_back() {
        let conn = open_in_memory().unwrap();
        let err = delete_show(&conn, 42).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::ShowNotFound(42))));
    }
}
