//! Setlist engine: the ordered link between shows and songs.
//!
//! Each row of `repertorios_shows` carries a `sequencia` value used purely as an
//! ordering key. Appends go to `max + 1`, removals leave gaps behind, and moves
//! swap with whichever entry holds the neighbouring value. When no entry holds
//! it (a gap, or the tail) the moving entry takes the value anyway and leaves
//! a gap behind. Ties, which only such legacy moves produce, are listed by
//! entry id. The rank shown to the user is the enumeration index, so gaps
//! never show up in the UI.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::error::RepertoireError;
use crate::models::{SetlistEntry, SetlistItem};

/// Direction of a single-step move within a setlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    /// Offset applied to the stored position.
    pub fn offset(self) -> i64 {
        match self {
            MoveDirection::Up => -1,
            MoveDirection::Down => 1,
        }
    }
}

/// Which branch a move took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Already at position 1 and asked to go up; nothing changed.
    Clamped,
    /// Exchanged positions with the entry that held the target position.
    Swapped { with_entry: i64 },
    /// Nobody held the target position; only the moving entry was updated.
    Shifted,
}

/// Link a song to the end of a show's setlist.
///
/// Fails with `DuplicateEntry` when the song is already linked, reporting where.
/// The `UNIQUE(id_show, id_musica)` constraint backs the explicit check.
pub fn append_song(conn: &Connection, show_id: i64, song_id: i64) -> Result<SetlistEntry> {
    if let Some((position, song_name)) = existing_link(conn, show_id, song_id)? {
        return Err(RepertoireError::DuplicateEntry {
            position,
            song_name,
        }
        .into());
    }

    let position: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(sequencia), 0) + 1 FROM repertorios_shows WHERE id_show = ?1",
            params![show_id],
            |row| row.get(0),
        )
        .context("failed to compute next setlist position")?;

    conn.execute(
        "INSERT INTO repertorios_shows (id_show, id_musica, sequencia) VALUES (?1, ?2, ?3)",
        params![show_id, song_id, position],
    )
    .map_err(|err| map_duplicate_link(conn, err, show_id, song_id))
    .context("failed to link song to show")?;

    let entry = SetlistEntry {
        id: conn.last_insert_rowid(),
        show_id,
        song_id,
        position,
    };
    info!(show_id, song_id, position, "song appended to setlist");
    Ok(entry)
}

/// Delete one setlist entry. The remaining entries keep their positions.
pub fn remove_entry(conn: &Connection, entry_id: i64) -> Result<()> {
    let deleted = conn
        .execute(
            "DELETE FROM repertorios_shows WHERE id = ?1",
            params![entry_id],
        )
        .context("failed to remove setlist entry")?;

    if deleted == 0 {
        Err(RepertoireError::EntryNotFound(entry_id).into())
    } else {
        info!(entry_id, "setlist entry removed");
        Ok(())
    }
}

/// Move an entry one step up or down.
pub fn move_entry(conn: &Connection, entry_id: i64, direction: MoveDirection) -> Result<MoveOutcome> {
    let entry = fetch_entry(conn, entry_id)?;
    let target = entry.position + direction.offset();
    if target < 1 {
        debug!(entry_id, "move clamped at the top of the setlist");
        return Ok(MoveOutcome::Clamped);
    }

    let tx = conn
        .unchecked_transaction()
        .context("failed to start setlist move")?;

    let partner: Option<i64> = tx
        .query_row(
            "SELECT id FROM repertorios_shows
             WHERE id_show = ?1 AND sequencia = ?2
             ORDER BY id LIMIT 1",
            params![entry.show_id, target],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up swap partner")?;

    set_position(&tx, entry_id, target)?;
    let outcome = match partner {
        Some(partner_id) => {
            set_position(&tx, partner_id, entry.position)?;
            MoveOutcome::Swapped {
                with_entry: partner_id,
            }
        }
        None => MoveOutcome::Shifted,
    };

    tx.commit().context("failed to commit setlist move")?;
    info!(entry_id, from = entry.position, to = target, ?outcome, "setlist entry moved");
    Ok(outcome)
}

/// The show's setlist ordered by position, ties broken by entry id. `rank`
/// is assigned from the iteration order.
pub fn fetch_setlist(conn: &Connection, show_id: i64) -> Result<Vec<SetlistItem>> {
    let mut stmt = conn
        .prepare(
            "SELECT rs.id, m.id, m.musica, m.autor, m.tom, m.cifra, rs.sequencia
             FROM repertorios_shows rs
             INNER JOIN musicas m ON rs.id_musica = m.id
             WHERE rs.id_show = ?1
             ORDER BY rs.sequencia, rs.id",
        )
        .context("failed to prepare setlist query")?;

    let rows = stmt
        .query_map(params![show_id], |row| {
            Ok(SetlistItem {
                entry_id: row.get(0)?,
                song_id: row.get(1)?,
                song_name: row.get(2)?,
                song_author: row.get(3)?,
                key: row.get(4)?,
                chords: row.get(5)?,
                position: row.get(6)?,
                rank: 0,
            })
        })
        .context("failed to iterate setlist")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect setlist")?;

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(index, item)| SetlistItem {
            rank: index + 1,
            ..item
        })
        .collect())
}

/// Load a single entry by id.
pub fn fetch_entry(conn: &Connection, entry_id: i64) -> Result<SetlistEntry> {
    conn.query_row(
        "SELECT id, id_show, id_musica, sequencia FROM repertorios_shows WHERE id = ?1",
        params![entry_id],
        |row| {
            Ok(SetlistEntry {
                id: row.get(0)?,
                show_id: row.get(1)?,
                song_id: row.get(2)?,
                position: row.get(3)?,
            })
        },
    )
    .optional()
    .context("failed to load setlist entry")?
    .ok_or_else(|| RepertoireError::EntryNotFound(entry_id).into())
}

/// Number of songs linked to a show.
pub fn count_entries(conn: &Connection, show_id: i64) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM repertorios_shows WHERE id_show = ?1",
            params![show_id],
            |row| row.get(0),
        )
        .context("failed to count setlist entries")?;
    Ok(count as usize)
}

/// Drop every entry of a show. Part of show deletion.
pub(crate) fn clear_setlist(conn: &Connection, show_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM repertorios_shows WHERE id_show = ?1",
        params![show_id],
    )
    .context("failed to clear setlist")
}

/// Drop every entry pointing at a song. Part of song deletion.
pub(crate) fn detach_song(conn: &Connection, song_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM repertorios_shows WHERE id_musica = ?1",
        params![song_id],
    )
    .context("failed to detach song from setlists")
}

/// Position and song name of an existing (show, song) link.
fn existing_link(conn: &Connection, show_id: i64, song_id: i64) -> Result<Option<(i64, String)>> {
    conn.query_row(
        "SELECT rs.sequencia, m.musica
         FROM repertorios_shows rs
         INNER JOIN musicas m ON rs.id_musica = m.id
         WHERE rs.id_show = ?1 AND rs.id_musica = ?2",
        params![show_id, song_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .context("failed to check for an existing setlist entry")
}

fn set_position(conn: &Connection, entry_id: i64, position: i64) -> Result<()> {
    conn.execute(
        "UPDATE repertorios_shows SET sequencia = ?1 WHERE id = ?2",
        params![position, entry_id],
    )
    .context("failed to update setlist position")?;
    Ok(())
}

/// Turn a unique-constraint hit on insert into `DuplicateEntry`, looking up
/// the existing link so the message matches the explicit check.
fn map_duplicate_link(
    conn: &Connection,
    err: rusqlite::Error,
    show_id: i64,
    song_id: i64,
) -> anyhow::Error {
    if !matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
        return err.into();
    }
    match existing_link(conn, show_id, song_id) {
        Ok(Some((position, song_name))) => RepertoireError::DuplicateEntry {
            position,
            song_name,
        }
        .into(),
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_show, create_song, open_in_memory};
    use crate::error::domain_error;
    use crate::models::{ShowInput, SongInput};

    struct Fixture {
        conn: Connection,
        show_id: i64,
        songs: Vec<i64>,
    }

    fn fixture(song_count: usize) -> Fixture {
        let conn = open_in_memory().unwrap();
        let show = create_show(&conn, &ShowInput::new("01/01/2025", "Bar X", "Trio Y").unwrap())
            .unwrap();
        let songs = (0..song_count)
            .map(|index| {
                let input = SongInput::new(&format!("Song {index}"), None, None, None, None)
                    .unwrap();
                create_song(&conn, &input).unwrap().id
            })
            .collect();
        Fixture {
            conn,
            show_id: show.id,
            songs,
        }
    }

    fn positions(fx: &Fixture) -> Vec<(i64, i64)> {
        fetch_setlist(&fx.conn, fx.show_id)
            .unwrap()
            .into_iter()
            .map(|item| (item.song_id, item.position))
            .collect()
    }

    #[test]
    fn append_starts_at_one_and_goes_to_max_plus_one() {
        let fx = fixture(3);
        let first = append_song(&fx.conn, fx.show_id, fx.songs[0]).unwrap();
        assert_eq!(first.position, 1);

        let second = append_song(&fx.conn, fx.show_id, fx.songs[1]).unwrap();
        remove_entry(&fx.conn, first.id).unwrap();
        let third = append_song(&fx.conn, fx.show_id, fx.songs[2]).unwrap();

        assert_eq!(second.position, 2);
        assert_eq!(third.position, 3);
        assert_eq!(fetch_setlist(&fx.conn, fx.show_id).unwrap().last().unwrap().song_id, fx.songs[2]);
    }

    #[test]
    fn duplicate_append_reports_existing_position() {
        let fx = fixture(2);
        append_song(&fx.conn, fx.show_id, fx.songs[0]).unwrap();
        append_song(&fx.conn, fx.show_id, fx.songs[1]).unwrap();

        let err = append_song(&fx.conn, fx.show_id, fx.songs[1]).unwrap_err();
        match domain_error(&err) {
            Some(RepertoireError::DuplicateEntry { position, song_name }) => {
                assert_eq!(*position, 2);
                assert_eq!(song_name, "Song 1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(count_entries(&fx.conn, fx.show_id).unwrap(), 2);
    }

    #[test]
    fn unique_constraint_maps_to_duplicate_entry() {
        let fx = fixture(1);
        append_song(&fx.conn, fx.show_id, fx.songs[0]).unwrap();

        let err = fx
            .conn
            .execute(
                "INSERT INTO repertorios_shows (id_show, id_musica, sequencia) VALUES (?1, ?2, 9)",
                params![fx.show_id, fx.songs[0]],
            )
            .unwrap_err();
        let mapped = map_duplicate_link(&fx.conn, err, fx.show_id, fx.songs[0]);
        assert!(matches!(
            domain_error(&mapped),
            Some(RepertoireError::DuplicateEntry { position: 1, .. })
        ));
    }

    #[test]
    fn remove_keeps_other_positions() {
        let fx = fixture(3);
        let entries: Vec<SetlistEntry> = fx
            .songs
            .iter()
            .map(|song| append_song(&fx.conn, fx.show_id, *song).unwrap())
            .collect();

        assert_eq!(count_entries(&fx.conn, fx.show_id).unwrap(), 3);
        remove_entry(&fx.conn, entries[1].id).unwrap();
        assert_eq!(count_entries(&fx.conn, fx.show_id).unwrap(), 2);

        assert_eq!(positions(&fx), [(fx.songs[0], 1), (fx.songs[2], 3)]);
        let ranks: Vec<usize> = fetch_setlist(&fx.conn, fx.show_id)
            .unwrap()
            .iter()
            .map(|item| item.rank)
            .collect();
        assert_eq!(ranks, [1, 2]);
    }

    #[test]
    fn remove_unknown_entry_fails() {
        let fx = fixture(0);
        let err = remove_entry(&fx.conn, 7).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::EntryNotFound(7))));
    }

    #[test]
    fn move_up_swaps_with_neighbour() {
        let fx = fixture(2);
        let first = append_song(&fx.conn, fx.show_id, fx.songs[0]).unwrap();
        let second = append_song(&fx.conn, fx.show_id, fx.songs[1]).unwrap();

        let outcome = move_entry(&fx.conn, second.id, MoveDirection::Up).unwrap();

        assert_eq!(outcome, MoveOutcome::Swapped { with_entry: first.id });
        assert_eq!(positions(&fx), [(fx.songs[1], 1), (fx.songs[0], 2)]);
    }

    #[test]
    fn move_down_swaps_with_neighbour() {
        let fx = fixture(3);
        let first = append_song(&fx.conn, fx.show_id, fx.songs[0]).unwrap();
        append_song(&fx.conn, fx.show_id, fx.songs[1]).unwrap();
        append_song(&fx.conn, fx.show_id, fx.songs[2]).unwrap();

        move_entry(&fx.conn, first.id, MoveDirection::Down).unwrap();

        assert_eq!(
            positions(&fx),
            [(fx.songs[1], 1), (fx.songs[0], 2), (fx.songs[2], 3)]
        );
    }

    #[test]
    fn move_up_at_top_is_a_no_op() {
        let fx = fixture(2);
        let first = append_song(&fx.conn, fx.show_id, fx.songs[0]).unwrap();
        append_song(&fx.conn, fx.show_id, fx.songs[1]).unwrap();
        let before = positions(&fx);

        let outcome = move_entry(&fx.conn, first.id, MoveDirection::Up).unwrap();

        assert_eq!(outcome, MoveOutcome::Clamped);
        assert_eq!(positions(&fx), before);
    }

    #[test]
    fn move_past_the_tail_shifts_without_partner() {
        let fx = fixture(2);
        append_song(&fx.conn, fx.show_id, fx.songs[0]).unwrap();
        let last = append_song(&fx.conn, fx.show_id, fx.songs[1]).unwrap();

        let outcome = move_entry(&fx.conn, last.id, MoveDirection::Down).unwrap();

        assert_eq!(outcome, MoveOutcome::Shifted);
        assert_eq!(positions(&fx), [(fx.songs[0], 1), (fx.songs[1], 3)]);
    }

    #[test]
    fn move_into_gap_shifts_without_partner() {
        // [1, 2, 3, 4] -> remove 2 -> [1, 3, 4]. The entry at 3 moving up finds
        // nobody on 2 and simply takes it.
        let fx = fixture(4);
        let entries: Vec<SetlistEntry> = fx
            .songs
            .iter()
            .map(|song| append_song(&fx.conn, fx.show_id, *song).unwrap())
            .collect();

        remove_entry(&fx.conn, entries[1].id).unwrap();
        assert_eq!(
            move_entry(&fx.conn, entries[2].id, MoveDirection::Up).unwrap(),
            MoveOutcome::Shifted
        );
        assert_eq!(
            positions(&fx),
            [(fx.songs[0], 1), (fx.songs[2], 2), (fx.songs[3], 4)]
        );

        // The entry at 4 shifts into the freed 3, then the entry at 2 moving
        // down swaps with it.
        move_entry(&fx.conn, entries[3].id, MoveDirection::Up).unwrap();
        let outcome = move_entry(&fx.conn, entries[2].id, MoveDirection::Down).unwrap();
        assert_eq!(outcome, MoveOutcome::Swapped { with_entry: entries[3].id });
        assert_eq!(
            positions(&fx),
            [(fx.songs[0], 1), (fx.songs[3], 2), (fx.songs[2], 3)]
        );
    }

    #[test]
    fn ties_are_listed_by_entry_id() {
        let fx = fixture(3);
        let entries: Vec<SetlistEntry> = fx
            .songs
            .iter()
            .map(|song| append_song(&fx.conn, fx.show_id, *song).unwrap())
            .collect();

        // Force a tie the way a shifted move can: two entries on position 2.
        set_position(&fx.conn, entries[2].id, 2).unwrap();
        set_position(&fx.conn, entries[0].id, 2).unwrap();

        let order: Vec<i64> = fetch_setlist(&fx.conn, fx.show_id)
            .unwrap()
            .iter()
            .map(|item| item.entry_id)
            .collect();
        assert_eq!(order, [entries[0].id, entries[1].id, entries[2].id]);

        // With a tie on the target, the lowest id is the swap partner.
        let extra = SongInput::new("Extra", None, None, None, None).unwrap();
        let extra_id = create_song(&fx.conn, &extra).unwrap().id;
        let mover = append_song(&fx.conn, fx.show_id, extra_id).unwrap();
        assert_eq!(mover.position, 3);
        let outcome = move_entry(&fx.conn, mover.id, MoveDirection::Up).unwrap();
        assert_eq!(outcome, MoveOutcome::Swapped { with_entry: entries[0].id });
    }

    #[test]
    fn move_unknown_entry_fails() {
        let fx = fixture(0);
        let err = move_entry(&fx.conn, 3, MoveDirection::Down).unwrap_err();
        assert!(matches!(domain_error(&err), Some(RepertoireError::EntryNotFound(3))));
    }
}
