//! Persistence module split across logical submodules. Every function takes the
//! connection explicitly; the application context owns the only handle.

mod connection;
mod setlist;
mod shows;
mod songs;

pub use connection::{
    data_dir, default_db_path, init_schema, open_database, open_in_memory, DATA_DIR_NAME,
    DB_FILE_NAME,
};
pub use setlist::{
    append_song, count_entries, fetch_entry, fetch_setlist, move_entry, remove_entry,
    MoveDirection, MoveOutcome,
};
pub use shows::{create_show, delete_show, fetch_show, fetch_shows, update_show};
pub use songs::{
    create_song, delete_song, fetch_all_songs, fetch_authors, fetch_song, song_exists,
    update_song,
};
