use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;
use tracing::{debug, info};

/// Folder name used beneath the user's home directory for application data.
pub const DATA_DIR_NAME: &str = ".repertoire-manager";
/// SQLite file name stored inside the application data directory. Kept equal to
/// the legacy file name so existing databases can be opened with `--db`.
pub const DB_FILE_NAME: &str = "repertorio.db";

/// Table definitions. Column names are part of the on-disk contract with
/// databases created by earlier versions, so they must not be renamed.
const SCHEMA: &[(&str, &str)] = &[
    (
        "musicas",
        "CREATE TABLE IF NOT EXISTS musicas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            musica TEXT NOT NULL,
            autor TEXT,
            estilo TEXT,
            tom TEXT,
            cifra TEXT
        )",
    ),
    (
        "shows",
        "CREATE TABLE IF NOT EXISTS shows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            data_show TEXT NOT NULL,
            local_show TEXT NOT NULL,
            artista TEXT NOT NULL
        )",
    ),
    (
        "repertorios_shows",
        "CREATE TABLE IF NOT EXISTS repertorios_shows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            id_show INTEGER NOT NULL,
            id_musica INTEGER NOT NULL,
            sequencia INTEGER NOT NULL,
            FOREIGN KEY (id_show) REFERENCES shows (id),
            FOREIGN KEY (id_musica) REFERENCES musicas (id),
            UNIQUE(id_show, id_musica)
        )",
    ),
];

/// Open (creating if needed) the database at `path` and make sure the schema
/// exists. `PRAGMA foreign_keys = ON` is toggled so dangling setlist links are
/// rejected by SQLite as a last line of defense.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    info!("opening database at {}", path.display());
    let conn = Connection::open(path).context("failed to open SQLite database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, used by tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Enable foreign keys and create any missing table.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    for (table, ddl) in SCHEMA {
        conn.execute(ddl, [])
            .with_context(|| format!("failed to create {table} table"))?;
        debug!(table, "schema ensured");
    }

    Ok(())
}

/// Resolve the default database path inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILE_NAME))
}

/// Application data directory (`~/.repertoire-manager`).
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
