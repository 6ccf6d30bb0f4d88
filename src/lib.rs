//! Song catalog and show setlist manager for working musicians.
//!
//! The library holds everything the binary needs: the SQLite stores and the
//! setlist engine (`db`), JSON backup and restore (`backup`), the printable PDF
//! export (`export`) and the terminal UI (`ui`). Headless commands in
//! `main.rs` reuse the same functions as the UI.
pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod platform;
pub mod ui;

pub use error::{domain_error, RepertoireError};
pub use models::{SetlistEntry, SetlistItem, Show, ShowInput, Song, SongInput};
pub use ui::{run_app, App};
