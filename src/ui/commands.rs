//! Every mutation the UI can request, keyed by entity id. Key handlers build a
//! `Command`, `App::dispatch` executes it against the database and the screens
//! are reloaded from the store afterwards.

use std::path::PathBuf;

use crate::db::MoveDirection;
use crate::models::{ShowInput, SongInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateSong(SongInput),
    UpdateSong { id: i64, input: SongInput },
    DeleteSong(i64),
    CreateShow(ShowInput),
    UpdateShow { id: i64, input: ShowInput },
    DeleteShow(i64),
    OpenSetlist(i64),
    AppendSong { show_id: i64, song_id: i64 },
    MoveEntry { entry_id: i64, direction: MoveDirection },
    RemoveEntry(i64),
    ExportPdf { show_id: i64, path: PathBuf },
    ExportBackup(PathBuf),
    ImportBackup(PathBuf),
}

/// A file operation waiting on the user to pick a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingFileOp {
    ExportPdf { show_id: i64 },
    ExportBackup,
    ImportBackup,
}

/// How the path prompt was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathChoice {
    Chosen(PathBuf),
    Cancelled,
}

impl PendingFileOp {
    /// Turn the user's answer into the command to run, if any.
    pub fn resume(self, choice: PathChoice) -> Option<Command> {
        let PathChoice::Chosen(path) = choice else {
            return None;
        };
        Some(match self {
            PendingFileOp::ExportPdf { show_id } => Command::ExportPdf { show_id, path },
            PendingFileOp::ExportBackup => Command::ExportBackup(path),
            PendingFileOp::ImportBackup => Command::ImportBackup(path),
        })
    }

    pub fn title(&self) -> &'static str {
        match self {
            PendingFileOp::ExportPdf { .. } => "Export Setlist PDF",
            PendingFileOp::ExportBackup => "Export Backup",
            PendingFileOp::ImportBackup => "Import Backup",
        }
    }
}
