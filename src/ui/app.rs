use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyCode;
use ratatui::style::{Color, Style};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::backup::{backup_file_name, restore_backup, write_backup};
use crate::config::Settings;
use crate::db::{
    append_song, count_entries, create_show, create_song, delete_show, delete_song,
    fetch_all_songs, fetch_authors, fetch_shows, move_entry, remove_entry, update_show,
    update_song, MoveDirection, MoveOutcome,
};
use crate::error::RepertoireError;
use crate::export::{default_pdf_path, export_setlist_pdf};
use crate::models::{SetlistItem, Show, Song};
use crate::platform::Opener;

use super::commands::{Command, PathChoice, PendingFileOp};
use super::forms::{PathPrompt, ShowForm, SongField, SongForm};
use super::helpers::surface_error;
use super::screens::{CatalogScreen, SetlistScreen, ShowsScreen, SongPicker};

/// Top-level tabs.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(super) enum Screen {
    Songs,
    Shows,
    Setlist,
    About,
}

impl Screen {
    pub(super) const ALL: [Screen; 4] = [Screen::Songs, Screen::Shows, Screen::Setlist, Screen::About];

    pub(super) fn title(self) -> &'static str {
        match self {
            Screen::Songs => "Songs",
            Screen::Shows => "Shows",
            Screen::Setlist => "Setlist",
            Screen::About => "About",
        }
    }

    pub(super) fn index(self) -> usize {
        Self::ALL.iter().position(|screen| *screen == self).unwrap_or(0)
    }

    fn cycle(self, offset: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = (self.index() as isize + offset).rem_euclid(len);
        Self::ALL[index as usize]
    }
}

/// Modal state layered on top of the current tab.
pub(super) enum Mode {
    Normal,
    Searching(String),
    AddingSong(SongForm),
    EditingSong { id: i64, form: SongForm },
    ConfirmSongDelete(Song),
    AddingShow(ShowForm),
    EditingShow { id: i64, form: ShowForm },
    ConfirmShowDelete { show: Show, entries: usize },
    ConfirmEntryRemove(SetlistItem),
    PickingSong(SongPicker),
    PromptingPath(PathPrompt),
}

pub(super) struct StatusMessage {
    pub(super) text: String,
    pub(super) kind: StatusKind,
}

pub(super) enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    pub(super) fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Application context: owns the only database handle and every screen.
pub struct App {
    pub(super) conn: Connection,
    pub(super) opener: Box<dyn Opener>,
    pub(super) settings: Settings,
    pub(super) authors: Vec<String>,
    pub(super) catalog: CatalogScreen,
    pub(super) shows: ShowsScreen,
    pub(super) setlist: Option<SetlistScreen>,
    pub(super) screen: Screen,
    pub(super) mode: Mode,
    pub(super) status: Option<StatusMessage>,
}

impl App {
    pub fn new(conn: Connection, settings: Settings, opener: Box<dyn Opener>) -> Result<Self> {
        let catalog = CatalogScreen::new(fetch_all_songs(&conn)?);
        let shows = ShowsScreen::new(fetch_shows(&conn)?);
        let authors = fetch_authors(&conn)?;
        Ok(Self {
            conn,
            opener,
            settings,
            authors,
            catalog,
            shows,
            setlist: None,
            screen: Screen::Songs,
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Run one command against the store, then reload the affected screens.
    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!(?command, "dispatching command");
        match command {
            Command::CreateSong(input) => {
                let song = create_song(&self.conn, &input)?;
                self.refresh()?;
                self.catalog.focus(song.id);
                self.set_status(format!("Song '{}' added.", song.name), StatusKind::Info);
            }
            Command::UpdateSong { id, input } => {
                update_song(&self.conn, id, &input)?;
                self.refresh()?;
                self.catalog.focus(id);
                self.set_status("Song updated.", StatusKind::Info);
            }
            Command::DeleteSong(id) => {
                delete_song(&self.conn, id)?;
                self.refresh()?;
                self.set_status("Song deleted.", StatusKind::Info);
            }
            Command::CreateShow(input) => {
                let show = create_show(&self.conn, &input)?;
                self.refresh()?;
                self.shows.focus(show.id);
                self.set_status("Show added.", StatusKind::Info);
            }
            Command::UpdateShow { id, input } => {
                update_show(&self.conn, id, &input)?;
                self.refresh()?;
                self.shows.focus(id);
                self.set_status("Show updated.", StatusKind::Info);
            }
            Command::DeleteShow(id) => {
                delete_show(&self.conn, id)?;
                if self.setlist.as_ref().is_some_and(|setlist| setlist.show.id == id) {
                    self.setlist = None;
                    if self.screen == Screen::Setlist {
                        self.screen = Screen::Shows;
                    }
                }
                self.refresh()?;
                self.set_status("Show deleted.", StatusKind::Info);
            }
            Command::OpenSetlist(show_id) => {
                let setlist = SetlistScreen::load(&self.conn, show_id)?;
                self.shows.focus(show_id);
                self.setlist = Some(setlist);
                self.screen = Screen::Setlist;
                self.clear_status();
            }
            Command::AppendSong { show_id, song_id } => {
                let entry = append_song(&self.conn, show_id, song_id)?;
                self.refresh()?;
                if let Some(setlist) = self.setlist.as_mut() {
                    setlist.focus(entry.id);
                }
                self.set_status("Song added to the setlist.", StatusKind::Info);
            }
            Command::MoveEntry {
                entry_id,
                direction,
            } => {
                let outcome = move_entry(&self.conn, entry_id, direction)?;
                self.refresh()?;
                if let Some(setlist) = self.setlist.as_mut() {
                    setlist.focus(entry_id);
                }
                if outcome == MoveOutcome::Clamped {
                    self.set_status("Already at the top of the setlist.", StatusKind::Info);
                } else {
                    self.clear_status();
                }
            }
            Command::RemoveEntry(entry_id) => {
                remove_entry(&self.conn, entry_id)?;
                self.refresh()?;
                self.set_status("Song removed from the setlist.", StatusKind::Info);
            }
            Command::ExportPdf { show_id, path } => {
                export_setlist_pdf(&self.conn, show_id, &path)?;
                match self.opener.open(&path) {
                    Ok(()) => self.set_status(
                        format!("PDF saved to {}.", path.display()),
                        StatusKind::Info,
                    ),
                    Err(err) => {
                        warn!(error = %err, "could not open exported PDF");
                        self.set_status(
                            format!(
                                "PDF saved to {} but could not be opened: {}",
                                path.display(),
                                surface_error(&err)
                            ),
                            StatusKind::Error,
                        );
                    }
                }
            }
            Command::ExportBackup(path) => {
                let backup = write_backup(&self.conn, &path)?;
                self.set_status(
                    format!(
                        "Backup saved to {}: {} songs, {} shows, {} setlist entries.",
                        path.display(),
                        backup.musicas.len(),
                        backup.shows.len(),
                        backup.repertorios.len()
                    ),
                    StatusKind::Info,
                );
            }
            Command::ImportBackup(path) => {
                let summary = restore_backup(&self.conn, &path)?;
                self.refresh()?;
                let mut message = if summary.is_empty() {
                    "Nothing new to import.".to_string()
                } else {
                    format!(
                        "Imported {} songs, {} shows, {} setlist entries.",
                        summary.songs, summary.shows, summary.links
                    )
                };
                if summary.skipped > 0 {
                    message.push_str(&format!(" {} records skipped.", summary.skipped));
                }
                self.set_status(message, StatusKind::Info);
            }
        }
        Ok(())
    }

    /// Dispatch and report failures in the footer. Returns whether the
    /// command succeeded.
    fn run(&mut self, command: Command) -> bool {
        match self.dispatch(command) {
            Ok(()) => true,
            Err(err) => {
                info!(error = %format!("{err:#}"), "command failed");
                self.set_status(surface_error(&err), StatusKind::Error);
                false
            }
        }
    }

    fn refresh(&mut self) -> Result<()> {
        self.catalog.set_songs(fetch_all_songs(&self.conn)?);
        self.shows.set_shows(fetch_shows(&self.conn)?);
        self.authors = fetch_authors(&self.conn)?;
        if let Some(setlist) = self.setlist.as_mut() {
            setlist.reload(&self.conn)?;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching(query) => self.handle_search(code, query),
            Mode::AddingSong(form) => self.handle_song_form(code, None, form),
            Mode::EditingSong { id, form } => self.handle_song_form(code, Some(id), form),
            Mode::ConfirmSongDelete(song) => self.handle_confirm_song_delete(code, song),
            Mode::AddingShow(form) => self.handle_show_form(code, None, form),
            Mode::EditingShow { id, form } => self.handle_show_form(code, Some(id), form),
            Mode::ConfirmShowDelete { show, entries } => {
                self.handle_confirm_show_delete(code, show, entries)
            }
            Mode::ConfirmEntryRemove(item) => self.handle_confirm_entry_remove(code, item),
            Mode::PickingSong(picker) => self.handle_picker(code, picker),
            Mode::PromptingPath(prompt) => self.handle_path_prompt(code, prompt),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => {
                self.screen = self.screen.cycle(1);
                return Ok(Mode::Normal);
            }
            KeyCode::BackTab => {
                self.screen = self.screen.cycle(-1);
                return Ok(Mode::Normal);
            }
            KeyCode::Char(digit @ '1'..='4') => {
                let index = digit as usize - '1' as usize;
                self.screen = Screen::ALL[index];
                return Ok(Mode::Normal);
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                return Ok(self.prompt_path(PendingFileOp::ExportBackup));
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                return Ok(self.prompt_path(PendingFileOp::ImportBackup));
            }
            _ => {}
        }

        match self.screen {
            Screen::Songs => Ok(self.handle_songs_key(code)),
            Screen::Shows => self.handle_shows_key(code),
            Screen::Setlist => self.handle_setlist_key(code),
            Screen::About => Ok(Mode::Normal),
        }
    }

    fn handle_songs_key(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Up => self.catalog.move_selection(-1),
            KeyCode::Down => self.catalog.move_selection(1),
            KeyCode::PageUp => self.catalog.move_selection(-5),
            KeyCode::PageDown => self.catalog.move_selection(5),
            KeyCode::Home => self.catalog.select_first(),
            KeyCode::End => self.catalog.select_last(),
            KeyCode::Esc => self.catalog.set_filter(None),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Mode::Searching(self.catalog.filter.clone().unwrap_or_default());
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Mode::AddingSong(SongForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(song) = self.catalog.current_song() {
                    let mode = Mode::EditingSong {
                        id: song.id,
                        form: SongForm::from_song(song),
                    };
                    self.clear_status();
                    return mode;
                }
                self.set_status("No song selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(song) = self.catalog.current_song().cloned() {
                    self.clear_status();
                    return Mode::ConfirmSongDelete(song);
                }
                self.set_status("No song selected to delete.", StatusKind::Error);
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_shows_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Up => self.shows.move_selection(-1),
            KeyCode::Down => self.shows.move_selection(1),
            KeyCode::PageUp => self.shows.move_selection(-5),
            KeyCode::PageDown => self.shows.move_selection(5),
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingShow(ShowForm::new(Local::now().date_naive())));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(show) = self.shows.current_show() {
                    let mode = Mode::EditingShow {
                        id: show.id,
                        form: ShowForm::from_show(show),
                    };
                    self.clear_status();
                    return Ok(mode);
                }
                self.set_status("No show selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(show) = self.shows.current_show().cloned() {
                    let entries = count_entries(&self.conn, show.id)?;
                    self.clear_status();
                    return Ok(Mode::ConfirmShowDelete { show, entries });
                }
                self.set_status("No show selected to delete.", StatusKind::Error);
            }
            KeyCode::Enter => {
                if let Some(show_id) = self.shows.current_show().map(|show| show.id) {
                    self.run(Command::OpenSetlist(show_id));
                } else {
                    self.set_status("No show selected.", StatusKind::Error);
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if let Some(show_id) = self.shows.current_show().map(|show| show.id) {
                    return self.prompt_pdf(show_id);
                }
                self.set_status("No show selected to export.", StatusKind::Error);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_setlist_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Some((show_id, current)) = self
            .setlist
            .as_ref()
            .map(|setlist| (setlist.show.id, setlist.current_item().cloned()))
        else {
            if code == KeyCode::Esc {
                self.screen = Screen::Shows;
            }
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Up => self.move_setlist_cursor(-1),
            KeyCode::Down => self.move_setlist_cursor(1),
            KeyCode::PageUp => self.move_setlist_cursor(-5),
            KeyCode::PageDown => self.move_setlist_cursor(5),
            KeyCode::Esc => self.screen = Screen::Shows,
            KeyCode::Char('+') => {
                if let Some(setlist) = self.setlist.as_ref() {
                    let picker = SongPicker::load(&self.conn, setlist)?;
                    self.clear_status();
                    return Ok(Mode::PickingSong(picker));
                }
            }
            KeyCode::Char('u') | KeyCode::Char('U') | KeyCode::Char('d') | KeyCode::Char('D') => {
                let direction = if matches!(code, KeyCode::Char('u') | KeyCode::Char('U')) {
                    MoveDirection::Up
                } else {
                    MoveDirection::Down
                };
                match current {
                    Some(item) => {
                        self.run(Command::MoveEntry {
                            entry_id: item.entry_id,
                            direction,
                        });
                    }
                    None => self.set_status("No song selected to move.", StatusKind::Error),
                }
            }
            KeyCode::Char('-') | KeyCode::Delete => match current {
                Some(item) => {
                    self.clear_status();
                    return Ok(Mode::ConfirmEntryRemove(item));
                }
                None => self.set_status("No song selected to remove.", StatusKind::Error),
            },
            KeyCode::Char('p') | KeyCode::Char('P') => return self.prompt_pdf(show_id),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn move_setlist_cursor(&mut self, offset: isize) {
        if let Some(setlist) = self.setlist.as_mut() {
            setlist.move_selection(offset);
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut query: String) -> Mode {
        match code {
            KeyCode::Esc => {
                self.catalog.set_filter(None);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => self.catalog.move_selection(-1),
            KeyCode::Down => self.catalog.move_selection(1),
            KeyCode::Backspace => {
                query.pop();
                self.catalog.set_filter(Some(query.clone()));
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                query.push(ch);
                self.catalog.set_filter(Some(query.clone()));
            }
            _ => {}
        }
        Mode::Searching(query)
    }

    fn handle_song_form(&mut self, code: KeyCode, id: Option<i64>, mut form: SongForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    self.set_status("Edit cancelled.", StatusKind::Info);
                    keep_open = false;
                }
            }
            KeyCode::Tab => {
                let consumed = form.has_active_suggestion() && form.accept_suggestion();
                if !consumed {
                    form.next_field();
                }
                form.update_suggestion(&self.authors);
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                form.update_suggestion(&self.authors);
            }
            KeyCode::Down => {
                form.next_field();
                form.update_suggestion(&self.authors);
            }
            KeyCode::Left if form.active == SongField::Style => form.cycle_style(false),
            KeyCode::Right if form.active == SongField::Style => form.cycle_style(true),
            KeyCode::Backspace => {
                form.backspace();
                form.update_suggestion(&self.authors);
            }
            KeyCode::Enter => match form.parse_inputs() {
                Ok(input) => {
                    let command = match id {
                        Some(id) => Command::UpdateSong { id, input },
                        None => Command::CreateSong(input),
                    };
                    if self.run(command) {
                        keep_open = false;
                    } else {
                        form.error = self.status.as_ref().map(|status| status.text.clone());
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    form.update_suggestion(&self.authors);
                }
            }
            _ => {}
        }

        match (keep_open, id) {
            (false, _) => Mode::Normal,
            (true, Some(id)) => Mode::EditingSong { id, form },
            (true, None) => Mode::AddingSong(form),
        }
    }

    fn handle_show_form(&mut self, code: KeyCode, id: Option<i64>, mut form: ShowForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(input) => {
                    let command = match id {
                        Some(id) => Command::UpdateShow { id, input },
                        None => Command::CreateShow(input),
                    };
                    if self.run(command) {
                        keep_open = false;
                    } else {
                        form.error = self.status.as_ref().map(|status| status.text.clone());
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        match (keep_open, id) {
            (false, _) => Mode::Normal,
            (true, Some(id)) => Mode::EditingShow { id, form },
            (true, None) => Mode::AddingShow(form),
        }
    }

    fn handle_confirm_song_delete(&mut self, code: KeyCode, song: Song) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.run(Command::DeleteSong(song.id));
                Mode::Normal
            }
            _ => Mode::ConfirmSongDelete(song),
        }
    }

    fn handle_confirm_show_delete(&mut self, code: KeyCode, show: Show, entries: usize) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.run(Command::DeleteShow(show.id));
                Mode::Normal
            }
            _ => Mode::ConfirmShowDelete { show, entries },
        }
    }

    fn handle_confirm_entry_remove(&mut self, code: KeyCode, item: SetlistItem) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.run(Command::RemoveEntry(item.entry_id));
                Mode::Normal
            }
            _ => Mode::ConfirmEntryRemove(item),
        }
    }

    fn handle_picker(&mut self, code: KeyCode, mut picker: SongPicker) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::PageUp => picker.move_selection(-5),
            KeyCode::PageDown => picker.move_selection(5),
            KeyCode::Backspace => picker.backspace(),
            KeyCode::Enter => match picker.current_song().map(|song| song.id) {
                Some(song_id) => {
                    let command = Command::AppendSong {
                        show_id: picker.show_id,
                        song_id,
                    };
                    if self.run(command) {
                        picker.mark_added(song_id);
                    }
                }
                None => self.set_status("No song selected to add.", StatusKind::Error),
            },
            KeyCode::Char(ch) => picker.push_char(ch),
            _ => {}
        }
        Mode::PickingSong(picker)
    }

    fn handle_path_prompt(&mut self, code: KeyCode, mut prompt: PathPrompt) -> Mode {
        let choice = match code {
            KeyCode::Esc => PathChoice::Cancelled,
            KeyCode::Enter => match prompt.confirm() {
                Ok(choice) => choice,
                Err(err) => {
                    prompt.error = Some(surface_error(&err));
                    return Mode::PromptingPath(prompt);
                }
            },
            KeyCode::Backspace => {
                prompt.backspace();
                return Mode::PromptingPath(prompt);
            }
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
                return Mode::PromptingPath(prompt);
            }
            _ => return Mode::PromptingPath(prompt),
        };

        match prompt.op.resume(choice) {
            None => {
                self.set_status("Cancelled.", StatusKind::Info);
                Mode::Normal
            }
            Some(command) => {
                if self.run(command) {
                    Mode::Normal
                } else {
                    prompt.error = self.status.as_ref().map(|status| status.text.clone());
                    Mode::PromptingPath(prompt)
                }
            }
        }
    }

    fn prompt_path(&mut self, op: PendingFileOp) -> Mode {
        let suggested = self.suggested_path(op);
        self.clear_status();
        Mode::PromptingPath(PathPrompt::new(op, suggested))
    }

    /// Refuse up front when there is nothing to print.
    fn prompt_pdf(&mut self, show_id: i64) -> Result<Mode> {
        if count_entries(&self.conn, show_id)? == 0 {
            self.set_status(RepertoireError::NothingToExport.to_string(), StatusKind::Error);
            return Ok(Mode::Normal);
        }
        Ok(self.prompt_path(PendingFileOp::ExportPdf { show_id }))
    }

    fn suggested_path(&self, op: PendingFileOp) -> PathBuf {
        let dir = &self.settings.export_dir;
        match op {
            PendingFileOp::ExportPdf { show_id } => {
                let show = self
                    .shows
                    .shows
                    .iter()
                    .find(|show| show.id == show_id)
                    .or(self.setlist.as_ref().map(|setlist| &setlist.show));
                match show {
                    Some(show) => default_pdf_path(dir, show),
                    None => dir.join("setlist.pdf"),
                }
            }
            PendingFileOp::ExportBackup | PendingFileOp::ImportBackup => {
                dir.join(backup_file_name(Local::now().date_naive()))
            }
        }
    }

    pub(super) fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    pub(super) fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::db::{fetch_setlist, open_in_memory};
    use crate::error::domain_error;
    use crate::models::{ShowInput, SongInput};

    #[derive(Clone, Default)]
    struct RecordingOpener {
        opened: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl Opener for RecordingOpener {
        fn open(&self, path: &Path) -> Result<()> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn app_in(dir: &Path) -> (App, RecordingOpener) {
        let opener = RecordingOpener::default();
        let settings = Settings {
            db_path: dir.join("test.db"),
            export_dir: dir.to_path_buf(),
            log_file: dir.join("test.log"),
        };
        let app = App::new(open_in_memory().unwrap(), settings, Box::new(opener.clone())).unwrap();
        (app, opener)
    }

    fn song(name: &str, author: Option<&str>) -> SongInput {
        SongInput::new(name, author, None, Some("C"), Some("C G Am F")).unwrap()
    }

    fn show() -> ShowInput {
        ShowInput::new("05/03/2025", "Bar do Zé", "Trio").unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn duplicate_song_is_reported_and_catalog_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());

        app.dispatch(Command::CreateSong(song("Wave", Some("Tom Jobim"))))
            .unwrap();
        let err = app
            .dispatch(Command::CreateSong(song("WAVE", Some("tom jobim"))))
            .unwrap_err();

        assert!(matches!(domain_error(&err), Some(RepertoireError::DuplicateSong)));
        assert_eq!(app.catalog.songs.len(), 1);
        assert_eq!(app.authors, ["Tom Jobim"]);
    }

    #[test]
    fn setlist_commands_refresh_the_open_setlist() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());
        app.dispatch(Command::CreateSong(song("Garota de Ipanema", None)))
            .unwrap();
        app.dispatch(Command::CreateSong(song("Águas de Março", None)))
            .unwrap();
        app.dispatch(Command::CreateShow(show())).unwrap();
        let show_id = app.shows.shows[0].id;
        let ids: Vec<i64> = app.catalog.songs.iter().map(|song| song.id).collect();

        app.dispatch(Command::OpenSetlist(show_id)).unwrap();
        assert_eq!(app.screen, Screen::Setlist);
        for song_id in &ids {
            app.dispatch(Command::AppendSong {
                show_id,
                song_id: *song_id,
            })
            .unwrap();
        }

        let second = app.setlist.as_ref().unwrap().items[1].entry_id;
        app.dispatch(Command::MoveEntry {
            entry_id: second,
            direction: MoveDirection::Up,
        })
        .unwrap();

        let setlist = app.setlist.as_ref().unwrap();
        let names: Vec<&str> = setlist.items.iter().map(|item| item.song_name.as_str()).collect();
        assert_eq!(names, ["Águas de Março", "Garota de Ipanema"]);
        assert_eq!(setlist.current_item().map(|item| item.entry_id), Some(second));
    }

    #[test]
    fn deleting_the_open_show_closes_its_setlist() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());
        app.dispatch(Command::CreateShow(show())).unwrap();
        let show_id = app.shows.shows[0].id;
        app.dispatch(Command::OpenSetlist(show_id)).unwrap();

        app.dispatch(Command::DeleteShow(show_id)).unwrap();

        assert!(app.setlist.is_none());
        assert_eq!(app.screen, Screen::Shows);
        assert!(app.shows.shows.is_empty());
    }

    #[test]
    fn pdf_export_writes_the_file_and_opens_it() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, opener) = app_in(dir.path());
        app.dispatch(Command::CreateSong(song("Wave", None))).unwrap();
        app.dispatch(Command::CreateShow(show())).unwrap();
        let show_id = app.shows.shows[0].id;
        let song_id = app.catalog.songs[0].id;
        app.dispatch(Command::AppendSong { show_id, song_id }).unwrap();

        let path = dir.path().join("out.pdf");
        app.dispatch(Command::ExportPdf {
            show_id,
            path: path.clone(),
        })
        .unwrap();

        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
        assert_eq!(*opener.opened.lock().unwrap(), [path]);
    }

    #[test]
    fn empty_setlist_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, opener) = app_in(dir.path());
        app.dispatch(Command::CreateShow(show())).unwrap();
        let show_id = app.shows.shows[0].id;
        let path = dir.path().join("empty.pdf");

        let err = app
            .dispatch(Command::ExportPdf {
                show_id,
                path: path.clone(),
            })
            .unwrap_err();

        assert!(matches!(domain_error(&err), Some(RepertoireError::NothingToExport)));
        assert!(!path.exists());
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn song_can_be_added_from_the_keyboard() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Wave");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Tom Jobim");
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Right).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "D");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let saved = &app.catalog.songs[0];
        assert_eq!(saved.name, "Wave");
        assert_eq!(saved.author.as_deref(), Some("Tom Jobim"));
        assert_eq!(saved.style.as_deref(), Some(crate::models::MUSIC_STYLES[0]));
        assert_eq!(saved.key.as_deref(), Some("(D)"));
    }

    #[test]
    fn blank_song_name_keeps_the_form_open() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());

        app.handle_key(KeyCode::Char('+')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::AddingSong(form) => assert_eq!(form.error.as_deref(), Some("Song name is required.")),
            _ => panic!("form should stay open"),
        }
        assert!(app.catalog.songs.is_empty());
    }

    #[test]
    fn cancelled_path_prompt_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());

        app.handle_key(KeyCode::Char('b')).unwrap();
        assert!(matches!(app.mode, Mode::PromptingPath(_)));
        app.handle_key(KeyCode::Esc).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn backup_prompt_suggests_a_dated_file_in_the_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());
        app.dispatch(Command::CreateSong(song("Wave", None))).unwrap();

        app.handle_key(KeyCode::Char('b')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        let written: Vec<PathBuf> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("repertorio-backup-") && name.ends_with(".json"));
    }

    #[test]
    fn picker_hides_songs_already_in_the_setlist() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = app_in(dir.path());
        app.dispatch(Command::CreateSong(song("Wave", None))).unwrap();
        app.dispatch(Command::CreateSong(song("Corcovado", None))).unwrap();
        app.dispatch(Command::CreateShow(show())).unwrap();
        let show_id = app.shows.shows[0].id;
        app.dispatch(Command::OpenSetlist(show_id)).unwrap();

        app.handle_key(KeyCode::Char('+')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        match &app.mode {
            Mode::PickingSong(picker) => assert_eq!(picker.filtered.len(), 1),
            _ => panic!("picker should stay open"),
        }
        app.handle_key(KeyCode::Esc).unwrap();

        assert_eq!(fetch_setlist(&app.conn, show_id).unwrap().len(), 1);
    }
}
