use std::collections::HashSet;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{fetch_all_songs, fetch_setlist, fetch_show};
use crate::models::{SetlistItem, Show, Song};

use super::helpers::step_selection;

/// The song catalog tab, with an optional search filter.
pub(crate) struct CatalogScreen {
    pub(crate) songs: Vec<Song>,
    pub(crate) filtered_songs: Vec<Song>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl CatalogScreen {
    pub(crate) fn new(songs: Vec<Song>) -> Self {
        let mut screen = Self {
            filtered_songs: Vec::new(),
            songs,
            filter: None,
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    pub(crate) fn apply_filter(&mut self) {
        self.filtered_songs = match &self.filter {
            Some(query) => self
                .songs
                .iter()
                .filter(|song| song.matches(query))
                .cloned()
                .collect(),
            None => self.songs.clone(),
        };
        self.selected = step_selection(self.selected, self.filtered_songs.len(), 0);
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter.filter(|query| !query.trim().is_empty());
        self.apply_filter();
    }

    pub(crate) fn set_songs(&mut self, songs: Vec<Song>) {
        self.songs = songs;
        self.apply_filter();
    }

    pub(crate) fn current_song(&self) -> Option<&Song> {
        self.filtered_songs.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.filtered_songs.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered_songs.len().saturating_sub(1);
    }

    /// Put the cursor on `song_id` if it is visible.
    pub(crate) fn focus(&mut self, song_id: i64) {
        if let Some(index) = self.filtered_songs.iter().position(|song| song.id == song_id) {
            self.selected = index;
        }
    }
}

/// The list of shows, newest date first.
pub(crate) struct ShowsScreen {
    pub(crate) shows: Vec<Show>,
    pub(crate) selected: usize,
}

impl ShowsScreen {
    pub(crate) fn new(shows: Vec<Show>) -> Self {
        Self { shows, selected: 0 }
    }

    pub(crate) fn set_shows(&mut self, shows: Vec<Show>) {
        self.shows = shows;
        self.selected = step_selection(self.selected, self.shows.len(), 0);
    }

    pub(crate) fn current_show(&self) -> Option<&Show> {
        self.shows.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.shows.len(), offset);
    }

    pub(crate) fn focus(&mut self, show_id: i64) {
        if let Some(index) = self.shows.iter().position(|show| show.id == show_id) {
            self.selected = index;
        }
    }
}

/// One show's ordered setlist.
pub(crate) struct SetlistScreen {
    pub(crate) show: Show,
    pub(crate) items: Vec<SetlistItem>,
    pub(crate) selected: usize,
}

impl SetlistScreen {
    pub(crate) fn load(conn: &Connection, show_id: i64) -> Result<Self> {
        let show = fetch_show(conn, show_id)?;
        let items = fetch_setlist(conn, show_id)?;
        Ok(Self {
            show,
            items,
            selected: 0,
        })
    }

    /// Reload from the store, keeping the cursor on the same entry when it
    /// still exists.
    pub(crate) fn reload(&mut self, conn: &Connection) -> Result<()> {
        let focused = self.current_item().map(|item| item.entry_id);
        self.show = fetch_show(conn, self.show.id)?;
        self.items = fetch_setlist(conn, self.show.id)?;
        match focused {
            Some(entry_id) => self.focus(entry_id),
            None => self.selected = 0,
        }
        self.selected = step_selection(self.selected, self.items.len(), 0);
        Ok(())
    }

    pub(crate) fn current_item(&self) -> Option<&SetlistItem> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.items.len(), offset);
    }

    pub(crate) fn focus(&mut self, entry_id: i64) {
        if let Some(index) = self.items.iter().position(|item| item.entry_id == entry_id) {
            self.selected = index;
        }
    }

    pub(crate) fn song_ids(&self) -> HashSet<i64> {
        self.items.iter().map(|item| item.song_id).collect()
    }
}

/// Picker listing the catalog songs that are not yet in the show.
pub(crate) struct SongPicker {
    pub(crate) show_id: i64,
    pub(crate) available: Vec<Song>,
    pub(crate) filtered: Vec<Song>,
    pub(crate) query: String,
    pub(crate) selected: usize,
}

impl SongPicker {
    pub(crate) fn load(conn: &Connection, setlist: &SetlistScreen) -> Result<Self> {
        let linked = setlist.song_ids();
        let available = fetch_all_songs(conn)?
            .into_iter()
            .filter(|song| !linked.contains(&song.id))
            .collect();
        let mut picker = Self {
            show_id: setlist.show.id,
            available,
            filtered: Vec::new(),
            query: String::new(),
            selected: 0,
        };
        picker.apply_filter();
        Ok(picker)
    }

    pub(crate) fn apply_filter(&mut self) {
        self.filtered = self
            .available
            .iter()
            .filter(|song| song.matches(&self.query))
            .cloned()
            .collect();
        self.selected = step_selection(self.selected, self.filtered.len(), 0);
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.query.push(ch);
            self.apply_filter();
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.query.pop();
        self.apply_filter();
    }

    /// Drop a song once it has been appended.
    pub(crate) fn mark_added(&mut self, song_id: i64) {
        self.available.retain(|song| song.id != song_id);
        self.apply_filter();
    }

    pub(crate) fn current_song(&self) -> Option<&Song> {
        self.filtered.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.filtered.len(), offset);
    }
}
