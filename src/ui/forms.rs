use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Show, ShowInput, Song, SongInput, MUSIC_STYLES};

use super::commands::{PathChoice, PendingFileOp};

/// Render a `Label: value` line, dimming empty values and highlighting focus.
fn field_line(field_name: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Form state for song creation/editing, including author autocomplete.
#[derive(Default, Clone)]
pub(crate) struct SongForm {
    pub(crate) name: String,
    pub(crate) author: String,
    pub(crate) style: String,
    pub(crate) key: String,
    pub(crate) chords: String,
    pub(crate) active: SongField,
    pub(crate) error: Option<String>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SongField {
    #[default]
    Name,
    Author,
    Style,
    Key,
    Chords,
}

impl SongField {
    pub(crate) const ALL: [SongField; 5] = [
        SongField::Name,
        SongField::Author,
        SongField::Style,
        SongField::Key,
        SongField::Chords,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            SongField::Name => "Name",
            SongField::Author => "Author",
            SongField::Style => "Style",
            SongField::Key => "Key",
            SongField::Chords => "Chords",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|field| *field == self).unwrap_or(0)
    }
}

impl SongForm {
    pub(crate) fn from_song(song: &Song) -> Self {
        Self {
            name: song.name.clone(),
            author: song.author.clone().unwrap_or_default(),
            style: song.style.clone().unwrap_or_default(),
            key: song.key.clone().unwrap_or_default(),
            chords: song.chords.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        let index = (self.active.index() + 1) % SongField::ALL.len();
        self.active = SongField::ALL[index];
        if self.active != SongField::Author {
            self.suggestion = None;
        }
    }

    pub(crate) fn previous_field(&mut self) {
        let len = SongField::ALL.len();
        let index = (self.active.index() + len - 1) % len;
        self.active = SongField::ALL[index];
        if self.active != SongField::Author {
            self.suggestion = None;
        }
    }

    fn value_mut(&mut self, field: SongField) -> &mut String {
        match field {
            SongField::Name => &mut self.name,
            SongField::Author => &mut self.author,
            SongField::Style => &mut self.style,
            SongField::Key => &mut self.key,
            SongField::Chords => &mut self.chords,
        }
    }

    fn value(&self, field: SongField) -> &str {
        match field {
            SongField::Name => &self.name,
            SongField::Author => &self.author,
            SongField::Style => &self.style,
            SongField::Key => &self.key,
            SongField::Chords => &self.chords,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active == SongField::Author {
            self.autocomplete_disabled = false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == SongField::Author {
            self.autocomplete_disabled = false;
        }
        self.value_mut(self.active).pop();
    }

    /// Step through the predefined styles. Free text that is not in the list
    /// restarts the cycle from the first style.
    pub(crate) fn cycle_style(&mut self, forward: bool) {
        let len = MUSIC_STYLES.len();
        let current = MUSIC_STYLES
            .iter()
            .position(|style| style.eq_ignore_ascii_case(self.style.trim()));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(index), true) => (index + 1) % len,
            (Some(index), false) => (index + len - 1) % len,
        };
        self.style = MUSIC_STYLES[next].to_string();
    }

    pub(crate) fn parse_inputs(&self) -> Result<SongInput> {
        let input = SongInput::new(
            &self.name,
            Some(&self.author),
            Some(&self.style),
            Some(&self.key),
            Some(&self.chords),
        )?;
        Ok(input)
    }

    /// Suggest the first known author starting with what was typed so far.
    pub(crate) fn update_suggestion(&mut self, authors: &[String]) {
        if self.active != SongField::Author
            || self.autocomplete_disabled
            || self.author.chars().count() < 2
        {
            self.suggestion = None;
            return;
        }

        let current_lower = self.author.to_lowercase();
        self.suggestion = authors
            .iter()
            .find(|candidate| candidate.to_lowercase().starts_with(&current_lower))
            .filter(|candidate| candidate.to_lowercase() != current_lower)
            .cloned();
    }

    pub(crate) fn accept_suggestion(&mut self) -> bool {
        if self.suggestion_suffix().is_none() {
            return false;
        }
        match self.suggestion.take() {
            Some(candidate) => {
                self.author = candidate;
                self.autocomplete_disabled = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.has_active_suggestion() {
            self.autocomplete_disabled = true;
            self.suggestion = None;
            return true;
        }
        false
    }

    /// Remaining characters of the suggestion, shown ghosted after the input.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let suffix: String = candidate.chars().skip(self.author.chars().count()).collect();
        (!suffix.is_empty()).then_some(suffix)
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        self.active == SongField::Author && self.suggestion.is_some()
    }

    pub(crate) fn build_line(&self, field: SongField) -> Line<'static> {
        let is_active = self.active == field;
        let placeholder = match field {
            SongField::Name => "<required>",
            SongField::Style => "<←/→ to pick>",
            _ => "<optional>",
        };
        let mut line = field_line(field.label(), self.value(field), placeholder, is_active);

        if field == SongField::Author && is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                line.spans
                    .push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }

        line
    }

    pub(crate) fn value_len(&self, field: SongField) -> usize {
        self.value(field).chars().count()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ShowField {
    #[default]
    Date,
    Venue,
    Performer,
}

impl ShowField {
    pub(crate) const ALL: [ShowField; 3] = [ShowField::Date, ShowField::Venue, ShowField::Performer];

    pub(crate) fn label(self) -> &'static str {
        match self {
            ShowField::Date => "Date",
            ShowField::Venue => "Venue",
            ShowField::Performer => "Performer",
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct ShowForm {
    pub(crate) date: String,
    pub(crate) venue: String,
    pub(crate) performer: String,
    pub(crate) active: ShowField,
    pub(crate) error: Option<String>,
}

impl ShowForm {
    /// New shows default to today's date.
    pub(crate) fn new(today: NaiveDate) -> Self {
        Self {
            date: today.format("%d/%m/%Y").to_string(),
            active: ShowField::Venue,
            ..Self::default()
        }
    }

    pub(crate) fn from_show(show: &Show) -> Self {
        Self {
            date: show.date.clone(),
            venue: show.venue.clone(),
            performer: show.performer.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            ShowField::Date => ShowField::Venue,
            ShowField::Venue => ShowField::Performer,
            ShowField::Performer => ShowField::Date,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            ShowField::Date => ShowField::Performer,
            ShowField::Venue => ShowField::Date,
            ShowField::Performer => ShowField::Venue,
        };
    }

    fn value_mut(&mut self, field: ShowField) -> &mut String {
        match field {
            ShowField::Date => &mut self.date,
            ShowField::Venue => &mut self.venue,
            ShowField::Performer => &mut self.performer,
        }
    }

    fn value(&self, field: ShowField) -> &str {
        match field {
            ShowField::Date => &self.date,
            ShowField::Venue => &self.venue,
            ShowField::Performer => &self.performer,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<ShowInput> {
        Ok(ShowInput::new(&self.date, &self.venue, &self.performer)?)
    }

    pub(crate) fn build_line(&self, field: ShowField) -> Line<'static> {
        let placeholder = match field {
            ShowField::Performer => "<required>",
            _ => "<optional>",
        };
        field_line(field.label(), self.value(field), placeholder, self.active == field)
    }

    pub(crate) fn value_len(&self, field: ShowField) -> usize {
        self.value(field).chars().count()
    }
}

/// Single-line path input that resolves a pending file operation.
#[derive(Clone)]
pub(crate) struct PathPrompt {
    pub(crate) op: PendingFileOp,
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl PathPrompt {
    pub(crate) fn new(op: PendingFileOp, suggested: PathBuf) -> Self {
        Self {
            op,
            path: suggested.display().to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.path.push(ch);
            self.error = None;
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    /// The choice made by pressing Enter.
    pub(crate) fn confirm(&self) -> Result<PathChoice> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("A file path is required."));
        }
        Ok(PathChoice::Chosen(PathBuf::from(trimmed)))
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        field_line("Path", &self.path, "<required>", true)
    }
}
