use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::models::Song;

use super::app::{App, Mode, Screen};
use super::forms::{PathPrompt, ShowField, ShowForm, SongField, SongForm};
use super::helpers::centered_rect;
use super::screens::{SetlistScreen, SongPicker};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const TABS_HEIGHT: u16 = 3;

fn key_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn hints(keys: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(keys.len() * 2);
    for (key, action) in keys {
        spans.push(Span::styled(format!("[{key}]"), key_style()));
        spans.push(Span::raw(format!(" {action}   ")));
    }
    Line::from(spans)
}

fn song_line(song: &Song) -> Line<'static> {
    let mut spans = vec![Span::styled(
        song.display_title(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(key) = &song.key {
        spans.push(Span::styled(
            format!("  {key}"),
            Style::default().fg(Color::LightRed),
        ));
    }
    if let Some(style) = &song.style {
        spans.push(Span::styled(
            format!("  {style}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn highlighted_list<'a>(items: Vec<ListItem<'a>>, title: String) -> List<'a> {
    List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("▶ ")
}

fn empty_message(frame: &mut Frame, area: Rect, title: String, text: &str) {
    let message = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(message, area);
}

impl App {
    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TABS_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        match self.screen {
            Screen::Songs => self.draw_catalog(frame, chunks[1]),
            Screen::Shows => self.draw_shows(frame, chunks[1]),
            Screen::Setlist => match &self.setlist {
                Some(setlist) => self.draw_setlist(frame, chunks[1], setlist),
                None => empty_message(
                    frame,
                    chunks[1],
                    "Setlist".to_string(),
                    "Open a show from the Shows tab (Enter) to edit its setlist.",
                ),
            },
            Screen::About => self.draw_about(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Searching(query) => self.draw_search_bar(frame, chunks[1], query),
            Mode::AddingSong(form) => self.draw_song_form(frame, area, "Add Song", form),
            Mode::EditingSong { form, .. } => self.draw_song_form(frame, area, "Edit Song", form),
            Mode::ConfirmSongDelete(song) => self.draw_confirm(
                frame,
                area,
                "Delete Song",
                vec![
                    Line::from(format!("Delete '{}' permanently?", song.display_title())),
                    Line::from("It will also be removed from every setlist."),
                ],
            ),
            Mode::AddingShow(form) => self.draw_show_form(frame, area, "Add Show", form),
            Mode::EditingShow { form, .. } => self.draw_show_form(frame, area, "Edit Show", form),
            Mode::ConfirmShowDelete { show, entries } => self.draw_confirm(
                frame,
                area,
                "Delete Show",
                vec![
                    Line::from(format!("Delete '{}'?", show.heading())),
                    Line::from(format!("Its setlist of {entries} songs will be deleted too.")),
                ],
            ),
            Mode::ConfirmEntryRemove(item) => self.draw_confirm(
                frame,
                area,
                "Remove Song",
                vec![Line::from(format!(
                    "Remove '{}' from this setlist?",
                    item.song_name
                ))],
            ),
            Mode::PickingSong(picker) => self.draw_picker(frame, area, picker),
            Mode::PromptingPath(prompt) => self.draw_path_prompt(frame, area, prompt),
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<&str> = Screen::ALL.iter().map(|screen| screen.title()).collect();
        let tabs = Tabs::new(titles)
            .select(self.screen.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Repertoire Manager"),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let catalog = &self.catalog;
        let title = match &catalog.filter {
            Some(query) => format!(
                "Songs • {} of {} • search: {query}",
                catalog.filtered_songs.len(),
                catalog.songs.len()
            ),
            None => format!("Songs • {}", catalog.songs.len()),
        };

        if catalog.songs.is_empty() {
            empty_message(frame, area, title, "No songs yet. Press '+' to add one.");
            return;
        }
        if catalog.filtered_songs.is_empty() {
            empty_message(frame, area, title, "No songs match the current search.");
            return;
        }

        let items: Vec<ListItem> = catalog
            .filtered_songs
            .iter()
            .map(|song| ListItem::new(song_line(song)))
            .collect();
        let mut state = ListState::default();
        state.select(Some(catalog.selected));
        frame.render_stateful_widget(highlighted_list(items, title), area, &mut state);
    }

    fn draw_shows(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Shows • {}", self.shows.shows.len());
        if self.shows.shows.is_empty() {
            empty_message(frame, area, title, "No shows yet. Press '+' to add one.");
            return;
        }

        let items: Vec<ListItem> = self
            .shows
            .shows
            .iter()
            .map(|show| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<12}", show.date),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::styled(
                        show.performer.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  @ {}", show.venue)),
                ]))
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.shows.selected));
        frame.render_stateful_widget(highlighted_list(items, title), area, &mut state);
    }

    fn draw_setlist(&self, frame: &mut Frame, area: Rect, setlist: &SetlistScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                setlist.show.heading(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  •  {} songs", setlist.items.len())),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Show"));
        frame.render_widget(header, chunks[0]);

        if setlist.items.is_empty() {
            empty_message(
                frame,
                chunks[1],
                "Setlist".to_string(),
                "No songs yet. Press '+' to add from the catalog.",
            );
            return;
        }

        let items: Vec<ListItem> = setlist
            .items
            .iter()
            .map(|item| {
                let mut spans = vec![Span::styled(
                    format!("{}. {}", item.rank, item.song_name),
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                if let Some(key) = &item.key {
                    spans.push(Span::styled(
                        format!("  {key}"),
                        Style::default().fg(Color::LightRed),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(setlist.selected));
        frame.render_stateful_widget(
            highlighted_list(items, "Setlist".to_string()),
            chunks[1],
            &mut state,
        );
    }

    fn draw_about(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                format!("Repertoire Manager {}", env!("CARGO_PKG_VERSION")),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("Song catalog, show setlists, PDF export and JSON backups."),
            Line::from(""),
            Line::from(format!("Database:   {}", self.settings.db_path.display())),
            Line::from(format!("Export dir: {}", self.settings.export_dir.display())),
            Line::from(format!("Log file:   {}", self.settings.log_file.display())),
            Line::from(""),
            hints(&[("b", "Export backup"), ("i", "Import backup")]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("About"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = match &self.status {
            Some(status) => Line::from(vec![Span::styled(status.text.clone(), status.kind.style())]),
            None => Line::from(""),
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.mode, self.screen) {
            (Mode::Searching(_), _) => hints(&[("↑↓", "Select"), ("Enter", "Keep"), ("Esc", "Clear")]),
            (Mode::PickingSong(_), _) => hints(&[
                ("type", "Filter"),
                ("↑↓", "Select"),
                ("Enter", "Add"),
                ("Esc", "Done"),
            ]),
            (Mode::PromptingPath(_), _) => hints(&[("Enter", "Confirm"), ("Esc", "Cancel")]),
            (Mode::Normal, Screen::Songs) => hints(&[
                ("↑↓", "Select"),
                ("f", "Search"),
                ("+", "Add"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("Tab", "Next tab"),
                ("q", "Quit"),
            ]),
            (Mode::Normal, Screen::Shows) => hints(&[
                ("↑↓", "Select"),
                ("Enter", "Setlist"),
                ("+", "Add"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("p", "PDF"),
                ("Tab", "Next tab"),
                ("q", "Quit"),
            ]),
            (Mode::Normal, Screen::Setlist) => hints(&[
                ("↑↓", "Select"),
                ("+", "Add songs"),
                ("u/d", "Move up/down"),
                ("-", "Remove"),
                ("p", "PDF"),
                ("Esc", "Shows"),
                ("q", "Quit"),
            ]),
            (Mode::Normal, Screen::About) => hints(&[("Tab", "Next tab"), ("q", "Quit")]),
            _ => hints(&[("y", "Confirm"), ("n/Esc", "Cancel")]),
        }
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, query: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_song_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &SongForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = SongField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(match &form.error {
            Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                "Enter to save • Tab to accept/switch • ←/→ picks a style • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        });

        frame.render_widget(Paragraph::new(lines), inner);

        let row = SongField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0) as u16;
        let prefix = format!("{}: ", form.active.label()).len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn draw_show_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &ShowForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = ShowField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(match &form.error {
            Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        });

        frame.render_widget(Paragraph::new(lines), inner);

        let row = ShowField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0) as u16;
        let prefix = format!("{}: ", form.active.label()).len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_picker(&self, frame: &mut Frame, area: Rect, picker: &SongPicker) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Add Songs to Setlist")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        frame.render_widget(
            Paragraph::new(format!("Search: {}", picker.query)),
            chunks[0],
        );

        let items: Vec<ListItem> = picker
            .filtered
            .iter()
            .map(|song| ListItem::new(song_line(song)))
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(picker.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_path_prompt(&self, frame: &mut Frame, area: Rect, prompt: &PathPrompt) {
        let popup_area = centered_rect(80, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(prompt.op.title())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![prompt.build_line(), Line::from("")];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

        let prefix = "Path: ".len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + prompt.path.chars().count() as u16,
            inner.y,
        ));
    }
}
