use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::media::{ImageLoadResult, ImageLoader};
use crate::model::{ContentBlock, NoteId, IMAGE_RESIZE_STEP};
use crate::storage::{KeyValueStore, PersistError, SqliteStore};
use crate::ui::{self, RenderOptions};

pub mod editor;
pub mod session;
pub mod state;

pub use editor::{EditorState, Motion};
pub use session::{FocusPane, OverlayState, UiState};
pub use state::{NoteField, NotesState};

use session::{DeletePrompt, ImagePrompt, LinkField, LinkPrompt};

fn plain(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn ctrl(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
}

pub struct App<S = SqliteStore> {
    pub config: Arc<AppConfig>,
    notes: NotesState<S>,
    ui: UiState,
    list_state: ListState,
    images: ImageLoader,
    render: RenderOptions,
    should_quit: bool,
    tick_rate: Duration,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(config: Arc<AppConfig>, mut notes: NotesState<S>) -> Self {
        notes.set_sidebar_open(config.sidebar_open_on_start);
        let render = RenderOptions {
            palette: config.palette(),
            preview_chars: config.list.preview_chars,
        };
        let tick_rate = Duration::from_millis(config.tick_rate_ms.max(10));
        let mut app = Self {
            config,
            notes,
            ui: UiState::default(),
            list_state: ListState::default(),
            images: ImageLoader::new(),
            render,
            should_quit: false,
            tick_rate,
        };
        app.sync_view();
        app.focus_list_on_selection();
        app
    }

    pub fn notes(&self) -> &NotesState<S> {
        &self.notes
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    ui::draw_app(
                        frame,
                        &self.notes,
                        &self.ui,
                        &self.render,
                        &mut self.list_state,
                    );
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Paste(text) => self.handle_paste(&text),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    pub fn on_tick(&mut self) {
        for result in self.images.poll() {
            self.apply_image_result(result);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if ctrl(&key) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.handle_overlay_key(key) {
            return;
        }
        if self.ui.search_active {
            self.handle_search_key(key);
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.ui.focus = self.ui.focus.next();
                self.on_focus_changed();
                return;
            }
            KeyCode::BackTab => {
                self.ui.focus = self.ui.focus.previous();
                self.on_focus_changed();
                return;
            }
            KeyCode::Char('n') if ctrl(&key) => {
                self.create_note();
                return;
            }
            KeyCode::Char('b') if ctrl(&key) => {
                self.notes.toggle_sidebar();
                return;
            }
            KeyCode::F(1) => {
                self.ui.overlay = Some(OverlayState::Help);
                return;
            }
            _ => {}
        }

        match self.ui.focus {
            FocusPane::List => self.handle_list_key(key),
            FocusPane::Title => self.handle_title_key(key),
            FocusPane::Body => self.handle_body_key(key),
            FocusPane::Blocks => self.handle_blocks_key(key),
        }
    }

    fn handle_paste(&mut self, text: &str) {
        if self.ui.overlay.is_some() || self.ui.search_active {
            return;
        }
        match self.ui.focus {
            FocusPane::Body => {
                self.apply_editor_change(|editor| editor.insert_str(text));
            }
            FocusPane::Title => {
                if let Some(note) = self.notes.selected_note() {
                    let mut title = note.title.clone();
                    title.push_str(text.lines().next().unwrap_or(""));
                    self.set_title(title);
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.ui.search_active = false;
                self.notes.set_search_query("");
            }
            KeyCode::Enter | KeyCode::Down => {
                self.ui.search_active = false;
            }
            KeyCode::Backspace => {
                let mut query = self.notes.search_query().to_string();
                query.pop();
                self.notes.set_search_query(query);
            }
            KeyCode::Char(ch) if plain(&key) => {
                let mut query = self.notes.search_query().to_string();
                query.push(ch);
                self.notes.set_search_query(query);
            }
            _ => return,
        }
        self.ui.list_cursor = 0;
        self.sync_view();
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        if !plain(&key) {
            return;
        }
        let visible = self.notes.visible_notes().len();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.ui.move_list_cursor(1, visible),
            KeyCode::Char('k') | KeyCode::Up => self.ui.move_list_cursor(-1, visible),
            KeyCode::Char('g') | KeyCode::Home => self.ui.list_cursor = 0,
            KeyCode::Char('G') | KeyCode::End => self.ui.move_list_cursor(visible as isize, visible),
            KeyCode::Enter => self.open_note_under_cursor(),
            KeyCode::Char('n') | KeyCode::Char('a') => self.create_note(),
            KeyCode::Char('d') | KeyCode::Delete => self.confirm_delete_under_cursor(),
            KeyCode::Char('/') => {
                self.ui.search_active = true;
                self.notes.set_sidebar_open(true);
            }
            KeyCode::Char('s') => {
                let open = self.notes.toggle_sidebar();
                tracing::debug!(open, "sidebar toggled");
            }
            KeyCode::Char('?') => self.ui.overlay = Some(OverlayState::Help),
            KeyCode::Esc if !self.notes.search_query().is_empty() => {
                self.notes.set_search_query("");
                self.ui.list_cursor = 0;
            }
            _ => {}
        }
    }

    fn handle_title_key(&mut self, key: KeyEvent) {
        let Some(note) = self.notes.selected_note() else {
            self.focus_list();
            return;
        };
        let mut title = note.title.clone();
        match key.code {
            KeyCode::Esc => self.focus_list(),
            KeyCode::Enter | KeyCode::Down => self.ui.focus = FocusPane::Body,
            KeyCode::Backspace => {
                if title.pop().is_some() {
                    self.set_title(title);
                }
            }
            KeyCode::Char(ch) if plain(&key) => {
                title.push(ch);
                self.set_title(title);
            }
            _ => {}
        }
    }

    fn handle_body_key(&mut self, key: KeyEvent) {
        if self.notes.selected_note().is_none() {
            self.focus_list();
            return;
        }
        if ctrl(&key) {
            match key.code {
                KeyCode::Char('z') => {
                    let undone = self.apply_editor_change(EditorState::undo);
                    let message = if undone { "Undid change" } else { "Nothing to undo" };
                    self.ui.set_status_message(Some(message));
                }
                KeyCode::Char('y') => {
                    let redone = self.apply_editor_change(EditorState::redo);
                    let message = if redone { "Redid change" } else { "Nothing to redo" };
                    self.ui.set_status_message(Some(message));
                }
                KeyCode::Char('l') => self.open_link_prompt(),
                KeyCode::Char('o') => self.open_image_prompt(),
                KeyCode::Left => self.move_editor(Motion::WordLeft),
                KeyCode::Right => self.move_editor(Motion::WordRight),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.focus_list(),
            KeyCode::Enter => {
                self.apply_editor_change(|editor| editor.insert_char('\n'));
            }
            KeyCode::Backspace => {
                self.apply_editor_change(EditorState::backspace);
            }
            KeyCode::Delete => {
                self.apply_editor_change(EditorState::delete_forward);
            }
            KeyCode::Char(ch) if plain(&key) => {
                self.apply_editor_change(|editor| editor.insert_char(ch));
            }
            KeyCode::Left => self.move_editor(Motion::Left),
            KeyCode::Right => self.move_editor(Motion::Right),
            KeyCode::Up => self.move_editor(Motion::Up),
            KeyCode::Down => self.move_editor(Motion::Down),
            KeyCode::Home => self.move_editor(Motion::LineStart),
            KeyCode::End => self.move_editor(Motion::LineEnd),
            _ => {}
        }
    }

    fn handle_blocks_key(&mut self, key: KeyEvent) {
        let Some(note) = self.notes.selected_note() else {
            self.focus_list();
            return;
        };
        let count = note.attachments().count();
        let current = self.ui.current_block(note).cloned();
        if ctrl(&key) {
            match key.code {
                KeyCode::Char('l') => self.open_link_prompt(),
                KeyCode::Char('o') => self.open_image_prompt(),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.focus_list(),
            KeyCode::Char('j') | KeyCode::Down => self.ui.move_block_cursor(1, count),
            KeyCode::Char('k') | KeyCode::Up => self.ui.move_block_cursor(-1, count),
            KeyCode::Char('l') => self.open_link_prompt(),
            KeyCode::Char('i') => self.open_image_prompt(),
            KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                if let Some(id) = current.as_ref().and_then(ContentBlock::id) {
                    let result = self.notes.remove_block(id);
                    if self.report(result) == Some(true) {
                        self.ui.set_status_message(Some("Removed"));
                    }
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char('-') => {
                let delta = if key.code == KeyCode::Char('-') {
                    -IMAGE_RESIZE_STEP
                } else {
                    IMAGE_RESIZE_STEP
                };
                match current {
                    Some(ContentBlock::Image { id, .. }) => {
                        let result = self.notes.resize_image(id, delta);
                        self.report(result);
                    }
                    Some(_) => self.ui.set_status_message(Some("Only images can be resized")),
                    None => {}
                }
            }
            _ => {}
        }
        self.sync_view();
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        let Some(overlay) = self.ui.overlay.take() else {
            return false;
        };
        let keep = match overlay {
            OverlayState::Help => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q') => None,
                _ => Some(OverlayState::Help),
            },
            OverlayState::Delete(prompt) => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    self.delete_note(prompt.note_id);
                    None
                }
                KeyCode::Esc | KeyCode::Char('n') => {
                    self.ui.set_status_message(Some("Delete canceled"));
                    None
                }
                _ => Some(OverlayState::Delete(prompt)),
            },
            OverlayState::Link(mut prompt) => match key.code {
                KeyCode::Esc => {
                    self.ui.set_status_message(Some("Link canceled"));
                    None
                }
                KeyCode::Tab | KeyCode::BackTab => {
                    prompt.field = match prompt.field {
                        LinkField::Url => LinkField::Text,
                        LinkField::Text => LinkField::Url,
                    };
                    Some(OverlayState::Link(prompt))
                }
                KeyCode::Enter if prompt.field == LinkField::Url => {
                    prompt.field = LinkField::Text;
                    Some(OverlayState::Link(prompt))
                }
                KeyCode::Enter => {
                    self.submit_link(prompt);
                    None
                }
                KeyCode::Backspace => {
                    prompt.active_input_mut().pop();
                    Some(OverlayState::Link(prompt))
                }
                KeyCode::Char(ch) if plain(&key) => {
                    prompt.active_input_mut().push(ch);
                    Some(OverlayState::Link(prompt))
                }
                _ => Some(OverlayState::Link(prompt)),
            },
            OverlayState::Image(mut prompt) => match key.code {
                KeyCode::Esc => None,
                KeyCode::Enter => {
                    self.submit_image(prompt);
                    None
                }
                KeyCode::Backspace => {
                    prompt.path.pop();
                    Some(OverlayState::Image(prompt))
                }
                KeyCode::Char(ch) if plain(&key) => {
                    prompt.path.push(ch);
                    Some(OverlayState::Image(prompt))
                }
                _ => Some(OverlayState::Image(prompt)),
            },
        };
        if self.ui.overlay.is_none() {
            self.ui.overlay = keep;
        }
        true
    }

    fn open_note_under_cursor(&mut self) {
        let Some(id) = self
            .notes
            .visible_notes()
            .get(self.ui.list_cursor)
            .map(|note| note.id)
        else {
            return;
        };
        let result = self.notes.set_selected_note(Some(id));
        self.report(result);
        self.ui.focus = FocusPane::Body;
        self.sync_view();
    }

    fn confirm_delete_under_cursor(&mut self) {
        if let Some(note) = self.notes.visible_notes().get(self.ui.list_cursor) {
            self.ui.overlay = Some(OverlayState::Delete(DeletePrompt {
                note_id: note.id,
                title: note.title.clone(),
            }));
        }
    }

    fn create_note(&mut self) {
        let result = self.notes.create_note();
        if self.report(result).is_some() {
            self.ui.set_status_message(Some("Created note"));
        }
        self.sync_view();
        self.focus_list_on_selection();
        self.ui.focus = FocusPane::Title;
    }

    fn delete_note(&mut self, id: NoteId) {
        let result = self.notes.delete_note(id);
        if self.report(result) == Some(true) {
            self.ui.set_status_message(Some("Deleted note"));
        }
        self.sync_view();
        self.focus_list_on_selection();
    }

    fn set_title(&mut self, title: String) {
        let result = self.notes.update_note(NoteField::Title(title));
        self.report(result);
    }

    fn open_link_prompt(&mut self) {
        if let Some(note_id) = self.notes.selected_id() {
            self.ui.overlay = Some(OverlayState::Link(LinkPrompt {
                note_id,
                field: LinkField::Url,
                url: String::new(),
                text: String::new(),
            }));
        }
    }

    fn open_image_prompt(&mut self) {
        if let Some(note_id) = self.notes.selected_id() {
            self.ui.overlay = Some(OverlayState::Image(ImagePrompt {
                note_id,
                path: String::new(),
            }));
        }
    }

    fn submit_link(&mut self, prompt: LinkPrompt) {
        if self.notes.selected_id() != Some(prompt.note_id) {
            return;
        }
        let result = self.notes.insert_link(&prompt.url, &prompt.text);
        match self.report(result) {
            Some(true) => self.ui.set_status_message(Some("Link added")),
            Some(false) => self.ui.set_status_message(Some("Link needs a URL")),
            None => {}
        }
        self.sync_view();
    }

    fn submit_image(&mut self, prompt: ImagePrompt) {
        let raw = prompt.path.trim();
        if raw.is_empty() {
            return;
        }
        let path = expand_home(raw);
        tracing::debug!(note_id = %prompt.note_id, path = %path.display(), "loading image");
        self.images.request(prompt.note_id, path);
        self.ui.pending_images += 1;
    }

    fn apply_image_result(&mut self, result: ImageLoadResult) {
        self.ui.pending_images = self.ui.pending_images.saturating_sub(1);
        match result.outcome {
            Ok(Some(upload)) if self.notes.selected_id() == Some(result.note_id) => {
                let alt = upload.alt.clone();
                let outcome = self.notes.insert_image(upload);
                if self.report(outcome) == Some(true) {
                    self.ui.set_status_message(Some(format!("Added image {alt}")));
                }
            }
            Ok(Some(_)) => {
                tracing::debug!(note_id = %result.note_id, "image arrived after selection changed, dropping");
            }
            Ok(None) => {
                tracing::debug!(note_id = %result.note_id, "selected file is not an image");
            }
            Err(err) => {
                tracing::warn!(%err, "image load failed");
                self.ui
                    .set_status_message(Some(format!("Could not load image: {err}")));
            }
        }
        self.sync_view();
    }

    /// Runs an editor edit and writes the new body through to the note.
    fn apply_editor_change<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut EditorState) -> bool,
    {
        let Some(editor) = self.ui.editor_mut() else {
            return false;
        };
        if !f(editor) {
            return false;
        }
        let body = editor.text().to_string();
        let result = self.notes.replace_body(&body);
        self.report(result);
        true
    }

    fn move_editor(&mut self, motion: Motion) {
        if let Some(editor) = self.ui.editor_mut() {
            editor.move_cursor(motion);
        }
    }

    fn focus_list(&mut self) {
        self.ui.focus = FocusPane::List;
        self.notes.set_sidebar_open(true);
        self.focus_list_on_selection();
    }

    fn on_focus_changed(&mut self) {
        if self.ui.focus == FocusPane::List {
            self.notes.set_sidebar_open(true);
        } else {
            self.notes.set_sidebar_open(false);
        }
    }

    fn focus_list_on_selection(&mut self) {
        let Some(selected) = self.notes.selected_id() else {
            return;
        };
        if let Some(position) = self
            .notes
            .visible_notes()
            .iter()
            .position(|note| note.id == selected)
        {
            self.ui.list_cursor = position;
        }
    }

    fn sync_view(&mut self) {
        self.ui.sync_editor(self.notes.selected_note());
        let visible = self.notes.visible_notes().len();
        let attachments = self
            .notes
            .selected_note()
            .map(|note| note.attachments().count())
            .unwrap_or(0);
        self.ui.clamp_cursors(visible, attachments);
    }

    /// Persist failures are already recorded as the state's warning; the
    /// in-memory change stands either way.
    fn report<T>(&mut self, result: Result<T, PersistError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(%err, "change kept in memory only");
                None
            }
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(raw)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )
    .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )
    .context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::clock::testing::ManualClock;
    use crate::model::{WELCOME_NOTE_ID, WELCOME_TITLE};
    use crate::storage::{MemoryStore, NOTES_KEY};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;
    use time::macros::datetime;

    fn app() -> App<MemoryStore> {
        let clock = ManualClock::at(datetime!(2024-05-01 12:00 UTC));
        let notes = NotesState::load_with_clock(MemoryStore::new(), Box::new(clock));
        App::new(Arc::new(AppConfig::default()), notes)
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn press_ctrl(app: &mut App<MemoryStore>, ch: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL));
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn new_note_then_typing_renames_it() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.ui().focus, FocusPane::Title);
        for _ in 0.."Untitled Note".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Groceries");
        let note = app.notes().selected_note().expect("selected");
        assert_eq!(note.title, "Groceries");
        assert_eq!(app.notes().notes()[0].id, note.id);
        assert_eq!(app.ui().list_cursor, 0);
    }

    #[test]
    fn body_typing_persists_and_undo_restores() -> anyhow::Result<()> {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui().focus, FocusPane::Body);
        type_text(&mut app, "!");
        let body = app.notes().selected_note().expect("selected").body().to_string();
        assert!(body.ends_with("automatically.!"));
        let stored = app.notes().store().get(NOTES_KEY)?.expect("notes saved");
        assert!(stored.contains("automatically.!"));

        press_ctrl(&mut app, 'z');
        let body = app.notes().selected_note().expect("selected").body().to_string();
        assert!(body.ends_with("automatically."));
        Ok(())
    }

    #[test]
    fn pasted_text_is_one_undo_step() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        app.handle_paste("line one\r\nline two");
        let body = app.notes().selected_note().expect("selected").body().to_string();
        assert!(body.ends_with("automatically.line one\nline two"));

        press_ctrl(&mut app, 'z');
        let body = app.notes().selected_note().expect("selected").body().to_string();
        assert!(body.ends_with("automatically."));
    }

    #[test]
    fn search_narrows_list_and_escape_clears() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "welcome");
        assert_eq!(app.notes().visible_notes().len(), 1);
        assert_eq!(app.notes().visible_notes()[0].title, WELCOME_TITLE);
        press(&mut app, KeyCode::Esc);
        assert!(!app.ui().search_active);
        assert_eq!(app.notes().search_query(), "");
        assert_eq!(app.notes().visible_notes().len(), 2);
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));
        assert_matches!(app.ui().overlay(), Some(OverlayState::Delete(_)));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.notes().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.notes().is_empty());
        assert!(app.ui().editor().is_none());
    }

    #[test]
    fn link_prompt_inserts_link_block() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press_ctrl(&mut app, 'l');
        type_text(&mut app, "https://example.com");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "Example");
        press(&mut app, KeyCode::Enter);

        assert!(app.ui().overlay().is_none());
        let note = app.notes().selected_note().expect("selected");
        assert_matches!(
            note.attachments().next(),
            Some(ContentBlock::Link { url, text, .. }) if url == "https://example.com" && text == "Example"
        );
    }

    #[test]
    fn link_prompt_with_empty_url_changes_nothing() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        let before = app.notes().selected_note().cloned();
        press_ctrl(&mut app, 'l');
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "label only");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.notes().selected_note().cloned(), before);
    }

    #[test]
    fn image_loads_attach_to_the_requesting_note() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("cat.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\nrest")?;

        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press_ctrl(&mut app, 'o');
        type_text(&mut app, &path.display().to_string());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui().pending_images, 1);

        let result = app
            .images
            .recv_timeout(Duration::from_secs(5))
            .expect("load finished");
        app.apply_image_result(result);
        assert_eq!(app.ui().pending_images, 0);
        let note = app.notes().selected_note().expect("selected");
        assert_matches!(
            note.attachments().next(),
            Some(ContentBlock::Image { alt, width: 400, .. }) if alt == "cat.png"
        );

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.ui().focus, FocusPane::Blocks);
        press(&mut app, KeyCode::Char('+'));
        let note = app.notes().selected_note().expect("selected");
        assert_matches!(note.attachments().next(), Some(ContentBlock::Image { width: 450, .. }));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.notes().selected_note().expect("selected").attachments().count(), 0);
        Ok(())
    }

    #[test]
    fn image_for_a_deselected_note_is_dropped() -> anyhow::Result<()> {
        let mut app = app();
        let upload = crate::model::ImageUpload {
            src: "data:image/png;base64,AA==".into(),
            alt: "late.png".into(),
        };
        app.ui.pending_images = 1;
        app.apply_image_result(ImageLoadResult {
            note_id: NoteId(12345),
            outcome: Ok(Some(upload)),
        });
        let note = app.notes().note(WELCOME_NOTE_ID).expect("welcome");
        assert_eq!(note.attachments().count(), 0);
        Ok(())
    }

    #[test]
    fn quit_from_list() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
    }
}
