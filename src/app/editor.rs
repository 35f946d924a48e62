use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::state::{NoteField, NotesState};
use crate::model::{BlockId, ImageUpload, NoteId};
use crate::storage::{KeyValueStore, PersistError};

/// Body editing operations. Each one rebuilds the selected note's content and
/// hands it to [`NotesState::update_note`]; they all return `Ok(false)` when
/// nothing changed.
impl<S: KeyValueStore> NotesState<S> {
    pub fn replace_body(&mut self, body: &str) -> Result<bool, PersistError> {
        let Some(note) = self.selected_note() else {
            return Ok(false);
        };
        if note.body() == body {
            return Ok(false);
        }
        let content = note.content_with_body(body);
        self.update_note(NoteField::Content(content))
    }

    /// Appends a link. An empty URL aborts; empty display text shows the URL.
    pub fn insert_link(&mut self, url: &str, text: &str) -> Result<bool, PersistError> {
        let url = url.trim();
        if url.is_empty() || self.selected_note().is_none() {
            return Ok(false);
        }
        let id = self.next_block_id();
        let Some(note) = self.selected_note() else {
            return Ok(false);
        };
        let content = note.content_with_link(id, url, text.trim());
        self.update_note(NoteField::Content(content))
    }

    pub fn insert_image(&mut self, upload: ImageUpload) -> Result<bool, PersistError> {
        if self.selected_note().is_none() {
            return Ok(false);
        }
        let id = self.next_block_id();
        let Some(note) = self.selected_note() else {
            return Ok(false);
        };
        let content = note.content_with_image(id, upload);
        self.update_note(NoteField::Content(content))
    }

    /// Removes a link or image. The body text has no id and cannot be removed here.
    pub fn remove_block(&mut self, id: BlockId) -> Result<bool, PersistError> {
        let Some(note) = self.selected_note() else {
            return Ok(false);
        };
        if !note.has_block(id) {
            return Ok(false);
        }
        let content = note.content_without_block(id);
        self.update_note(NoteField::Content(content))
    }

    pub fn resize_image(&mut self, id: BlockId, delta: i32) -> Result<bool, PersistError> {
        let Some(note) = self.selected_note() else {
            return Ok(false);
        };
        let content = note.content_with_image_resized(id, delta);
        if content == note.content {
            return Ok(false);
        }
        self.update_note(NoteField::Content(content))
    }
}

/// Cursor movements the body editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    WordLeft,
    WordRight,
    Up,
    Down,
    LineStart,
    LineEnd,
}

/// Consecutive edits of the same kind undo together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditGroup {
    Typing,
    Erasing,
}

#[derive(Debug, Clone)]
struct Snapshot {
    text: String,
    cursor: usize,
}

/// Working copy of the selected note's body text. The app writes
/// [`EditorState::text`] back through [`NotesState::replace_body`] after
/// every edit; attachments never pass through here.
#[derive(Debug, Clone)]
pub struct EditorState {
    note_id: NoteId,
    text: String,
    cursor: usize,
    goal_column: Option<usize>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    open_group: Option<EditGroup>,
}

const MAX_UNDO: usize = 200;

impl EditorState {
    pub fn new(note_id: NoteId, text: String) -> Self {
        Self {
            note_id,
            cursor: text.len(),
            text,
            goal_column: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open_group: None,
        }
    }

    pub fn note_id(&self) -> NoteId {
        self.note_id
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Typed characters group into one undo step per word.
    pub fn insert_char(&mut self, ch: char) -> bool {
        self.begin_edit(Some(EditGroup::Typing));
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        if ch.is_whitespace() {
            self.open_group = None;
        }
        true
    }

    /// Inserts pasted text as a single undo step. Carriage returns are dropped.
    pub fn insert_str(&mut self, pasted: &str) -> bool {
        let cleaned: String = pasted.chars().filter(|ch| *ch != '\r').collect();
        if cleaned.is_empty() {
            return false;
        }
        self.begin_edit(None);
        self.text.insert_str(self.cursor, &cleaned);
        self.cursor += cleaned.len();
        true
    }

    pub fn backspace(&mut self) -> bool {
        let start = prev_boundary(&self.text, self.cursor);
        if start == self.cursor {
            return false;
        }
        self.begin_edit(Some(EditGroup::Erasing));
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        let end = next_boundary(&self.text, self.cursor);
        if end == self.cursor {
            return false;
        }
        self.begin_edit(Some(EditGroup::Erasing));
        self.text.replace_range(self.cursor..end, "");
        true
    }

    /// Returns whether the cursor actually moved.
    pub fn move_cursor(&mut self, motion: Motion) -> bool {
        self.open_group = None;
        let mut goal = None;
        let target = match motion {
            Motion::Left => prev_boundary(&self.text, self.cursor),
            Motion::Right => next_boundary(&self.text, self.cursor),
            Motion::WordLeft => word_start_before(&self.text, self.cursor),
            Motion::WordRight => word_start_after(&self.text, self.cursor),
            Motion::LineStart => line_bounds(&self.text, self.cursor).start,
            Motion::LineEnd => line_bounds(&self.text, self.cursor).end,
            Motion::Up | Motion::Down => {
                let column = self
                    .goal_column
                    .unwrap_or_else(|| display_column(&self.text, self.cursor));
                goal = Some(column);
                vertical_target(&self.text, self.cursor, column, motion == Motion::Up)
            }
        };
        self.goal_column = goal;
        if target == self.cursor {
            return false;
        }
        self.cursor = target;
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.swap_in(previous);
        self.redo_stack.push(current);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.swap_in(next);
        self.undo_stack.push(current);
        true
    }

    fn begin_edit(&mut self, group: Option<EditGroup>) {
        self.goal_column = None;
        if group.is_none() || group != self.open_group {
            self.undo_stack.push(Snapshot {
                text: self.text.clone(),
                cursor: self.cursor,
            });
            if self.undo_stack.len() > MAX_UNDO {
                self.undo_stack.remove(0);
            }
        }
        self.redo_stack.clear();
        self.open_group = group;
    }

    fn swap_in(&mut self, snapshot: Snapshot) -> Snapshot {
        self.open_group = None;
        self.goal_column = None;
        Snapshot {
            text: std::mem::replace(&mut self.text, snapshot.text),
            cursor: std::mem::replace(&mut self.cursor, snapshot.cursor),
        }
    }
}

fn prev_boundary(text: &str, at: usize) -> usize {
    text[..at]
        .grapheme_indices(true)
        .next_back()
        .map_or(0, |(idx, _)| idx)
}

fn next_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .graphemes(true)
        .next()
        .map_or(at, |grapheme| at + grapheme.len())
}

fn is_blank(segment: &str) -> bool {
    segment.chars().all(char::is_whitespace)
}

fn word_start_before(text: &str, at: usize) -> usize {
    text[..at]
        .split_word_bound_indices()
        .rev()
        .find(|(_, segment)| !is_blank(segment))
        .map_or(0, |(idx, _)| idx)
}

fn word_start_after(text: &str, at: usize) -> usize {
    text[at..]
        .split_word_bound_indices()
        .skip(1)
        .find(|(_, segment)| !is_blank(segment))
        .map_or(text.len(), |(idx, _)| at + idx)
}

fn line_bounds(text: &str, at: usize) -> Range<usize> {
    let start = text[..at].rfind('\n').map_or(0, |idx| idx + 1);
    let end = text[at..].find('\n').map_or(text.len(), |idx| at + idx);
    start..end
}

/// Terminal cells between the start of the line and `at`.
fn display_column(text: &str, at: usize) -> usize {
    let line = line_bounds(text, at);
    UnicodeWidthStr::width(&text[line.start..at])
}

fn vertical_target(text: &str, at: usize, column: usize, upward: bool) -> usize {
    let line = line_bounds(text, at);
    let neighbour = if upward {
        match line.start.checked_sub(1) {
            Some(prev_end) => line_bounds(text, prev_end),
            None => return 0,
        }
    } else if line.end < text.len() {
        line_bounds(text, line.end + 1)
    } else {
        return text.len();
    };
    offset_at_column(text, neighbour, column)
}

fn offset_at_column(text: &str, line: Range<usize>, column: usize) -> usize {
    let mut width = 0;
    for (idx, grapheme) in text[line.clone()].grapheme_indices(true) {
        width += UnicodeWidthStr::width(grapheme);
        if width > column {
            return line.start + idx;
        }
    }
    line.end
}
