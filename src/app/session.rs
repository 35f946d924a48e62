use super::editor::EditorState;
use crate::model::{ContentBlock, Note, NoteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    List,
    Title,
    Body,
    Blocks,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::List => FocusPane::Title,
            FocusPane::Title => FocusPane::Body,
            FocusPane::Body => FocusPane::Blocks,
            FocusPane::Blocks => FocusPane::List,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FocusPane::List => FocusPane::Blocks,
            FocusPane::Title => FocusPane::List,
            FocusPane::Body => FocusPane::Title,
            FocusPane::Blocks => FocusPane::Body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Url,
    Text,
}

#[derive(Debug, Clone)]
pub struct LinkPrompt {
    pub note_id: NoteId,
    pub field: LinkField,
    pub url: String,
    pub text: String,
}

impl LinkPrompt {
    pub fn active_input_mut(&mut self) -> &mut String {
        match self.field {
            LinkField::Url => &mut self.url,
            LinkField::Text => &mut self.text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImagePrompt {
    pub note_id: NoteId,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct DeletePrompt {
    pub note_id: NoteId,
    pub title: String,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    Link(LinkPrompt),
    Image(ImagePrompt),
    Delete(DeletePrompt),
    Help,
}

/// Terminal-only view state layered over the notes collection: focus,
/// cursors, prompts and the body editor.
#[derive(Debug, Clone)]
pub struct UiState {
    pub focus: FocusPane,
    pub overlay: Option<OverlayState>,
    pub list_cursor: usize,
    pub block_cursor: usize,
    pub search_active: bool,
    pub status_message: Option<String>,
    pub pending_images: usize,
    editor: Option<EditorState>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: FocusPane::List,
            overlay: None,
            list_cursor: 0,
            block_cursor: 0,
            search_active: false,
            status_message: None,
            pending_images: 0,
            editor: None,
        }
    }
}

impl UiState {
    pub fn editor(&self) -> Option<&EditorState> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditorState> {
        self.editor.as_mut()
    }

    /// Reseeds the editor when the selected note changed underneath it.
    /// Returns whether a new buffer was loaded.
    pub fn sync_editor(&mut self, selected: Option<&Note>) -> bool {
        match (selected, &self.editor) {
            (Some(note), Some(editor)) if editor.note_id() == note.id => false,
            (Some(note), _) => {
                self.editor = Some(EditorState::new(note.id, note.body().to_string()));
                self.block_cursor = 0;
                true
            }
            (None, Some(_)) => {
                self.editor = None;
                self.block_cursor = 0;
                true
            }
            (None, None) => false,
        }
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn move_list_cursor(&mut self, delta: isize, len: usize) {
        self.list_cursor = step(self.list_cursor, delta, len);
    }

    pub fn move_block_cursor(&mut self, delta: isize, len: usize) {
        self.block_cursor = step(self.block_cursor, delta, len);
    }

    pub fn clamp_cursors(&mut self, visible: usize, attachments: usize) {
        self.list_cursor = self.list_cursor.min(visible.saturating_sub(1));
        self.block_cursor = self.block_cursor.min(attachments.saturating_sub(1));
    }

    /// The link or image under the block cursor.
    pub fn current_block<'a>(&self, note: &'a Note) -> Option<&'a ContentBlock> {
        note.attachments().nth(self.block_cursor)
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len as isize - 1;
    (current as isize + delta).clamp(0, max) as usize
}
