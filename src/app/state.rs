use time::OffsetDateTime;

use crate::model::content::normalize;
use crate::model::{next_stamp, BlockId, Clock, ContentBlock, IdGenerator, Note, NoteId, SystemClock};
use crate::search::filter_notes;
use crate::storage::{self, KeyValueStore, PersistError};

/// Field replaced by [`NotesState::update_note`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteField {
    Title(String),
    Content(Vec<ContentBlock>),
}

/// Owns the notes collection and the selection, and mirrors both to the
/// key-value store after every change.
///
/// Mutators apply the in-memory change first. A failed write is returned as
/// `Err` but the change is kept; the message stays available through
/// [`NotesState::persist_warning`] until a later write succeeds.
pub struct NotesState<S> {
    store: S,
    clock: Box<dyn Clock>,
    ids: IdGenerator,
    notes: Vec<Note>,
    selected: Option<NoteId>,
    search_query: String,
    sidebar_open: bool,
    persist_warning: Option<String>,
}

impl<S: KeyValueStore> NotesState<S> {
    pub fn load(store: S) -> Self {
        Self::load_with_clock(store, Box::new(SystemClock))
    }

    pub fn load_with_clock(store: S, clock: Box<dyn Clock>) -> Self {
        let stored = storage::load_state(&store);
        let now = clock.now();
        let notes = match stored.notes {
            Some(notes) => notes
                .into_iter()
                .map(|mut note| {
                    note.content = normalize(note.content);
                    note
                })
                .collect::<Vec<_>>(),
            None => {
                tracing::info!("no stored notes, starting with the welcome note");
                vec![Note::welcome(now)]
            }
        };
        let selected = stored
            .selected
            .filter(|id| notes.iter().any(|note| note.id == *id))
            .or_else(|| notes.first().map(|note| note.id));
        tracing::debug!(count = notes.len(), ?selected, "notes loaded");

        Self {
            store,
            clock,
            ids: IdGenerator::default(),
            notes,
            selected,
            search_query: String::new(),
            sidebar_open: false,
            persist_warning: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn selected_id(&self) -> Option<NoteId> {
        self.selected
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected.and_then(|id| self.note(id))
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    /// Notes matching the current search query, in collection order.
    pub fn visible_notes(&self) -> Vec<&Note> {
        filter_notes(&self.notes, &self.search_query)
    }

    pub fn persist_warning(&self) -> Option<&str> {
        self.persist_warning.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// A block id not used by any block of the selected note.
    pub fn next_block_id(&mut self) -> BlockId {
        let now = self.clock.now();
        let selected = self
            .selected
            .and_then(|id| self.notes.iter().find(|note| note.id == id));
        let id = self.ids.next(now, |candidate| {
            selected
                .map(|note| note.has_block(BlockId(candidate)))
                .unwrap_or(false)
        });
        BlockId(id)
    }

    pub fn create_note(&mut self) -> Result<NoteId, PersistError> {
        let now = self.clock.now();
        let notes = &self.notes;
        let id = NoteId(
            self.ids
                .next(now, |candidate| notes.iter().any(|note| note.id.0 == candidate)),
        );
        self.notes.insert(0, Note::new(id, now));
        self.selected = Some(id);
        self.sidebar_open = false;
        tracing::debug!(%id, "note created");

        let result = self.write_notes().and_then(|()| self.write_selection());
        self.record(result)?;
        Ok(id)
    }

    /// Replaces one field of the selected note. Returns `Ok(false)` when no
    /// note is selected.
    pub fn update_note(&mut self, field: NoteField) -> Result<bool, PersistError> {
        let Some(id) = self.selected else {
            tracing::debug!("update ignored, no note selected");
            return Ok(false);
        };
        let now = self.clock.now();
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            return Ok(false);
        };
        match field {
            NoteField::Title(title) => note.title = title,
            NoteField::Content(content) => note.content = normalize(content),
        }
        note.last_modified = next_stamp(note.last_modified, now);

        let result = self.write_notes().and_then(|()| self.write_selection());
        self.record(result)?;
        Ok(true)
    }

    /// Removes a note. Returns `Ok(false)` without touching storage when no
    /// note has that id.
    pub fn delete_note(&mut self, id: NoteId) -> Result<bool, PersistError> {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            return Ok(false);
        };
        self.notes.remove(index);
        let was_selected = self.selected == Some(id);
        if was_selected {
            self.selected = self.notes.first().map(|note| note.id);
        }
        tracing::debug!(%id, was_selected, "note deleted");

        let mut result = self.write_notes();
        if was_selected {
            result = result.and_then(|()| storage::clear_selected(&mut self.store));
        }
        self.record(result)?;
        Ok(true)
    }

    /// Selects a note and closes the sidebar. Ids that are not in the
    /// collection are ignored.
    pub fn set_selected_note(&mut self, id: Option<NoteId>) -> Result<(), PersistError> {
        if let Some(id) = id {
            if self.note(id).is_none() {
                tracing::debug!(%id, "ignoring selection of unknown note");
                return Ok(());
            }
        }
        self.selected = id;
        self.sidebar_open = false;
        let result = self.write_selection();
        self.record(result)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.sidebar_open = open;
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.sidebar_open
    }

    fn write_notes(&mut self) -> Result<(), PersistError> {
        storage::save_notes(&mut self.store, &self.notes)
    }

    fn write_selection(&mut self) -> Result<(), PersistError> {
        match self.selected {
            Some(id) => storage::save_selected(&mut self.store, id),
            None => Ok(()),
        }
    }

    fn record(&mut self, result: Result<(), PersistError>) -> Result<(), PersistError> {
        match result {
            Ok(()) => {
                self.persist_warning = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "failed to persist notes, keeping in-memory state");
                self.persist_warning = Some(format!("Not saved: {err}"));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::clock::testing::ManualClock;
    use crate::model::{WELCOME_NOTE_ID, WELCOME_TITLE};
    use crate::storage::{MemoryStore, NOTES_KEY, SELECTED_NOTE_KEY};
    use assert_matches::assert_matches;
    use time::macros::datetime;
    use time::Duration;

    fn state_with(store: MemoryStore) -> (ManualClock, NotesState<MemoryStore>) {
        let clock = ManualClock::at(datetime!(2024-05-01 12:00 UTC));
        let state = NotesState::load_with_clock(store, Box::new(clock.clone()));
        (clock, state)
    }

    fn fresh_state() -> (ManualClock, NotesState<MemoryStore>) {
        state_with(MemoryStore::new())
    }

    fn titled(state: &mut NotesState<MemoryStore>, title: &str) -> NoteId {
        let id = state.create_note().expect("create");
        state
            .update_note(NoteField::Title(title.into()))
            .expect("title");
        id
    }

    #[test]
    fn empty_store_starts_with_welcome_note() {
        let (_clock, state) = fresh_state();
        assert_eq!(state.len(), 1);
        assert_eq!(state.notes()[0].id, WELCOME_NOTE_ID);
        assert_eq!(state.notes()[0].title, WELCOME_TITLE);
        assert_eq!(state.selected_id(), Some(WELCOME_NOTE_ID));
    }

    #[test]
    fn malformed_store_falls_back_to_welcome_note() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.set(NOTES_KEY, "[{\"id\": \"broken\"")?;
        let (_clock, state) = state_with(store);
        assert_eq!(state.len(), 1);
        assert_eq!(state.notes()[0].title, WELCOME_TITLE);
        Ok(())
    }

    #[test]
    fn stored_empty_list_is_respected() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.set(NOTES_KEY, "[]")?;
        let (_clock, state) = state_with(store);
        assert!(state.is_empty());
        assert_eq!(state.selected_note(), None);
        Ok(())
    }

    #[test]
    fn create_prepends_selects_and_closes_sidebar() {
        let (clock, mut state) = fresh_state();
        state.set_sidebar_open(true);
        let before: Vec<_> = state.notes().iter().map(|n| n.id).collect();

        let id = state.create_note().expect("create");
        assert!(!before.contains(&id));
        assert_eq!(state.notes()[0].id, id);
        assert_eq!(state.selected_id(), Some(id));
        assert!(!state.sidebar_open());

        // Same clock reading, still a distinct id.
        let second = state.create_note().expect("create");
        assert_ne!(second, id);
        clock.advance(Duration::seconds(1));
        let third = state.create_note().expect("create");
        assert_eq!(state.notes()[0].id, third);
        assert_eq!(state.len(), 4);
    }

    #[test]
    fn update_title_stamps_strictly_later_time() {
        let (_clock, mut state) = fresh_state();
        state.create_note().expect("create");
        let before = state.selected_note().expect("selected").last_modified;

        assert!(state
            .update_note(NoteField::Title("X".into()))
            .expect("update"));
        let note = state.selected_note().expect("selected");
        assert_eq!(note.title, "X");
        assert!(note.last_modified > before);
    }

    #[test]
    fn update_keeps_position_in_collection() {
        let (_clock, mut state) = fresh_state();
        let first = titled(&mut state, "first");
        let _second = titled(&mut state, "second");
        state.set_selected_note(Some(first)).expect("select");
        state
            .update_note(NoteField::Title("first edited".into()))
            .expect("update");
        let titles: Vec<_> = state.notes().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first edited", WELCOME_TITLE]);
    }

    #[test]
    fn update_content_enforces_single_leading_text_block() {
        let (_clock, mut state) = fresh_state();
        state.create_note().expect("create");
        let content = vec![
            ContentBlock::Link {
                id: BlockId(1),
                url: "https://a".into(),
                text: "a".into(),
            },
            ContentBlock::Text { value: "one".into() },
            ContentBlock::Text { value: "two".into() },
        ];
        state.update_note(NoteField::Content(content)).expect("update");
        let note = state.selected_note().expect("selected");
        assert_eq!(note.body(), "one\n\ntwo");
        assert_eq!(note.content.iter().filter(|b| b.is_text()).count(), 1);
        assert!(note.content[0].is_text());
    }

    #[test]
    fn update_without_selection_is_a_no_op() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.set(NOTES_KEY, "[]")?;
        let (_clock, mut state) = state_with(store);
        assert!(!state.update_note(NoteField::Title("ghost".into()))?);
        assert!(state.is_empty());
        assert_eq!(state.store().get(NOTES_KEY)?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn deleting_selected_note_selects_next_and_clears_key() -> anyhow::Result<()> {
        let (_clock, mut state) = fresh_state();
        let older = titled(&mut state, "older");
        let newer = titled(&mut state, "newer");
        assert_eq!(state.selected_id(), Some(newer));
        assert!(state.store().get(SELECTED_NOTE_KEY)?.is_some());

        assert!(state.delete_note(newer)?);
        assert_eq!(state.selected_id(), Some(older));
        assert_eq!(state.store().get(SELECTED_NOTE_KEY)?, None);
        Ok(())
    }

    #[test]
    fn deleting_last_note_leaves_nothing_selected() -> anyhow::Result<()> {
        let (_clock, mut state) = fresh_state();
        assert!(state.delete_note(WELCOME_NOTE_ID)?);
        assert!(state.is_empty());
        assert_eq!(state.selected_note(), None);
        assert_eq!(state.store().get(NOTES_KEY)?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn deleting_unselected_note_keeps_selection() -> anyhow::Result<()> {
        let (_clock, mut state) = fresh_state();
        let kept = titled(&mut state, "kept");
        assert!(state.delete_note(WELCOME_NOTE_ID)?);
        assert_eq!(state.selected_id(), Some(kept));
        assert_eq!(
            state.store().get(SELECTED_NOTE_KEY)?,
            Some(kept.to_string())
        );
        Ok(())
    }

    #[test]
    fn deleting_unknown_id_changes_nothing() -> anyhow::Result<()> {
        let (_clock, mut state) = fresh_state();
        titled(&mut state, "only");
        let notes_before = state.notes().to_vec();
        let stored_before = state.store().get(NOTES_KEY)?;

        assert!(!state.delete_note(NoteId(-5))?);
        assert_eq!(state.notes(), notes_before.as_slice());
        assert_eq!(state.store().get(NOTES_KEY)?, stored_before);
        Ok(())
    }

    #[test]
    fn selecting_unknown_note_is_ignored() -> anyhow::Result<()> {
        let (_clock, mut state) = fresh_state();
        state.set_selected_note(Some(NoteId(999)))?;
        assert_eq!(state.selected_id(), Some(WELCOME_NOTE_ID));
        Ok(())
    }

    #[test]
    fn selection_is_persisted_and_restored() -> anyhow::Result<()> {
        let (_clock, mut state) = fresh_state();
        titled(&mut state, "newer");
        state.set_sidebar_open(true);
        state.set_selected_note(Some(WELCOME_NOTE_ID))?;
        assert!(!state.sidebar_open());

        let store = state.store().clone();
        let (_clock, reloaded) = state_with(store);
        assert_eq!(reloaded.selected_id(), Some(WELCOME_NOTE_ID));
        assert_eq!(reloaded.notes(), state.notes());
        Ok(())
    }

    #[test]
    fn search_scenario_filters_visible_notes() {
        let (_clock, mut state) = fresh_state();
        state.delete_note(WELCOME_NOTE_ID).expect("delete");
        titled(&mut state, "Shopping");
        titled(&mut state, "Work Plan");

        state.set_search_query("work");
        let visible: Vec<_> = state.visible_notes().iter().map(|n| n.title.clone()).collect();
        assert_eq!(visible, vec!["Work Plan".to_string()]);

        state.set_search_query("");
        assert_eq!(state.visible_notes().len(), 2);
    }

    #[test]
    fn quota_failure_keeps_memory_state_and_warns() {
        let (_clock, mut state) = state_with(MemoryStore::with_quota(600));
        let id = state.create_note().expect("fits in quota");
        let err = state
            .update_note(NoteField::Title("t".repeat(1_000)))
            .unwrap_err();
        assert!(err.is_quota());
        assert_eq!(state.selected_id(), Some(id));
        assert_eq!(state.selected_note().expect("selected").title.len(), 1_000);
        assert_matches!(state.persist_warning(), Some(msg) if msg.contains("quota"));

        state
            .update_note(NoteField::Title("short".into()))
            .expect("fits again");
        assert_eq!(state.persist_warning(), None);
    }

    #[test]
    fn block_ids_avoid_existing_blocks() {
        let (_clock, mut state) = fresh_state();
        state.create_note().expect("create");
        let first = state.next_block_id();
        let content = state
            .selected_note()
            .expect("selected")
            .content_with_link(first, "https://a", "");
        state.update_note(NoteField::Content(content)).expect("update");
        let second = state.next_block_id();
        assert_ne!(first, second);
    }
}
