use thiserror::Error;

use crate::model::{Note, NoteId};

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const NOTES_KEY: &str = "notes";
pub const SELECTED_NOTE_KEY: &str = "selectedNoteId";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage quota exceeded: write needs {required} bytes, limit is {quota}")]
    QuotaExceeded { quota: u64, required: u64 },
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("serialising notes: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersistError {
    pub fn is_quota(&self) -> bool {
        matches!(self, PersistError::Store(StoreError::QuotaExceeded { .. }))
    }
}

/// String-by-key storage that survives restarts.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// What was found in the store at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredState {
    /// `None` when the key is absent, empty, or unreadable.
    pub notes: Option<Vec<Note>>,
    pub selected: Option<NoteId>,
}

pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> StoredState {
    let notes = match store.get(NOTES_KEY) {
        Ok(Some(raw)) if !raw.trim().is_empty() => match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => Some(notes),
            Err(err) => {
                tracing::warn!(?err, "stored notes are malformed, using defaults");
                None
            }
        },
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(?err, "failed to read stored notes, using defaults");
            None
        }
    };

    let selected = match store.get(SELECTED_NOTE_KEY) {
        Ok(Some(raw)) => parse_note_id(&raw),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(?err, "failed to read stored selection");
            None
        }
    };

    StoredState { notes, selected }
}

pub fn save_notes<S: KeyValueStore + ?Sized>(
    store: &mut S,
    notes: &[Note],
) -> Result<(), PersistError> {
    let json = serde_json::to_string(notes)?;
    store.set(NOTES_KEY, &json)?;
    Ok(())
}

pub fn save_selected<S: KeyValueStore + ?Sized>(
    store: &mut S,
    id: NoteId,
) -> Result<(), PersistError> {
    store.set(SELECTED_NOTE_KEY, &id.to_string())?;
    Ok(())
}

pub fn clear_selected<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), PersistError> {
    store.remove(SELECTED_NOTE_KEY)?;
    Ok(())
}

fn parse_note_id(raw: &str) -> Option<NoteId> {
    raw.trim().trim_matches('"').parse::<i64>().ok().map(NoteId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentBlock, BlockId};
    use time::macros::datetime;

    fn sample_notes() -> Vec<Note> {
        vec![
            Note {
                id: NoteId(1_714_564_900_000),
                title: "Groceries".into(),
                content: vec![
                    ContentBlock::Text {
                        value: "milk, eggs".into(),
                    },
                    ContentBlock::Link {
                        id: BlockId(1_714_564_900_500),
                        url: "https://shop.example".into(),
                        text: "shop".into(),
                    },
                    ContentBlock::Image {
                        id: BlockId(1_714_564_900_900),
                        src: "data:image/png;base64,iVBORw0KGgo=".into(),
                        alt: "list.png".into(),
                        width: 250,
                    },
                ],
                last_modified: datetime!(2024-05-01 12:01:40.123456789 UTC),
            },
            Note::welcome(datetime!(2024-05-01 12:00 UTC)),
        ]
    }

    #[test]
    fn notes_round_trip_through_store() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        let notes = sample_notes();
        save_notes(&mut store, &notes)?;
        save_selected(&mut store, notes[1].id)?;

        let loaded = load_state(&store);
        assert_eq!(loaded.notes.as_deref(), Some(notes.as_slice()));
        assert_eq!(loaded.selected, Some(notes[1].id));
        Ok(())
    }

    #[test]
    fn absent_and_empty_values_load_as_missing() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        assert_eq!(load_state(&store).notes, None);
        store.set(NOTES_KEY, "")?;
        assert_eq!(load_state(&store).notes, None);
        Ok(())
    }

    #[test]
    fn malformed_notes_load_as_missing() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.set(NOTES_KEY, "{not json")?;
        store.set(SELECTED_NOTE_KEY, "abc")?;
        let loaded = load_state(&store);
        assert_eq!(loaded.notes, None);
        assert_eq!(loaded.selected, None);
        Ok(())
    }

    #[test]
    fn selection_accepts_quoted_ids() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.set(SELECTED_NOTE_KEY, "\"17\"")?;
        assert_eq!(load_state(&store).selected, Some(NoteId(17)));
        Ok(())
    }

    #[test]
    fn clear_selected_removes_key() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        save_selected(&mut store, NoteId(3))?;
        clear_selected(&mut store)?;
        assert_eq!(store.get(SELECTED_NOTE_KEY)?, None);
        Ok(())
    }

    #[test]
    fn quota_failure_reports_quota() {
        let mut store = MemoryStore::with_quota(8);
        let err = save_notes(&mut store, &sample_notes()).unwrap_err();
        assert!(err.is_quota());
    }
}
