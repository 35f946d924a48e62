use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub mod clock;
pub mod content;

pub use clock::{next_stamp, Clock, IdGenerator, SystemClock};
pub use content::{
    BlockId, ContentBlock, ImageUpload, IMAGE_DEFAULT_WIDTH, IMAGE_MAX_WIDTH, IMAGE_MIN_WIDTH,
    IMAGE_RESIZE_STEP,
};

pub const DEFAULT_TITLE: &str = "Untitled Note";
pub const WELCOME_NOTE_ID: NoteId = NoteId(1);
pub const WELCOME_TITLE: &str = "Welcome to Notes";
pub const WELCOME_BODY: &str =
    "Start typing to create your first note. All your notes are saved automatically.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: Vec<ContentBlock>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

impl Note {
    /// A fresh note with the default title and one empty text block.
    pub fn new(id: NoteId, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            content: content::normalize(Vec::new()),
            last_modified: now,
        }
    }

    pub fn welcome(now: OffsetDateTime) -> Self {
        Self {
            id: WELCOME_NOTE_ID,
            title: WELCOME_TITLE.to_string(),
            content: vec![ContentBlock::Text {
                value: WELCOME_BODY.to_string(),
            }],
            last_modified: now,
        }
    }

    pub fn body(&self) -> &str {
        content::body_text(&self.content)
    }

    pub fn search_text(&self) -> String {
        content::search_text(&self.content)
    }

    /// Links and images in display order.
    pub fn attachments(&self) -> impl Iterator<Item = &ContentBlock> {
        self.content.iter().filter(|block| !block.is_text())
    }

    pub fn has_block(&self, id: BlockId) -> bool {
        self.content.iter().any(|block| block.id() == Some(id))
    }

    pub fn content_with_body(&self, body: &str) -> Vec<ContentBlock> {
        content::with_body(&self.content, body)
    }

    pub fn content_with_link(&self, id: BlockId, url: &str, text: &str) -> Vec<ContentBlock> {
        content::with_link(&self.content, id, url, text)
    }

    pub fn content_with_image(&self, id: BlockId, upload: ImageUpload) -> Vec<ContentBlock> {
        content::with_image(&self.content, id, upload)
    }

    pub fn content_without_block(&self, id: BlockId) -> Vec<ContentBlock> {
        content::without_block(&self.content, id)
    }

    pub fn content_with_image_resized(&self, id: BlockId, delta: i32) -> Vec<ContentBlock> {
        content::with_image_resized(&self.content, id, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn new_note_has_single_empty_body() {
        let note = Note::new(NoteId(7), datetime!(2024-05-01 12:00 UTC));
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(
            note.content,
            vec![ContentBlock::Text {
                value: String::new()
            }]
        );
    }

    #[test]
    fn parses_records_written_by_the_browser_app() -> anyhow::Result<()> {
        let raw = r#"{
            "id": 1714564800123,
            "title": "Trip",
            "content": [
                {"type": "text", "value": "Pack bags"},
                {"type": "link", "url": "https://maps.example", "text": "Map", "id": 1714564801000},
                {"type": "image", "src": "data:image/png;base64,AAAA", "alt": "a.png", "width": 450, "id": 1714564802000}
            ],
            "lastModified": "2024-05-01T12:00:00.000Z"
        }"#;
        let note: Note = serde_json::from_str(raw)?;
        assert_eq!(note.id, NoteId(1_714_564_800_123));
        assert_eq!(note.body(), "Pack bags");
        assert_eq!(note.attachments().count(), 2);
        assert_eq!(note.last_modified, datetime!(2024-05-01 12:00 UTC));
        Ok(())
    }

    #[test]
    fn serializes_camel_case_timestamp() -> anyhow::Result<()> {
        let note = Note::welcome(datetime!(2024-05-01 12:00 UTC));
        let json = serde_json::to_value(&note)?;
        assert_eq!(json["lastModified"], "2024-05-01T12:00:00Z");
        assert_eq!(json["content"][0]["type"], "text");
        Ok(())
    }
}
