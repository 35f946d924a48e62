use crate::model::Note;

/// Notes whose title or text content contains `query`, ignoring case.
/// Collection order is preserved and an empty query keeps every note.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| matches_lowered(note, &needle))
        .collect()
}

fn matches_lowered(note: &Note, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    note.title.to_lowercase().contains(needle) || note.search_text().to_lowercase().contains(needle)
}
