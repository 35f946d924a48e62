use regex::{Regex, RegexBuilder};

/// Case-insensitive matcher for the literal search query, used to mark hits
/// in the note list. An empty query highlights nothing.
pub fn query_regex(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}
