use time::macros::format_description;
use time::{Duration, OffsetDateTime};

/// "Just now", "5m ago", "3h ago", "2d ago", or a calendar date past a week.
pub fn relative_label(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let diff = now - then;
    if diff < Duration::minutes(1) {
        return "Just now".to_string();
    }
    if diff < Duration::hours(1) {
        return format!("{}m ago", diff.whole_minutes());
    }
    if diff < Duration::days(1) {
        return format!("{}h ago", diff.whole_hours());
    }
    if diff < Duration::days(7) {
        return format!("{}d ago", diff.whole_days());
    }
    calendar_date(then)
}

pub fn calendar_date(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[month padding:none]/[day padding:none]/[year]"))
        .unwrap_or_else(|_| dt.date().to_string())
}

/// First line of `text`, cut to `max_chars` with an ellipsis.
pub fn preview_line(text: &str, max_chars: usize) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
