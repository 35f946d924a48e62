use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use time::{macros::format_description, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use regex::Regex;

use crate::app::editor::EditorState;
use crate::app::session::{FocusPane, LinkField, OverlayState, UiState};
use crate::app::state::NotesState;
use crate::config::Palette;
use crate::format::{preview_line, relative_label};
use crate::highlight::query_regex;
use crate::model::{ContentBlock, Note, DEFAULT_TITLE, IMAGE_MAX_WIDTH};
use crate::storage::KeyValueStore;

/// Below this width the sidebar and the detail pane share the screen.
pub const NARROW_WIDTH: u16 = 80;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub palette: Palette,
    pub preview_chars: usize,
}

pub fn draw_app<S: KeyValueStore>(
    frame: &mut Frame,
    notes: &NotesState<S>,
    ui: &UiState,
    options: &RenderOptions,
    list_state: &mut ListState,
) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(frame.size());

    let main = vertical[0];
    let (sidebar_area, detail_area) = if main.width >= NARROW_WIDTH {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(main);
        (Some(columns[0]), Some(columns[1]))
    } else if notes.sidebar_open() {
        (Some(main), None)
    } else {
        (None, Some(main))
    };

    if let Some(area) = sidebar_area {
        draw_sidebar(frame, area, notes, ui, options, list_state);
    }
    if let Some(area) = detail_area {
        draw_detail(frame, area, notes, ui, options);
    }

    let status = build_status_line(notes, ui, &options.palette);
    frame.render_widget(Paragraph::new(status), vertical[1]);

    render_overlay(frame, ui, &options.palette);
}

fn draw_sidebar<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    notes: &NotesState<S>,
    ui: &UiState,
    options: &RenderOptions,
    list_state: &mut ListState,
) {
    let palette = &options.palette;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let query = notes.search_query();
    let search_line = if ui.search_active {
        let mut display = query.to_string();
        display.push('▌');
        Line::from(Span::styled(display, Style::default().fg(palette.text)))
    } else if query.is_empty() {
        Line::from(Span::styled(
            "Search notes...",
            Style::default().fg(palette.muted),
        ))
    } else {
        Line::from(Span::styled(
            query.to_string(),
            Style::default().fg(palette.text),
        ))
    };
    let search_border = if ui.search_active {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };
    let search = Paragraph::new(search_line).block(
        Block::default()
            .title("Search (/)")
            .borders(Borders::ALL)
            .border_style(search_border),
    );
    frame.render_widget(search, rows[0]);

    let highlight_regex = query_regex(query);
    let highlight_style = Style::default()
        .fg(palette.match_highlight)
        .add_modifier(Modifier::BOLD);
    let now = notes.now();
    let selected_id = notes.selected_id();

    let visible = notes.visible_notes();
    let mut items = Vec::with_capacity(visible.len());
    for note in &visible {
        let is_selected = selected_id == Some(note.id);
        let title_style = if is_selected {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let mut title_spans = Vec::new();
        if is_selected {
            title_spans.push(Span::styled("● ", Style::default().fg(palette.accent)));
        }
        let title = if note.title.trim().is_empty() {
            DEFAULT_TITLE
        } else {
            note.title.as_str()
        };
        title_spans.extend(highlight_line(
            title,
            highlight_regex.as_ref(),
            highlight_style,
            title_style,
        ));
        let meta_line = Line::from(Span::styled(
            relative_label(note.last_modified, now),
            Style::default().fg(palette.muted),
        ));
        let preview = preview_line(&note.search_text(), options.preview_chars);
        let preview_row = if preview.is_empty() {
            Line::from(Span::styled(
                "No content",
                Style::default()
                    .fg(palette.muted)
                    .add_modifier(Modifier::ITALIC),
            ))
        } else {
            Line::from(highlight_line(
                &preview,
                highlight_regex.as_ref(),
                highlight_style,
                Style::default().fg(palette.text),
            ))
        };
        items.push(ListItem::new(vec![
            Line::from(title_spans),
            meta_line,
            preview_row,
        ]));
    }
    let empty = items.is_empty();
    if empty {
        let message = if query.is_empty() {
            "No notes yet. Press `n` to create one."
        } else {
            "No notes found"
        };
        items.push(ListItem::new(Span::styled(
            message,
            Style::default().fg(palette.muted),
        )));
    }

    let list_border = if ui.focus == FocusPane::List {
        Style::default().fg(palette.accent)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Notes ({})", visible.len()))
                .borders(Borders::ALL)
                .border_style(list_border),
        )
        .highlight_style(
            Style::default()
                .bg(palette.selection_bg)
                .fg(palette.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    list_state.select(if empty { None } else { Some(ui.list_cursor) });
    frame.render_stateful_widget(list, rows[1], list_state);

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("n", Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
        Span::styled("  New Note", Style::default().fg(palette.muted)),
    ]));
    frame.render_widget(hint, rows[2]);
}

fn draw_detail<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    notes: &NotesState<S>,
    ui: &UiState,
    options: &RenderOptions,
) {
    let palette = &options.palette;
    frame.render_widget(Clear, area);
    let Some(note) = notes.selected_note() else {
        draw_empty_detail(frame, area, palette);
        return;
    };

    let attachments = note.attachments().count();
    let blocks_height = (attachments.clamp(1, 8) as u16) + 2;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(blocks_height),
            Constraint::Length(1),
        ])
        .split(area);

    let focused = |pane: FocusPane| {
        if ui.focus == pane {
            Style::default().fg(palette.accent)
        } else {
            Style::default()
        }
    };

    let title = Paragraph::new(Line::from(Span::styled(
        note.title.clone(),
        Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .title("Title")
            .borders(Borders::ALL)
            .border_style(focused(FocusPane::Title)),
    );
    frame.render_widget(title, rows[0]);
    if ui.focus == FocusPane::Title && ui.overlay().is_none() {
        let width = UnicodeWidthStr::width(note.title.as_str()) as u16;
        let max_x = rows[0].x + rows[0].width.saturating_sub(2);
        frame.set_cursor((rows[0].x + 1 + width).min(max_x), rows[0].y + 1);
    }

    let editor = ui.editor().filter(|editor| editor.note_id() == note.id);
    let body_text = editor.map(EditorState::text).unwrap_or_else(|| note.body());
    let cursor = editor.and_then(|editor| editor_cursor_position(editor, rows[1]));
    let scroll = cursor
        .map(|(_, row)| row.saturating_sub(rows[1].height.saturating_sub(3)))
        .unwrap_or(0);
    let body = Paragraph::new(Text::from(
        body_text
            .split('\n')
            .map(|line| Line::from(line.to_string()))
            .collect::<Vec<_>>(),
    ))
    .style(Style::default().fg(palette.text))
    .block(
        Block::default()
            .title("Body")
            .borders(Borders::ALL)
            .border_style(focused(FocusPane::Body)),
    )
    .wrap(Wrap { trim: false })
    .scroll((scroll, 0));
    frame.render_widget(body, rows[1]);
    if ui.focus == FocusPane::Body && ui.overlay().is_none() {
        if let Some((col, row)) = cursor {
            frame.set_cursor(rows[1].x + 1 + col, rows[1].y + 1 + row - scroll);
        }
    }

    draw_blocks(frame, rows[2], note, ui, palette, focused(FocusPane::Blocks));

    let footer = Paragraph::new(Line::from(Span::styled(
        format!(
            "Last modified {}  ({})",
            relative_label(note.last_modified, notes.now()),
            format_timestamp(note.last_modified)
        ),
        Style::default().fg(palette.muted),
    )));
    frame.render_widget(footer, rows[3]);
}

fn draw_empty_detail(frame: &mut Frame, area: Rect, palette: &Palette) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No note selected",
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Create or select a note to get started",
            Style::default().fg(palette.muted),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(ratatui::layout::Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn draw_blocks(
    frame: &mut Frame,
    area: Rect,
    note: &Note,
    ui: &UiState,
    palette: &Palette,
    border: Style,
) {
    let mut items: Vec<ListItem> = note
        .attachments()
        .map(|block| match block {
            ContentBlock::Link { url, text, .. } => ListItem::new(Line::from(vec![
                Span::styled("link  ", Style::default().fg(palette.muted)),
                Span::styled(
                    text.clone(),
                    Style::default()
                        .fg(palette.link)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(format!("  {url}"), Style::default().fg(palette.muted)),
            ])),
            ContentBlock::Image { alt, width, .. } => ListItem::new(Line::from(vec![
                Span::styled("image ", Style::default().fg(palette.muted)),
                Span::styled(alt.clone(), Style::default().fg(palette.text)),
                Span::styled(format!("  {width}px "), Style::default().fg(palette.muted)),
                Span::styled(width_gauge(*width), Style::default().fg(palette.accent)),
            ])),
            ContentBlock::Text { .. } => ListItem::new(""),
        })
        .collect();
    let empty = items.is_empty();
    if empty {
        items.push(ListItem::new(Span::styled(
            "No links or images. Ctrl-l adds a link, Ctrl-o an image.",
            Style::default().fg(palette.muted),
        )));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .title("Links & Images")
                .borders(Borders::ALL)
                .border_style(border),
        )
        .highlight_style(
            Style::default()
                .bg(palette.selection_bg)
                .fg(palette.selection_fg),
        )
        .highlight_symbol("▸ ");
    let mut state = ListState::default();
    if ui.focus == FocusPane::Blocks && !empty {
        state.select(Some(ui.block_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Ten-cell bar showing an image width relative to the maximum.
fn width_gauge(width: u32) -> String {
    let filled = ((width * 10 + IMAGE_MAX_WIDTH / 2) / IMAGE_MAX_WIDTH).min(10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn build_status_line<S: KeyValueStore>(
    notes: &NotesState<S>,
    ui: &UiState,
    palette: &Palette,
) -> Text<'static> {
    let total = notes.len();
    let position = notes
        .selected_id()
        .and_then(|id| notes.notes().iter().position(|note| note.id == id))
        .map(|idx| format!("{}/{}", idx + 1, total))
        .unwrap_or_else(|| format!("-/{total}"));
    let focus = match ui.focus {
        FocusPane::List => "List",
        FocusPane::Title => "Title",
        FocusPane::Body => "Body",
        FocusPane::Blocks => "Links & Images",
    };

    let mut spans = vec![
        Span::raw("Note "),
        Span::styled(position, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" | Focus: "),
        Span::styled(focus, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if !notes.search_query().is_empty() {
        spans.push(Span::raw(" | Search: "));
        spans.push(Span::styled(
            format!("\"{}\"", notes.search_query()),
            Style::default().fg(palette.match_highlight),
        ));
    }
    if ui.pending_images > 0 {
        spans.push(Span::styled(
            " | Loading image…",
            Style::default().fg(palette.muted),
        ));
    }
    if let Some(warning) = notes.persist_warning() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            warning.to_string(),
            Style::default()
                .fg(palette.warning)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(message) = &ui.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(message.clone(), Style::default().fg(palette.text)));
    }

    let hints = match (ui.search_active, ui.focus) {
        (true, _) => "Type to filter • Enter keep • Esc clear",
        (false, FocusPane::List) => {
            "j/k move • Enter open • n new • d delete • / search • s sidebar • Tab focus • ? help • q quit"
        }
        (false, FocusPane::Title) => "Type to rename • Enter body • Tab focus • Esc list",
        (false, FocusPane::Body) => {
            "Ctrl-z undo • Ctrl-y redo • Ctrl-l link • Ctrl-o image • Tab focus • Esc list"
        }
        (false, FocusPane::Blocks) => {
            "j/k move • +/- resize • x remove • l link • i image • Tab focus • Esc list"
        }
    };

    Text::from(vec![
        Line::from(spans),
        Line::from(Span::styled(hints, Style::default().fg(palette.muted))),
    ])
}

fn format_timestamp(dt: OffsetDateTime) -> String {
    dt.format(&format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    ))
    .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    if let Some(re) = regex {
        let mut spans = Vec::new();
        let mut last = 0;
        for mat in re.find_iter(text) {
            if mat.start() > last {
                spans.push(Span::styled(
                    text[last..mat.start()].to_string(),
                    base_style,
                ));
            }
            spans.push(Span::styled(mat.as_str().to_string(), highlight_style));
            last = mat.end();
        }
        if last < text.len() {
            spans.push(Span::styled(text[last..].to_string(), base_style));
        }
        if spans.is_empty() {
            spans.push(Span::styled(text.to_string(), base_style));
        }
        spans
    } else {
        vec![Span::styled(text.to_string(), base_style)]
    }
}

/// Cursor cell inside the body block, relative to its inner area.
fn editor_cursor_position(editor: &EditorState, area: Rect) -> Option<(u16, u16)> {
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return None;
    }

    let mut row = 0u16;
    let mut col = 0usize;
    let width_limit = inner_width as usize;
    let buffer = editor.text();
    let cursor = editor.cursor().min(buffer.len());

    for grapheme in buffer[..cursor].graphemes(true) {
        if grapheme == "\n" {
            row += 1;
            col = 0;
            continue;
        }
        let glyph_width = UnicodeWidthStr::width(grapheme);
        if glyph_width > 0 && col + glyph_width > width_limit {
            row += 1;
            col = 0;
        }
        col += glyph_width;
    }

    let limit = width_limit.max(1);
    Some((col.min(limit - 1) as u16, row))
}

fn render_overlay(frame: &mut Frame, ui: &UiState, palette: &Palette) {
    let muted = Style::default().fg(palette.muted);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match ui.overlay() {
        Some(OverlayState::Link(prompt)) => {
            let area = centered_rect(60, 40, frame.size());
            frame.render_widget(Clear, area);
            let field = |label: &'static str, value: &str, active: bool| {
                let mut display = value.to_string();
                if active {
                    display.push('▌');
                }
                let label_style = if active {
                    Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
                } else {
                    muted
                };
                vec![Line::from(Span::styled(label, label_style)), Line::from(display)]
            };
            let mut lines = vec![Line::from(Span::styled("Insert Link", bold)), Line::from("")];
            lines.extend(field("URL", &prompt.url, prompt.field == LinkField::Url));
            lines.push(Line::from(""));
            lines.extend(field(
                "Text (optional)",
                &prompt.text,
                prompt.field == LinkField::Text,
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Tab switch field • Enter insert • Esc cancel",
                muted,
            )));
            let paragraph = Paragraph::new(lines)
                .block(
                    Block::default()
                        .title("Link")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(palette.accent)),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        Some(OverlayState::Image(prompt)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let mut display = prompt.path.clone();
            display.push('▌');
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled("Insert Image", bold)),
                Line::from(Span::styled("Path to an image file:", muted)),
                Line::from(""),
                Line::from(display),
                Line::from(""),
                Line::from(Span::styled("Enter load • Esc cancel", muted)),
            ])
            .block(
                Block::default()
                    .title("Image")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        Some(OverlayState::Delete(prompt)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled("Delete Note", bold)),
                Line::from(""),
                Line::from(format!("Delete '{}'? This cannot be undone.", prompt.title)),
                Line::from(""),
                Line::from(Span::styled("Enter or y confirm • Esc cancel", muted)),
            ])
            .block(
                Block::default()
                    .title(format!("Confirm Delete (#{})", prompt.note_id))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.warning)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        Some(OverlayState::Help) => {
            let area = centered_rect(70, 70, frame.size());
            frame.render_widget(Clear, area);
            let entries = [
                ("Anywhere", "Tab / Shift-Tab cycle focus, Ctrl-n new note, Ctrl-c quit"),
                ("List", "j/k move, Enter open, n new, d delete, / search, s sidebar, q quit"),
                ("Title", "type to rename, Enter jumps to the body"),
                ("Body", "type to edit, Ctrl-z/Ctrl-y undo/redo, Ctrl-←/→ words"),
                ("Body", "Ctrl-l insert link, Ctrl-o insert image"),
                ("Links & Images", "j/k move, +/- resize image, x remove, l link, i image"),
            ];
            let mut lines = vec![Line::from(Span::styled("Keys", bold)), Line::from("")];
            for (pane, keys) in entries {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{pane:<16}"),
                        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(keys),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Esc or ? to close", muted)));
            let paragraph = Paragraph::new(lines)
                .block(
                    Block::default()
                        .title("Help")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(palette.accent)),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeName;
    use crate::model::clock::testing::ManualClock;
    use crate::model::WELCOME_NOTE_ID;
    use crate::storage::{MemoryStore, NOTES_KEY};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use time::macros::datetime;

    fn span_texts(spans: &[Span<'static>]) -> Vec<String> {
        spans
            .iter()
            .map(|span| span.content.clone().into_owned())
            .collect()
    }

    fn options() -> RenderOptions {
        RenderOptions {
            palette: ThemeName::Dark.palette(),
            preview_chars: 80,
        }
    }

    fn render<S: KeyValueStore>(
        notes: &NotesState<S>,
        ui: &UiState,
        width: u16,
        height: u16,
    ) -> anyhow::Result<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height))?;
        let mut list_state = ListState::default();
        terminal.draw(|frame| draw_app(frame, notes, ui, &options(), &mut list_state))?;
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn welcome_state() -> NotesState<MemoryStore> {
        let clock = ManualClock::at(datetime!(2024-05-01 12:00 UTC));
        NotesState::load_with_clock(MemoryStore::new(), Box::new(clock))
    }

    #[test]
    fn highlight_marks_every_occurrence() {
        let regex = query_regex("note").expect("regex");
        let spans = highlight_line("Notebook notes", Some(&regex), Style::default(), Style::default());
        assert_eq!(span_texts(&spans), vec!["Note", "book ", "note", "s"]);
    }

    #[test]
    fn highlight_keeps_unmatched_text_whole() {
        let regex = query_regex("plan").expect("regex");
        let spans = highlight_line("Work Plan v2", Some(&regex), Style::default(), Style::default());
        assert_eq!(span_texts(&spans), vec!["Work ", "Plan", " v2"]);
        let spans = highlight_line("groceries", None, Style::default(), Style::default());
        assert_eq!(span_texts(&spans), vec!["groceries"]);
    }

    #[test]
    fn width_gauge_scales_to_max_width() {
        assert_eq!(width_gauge(800), "██████████");
        assert_eq!(width_gauge(400), "█████░░░░░");
        assert_eq!(width_gauge(100), "█░░░░░░░░░");
    }

    #[test]
    fn renders_welcome_note_in_wide_layout() -> anyhow::Result<()> {
        let notes = welcome_state();
        let mut ui = UiState::default();
        ui.sync_editor(notes.selected_note());
        let screen = render(&notes, &ui, 100, 30)?;
        assert!(screen.contains("Welcome to Notes"));
        assert!(screen.contains("Just now"));
        assert!(screen.contains("Start typing"));
        assert!(screen.contains("Last modified Just now  (2024-05-01 12:00:00 UTC)"));
        Ok(())
    }

    #[test]
    fn renders_placeholder_without_selection() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.set(NOTES_KEY, "[]")?;
        let notes = NotesState::load(store);
        let screen = render(&notes, &UiState::default(), 100, 24)?;
        assert!(screen.contains("No note selected"));
        assert!(screen.contains("No notes yet"));
        Ok(())
    }

    #[test]
    fn blank_notes_show_fallback_title_and_preview() -> anyhow::Result<()> {
        let mut notes = welcome_state();
        notes.create_note()?;
        notes.update_note(crate::app::state::NoteField::Title(String::new()))?;
        let screen = render(&notes, &UiState::default(), 100, 30)?;
        assert!(screen.contains("Untitled Note"));
        assert!(screen.contains("No content"));
        Ok(())
    }

    #[test]
    fn filtered_out_list_says_no_notes_found() -> anyhow::Result<()> {
        let mut notes = welcome_state();
        notes.set_search_query("zebra");
        let screen = render(&notes, &UiState::default(), 100, 24)?;
        assert!(screen.contains("No notes found"));
        Ok(())
    }

    #[test]
    fn narrow_terminal_shows_one_pane_at_a_time() -> anyhow::Result<()> {
        let mut notes = welcome_state();
        let ui = UiState::default();

        let detail = render(&notes, &ui, 60, 24)?;
        assert!(detail.contains("Body"));
        assert!(!detail.contains("Search (/)"));

        notes.set_sidebar_open(true);
        let sidebar = render(&notes, &ui, 60, 24)?;
        assert!(sidebar.contains("Search (/)"));
        assert!(!sidebar.contains("Last modified"));
        assert_eq!(notes.selected_id(), Some(WELCOME_NOTE_ID));
        Ok(())
    }
}
