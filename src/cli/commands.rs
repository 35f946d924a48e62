use std::fmt::Write as _;
use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::OffsetDateTime;

use crate::app::{App, NoteField, NotesState};
use crate::config::AppConfig;
use crate::format::{preview_line, relative_label};
use crate::model::{Note, NoteId};
use crate::storage::{KeyValueStore, NOTES_KEY};

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the note body inline. If omitted, reads from stdin.
    #[arg(long)]
    pub body: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search text, matched case-insensitively against titles and note text
    #[arg()]
    pub query: Vec<String>,
    /// Limit the number of results printed
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub fn run_tui<S: KeyValueStore>(config: Arc<AppConfig>, store: S) -> Result<()> {
    let notes = NotesState::load(store);
    let mut app = App::new(config, notes);
    app.run()
}

pub fn new_note<S: KeyValueStore>(store: S, args: NewArgs) -> Result<()> {
    let title = match args.title {
        Some(t) => t,
        None => prompt("Title")?,
    };
    let title = title.trim().to_owned();
    if title.is_empty() {
        bail!("note title cannot be empty");
    }
    let body = if let Some(body) = args.body {
        body
    } else {
        read_stdin()?.unwrap_or_default()
    };

    let mut notes = NotesState::load(store);
    let note_id = create(&mut notes, title, &body).context("creating note")?;
    println!("Created note #{note_id}");
    Ok(())
}

fn create<S: KeyValueStore>(notes: &mut NotesState<S>, title: String, body: &str) -> Result<NoteId> {
    let note_id = notes.create_note()?;
    notes.update_note(NoteField::Title(title))?;
    notes.replace_body(body.trim_end())?;
    Ok(note_id)
}

pub fn search_notes<S: KeyValueStore>(store: S, args: SearchArgs) -> Result<()> {
    let notes = NotesState::load(store);
    let output = run_search(&notes, &args)?;
    print!("{output}");
    Ok(())
}

fn run_search<S: KeyValueStore>(notes: &NotesState<S>, args: &SearchArgs) -> Result<String> {
    let raw_query = args.query.join(" ");
    let query = raw_query.trim();
    if query.is_empty() {
        bail!("search query cannot be empty");
    }
    let matches: Vec<&Note> = crate::search::filter_notes(notes.notes(), query)
        .into_iter()
        .take(args.limit)
        .collect();
    tracing::debug!(query, found = matches.len(), "cli search");
    Ok(format_search_results(&matches, notes.now()))
}

fn format_search_results(notes: &[&Note], now: OffsetDateTime) -> String {
    if notes.is_empty() {
        return "No matches found.\n".to_string();
    }
    let mut out = String::new();
    for note in notes {
        let _ = writeln!(&mut out, "#{}  {}", note.id, note.title);
        let _ = writeln!(
            &mut out,
            "    updated {}",
            relative_label(note.last_modified, now)
        );
        let preview = preview_line(note.body(), 160);
        if !preview.is_empty() {
            let _ = writeln!(&mut out, "    {preview}");
        }
        let attachments = note.attachments().count();
        if attachments > 0 {
            let _ = writeln!(
                &mut out,
                "    {} attachment{}",
                attachments,
                if attachments == 1 { "" } else { "s" }
            );
        }
        out.push('\n');
    }
    out
}

pub fn delete_note<S: KeyValueStore>(store: S, args: DeleteArgs) -> Result<()> {
    let mut notes = NotesState::load(store);
    let id = NoteId(args.id);
    let title = notes.note(id).map(|note| note.title.clone());
    if !notes.delete_note(id).context("deleting note")? {
        bail!("note #{id} not found");
    }
    println!(
        "Deleted note #{id} ({})",
        title.unwrap_or_else(|| "<untitled>".into())
    );
    Ok(())
}

pub fn export_notes<S: KeyValueStore>(store: &S, args: ExportArgs) -> Result<()> {
    println!("{}", render_export(store, args.pretty)?);
    Ok(())
}

fn render_export<S: KeyValueStore>(store: &S, pretty: bool) -> Result<String> {
    let raw = store
        .get(NOTES_KEY)
        .context("reading stored notes")?
        .unwrap_or_else(|| "[]".to_string());
    if !pretty {
        return Ok(raw);
    }
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("stored notes are not valid JSON")?;
    serde_json::to_string_pretty(&value).context("formatting notes")
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}
