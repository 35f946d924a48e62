fn main() -> anyhow::Result<()> {
    notepad_tui::cli::run()
}
