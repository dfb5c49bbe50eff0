mod app;

use anyhow::{Context, Result};
use app::{App, Pane};
use blockdoc_config::Config;
use blockdoc_engine::{BlockRegistry, EditorOptions, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::{Duration, Instant},
};

const TICK: Duration = Duration::from_millis(100);

fn init_logging() -> Result<PathBuf> {
    let log_path = env::temp_dir().join("blockdoc-cli.log");
    let file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

    // The terminal belongs to the TUI, so logs go to a file
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(log_path)
}

fn load_registry(path: Option<&Path>) -> Result<BlockRegistry> {
    let Some(path) = path else {
        return Ok(BlockRegistry::default());
    };
    let table = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read block types from {}", path.display()))?;
    BlockRegistry::from_toml_str(&table)
        .with_context(|| format!("Invalid block types in {}", path.display()))
}

fn main() -> Result<()> {
    let log_path = init_logging()?;

    // Determine documents path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();
    log::info!("Config path: {}", config_path.display());

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (documents_path, from_config) = match (args.len(), &config) {
        (2, _) => (PathBuf::from(&args[1]), false),
        (1, Some(config)) => (config.documents_path.clone(), true),
        (1, None) => {
            eprintln!("Error: No documents path provided and no config file found");
            eprintln!("Usage: {} <documents-folder-path>", args[0]);
            eprintln!("Or create a config file at {}", config_path.display());
            process::exit(1);
        }
        _ => {
            eprintln!("Usage: {} [documents-folder-path]", args[0]);
            process::exit(1);
        }
    };

    if let Err(e) = io::validate_documents_dir(&documents_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Documents path '{}'{} is invalid: {e}",
            documents_path.display(),
            source
        );
        process::exit(1);
    }

    let options = config
        .as_ref()
        .map(|c| EditorOptions {
            history_capacity: c.history_capacity,
            style_debounce: c.style_debounce(),
        })
        .unwrap_or_default();
    let registry = load_registry(config.as_ref().and_then(|c| c.registry_path.as_deref()))?;
    let mut app = App::new(documents_path, registry, options)?;
    log::info!("blockdoc-cli starting, logging to {}", log_path.display());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::warn!("Exited with error: {err:#}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let mut last = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match app.handle_key(key.code) {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) => {
                    log::warn!("{e:#}");
                    app.status = format!("Error: {e:#}");
                }
            }
        }

        let now = Instant::now();
        app.tick(now - last);
        last = now;
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    // File list panel
    let file_items: Vec<ListItem> = app
        .files
        .iter()
        .map(|path| ListItem::new(Line::from(Span::raw(format!("📄 {path}")))))
        .collect();
    let files_list = List::new(file_items)
        .block(pane_block("Documents".to_string(), app.pane == Pane::Files))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(files_list, chunks[0], &mut app.file_list_state);

    // Block panel
    match &app.session {
        Some(session) => {
            let selected = session.selected();
            let rows = session.rows();
            let items: Vec<ListItem> = rows
                .iter()
                .map(|row| {
                    let indent = "  ".repeat(row.depth);
                    let mut spans = vec![
                        Span::raw(indent),
                        Span::styled(
                            format!("{:<10} ", row.kind.as_str()),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ];
                    if Some(&row.id) == selected {
                        let at = session.caret();
                        let before: String = row.text.chars().take(at).collect();
                        let after: String = row.text.chars().skip(at).collect();
                        spans.push(Span::raw(before));
                        spans.push(Span::styled("│", Style::default().fg(Color::Yellow)));
                        spans.push(Span::raw(after));
                    } else if row.text.is_empty() {
                        let italic = Style::default().add_modifier(Modifier::ITALIC);
                        spans.push(Span::styled("(empty)", italic));
                    } else {
                        spans.push(Span::raw(row.text.clone()));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect();

            let mut state = ListState::default();
            state.select(selected.and_then(|id| rows.iter().position(|r| &r.id == id)));

            let marker = if session.is_dirty() { " *" } else { "" };
            let title = format!("{}{marker}", session.path);
            let list = List::new(items)
                .block(pane_block(title, app.pane == Pane::Blocks))
                .highlight_style(Style::default().add_modifier(Modifier::BOLD));
            f.render_stateful_widget(list, chunks[1], &mut state);
        }
        None => {
            let hint = Paragraph::new(vec![Line::from("Select a document and press Enter")])
                .block(pane_block("Blocks".to_string(), app.pane == Pane::Blocks));
            f.render_widget(hint, chunks[1]);
        }
    }

    // Instructions
    let help_text = Line::from(vec![
        Span::raw("q: Quit | Tab: Pane | j/k: Select | h/l: Caret | o/O: Insert | d: Delete | "),
        Span::raw("J/K: Move | m: Merge | s: Split | t: Type | a: Align | u/r: Undo/Redo | w: Write"),
    ]);
    let status = Line::from(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::Cyan),
    ));
    f.render_widget(Paragraph::new(vec![help_text, status]), rows[1]);
}
