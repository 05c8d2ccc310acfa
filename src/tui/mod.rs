mod help;
mod state;

use crate::cli::{build_config, build_connector, panel_props, Cli};
use crate::model::{NoticeKind, PanelEvent, SubmissionState};
use crate::orchestrator::{self, InputEdit, Panel, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const PANEL_WIDTH: u16 = 64;

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    tracing::debug!(
        config = %serde_json::to_string(&cfg).unwrap_or_default(),
        "starting tui"
    );
    let connector = build_connector(&args, &cfg);

    // Unbounded channels keep the UI thread from ever blocking on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<PanelEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let panel = Panel::new(panel_props(&cfg), true, event_tx);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let api_url = cfg.api_url.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(api_url, event_rx, cmd_tx));

    let res = orchestrator::run_controller(panel, connector, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// What a key press means for the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyAction {
    Command(UiCommand),
    ToggleHelp,
    Quit,
    Ignore,
}

fn map_key(panel_open: bool, k: KeyEvent) -> KeyAction {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('s') if ctrl && panel_open => KeyAction::Command(UiCommand::Submit),
        KeyCode::Char('u') if ctrl && panel_open => {
            KeyAction::Command(UiCommand::Edit(InputEdit::Clear))
        }
        KeyCode::Esc if panel_open => KeyAction::Command(UiCommand::SetOpen(false)),
        KeyCode::Enter if panel_open => KeyAction::Command(UiCommand::Edit(InputEdit::Newline)),
        KeyCode::Backspace if panel_open => {
            KeyAction::Command(UiCommand::Edit(InputEdit::Backspace))
        }
        KeyCode::Tab if panel_open => KeyAction::Command(UiCommand::Edit(InputEdit::Insert('\t'))),
        KeyCode::Char(c) if panel_open && !ctrl => {
            KeyAction::Command(UiCommand::Edit(InputEdit::Insert(c)))
        }
        KeyCode::Char('i') if !panel_open => KeyAction::Command(UiCommand::SetOpen(true)),
        KeyCode::Char('q') if !panel_open => KeyAction::Quit,
        KeyCode::Char('?') if !panel_open => KeyAction::ToggleHelp,
        KeyCode::F(1) => KeyAction::ToggleHelp,
        _ => KeyAction::Ignore,
    }
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    api_url: Option<String>,
    mut event_rx: UnboundedReceiver<PanelEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the panel itself lives in the controller.
    let mut state = UiState {
        api_url,
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        let now = Instant::now();
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev, now);
        }
        state.expire_notices(now);

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => {
                    match map_key(state.view.open, k) {
                        KeyAction::Command(cmd) => {
                            let _ = cmd_tx.send(cmd);
                        }
                        KeyAction::ToggleHelp => state.show_help = !state.show_help,
                        KeyAction::Quit => {
                            let _ = cmd_tx.send(UiCommand::Quit);
                            break Ok(());
                        }
                        KeyAction::Ignore => {}
                    }
                }
                Ok(Event::Paste(text)) if state.view.open => {
                    let _ = cmd_tx.send(UiCommand::Edit(InputEdit::InsertStr(text)));
                }
                _ => {}
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let notice_height = if state.notices.is_empty() {
        0
    } else {
        state.notices.len() as u16 + 2
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(notice_height),
        ])
        .split(area);

    draw_header(chunks[0], f, state);

    let body = chunks[1];
    if state.view.open {
        let width = PANEL_WIDTH.min(body.width);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(width)])
            .split(body);
        draw_home(cols[0], f, state);
        draw_panel(cols[1], f, state);
    } else {
        draw_home(body, f, state);
    }

    if state.show_help {
        help::draw_help(body, f);
    }

    if notice_height > 0 {
        draw_notices(chunks[2], f, state);
    }
}

fn draw_header(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let endpoint = state.api_url.as_deref().unwrap_or("not configured");
    let p = Paragraph::new(Line::from(vec![
        Span::styled("Endpoint: ", Style::default().fg(Color::Gray)),
        Span::raw(endpoint.to_string()),
        Span::raw("   "),
        Span::styled("F1", Style::default().fg(Color::Magenta)),
        Span::raw(" help"),
    ]))
    .block(Block::default().borders(Borders::ALL).title("doc-indexer"));
    f.render_widget(p, area);
}

fn draw_home(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let status = match (&state.submission, &state.last_failure) {
        (SubmissionState::Submitting, _) => "Indexing...".to_string(),
        (_, Some(reason)) => format!("Last attempt failed: {reason}"),
        _ => "Idle".to_string(),
    };
    let mut lines = vec![
        kv_line("User ID", &state.view.user_id),
        kv_line("Retriever", &state.view.retriever_provider),
        kv_line("Status", &status),
        kv_line("Indexed this session", &state.runs_indexed.to_string()),
        Line::from(""),
    ];
    if !state.view.open {
        lines.push(Line::from(vec![
            Span::raw("Press "),
            Span::styled("i", Style::default().fg(Color::Magenta)),
            Span::raw(" to open the indexer panel, "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" to quit."),
        ]));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Knowledge base"));
    f.render_widget(p, area);
}

fn draw_panel(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let view = &state.view;
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title("Index Documents");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(inner);

    let desc = Paragraph::new("Add documents to your knowledge base for retrieval.")
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    f.render_widget(desc, rows[0]);

    // Documents
    let doc_style = if view.submitting {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let doc_block = Block::default().borders(Borders::ALL).title("Documents");
    let doc_inner = doc_block.inner(rows[1]);
    let docs = if view.documents.is_empty() {
        Paragraph::new(Span::styled(
            "Enter text to index...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut text = view.documents.clone();
        if !view.submitting {
            text.push('▏');
        }
        Paragraph::new(text)
            .style(doc_style)
            .scroll((state.documents_scroll(doc_inner.height, doc_inner.width), 0))
    };
    f.render_widget(docs.wrap(Wrap { trim: false }).block(doc_block), rows[1]);

    // Indexer config
    let cfg = Paragraph::new(vec![
        kv_line("User ID", &view.user_id),
        kv_line("Retriever", &view.retriever_provider),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(cfg, rows[2]);

    // Index button
    let button_style = if view.submitting {
        Style::default().fg(Color::Yellow)
    } else if view.can_submit {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let label = if view.submitting {
        format!("⟳ {}", view.button_label())
    } else {
        format!("{} (Ctrl-S)", view.button_label())
    };
    let button = Paragraph::new(Span::styled(label, button_style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(button, rows[3]);
}

fn draw_notices(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let lines: Vec<Line> = state
        .notices
        .iter()
        .map(|(n, _)| {
            let (mark, color) = match n.kind {
                NoticeKind::Success => ("✓", Color::Green),
                NoticeKind::Error => ("✗", Color::Red),
            };
            Line::from(vec![
                Span::styled(format!("{mark} "), Style::default().fg(color)),
                Span::styled(n.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(
                    n.description
                        .as_deref()
                        .map(|d| format!("  {d}"))
                        .unwrap_or_default(),
                ),
            ])
        })
        .collect();
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Notifications"));
    f.render_widget(p, area);
}

fn kv_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(value.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn typing_goes_to_the_panel_only_when_open() {
        assert_eq!(
            map_key(true, key(KeyCode::Char('q'))),
            KeyAction::Command(UiCommand::Edit(InputEdit::Insert('q')))
        );
        assert_eq!(map_key(false, key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(
            map_key(false, key(KeyCode::Char('i'))),
            KeyAction::Command(UiCommand::SetOpen(true))
        );
        assert_eq!(map_key(false, key(KeyCode::Char('x'))), KeyAction::Ignore);
    }

    #[test]
    fn control_keys() {
        assert_eq!(map_key(true, ctrl('s')), KeyAction::Command(UiCommand::Submit));
        assert_eq!(map_key(false, ctrl('s')), KeyAction::Ignore);
        assert_eq!(map_key(true, ctrl('c')), KeyAction::Quit);
        assert_eq!(
            map_key(true, key(KeyCode::Esc)),
            KeyAction::Command(UiCommand::SetOpen(false))
        );
        assert_eq!(
            map_key(true, key(KeyCode::Enter)),
            KeyAction::Command(UiCommand::Edit(InputEdit::Newline))
        );
    }
}
