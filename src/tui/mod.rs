mod help;
mod state;

use crate::metrics;
use crate::model::{Sentiment, Settings, UiEvent};
use crate::orchestrator::{self, ChannelView, Confirmation, UiCommand};
use crate::storage::EXPORT_FILE_NAME;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use time::UtcOffset;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(settings: Settings, offset: UtcOffset) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let workflow = crate::cli::build_workflow(&settings, offset, Box::new(ChannelView::new(event_tx)))?;

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let error_dismiss = settings.error_dismiss;
    let ui_handle = std::thread::spawn(move || run_threaded(error_dismiss, event_rx, cmd_tx));

    let res = orchestrator::run_controller(
        workflow,
        settings.probe_interval,
        settings.seed_examples,
        cmd_rx,
    )
    .await;

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

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    error_dismiss: Duration,
    mut event_rx: UnboundedReceiver<UiEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState {
        error_dismiss,
        ..Default::default()
    };

    // Short tick keeps the gauge animation smooth.
    let tick_rate = Duration::from_millis(33);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev, Instant::now());
        }

        let now = Instant::now();
        state.expire_error(now);
        if now.duration_since(last_tick) >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state, now)).ok();
            last_tick = now;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, k, &cmd_tx) == KeyOutcome::Quit {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> KeyOutcome {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    if state.confirm_clear {
        let answer = match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Confirmation::Granted,
            _ => Confirmation::Declined,
        };
        state.confirm_clear = false;
        state.info = match answer {
            Confirmation::Granted => "History cleared".into(),
            Confirmation::Declined => "Clear cancelled".into(),
        };
        let _ = cmd_tx.send(UiCommand::ClearHistory(answer));
        return KeyOutcome::Continue;
    }

    if k.code == KeyCode::Tab {
        state.tab = (state.tab + 1) % 3;
        return KeyOutcome::Continue;
    }

    match state.tab {
        0 => match (k.modifiers, k.code) {
            (_, KeyCode::Esc) => return KeyOutcome::Quit,
            (_, KeyCode::Enter) => {
                let _ = cmd_tx.send(UiCommand::Analyze(state.input.clone()));
            }
            (m, KeyCode::Char('u')) if m.contains(KeyModifiers::CONTROL) => state.input.clear(),
            (m, KeyCode::Char('r')) if m.contains(KeyModifiers::CONTROL) => {
                state.info = "Checking API connection…".into();
                let _ = cmd_tx.send(UiCommand::CheckConnection);
            }
            (m, KeyCode::Char(c))
                if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                state.input.push(c);
            }
            (_, KeyCode::Backspace) => {
                state.input.pop();
            }
            _ => {}
        },
        1 => match k.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => state.select_next(),
            KeyCode::Enter => {
                if state.reuse_selected() {
                    state.tab = 0;
                }
            }
            KeyCode::Char('e') => match std::env::current_dir() {
                Ok(dir) => {
                    let _ = cmd_tx.send(UiCommand::ExportHistory(dir.join(EXPORT_FILE_NAME)));
                }
                Err(e) => state.info = format!("Export failed: {e}"),
            },
            KeyCode::Char('c') => {
                if state.history.is_empty() {
                    state.info = "History is already empty".into();
                } else {
                    state.confirm_clear = true;
                    state.info = "Clear history? (y/n)".into();
                }
            }
            KeyCode::Char('r') => {
                state.info = "Checking API connection…".into();
                let _ = cmd_tx.send(UiCommand::CheckConnection);
            }
            KeyCode::Char('?') => state.tab = 2,
            _ => {}
        },
        _ => {
            if matches!(k.code, KeyCode::Esc | KeyCode::Char('q')) {
                return KeyOutcome::Quit;
            }
        }
    }
    KeyOutcome::Continue
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Analyze"),
        Line::from("History"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("sentiment-cli"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_analyze(chunks[1], f, state, now),
        1 => draw_history(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn sentiment_color(s: Sentiment) -> Color {
    match s {
        Sentiment::Positive => Color::Green,
        Sentiment::Negative => Color::Red,
    }
}

fn status_line(state: &UiState) -> Line<'static> {
    let color = if state.connectivity.connected {
        Color::Green
    } else {
        Color::Red
    };
    let mut spans = vec![
        Span::styled("● ", Style::default().fg(color)),
        Span::styled(state.connectivity.message.clone(), Style::default().fg(color)),
    ];
    if state.submitting {
        spans.push(Span::styled(
            "   Analyzing…",
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

fn draw_analyze(area: Rect, f: &mut ratatui::Frame, state: &UiState, now: Instant) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let status = Paragraph::new(status_line(state))
        .block(Block::default().borders(Borders::ALL).title("API"));
    f.render_widget(status, rows[0]);

    let count_style = if state.input_too_short() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    let input = Paragraph::new(state.input.as_str())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Text (Enter to analyze)")
                .title_bottom(Line::styled(
                    format!(" {} characters ", state.char_count()),
                    count_style,
                )),
        );
    f.render_widget(input, rows[1]);

    match (state.result, state.progress) {
        (Some(c), Some(anim)) => {
            let color = sentiment_color(c.sentiment);
            let gauge = Gauge::default()
                .block(
                    Block::default().borders(Borders::ALL).title(Span::styled(
                        format!("Result: {}", c.sentiment.as_str().to_uppercase()),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    )),
                )
                .gauge_style(Style::default().fg(color))
                .ratio(anim.value_at(now).clamp(0.0, 1.0))
                .label(format!("Confidence {}%", anim.percent_at(now)));
            f.render_widget(gauge, rows[2]);
        }
        _ => {
            let placeholder = Paragraph::new("No result yet")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Result"));
            f.render_widget(placeholder, rows[2]);
        }
    }

    let message = match state.visible_error(now) {
        Some(err) => Line::styled(format!("Error: {err}"), Style::default().fg(Color::Red)),
        None => Line::styled(state.info.clone(), Style::default().fg(Color::Gray)),
    };
    f.render_widget(
        Paragraph::new(message).block(Block::default().borders(Borders::ALL)),
        rows[3],
    );

    f.render_widget(history_list(state, false), rows[4]);
}

fn history_list(state: &UiState, with_selection: bool) -> List<'static> {
    let items: Vec<ListItem> = state
        .history
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let color = sentiment_color(e.sentiment());
            let line = Line::from(vec![
                Span::styled(format!("{} ", e.timestamp()), Style::default().fg(Color::Gray)),
                Span::raw(format!("- {}  ", e.display_text())),
                Span::styled(
                    format!(
                        "{} ({}%)",
                        e.sentiment(),
                        metrics::confidence_percent(e.probability())
                    ),
                    Style::default().fg(color),
                ),
            ]);
            let mut item = ListItem::new(line);
            if with_selection && i == state.history_selected {
                item = item.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            item
        })
        .collect();
    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Recent analyses ({})", state.history.len())),
    )
}

fn draw_history(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    if state.history.is_empty() {
        let empty = Paragraph::new("No analyses yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("History"));
        f.render_widget(empty, rows[0]);
    } else {
        f.render_widget(history_list(state, true), rows[0]);
    }

    let stats = metrics::compute_history_stats(&state.history);
    let mut footer = vec![Span::raw(format!(
        "{} positive / {} negative",
        stats.positive, stats.negative
    ))];
    if let Some(mean) = stats.mean_probability {
        footer.push(Span::raw(format!(
            "  avg confidence {}%",
            metrics::confidence_percent(mean)
        )));
    }
    if !state.info.is_empty() {
        let style = if state.confirm_clear {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        footer.push(Span::raw("   "));
        footer.push(Span::styled(state.info.clone(), style));
    }
    f.render_widget(
        Paragraph::new(Line::from(footer)).block(Block::default().borders(Borders::ALL)),
        rows[1],
    );
}
