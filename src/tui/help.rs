use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Ctrl-C", 6, "Quit"),
        key_line("tab", 9, "Switch tabs"),
        Line::from(""),
        Line::from("Analyze tab:"),
        key_line("Enter", 7, "Analyze text"),
        key_line("Ctrl-U", 6, "Clear input"),
        key_line("Ctrl-R", 6, "Check API connection now"),
        key_line("Esc", 9, "Quit"),
        Line::from(""),
        Line::from("History tab:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
            Span::raw(" or "),
            Span::styled("j/k", Style::default().fg(Color::Magenta)),
            Span::raw("  Navigate"),
        ]),
        key_line("Enter", 7, "Reuse selected text"),
        key_line("e", 11, "Export history as JSON"),
        key_line("c", 11, "Clear history (asks to confirm)"),
        key_line("r", 11, "Check API connection now"),
        key_line("?", 11, "Show this help"),
        key_line("q", 11, "Quit"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
