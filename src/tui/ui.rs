use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::widgets::{practice, quick_learn};
use super::{App, Screen};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_title(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_help_bar(f, app, chunks[3]);
}

fn draw_title(f: &mut Frame, app: &App, area: Rect) {
    let (mode, deck) = match &app.screen {
        Screen::Practice(p) => (
            "Practice",
            p.state()
                .deck_name()
                .map_or_else(|| format!("Deck {}", p.deck_id()), str::to_string),
        ),
        Screen::QuickLearn(l) => (
            "Quick Learn",
            l.state().session().map_or_else(
                || format!("Deck {}", l.state().deck_id()),
                |s| s.deck_name.clone(),
            ),
        ),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            mode,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(deck, Style::default().fg(Color::White)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Flashdeck "));

    f.render_widget(title, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match &app.screen {
        Screen::Practice(p) => practice::draw(f, p.state(), area),
        Screen::QuickLearn(l) => quick_learn::draw(f, l.state(), area),
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let text = app.status.as_deref().unwrap_or("");
    let status = Paragraph::new(Span::styled(text, Style::default().fg(Color::Red)));
    f.render_widget(status, area);
}

fn key(k: &'static str) -> Span<'static> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = match &app.screen {
        Screen::Practice(_) => vec![
            key("<Space>"),
            Span::raw(" Flip  "),
            key("h/l"),
            Span::raw(" Prev/Next  "),
            key("g"),
            Span::raw(" Restart  "),
            key("o"),
            Span::raw(" Random  "),
            key("s"),
            Span::raw(" Shuffle  "),
            key("t/d"),
            Span::raw(" Tag/Level  "),
            key("c"),
            Span::raw(" Clear  "),
        ],
        Screen::QuickLearn(_) => vec![
            key("<Space>"),
            Span::raw(" Flip  "),
            key("y/n"),
            Span::raw(" Right/Wrong  "),
            key("h"),
            Span::raw(" Back  "),
            key("<CR>"),
            Span::raw(" Submit  "),
            key("r"),
            Span::raw(" New session  "),
        ],
    };

    spans.extend(vec![key("q"), Span::raw(" Quit")]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
