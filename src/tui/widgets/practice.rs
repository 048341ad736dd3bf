use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::models::Card;
use crate::study::{PracticeState, PracticeStatus};

pub fn draw(f: &mut Frame, state: &PracticeState, area: Rect) {
    match state.status() {
        PracticeStatus::Loading => {
            let block = Block::default().borders(Borders::ALL).title(" Practice ");
            f.render_widget(Paragraph::new("Loading deck...").block(block), area);
            return;
        }
        PracticeStatus::Empty => {
            let block = Block::default().borders(Borders::ALL).title(" Practice ");
            let text = vec![
                Line::from("No cards match the current filters."),
                Line::from(""),
                Line::from(Span::styled(
                    "Press c to clear filters.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            f.render_widget(Paragraph::new(text).block(block), area);
            draw_filters(f, state, filter_area(area));
            return;
        }
        PracticeStatus::Ready => {}
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Filters
            Constraint::Percentage(50), // Question
            Constraint::Min(0),         // Answer
        ])
        .split(area);

    draw_filters(f, state, chunks[0]);
    if let Some(card) = state.current_card() {
        draw_question(f, state, card, chunks[1]);
        draw_answer(f, state, card, chunks[2]);
    }
}

// Bottom strip of an empty-state panel, so the active filters stay visible.
fn filter_area(area: Rect) -> Rect {
    let height = 3.min(area.height);
    Rect {
        y: area.y + area.height - height,
        height,
        ..area
    }
}

fn draw_filters(f: &mut Frame, state: &PracticeState, area: Rect) {
    let difficulty = state.difficulty_filter().map_or("All", |d| d.label());
    let order = if state.random_order() { "Random" } else { "Deck" };

    let line = Line::from(vec![
        Span::styled("Tag: ", Style::default().fg(Color::Gray)),
        Span::styled(state.tag_filter().label(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled("Level: ", Style::default().fg(Color::Gray)),
        Span::styled(difficulty, Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled("Order: ", Style::default().fg(Color::Gray)),
        Span::styled(order, Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(
            format!("{} tags", state.available_tags().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_question(f: &mut Frame, state: &PracticeState, card: &Card, area: Rect) {
    let mut meta = Vec::new();
    if let Some(tag) = card.tag_label() {
        meta.push(Span::styled(
            format!("#{} ", tag),
            Style::default().fg(Color::Cyan),
        ));
    }
    if let Some(d) = card.difficulty {
        meta.push(Span::styled(d.label(), Style::default().fg(difficulty_color(d.as_i64()))));
    }

    let text = vec![
        Line::from(meta),
        Line::from(""),
        Line::from(Span::styled(
            card.question.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            " {}Card {}/{}{} ",
            if state.is_at_start() { "" } else { "< " },
            state.index() + 1,
            state.len(),
            if state.is_at_end() { "" } else { " >" }
        ))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_answer(f: &mut Frame, state: &PracticeState, card: &Card, area: Rect) {
    let mut text = vec![if state.show_answer() {
        Line::from(Span::styled(
            card.answer.as_str(),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            "Press space to reveal",
            Style::default().fg(Color::DarkGray),
        ))
    }];
    if state.show_answer() && state.is_at_end() {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "Last card. Press g to start over.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default().borders(Borders::ALL).title(" Answer ");
    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn difficulty_color(level: i64) -> Color {
    match level {
        1 => Color::Green,
        2 => Color::Yellow,
        _ => Color::Red,
    }
}
