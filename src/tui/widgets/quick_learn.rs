use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::models::SessionResult;
use crate::study::{normalize_accuracy, QuickLearnPhase, QuickLearnState};

pub fn draw(f: &mut Frame, state: &QuickLearnState, area: Rect) {
    match state.phase() {
        QuickLearnPhase::Loading => {
            let message = if state.is_loading() {
                "Starting session...".to_string()
            } else {
                format!("No session for deck {}. Press r to start one.", state.deck_id())
            };
            let block = Block::default().borders(Borders::ALL).title(" Quick Learn ");
            f.render_widget(Paragraph::new(message).block(block), area);
        }
        QuickLearnPhase::Submitted => {
            if let Some(result) = state.result() {
                draw_result(f, result, area);
            }
        }
        _ if state.card_count() == 0 => {
            let block = Block::default().borders(Borders::ALL).title(" Quick Learn ");
            f.render_widget(
                Paragraph::new("This deck has no cards to study.").block(block),
                area,
            );
        }
        phase => draw_session(f, state, phase, area),
    }
}

fn draw_session(f: &mut Frame, state: &QuickLearnState, phase: QuickLearnPhase, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Card
        ])
        .split(area);

    let total = state.card_count();
    let answered = state.answered_count();
    let ratio = if total == 0 {
        0.0
    } else {
        answered as f64 / total as f64
    };
    let label = match phase {
        _ if state.is_submitting() => "Submitting...".to_string(),
        QuickLearnPhase::Complete => {
            format!("{}/{} answered, press Enter to submit", answered, total)
        }
        _ => format!("{}/{} answered", answered, total),
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    f.render_widget(gauge, chunks[0]);

    let Some(card) = state.current_card() else {
        return;
    };

    let mut text = vec![
        Line::from(Span::styled(
            card.question.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if state.show_answer() {
        text.push(Line::from(Span::styled(
            card.answer.as_str(),
            Style::default().fg(Color::Green),
        )));
    } else {
        text.push(Line::from(Span::styled(
            "Press space to reveal",
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(correct) = state.answer_for(card.card_id) {
        text.push(Line::from(""));
        text.push(if correct {
            Line::from(Span::styled("Marked correct", Style::default().fg(Color::Green)))
        } else {
            Line::from(Span::styled("Marked incorrect", Style::default().fg(Color::Red)))
        });
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Card {}/{} ", state.index() + 1, total))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn draw_result(f: &mut Frame, result: &SessionResult, area: Rect) {
    let session = &result.session_stats;
    let deck = &result.deck_stats;
    let session_accuracy = normalize_accuracy(session.accuracy);
    let overall_accuracy = normalize_accuracy(deck.overall_accuracy);

    let text = vec![
        Line::from(Span::styled(
            "This session",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Correct: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{}", session.correct_count, session.total_cards),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Accuracy: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.0}%", session_accuracy),
                Style::default().fg(accuracy_color(session_accuracy)),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "All time",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Studied: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{} cards", deck.cards_studied, deck.total_cards_in_deck),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Accuracy: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.0}%", overall_accuracy),
                Style::default().fg(accuracy_color(overall_accuracy)),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press r for a new session",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Results ");
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn accuracy_color(percent: f64) -> Color {
    if percent >= 70.0 {
        Color::Green
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}
