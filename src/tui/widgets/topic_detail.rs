use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::format::{format_time, level_bar};
use crate::models::{level_label, review_interval, Topic, MAX_LEVEL};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(topic) = &app.selected_topic else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Topic Detail ");
        let paragraph = Paragraph::new("No topic selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Header info
            Constraint::Length(4), // Schedule
            Constraint::Min(0),    // Upcoming intervals
        ])
        .split(area);

    draw_header(f, topic, chunks[0]);
    draw_schedule(f, topic, chunks[1]);
    draw_upcoming(f, topic, chunks[2]);
}

fn draw_header(f: &mut Frame, topic: &Topic, area: Rect) {
    let text = vec![
        Line::from(vec![
            Span::styled("ID: ", Style::default().fg(Color::Gray)),
            Span::styled(topic.id.to_string(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Created: ", Style::default().fg(Color::Gray)),
            Span::styled(format_time(&topic.created), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Last reviewed: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_time(&topic.last_reviewed),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", topic.title))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_schedule(f: &mut Frame, topic: &Topic, area: Rect) {
    let due = topic.is_due(Utc::now());

    let text = vec![
        Line::from(vec![
            Span::styled("Level: ", Style::default().fg(Color::Gray)),
            Span::styled(level_bar(topic.level()), Style::default().fg(Color::Green)),
            Span::styled(
                format!(" {}/{} ({})", topic.level(), MAX_LEVEL, level_label(topic.level())),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            Span::styled("Next review: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_time(&topic.next_review),
                Style::default().fg(if due { Color::Red } else { Color::White }),
            ),
            Span::styled(
                if due { "  due now" } else { "" },
                Style::default().fg(Color::Red),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Schedule ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

// Shows how far each of the next reviews would push the schedule
fn draw_upcoming(f: &mut Frame, topic: &Topic, area: Rect) {
    let items: Vec<ListItem> = (topic.level()..=MAX_LEVEL)
        .map(|level| {
            let interval = review_interval(level);
            let label = if interval.num_days() >= 1 {
                format!("{} days", interval.num_days())
            } else {
                format!("{} hours", interval.num_hours())
            };
            let marker = if level == topic.level() { "→ " } else { "  " };

            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{:<12}", level_label(level)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(label, Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next Intervals ")
        .title_style(Style::default().fg(Color::Magenta));

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}
