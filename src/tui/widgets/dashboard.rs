use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::format::{format_short, level_bar, truncate};
use crate::models::level_label;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Stats + Due topics row
            Constraint::Min(0),    // Level breakdown
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_due_topics(f, app, top_chunks[1]);
    draw_levels(f, app, chunks[1]);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("Topics: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total_topics),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Due: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.due_now),
                Style::default().fg(if stats.due_now > 0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Long-term: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.long_term),
                Style::default().fg(Color::Green),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_due_topics(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .due_topics
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            let style = if topic.level() == 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Yellow)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<22}", truncate(&topic.title, 20)), style),
                Span::styled(
                    format_short(&topic.next_review),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Due Topics ")
        .title_style(Style::default().fg(Color::Yellow));

    if items.is_empty() {
        let paragraph = Paragraph::new("Nothing due. Come back later!")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        let list = List::new(items).block(block);
        f.render_widget(list, area);
    }
}

fn draw_levels(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .stats
        .by_level
        .iter()
        .enumerate()
        .map(|(level, count)| {
            let level = level as u8;
            ListItem::new(Line::from(vec![
                Span::styled(level_bar(level), Style::default().fg(Color::Green)),
                Span::raw(" "),
                Span::styled(
                    format!("{:<12}", level_label(level)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(format!("{}", count), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Levels ")
        .title_style(Style::default().fg(Color::Magenta));

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}
