use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::format::{format_short, level_bar, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = if let Some(filter) = &app.filter {
        format!(" Topics (filter: {}) ", filter)
    } else {
        " Topics ".to_string()
    };

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .topics
        .items
        .iter()
        .map(|topic| {
            let next_review = format_short(&topic.next_review);
            let (next_color, next_text) = if topic.is_due(now) {
                (Color::Red, format!("{} !", next_review))
            } else {
                (Color::White, next_review)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<5}", topic.id),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<30}", truncate(&topic.title, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(level_bar(topic.level()), Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {}   ", topic.level()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(next_text, Style::default().fg(next_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<5}", "ID"), header_style),
        Span::styled(format!("{:<30}", "Title"), header_style),
        Span::styled("Level    ", header_style),
        Span::styled("Next Review", header_style),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.topics.selected);

    // Header takes the first row inside the block; the list starts one row lower
    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}
