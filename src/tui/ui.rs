use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{dashboard, topic_detail, topics};
use super::{App, InputMode, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_help_bar(f, app, chunks[3]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Topics"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Topics | View::TopicDetail => 1,
    };

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" memflow: {} ", app.user)),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Topics => topics::draw(f, app, area),
        View::TopicDetail => topic_detail::draw(f, app, area),
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let line = match app.input_mode {
        InputMode::Normal => Line::from(Span::styled(
            app.status.clone().unwrap_or_default(),
            Style::default().fg(Color::Yellow),
        )),
        InputMode::Filter | InputMode::AddTopic => {
            let prompt = if app.input_mode == InputMode::Filter {
                "/"
            } else {
                "New topic: "
            };
            Line::from(vec![
                Span::styled(prompt, Style::default().fg(Color::Yellow)),
                Span::raw(&app.input),
                Span::styled("█", Style::default().fg(Color::Yellow)),
            ])
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn key(k: &'static str) -> Span<'static> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.input_mode != InputMode::Normal {
        vec![
            key("<CR>"),
            Span::raw(" Apply  "),
            key("<Esc>"),
            Span::raw(" Cancel"),
        ]
    } else {
        let mut spans = vec![key("h/l"), Span::raw(" Views  "), key("a"), Span::raw(" Add  ")];

        match app.view {
            View::Dashboard => {
                spans.extend(vec![key("^r"), Span::raw(" Refresh  ")]);
            }
            View::Topics => {
                spans.extend(vec![
                    key("j/k"),
                    Span::raw(" Nav  "),
                    key("g/G"),
                    Span::raw(" Top/Bot  "),
                    key("l/<CR>"),
                    Span::raw(" Open  "),
                    key("r"),
                    Span::raw(" Reviewed  "),
                    key("d"),
                    Span::raw(" Delete  "),
                    key("/"),
                    Span::raw(" Filter  "),
                ]);
                if app.filter.is_some() {
                    spans.extend(vec![key("<Esc>"), Span::raw(" Clear  ")]);
                }
            }
            View::TopicDetail => {
                spans.extend(vec![
                    key("h/<Esc>"),
                    Span::raw(" Back  "),
                    key("r"),
                    Span::raw(" Reviewed  "),
                    key("d"),
                    Span::raw(" Delete  "),
                ]);
            }
        }

        spans.extend(vec![key("q"), Span::raw(" Quit")]);
        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
