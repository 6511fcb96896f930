mod ui;
mod widgets;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::models::{Stats, Topic};
use crate::repository::TopicRepository;

const DUE_TOPICS_SHOWN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Topics,
    TopicDetail,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Topics,
            View::Topics => View::Dashboard,
            View::TopicDetail => View::Topics,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Topics,
            View::Topics => View::Dashboard,
            View::TopicDetail => View::Topics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
    AddTopic,
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    // Keeps the cursor near where it was when the list is rebuilt
    fn replace_items(&mut self, items: Vec<T>) {
        self.selected = match (self.selected, items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.items = items;
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App {
    repo: Arc<dyn TopicRepository>,
    pub user: String,
    pub view: View,
    pub topics: StatefulList<Topic>,
    pub selected_topic: Option<Topic>,
    pub stats: Stats,
    pub due_topics: Vec<Topic>,
    pub filter: Option<String>,
    pub input: String,
    pub input_mode: InputMode,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(repo: Arc<dyn TopicRepository>, user: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut app = Self {
            repo,
            user: user.to_string(),
            view: View::Dashboard,
            topics: StatefulList::with_items(Vec::new()),
            selected_topic: None,
            stats: Stats::default(),
            due_topics: Vec::new(),
            filter: None,
            input: String::new(),
            input_mode: InputMode::Normal,
            status: None,
            should_quit: false,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut all = self.repo.get_all_topics()?;
        all.sort_by_key(|t| t.id);

        let now = Utc::now();
        self.stats = Stats::from_topics(&all, now);

        let mut due: Vec<Topic> = all.iter().filter(|t| t.is_due(now)).cloned().collect();
        due.sort_by_key(|t| t.next_review);
        due.truncate(DUE_TOPICS_SHOWN);
        self.due_topics = due;

        if let Some(id) = self.selected_topic.as_ref().map(|t| t.id) {
            self.selected_topic = all.iter().find(|t| t.id == id).cloned();
            if self.selected_topic.is_none() && self.view == View::TopicDetail {
                self.view = View::Topics;
            }
        }

        let filtered: Vec<Topic> = match &self.filter {
            Some(needle) => {
                let needle = needle.to_lowercase();
                all.into_iter()
                    .filter(|t| t.title.to_lowercase().contains(&needle))
                    .collect()
            }
            None => all,
        };
        self.topics.replace_items(filtered);
        Ok(())
    }

    fn select_topic(&mut self) {
        if let Some(topic) = self.topics.selected_item() {
            self.selected_topic = Some(topic.clone());
            self.view = View::TopicDetail;
        }
    }

    fn target_id(&self) -> Option<i64> {
        match self.view {
            View::Topics => self.topics.selected_item().map(|t| t.id),
            View::TopicDetail => self.selected_topic.as_ref().map(|t| t.id),
            View::Dashboard => None,
        }
    }

    fn add_topic(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let title = std::mem::take(&mut self.input);
        self.status = Some(match self.repo.add_topic(title.trim()) {
            Ok(id) => format!("Added '{}' (ID {})", title.trim(), id),
            Err(e) => e.to_string(),
        });
        self.refresh_data()
    }

    fn review_selected(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(id) = self.target_id() else {
            return Ok(());
        };
        self.status = Some(match self.repo.reviewed(id) {
            Ok(()) => format!("Topic {} reviewed", id),
            Err(e) => e.to_string(),
        });
        self.refresh_data()
    }

    fn delete_selected(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(id) = self.target_id() else {
            return Ok(());
        };
        self.repo.remove_topic(id)?;
        self.status = Some(format!("Topic {} removed", id));
        self.refresh_data()
    }

    fn apply_filter(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.input.is_empty() {
            self.filter = None;
        } else {
            self.filter = Some(self.input.clone());
        }
        self.input.clear();
        self.refresh_data()
    }

    fn handle_input_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Enter => {
                let mode = self.input_mode;
                self.input_mode = InputMode::Normal;
                match mode {
                    InputMode::Filter => self.apply_filter()?,
                    InputMode::AddTopic => self.add_topic()?,
                    InputMode::Normal => {}
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.input_mode != InputMode::Normal {
            return self.handle_input_key(key);
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Char('/') if self.view == View::Topics => {
                self.input_mode = InputMode::Filter;
                self.input.clear();
            }

            KeyCode::Char('a') => {
                self.input_mode = InputMode::AddTopic;
                self.input.clear();
            }

            KeyCode::Char('r') | KeyCode::Char(' ') => self.review_selected()?,

            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected()?,

            KeyCode::Esc => match self.view {
                View::TopicDetail => {
                    self.view = View::Topics;
                    self.selected_topic = None;
                }
                View::Topics if self.filter.is_some() => {
                    self.filter = None;
                    self.refresh_data()?;
                }
                _ => self.status = None,
            },

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::TopicDetail => {
                    self.view = View::Topics;
                    self.selected_topic = None;
                }
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Topics => self.select_topic(),
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::BackTab => self.view = self.view.prev(),

            KeyCode::Char('j') | KeyCode::Down if self.view == View::Topics => self.topics.next(),
            KeyCode::Char('k') | KeyCode::Up if self.view == View::Topics => {
                self.topics.previous()
            }

            KeyCode::Char('g') if !self.topics.items.is_empty() => {
                self.topics.selected = Some(0);
            }
            KeyCode::Char('G') if !self.topics.items.is_empty() => {
                self.topics.selected = Some(self.topics.items.len() - 1);
            }

            KeyCode::Enter if self.view == View::Topics => self.select_topic(),

            _ => {}
        }
        Ok(())
    }
}

pub fn run(repo: Arc<dyn TopicRepository>, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = App::new(repo, user).and_then(|mut app| run_app(&mut terminal, &mut app));

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
