use std::error::Error;
use std::io::{BufRead, Write};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error as ThisError;

use crate::error::RepositoryError;
use crate::format::{format_time, truncate};
use crate::models::{level_label, JsonOutput, Stats, Topic};
use crate::repository::{TopicRepository, UserTopicRepositories};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Show(i64),
    Add(String),
    Repeat(i64),
    Remove(i64),
    Stats,
    User(String),
    Users,
    Quit,
    Empty,
}

#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ParseError {
    #[error("unknown command '{0}', type 'help' for usage")]
    UnknownCommand(String),

    #[error("'{0}' needs {1}")]
    MissingArgument(&'static str, &'static str),

    #[error("'{0}' is not a valid topic id")]
    InvalidId(String),
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "" => Command::Empty,
        "help" | "h" => Command::Help,
        "list" | "l" => Command::List,
        "show" | "s" => Command::Show(parse_id("show", rest)?),
        "add" | "a" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("add", "a topic title"));
            }
            Command::Add(rest.to_string())
        }
        "repeat" | "review" | "p" => Command::Repeat(parse_id("repeat", rest)?),
        "remove" | "r" => Command::Remove(parse_id("remove", rest)?),
        "stats" => Command::Stats,
        "user" | "u" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("user", "a user name"));
            }
            Command::User(rest.to_string())
        }
        "users" => Command::Users,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn parse_id(command: &'static str, arg: &str) -> Result<i64, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::MissingArgument(command, "a topic id"));
    }
    arg.parse()
        .map_err(|_| ParseError::InvalidId(arg.to_string()))
}

const HELP: &[&str] = &[
    "help   (h)             print this help",
    "list   (l)             print all topics",
    "show   (s) <id>        print topic info",
    "add    (a) <title>     add topic",
    "repeat (p) <id>        mark topic as reviewed",
    "remove (r) <id>        remove topic",
    "stats                  print review statistics",
    "user   (u) <name>      switch to another user's topics",
    "users                  list known users",
    "quit   (q)             leave the shell",
];

/// Interactive line client over the per-user topic repositories.
pub struct Shell<'a> {
    users: &'a UserTopicRepositories,
    user: String,
    repo: Arc<dyn TopicRepository>,
    json: bool,
}

impl<'a> Shell<'a> {
    pub fn new(users: &'a UserTopicRepositories, user: &str, json: bool) -> Self {
        Self {
            users,
            user: user.to_string(),
            repo: users.get_or_create(user),
            json,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), Box<dyn Error>> {
        if !self.json {
            writeln!(out, "memflow shell, user '{}'. Type 'help' for commands.", self.user)?;
            write!(out, "> ")?;
            out.flush()?;
        }

        for line in input.lines() {
            let line = line?;
            let keep_going = match parse_command(&line) {
                Ok(command) => {
                    tracing::debug!(user = %self.user, ?command, "shell command");
                    self.execute(command, out)?
                }
                Err(e) => {
                    self.report(out, &e.to_string())?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }
            if !self.json {
                write!(out, "> ")?;
                out.flush()?;
            }
        }

        if !self.json {
            writeln!(out)?;
        }
        Ok(())
    }

    /// Runs one command. Returns `false` when the shell should stop.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<bool, Box<dyn Error>> {
        match command {
            Command::Empty => {}
            Command::Quit => return Ok(false),
            Command::Help => {
                if self.json {
                    emit(out, &JsonOutput::ok(HELP))?;
                } else {
                    writeln!(out, "Usage:")?;
                    for line in HELP {
                        writeln!(out, "\t{}", line)?;
                    }
                }
            }
            Command::List => match self.repo.get_all_topics() {
                Ok(mut topics) => {
                    topics.sort_by_key(|t| t.id);
                    self.print_list(out, &topics)?;
                }
                Err(e) => self.repository_error(out, e)?,
            },
            Command::Show(id) => match self.repo.get_topic(id) {
                Ok(topic) => self.print_topic(out, &topic)?,
                Err(e) => self.repository_error(out, e)?,
            },
            Command::Add(title) => match self.repo.add_topic(&title) {
                Ok(id) => {
                    if self.json {
                        emit(out, &JsonOutput::ok(serde_json::json!({ "id": id, "title": title })))?;
                    } else {
                        writeln!(out, "Added topic '{}' with ID: {}", title, id)?;
                    }
                }
                Err(e) => self.repository_error(out, e)?,
            },
            Command::Repeat(id) => match self.repo.reviewed(id).and_then(|_| self.repo.get_topic(id)) {
                Ok(topic) => {
                    if self.json {
                        emit(out, &JsonOutput::ok(&topic))?;
                    } else {
                        writeln!(
                            out,
                            "Topic {} reviewed. Next review: {}",
                            topic.id,
                            format_time(&topic.next_review)
                        )?;
                    }
                }
                Err(e) => self.repository_error(out, e)?,
            },
            Command::Remove(id) => match self.repo.remove_topic(id) {
                Ok(()) => {
                    if self.json {
                        emit(out, &JsonOutput::<()>::ok(()))?;
                    } else {
                        writeln!(out, "Topic {} removed.", id)?;
                    }
                }
                Err(e) => self.repository_error(out, e)?,
            },
            Command::Stats => match self.repo.get_all_topics() {
                Ok(topics) => self.print_stats(out, &Stats::from_topics(&topics, Utc::now()))?,
                Err(e) => self.repository_error(out, e)?,
            },
            Command::User(name) => {
                self.repo = self.users.get_or_create(&name);
                self.user = name;
                if self.json {
                    emit(out, &JsonOutput::ok(serde_json::json!({ "user": self.user })))?;
                } else {
                    writeln!(out, "Switched to user '{}'.", self.user)?;
                }
            }
            Command::Users => {
                let names = self.users.identities();
                if self.json {
                    emit(out, &JsonOutput::ok(&names))?;
                } else {
                    for name in names {
                        let marker = if name == self.user { "*" } else { " " };
                        writeln!(out, "{} {}", marker, name)?;
                    }
                }
            }
        }
        Ok(true)
    }

    fn print_list<W: Write>(&self, out: &mut W, topics: &[Topic]) -> Result<(), Box<dyn Error>> {
        if self.json {
            return emit(out, &JsonOutput::ok(topics));
        }
        if topics.is_empty() {
            writeln!(out, "No topics found.")?;
            return Ok(());
        }

        let now = Utc::now();
        writeln!(out, "{:<5} {:<40} {:<12} NEXT REVIEW", "ID", "TITLE", "LEVEL")?;
        writeln!(out, "{}", "-".repeat(80))?;
        for topic in topics {
            let due = if topic.is_due(now) { " (due)" } else { "" };
            writeln!(
                out,
                "{:<5} {:<40} {:<12} {}{}",
                topic.id,
                truncate(&topic.title, 38),
                level_label(topic.level()),
                format_time(&topic.next_review),
                due
            )?;
        }
        Ok(())
    }

    fn print_topic<W: Write>(&self, out: &mut W, topic: &Topic) -> Result<(), Box<dyn Error>> {
        if self.json {
            return emit(out, &JsonOutput::ok(topic));
        }
        writeln!(out, "Topic: {}", topic.title)?;
        writeln!(out, "ID: {}", topic.id)?;
        writeln!(out, "Level: {} ({})", level_label(topic.level()), topic.level())?;
        writeln!(out, "Created: {}", format_time(&topic.created))?;
        writeln!(out, "Last reviewed: {}", format_time(&topic.last_reviewed))?;
        writeln!(out, "Next review: {}", format_time(&topic.next_review))?;
        if topic.is_due(Utc::now()) {
            writeln!(out, "Due for review now.")?;
        }
        Ok(())
    }

    fn print_stats<W: Write>(&self, out: &mut W, stats: &Stats) -> Result<(), Box<dyn Error>> {
        if self.json {
            return emit(out, &JsonOutput::ok(stats));
        }
        writeln!(out, "=== Review Statistics ({}) ===", self.user)?;
        writeln!(out, "Total topics: {}", stats.total_topics)?;
        writeln!(out, "Due for review: {}", stats.due_now)?;
        writeln!(out, "Long-term (level 4): {}", stats.long_term)?;
        for (level, count) in stats.by_level.iter().enumerate() {
            writeln!(out, "  {:<12} {}", level_label(level as u8), count)?;
        }
        Ok(())
    }

    fn repository_error<W: Write>(&self, out: &mut W, err: RepositoryError) -> Result<(), Box<dyn Error>> {
        tracing::info!(
            user = %self.user,
            error = %err,
            client_error = err.is_client_error(),
            "repository call failed"
        );
        let msg = if err.is_not_found() {
            format!("not found: {}", err)
        } else {
            err.to_string()
        };
        self.report(out, &msg)
    }

    fn report<W: Write>(&self, out: &mut W, msg: &str) -> Result<(), Box<dyn Error>> {
        if self.json {
            emit(out, &JsonOutput::<()>::err(msg))
        } else {
            writeln!(out, "Error: {}", msg)?;
            Ok(())
        }
    }
}

fn emit<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), Box<dyn Error>> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryTopicRepositoryFactory;
    use std::io::Cursor;

    fn registry() -> UserTopicRepositories {
        UserTopicRepositories::new(Arc::new(InMemoryTopicRepositoryFactory::new()))
    }

    fn run_script(users: &UserTopicRepositories, json: bool, script: &str) -> String {
        let mut shell = Shell::new(users, "default", json);
        let mut out = Vec::new();
        shell.run(Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn parse_aliases() {
            assert_eq!(parse_command("h"), Ok(Command::Help));
            assert_eq!(parse_command("list"), Ok(Command::List));
            assert_eq!(parse_command("l"), Ok(Command::List));
            assert_eq!(parse_command("s 3"), Ok(Command::Show(3)));
            assert_eq!(parse_command("p 2"), Ok(Command::Repeat(2)));
            assert_eq!(parse_command("review 2"), Ok(Command::Repeat(2)));
            assert_eq!(parse_command("r 9"), Ok(Command::Remove(9)));
            assert_eq!(parse_command("q"), Ok(Command::Quit));
            assert_eq!(parse_command("users"), Ok(Command::Users));
            assert_eq!(parse_command("stats"), Ok(Command::Stats));
        }

        #[test]
        fn parse_add_keeps_full_title() {
            assert_eq!(
                parse_command("add   Go generics  "),
                Ok(Command::Add("Go generics".to_string()))
            );
        }

        #[test]
        fn parse_blank_line() {
            assert_eq!(parse_command("   "), Ok(Command::Empty));
        }

        #[test]
        fn parse_user_switch() {
            assert_eq!(parse_command("u alice"), Ok(Command::User("alice".to_string())));
        }

        #[test]
        fn parse_errors() {
            assert_eq!(
                parse_command("frobnicate"),
                Err(ParseError::UnknownCommand("frobnicate".to_string()))
            );
            assert!(matches!(
                parse_command("add"),
                Err(ParseError::MissingArgument("add", _))
            ));
            assert!(matches!(
                parse_command("show"),
                Err(ParseError::MissingArgument("show", _))
            ));
            assert_eq!(
                parse_command("show abc"),
                Err(ParseError::InvalidId("abc".to_string()))
            );
        }
    }

    mod session_tests {
        use super::*;

        #[test]
        fn add_list_and_show() {
            let users = registry();
            let out = run_script(&users, false, "add Go generics\nlist\nshow 1\n");
            assert!(out.contains("Added topic 'Go generics' with ID: 1"));
            assert!(out.contains("TITLE"));
            assert!(out.contains("Topic: Go generics"));
            assert!(out.contains("Level: New (0)"));
        }

        #[test]
        fn duplicate_title_is_reported_and_shell_continues() {
            let users = registry();
            let out = run_script(&users, false, "a T\na T\na U\n");
            assert!(out.contains("Error: topic with title T already exists"));
            assert!(out.contains("Added topic 'U' with ID: 2"));
        }

        #[test]
        fn missing_topic_is_not_found() {
            let users = registry();
            let out = run_script(&users, false, "show 5\np 5\n");
            assert_eq!(out.matches("Error: not found: topic with id 5 does not exist").count(), 2);
        }

        #[test]
        fn repeat_remove_and_readd() {
            let users = registry();
            let out = run_script(&users, false, "a X\np 1\nr 1\ns 1\na X\n");
            assert!(out.contains("Topic 1 reviewed. Next review:"));
            assert!(out.contains("Topic 1 removed."));
            assert!(out.contains("not found"));
            assert!(out.contains("Added topic 'X' with ID: 2"));

            let topic = users.get_or_create("default").get_topic(2).unwrap();
            assert_eq!(topic.level(), 0);
        }

        #[test]
        fn quit_stops_reading() {
            let users = registry();
            let out = run_script(&users, false, "q\na Never\n");
            assert!(!out.contains("Never"));
            assert!(users.get_or_create("default").get_all_topics().unwrap().is_empty());
        }

        #[test]
        fn switching_users_isolates_topics() {
            let users = registry();
            let out = run_script(&users, false, "a Mine\nu bob\nl\na Mine\nusers\n");
            assert!(out.contains("Switched to user 'bob'."));
            assert!(out.contains("No topics found."));
            assert!(out.contains("Added topic 'Mine' with ID: 1"));
            assert!(out.contains("* bob"));
            assert!(out.contains("  default"));
        }

        #[test]
        fn stats_counts_levels() {
            let users = registry();
            let out = run_script(&users, false, "a A\na B\np 1\nstats\n");
            assert!(out.contains("Total topics: 2"));
            assert!(out.contains("Due for review: 0"));
        }

        #[test]
        fn shell_tracks_current_user() {
            let users = registry();
            let mut shell = Shell::new(&users, "default", false);
            let mut out = Vec::new();
            shell.execute(Command::User("zoe".to_string()), &mut out).unwrap();
            assert_eq!(shell.user(), "zoe");
        }
    }

    mod json_tests {
        use super::*;

        fn lines(out: &str) -> Vec<serde_json::Value> {
            out.lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }

        #[test]
        fn json_add_and_list() {
            let users = registry();
            let out = run_script(&users, true, "add Borrowing\nlist\n");
            let values = lines(&out);
            assert_eq!(values.len(), 2);
            assert_eq!(values[0]["success"], true);
            assert_eq!(values[0]["data"]["id"], 1);
            assert_eq!(values[1]["data"][0]["title"], "Borrowing");
            assert!(values[1]["data"][0].get("nextReview").is_some());
        }

        #[test]
        fn json_errors() {
            let users = registry();
            let out = run_script(&users, true, "add\nshow 3\n");
            let values = lines(&out);
            assert_eq!(values.len(), 2);
            assert!(values.iter().all(|v| v["success"] == false));
            assert!(values[1]["error"].as_str().unwrap().starts_with("not found"));
        }

        #[test]
        fn json_remove_unknown_succeeds() {
            let users = registry();
            let out = run_script(&users, true, "r 42\n");
            let values = lines(&out);
            assert_eq!(values[0]["success"], true);
        }
    }
}
