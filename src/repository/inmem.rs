use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use super::{TopicRepository, TopicRepositoryFactory};
use crate::error::{RepositoryError, Result};
use crate::models::Topic;

struct TopicTable {
    topics: HashMap<i64, Topic>,
    titles: HashSet<String>,
    next_id: i64,
}

/// In-memory topic repository, safe to share between threads.
pub struct InMemoryTopicRepository {
    table: Mutex<TopicTable>,
}

impl InMemoryTopicRepository {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(TopicTable {
                topics: HashMap::new(),
                titles: HashSet::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryTopicRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicRepository for InMemoryTopicRepository {
    fn add_topic(&self, title: &str) -> Result<i64> {
        if title.is_empty() {
            return Err(RepositoryError::empty_title());
        }

        let mut table = self.table.lock();
        if table.titles.contains(title) {
            return Err(RepositoryError::duplicate_title(title));
        }

        let id = table.next_id;
        table.next_id += 1;
        table.titles.insert(title.to_string());
        table.topics.insert(id, Topic::new(id, title, Utc::now()));
        Ok(id)
    }

    fn remove_topic(&self, id: i64) -> Result<()> {
        let mut table = self.table.lock();
        if let Some(topic) = table.topics.remove(&id) {
            table.titles.remove(&topic.title);
        }
        Ok(())
    }

    fn get_topic(&self, id: i64) -> Result<Topic> {
        self.table
            .lock()
            .topics
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(id))
    }

    fn get_all_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.table.lock().topics.values().cloned().collect())
    }

    fn reviewed(&self, id: i64) -> Result<()> {
        let mut table = self.table.lock();
        let topic = table
            .topics
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(id))?;
        topic.reviewed();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryTopicRepositoryFactory;

impl InMemoryTopicRepositoryFactory {
    pub fn new() -> Self {
        Self
    }
}

impl TopicRepositoryFactory for InMemoryTopicRepositoryFactory {
    fn create_topic_repository(&self) -> Arc<dyn TopicRepository> {
        Arc::new(InMemoryTopicRepository::new())
    }
}
