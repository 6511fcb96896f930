mod inmem;
mod user;

use std::sync::Arc;

use crate::error::Result;
use crate::models::Topic;

pub use inmem::{InMemoryTopicRepository, InMemoryTopicRepositoryFactory};
pub use user::UserTopicRepositories;

/// A collection of topics belonging to one namespace.
///
/// Every operation is atomic with respect to the others on the same instance.
/// Readers get owned snapshots; the only way to change a topic is through
/// these methods.
pub trait TopicRepository: Send + Sync {
    /// Adds a topic and returns its newly assigned id.
    fn add_topic(&self, title: &str) -> Result<i64>;

    /// Removes a topic. Removing an unknown id is a no-op.
    fn remove_topic(&self, id: i64) -> Result<()>;

    fn get_topic(&self, id: i64) -> Result<Topic>;

    /// Every live topic, in no particular order.
    fn get_all_topics(&self) -> Result<Vec<Topic>>;

    /// Marks a topic as reviewed and reschedules it.
    fn reviewed(&self, id: i64) -> Result<()>;
}

/// Produces fresh, independent repositories.
pub trait TopicRepositoryFactory: Send + Sync {
    fn create_topic_repository(&self) -> Arc<dyn TopicRepository>;
}
