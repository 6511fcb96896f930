use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{TopicRepository, TopicRepositoryFactory};

/// Registry binding one topic repository to each user identity.
///
/// Repositories are created on first access and kept for the lifetime of
/// the registry. Identities are opaque strings and never validated here.
pub struct UserTopicRepositories {
    factory: Arc<dyn TopicRepositoryFactory>,
    repos: Mutex<HashMap<String, Arc<dyn TopicRepository>>>,
}

impl UserTopicRepositories {
    pub fn new(factory: Arc<dyn TopicRepositoryFactory>) -> Self {
        Self {
            factory,
            repos: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the repository for `identity`, creating it on first use.
    ///
    /// Creation happens while the registry lock is held, so racing first
    /// calls for the same identity all receive the same instance.
    pub fn get_or_create(&self, identity: &str) -> Arc<dyn TopicRepository> {
        let mut repos = self.repos.lock();
        if let Some(repo) = repos.get(identity) {
            return Arc::clone(repo);
        }

        let repo = self.factory.create_topic_repository();
        repos.insert(identity.to_string(), Arc::clone(&repo));
        tracing::debug!(identity, namespaces = repos.len(), "created topic namespace");
        repo
    }

    /// Identities that already own a repository, sorted.
    pub fn identities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.repos.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
