use moka::future::Cache;
use std::time::Duration;

use crate::error::RepoResult;
use crate::model::user::User;
use crate::repository::UserRepository;

/// Users resolved during Basic authentication, keyed by exact username.
/// Only hits are stored; unknown usernames always reach the repository.
#[derive(Clone)]
pub struct UserCache {
    users: Cache<String, User>,
}

impl UserCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            users: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached lookup, falling back to the repository on a miss.
    pub async fn get_or_load<U: UserRepository>(
        &self,
        username: &str,
        repo: &U,
    ) -> RepoResult<Option<User>> {
        if let Some(user) = self.users.get(username).await {
            return Ok(Some(user));
        }

        let found = repo.find_by_username(username).await?;
        if let Some(user) = &found {
            self.users.insert(username.to_string(), user.clone()).await;
        }
        Ok(found)
    }

    pub async fn invalidate(&self, username: &str) {
        self.users.invalidate(username).await;
    }
}
