//! In-memory session repository, one state per thread.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::session::{SessionRepository, SessionState, ThreadId};
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    states: RwLock<HashMap<ThreadId, SessionState>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn load(&self, thread: &ThreadId) -> Result<SessionState, DomainError> {
        Ok(self
            .states
            .read()
            .await
            .get(thread)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, thread: &ThreadId, state: SessionState) -> Result<(), DomainError> {
        self.states.write().await.insert(thread.clone(), state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_thread_loads_fresh_state() {
        let repository = InMemorySessionRepository::new();
        let thread = ThreadId::new("fresh").unwrap();

        let state = repository.load(&thread).await.unwrap();
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let repository = InMemorySessionRepository::new();
        let thread = ThreadId::new("t-1").unwrap();

        let mut state = SessionState::new();
        state.push_user_message("hello");
        repository.save(&thread, state).await.unwrap();

        let loaded = repository.load(&thread).await.unwrap();
        assert_eq!(loaded.messages.len(), 1);

        // Threads are isolated
        let other = repository.load(&ThreadId::new("t-2").unwrap()).await.unwrap();
        assert!(other.messages.is_empty());
    }
}
