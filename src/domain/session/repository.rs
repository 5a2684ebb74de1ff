use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::session::{SessionState, ThreadId};
use crate::domain::DomainError;

/// Session persistence keyed by thread. `load` returns a fresh state for
/// unknown threads; `save` replaces the stored state wholesale.
#[async_trait]
pub trait SessionRepository: Send + Sync + Debug {
    async fn load(&self, thread: &ThreadId) -> Result<SessionState, DomainError>;

    async fn save(&self, thread: &ThreadId, state: SessionState) -> Result<(), DomainError>;
}
