use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Fire-and-forget outbound notification channel.
///
/// The workflow never fails a step on delivery errors; callers log and move
/// on.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send(&self, text: &str) -> Result<(), DomainError>;
}
