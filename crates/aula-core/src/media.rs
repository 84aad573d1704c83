//! Media engine collaborator seam.
//!
//! Capture, encode and media transport are delegated to the host's
//! engine. The core only issues commands; per-command failures after a
//! successful join degrade the session instead of failing it.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("subscribe failed: {0}")]
    Subscribe(String),
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Start publishing local media.
    async fn publish(&self, audio: bool, video: bool) -> Result<(), MediaError>;

    /// Subscribe to a remote participant's media.
    async fn subscribe(
        &self,
        target_user_id: &str,
        audio: bool,
        video: bool,
    ) -> Result<(), MediaError>;

    /// Stop publishing local media.
    async fn unpublish(&self) -> Result<(), MediaError>;

    /// Drop the subscription to a remote participant.
    async fn unsubscribe(&self, target_user_id: &str) -> Result<(), MediaError>;
}
