pub mod announce;

pub use announce::AnnounceClient;

use anyhow::Result;
use async_trait::async_trait;

/// Delivery sink for a single rendered announcement. Implementations report
/// delivery errors to the caller; the pipeline logs them and moves on, it
/// never retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel_id: &str, message: &str) -> Result<()>;
}
