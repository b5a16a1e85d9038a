// src/sources/mod.rs
//! External collaborators the pipeline samples from. The core only sees these
//! traits; the `Http*` implementations talk to the guild API, the document
//! store, and the stream platform.

pub mod guild;
pub mod store;
pub mod stream;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::ladder::{MemberId, SeasonBucket};

pub use guild::HttpRosterSource;
pub use store::HttpStreakSource;
pub use stream::HttpLiveSource;

/// Who is eligible for evaluation this cycle.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Ids registered in the document store.
    async fn registered_members(&self) -> Result<Vec<MemberId>>;

    /// Display names for guild members holding the membership role. Members
    /// absent from this map are not evaluated.
    async fn display_names(&self) -> Result<HashMap<MemberId, String>>;
}

/// Per-member ladder data, one season bucket per character.
#[async_trait]
pub trait StreakSource: Send + Sync {
    async fn fetch_ladders(&self, member: &str) -> Result<Vec<SeasonBucket>>;
}

/// Optional live-stream status used to enrich announcement messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStatus {
    pub login: String,
    pub is_live: bool,
}

#[async_trait]
pub trait LiveStatusSource: Send + Sync {
    /// `Ok(None)` when the member has no stream connection on file.
    async fn live_status(&self, member: &str) -> Result<Option<LiveStatus>>;
}
