pub mod history;
pub mod http_client;
pub mod retry;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Channel, ChannelLookup, ChannelRef, FileLocation, RawMessage};

pub use history::HistoryPaginator;
pub use http_client::HttpChannelClient;
pub use retry::{RequestRetrier, Sleeper, TokioSleeper, DEFAULT_MAX_ATTEMPTS};

/// Remote channel-messaging source. Every call may be rate limited.
#[async_trait]
pub trait ChannelClient {
    /// Resolve a public handle to a channel reference.
    async fn resolve_handle(&self, handle: &str) -> Result<ChannelRef>;

    /// Fetch a channel's display identity.
    async fn channel_info(&self, lookup: &ChannelLookup) -> Result<Channel>;

    /// One page of history, newest first, skipping `offset` messages.
    async fn history_page(&self, channel: &ChannelRef, offset: usize) -> Result<Vec<RawMessage>>;

    /// Raw bytes of a thumbnail.
    async fn download_thumbnail(&self, location: &FileLocation) -> Result<Vec<u8>>;
}
