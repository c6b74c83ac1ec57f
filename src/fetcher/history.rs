use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::app::Result;
use crate::domain::{ChannelRef, RawMessage};
use crate::fetcher::{ChannelClient, RequestRetrier};

/// Walks a channel's history backwards until the cutoff is crossed.
pub struct HistoryPaginator {
    client: Arc<dyn ChannelClient + Send + Sync>,
    retrier: Arc<RequestRetrier>,
    dump_dir: Option<PathBuf>,
}

impl HistoryPaginator {
    pub fn new(client: Arc<dyn ChannelClient + Send + Sync>, retrier: Arc<RequestRetrier>) -> Self {
        Self {
            client,
            retrier,
            dump_dir: None,
        }
    }

    /// Also write every fetched message to `dir` as JSON.
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    /// Messages not older than `cutoff`, newest first.
    ///
    /// Stops at the first message older than the cutoff, or at an empty page.
    pub async fn fetch(
        &self,
        channel: &ChannelRef,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<RawMessage>> {
        let threshold = cutoff.timestamp();
        let mut offset = 0;
        let mut messages = Vec::new();

        loop {
            let page = self
                .retrier
                .execute(|| self.client.history_page(channel, offset))
                .await?;

            debug!(
                "channel {}: {} messages at offset {}",
                channel.id,
                page.len(),
                offset
            );

            if page.is_empty() {
                break;
            }
            offset += page.len();

            for message in page {
                if message.date < threshold {
                    return Ok(messages);
                }
                self.dump(channel, &message).await;
                messages.push(message);
            }
        }

        Ok(messages)
    }

    async fn dump(&self, channel: &ChannelRef, message: &RawMessage) {
        let Some(dir) = &self.dump_dir else {
            return;
        };
        let path = dir.join(format!("{}-{}.json", channel.id, message.id));
        let result = match serde_json::to_vec_pretty(message) {
            Ok(body) => tokio::fs::write(&path, body).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            warn!("Failed to dump message to {}: {}", path.display(), e);
        }
    }
}
