//! Run-level orchestration: fetch every channel, then sort, dedup,
//! materialize thumbnails and group albums across the whole run.

pub mod postprocess;

use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use crate::app::Result;
use crate::domain::{Channel, ChannelCache, ChannelLookup, ChannelRef, Item};
use crate::fetcher::{ChannelClient, HistoryPaginator, RequestRetrier};
use crate::normalizer::Assembler;
use crate::thumbnail::ThumbnailResolver;

pub use postprocess::{dedup, fingerprint, group_albums, sort_by_time, FINGERPRINT_BYTES};

pub struct CollectorOptions {
    /// How far back to read each channel.
    pub window: Duration,
    pub cache_dir: PathBuf,
    pub dump_dir: Option<PathBuf>,
    /// Inline materialized thumbnails as base64.
    pub embed_thumbnails: bool,
}

pub struct Collector {
    client: Arc<dyn ChannelClient + Send + Sync>,
    retrier: Arc<RequestRetrier>,
    paginator: HistoryPaginator,
    assembler: Assembler,
    thumbnails: ThumbnailResolver,
    window: Duration,
    embed_thumbnails: bool,
}

impl Collector {
    pub fn new(
        client: Arc<dyn ChannelClient + Send + Sync>,
        retrier: Arc<RequestRetrier>,
        options: CollectorOptions,
    ) -> Self {
        let paginator =
            HistoryPaginator::new(client.clone(), retrier.clone()).with_dump_dir(options.dump_dir);
        let assembler = Assembler::new(client.clone(), retrier.clone());
        let thumbnails = ThumbnailResolver::new(client.clone(), retrier.clone(), options.cache_dir);

        Self {
            client,
            retrier,
            paginator,
            assembler,
            thumbnails,
            window: options.window,
            embed_thumbnails: options.embed_thumbnails,
        }
    }

    /// Collect everything posted within the configured window.
    pub async fn collect(&self, handles: &[String]) -> Vec<Item> {
        let cutoff = Utc::now()
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.collect_since(handles, cutoff).await
    }

    /// Collect everything posted at or after `cutoff`, ready for rendering.
    ///
    /// A channel that fails is logged and skipped. The returned items are in
    /// time order and none has a pending thumbnail download.
    pub async fn collect_since(&self, handles: &[String], cutoff: DateTime<Utc>) -> Vec<Item> {
        let mut cache = ChannelCache::new();
        let mut items = Vec::new();

        for handle in handles {
            info!("processing channel {:?}", handle);
            match self.collect_channel(handle, cutoff, &mut cache).await {
                Ok(channel_items) => {
                    info!("{} items from {:?}", channel_items.len(), handle);
                    items.extend(channel_items);
                }
                Err(e) => error!("Skipping channel {:?}: {}", handle, e),
            }
        }

        sort_by_time(&mut items);
        let before = items.len();
        let mut items = dedup(items);
        info!("removed {} items as duplicates", before - items.len());

        self.materialize_thumbnails(&mut items).await;

        let mut items = group_albums(items);
        sort_by_time(&mut items);
        items
    }

    /// Resolve a handle to its reference and display identity.
    pub async fn resolve_channel(
        &self,
        handle: &str,
        cache: &mut ChannelCache,
    ) -> Result<(ChannelRef, Channel)> {
        let peer = self
            .retrier
            .execute(|| self.client.resolve_handle(handle))
            .await?;

        if let Some(channel) = cache.get(peer.id) {
            return Ok((peer, channel.clone()));
        }

        let lookup = ChannelLookup::Direct(peer);
        let channel = self
            .retrier
            .execute(|| self.client.channel_info(&lookup))
            .await?;
        cache.insert(peer.id, channel.clone());
        Ok((peer, channel))
    }

    async fn collect_channel(
        &self,
        handle: &str,
        cutoff: DateTime<Utc>,
        cache: &mut ChannelCache,
    ) -> Result<Vec<Item>> {
        let (peer, channel) = self.resolve_channel(handle, cache).await?;
        let messages = self.paginator.fetch(&peer, cutoff).await?;

        let mut items = Vec::with_capacity(messages.len());
        for message in &messages {
            let item = self
                .assembler
                .assemble(message, &channel, &peer, cache)
                .await;
            info!(
                "handled message {} ({}) from {} ({} chars)",
                item.message_id,
                item.timestamp,
                item.channel.domain,
                item.text.len()
            );
            items.push(item);
        }
        Ok(items)
    }

    /// Download every pending preview; failures leave the Media as a placeholder.
    async fn materialize_thumbnails(&self, items: &mut [Item]) {
        info!("starting downloads");
        let mut succeeded = 0;
        let mut failed = 0;

        for media in items.iter_mut().flat_map(|item| item.media.iter_mut()) {
            let Some(location) = media.pending_download.take() else {
                continue;
            };

            let result = match self.thumbnails.materialize(&location).await {
                Ok(path) => self.encode(&path).await.map(|encoded| (path, encoded)),
                Err(e) => Err(e),
            };

            match result {
                Ok((path, encoded)) => {
                    media.attach_thumbnail(path, encoded);
                    succeeded += 1;
                }
                Err(e) => {
                    warn!(
                        "Failed to materialize thumbnail {}: {}",
                        location.object_id(),
                        e
                    );
                    failed += 1;
                }
            }
        }

        info!(
            "downloads complete, {} success {} failures",
            succeeded, failed
        );
    }

    async fn encode(&self, path: &std::path::Path) -> Result<Option<String>> {
        if !self.embed_thumbnails {
            return Ok(None);
        }
        let bytes = tokio::fs::read(path).await?;
        Ok(Some(STANDARD.encode(bytes)))
    }
}
