//! Thumbnail size selection and the on-disk thumbnail cache.
//!
//! Cache entries live at `<cache_dir>/<remote object id>.jpeg` and are never
//! evicted; a remote object id always renders to the same bytes.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::app::{GazetteError, Result};
use crate::domain::{FileLocation, PhotoSize, ThumbSize};
use crate::fetcher::{ChannelClient, RequestRetrier};

/// Pick the cheapest downloadable preview: smallest byte size, first on ties.
pub fn best_size(candidates: &[ThumbSize]) -> Result<&PhotoSize> {
    candidates
        .iter()
        .filter_map(|candidate| match candidate {
            ThumbSize::Sized(size) => Some(size),
            _ => None,
        })
        .min_by_key(|size| size.size)
        .ok_or(GazetteError::NoSuitableSize)
}

pub struct ThumbnailResolver {
    client: Arc<dyn ChannelClient + Send + Sync>,
    retrier: Arc<RequestRetrier>,
    cache_dir: PathBuf,
}

impl ThumbnailResolver {
    pub fn new(
        client: Arc<dyn ChannelClient + Send + Sync>,
        retrier: Arc<RequestRetrier>,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            retrier,
            cache_dir,
        }
    }

    pub fn cache_path(&self, location: &FileLocation) -> PathBuf {
        self.cache_dir
            .join(format!("{}.jpeg", location.object_id()))
    }

    /// Local path of the thumbnail, downloading it only on a cache miss.
    pub async fn materialize(&self, location: &FileLocation) -> Result<PathBuf> {
        let path = self.cache_path(location);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        info!("downloading thumbnail for id {}", location.object_id());
        let bytes = self
            .retrier
            .execute(|| self.client.download_thumbnail(location))
            .await?;

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
