use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Channel, FileLocation};

/// One visual attachment of an item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    pub is_video: bool,
    pub thumbnail_path: Option<PathBuf>,
    pub thumbnail_base64: Option<String>,
    /// Set while the preview is still owed a download.
    #[serde(skip)]
    pub pending_download: Option<FileLocation>,
    pub width: u32,
    pub height: u32,
    /// `MM:SS`, videos only.
    pub duration: Option<String>,
    pub permalink: String,
}

impl Media {
    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail_path.is_some()
    }

    /// Record a materialized preview and drop the pending download.
    pub fn attach_thumbnail(&mut self, path: PathBuf, encoded: Option<String>) {
        self.pending_download = None;
        self.thumbnail_path = Some(path);
        self.thumbnail_base64 = encoded;
    }
}

/// A web page quoted by a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPage {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// One normalized post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Source-native id, only unique within its channel.
    pub message_id: i64,
    /// 0 when the item is not part of an album.
    pub group_id: i64,
    pub channel: Channel,
    /// Marked-up body.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub linked_page: Option<LinkedPage>,
    pub media: Vec<Media>,
    pub forwarded_from: Option<Channel>,
}

impl Item {
    pub fn new(message_id: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            message_id,
            group_id: 0,
            channel: Channel::default(),
            text: String::new(),
            timestamp,
            linked_page: None,
            media: Vec::new(),
            forwarded_from: None,
        }
    }

    pub fn permalink(&self) -> String {
        self.channel.permalink(self.message_id)
    }

    /// The channel to credit: the forward source when there is one.
    pub fn attribution(&self) -> &Channel {
        self.forwarded_from.as_ref().unwrap_or(&self.channel)
    }

    pub fn is_forwarded(&self) -> bool {
        self.forwarded_from.is_some()
    }

    pub fn has_pending_downloads(&self) -> bool {
        self.media.iter().any(|m| m.pending_download.is_some())
    }
}
