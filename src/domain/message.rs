//! Raw message shapes as delivered by the channel client.
//!
//! These mirror what the source platform sends, before any normalization:
//! unix timestamps, UTF-16 annotation offsets, thumbnail size candidates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: i64,
    /// Unix seconds.
    pub date: i64,
    /// Album id shared by messages sent together, 0 when not part of one.
    #[serde(default)]
    pub grouped_id: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub entities: Vec<Annotation>,
    #[serde(default)]
    pub media: Attachment,
    #[serde(default)]
    pub fwd_from: Option<ForwardHeader>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    Photo(Photo),
    Document(Document),
    LinkedPage(WebPage),
    /// No attachment, or a kind this crate does not render (polls, geo, ...).
    #[default]
    #[serde(other)]
    None,
}

impl Attachment {
    pub fn kind(&self) -> &'static str {
        match self {
            Attachment::None => "none",
            Attachment::Photo(_) => "photo",
            Attachment::Document(_) => "document",
            Attachment::LinkedPage(_) => "linked_page",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    #[serde(default)]
    pub access_hash: i64,
    #[serde(default)]
    pub file_reference: Vec<u8>,
    #[serde(default)]
    pub sizes: Vec<ThumbSize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(default)]
    pub access_hash: i64,
    #[serde(default)]
    pub file_reference: Vec<u8>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub thumbs: Vec<ThumbSize>,
    #[serde(default)]
    pub attributes: Vec<DocumentAttribute>,
}

impl Document {
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Declared duration in seconds, if the document carries a video attribute.
    pub fn video_duration(&self) -> Option<u32> {
        self.attributes.iter().find_map(|attr| match attr {
            DocumentAttribute::Video { duration, .. } => Some(*duration),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentAttribute {
    Video {
        duration: u32,
        #[serde(default)]
        w: u32,
        #[serde(default)]
        h: u32,
    },
    Filename {
        file_name: String,
    },
    #[serde(other)]
    Other,
}

/// A web page quoted by a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPage {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo: Option<Photo>,
    #[serde(default)]
    pub document: Option<Document>,
}

/// One preview size candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThumbSize {
    /// A downloadable size.
    Sized(PhotoSize),
    /// Tiny preview inlined in the message; nothing to download.
    Stripped { size_type: String },
    /// Preview whose bytes already came with the message.
    Cached { size_type: String },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    /// Source-side size code, echoed back when downloading.
    pub size_type: String,
    pub w: u32,
    pub h: u32,
    /// Byte size of the encoded preview.
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardHeader {
    /// Set when the original author is a channel.
    #[serde(default)]
    pub from_channel_id: Option<i64>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub date: Option<i64>,
}

/// Offset-based style annotation. Offsets and lengths are UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub offset: usize,
    pub length: usize,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(offset: usize, length: usize, kind: AnnotationKind) -> Self {
        Self {
            offset,
            length,
            kind,
        }
    }

    /// Exclusive end; saturates on malformed lengths.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationKind {
    Bold,
    Italic,
    Strike,
    /// Link with an explicit target.
    TextUrl { url: String },
    /// Link whose target is the annotated text itself.
    Url,
    #[serde(other)]
    Unsupported,
}

/// Remote location of a thumbnail that has not been fetched yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileLocation {
    Photo {
        id: i64,
        access_hash: i64,
        file_reference: Vec<u8>,
        thumb_size: String,
    },
    Document {
        id: i64,
        access_hash: i64,
        file_reference: Vec<u8>,
        thumb_size: String,
    },
}

impl FileLocation {
    pub fn for_photo(photo: &Photo, size: &PhotoSize) -> Self {
        FileLocation::Photo {
            id: photo.id,
            access_hash: photo.access_hash,
            file_reference: photo.file_reference.clone(),
            thumb_size: size.size_type.clone(),
        }
    }

    pub fn for_document(doc: &Document, size: &PhotoSize) -> Self {
        FileLocation::Document {
            id: doc.id,
            access_hash: doc.access_hash,
            file_reference: doc.file_reference.clone(),
            thumb_size: size.size_type.clone(),
        }
    }

    /// Remote object id; names the cache file.
    pub fn object_id(&self) -> i64 {
        match self {
            FileLocation::Photo { id, .. } | FileLocation::Document { id, .. } => *id,
        }
    }
}
