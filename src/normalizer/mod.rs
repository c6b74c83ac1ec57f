pub mod annotate;

use std::sync::Arc;

use chrono::DateTime;
use tracing::{debug, warn};

use crate::app::Result;
use crate::domain::{
    Attachment, Channel, ChannelCache, ChannelLookup, ChannelRef, Document, FileLocation, Item,
    LinkedPage, Media, Photo, RawMessage,
};
use crate::fetcher::{ChannelClient, RequestRetrier};
use crate::thumbnail::best_size;

/// Turns raw messages into [`Item`]s.
///
/// Thumbnails are only located here, not downloaded: each Media leaves with a
/// pending download so duplicates can be dropped before any bytes are fetched.
pub struct Assembler {
    client: Arc<dyn ChannelClient + Send + Sync>,
    retrier: Arc<RequestRetrier>,
}

impl Assembler {
    pub fn new(client: Arc<dyn ChannelClient + Send + Sync>, retrier: Arc<RequestRetrier>) -> Self {
        Self { client, retrier }
    }

    pub async fn assemble(
        &self,
        raw: &RawMessage,
        channel: &Channel,
        peer: &ChannelRef,
        cache: &mut ChannelCache,
    ) -> Item {
        let timestamp = DateTime::from_timestamp(raw.date, 0).unwrap_or_default();
        let mut item = Item::new(raw.id, timestamp);
        item.group_id = raw.grouped_id;
        item.channel = channel.clone();
        item.text = annotate::render(&raw.message, &raw.entities);

        debug!("message {}: attachment {}", raw.id, raw.media.kind());
        let (linked_page, media) = self.attachment_media(&raw.media);
        item.linked_page = linked_page;
        if let Some(mut media) = media {
            media.permalink = channel.permalink(raw.id);
            item.media.push(media);
        }

        item.forwarded_from = self.forward_source(raw, peer, cache).await;
        item
    }

    fn attachment_media(&self, attachment: &Attachment) -> (Option<LinkedPage>, Option<Media>) {
        match attachment {
            Attachment::None => (None, None),
            Attachment::Photo(photo) => (None, degrade(photo_media(photo))),
            Attachment::Document(doc) => (None, degrade(document_media(doc))),
            Attachment::LinkedPage(page) => {
                let linked = LinkedPage {
                    url: page.url.clone(),
                    title: page.title.clone().unwrap_or_default(),
                    description: page.description.clone().unwrap_or_default(),
                };
                // A quoted post carries its preview either as a document or a photo.
                let media = page
                    .document
                    .as_ref()
                    .and_then(|doc| degrade(document_media(doc)))
                    .or_else(|| page.photo.as_ref().and_then(|p| degrade(photo_media(p))));
                (Some(linked), media)
            }
        }
    }

    async fn forward_source(
        &self,
        raw: &RawMessage,
        peer: &ChannelRef,
        cache: &mut ChannelCache,
    ) -> Option<Channel> {
        let header = raw.fwd_from.as_ref()?;
        let Some(channel_id) = header.from_channel_id else {
            debug!("message {}: forwarded from a non-channel source", raw.id);
            return None;
        };

        if let Some(channel) = cache.get(channel_id) {
            return Some(channel.clone());
        }

        let lookup = ChannelLookup::ViaMessage {
            peer: *peer,
            message_id: raw.id,
            channel_id,
        };
        match self
            .retrier
            .execute(|| self.client.channel_info(&lookup))
            .await
        {
            Ok(channel) => {
                cache.insert(channel_id, channel.clone());
                Some(channel)
            }
            Err(e) => {
                warn!(
                    "Failed to resolve forward source {} of message {}: {}",
                    channel_id, raw.id, e
                );
                None
            }
        }
    }
}

fn degrade(media: Result<Media>) -> Option<Media> {
    match media {
        Ok(media) => Some(media),
        Err(e) => {
            warn!("Dropping attachment preview: {}", e);
            None
        }
    }
}

fn photo_media(photo: &Photo) -> Result<Media> {
    let size = best_size(&photo.sizes)?;
    Ok(Media {
        width: size.w,
        height: size.h,
        pending_download: Some(FileLocation::for_photo(photo, size)),
        ..Default::default()
    })
}

fn document_media(doc: &Document) -> Result<Media> {
    let size = best_size(&doc.thumbs)?;
    let is_video = doc.is_video();
    Ok(Media {
        is_video,
        width: size.w,
        height: size.h,
        duration: if is_video {
            doc.video_duration().map(format_duration)
        } else {
            None
        },
        pending_download: Some(FileLocation::for_document(doc, size)),
        ..Default::default()
    })
}

/// `MM:SS`; minutes keep counting past an hour.
pub fn format_duration(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
