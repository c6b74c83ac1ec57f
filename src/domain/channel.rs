use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Display identity of a message source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Public handle, empty for channels without one.
    #[serde(default)]
    pub domain: String,
    pub title: String,
}

impl Channel {
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            title: title.into(),
        }
    }

    /// Deep link to a single post in this channel.
    pub fn permalink(&self, message_id: i64) -> String {
        format!("tg://resolve?domain={}&post={}", self.domain, message_id)
    }
}

/// Source-internal address of a channel, as returned by handle resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: i64,
    #[serde(default)]
    pub access_hash: i64,
}

/// How to ask the source for a channel's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLookup {
    /// A channel we hold a reference for.
    Direct(ChannelRef),
    /// A channel only known by id, reachable through a message that forwards from it.
    ViaMessage {
        peer: ChannelRef,
        message_id: i64,
        channel_id: i64,
    },
}

impl ChannelLookup {
    pub fn channel_id(&self) -> i64 {
        match self {
            ChannelLookup::Direct(channel) => channel.id,
            ChannelLookup::ViaMessage { channel_id, .. } => *channel_id,
        }
    }
}

/// Channels resolved during one run, keyed by internal id.
#[derive(Debug, Default)]
pub struct ChannelCache {
    channels: HashMap<i64, Channel>,
}

impl ChannelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn insert(&mut self, id: i64, channel: Channel) {
        self.channels.insert(id, channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permalink() {
        let channel = Channel::new("durov", "Durov's Channel");
        assert_eq!(channel.permalink(42), "tg://resolve?domain=durov&post=42");
    }

    #[test]
    fn test_cache_roundtrip() {
        let mut cache = ChannelCache::new();
        assert!(cache.get(7).is_none());
        cache.insert(7, Channel::new("news", "News"));
        assert_eq!(cache.get(7).map(|c| c.title.as_str()), Some("News"));
        assert!(cache.get(8).is_none());
    }

    #[test]
    fn test_lookup_channel_id() {
        let peer = ChannelRef { id: 1, access_hash: 2 };
        assert_eq!(ChannelLookup::Direct(peer).channel_id(), 1);
        let via = ChannelLookup::ViaMessage {
            peer,
            message_id: 10,
            channel_id: 99,
        };
        assert_eq!(via.channel_id(), 99);
    }
}
