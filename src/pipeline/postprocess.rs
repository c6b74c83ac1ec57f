//! Whole-run passes over the merged item list.

use std::collections::HashSet;

use crate::domain::Item;

/// Byte length of the text prefix used as a duplicate key.
pub const FINGERPRINT_BYTES: usize = 40;

/// The first [`FINGERPRINT_BYTES`] bytes of the text.
///
/// A forward whose quoted text was edited near the start will not match its
/// original.
pub fn fingerprint(text: &str) -> &[u8] {
    let bytes = text.as_bytes();
    &bytes[..bytes.len().min(FINGERPRINT_BYTES)]
}

pub fn sort_by_time(items: &mut [Item]) {
    items.sort_by_key(|item| item.timestamp);
}

/// Drop items whose fingerprint was already seen, keeping the first.
///
/// Run on a time-sorted list, this keeps the original post and drops later
/// cross-posts. Items without text never mark their fingerprint as seen.
pub fn dedup(items: Vec<Item>) -> Vec<Item> {
    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());

    for item in items {
        let key = fingerprint(&item.text);
        if seen.contains(key) {
            continue;
        }
        if !item.text.is_empty() {
            seen.insert(key.to_vec());
        }
        unique.push(item);
    }

    unique
}

/// Merge items sharing a non-zero group id into one album.
///
/// Each merged item's media is appended to the album; the album adopts the
/// first non-empty text it meets. Items with group id 0 always stand alone.
/// Output is ordered by group id; callers restore time order.
pub fn group_albums(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by_key(|item| item.group_id);

    let mut groups: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
        match groups.last_mut() {
            Some(last) if item.group_id != 0 && last.group_id == item.group_id => {
                last.media.extend(item.media);
                if last.text.is_empty() {
                    last.text = item.text;
                }
            }
            _ => groups.push(item),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::domain::{Channel, Media};

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    fn item(id: i64, ts: i64, text: &str) -> Item {
        let mut item = Item::new(id, at(ts));
        item.text = text.to_string();
        item
    }

    fn album_item(id: i64, ts: i64, group_id: i64, text: &str, media: usize) -> Item {
        let mut item = item(id, ts, text);
        item.group_id = group_id;
        item.media = (0..media).map(|_| Media::default()).collect();
        item
    }

    fn texts(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn test_fingerprint_truncates_bytes() {
        assert_eq!(fingerprint("short"), b"short");
        let long = "x".repeat(100);
        assert_eq!(fingerprint(&long).len(), FINGERPRINT_BYTES);
        // Cuts inside a multi-byte character without panicking.
        let cyrillic = "я".repeat(30);
        assert_eq!(fingerprint(&cyrillic).len(), FINGERPRINT_BYTES);
    }

    #[test]
    fn test_dedup_scenario() {
        let items = vec![
            item(1, 1, "foo"),
            item(2, 2, "bar"),
            item(3, 3, "foo"),
            item(4, 4, ""),
            item(5, 5, ""),
        ];
        let unique = dedup(items);
        assert_eq!(unique.len(), 4);
        assert_eq!(texts(&unique), vec!["foo", "bar", "", ""]);
    }

    #[test]
    fn test_dedup_favors_earliest() {
        let prefix = "A long announcement that is shared across channels";
        let mut items = vec![
            item(20, 200, &format!("{} (relayed)", prefix)),
            item(10, 100, prefix),
        ];
        sort_by_time(&mut items);
        let unique = dedup(items);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].message_id, 10);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let items = vec![
            item(1, 1, "alpha"),
            item(2, 2, "alpha"),
            item(3, 3, ""),
            item(4, 4, "beta"),
            item(5, 5, ""),
            item(6, 6, "beta"),
        ];
        let once = dedup(items);
        let once_ids: Vec<i64> = once.iter().map(|i| i.message_id).collect();
        let twice = dedup(once);
        let twice_ids: Vec<i64> = twice.iter().map(|i| i.message_id).collect();
        assert_eq!(once_ids, twice_ids);
        assert_eq!(once_ids, vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_empty_texts_never_collide() {
        let items: Vec<Item> = (0..10).map(|i| item(i, i, "")).collect();
        assert_eq!(dedup(items).len(), 10);
    }

    #[test]
    fn test_group_merges_album() {
        let items = vec![
            album_item(1, 10, 77, "", 1),
            album_item(2, 10, 77, "caption", 1),
            album_item(3, 11, 77, "ignored", 1),
        ];
        let groups = group_albums(items);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].message_id, 1);
        assert_eq!(groups[0].text, "caption");
        assert_eq!(groups[0].media.len(), 3);
    }

    #[test]
    fn test_group_zero_items_stay_single() {
        let items = vec![
            album_item(1, 1, 0, "a", 1),
            album_item(2, 2, 0, "", 1),
            album_item(3, 3, 0, "c", 2),
        ];
        let groups = group_albums(items);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.media.len() <= 2));
        assert_eq!(groups[1].text, "");
    }

    #[test]
    fn test_group_preserves_media_count() {
        let items = vec![
            album_item(1, 1, 5, "", 1),
            album_item(2, 2, 0, "x", 2),
            album_item(3, 3, 9, "y", 1),
            album_item(4, 4, 5, "z", 3),
            album_item(5, 5, 0, "", 0),
            album_item(6, 6, 9, "", 1),
        ];
        let before: usize = items.iter().map(|i| i.media.len()).sum();
        let groups = group_albums(items);
        let after: usize = groups.iter().map(|i| i.media.len()).sum();
        assert_eq!(before, after);
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn test_group_distinct_ids_not_merged() {
        let mut first = album_item(1, 1, 42, "one", 1);
        first.channel = Channel::new("a", "A");
        let mut second = album_item(2, 2, 43, "two", 1);
        second.channel = Channel::new("a", "A");
        let groups = group_albums(vec![second, first]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, 42);
    }
}
