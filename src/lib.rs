//! # Gazette
//!
//! Collects the recent posts of a list of public broadcast channels into one
//! chronological, deduplicated HTML digest.
//!
//! ## Architecture
//!
//! Gazette follows a modular pipeline architecture:
//!
//! ```text
//! Fetcher → Normalizer → Pipeline (dedup, thumbnails, albums) → Render
//! ```
//!
//! - [`fetcher`]: channel client, rate-limit retrier and history pagination
//! - [`normalizer`]: turns raw messages into display-ready items
//! - [`pipeline`]: whole-run ordering, deduplication and album grouping
//! - [`render`]: the HTML page
//!
//! ## Quick Start
//!
//! ```bash
//! # Collect the last day into a page
//! gazette collect --output digest.html
//!
//! # Read a shorter window from a channel list
//! gazette collect --window 6h --channels channels.txt > digest.html
//!
//! # Check that a handle resolves
//! gazette resolve rustlang
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the channel client,
/// retrier and collector together from a [`Config`](config::Config).
pub mod app;

/// Command-line interface using clap.
///
/// - `collect` - Collect recent posts and render the digest
/// - `resolve <handle>` - Resolve one channel handle
pub mod cli;

/// Configuration loaded from `~/.config/gazette/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`RawMessage`](domain::RawMessage): a post as the remote source returns it
/// - [`Item`](domain::Item): a normalized, display-ready post
/// - [`Channel`](domain::Channel) and [`ChannelCache`](domain::ChannelCache)
pub mod domain;

/// Remote access.
///
/// - [`ChannelClient`](fetcher::ChannelClient): Async trait for the remote source
/// - [`HttpChannelClient`](fetcher::HttpChannelClient): reqwest-based gateway client
/// - [`RequestRetrier`](fetcher::RequestRetrier): rate-limit aware retry wrapper
/// - [`HistoryPaginator`](fetcher::HistoryPaginator): newest-first history walk
pub mod fetcher;

/// Message normalization and annotation markup.
pub mod normalizer;

/// Whole-run collection.
pub mod pipeline;

/// HTML digest output.
pub mod render;

/// Thumbnail selection and the on-disk cache.
pub mod thumbnail;
