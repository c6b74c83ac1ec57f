use std::path::{Path, PathBuf};

use crate::app::{AppContext, GazetteError, Result};
use crate::config::Config;
use crate::domain::ChannelCache;

/// Command-line overrides for a collect run.
#[derive(Debug, Default)]
pub struct CollectOverrides {
    pub window: Option<String>,
    pub channels: Option<PathBuf>,
    pub dump_dir: Option<PathBuf>,
}

impl CollectOverrides {
    pub fn apply(self, config: &mut Config) {
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(channels) = self.channels {
            config.channels_file = Some(channels);
        }
        if let Some(dump_dir) = self.dump_dir {
            config.dump_dir = Some(dump_dir);
        }
    }
}

pub async fn collect(ctx: &AppContext, output: Option<&Path>) -> Result<()> {
    let handles = ctx.config.channel_handles()?;

    if handles.is_empty() {
        return Err(GazetteError::Config(
            "no channels configured; add `channels` or `channels_file`".into(),
        ));
    }

    eprintln!("Collecting {} channels...", handles.len());
    let items = ctx.collector.collect(&handles).await;
    let page = ctx.renderer.render(&items)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, page).await?;
            eprintln!("Wrote {} items to {}", items.len(), path.display());
        }
        None => print!("{}", page),
    }

    Ok(())
}

pub async fn resolve(ctx: &AppContext, handle: &str) -> Result<()> {
    let mut cache = ChannelCache::new();
    let (peer, channel) = ctx.collector.resolve_channel(handle, &mut cache).await?;

    println!("@{} ({})", channel.domain, channel.title);
    println!("  id: {}", peer.id);
    Ok(())
}
