use std::sync::Arc;
use std::time::Duration;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_client::HttpChannelClient;
use crate::fetcher::{ChannelClient, RequestRetrier};
use crate::pipeline::{Collector, CollectorOptions};
use crate::render::PageRenderer;

pub struct AppContext {
    pub config: Config,
    pub collector: Collector,
    pub renderer: PageRenderer,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let gateway = &config.gateway;
        let client: Arc<dyn ChannelClient + Send + Sync> = Arc::new(HttpChannelClient::new(
            &gateway.base_url,
            gateway.token.as_deref(),
            Duration::from_secs(gateway.timeout_secs),
        )?);
        Self::with_client(config, client)
    }

    /// Wire the pipeline around an already constructed client.
    pub fn with_client(config: Config, client: Arc<dyn ChannelClient + Send + Sync>) -> Result<Self> {
        let retrier = Arc::new(RequestRetrier::new(config.retry.max_attempts));
        let options = CollectorOptions {
            window: config.window()?,
            cache_dir: config.cache_dir()?,
            dump_dir: config.dump_dir.clone(),
            embed_thumbnails: config.embed_thumbnails,
        };
        let collector = Collector::new(client, retrier, options);

        Ok(Self {
            config,
            collector,
            renderer: PageRenderer::new()?,
        })
    }
}
