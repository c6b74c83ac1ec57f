use thiserror::Error;

#[derive(Error, Debug)]
pub enum GazetteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The display text is what [`RequestRetrier`](crate::fetcher::retry::RequestRetrier) matches on.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<GazetteError>,
    },

    #[error("unable to find a suitable thumbnail size")]
    NoSuitableSize,

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GazetteError>;

impl From<crate::config::ConfigError> for GazetteError {
    fn from(err: crate::config::ConfigError) -> Self {
        GazetteError::Config(err.to_string())
    }
}
