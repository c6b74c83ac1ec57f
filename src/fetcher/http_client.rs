use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::app::{GazetteError, Result};
use crate::domain::{Channel, ChannelLookup, ChannelRef, FileLocation, RawMessage};
use crate::fetcher::ChannelClient;

/// [`ChannelClient`] backed by a JSON gateway in front of the messaging network.
pub struct HttpChannelClient {
    client: Client,
    base_url: Url,
}

impl HttpChannelClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| GazetteError::Config(format!("invalid gateway token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("gazette/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// `{base}/{dir}/{segment}` with `segment` percent-encoded as a single path segment.
    fn segment_endpoint(&self, dir: &str, segment: &str) -> Result<Url> {
        let mut url = self.base_url.join(dir)?;
        url.path_segments_mut()
            .map_err(|_| GazetteError::Config(format!("gateway url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = check_status(self.client.get(url).send().await?, None).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Pass successful responses through; turn anything else into an error.
///
/// `missing_handle` names the handle being resolved, so a 404 reads as an
/// unknown channel.
async fn check_status(response: Response, missing_handle: Option<&str>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &headers, &body, missing_handle))
}

/// Map a failed gateway status onto the crate's error vocabulary.
fn status_error(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    missing_handle: Option<&str>,
) -> GazetteError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 420 {
        return GazetteError::RateLimited {
            retry_after_secs: retry_after_secs(headers),
        };
    }

    match missing_handle {
        Some(handle) if status == StatusCode::NOT_FOUND => {
            GazetteError::ChannelNotFound(handle.to_string())
        }
        _ => GazetteError::Remote(format!("{}: {}", status, body.trim())),
    }
}

/// Seconds from `Retry-After`, 1 when absent or not a number.
fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1)
}

#[async_trait]
impl ChannelClient for HttpChannelClient {
    async fn resolve_handle(&self, handle: &str) -> Result<ChannelRef> {
        let url = self.segment_endpoint("resolve/", handle)?;
        let response = self.client.get(url).send().await?;
        let body = check_status(response, Some(handle)).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn channel_info(&self, lookup: &ChannelLookup) -> Result<Channel> {
        let url = match lookup {
            ChannelLookup::Direct(channel) => self.endpoint(
                &format!("channels/{}", channel.id),
                &[("access_hash", channel.access_hash.to_string())],
            )?,
            ChannelLookup::ViaMessage {
                peer,
                message_id,
                channel_id,
            } => self.endpoint(
                &format!("channels/{}", channel_id),
                &[
                    ("via", peer.id.to_string()),
                    ("via_hash", peer.access_hash.to_string()),
                    ("message_id", message_id.to_string()),
                ],
            )?,
        };
        self.get_json(url).await
    }

    async fn history_page(&self, channel: &ChannelRef, offset: usize) -> Result<Vec<RawMessage>> {
        let url = self.endpoint(
            &format!("channels/{}/history", channel.id),
            &[
                ("access_hash", channel.access_hash.to_string()),
                ("offset", offset.to_string()),
            ],
        )?;
        self.get_json(url).await
    }

    async fn download_thumbnail(&self, location: &FileLocation) -> Result<Vec<u8>> {
        let url = self.endpoint("thumbnails", &[])?;
        let body = serde_json::to_vec(location)?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let bytes = check_status(response, None).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpChannelClient {
        HttpChannelClient::new(base, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = client("http://localhost:8081/api");
        let url = client.endpoint("resolve/durov", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/api/resolve/durov");
    }

    #[test]
    fn test_endpoint_query() {
        let client = client("http://localhost:8081/");
        let url = client
            .endpoint(
                "channels/5/history",
                &[("access_hash", "-9".to_string()), ("offset", "20".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8081/channels/5/history?access_hash=-9&offset=20"
        );
    }

    #[test]
    fn test_handle_is_a_single_segment() {
        let client = client("http://localhost:8081/api/");
        let url = client.segment_endpoint("resolve/", "durov").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/api/resolve/durov");

        let url = client.segment_endpoint("resolve/", "../admin?x=1#y").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8081/api/resolve/..%2Fadmin%3Fx=1%23y"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    fn headers(retry_after: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = retry_after {
            headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_rate_limit_statuses_carry_retry_after() {
        for code in [429, 420] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = status_error(status, &headers(Some("7")), "", None);
            assert!(
                matches!(err, GazetteError::RateLimited { retry_after_secs: 7 }),
                "{}: {}",
                code,
                err
            );
        }
    }

    #[test]
    fn test_retry_after_defaults_to_one() {
        for value in [None, Some("soon"), Some("Wed, 21 Oct 2015 07:28:00 GMT")] {
            let err = status_error(StatusCode::TOO_MANY_REQUESTS, &headers(value), "", None);
            assert!(matches!(err, GazetteError::RateLimited { retry_after_secs: 1 }));
        }
    }

    #[test]
    fn test_rate_limit_reaches_retrier() {
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, &headers(Some("7")), "", None);
        assert_eq!(crate::fetcher::retry::rate_limit_hint(&err.to_string()), Some(7));
    }

    #[test]
    fn test_not_found_on_resolve() {
        let err = status_error(StatusCode::NOT_FOUND, &headers(None), "", Some("ghost"));
        assert!(matches!(err, GazetteError::ChannelNotFound(h) if h == "ghost"));

        // Elsewhere a 404 is an ordinary remote failure.
        let err = status_error(StatusCode::NOT_FOUND, &headers(None), "gone", None);
        assert!(matches!(err, GazetteError::Remote(_)));
    }

    #[test]
    fn test_server_error_keeps_body() {
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &headers(None),
            "  boom\n",
            None,
        );
        match err {
            GazetteError::Remote(message) => {
                assert_eq!(message, "500 Internal Server Error: boom")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpChannelClient::new("not a url", None, Duration::from_secs(5));
        assert!(matches!(result, Err(GazetteError::InvalidUrl(_))));
    }
}
