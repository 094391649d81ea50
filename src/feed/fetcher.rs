use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{ACCEPT, USER_AGENT};
use thiserror::Error;

use super::xml::XmlError;
use crate::config::Config;

const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml, */*";

/// Errors that can occur while producing the release list.
///
/// These cover the full pipeline: network issues, HTTP errors, malformed
/// feeds, and feeds that parse but describe no usable release.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: {status} {reason}")]
    HttpStatus { status: u16, reason: String },
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Feed text is not well-formed XML
    #[error("Parse error: {0}")]
    Parse(#[from] XmlError),
    /// Feed parsed but yielded no release
    #[error("Feed contained no usable releases")]
    NoReleases,
}

/// Builds the HTTP client used for feed retrieval.
///
/// The configured timeout is the transport's default for every request; the
/// pipeline itself enforces no further deadline.
pub fn build_client(config: &Config) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    Ok(client)
}

/// Retrieves the raw feed text from `config.feed_url`.
///
/// Makes exactly one attempt. Retrying, if wanted, belongs to the caller.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection, DNS, TLS errors or timeout
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::ResponseTooLarge`] - Body exceeded `max_feed_bytes`
/// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
pub async fn fetch_feed(client: &reqwest::Client, config: &Config) -> Result<String, FetchError> {
    tracing::debug!(url = %config.feed_url, "Fetching release feed");

    let response = client
        .get(&config.feed_url)
        .header(USER_AGENT, config.user_agent.as_str())
        .header(ACCEPT, FEED_ACCEPT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let bytes = read_limited_bytes(response, config.max_feed_bytes).await?;
    tracing::debug!(bytes = bytes.len(), "Release feed downloaded");

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>PrismLinux-2025.10.01.iso</title><link>https://sf.net/a</link></item>
</channel></rss>"#;

    fn config_for(server: &MockServer) -> Config {
        Config {
            feed_url: format!("{}/rss", server.uri()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_success_sends_identity_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .and(header("User-Agent", "PrismLinux-Website/1.0"))
            .and(header_exists("Accept"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config_for(&mock_server);
        let client = reqwest::Client::new();

        let body = fetch_feed(&client, &config).await.unwrap();
        assert_eq!(body, VALID_RSS);

        let requests = mock_server.received_requests().await.unwrap();
        let accept = requests[0].headers.get("accept").unwrap();
        assert_eq!(accept.to_str().unwrap(), FEED_ACCEPT);
    }

    #[tokio::test]
    async fn test_fetch_404_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let config = config_for(&mock_server);
        let client = reqwest::Client::new();

        match fetch_feed(&client, &config).await.unwrap_err() {
            FetchError::HttpStatus { status, reason } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
            }
            e => panic!("Expected HttpStatus(404), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config_for(&mock_server);
        let client = reqwest::Client::new();

        let err = fetch_feed(&client, &config).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 500, .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&mock_server)
            .await;

        let config = Config {
            max_feed_bytes: 1024,
            ..config_for(&mock_server)
        };
        let client = reqwest::Client::new();

        assert!(matches!(
            fetch_feed(&client, &config).await,
            Err(FetchError::ResponseTooLarge)
        ));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on port 1
        let config = Config {
            feed_url: "http://127.0.0.1:1/rss".to_string(),
            ..Config::default()
        };
        let client = reqwest::Client::new();

        assert!(matches!(
            fetch_feed(&client, &config).await,
            Err(FetchError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_build_client_from_default_config() {
        assert!(build_client(&Config::default()).is_ok());
    }
}
