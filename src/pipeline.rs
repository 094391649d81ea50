//! Fetch → parse → extract → reconcile → sort, plus the fallback boundary.
//!
//! [`fetch_releases`] and [`parse_releases`] propagate every failure as a
//! [`FetchError`]. [`latest_releases`] is the only place errors are
//! swallowed: it logs them and serves the configured fallback list instead.
use chrono::{NaiveDate, Utc};

use crate::config::Config;
use crate::feed::{extract_item, fetch_feed, xml, ExtractContext, FetchError, XmlValue};
use crate::reconcile::{reconcile, sort_releases};
use crate::release::{fallback_releases, Release};

/// Builds the sorted release list from raw feed text.
///
/// A pure function of its inputs: `today` stands in for items without a
/// usable publish date.
///
/// # Errors
///
/// - [`FetchError::Parse`] - The text is not well-formed XML
/// - [`FetchError::NoReleases`] - No item produced a release
pub fn parse_releases(
    feed: &str,
    config: &Config,
    today: NaiveDate,
) -> Result<Vec<Release>, FetchError> {
    let doc = xml::parse(feed)?;
    let items = doc
        .path(&["rss", "channel", "item"])
        .map(XmlValue::as_sequence)
        .unwrap_or_default();

    let ctx = ExtractContext {
        product: &config.product,
        architecture: &config.architecture,
        today,
    };

    let extracted: Vec<_> = items
        .iter()
        .filter_map(|item| extract_item(item, &ctx))
        .collect();

    let skipped = items.len() - extracted.len();
    if skipped > 0 {
        tracing::debug!(
            total = items.len(),
            skipped = skipped,
            "Feed items without a recognizable ISO, checksum or version skipped"
        );
    }

    let mut releases = reconcile(extracted);
    if releases.is_empty() {
        return Err(FetchError::NoReleases);
    }
    sort_releases(&mut releases);
    Ok(releases)
}

/// Fetches the feed once and builds the sorted release list.
///
/// # Errors
///
/// Any [`FetchError`] from retrieval, parsing, or an empty result.
pub async fn fetch_releases(
    client: &reqwest::Client,
    config: &Config,
    today: NaiveDate,
) -> Result<Vec<Release>, FetchError> {
    let feed = fetch_feed(client, config).await?;
    let releases = parse_releases(&feed, config, today)?;
    tracing::info!(
        url = %config.feed_url,
        releases = releases.len(),
        "Fetched releases from feed"
    );
    Ok(releases)
}

/// Returns the current release list, never failing.
///
/// On any error, or when the feed yields nothing usable, the configured
/// fallback list is returned instead. An empty configured fallback is
/// replaced by the built-in one so the result is never empty.
pub async fn latest_releases(client: &reqwest::Client, config: &Config) -> Vec<Release> {
    let today = Utc::now().date_naive();
    match fetch_releases(client, config, today).await {
        Ok(releases) => releases,
        Err(FetchError::NoReleases) => {
            tracing::warn!(
                url = %config.feed_url,
                "Feed returned no releases, using fallback data"
            );
            fallback(config)
        }
        Err(e) => {
            tracing::warn!(
                url = %config.feed_url,
                error = %e,
                "Failed to fetch or parse releases, using fallback data"
            );
            fallback(config)
        }
    }
}

fn fallback(config: &Config) -> Vec<Release> {
    if config.fallback.is_empty() {
        fallback_releases()
    } else {
        config.fallback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TWO_ITEM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:media="http://video.search.yahoo.com/mrss/">
  <channel>
    <title>PrismLinux</title>
    <item>
      <title><![CDATA[PrismLinux-Desktop-2025.10.01-x86_64.iso]]></title>
      <link>https://sourceforge.net/projects/prismlinux/files/Beta/2025.10.01/PrismLinux-Desktop-2025.10.01-x86_64.iso</link>
      <pubDate>Wed, 01 Oct 2025 10:00:00 UT</pubDate>
    </item>
    <item>
      <title><![CDATA[PrismLinux-Desktop-2025.10.01-x86_64.iso.sha256]]></title>
      <link>https://sourceforge.net/projects/prismlinux/files/Beta/2025.10.01/PrismLinux-Desktop-2025.10.01-x86_64.iso.sha256</link>
      <pubDate>Wed, 01 Oct 2025 10:00:00 UT</pubDate>
    </item>
  </channel>
</rss>"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 19).unwrap()
    }

    #[test]
    fn test_image_and_checksum_join() {
        let releases = parse_releases(TWO_ITEM_FEED, &Config::default(), today()).unwrap();
        assert_eq!(releases.len(), 1);

        let release = &releases[0];
        assert_eq!(release.version, "2025.10.01");
        assert_eq!(
            release.download_url,
            "https://sourceforge.net/projects/prismlinux/files/Beta/2025.10.01/PrismLinux-Desktop-2025.10.01-x86_64.iso/download"
        );
        assert_eq!(
            release.sha256_url.as_deref(),
            Some("https://sourceforge.net/projects/prismlinux/files/Beta/2025.10.01/PrismLinux-Desktop-2025.10.01-x86_64.iso.sha256/download")
        );
        assert_eq!(release.release_date.to_string(), "10/1/2025");
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let config = Config::default();
        assert_eq!(
            parse_releases(TWO_ITEM_FEED, &config, today()).unwrap(),
            parse_releases(TWO_ITEM_FEED, &config, today()).unwrap()
        );
    }

    #[test]
    fn test_unrecognized_only_feed_is_empty() {
        let feed = r#"<rss><channel>
            <item><title>randomfile.txt</title><link>https://sf.net/r</link></item>
        </channel></rss>"#;
        assert!(matches!(
            parse_releases(feed, &Config::default(), today()),
            Err(FetchError::NoReleases)
        ));
    }

    #[test]
    fn test_feed_without_items_is_empty() {
        let feed = r#"<rss version="2.0"><channel></channel></rss>"#;
        assert!(matches!(
            parse_releases(feed, &Config::default(), today()),
            Err(FetchError::NoReleases)
        ));
    }

    #[test]
    fn test_malformed_feed_is_parse_error() {
        assert!(matches!(
            parse_releases("<rss><channel>", &Config::default(), today()),
            Err(FetchError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_releases_from_feed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_ITEM_FEED))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config {
            feed_url: format!("{}/rss", mock_server.uri()),
            ..Config::default()
        };
        let client = reqwest::Client::new();

        let releases = latest_releases(&client, &config).await;
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].version, "2025.10.01");
        assert_ne!(releases, config.fallback);
    }

    #[tokio::test]
    async fn test_latest_releases_falls_back_on_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let config = Config {
            feed_url: format!("{}/rss", mock_server.uri()),
            ..Config::default()
        };
        let client = reqwest::Client::new();

        assert_eq!(latest_releases(&client, &config).await, fallback_releases());
    }

    #[tokio::test]
    async fn test_empty_configured_fallback_uses_builtin() {
        let config = Config {
            feed_url: "http://127.0.0.1:1/rss".to_string(),
            fallback: Vec::new(),
            ..Config::default()
        };
        let client = reqwest::Client::new();

        assert_eq!(latest_releases(&client, &config).await, fallback_releases());
    }
}
