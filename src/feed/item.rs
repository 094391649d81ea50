//! Classification and field extraction for individual feed items.
//!
//! Items are narrowed in two steps. [`FeedItem::classify`] looks only at the
//! title suffix and pulls the raw fields each kind needs out of the generic
//! tree; the candidate's `extract` method then builds the normalized record
//! or declines when the item turns out to be unusable.
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use url::Url;

use super::size::format_bytes;
use super::xml::XmlValue;
use crate::release::{Release, ReleaseDate, ReleaseType};

const IMAGE_SUFFIX: &str = ".iso";
const CHECKSUM_SUFFIX: &str = ".iso.sha256";
const DOWNLOAD_SUFFIX: &str = "/download";

/// Date-style version token such as `2025.10.01`.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}(?:\.[0-9]{1,2}){2}").unwrap());

/// Edition keywords, matched against the lowercased title.
static EDITION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"desktop|minimal|server").unwrap());

/// Known ISO editions with the size quoted when the feed carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Desktop,
    Minimal,
    Server,
}

impl Edition {
    /// Finds the first edition keyword in `title`, defaulting to desktop.
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        match EDITION_PATTERN.find(&lower).map(|m| m.as_str()) {
            Some("minimal") => Edition::Minimal,
            Some("server") => Edition::Server,
            _ => Edition::Desktop,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Edition::Desktop => "Desktop",
            Edition::Minimal => "Minimal",
            Edition::Server => "Server",
        }
    }

    pub fn estimated_size(&self) -> &'static str {
        match self {
            Edition::Desktop => "2.6 GB",
            Edition::Minimal => "1.2 GB",
            Edition::Server => "1.8 GB",
        }
    }
}

/// Feed-wide values stamped onto every release.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Product name prefixed to the edition label.
    pub product: &'a str,
    /// Target architecture of every ISO in the feed.
    pub architecture: &'a str,
    /// Date used when an item has no usable publish timestamp.
    pub today: NaiveDate,
}

/// A feed item whose title names an ISO image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub declared_size: Option<String>,
}

/// A feed item whose title names an ISO's checksum file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumCandidate {
    pub title: String,
    pub link: String,
}

/// First narrowing of a raw feed item, decided by title suffix alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    Image(ImageCandidate),
    Checksum(ChecksumCandidate),
    Unrecognized,
}

/// Join key and URL of a checksum file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumDescriptor {
    pub base_name: String,
    pub checksum_url: String,
}

/// A release built from an image item, not yet paired with a checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub base_name: String,
    pub release: Release,
}

/// Outcome of a recognized, usable feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Image(ImageEntry),
    Checksum(ChecksumDescriptor),
}

impl FeedItem {
    pub fn classify(item: &XmlValue) -> Self {
        let title = child_text(item, "title").unwrap_or_default().to_string();
        let link = child_text(item, "link").unwrap_or_default().to_string();
        let lower = title.to_lowercase();

        if lower.ends_with(CHECKSUM_SUFFIX) {
            FeedItem::Checksum(ChecksumCandidate { title, link })
        } else if lower.ends_with(IMAGE_SUFFIX) {
            FeedItem::Image(ImageCandidate {
                title,
                link,
                published: child_text(item, "pubDate")
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                declared_size: declared_size(item).map(str::to_string),
            })
        } else {
            FeedItem::Unrecognized
        }
    }
}

impl ImageCandidate {
    /// Builds the release, or `None` when the title has no version token or
    /// the link is not an absolute http(s) URL.
    pub fn extract(&self, ctx: &ExtractContext<'_>) -> Option<ImageEntry> {
        let version = extract_version(&self.title)?;
        let download_url = normalize_download_url(&self.link)?;

        let edition = Edition::from_title(&self.title);
        let release_type = ReleaseType::from_title(&self.title);
        let size = match &self.declared_size {
            Some(raw) => format_bytes(raw),
            None => edition.estimated_size().to_string(),
        };
        let release_date = self
            .published
            .as_deref()
            .and_then(parse_pub_date)
            .unwrap_or(ctx.today);

        tracing::trace!(
            version = version,
            edition = edition.label(),
            release_type = %release_type,
            "Extracted image entry"
        );

        Some(ImageEntry {
            base_name: image_base_name(&self.title),
            release: Release {
                name: format!("{} {}", ctx.product, edition.label()),
                version: version.to_string(),
                size,
                download_url,
                release_date: ReleaseDate(release_date),
                architecture: ctx.architecture.to_string(),
                release_type,
                sha256_url: None,
            },
        })
    }
}

impl ChecksumCandidate {
    pub fn extract(&self) -> Option<ChecksumDescriptor> {
        Some(ChecksumDescriptor {
            base_name: checksum_base_name(&self.title),
            checksum_url: normalize_download_url(&self.link)?,
        })
    }
}

/// Classifies and extracts one raw feed item.
///
/// Returns `None` for items that are neither an ISO nor its checksum, and
/// for recognized items missing a version token or a usable link.
pub fn extract_item(item: &XmlValue, ctx: &ExtractContext<'_>) -> Option<Extracted> {
    match FeedItem::classify(item) {
        FeedItem::Image(candidate) => candidate.extract(ctx).map(Extracted::Image),
        FeedItem::Checksum(candidate) => candidate.extract().map(Extracted::Checksum),
        FeedItem::Unrecognized => None,
    }
}

/// Returns the first date-style version token in `title`.
pub fn extract_version(title: &str) -> Option<&str> {
    VERSION_PATTERN.find(title).map(|m| m.as_str())
}

/// Join key of an image item: the title up to its first parenthesis.
pub fn image_base_name(title: &str) -> String {
    title.split('(').next().unwrap_or_default().trim().to_string()
}

/// Join key of a checksum item: the title without its `.sha256` marker.
pub fn checksum_base_name(title: &str) -> String {
    title.replacen(".sha256", "", 1)
}

/// Ensures `link` is an absolute http(s) URL ending in the retrieval suffix.
pub fn normalize_download_url(link: &str) -> Option<String> {
    let link = link.trim();
    let url = Url::parse(link).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if link.ends_with(DOWNLOAD_SUFFIX) {
        Some(link.to_string())
    } else {
        Some(format!("{link}{DOWNLOAD_SUFFIX}"))
    }
}

/// Parses an RSS (RFC 2822) or Atom (RFC 3339) timestamp to its UTC day.
pub fn parse_pub_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

fn child_text<'a>(item: &'a XmlValue, key: &str) -> Option<&'a str> {
    item.get(key).and_then(XmlValue::text)
}

/// Probes the places upstream has been seen to put an ISO's byte count.
fn declared_size(item: &XmlValue) -> Option<&str> {
    [
        item.get("content").and_then(|c| c.attribute("filesize")),
        item.attribute("filesize"),
        child_text(item, "filesize"),
        child_text(item, "size"),
        item.get("enclosure").and_then(|e| e.attribute("length")),
    ]
    .into_iter()
    .flatten()
    .find(|value| !value.is_empty())
}
