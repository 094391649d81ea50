//! The caller-facing release record and the static fallback list.
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Release channel inferred from an ISO's filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Stable,
    Beta,
    Alpha,
}

impl ReleaseType {
    /// Infers the channel from a title: "beta" wins over "alpha", and
    /// anything else is stable. Matching is case-insensitive.
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        if lower.contains("beta") {
            ReleaseType::Beta
        } else if lower.contains("alpha") {
            ReleaseType::Alpha
        } else {
            ReleaseType::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Stable => "stable",
            ReleaseType::Beta => "beta",
            ReleaseType::Alpha => "alpha",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar day a release was published.
///
/// Serialized the way the download page displays it (`M/D/YYYY`), while
/// ordering compares the underlying date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseDate(pub NaiveDate);

impl ReleaseDate {
    const DISPLAY_FORMAT: &'static str = "%-m/%-d/%Y";

    /// Parses either the display format or an ISO `YYYY-MM-DD` date.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%m/%d/%Y")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()
            .map(ReleaseDate)
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::DISPLAY_FORMAT))
    }
}

impl Serialize for ReleaseDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReleaseDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ReleaseDate::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid release date: {raw}")))
    }
}

/// One downloadable ISO as shown on the download page.
///
/// Every release built from the feed has a version and an absolute download
/// URL; `sha256_url` is only set when the same fetch carried a checksum
/// entry for the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,
    pub version: String,
    pub size: String,
    pub download_url: String,
    pub release_date: ReleaseDate,
    pub architecture: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_url: Option<String>,
}

/// Hand-maintained releases served whenever the live feed is unusable.
///
/// Bump this alongside each published ISO.
pub fn fallback_releases() -> Vec<Release> {
    vec![Release {
        name: "PrismLinux Desktop".to_string(),
        version: "2025.10.01".to_string(),
        size: "2.4 GB".to_string(),
        download_url: "https://sourceforge.net/projects/prismlinux/files/Beta/2025.10.01/PrismLinux-2025.10.01-x86_64.iso/download".to_string(),
        release_date: ReleaseDate(
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or_default(),
        ),
        architecture: "x86_64".to_string(),
        release_type: ReleaseType::Beta,
        sha256_url: Some(
            "https://sourceforge.net/projects/prismlinux/files/Beta/2025.10.01/PrismLinux-2025.10.01-x86_64.iso.sha256/download".to_string(),
        ),
    }]
}

/// Releases split into the download page's channel tabs.
///
/// Each channel keeps the order of the list it was built from, so a sorted
/// input gives newest-first channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseChannels {
    pub stable: Vec<Release>,
    pub beta: Vec<Release>,
    pub alpha: Vec<Release>,
}

impl ReleaseChannels {
    pub fn from_releases(releases: &[Release]) -> Self {
        let mut channels = Self::default();
        for release in releases {
            let channel = match release.release_type {
                ReleaseType::Stable => &mut channels.stable,
                ReleaseType::Beta => &mut channels.beta,
                ReleaseType::Alpha => &mut channels.alpha,
            };
            channel.push(release.clone());
        }
        channels
    }

    /// The first release of each non-empty channel, stable first.
    pub fn latest(&self) -> Vec<&Release> {
        [&self.stable, &self.beta, &self.alpha]
            .into_iter()
            .filter_map(|channel| channel.first())
            .collect()
    }
}
