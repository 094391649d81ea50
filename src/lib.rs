//! # prism-releases
//!
//! Release feed ingestion for the PrismLinux download pages.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → XML tree → Classifier/Extractor → Reconciler → Sorter
//!                 (wrapped by the fallback boundary)
//! ```
//!
//! - [`feed`]: HTTP retrieval, XML tree parsing, item extraction
//! - [`reconcile`]: joining ISOs with their checksums, release ordering
//! - [`pipeline`]: the end-to-end operation and its fallback boundary
//! - [`release`]: the caller-facing [`Release`] record and fallback list
//! - [`config`]: TOML configuration passed into the pipeline
//!
//! ## Example
//!
//! ```ignore
//! use prism_releases::{build_client, latest_releases, Config};
//!
//! let config = Config::default();
//! let client = build_client(&config)?;
//! let releases = latest_releases(&client, &config).await; // never empty
//! ```

pub mod config;
pub mod feed;
pub mod pipeline;
pub mod reconcile;
pub mod release;

pub use config::{Config, ConfigError};
pub use feed::{build_client, FetchError};
pub use pipeline::{fetch_releases, latest_releases, parse_releases};
pub use release::{fallback_releases, Release, ReleaseChannels, ReleaseDate, ReleaseType};
