//! Feed retrieval and item extraction for the release feed.
//!
//! This module turns the upstream syndication feed into extracted items:
//!
//! - **Fetching**: a single HTTP GET with identity headers and a body size limit
//! - **Parsing**: raw XML into a generic [`XmlValue`] tree
//! - **Extraction**: each item narrowed to an ISO image, a checksum, or nothing
//!
//! # Architecture
//!
//! - [`fetcher`] - HTTP retrieval and the pipeline's [`FetchError`]
//! - [`xml`] - Namespace-stripping XML tree builder on `quick-xml`
//! - [`item`] - Item classification and field extraction
//! - [`size`] - Byte-count formatting for ISO sizes
//!
//! # Example
//!
//! ```ignore
//! use prism_releases::feed::{extract_item, fetch_feed, xml};
//!
//! let text = fetch_feed(&client, &config).await?;
//! let doc = xml::parse(&text)?;
//! let items = doc.path(&["rss", "channel", "item"]);
//! ```

pub mod fetcher;
pub mod item;
pub mod size;
pub mod xml;

pub use fetcher::{build_client, fetch_feed, FetchError};
pub use item::{
    extract_item, ChecksumCandidate, ChecksumDescriptor, Edition, ExtractContext, Extracted,
    FeedItem, ImageCandidate, ImageEntry,
};
pub use size::{format_byte_count, format_bytes};
pub use xml::{XmlError, XmlValue};
