//! Joining image entries with their checksums, and ordering the result.
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::feed::Extracted;
use crate::release::Release;

/// Pairs every image entry with the checksum sharing its base name.
///
/// Image entries are kept in first-seen order of their base name. When the
/// same base name appears more than once, the later entry replaces the
/// earlier one's release but not its position. Checksums follow the same
/// last-wins rule. Releases without a matching checksum keep
/// `sha256_url == None`.
pub fn reconcile<I>(items: I) -> Vec<Release>
where
    I: IntoIterator<Item = Extracted>,
{
    let mut images: Vec<Release> = Vec::new();
    let mut image_index: HashMap<String, usize> = HashMap::new();
    let mut checksums: HashMap<String, String> = HashMap::new();

    for item in items {
        match item {
            Extracted::Image(entry) => match image_index.get(&entry.base_name).copied() {
                Some(idx) => {
                    tracing::debug!(
                        base_name = %entry.base_name,
                        "Duplicate image entry, keeping the later one"
                    );
                    images[idx] = entry.release;
                }
                None => {
                    image_index.insert(entry.base_name, images.len());
                    images.push(entry.release);
                }
            },
            Extracted::Checksum(descriptor) => {
                checksums.insert(descriptor.base_name, descriptor.checksum_url);
            }
        }
    }

    let mut matched = 0usize;
    for (base_name, idx) in &image_index {
        if let Some(url) = checksums.get(base_name) {
            images[*idx].sha256_url = Some(url.clone());
            matched += 1;
        }
    }

    tracing::debug!(
        images = images.len(),
        checksums = checksums.len(),
        matched = matched,
        "Reconciled feed entries"
    );

    images
}

/// Orders releases newest first.
///
/// Releases on the same day are ordered by version, highest first, comparing
/// digit runs numerically so `2025.10.2` ranks above `2025.9.30`. The sort is
/// stable, so fully equal releases keep their input order.
pub fn sort_releases(releases: &mut [Release]) {
    releases.sort_by(|a, b| {
        b.release_date
            .cmp(&a.release_date)
            .then_with(|| compare_versions(&b.version, &a.version))
    });
}

/// Natural-order string comparison: digit runs compare by numeric value,
/// everything else case-insensitively, with a plain byte comparison as the
/// final tie-break.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => compare_numeric(x, y),
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
            (Some(Chunk::Text(x)), Some(Chunk::Text(y))) => x
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(y.chars().flat_map(char::to_lowercase)),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Compares two ASCII digit runs by value without overflowing.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Splits a string into alternating digit and non-digit runs.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}
