//! Source parsers that turn fetched markup into [`Hackathon`] records.
//!
//! Every parser implements [`SourceParser`]: it takes a whole document and
//! returns the records it could extract. Parsing never fails as a whole; a
//! record missing a required field is logged and skipped so its siblings
//! still come through.
//!
//! # Supported Sources
//!
//! | Source | Parser | Method | Notes |
//! |--------|--------|--------|-------|
//! | MLH | [`mlh::MlhParser`] | HTML scraping | Stops at the "Past Events" heading |
//! | HackerEarth | [`structured::StructuredDataParser`] | JSON-LD `Event` blocks | Preferred |
//! | HackerEarth | [`hackerearth::HackerEarthHtmlParser`] | HTML scraping | Fallback when no JSON-LD events |

pub mod hackerearth;
pub mod mlh;
pub mod structured;

use crate::error::ParseFieldError;
use crate::models::{Hackathon, Source};
use crate::normalize::{RawHackathon, normalize};
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};
use url::Url;

/// Extracts hackathon records from one kind of document.
pub trait SourceParser: Send + Sync {
    /// Site the records are attributed to.
    fn source(&self) -> Source;

    /// Short parser name used in logs.
    fn name(&self) -> &'static str;

    /// Extract every record the document yields, in document order.
    fn parse(&self, document: &str) -> Vec<Hackathon>;
}

/// Compile a selector literal.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("selector literal must be valid CSS")
}

/// Element text with runs of whitespace collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapsed text of the first descendant matching `selector`, if non-empty.
pub(crate) fn select_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Attribute value of the first descendant matching `selector`.
pub(crate) fn select_attr(
    element: ElementRef<'_>,
    selector: &Selector,
    attr: &str,
) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Prefix the origin of `base` onto `href` unless it is already absolute.
pub(crate) fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let rooted = if href.starts_with('/') {
        href.to_string()
    } else {
        format!("/{href}")
    };
    base.join(&rooted).ok().map(|u| u.to_string())
}

/// Normalize raw extraction results, logging and dropping failures.
pub(crate) fn finish(
    source: Source,
    parser: &'static str,
    raws: impl IntoIterator<Item = Result<RawHackathon, ParseFieldError>>,
) -> Vec<Hackathon> {
    let mut dropped = 0usize;
    let records: Vec<Hackathon> = raws
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match raw.and_then(|r| normalize(r, source)) {
            Ok(h) => Some(h),
            Err(e) => {
                dropped += 1;
                warn!(parser, index, error = %e, "Dropping record");
                None
            }
        })
        .collect();
    debug!(parser, kept = records.len(), dropped, "Parsed document");
    records
}
