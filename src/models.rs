//! Data models for scraped hackathons and the persisted cache snapshot.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Source`]: The sites listings are scraped from
//! - [`Hackathon`]: The unified record every parser emits
//! - [`CacheSnapshot`]: The on-disk layout of the cache file
//!
//! Field names are snake_case on the wire as well, so API consumers and the
//! cache file see exactly the struct field names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A site hackathon listings are scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Major League Hacking season listing.
    Mlh,
    /// HackerEarth hackathon challenges.
    HackerEarth,
}

impl Source {
    /// Display name stored in [`Hackathon::source`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Mlh => "MLH",
            Source::HackerEarth => "HackerEarth",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hackathon listing in the unified schema shared by all sources.
///
/// `name`, `event_url` and `source` are always non-empty; the normalizer
/// drops records that cannot provide them. The three trailing fields are only
/// filled in by the structured-data parser and are omitted from JSON when
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hackathon {
    /// Event title.
    pub name: String,
    /// Display date text, exactly as the source renders it.
    pub date: String,
    /// Human readable location, e.g. `"Austin, TX"`.
    pub location: String,
    /// `"In-Person"`, `"Hybrid"`, `"Digital Only"` or the source's own wording.
    pub event_type: String,
    /// Banner image URL.
    pub background_image: Option<String>,
    /// Logo image URL.
    pub logo_image: Option<String>,
    /// Absolute URL of the event page.
    pub event_url: String,
    /// Whether the source flags this as a diversity event.
    pub is_diversity_event: bool,
    /// Diversity sub-type label, empty when not applicable.
    pub diversity_type: String,
    /// Display name of the originating [`Source`].
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Hackathon {
    /// Case-insensitive match against a source display name.
    pub fn is_from(&self, source_name: &str) -> bool {
        self.source.eq_ignore_ascii_case(source_name.trim())
    }
}

/// The persisted cache file.
///
/// `timestamp` is the capture instant as fractional unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub timestamp: f64,
    pub data: Vec<Hackathon>,
}

#[cfg(test)]
pub(crate) fn sample_hackathon(name: &str, source: Source) -> Hackathon {
    Hackathon {
        name: name.to_string(),
        date: "Jan 1st - 2nd".to_string(),
        location: "Online, Worldwide".to_string(),
        event_type: "Digital Only".to_string(),
        background_image: None,
        logo_image: None,
        event_url: format!("https://example.com/{}", name.to_lowercase().replace(' ', "-")),
        is_diversity_event: false,
        diversity_type: String::new(),
        source: source.as_str().to_string(),
        description: None,
        start_date: None,
        end_date: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_display_names() {
        assert_eq!(Source::Mlh.to_string(), "MLH");
        assert_eq!(Source::HackerEarth.as_str(), "HackerEarth");
    }

    #[test]
    fn test_is_from_ignores_case() {
        let h = sample_hackathon("HackMIT", Source::Mlh);
        assert!(h.is_from("mlh"));
        assert!(h.is_from("MLH"));
        assert!(h.is_from(" Mlh "));
        assert!(!h.is_from("hackerearth"));
    }

    #[test]
    fn test_optional_extended_fields_are_omitted() {
        let h = sample_hackathon("HackMIT", Source::Mlh);
        let json = serde_json::to_value(&h).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("description"));
        assert!(!obj.contains_key("start_date"));
        // images are always present, as null
        assert!(obj["background_image"].is_null());
        assert!(obj["logo_image"].is_null());
        assert_eq!(obj["source"], "MLH");
    }

    #[test]
    fn test_snapshot_deserialization() {
        let json = r#"{
            "timestamp": 1735689600.25,
            "data": [{
                "name": "Code Jam",
                "date": "Starts: 2025-01-01 - Ends: 2025-01-03",
                "location": "Online, Worldwide",
                "event_type": "Digital Only",
                "background_image": null,
                "logo_image": null,
                "event_url": "https://www.hackerearth.com/challenges/hackathon/code-jam/",
                "is_diversity_event": false,
                "diversity_type": "",
                "source": "HackerEarth",
                "start_date": "2025-01-01"
            }]
        }"#;

        let snapshot: CacheSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.data.len(), 1);
        assert_eq!(snapshot.data[0].start_date.as_deref(), Some("2025-01-01"));
        assert_eq!(snapshot.data[0].end_date, None);
        assert!((snapshot.timestamp - 1735689600.25).abs() < f64::EPSILON);
    }
}
