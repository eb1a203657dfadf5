//! JSON-LD `Event` parser for HackerEarth.
//!
//! HackerEarth embeds schema.org event metadata in
//! `<script type="application/ld+json">` blocks. Reading those is more stable
//! than scraping the card markup, so the orchestrator tries this parser first.
//!
//! A block may hold a single object, an array of objects, or an object with an
//! `@graph` array; all three shapes are accepted.

use super::{SourceParser, absolutize, finish, selector};
use crate::error::ParseFieldError;
use crate::models::{Hackathon, Source};
use crate::normalize::{DATE_TBA, ONLINE_LOCATION, RawHackathon};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

pub const NAME_SUFFIX: &str = " at HackerEarth";

static LD_JSON: Lazy<Selector> = Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));

/// Parser for embedded schema.org `Event` objects.
#[derive(Debug, Clone)]
pub struct StructuredDataParser {
    page_url: Url,
}

impl StructuredDataParser {
    /// Relative event URLs are prefixed with `page_url`'s origin.
    pub fn new(page_url: Url) -> Self {
        Self { page_url }
    }
}

impl SourceParser for StructuredDataParser {
    fn source(&self) -> Source {
        Source::HackerEarth
    }

    fn name(&self) -> &'static str {
        "hackerearth-ld-json"
    }

    #[instrument(level = "info", skip_all, fields(bytes = document.len()))]
    fn parse(&self, document: &str) -> Vec<Hackathon> {
        let html = Html::parse_document(document);
        let mut events = Vec::new();

        for (index, script) in html.select(&LD_JSON).enumerate() {
            let body = script.text().collect::<String>();
            match serde_json::from_str::<Value>(body.trim()) {
                Ok(value) => collect_events(value, &mut events),
                Err(e) => warn!(
                    block = index,
                    error = %e,
                    preview = %truncate_for_log(body.trim(), 120),
                    "Skipping unparsable JSON-LD block"
                ),
            }
        }
        debug!(count = events.len(), "Found JSON-LD events");

        let raws = events
            .iter()
            .map(|event| extract(event, &self.page_url))
            .collect::<Vec<_>>();
        finish(Source::HackerEarth, self.name(), raws)
    }
}

/// Flatten a JSON-LD value into its `Event` objects.
fn collect_events(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|v| collect_events(v, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                collect_events(graph, out);
            }
            let value = Value::Object(map);
            if is_event(&value) {
                out.push(value);
            }
        }
        _ => {}
    }
}

fn is_event(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Event",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Event")),
        _ => false,
    }
}

fn extract(event: &Value, page_url: &Url) -> Result<RawHackathon, ParseFieldError> {
    let name = str_field(event, "name")
        .map(|n| n.strip_suffix(NAME_SUFFIX).unwrap_or(&n).to_string())
        .ok_or(ParseFieldError::new("name", Source::HackerEarth))?;

    let start = str_field(event, "startDate");
    let end = str_field(event, "endDate");
    let date = match (&start, &end) {
        (Some(s), Some(e)) => format!("Starts: {s} - Ends: {e}"),
        _ => DATE_TBA.to_string(),
    };

    let venue = venue(event);
    let event_type = attendance_mode(event)
        .unwrap_or(if venue.is_some() { "In-Person" } else { "Digital Only" });

    Ok(RawHackathon {
        name: Some(name),
        date: Some(date),
        location: Some(venue.unwrap_or_else(|| ONLINE_LOCATION.to_string())),
        event_type: Some(event_type.to_string()),
        background_image: image(event),
        event_url: str_field(event, "url").and_then(|href| absolutize(page_url, &href)),
        description: str_field(event, "description"),
        start_date: start,
        end_date: end,
        ..Default::default()
    })
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// "Venue, Locality, Region" for a named physical venue.
fn venue(event: &Value) -> Option<String> {
    let location = match event.get("location")? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let venue_name = str_field(location, "name")?;
    if venue_name.eq_ignore_ascii_case("online") {
        return None;
    }
    let address = location.get("address")?;

    let parts = [
        Some(venue_name),
        str_field(address, "addressLocality"),
        str_field(address, "addressRegion"),
    ];
    Some(parts.into_iter().flatten().join(", "))
}

fn attendance_mode(event: &Value) -> Option<&'static str> {
    let mode = event.get("eventAttendanceMode")?.as_str()?;
    if mode.ends_with("MixedEventAttendanceMode") {
        Some("Hybrid")
    } else if mode.ends_with("OfflineEventAttendanceMode") {
        Some("In-Person")
    } else if mode.ends_with("OnlineEventAttendanceMode") {
        Some("Digital Only")
    } else {
        None
    }
}

fn image(event: &Value) -> Option<String> {
    match event.get("image")? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) => items.iter().find_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            other => str_field(other, "url"),
        }),
        other => str_field(other, "url"),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub fn ld_block(json: &str) -> String {
        format!(r#"<script type="application/ld+json">{json}</script>"#)
    }

    pub fn event_json(name: &str, slug: &str) -> String {
        format!(
            r#"{{
  "@context": "https://schema.org",
  "@type": "Event",
  "name": "{name} at HackerEarth",
  "startDate": "2025-11-01T10:00:00+05:30",
  "endDate": "2025-11-30T23:55:00+05:30",
  "url": "https://www.hackerearth.com/challenges/hackathon/{slug}/",
  "image": "https://static-fastly.hackerearth.com/{slug}.png",
  "description": "Build something for {name}.",
  "location": {{ "@type": "VirtualLocation", "name": "Online" }}
}}"#
        )
    }

    pub fn page(head: &str, body: &str) -> String {
        format!("<!DOCTYPE html><html><head>{head}</head><body>{body}</body></html>")
    }
}
