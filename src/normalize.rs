//! Mapping of per-source raw fields into the unified [`Hackathon`] schema.
//!
//! Parsers only collect what they can find into a [`RawHackathon`]; all
//! defaulting and the required-field check live here so every source comes
//! out with the same shape.

use crate::error::ParseFieldError;
use crate::models::{Hackathon, Source};

pub const DATE_TBA: &str = "Date TBA";
pub const ONLINE_LOCATION: &str = "Online, Worldwide";

/// Fields a parser managed to extract, all optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHackathon {
    pub name: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub background_image: Option<String>,
    pub logo_image: Option<String>,
    pub event_url: Option<String>,
    /// `Some(label)` marks a diversity event; the label may be empty.
    pub diversity: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Turn a raw record into a [`Hackathon`] tagged with `source`.
///
/// Fails when `name` or `event_url` is missing or blank.
pub fn normalize(raw: RawHackathon, source: Source) -> Result<Hackathon, ParseFieldError> {
    let name = required(raw.name, "name", source)?;
    let event_url = required(raw.event_url, "event_url", source)?;

    Ok(Hackathon {
        name,
        date: non_blank(raw.date).unwrap_or_else(|| DATE_TBA.to_string()),
        location: non_blank(raw.location).unwrap_or_default(),
        event_type: non_blank(raw.event_type).unwrap_or_default(),
        background_image: non_blank(raw.background_image),
        logo_image: non_blank(raw.logo_image),
        event_url,
        is_diversity_event: raw.diversity.is_some(),
        diversity_type: raw.diversity.map(|d| d.trim().to_string()).unwrap_or_default(),
        source: source.as_str().to_string(),
        description: non_blank(raw.description),
        start_date: non_blank(raw.start_date),
        end_date: non_blank(raw.end_date),
    })
}

fn required(
    value: Option<String>,
    field: &'static str,
    source: Source,
) -> Result<String, ParseFieldError> {
    non_blank(value).ok_or(ParseFieldError::new(field, source))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
