//! MLH season listing parser.
//!
//! The season page lists upcoming events first, then a "Past Events"
//! heading, then past events. Only containers that appear before that
//! heading in document order are parsed.
//!
//! # Container Layout
//!
//! ```text
//! div.event-wrapper
//! ├── a.event-link[href]
//! ├── div.image-wrap > img[src]
//! ├── div.event-logo > img[src]
//! ├── h3.event-name
//! ├── p.event-date
//! ├── div.event-location > span[itemprop=city], span[itemprop=state]
//! ├── div.event-hybrid-notes
//! └── span.diversity-event-badge[title]   (optional)
//! ```

use super::{SourceParser, absolutize, element_text, finish, select_attr, select_text, selector};
use crate::error::ParseFieldError;
use crate::models::{Hackathon, Source};
use crate::normalize::RawHackathon;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

pub const PAST_EVENTS_MARKER: &str = "Past Events";

static CONTAINER_OR_HEADING: Lazy<Selector> =
    Lazy::new(|| selector("div.event-wrapper, h1, h2, h3, h4, h5, h6"));
static NAME: Lazy<Selector> = Lazy::new(|| selector("h3.event-name"));
static DATE: Lazy<Selector> = Lazy::new(|| selector("p.event-date"));
static CITY: Lazy<Selector> = Lazy::new(|| selector("div.event-location span[itemprop=\"city\"]"));
static STATE: Lazy<Selector> =
    Lazy::new(|| selector("div.event-location span[itemprop=\"state\"]"));
static EVENT_TYPE: Lazy<Selector> = Lazy::new(|| selector("div.event-hybrid-notes"));
static BACKGROUND: Lazy<Selector> = Lazy::new(|| selector("div.image-wrap img"));
static LOGO: Lazy<Selector> = Lazy::new(|| selector("div.event-logo img"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a.event-link"));
static DIVERSITY_BADGE: Lazy<Selector> = Lazy::new(|| selector("span.diversity-event-badge"));

/// Parser for the MLH season events page.
#[derive(Debug, Clone)]
pub struct MlhParser {
    page_url: Url,
}

impl MlhParser {
    /// `page_url` is used to resolve relative event links.
    pub fn new(page_url: Url) -> Self {
        Self { page_url }
    }
}

impl SourceParser for MlhParser {
    fn source(&self) -> Source {
        Source::Mlh
    }

    fn name(&self) -> &'static str {
        "mlh-html"
    }

    #[instrument(level = "info", skip_all, fields(bytes = document.len()))]
    fn parse(&self, document: &str) -> Vec<Hackathon> {
        let html = Html::parse_document(document);
        let containers = upcoming_containers(&html);
        debug!(count = containers.len(), "Found upcoming MLH event containers");

        let raws = containers
            .into_iter()
            .map(|container| self.extract(container))
            .collect::<Vec<_>>();
        finish(Source::Mlh, self.name(), raws)
    }
}

impl MlhParser {
    fn extract(&self, container: ElementRef<'_>) -> Result<RawHackathon, ParseFieldError> {
        let need = |value: Option<String>, field: &'static str| {
            value.ok_or(ParseFieldError::new(field, Source::Mlh))
        };

        let name = need(select_text(container, &NAME), "name")?;
        let date = need(select_text(container, &DATE), "date")?;
        let city = need(select_text(container, &CITY), "city")?;
        let state = need(select_text(container, &STATE), "state")?;
        let event_type = need(select_text(container, &EVENT_TYPE), "event_type")?;
        let href = need(select_attr(container, &LINK, "href"), "event_url")?;
        let event_url = need(absolutize(&self.page_url, &href), "event_url")?;

        let diversity = container.select(&DIVERSITY_BADGE).next().map(|badge| {
            badge
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .unwrap_or_default()
        });

        Ok(RawHackathon {
            name: Some(name),
            date: Some(date),
            location: Some(format!("{city}, {state}")),
            event_type: Some(event_type),
            background_image: select_attr(container, &BACKGROUND, "src"),
            logo_image: select_attr(container, &LOGO, "src"),
            event_url: Some(event_url),
            diversity,
            ..Default::default()
        })
    }
}

/// Event containers preceding the "Past Events" heading, in document order.
fn upcoming_containers(html: &Html) -> Vec<ElementRef<'_>> {
    let mut containers = Vec::new();
    for element in html.select(&CONTAINER_OR_HEADING) {
        let el = element.value();
        if el.name() == "div" {
            containers.push(element);
        } else if is_past_events_marker(element) {
            debug!(kept = containers.len(), "Reached past events marker");
            break;
        }
    }
    containers
}

fn is_past_events_marker(heading: ElementRef<'_>) -> bool {
    !heading.value().classes().any(|c| c == "event-name")
        && element_text(heading) == PAST_EVENTS_MARKER
}
