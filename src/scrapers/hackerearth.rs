//! HackerEarth challenge card parser.
//!
//! Used only when the page carries no JSON-LD events (see
//! [`super::structured`]). HackerEarth hackathons are online, so location and
//! event type are fixed.

use super::{SourceParser, absolutize, finish, select_attr, select_text, selector};
use crate::error::ParseFieldError;
use crate::models::{Hackathon, Source};
use crate::normalize::{DATE_TBA, ONLINE_LOCATION, RawHackathon};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static CARD: Lazy<Selector> = Lazy::new(|| selector("div.challenge-card-modern"));
static NAME: Lazy<Selector> = Lazy::new(|| selector("div.challenge-name"));
static DATE: Lazy<Selector> = Lazy::new(|| selector("div.date"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a.challenge-card-wrapper"));
static IMAGE: Lazy<Selector> = Lazy::new(|| selector("div.event-image"));

static STYLE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url\('(.*?)'\)").expect("style url pattern must compile"));

/// Parser for HackerEarth challenge cards.
#[derive(Debug, Clone)]
pub struct HackerEarthHtmlParser {
    page_url: Url,
}

impl HackerEarthHtmlParser {
    /// Relative card links are prefixed with `page_url`'s origin.
    pub fn new(page_url: Url) -> Self {
        Self { page_url }
    }

    fn extract(&self, card: ElementRef<'_>) -> Result<RawHackathon, ParseFieldError> {
        let name = select_text(card, &NAME)
            .ok_or(ParseFieldError::new("name", Source::HackerEarth))?;
        let event_url = select_attr(card, &LINK, "href")
            .and_then(|href| absolutize(&self.page_url, &href))
            .ok_or(ParseFieldError::new("event_url", Source::HackerEarth))?;

        let background_image = select_attr(card, &IMAGE, "style")
            .as_deref()
            .and_then(background_from_style);

        Ok(RawHackathon {
            name: Some(name),
            date: Some(select_text(card, &DATE).unwrap_or_else(|| DATE_TBA.to_string())),
            location: Some(ONLINE_LOCATION.to_string()),
            event_type: Some("Digital Only".to_string()),
            background_image,
            event_url: Some(event_url),
            ..Default::default()
        })
    }
}

impl SourceParser for HackerEarthHtmlParser {
    fn source(&self) -> Source {
        Source::HackerEarth
    }

    fn name(&self) -> &'static str {
        "hackerearth-html"
    }

    #[instrument(level = "info", skip_all, fields(bytes = document.len()))]
    fn parse(&self, document: &str) -> Vec<Hackathon> {
        let html = Html::parse_document(document);
        let raws = html
            .select(&CARD)
            .map(|card| self.extract(card))
            .collect::<Vec<_>>();
        debug!(count = raws.len(), "Found HackerEarth challenge cards");
        finish(Source::HackerEarth, self.name(), raws)
    }
}

/// The URL between `url('` and `')` in an inline style.
pub fn background_from_style(style: &str) -> Option<String> {
    STYLE_URL
        .captures(style)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}


#[cfg(test)]
mod tests {
    use super::fixtures::card;
    use super::*;

    fn parser() -> HackerEarthHtmlParser {
        HackerEarthHtmlParser::new(
            Url::parse("https://www.hackerearth.com/challenges/hackathon/").unwrap(),
        )
    }

    #[test]
    fn test_parses_card() {
        let doc = card(
            "GreenHack",
            "/challenges/hackathon/greenhack/",
            Some("Nov 01, 2025"),
        );
        let records = parser().parse(&doc);
        assert_eq!(records.len(), 1);

        let h = &records[0];
        assert_eq!(h.name, "GreenHack");
        assert_eq!(h.date, "Nov 01, 2025");
        assert_eq!(h.location, "Online, Worldwide");
        assert_eq!(h.event_type, "Digital Only");
        assert_eq!(h.event_url, "https://www.hackerearth.com/challenges/hackathon/greenhack/");
        assert_eq!(
            h.background_image.as_deref(),
            Some("https://static.hackerearth.com/GreenHack.png")
        );
        assert_eq!(h.logo_image, None);
        assert_eq!(h.source, "HackerEarth");
    }

    #[test]
    fn test_missing_date_defaults() {
        let records = parser().parse(&card("NoDate", "https://x.hackerearth.com/a", None));
        assert_eq!(records[0].date, "Date TBA");
        assert_eq!(records[0].event_url, "https://x.hackerearth.com/a");
    }

    #[test]
    fn test_slashless_href_uses_site_origin() {
        let records = parser().parse(&card("Bare", "challenges/hackathon/bare/", None));
        assert_eq!(records[0].event_url, "https://www.hackerearth.com/challenges/hackathon/bare/");
    }

    #[test]
    fn test_card_without_link_is_dropped() {
        let broken = card("NoLink", "/x", None).replace(r#"href="/x""#, "");
        let doc = [card("Kept", "/kept", None), broken].concat();
        let records = parser().parse(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Kept");
    }

    #[test]
    fn test_background_from_style() {
        assert_eq!(
            background_from_style("background: url('https://img/a.png') no-repeat").as_deref(),
            Some("https://img/a.png")
        );
        assert_eq!(background_from_style("background: #fff"), None);
        assert_eq!(background_from_style("url(\"https://img/a.png\")"), None);
    }

    #[test]
    fn test_card_without_image_pattern() {
        let doc = card("Plain", "/p", None).replace("url('https://static.hackerearth.com/Plain.png')", "none");
        let records = parser().parse(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].background_image, None);
    }
}
