//! Client for the Devpost hackathon listing API.
//!
//! The API is unofficial and occasionally returns items with missing or
//! malformed fields.  Everything is normalized here so the rest of the bot
//! never has to null-check a listing.

use crate::{log_error, log_internal};
use std::time::Duration;

const API_URL: &str = "https://devpost.com/api/hackathons";

// Devpost rejects requests without a plausible client identifier.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; hackbot/0.1; Discord announcement bot)";

// Pause between page requests so we do not trip upstream rate limiting.
const PAGE_PAUSE: Duration = Duration::from_millis(500);

/// One hackathon listing, normalized.  `url` is the canonical identifier and
/// is never empty; every other field carries a printable default.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub url: String,
    pub title: String,
    /// Absolute https URI, or None if the API provided nothing usable.
    pub thumbnail_url: Option<String>,
    pub status: String,
    pub location: String,
    pub host: String,
    pub submission_period: String,
    pub prize_amount: String,
    pub prize_cash: u32,
    pub prize_other: u32,
    pub themes: Vec<String>,
}

#[derive(serde::Deserialize)]
struct RawPage {
    #[serde(default)]
    hackathons: Vec<serde_json::Value>,
}

#[derive(serde::Deserialize)]
struct RawListing {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    time_left_to_submission: Option<String>,
    #[serde(default)]
    displayed_location: Option<RawLocation>,
    #[serde(default)]
    prize_amount: Option<String>,
    #[serde(default)]
    prizes_counts: Option<RawPrizeCounts>,
    #[serde(default)]
    organization_name: Option<String>,
    #[serde(default)]
    submission_period_dates: Option<String>,
    #[serde(default)]
    themes: Vec<RawTheme>,
}

#[derive(serde::Deserialize)]
struct RawLocation {
    #[serde(default)]
    location: Option<String>,
}

#[derive(serde::Deserialize, Default)]
struct RawPrizeCounts {
    #[serde(default)]
    cash: u32,
    #[serde(default)]
    other: u32,
}

#[derive(serde::Deserialize)]
struct RawTheme {
    name: String,
}

/// Fetch up to `pages` pages of recently added public hackathons, newest
/// first, matching the ordering of the upstream API.
///
/// Failure containment, page by page:
/// - a non-success HTTP status is "no items this page"; the next page is
///   still requested
/// - an empty page means the end of available data and stops pagination
/// - a network-level error aborts the fetch, returning whatever accumulated
///
/// An empty result therefore means "nothing new", never a hard error.
pub async fn fetch_recent(client: &reqwest::Client, pages: u32) -> Vec<Listing> {
    let mut listings = Vec::new();

    for page in 1..=pages {
        let request = client
            .get(API_URL)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("open_to[]", "public"),
                ("order_by", "recently-added"),
                ("page", &page.to_string()),
            ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                log_error!("Devpost request for page {} failed: {}", page, e);
                break;
            }
        };

        if !response.status().is_success() {
            log_error!(
                "Devpost returned status {} for page {}",
                response.status(),
                page
            );
            continue;
        }

        let raw_page: RawPage = match response.json().await {
            Ok(raw_page) => raw_page,
            Err(e) => {
                log_error!("Could not read Devpost response for page {}: {}", page, e);
                break;
            }
        };

        if raw_page.hackathons.is_empty() {
            log_internal!("Devpost page {} is empty, stopping pagination", page);
            break;
        }

        listings.extend(parse_items(raw_page.hackathons));

        if page < pages {
            tokio::time::sleep(PAGE_PAUSE).await;
        }
    }

    listings
}

/// Parse one page worth of items.  An item that fails to parse is dropped
/// with a diagnostic; it never reaches the caller with partial data.
fn parse_items(items: Vec<serde_json::Value>) -> Vec<Listing> {
    let mut listings = Vec::new();

    for item in items {
        match serde_json::from_value::<RawListing>(item) {
            Ok(raw) if raw.url.trim().is_empty() => {
                log_error!("Skipping Devpost item with a blank url");
            }
            Ok(raw) => listings.push(Listing::from_raw(raw)),
            Err(e) => log_error!("Skipping unparsable Devpost item: {}", e),
        }
    }

    listings
}

impl Listing {
    fn from_raw(raw: RawListing) -> Self {
        let prizes = raw.prizes_counts.unwrap_or_default();

        Self {
            url: raw.url,
            title: non_empty_or(raw.title, "No Title"),
            thumbnail_url: normalize_thumbnail(raw.thumbnail_url),
            status: non_empty_or(raw.time_left_to_submission, "N/A"),
            location: non_empty_or(
                raw.displayed_location.and_then(|l| l.location),
                "Online",
            ),
            host: non_empty_or(raw.organization_name, "N/A"),
            submission_period: non_empty_or(raw.submission_period_dates, "N/A"),
            prize_amount: non_empty_or(raw.prize_amount.map(|s| strip_html_tags(&s)), "0"),
            prize_cash: prizes.cash,
            prize_other: prizes.other,
            themes: raw.themes.into_iter().map(|t| t.name).collect(),
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

/// Devpost serves thumbnails as protocol-relative URIs (`//host/...`).
/// Rewrite those to explicit https so Discord accepts them.
fn normalize_thumbnail(thumbnail: Option<String>) -> Option<String> {
    let thumbnail = thumbnail?;
    if thumbnail.is_empty() {
        return None;
    }

    if let Some(rest) = thumbnail.strip_prefix("//") {
        Some(format!("https://{}", rest))
    } else {
        Some(thumbnail)
    }
}

/// The prize amount field embeds markup, e.g. `<span data-currency>20,000</span>`.
fn strip_html_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.trim().to_string()
}
