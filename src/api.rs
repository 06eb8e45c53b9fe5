// ABOUTME: Blocking HTTP client for the user-restrictions API
// ABOUTME: Handles the API key header, rate-limit headers and fail-fast errors

use crate::model::{Page, RateLimit, RestrictionPage};
use crate::{Error, Result};
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://apis.roblox.com";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

const RATE_REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RATE_RESET_HEADER: &str = "x-ratelimit-reset";

/// Anything that can hand out restriction pages for a universe.
pub trait PageSource {
    /// Fetches the page at `cursor`; `None` is the first page.
    fn fetch_page(&self, universe_id: &str, cursor: Option<&str>) -> Result<Page>;
}

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

fn header_value<T: std::str::FromStr>(response: &Response, name: &str) -> Result<T> {
    let raw = response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string());

    raw.as_deref()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::RateLimitHeader {
            name: name.into(),
            value: raw.clone(),
        })
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
}

impl ApiClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(ApiClient {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn endpoint(&self, universe_id: &str) -> String {
        format!("/cloud/v2/universes/{}/user-restrictions", universe_id)
    }
}

impl PageSource for ApiClient {
    fn fetch_page(&self, universe_id: &str, cursor: Option<&str>) -> Result<Page> {
        let endpoint = self.endpoint(universe_id);
        let url = format!("{}{}", self.base_url, endpoint);
        let page_size = self.page_size.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("maxPageSize", page_size.as_str()),
                ("pageToken", cursor.unwrap_or("")),
            ])
            .header("x-api-key", &self.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", "bansync/0.1 (Rust)")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint,
                status: status.as_u16(),
                message: truncate_str(&message, 100),
            });
        }

        let rate = RateLimit {
            remaining: header_value(&response, RATE_REMAINING_HEADER)?,
            reset_seconds: header_value(&response, RATE_RESET_HEADER)?,
        };

        let body = response.text()?;
        let parsed: RestrictionPage = serde_json::from_str(&body).map_err(|e| {
            debug!(
                endpoint = %endpoint,
                body = %truncate_str(&body, 500),
                "failed to decode restriction page"
            );
            Error::Decode(e)
        })?;

        Ok(Page::from_response(parsed, rate))
    }
}
