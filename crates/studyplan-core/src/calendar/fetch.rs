//! Calendar retrieval over HTTP.
//!
//! A URL may point straight at an `.ics` feed or at an HTML schedule page
//! that links to one. In the second case the export link is followed once,
//! carrying over any session cookies the page set.

use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::error::FetchError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 12;

const DEFAULT_USER_AGENT: &str = concat!("studyplan/", env!("CARGO_PKG_VERSION"));

static LINK_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:href|src|data-href|data-url|value)\s*=\s*["']([^"']+)["']"#)
        .expect("link attribute regex must compile")
});

static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:https?|webcal)://[^\s"'<>]+"#).expect("bare url regex must compile")
});

/// True if the body is iCalendar data.
pub fn looks_like_calendar(body: &str) -> bool {
    body.contains("BEGIN:VCALENDAR")
}

fn looks_like_html(body: &str, content_type: Option<&str>) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("html")) {
        return true;
    }
    let head: String = body.trim_start().chars().take(512).collect::<String>().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html") || head.contains("<body")
}

fn is_export_candidate(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    lower.starts_with("webcal:")
        || lower.contains(".ics")
        || ["format=ical", "format=ics", "export=ics", "type=ical", "type=ics", "ical=", "/ical"]
            .iter()
            .any(|p| lower.contains(p))
}

/// Rewrite `webcal://` to `https://`.
fn normalize_scheme(url: &str) -> String {
    let trimmed = url.trim();
    match trimmed.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &trimmed[9..])
        }
        _ => trimmed.to_string(),
    }
}

/// Find the first calendar export link in an HTML page, resolved
/// against `base`.
pub fn find_export_link(html: &str, base: &Url) -> Option<Url> {
    let attrs = LINK_ATTR_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str());
    let bare = BARE_URL_RE.find_iter(html).map(|m| m.as_str());

    attrs
        .chain(bare)
        .map(|link| link.replace("&amp;", "&"))
        .filter(|link| is_export_candidate(link))
        .find_map(|link| base.join(&normalize_scheme(&link)).ok())
}

/// Session cookies from `Set-Cookie` headers, as a `Cookie` header value.
fn forwarded_cookies(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// HTTP client for calendar feeds.
#[derive(Debug, Clone)]
pub struct CalendarFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl CalendarFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout_secs, DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = user_agent.parse() {
            headers.insert(USER_AGENT, value);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Fetch calendar text from `url`.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = Url::parse(&normalize_scheme(url))
            .map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        tracing::debug!(%url, "fetching calendar");

        let (body, content_type, headers) = self.get(&url, None).await?;
        if looks_like_calendar(&body) {
            return Ok(body);
        }
        if !looks_like_html(&body, content_type.as_deref()) {
            return Err(FetchError::NotCalendar);
        }

        let export = find_export_link(&body, &url).ok_or(FetchError::NoExportLink)?;
        tracing::debug!(%export, "following calendar export link");
        let cookies = forwarded_cookies(&headers);
        let (body, _, _) = self.get(&export, cookies.as_deref()).await?;
        if looks_like_calendar(&body) {
            Ok(body)
        } else {
            Err(FetchError::NotCalendar)
        }
    }

    async fn get(
        &self,
        url: &Url,
        cookies: Option<&str>,
    ) -> Result<(String, Option<String>, HeaderMap), FetchError> {
        let mut request = self.client.get(url.clone());
        if let Some(cookies) = cookies {
            request = request.header(COOKIE, cookies);
        }
        let response = request.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "calendar request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let headers = response.headers().clone();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        Ok((body, content_type, headers))
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            FetchError::from(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://schema.example.edu/timetable/view?id=42").unwrap()
    }

    #[test]
    fn finds_relative_ics_link() {
        let html = r#"<html><body><a href="/timetable/export.ics?id=42&amp;lang=sv">iCal</a></body></html>"#;
        let link = find_export_link(html, &base()).unwrap();
        assert_eq!(link.as_str(), "https://schema.example.edu/timetable/export.ics?id=42&lang=sv");
    }

    #[test]
    fn finds_format_param_link() {
        let html = r#"<a href="print?x=1">Print</a><a href='feed?format=ical&amp;id=42'>Subscribe</a>"#;
        let link = find_export_link(html, &base()).unwrap();
        assert_eq!(link.as_str(), "https://schema.example.edu/timetable/feed?format=ical&id=42");
    }

    #[test]
    fn webcal_links_become_https() {
        let html = r#"<p>Subscribe: webcal://cal.example.edu/u/42.ics</p>"#;
        let link = find_export_link(html, &base()).unwrap();
        assert_eq!(link.scheme(), "https");
        assert_eq!(link.path(), "/u/42.ics");
    }

    #[test]
    fn page_without_export_link() {
        let html = r#"<html><a href="/about">About</a></html>"#;
        assert!(find_export_link(html, &base()).is_none());
    }

    #[test]
    fn cookie_forwarding_keeps_name_value_pairs() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, "JSESSIONID=abc; Path=/; HttpOnly".parse().unwrap());
        headers.append(SET_COOKIE, "lang=sv; Max-Age=3600".parse().unwrap());
        assert_eq!(forwarded_cookies(&headers).as_deref(), Some("JSESSIONID=abc; lang=sv"));
        assert!(forwarded_cookies(&HeaderMap::new()).is_none());
    }

    #[test]
    fn html_detection() {
        assert!(looks_like_html("  <!DOCTYPE html><html>", None));
        assert!(looks_like_html("whatever", Some("text/html; charset=utf-8")));
        assert!(!looks_like_html("just text", Some("text/plain")));
    }
}
