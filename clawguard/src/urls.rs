//! URL extraction and trusted-domain resolution.
//!
//! Extraction is deliberately conservative: one scan, one trailing-punctuation
//! trim. Punctuation placed inside a URL through unusual quoting is accepted
//! behavior; suspicious extractions are logged when diagnostics are enabled.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::domains::{is_risky_host, is_shortener_host, risky_url_pattern};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^ \t\n"'<>]+"#).expect("URL pattern must compile"));

/// How a command's URLs resolve against the trusted-domain set.
#[derive(Debug, Default)]
pub struct UrlAssessment {
    pub all_trusted: bool,
    pub has_risky_url: bool,
    pub urls: Vec<String>,
    pub trusted: Vec<String>,
    pub untrusted: Vec<String>,
    pub risky: Vec<String>,
}

impl UrlAssessment {
    /// True when the network checkpoint may short-circuit to allow.
    pub fn permits_short_circuit(&self) -> bool {
        self.all_trusted && !self.urls.is_empty() && !self.has_risky_url
    }
}

/// All `http(s)` URLs in the command, each with at most one trailing
/// punctuation character trimmed. Internal dots are never touched.
pub fn extract_urls(command: &str) -> Vec<String> {
    URL_RE
        .find_iter(command)
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
        .collect()
}

fn trim_trailing_punctuation(url: &str) -> &str {
    match url.chars().last() {
        Some(')' | ',' | ';' | '.') => &url[..url.len() - 1],
        _ => url,
    }
}

/// Host of `url`, lowercased. `None` when the URL does not parse — callers
/// treat that as untrusted.
fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

fn host_is_trusted(host: &str, trusted_domains: &[String]) -> bool {
    if is_risky_host(host) {
        return false;
    }
    trusted_domains
        .iter()
        .any(|d| host == d || host.ends_with(&format!(".{d}")))
}

/// Resolve every URL in the command against the trusted-domain set.
pub fn assess_urls(command: &str, trusted_domains: &[String]) -> UrlAssessment {
    let urls = extract_urls(command);
    let mut assessment = UrlAssessment {
        urls: urls.clone(),
        ..Default::default()
    };

    for url in &urls {
        if let Some(pattern) = risky_url_pattern(url) {
            debug!(url, pattern, "URL matches a risky pattern");
            assessment.has_risky_url = true;
            assessment.risky.push(url.clone());
        }

        match host_of(url) {
            Some(host) if host_is_trusted(&host, trusted_domains) => {
                assessment.trusted.push(url.clone());
            }
            Some(_) => assessment.untrusted.push(url.clone()),
            None => {
                warn!(url, "URL failed to parse; treating as untrusted");
                assessment.untrusted.push(url.clone());
            }
        }
    }

    assessment.all_trusted = !urls.is_empty() && assessment.untrusted.is_empty();
    assessment
}

/// First URL in the command whose host is a known URL shortener.
pub fn find_shortener_url(command: &str) -> Option<String> {
    extract_urls(command)
        .into_iter()
        .find(|url| host_of(url).is_some_and(|h| is_shortener_host(&h)))
}
