//! Search result quality: normalisation, scoring and domain filtering.
//!
//! Every function here is pure; the aggregator supplies `now` so ranking
//! is deterministic under test.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use hottake_config::{ScoreWeights, SearchConfig};
use hottake_core::search::{RawSearchResult, SourceKind, SourceRecord};
use reqwest::Url;
use std::collections::HashSet;

/// Records with fewer characters of snippet than this score zero for snippet quality.
const SNIPPET_MIN_CHARS: usize = 50;
const SNIPPET_GOOD_CHARS: usize = 100;
/// Query tokens beyond this count do not raise the overlap bar further.
const RELEVANCE_TOKEN_CAP: usize = 6;
/// Recency never decays over less than a week.
const MIN_RECENCY_WINDOW_DAYS: u32 = 7;

/// Ranking settings shared by every sub-search.
#[derive(Debug, Clone)]
pub struct QualitySettings {
    pub weights: ScoreWeights,
    pub strict_penalty: f64,
    pub strict_relevance_threshold: f64,
    pub web_recency_days: u32,
    pub news_recency_days: u32,
    pub trusted_domains: Vec<String>,
    pub allowlist: Vec<String>,
    pub blocklist: Vec<String>,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl QualitySettings {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            weights: config.weights,
            strict_penalty: config.strict_penalty,
            strict_relevance_threshold: config.strict_relevance_threshold,
            web_recency_days: config.web_recency_days,
            news_recency_days: config.news_recency_days,
            trusted_domains: normalize_domain_list(&config.trusted_domains),
            allowlist: normalize_domain_list(&config.domain_allowlist),
            blocklist: normalize_domain_list(&config.domain_blocklist),
        }
    }

    pub fn recency_days(&self, kind: SourceKind) -> u32 {
        match kind {
            SourceKind::Web => self.web_recency_days,
            SourceKind::News => self.news_recency_days,
        }
    }

    /// Allow-list (when non-empty) then block-list, on the record's host.
    pub fn domain_allowed(&self, record: &SourceRecord) -> bool {
        let host = extract_domain(&record.url);
        if host.is_empty() {
            return false;
        }
        if !self.allowlist.is_empty() && !matches_any(&host, &self.allowlist) {
            return false;
        }
        !matches_any(&host, &self.blocklist)
    }
}

/// The four [0, 1] sub-scores of one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub relevance: f64,
    pub recency: f64,
    pub snippet: f64,
    pub domain: f64,
}

impl SubScores {
    pub fn compute(
        record: &SourceRecord,
        query_tokens: &HashSet<String>,
        settings: &QualitySettings,
        now: DateTime<Utc>,
    ) -> Self {
        let snippet = record.snippet.as_deref().unwrap_or("");
        Self {
            relevance: relevance(query_tokens, &record.title, snippet),
            recency: recency(record.published_at, now, settings.recency_days(record.kind)),
            snippet: snippet_quality(snippet),
            domain: domain_trust(record, &settings.trusted_domains),
        }
    }

    pub fn weighted(&self, weights: &ScoreWeights) -> f64 {
        self.relevance * weights.relevance
            + self.recency * weights.recency
            + self.snippet * weights.snippet
            + self.domain * weights.domain
    }

    /// Final score. In strict mode low-overlap records are penalised, not dropped.
    pub fn final_score(&self, settings: &QualitySettings, strict: bool) -> f64 {
        let total = self.weighted(&settings.weights);
        if strict && self.relevance < settings.strict_relevance_threshold {
            total * settings.strict_penalty
        } else {
            total
        }
    }
}

/// Lowercase `[a-z0-9]{2,}` tokens.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|token| token.len() >= 2)
        .map(String::from)
        .collect()
}

pub fn relevance(query_tokens: &HashSet<String>, title: &str, snippet: &str) -> f64 {
    let text_tokens = tokenize(&format!("{title} {snippet}"));
    let overlap = query_tokens.intersection(&text_tokens).count();
    let needed = query_tokens.len().min(RELEVANCE_TOKEN_CAP).max(1);
    (overlap as f64 / needed as f64).min(1.0)
}

/// Linear decay over `max(7, window_days)`; zero without a timestamp.
pub fn recency(published: Option<DateTime<Utc>>, now: DateTime<Utc>, window_days: u32) -> f64 {
    let Some(published) = published else {
        return 0.0;
    };
    let max_days = f64::from(window_days.max(MIN_RECENCY_WINDOW_DAYS));
    let age_days = ((now - published).num_seconds() as f64 / 86_400.0).max(0.0);
    if age_days >= max_days {
        0.0
    } else {
        1.0 - age_days / max_days
    }
}

pub fn snippet_quality(snippet: &str) -> f64 {
    match snippet.trim().chars().count() {
        n if n >= SNIPPET_GOOD_CHARS => 1.0,
        n if n >= SNIPPET_MIN_CHARS => 0.5,
        _ => 0.0,
    }
}

pub fn domain_trust(record: &SourceRecord, trusted: &[String]) -> f64 {
    let host = extract_domain(&record.url);
    let publisher = record.publisher.as_deref().map(extract_domain).unwrap_or_default();
    let trusted_host = !host.is_empty() && matches_any(&host, trusted);
    let trusted_publisher = !publisher.is_empty() && matches_any(&publisher, trusted);
    if trusted_host || trusted_publisher { 1.0 } else { 0.0 }
}

/// Whether `domain` equals an entry or is a subdomain of one.
fn matches_any(domain: &str, entries: &[String]) -> bool {
    entries.iter().any(|entry| {
        domain == entry
            || domain
                .strip_suffix(entry.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Lowercased host without `www.`; accepts a full URL or a bare domain.
pub fn extract_domain(value: &str) -> String {
    let value = value.trim().to_lowercase();
    let host = if value.contains("://") {
        Url::parse(&value)
            .ok()
            .and_then(|url| url.host_str().map(String::from))
            .unwrap_or_default()
    } else {
        value.split('/').next().unwrap_or_default().to_string()
    };
    host.strip_prefix("www.").map(String::from).unwrap_or(host)
}

fn normalize_domain_list(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| extract_domain(entry))
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Dedup key for a URL: host without `www.` plus path without trailing slash.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default().to_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);
            format!("{host}{}", parsed.path().trim_end_matches('/'))
        }
        Err(_) => url.trim().to_lowercase(),
    }
}

/// Parse the date formats search providers emit.
pub fn parse_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Some(ago) = parse_relative(raw) {
        return now.checked_sub_signed(ago?);
    }
    for fmt in ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// "3 days ago", "1 hour ago", "2 weeks ago".
///
/// `Some(None)` is a relative date too far back to represent.
fn parse_relative(raw: &str) -> Option<Option<Duration>> {
    let lower = raw.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    words.windows(3).find_map(|w| {
        if w[2] != "ago" {
            return None;
        }
        let count: i64 = w[0].parse().ok()?;
        let unit = w[1].strip_suffix('s').unwrap_or(w[1]);
        let ago = match unit {
            "minute" => Duration::try_minutes(count),
            "hour" => Duration::try_hours(count),
            "day" => Duration::try_days(count),
            "week" => Duration::try_weeks(count),
            "month" => count.checked_mul(30).and_then(Duration::try_days),
            "year" => count.checked_mul(365).and_then(Duration::try_days),
            _ => return None,
        };
        Some(ago)
    })
}

/// Convert a raw hit into a record, or `None` when it is unusable.
pub fn normalize(raw: RawSearchResult, kind: SourceKind, now: DateTime<Utc>) -> Option<SourceRecord> {
    let title = raw.title.trim();
    if title.is_empty() {
        return None;
    }
    let url = Url::parse(raw.url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    let non_empty = |s: Option<String>| {
        s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };
    let publisher = non_empty(raw.publisher).or_else(|| {
        let host = extract_domain(url.as_str());
        (!host.is_empty()).then_some(host)
    });

    Some(SourceRecord {
        kind,
        title: title.to_string(),
        url: raw.url.trim().to_string(),
        snippet: non_empty(raw.snippet),
        publisher,
        published_at: raw.published.as_deref().and_then(|d| parse_date(d, now)),
        score: 0.0,
    })
}

/// Drop dated records older than the window; undated records stay.
pub fn within_window(record: &SourceRecord, now: DateTime<Utc>, window_days: u32) -> bool {
    match record.published_at {
        Some(published) if window_days > 0 => now - published <= Duration::days(i64::from(window_days)),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn record(url: &str, title: &str, snippet: Option<&str>) -> SourceRecord {
        SourceRecord {
            kind: SourceKind::Web,
            title: title.into(),
            url: url.into(),
            snippet: snippet.map(String::from),
            publisher: None,
            published_at: None,
            score: 0.0,
        }
    }

    #[test]
    fn tokenize_keeps_two_char_alnum_runs() {
        let tokens = tokenize("AI & the U.S. economy, 2025!");
        assert!(tokens.contains("ai"));
        assert!(tokens.contains("economy"));
        assert!(tokens.contains("2025"));
        assert!(!tokens.contains("u"));
        assert!(!tokens.contains("&"));
    }

    #[test]
    fn relevance_caps_at_six_tokens() {
        let query = tokenize("pineapple pizza");
        assert!((relevance(&query, "Pineapple on pizza", "") - 1.0).abs() < 1e-9);
        assert!((relevance(&query, "Pineapple farming", "") - 0.5).abs() < 1e-9);

        let long = tokenize("one two three four five six seven eight");
        assert!((relevance(&long, "one two three", "") - 0.5).abs() < 1e-9);
        assert_eq!(relevance(&HashSet::new(), "anything", ""), 0.0);
    }

    #[test]
    fn recency_decays_linearly() {
        let now = now();
        assert_eq!(recency(None, now, 30), 0.0);
        assert!((recency(Some(now), now, 30) - 1.0).abs() < 1e-9);
        let fifteen = now - Duration::days(15);
        assert!((recency(Some(fifteen), now, 30) - 0.5).abs() < 1e-9);
        assert_eq!(recency(Some(now - Duration::days(40)), now, 30), 0.0);
        // Windows under a week still decay over seven days.
        let three = now - Duration::days(3);
        assert!((recency(Some(three), now, 1) - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn snippet_quality_steps() {
        assert_eq!(snippet_quality("short"), 0.0);
        assert_eq!(snippet_quality(&"x".repeat(60)), 0.5);
        assert_eq!(snippet_quality(&"x".repeat(120)), 1.0);
    }

    #[test]
    fn domain_trust_matches_host_subdomain_or_publisher() {
        let trusted = vec!["reuters.com".to_string()];
        let direct = record("https://www.reuters.com/world", "t", None);
        let sub = record("https://uk.reuters.com/a", "t", None);
        let lookalike = record("https://notreuters.com/a", "t", None);
        assert_eq!(domain_trust(&direct, &trusted), 1.0);
        assert_eq!(domain_trust(&sub, &trusted), 1.0);
        assert_eq!(domain_trust(&lookalike, &trusted), 0.0);

        let mut syndicated = record("https://aggregator.example/x", "t", None);
        syndicated.publisher = Some("reuters.com".into());
        assert_eq!(domain_trust(&syndicated, &trusted), 1.0);
    }

    #[test]
    fn strict_mode_multiplies_low_relevance() {
        let settings = QualitySettings::default();
        let scores = SubScores {
            relevance: 0.1,
            recency: 0.9,
            snippet: 0.0,
            domain: 1.0,
        };
        let full = 0.1 * 0.60 + 0.9 * 0.20 + 0.0 * 0.10 + 1.0 * 0.10;
        assert!((scores.final_score(&settings, false) - full).abs() < 1e-9);
        assert!((scores.final_score(&settings, true) - full * 0.35).abs() < 1e-9);

        let relevant = SubScores { relevance: 0.5, ..scores };
        assert!(
            (relevant.final_score(&settings, true) - relevant.weighted(&settings.weights)).abs()
                < 1e-9
        );
    }

    #[test]
    fn extract_and_normalize() {
        assert_eq!(extract_domain("https://WWW.Example.com/path"), "example.com");
        assert_eq!(extract_domain("www.bbc.co.uk"), "bbc.co.uk");
        assert_eq!(
            normalize_url("https://www.example.com/a/b/"),
            "example.com/a/b"
        );
        assert_eq!(
            normalize_url("http://example.com/a/b"),
            normalize_url("https://www.example.com/a/b/")
        );
    }

    #[test]
    fn parse_supported_date_formats() {
        let now = now();
        assert_eq!(
            parse_date("2025-03-01T08:30:00Z", now),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(
            parse_date("2025-03-01T08:30:00", now),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(parse_date("2 days ago", now), Some(now - Duration::days(2)));
        assert_eq!(parse_date("1 month ago", now), Some(now - Duration::days(30)));
        assert_eq!(
            parse_date("Mar 4, 2025", now),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("March 4, 2025", now),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("2025-01-31", now),
            Some(Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("sometime", now), None);
    }

    #[test]
    fn parse_date_out_of_range_relative_is_none() {
        let now = now();
        assert_eq!(parse_date("1000000 years ago", now), None);
        assert_eq!(parse_date("200000000000 days ago", now), None);
        assert_eq!(parse_date("99999999999999999 months ago", now), None);
        assert_eq!(parse_date("2 years ago", now), Some(now - Duration::days(730)));
    }

    #[test]
    fn normalize_rejects_unusable_hits() {
        let now = now();
        let ok = RawSearchResult {
            title: " Title ".into(),
            url: "https://www.example.com/a".into(),
            snippet: Some("   ".into()),
            publisher: None,
            published: Some("1 day ago".into()),
        };
        let record = normalize(ok, SourceKind::News, now).unwrap();
        assert_eq!(record.title, "Title");
        assert_eq!(record.snippet, None);
        assert_eq!(record.publisher.as_deref(), Some("example.com"));
        assert_eq!(record.published_at, Some(now - Duration::days(1)));

        let no_title = RawSearchResult {
            title: "".into(),
            url: "https://example.com".into(),
            ..Default::default()
        };
        let bad_scheme = RawSearchResult {
            title: "t".into(),
            url: "ftp://example.com/file".into(),
            ..Default::default()
        };
        let garbage = RawSearchResult {
            title: "t".into(),
            url: "not a url".into(),
            ..Default::default()
        };
        assert!(normalize(no_title, SourceKind::Web, now).is_none());
        assert!(normalize(bad_scheme, SourceKind::Web, now).is_none());
        assert!(normalize(garbage, SourceKind::Web, now).is_none());
    }

    #[test]
    fn recency_window_keeps_undated() {
        let now = now();
        let mut old = record("https://a.com", "t", None);
        old.published_at = Some(now - Duration::days(10));
        let undated = record("https://b.com", "t", None);
        assert!(!within_window(&old, now, 7));
        assert!(within_window(&old, now, 30));
        assert!(within_window(&undated, now, 7));
    }

    #[test]
    fn allow_then_block_lists() {
        let settings = QualitySettings {
            allowlist: vec!["example.com".into()],
            blocklist: vec!["spam.example.com".into()],
            ..QualitySettings::default()
        };
        assert!(settings.domain_allowed(&record("https://news.example.com/x", "t", None)));
        assert!(!settings.domain_allowed(&record("https://spam.example.com/x", "t", None)));
        assert!(!settings.domain_allowed(&record("https://other.org/x", "t", None)));

        let block_only = QualitySettings {
            blocklist: vec!["other.org".into()],
            ..QualitySettings::default()
        };
        assert!(block_only.domain_allowed(&record("https://example.com/x", "t", None)));
        assert!(!block_only.domain_allowed(&record("https://www.other.org/x", "t", None)));
    }
}
