//! Formats ranked records into the text block handed to the agent.

use hottake_core::search::{SourceKind, SourceRecord};

const SNIPPET_MAX_CHARS: usize = 200;

/// Render web results then news results, truncated to `char_budget`.
///
/// Returns `None` when there is nothing to say, so the prompt falls back
/// to its context-free form.
pub fn build_context(records: &[SourceRecord], char_budget: usize) -> Option<String> {
    let blocks: Vec<String> = [
        (SourceKind::Web, "Web search results:"),
        (SourceKind::News, "Recent news and headlines:"),
    ]
    .into_iter()
    .filter_map(|(kind, header)| {
        let entries: Vec<&SourceRecord> = records.iter().filter(|r| r.kind == kind).collect();
        (!entries.is_empty()).then(|| format_block(header, &entries))
    })
    .collect();

    if blocks.is_empty() || char_budget == 0 {
        return None;
    }
    Some(truncate_chars(&blocks.join("\n\n"), char_budget))
}

fn format_block(header: &str, entries: &[&SourceRecord]) -> String {
    let mut parts = vec![header.to_string()];
    for (i, record) in entries.iter().enumerate() {
        let mut entry = format!("\n{}. {}", i + 1, record.title);
        if let Some(publisher) = &record.publisher {
            entry.push_str(&format!(" ({publisher})"));
        }
        if let Some(published) = record.published_at {
            entry.push_str(&format!(" - {}", published.format("%Y-%m-%d")));
        }
        if let Some(snippet) = &record.snippet {
            entry.push_str(&format!("\n   {}", shorten(snippet)));
        }
        entry.push_str(&format!("\n   URL: {}", record.url));
        parts.push(entry);
    }
    parts.join("\n")
}

fn shorten(snippet: &str) -> String {
    if snippet.chars().count() > SNIPPET_MAX_CHARS {
        let kept: String = snippet.chars().take(SNIPPET_MAX_CHARS - 3).collect();
        format!("{kept}...")
    } else {
        snippet.to_string()
    }
}

fn truncate_chars(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(kind: SourceKind, title: &str, snippet: Option<&str>) -> SourceRecord {
        SourceRecord {
            kind,
            title: title.into(),
            url: format!("https://example.com/{}", title.replace(' ', "-")),
            snippet: snippet.map(String::from),
            publisher: Some("example.com".into()),
            published_at: None,
            score: 0.0,
        }
    }

    #[test]
    fn empty_records_have_no_context() {
        assert!(build_context(&[], 4000).is_none());
    }

    #[test]
    fn web_block_precedes_news_block() {
        let mut news = record(SourceKind::News, "Headline", Some("Summary"));
        news.published_at = Some(Utc.with_ymd_and_hms(2025, 3, 9, 14, 0, 0).unwrap());
        let web = record(SourceKind::Web, "Page", None);

        let context = build_context(&[news, web], 4000).unwrap();
        let web_at = context.find("Web search results:").unwrap();
        let news_at = context.find("Recent news and headlines:").unwrap();
        assert!(web_at < news_at);
        assert!(context.contains("1. Headline (example.com) - 2025-03-09\n   Summary\n   URL: https://example.com/Headline"));
        assert!(context.contains("1. Page (example.com)\n   URL: https://example.com/Page"));
    }

    #[test]
    fn long_snippets_are_shortened() {
        let long = "a".repeat(300);
        let context = build_context(&[record(SourceKind::Web, "T", Some(&long))], 4000).unwrap();
        assert!(context.contains(&format!("{}...", "a".repeat(197))));
        assert!(!context.contains(&"a".repeat(198)));
    }

    #[test]
    fn context_respects_char_budget() {
        let records: Vec<_> = (0..20)
            .map(|i| record(SourceKind::Web, &format!("title {i}"), Some("é snippet")))
            .collect();
        let context = build_context(&records, 100).unwrap();
        assert_eq!(context.chars().count(), 100);
    }
}
