//! Web search tool - DuckDuckGo HTML endpoint (no API key required)

use crate::error::{Error, Result};
use crate::registry::{
    str_arg, ParamKind, ParamSpec, RiskLevel, Tool, ToolCategory, ToolOutput, ToolSpec, Trigger,
};
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of results
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Maximum number of results ever returned
const MAX_RESULTS_CAP: usize = 10;

/// Snippets are cut to this many characters
const SNIPPET_CHARS: usize = 200;

/// HTTP timeout for the search request
const SEARCH_TIMEOUT_SECS: u64 = 15;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SEARCH_PATTERN: &str =
    r"(?is)^(?:search|look\s+up|find|google|web)\b\s*(?:for\b\s*)?(?P<args>.*)$";

/// A single search result entry
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SearchResult {
    /// Result title
    pub title: String,
    /// Destination URL
    pub url: String,
    /// Short snippet
    pub snippet: String,
}

/// Web search tool
pub struct WebSearchTool {
    spec: ToolSpec,
    client: Client,
    max_results: usize,
}

impl WebSearchTool {
    /// Create a new web search tool
    pub fn new(max_results: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let spec = ToolSpec::new(
            "web_search",
            "Search the web using DuckDuckGo and return titles, links and snippets",
        )
        .with_usage("search <query>")
        .with_category(ToolCategory::Search)
        .with_risk_level(RiskLevel::Low)
        .with_param(ParamSpec::required("query", ParamKind::String))
        .with_trigger(Trigger::pattern(SEARCH_PATTERN));

        Ok(Self {
            spec,
            client,
            max_results: max_results.clamp(1, MAX_RESULTS_CAP),
        })
    }

    async fn fetch(&self, query: &str) -> Result<String> {
        let form = format!("q={}", urlencoding::encode(query));
        debug!(query = %query, "Fetching DuckDuckGo results");

        let response = self
            .client
            .post(SEARCH_URL)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .header(reqwest::header::REFERER, "https://html.duckduckgo.com/")
            .body(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(SEARCH_TIMEOUT_SECS * 1000)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "search returned status {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if html.contains("anomaly-modal") {
            warn!("DuckDuckGo returned a CAPTCHA page");
            return Err(Error::Network("search temporarily blocked".to_string()));
        }
        Ok(html)
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let query = str_arg(&input, "query")?;
        let html = self.fetch(query).await?;
        let results = parse_search_results(&html, self.max_results)?;

        let text = format_results(query, &results);
        Ok(ToolOutput::text(text).with_data(serde_json::json!({
            "query": query,
            "results": results,
        })))
    }
}

/// Render results as numbered lines
#[must_use]
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for \"{}\".", query);
    }
    let mut out = format!("Results for \"{}\":", query);
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("\n\n{}. {}\n{}", i + 1, r.title, r.url));
        if !r.snippet.is_empty() {
            out.push('\n');
            out.push_str(&r.snippet);
        }
    }
    out
}

/// Parse search results from DuckDuckGo HTML
pub fn parse_search_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let title_re = Regex::new(r#"(?s)<a[^>]+class="result__a"[^>]+href="([^"]*)"[^>]*>(.*?)</a>"#)
        .map_err(|e| Error::Execution(e.to_string()))?;
    let snippet_re = Regex::new(r#"(?s)<a[^>]+class="result__snippet"[^>]*>(.*?)</a>"#)
        .map_err(|e| Error::Execution(e.to_string()))?;
    let tag_re = Regex::new(r"<[^>]+>").map_err(|e| Error::Execution(e.to_string()))?;

    let snippets: Vec<String> = snippet_re
        .captures_iter(html)
        .map(|cap| strip_html_tags(&tag_re, cap.get(1).map_or("", |m| m.as_str())))
        .collect();

    let results = title_re
        .captures_iter(html)
        .enumerate()
        .map(|(i, cap)| SearchResult {
            url: extract_real_url(cap.get(1).map_or("", |m| m.as_str())),
            title: strip_html_tags(&tag_re, cap.get(2).map_or("", |m| m.as_str())),
            snippet: shorten(snippets.get(i).map(String::as_str).unwrap_or_default()),
        })
        .filter(|r| !r.url.is_empty() && !r.title.is_empty())
        .take(max_results)
        .collect();

    Ok(results)
}

/// DuckDuckGo wraps URLs in a redirect: `//duckduckgo.com/l/?uddg=REAL_URL&...`
fn extract_real_url(raw: &str) -> String {
    match raw.find("uddg=") {
        Some(pos) => {
            let rest = &raw[pos + 5..];
            let encoded = &rest[..rest.find('&').unwrap_or(rest.len())];
            urlencoding::decode(encoded)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| encoded.to_string())
        }
        None => raw.to_string(),
    }
}

fn strip_html_tags(tag_re: &Regex, s: &str) -> String {
    tag_re
        .replace_all(s, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn shorten(s: &str) -> String {
    if s.chars().count() <= SNIPPET_CHARS {
        return s.to_string();
    }
    let cut: String = s.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
        <div class="result">
            <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=abc">Example <b>Title</b></a>
            <a class="result__snippet" href="x">This is a snippet &amp; more.</a>
        </div>
        <div class="result">
            <a rel="nofollow" class="result__a" href="https://rust-lang.org">Rust</a>
            <a class="result__snippet" href="y">A language.</a>
        </div>
    "#;

    #[test]
    fn test_parse_sample_html() {
        let results = parse_search_results(SAMPLE, 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Example Title");
        assert_eq!(results[0].url, "https://example.com");
        assert_eq!(results[0].snippet, "This is a snippet & more.");
        assert_eq!(results[1].url, "https://rust-lang.org");
    }

    #[test]
    fn test_parse_respects_max() {
        let results = parse_search_results(SAMPLE, 1).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_parse_empty_html() {
        assert!(parse_search_results("", 5).unwrap().is_empty());
    }

    #[test]
    fn test_extract_real_url() {
        let raw = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1&rut=abc";
        assert_eq!(extract_real_url(raw), "https://example.com/a?b=1");
        assert_eq!(extract_real_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_shorten() {
        let long = "a".repeat(250);
        let short = shorten(&long);
        assert_eq!(short.len(), 203);
        assert!(short.ends_with("..."));
        assert_eq!(shorten("tiny"), "tiny");
    }

    #[test]
    fn test_format_results() {
        assert_eq!(format_results("zz", &[]), "No results found for \"zz\".");

        let results = parse_search_results(SAMPLE, 5).unwrap();
        let text = format_results("example", &results);
        assert!(text.starts_with("Results for \"example\":"));
        assert!(text.contains("1. Example Title\nhttps://example.com"));
        assert!(text.contains("2. Rust"));
    }

    #[test]
    fn test_search_pattern() {
        let re = Regex::new(SEARCH_PATTERN).unwrap();
        let caps = re.captures("search for rust async").unwrap();
        assert_eq!(&caps["args"], "rust async");
        let caps = re.captures("Look up tokio").unwrap();
        assert_eq!(&caps["args"], "tokio");
        assert!(re.captures("finder of things").is_none());
        assert!(re.captures("please search").is_none());
    }

    #[tokio::test]
    async fn test_empty_query() {
        let tool = WebSearchTool::new(DEFAULT_MAX_RESULTS).unwrap();
        let err = tool.execute(json!({"query": "  "})).await.unwrap_err();
        assert!(err.is_invalid_input());
    }
}
