//! DuckDuckGo search (no API key required).
//!
//! Web results come from the HTML endpoint. When that fails or yields
//! nothing, the instant answer API is tried instead.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use regex::{Captures, Regex};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::{SearchClient, SearchHit, format_hits, http_client};
use crate::error::{DraftgateError, Result};

const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const DUCKDUCKGO_API_URL: &str = "https://api.duckduckgo.com/";

/// Sponsored results link through this path
const AD_REDIRECT_PATH: &str = "duckduckgo.com/y.js";

/// Extracts web results from the DuckDuckGo HTML endpoint
pub struct ResultPageParser {
    title: Regex,
    href: Regex,
    snippet: Regex,
    tag: Regex,
    entity: Regex,
}

impl ResultPageParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| DraftgateError::Search(format!("Invalid result pattern: {}", e)))
        };
        Ok(Self {
            title: compile(r#"(?s)<a\b([^>]*\bclass="[^"]*\bresult__a\b[^"]*"[^>]*)>(.*?)</a>"#)?,
            href: compile(r#"\bhref="([^"]*)""#)?,
            snippet: compile(
                r#"(?s)<(a|div|td)\b[^>]*\bclass="[^"]*\bresult__snippet\b[^"]*"[^>]*>(.*?)</(?:a|div|td)>"#,
            )?,
            tag: compile(r"(?s)<[^>]*>")?,
            entity: compile(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);")?,
        })
    }

    /// Pull up to `max_results` hits out of a result page. Each title is
    /// paired with the first snippet before the next title. Ads are skipped.
    pub fn parse(&self, html: &str, max_results: usize) -> Vec<SearchHit> {
        let titles: Vec<Captures> = self.title.captures_iter(html).collect();
        let mut hits = Vec::new();

        for (i, caps) in titles.iter().enumerate() {
            if hits.len() >= max_results {
                break;
            }
            let (Some(whole), Some(attrs), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };

            let url = self
                .href
                .captures(attrs.as_str())
                .and_then(|c| c.get(1))
                .map(|m| self.resolve_link(m.as_str()))
                .unwrap_or_default();
            if url.contains(AD_REDIRECT_PATH) {
                continue;
            }

            let title = self.clean_text(inner.as_str());
            if title.is_empty() {
                continue;
            }

            let section_end = titles
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(html.len());
            let snippet = self
                .snippet
                .captures(&html[whole.end()..section_end])
                .and_then(|c| c.get(2))
                .map(|m| self.clean_text(m.as_str()))
                .unwrap_or_default();

            hits.push(SearchHit {
                title,
                url,
                snippet,
            });
        }

        hits
    }

    /// Strip markup, decode entities and collapse whitespace
    fn clean_text(&self, fragment: &str) -> String {
        let text = self.tag.replace_all(fragment, "");
        self.decode_entities(&text)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn decode_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                let decoded = match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => name.strip_prefix('#').and_then(|code| {
                        let value = match code.strip_prefix(['x', 'X']) {
                            Some(hex) => u32::from_str_radix(hex, 16).ok(),
                            None => code.parse().ok(),
                        };
                        value.and_then(char::from_u32)
                    }),
                };
                decoded.map_or_else(|| caps[0].to_string(), String::from)
            })
            .into_owned()
    }

    /// Result links go through a `/l/?uddg=<target>` redirect; unwrap it
    fn resolve_link(&self, href: &str) -> String {
        let href = self.decode_entities(href);
        let absolute = match href.strip_prefix("//") {
            Some(rest) => format!("https://{}", rest),
            None => href,
        };
        Url::parse(&absolute)
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(key, _)| key == "uddg")
                    .map(|(_, target)| target.into_owned())
            })
            .unwrap_or(absolute)
    }
}

pub struct DuckDuckGoSearch {
    client: Client,
    parser: ResultPageParser,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(max_results: usize, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            parser: ResultPageParser::new()?,
            max_results,
        })
    }

    async fn search_web(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(DUCKDUCKGO_HTML_URL)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| DraftgateError::Search(format!("DuckDuckGo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DraftgateError::Search(format!("DuckDuckGo error {}", status)));
        }

        let html = response.text().await.map_err(|e| {
            DraftgateError::Search(format!("Failed to read DuckDuckGo response: {}", e))
        })?;
        Ok(self.parser.parse(&html, self.max_results))
    }

    async fn search_instant(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(DUCKDUCKGO_API_URL)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await
            .map_err(|e| DraftgateError::Search(format!("DuckDuckGo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DraftgateError::Search(format!(
                "DuckDuckGo error {}: {}",
                status, error_text
            )));
        }

        let data: Value = response.json().await.map_err(|e| {
            DraftgateError::Search(format!("Failed to parse DuckDuckGo response: {}", e))
        })?;
        Ok(parse_instant_answer(&data, self.max_results))
    }
}

/// Extract hits from an instant-answer payload: the abstract first, then
/// related topics (flattening grouped topics) up to `max_results`.
pub fn parse_instant_answer(data: &Value, max_results: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    if let Some(abstract_text) = data["AbstractText"].as_str().filter(|t| !t.is_empty()) {
        hits.push(SearchHit {
            title: data["Heading"].as_str().unwrap_or("Result").to_string(),
            url: data["AbstractURL"].as_str().unwrap_or("").to_string(),
            snippet: abstract_text.to_string(),
        });
    }

    let topics = data["RelatedTopics"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|topic| match topic["Topics"].as_array() {
            Some(group) => group.iter().collect::<Vec<_>>(),
            None => vec![topic],
        });

    for topic in topics {
        if hits.len() >= max_results {
            break;
        }
        let Some(text) = topic["Text"].as_str().filter(|t| !t.is_empty()) else {
            continue;
        };
        let title = text.split(" - ").next().unwrap_or(text);
        hits.push(SearchHit {
            title: title.to_string(),
            url: topic["FirstURL"].as_str().unwrap_or("").to_string(),
            snippet: text.to_string(),
        });
    }

    hits.truncate(max_results);
    hits
}

#[async_trait]
impl SearchClient for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "DuckDuckGo"
    }

    async fn search(&self, query: &str) -> Result<String> {
        let hits = match self.search_web(query).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                debug!("No DuckDuckGo web results for {:?}, trying instant answers", query);
                self.search_instant(query).await?
            }
            Err(e) => {
                warn!("DuckDuckGo web search failed ({}), trying instant answers", e);
                self.search_instant(query).await?
            }
        };

        debug!("DuckDuckGo returned {} hits for {:?}", hits.len(), query);
        Ok(format_hits(&hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_abstract_and_topics() {
        let data = json!({
            "Heading": "Financial technology",
            "AbstractText": "Fintech refers to software for financial services.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Financial_technology",
            "RelatedTopics": [
                { "Text": "Open banking - sharing of financial data", "FirstURL": "https://duckduckgo.com/Open_banking" },
                { "Name": "See also", "Topics": [
                    { "Text": "Regtech - regulatory technology", "FirstURL": "https://duckduckgo.com/Regtech" }
                ]},
                { "Text": "", "FirstURL": "https://duckduckgo.com/empty" }
            ]
        });

        let hits = parse_instant_answer(&data, 5);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Financial technology");
        assert_eq!(hits[1].title, "Open banking");
        assert_eq!(hits[1].url, "https://duckduckgo.com/Open_banking");
        assert_eq!(hits[2].title, "Regtech");
    }

    #[test]
    fn test_parse_respects_max_results() {
        let topics: Vec<Value> = (0..10)
            .map(|i| json!({ "Text": format!("Topic {}", i), "FirstURL": "" }))
            .collect();
        let data = json!({ "AbstractText": "", "RelatedTopics": topics });

        let hits = parse_instant_answer(&data, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[2].snippet, "Topic 2");
    }

    #[test]
    fn test_parse_empty_payload() {
        assert!(parse_instant_answer(&json!({}), 5).is_empty());
    }

    const RESULT_PAGE: &str = r#"
<div class="result results_links results_links_deep result--ad">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://duckduckgo.com/y.js?ad_domain=vendor.example">Buy <b>Fintech</b> Security</a>
  </h2>
  <a class="result__snippet" href="https://duckduckgo.com/y.js?ad_domain=vendor.example">Sponsored</a>
</div>
<div class="result results_links results_links_deep web-result ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Ffintech%2D2026&amp;rut=abc">2026 <b>Fintech</b> Threat Outlook</a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Ffintech%2D2026">Ransomware &amp; API abuse top the list of <b>cybersecurity</b>
      risks for banks&#x27; partners.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://regulator.example/dora">DORA &quot;operational resilience&quot; guide</a>
    </h2>
  </div>
</div>
"#;

    fn parser() -> ResultPageParser {
        ResultPageParser::new().unwrap()
    }

    #[test]
    fn test_parse_result_page() {
        let hits = parser().parse(RESULT_PAGE, 5);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "2026 Fintech Threat Outlook");
        assert_eq!(hits[0].url, "https://example.com/fintech-2026");
        assert_eq!(
            hits[0].snippet,
            "Ransomware & API abuse top the list of cybersecurity risks for banks' partners."
        );
        assert_eq!(hits[1].title, r#"DORA "operational resilience" guide"#);
        assert_eq!(hits[1].url, "https://regulator.example/dora");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_result_page_respects_max_results() {
        let hits = parser().parse(RESULT_PAGE, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://example.com/fintech-2026");
    }

    #[test]
    fn test_parse_page_without_results() {
        let html = "<html><body><div class=\"no-results\">No results.</div></body></html>";
        assert!(parser().parse(html, 5).is_empty());
    }

    #[test]
    fn test_decode_entities() {
        let parser = parser();
        assert_eq!(parser.decode_entities("a &amp; b &lt;c&gt; &#39;d&#39;"), "a & b <c> 'd'");
        assert_eq!(parser.decode_entities("&#X41;&#66;"), "AB");
        assert_eq!(parser.decode_entities("&unknown; &#xD800;"), "&unknown; &#xD800;");
    }

    #[test]
    fn test_name() {
        assert_eq!(DuckDuckGoSearch::new(5, None).unwrap().name(), "DuckDuckGo");
    }
}
