//! University website FAQ fallback.
//!
//! Tries the site's FAQ endpoint as JSON first; if the response turns out to
//! be an HTML page instead, scrapes the FAQ entries out of it and picks the
//! best match for the question.

use crate::chatbot::matching::{normalize_text, similarity_ratio};
use anyhow::{Context, Result};
use html_scraper::{Html, Selector};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

/// The site is a fallback, not the primary answer path. Keep the wait short.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum similarity for a scraped FAQ entry to count as an answer.
const SCRAPE_MATCH_THRESHOLD: f64 = 0.70;

#[derive(Deserialize)]
struct FaqApiResponse {
    answer: Option<String>,
}

/// A question/answer pair extracted from the FAQ page markup.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Client for the university FAQ endpoint.
pub struct FaqClient {
    http: reqwest::Client,
    faq_url: String,
}

impl FaqClient {
    pub fn new(faq_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build FAQ HTTP client")?;
        Ok(Self { http, faq_url })
    }

    /// Look up an answer on the university website. Returns `None` when the
    /// site has nothing relevant; errors are for transport-level failures.
    pub async fn lookup(&self, question: &str) -> Result<Option<String>> {
        let resp = self
            .http
            .get(&self.faq_url)
            .query(&[("query", question)])
            .send()
            .await
            .context("FAQ request failed")?;

        let status = resp.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "FAQ endpoint returned non-success");
            return Ok(None);
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = resp.text().await.context("failed to read FAQ body")?;

        if content_type.contains("application/json") {
            let parsed: FaqApiResponse = crate::json::parse_json_with_context(&body)?;
            return Ok(parsed.answer.filter(|a| !a.trim().is_empty()));
        }

        // Endpoint served a page rather than an API payload; scrape it.
        let entries = parse_faq_page(&body);
        trace!(entries = entries.len(), "scraped FAQ page");
        Ok(best_entry_answer(&entries, question))
    }
}

/// Extract FAQ entries from page markup.
///
/// Handles the two structures the university site has used: definition lists
/// (`dt`/`dd`) and `.faq-item` blocks with `.question`/`.answer` children.
pub fn parse_faq_page(html: &str) -> Vec<FaqEntry> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    let dt_sel = Selector::parse("dl dt").expect("valid selector");
    let dd_sel = Selector::parse("dd").expect("valid selector");
    for dt in document.select(&dt_sel) {
        let question = text_of(&dt);
        let answer = dt
            .next_siblings()
            .filter_map(html_scraper::ElementRef::wrap)
            .find(|el| dd_sel.matches(el))
            .map(|el| text_of(&el));
        if let Some(answer) = answer
            && !question.is_empty()
            && !answer.is_empty()
        {
            entries.push(FaqEntry { question, answer });
        }
    }

    let item_sel = Selector::parse(".faq-item").expect("valid selector");
    let q_sel = Selector::parse(".question").expect("valid selector");
    let a_sel = Selector::parse(".answer").expect("valid selector");
    for item in document.select(&item_sel) {
        let question = item.select(&q_sel).next().map(|el| text_of(&el));
        let answer = item.select(&a_sel).next().map(|el| text_of(&el));
        if let (Some(question), Some(answer)) = (question, answer)
            && !question.is_empty()
            && !answer.is_empty()
        {
            entries.push(FaqEntry { question, answer });
        }
    }

    entries
}

/// Pick the answer of the entry most similar to `question`, if any entry
/// clears [`SCRAPE_MATCH_THRESHOLD`].
fn best_entry_answer(entries: &[FaqEntry], question: &str) -> Option<String> {
    let needle = normalize_text(question);
    entries
        .iter()
        .map(|e| (similarity_ratio(&needle, &normalize_text(&e.question)), e))
        .filter(|(score, _)| *score > SCRAPE_MATCH_THRESHOLD)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, e)| e.answer.clone())
}

fn text_of(el: &html_scraper::ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAQ_HTML: &str = r#"
        <html><body>
        <dl>
            <dt>What are the admission requirements?</dt>
            <dd>Applicants need WASSCE passes in six subjects.</dd>
            <dt>Do you offer accommodation?</dt>
            <dd>Yes, on-campus hostels are available for all students.</dd>
        </dl>
        <div class="faq-item">
            <h3 class="question">How much is the tuition?</h3>
            <p class="answer">Fees are published per programme each semester.</p>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_definition_list_and_items() {
        let entries = parse_faq_page(FAQ_HTML);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].question, "What are the admission requirements?");
        assert_eq!(
            entries[1].answer,
            "Yes, on-campus hostels are available for all students."
        );
        assert_eq!(entries[2].question, "How much is the tuition?");
    }

    #[test]
    fn test_best_entry_requires_similarity() {
        let entries = parse_faq_page(FAQ_HTML);

        let hit = best_entry_answer(&entries, "what are the admission requirements");
        assert_eq!(
            hit.as_deref(),
            Some("Applicants need WASSCE passes in six subjects.")
        );

        let miss = best_entry_answer(&entries, "when does the football season start");
        assert_eq!(miss, None);
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_faq_page("<html><body><p>nothing here</p></body></html>").is_empty());
    }
}
