//! The answer pipeline.
//!
//! Stages run in order until one produces a reply: greeting shortcut, memory
//! corrections, fuzzy Q&A match, LLM completion, website scrape, static
//! fallback. Conversation history is kept per auth session so concurrent
//! users never share context.

pub mod intent;
pub mod matching;

use crate::data;
use crate::llm::{ChatMessage, LlmClient};
use crate::scrape::FaqClient;
use crate::state::QaIndex;
use anyhow::Result;
use dashmap::DashMap;
use matching::normalize_text;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use intent::Intent;

/// System prompt for LLM completions.
const SYSTEM_PROMPT: &str = "You are the university's official chatbot. Be very interactive with the users. \
     Provide detailed, accurate, and context-rich answers about programs, departments, \
     hostels, student life, and fees. Avoid referring users back to the website. \
     Explain as much as possible.\n\n\
     Important note: the university accepts both Ghana Cedis and US Dollars for academic \
     fees. A fixed exchange rate is usually announced each semester for those paying in \
     Ghana Cedis. Always mention this if asked about currency, fees, or payment methods.";

/// Reply when every stage comes up empty.
const FALLBACK_REPLY: &str = "I'm sorry, I couldn't find the answer. \
     Please visit the university website for more information.";

const GREETINGS: &[(&str, &str)] = &[
    ("hi", "Hello! How can I assist you today?"),
    ("hello", "Hi there! How can I help?"),
    ("hey", "Hey! What can I do for you?"),
    ("good morning", "Good morning! How can I assist you?"),
    ("good afternoon", "Good afternoon! Need any help?"),
    ("good evening", "Good evening! Feel free to ask me anything."),
];

/// Phrases that signal the user is correcting the previous answer.
const CORRECTION_KEYWORDS: &[&str] = &[
    "no,",
    "not correct",
    "that's wrong",
    "thats wrong",
    "it's actually",
    "its actually",
    "the correct",
];

/// Messages kept per session before the oldest exchanges are dropped.
const HISTORY_LIMIT: usize = 40;

const LLM_TEMPERATURE: f32 = 0.5;

/// Which stage produced a reply. Recorded in usage logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Greeting,
    Memory,
    Database,
    Llm,
    Scrape,
    Fallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Greeting => "greeting",
            AnswerSource::Memory => "memory",
            AnswerSource::Database => "database",
            AnswerSource::Llm => "llm",
            AnswerSource::Scrape => "scrape",
            AnswerSource::Fallback => "fallback",
        }
    }
}

/// A pipeline reply plus where it came from.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    pub source: AnswerSource,
}

/// Return the canned reply when the normalized input starts with a greeting.
fn greeting_reply(normalized: &str) -> Option<&'static str> {
    // Longest prefix wins so "good morning" isn't swallowed by "good".
    GREETINGS
        .iter()
        .filter(|(greet, _)| {
            normalized == *greet || normalized.starts_with(&format!("{greet} "))
        })
        .max_by_key(|(greet, _)| greet.len())
        .map(|(_, reply)| *reply)
}

/// Does this message look like the user correcting the bot?
fn looks_like_correction(input: &str) -> bool {
    let lower = input.to_lowercase();
    lower == "no"
        || lower.starts_with("no ")
        || CORRECTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Walk history backwards for the last user question and the bot reply that
/// followed it, skipping the current (already appended) message if present.
fn last_exchange(history: &[ChatMessage]) -> Option<(String, String)> {
    let mut answer: Option<&str> = None;
    for msg in history.iter().rev() {
        match msg.role.as_str() {
            "assistant" => {
                if answer.is_none() {
                    answer = Some(&msg.content);
                }
            }
            "user" => {
                if let Some(answer) = answer {
                    return Some((msg.content.clone(), answer.to_string()));
                }
            }
            _ => {}
        }
    }
    None
}

/// The chatbot engine. One instance shared across all requests.
pub struct ChatEngine {
    db_pool: PgPool,
    llm: Option<LlmClient>,
    chat_model: String,
    intent_model: String,
    faq: Option<FaqClient>,
    qa_index: Arc<RwLock<QaIndex>>,
    /// Per-session conversation history, keyed by auth session token.
    histories: DashMap<String, Vec<ChatMessage>>,
}

impl ChatEngine {
    pub fn new(
        db_pool: PgPool,
        llm: Option<LlmClient>,
        chat_model: String,
        intent_model: String,
        faq: Option<FaqClient>,
        qa_index: Arc<RwLock<QaIndex>>,
    ) -> Self {
        Self {
            db_pool,
            llm,
            chat_model,
            intent_model,
            faq,
            qa_index,
            histories: DashMap::new(),
        }
    }

    /// Run the pipeline for one message and record it in the session history.
    pub async fn respond(&self, session_token: &str, input: &str) -> Result<ChatOutcome> {
        let normalized = normalize_text(input);

        if let Some(reply) = greeting_reply(&normalized) {
            self.push_exchange(session_token, input, reply);
            return Ok(ChatOutcome {
                reply: reply.to_string(),
                source: AnswerSource::Greeting,
            });
        }

        // Memory corrections beat everything else: an admin or user has
        // explicitly said the canonical answer was wrong.
        if let Some(correction) = data::memory::find_correction(&self.db_pool, input).await? {
            self.push_exchange(session_token, input, &correction);
            return Ok(ChatOutcome {
                reply: correction,
                source: AnswerSource::Memory,
            });
        }

        // Capture a correction before answering, while the previous exchange
        // is still the most recent one in history.
        if looks_like_correction(input) {
            let previous = self
                .histories
                .get(session_token)
                .and_then(|h| last_exchange(&h));
            if let Some((question, old_answer)) = previous {
                data::memory::insert(&self.db_pool, &question, Some(&old_answer), input).await?;
                info!(question = %question, "stored memory correction");
            }
        }

        if let Some(m) = {
            let index = self.qa_index.read().await;
            matching::best_match(input, index.candidates())
        } {
            if let Some(answer) = data::qa::get_answer(&self.db_pool, m.question_id).await? {
                debug!(question_id = m.question_id, score = m.score, "fuzzy match hit");
                self.push_exchange(session_token, input, &answer);
                return Ok(ChatOutcome {
                    reply: answer,
                    source: AnswerSource::Database,
                });
            }
        }

        if let Some(reply) = self.try_llm(session_token, input).await {
            self.push_exchange(session_token, input, &reply);
            return Ok(ChatOutcome {
                reply,
                source: AnswerSource::Llm,
            });
        }

        if let Some(faq) = &self.faq {
            match faq.lookup(input).await {
                Ok(Some(answer)) => {
                    self.push_exchange(session_token, input, &answer);
                    return Ok(ChatOutcome {
                        reply: answer,
                        source: AnswerSource::Scrape,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "website FAQ lookup failed"),
            }
        }

        self.push_exchange(session_token, input, FALLBACK_REPLY);
        Ok(ChatOutcome {
            reply: FALLBACK_REPLY.to_string(),
            source: AnswerSource::Fallback,
        })
    }

    /// LLM stage: system prompt + session history + current input.
    async fn try_llm(&self, session_token: &str, input: &str) -> Option<String> {
        let llm = self.llm.as_ref()?;

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        if let Some(history) = self.histories.get(session_token) {
            messages.extend(history.iter().cloned());
        }
        messages.push(ChatMessage::user(input));

        match llm.complete(&self.chat_model, &messages, LLM_TEMPERATURE).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "LLM completion failed");
                None
            }
        }
    }

    /// Classify the message intent for usage logging. `Unknown` when no LLM
    /// is configured or the call fails.
    pub async fn classify_intent(&self, input: &str) -> Intent {
        match &self.llm {
            Some(llm) => intent::classify(llm, &self.intent_model, input).await,
            None => Intent::Unknown,
        }
    }

    /// Clear the conversation history for one session.
    pub fn reset_history(&self, session_token: &str) {
        self.histories.remove(session_token);
    }

    /// Messages currently held for a session (used by the session-save flow).
    pub fn history(&self, session_token: &str) -> Vec<ChatMessage> {
        self.histories
            .get(session_token)
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Replace a session's history, e.g. when resuming a saved chat.
    pub fn set_history(&self, session_token: &str, messages: Vec<ChatMessage>) {
        self.histories.insert(session_token.to_string(), messages);
    }

    fn push_exchange(&self, session_token: &str, user: &str, assistant: &str) {
        let mut history = self.histories.entry(session_token.to_string()).or_default();
        history.push(ChatMessage::user(user));
        history.push(ChatMessage::assistant(assistant));
        if history.len() > HISTORY_LIMIT {
            let excess = history.len() - HISTORY_LIMIT;
            history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_prefix_match() {
        assert_eq!(
            greeting_reply("hello"),
            Some("Hi there! How can I help?")
        );
        assert_eq!(
            greeting_reply("good morning everyone"),
            Some("Good morning! How can I assist you?")
        );
    }

    #[test]
    fn test_greeting_requires_word_boundary() {
        // "hitchhiking" starts with "hi" but is not a greeting.
        assert_eq!(greeting_reply("hitchhiking routes"), None);
    }

    #[test]
    fn test_non_greeting_passes_through() {
        assert_eq!(greeting_reply("what are the fees"), None);
    }

    #[test]
    fn test_correction_detection() {
        assert!(looks_like_correction("No, the fee is 500 cedis"));
        assert!(looks_like_correction("that's wrong, it opens in March"));
        assert!(looks_like_correction("It's actually on the north campus"));
        assert!(!looks_like_correction("where is the north campus"));
        // "no" embedded in a word must not trigger.
        assert!(!looks_like_correction("tell me about the nautical program"));
    }

    #[test]
    fn test_last_exchange_finds_previous_pair() {
        let history = vec![
            ChatMessage::user("when does registration open"),
            ChatMessage::assistant("Registration opens in September."),
        ];
        let (q, a) = last_exchange(&history).unwrap();
        assert_eq!(q, "when does registration open");
        assert_eq!(a, "Registration opens in September.");
    }

    #[test]
    fn test_last_exchange_skips_unanswered_user_message() {
        let history = vec![
            ChatMessage::user("first question"),
            ChatMessage::assistant("first answer"),
            ChatMessage::user("unanswered follow-up"),
        ];
        let (q, a) = last_exchange(&history).unwrap();
        assert_eq!(q, "first question");
        assert_eq!(a, "first answer");
    }

    #[test]
    fn test_last_exchange_empty_history() {
        assert_eq!(last_exchange(&[]), None);
    }

    #[test]
    fn test_answer_source_labels() {
        assert_eq!(AnswerSource::Database.as_str(), "database");
        assert_eq!(AnswerSource::Fallback.as_str(), "fallback");
    }
}
