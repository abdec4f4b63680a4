//! Optional LLM-backed metadata completion.
//!
//! When extraction leaves any of author/year/medium/keywords at the
//! `"Unknown"` sentinel, the enhancer sends an excerpt of the article body
//! to a chat-completion service and asks for a fixed-format labeled answer.
//! Each label is parsed independently; a value is accepted only when it is
//! non-empty and not itself `"Unknown"`, and fields the extractor already
//! resolved are never overwritten. A failed service call is non-fatal: the
//! item proceeds with whatever metadata it already had.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::item::{ContentItem, UNKNOWN};

/// Character budget for the article excerpt sent to the service.
pub const EXCERPT_BUDGET: usize = 3000;

/// Default key file, checked before the environment variable.
pub const KEY_FILE: &str = "openai_api_key.txt";

const ENV_KEY: &str = "OPENAI_API_KEY";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Fields the enhancer may supply. `None` means the service declined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhancedFields {
    pub author: Option<String>,
    pub year: Option<String>,
    pub medium: Option<String>,
    pub keywords: Option<String>,
}

/// Metadata completion backend.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Asks the service to fill metadata gaps from the article excerpt.
    /// Returns `None` on any failure; the caller carries on.
    async fn enhance(&self, excerpt: &str, title: &str) -> Option<EnhancedFields>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Returns `None` always; used when no API key is available.
pub struct DisabledEnhancer;

#[async_trait]
impl Enhancer for DisabledEnhancer {
    async fn enhance(&self, _excerpt: &str, _title: &str) -> Option<EnhancedFields> {
        None
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// OpenAI-backed enhancer using the Chat Completions API.
pub struct OpenAiEnhancer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiEnhancer {
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("vernissage/1.0 (+github.com/stormlightlabs/vernissage)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");

        Self { http, api_key, model: model_override.unwrap_or(DEFAULT_MODEL).to_string() }
    }
}

#[async_trait]
impl Enhancer for OpenAiEnhancer {
    async fn enhance(&self, excerpt: &str, title: &str) -> Option<EnhancedFields> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let sys = "You identify artwork metadata in art-history articles. \
                   Respond with exactly four lines:\n\
                   Author: <creator of the works discussed>\n\
                   Year: <4-digit year>\n\
                   Medium: <artistic medium>\n\
                   Keywords: <comma-separated tags>\n\
                   Write Unknown for anything the text does not establish.";
        let user = format!("Article title: {}\n\nArticle text:\n{}", title, truncate_excerpt(excerpt));

        let req = Req {
            model: &self.model,
            messages: vec![Msg { role: "system", content: sys }, Msg { role: "user", content: &user }],
            temperature: 0.2,
            max_tokens: 120,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            debug!(status = %resp.status(), "enhancer call rejected");
            return None;
        }

        let body: Resp = resp.json().await.ok()?;
        let content = body.choices.first().map(|c| c.message.content.as_str()).unwrap_or("");
        let fields = parse_labeled_response(content);

        if fields == EnhancedFields::default() { None } else { Some(fields) }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Resolves the API key: local key file first, environment second.
pub fn resolve_api_key(key_file: &Path) -> Option<String> {
    if let Ok(contents) = fs::read_to_string(key_file) {
        let key = contents.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }

    env::var(ENV_KEY).ok().map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Builds an enhancer from whatever key is available; absence of a key
/// disables enhancement without failing the run.
pub fn build_enhancer(key_file: &Path) -> Arc<dyn Enhancer> {
    match resolve_api_key(key_file) {
        Some(key) => Arc::new(OpenAiEnhancer::new(key, None)),
        None => {
            info!("no API key found, metadata enhancement disabled");
            Arc::new(DisabledEnhancer)
        }
    }
}

/// Parses the fixed-format labeled response, one label at a time.
///
/// Unrecognized lines are ignored, as are empty values and the literal
/// `Unknown` sentinel the prompt asks the model to use.
pub fn parse_labeled_response(text: &str) -> EnhancedFields {
    let mut fields = EnhancedFields::default();

    for line in text.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(UNKNOWN) {
            continue;
        }

        match label.trim().to_lowercase().as_str() {
            "author" => fields.author = Some(value.to_string()),
            "year" => fields.year = Some(value.to_string()),
            "medium" => fields.medium = Some(value.to_string()),
            "keywords" => fields.keywords = Some(value.to_string()),
            _ => {}
        }
    }

    fields
}

/// Fills the item's unresolved fields from the enhancement result.
/// Fields the extractor already resolved are never overwritten.
pub fn apply_enhancement(item: &mut ContentItem, fields: &EnhancedFields) {
    if item.author == UNKNOWN
        && let Some(author) = &fields.author
    {
        item.author = author.clone();
    }
    if item.year == UNKNOWN
        && let Some(year) = &fields.year
    {
        item.year = year.clone();
    }
    if item.medium == UNKNOWN
        && let Some(medium) = &fields.medium
    {
        item.medium = medium.clone();
    }
    if item.keywords == UNKNOWN
        && let Some(keywords) = &fields.keywords
    {
        item.keywords = keywords.clone();
    }
}

/// Truncates the excerpt to the character budget on a char boundary.
fn truncate_excerpt(excerpt: &str) -> &str {
    match excerpt.char_indices().nth(EXCERPT_BUDGET) {
        Some((idx, _)) => &excerpt[..idx],
        None => excerpt,
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn test_parse_labeled_response() {
        let text = "Author: Jane Smith\nYear: 1898\nMedium: lithograph\nKeywords: posters, art nouveau";
        let fields = parse_labeled_response(text);

        assert_eq!(fields.author.as_deref(), Some("Jane Smith"));
        assert_eq!(fields.year.as_deref(), Some("1898"));
        assert_eq!(fields.medium.as_deref(), Some("lithograph"));
        assert_eq!(fields.keywords.as_deref(), Some("posters, art nouveau"));
    }

    #[test]
    fn test_parse_skips_unknown_and_noise() {
        let text = "Here is what I found:\nAuthor: Unknown\nYear: 1920\nMedium:\nColor: blue";
        let fields = parse_labeled_response(text);

        assert!(fields.author.is_none());
        assert_eq!(fields.year.as_deref(), Some("1920"));
        assert!(fields.medium.is_none());
        assert!(fields.keywords.is_none());
    }

    #[test]
    fn test_apply_never_overwrites_resolved_fields() {
        let mut item = ContentItem::new(Url::parse("https://example.com/a").unwrap());
        item.author = "Resolved Author".to_string();

        let fields = EnhancedFields {
            author: Some("Other Author".to_string()),
            year: Some("1900".to_string()),
            medium: None,
            keywords: Some("tags".to_string()),
        };
        apply_enhancement(&mut item, &fields);

        assert_eq!(item.author, "Resolved Author");
        assert_eq!(item.year, "1900");
        assert_eq!(item.medium, UNKNOWN);
        assert_eq!(item.keywords, "tags");
    }

    #[test]
    fn test_truncate_excerpt() {
        let short = "short text";
        assert_eq!(truncate_excerpt(short), short);

        let long = "x".repeat(EXCERPT_BUDGET + 100);
        assert_eq!(truncate_excerpt(&long).chars().count(), EXCERPT_BUDGET);
    }

    #[test]
    fn test_resolve_api_key_prefers_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("key.txt");
        fs::write(&key_file, "file-key\n").unwrap();

        assert_eq!(resolve_api_key(&key_file).as_deref(), Some("file-key"));
    }

    #[tokio::test]
    async fn test_disabled_enhancer_returns_none() {
        let enhancer = DisabledEnhancer;
        assert!(enhancer.enhance("text", "title").await.is_none());
        assert_eq!(enhancer.name(), "disabled");
    }
}
