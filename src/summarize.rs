//! Scrape-and-summarize stage.
//!
//! One text call with provider-side web retrieval turned on: the provider
//! reads the page at the URL and answers with metadata, two posts and the
//! key insights as JSON. The reply is validated strictly; anything off-shape
//! is a [`PipelineError::SummaryFormat`], never silently repaired.

use crate::backend::TextRequest;
use crate::error::{PipelineError, Result};
use crate::exec_ctx::ExecCtx;
use crate::parsing;
use crate::prompt;
use crate::stage::{BoxFut, Requested, Stage, Summarized};
use crate::types::{
    ArticleMeta, ArticleSummary, StageName, KEY_INSIGHTS_RANGE, SHORT_POST_MAX_CHARS,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use url::Url;

const SYSTEM_PROMPT: &str = "You are an expert social media content creator for management \
consulting firms. You create professional, insight-driven content that engages business \
executives and thought leaders.";

const USER_TEMPLATE: &str = r#"You write social media content for a prestigious management consulting firm.
Your style is professional yet approachable, data-driven, clear, concise and thought-provoking.

Read the article at this URL: {url}

Produce:

1. A LinkedIn post of 3-5 sentences: open with a hook, include 2-3 key takeaways,
   close with a question or call to action. Professional tone for a B2B audience.

2. An X/Twitter post of at most 280 characters: punchy, 1-2 insights, strategic
   line breaks, at most 2 emojis, ending with a question or call to action.

3. Between 3 and 5 key insights, each one short sentence.

4. The article title, author and publication date (author and date may be null).

Answer with exactly this JSON object and nothing else:
{{
  "linkedin_post": "...",
  "twitter_post": "...",
  "key_insights": ["...", "...", "..."],
  "article_title": "...",
  "article_author": "... or null",
  "article_date": "... or null"
}}

If the page cannot be retrieved or read, answer with {{"error": "<reason>"}} instead."#;

/// Placeholder values models emit instead of `null`.
const ABSENT_MARKERS: &[&str] = &["null", "none", "unknown", "n/a", "not available"];

/// JSON schema sent along with the request.
pub fn summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "linkedin_post": {"type": "string", "description": "LinkedIn post text (3-5 sentences)"},
            "twitter_post": {"type": "string", "description": "X/Twitter post text (at most 280 characters)"},
            "key_insights": {
                "type": "array",
                "items": {"type": "string"},
                "minItems": 3,
                "maxItems": 5,
                "description": "List of 3-5 key insights"
            },
            "article_title": {"type": "string"},
            "article_author": {"type": ["string", "null"]},
            "article_date": {"type": ["string", "null"]},
            "error": {"type": "string", "description": "Set only when the page cannot be read"}
        },
        "required": ["linkedin_post", "twitter_post", "key_insights", "article_title"]
    })
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    linkedin_post: String,
    twitter_post: String,
    key_insights: Vec<String>,
    article_title: String,
    article_author: Option<String>,
    article_date: Option<String>,
}

/// First stage: URL in, validated [`ArticleSummary`] out.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummarizeStage;

impl SummarizeStage {
    pub fn new() -> Self {
        Self
    }

    /// The single text request this stage sends for `url`.
    pub fn build_request(&self, ctx: &ExecCtx, url: &Url) -> TextRequest {
        let prompt = prompt::render(USER_TEMPLATE, &prompt::vars([("url", url.as_str())]));
        TextRequest::new(ctx.text_model.clone(), prompt)
            .with_system(SYSTEM_PROMPT)
            .with_options(
                ctx.text_options
                    .clone()
                    .with_web_retrieval(true)
                    .with_json_schema(summary_schema()),
            )
    }
}

impl Stage for SummarizeStage {
    type Input = Requested;
    type Output = Summarized;

    fn name(&self) -> StageName {
        StageName::Summarize
    }

    fn run<'a>(&'a self, ctx: &'a ExecCtx, input: Requested) -> BoxFut<'a, Result<Summarized>> {
        Box::pin(async move {
            let request = self.build_request(ctx, &input.url);
            let response = ctx
                .generate_text(&request)
                .await
                .map_err(PipelineError::scrape)?;
            let summary = parse_summary(&response.text)?;
            info!(
                title = %summary.article.title,
                insights = summary.key_insights.len(),
                "article summarized"
            );
            Ok(Summarized {
                url: input.url,
                summary,
            })
        })
    }
}

/// Parse and validate the provider's reply.
///
/// A reply that only carries an `error` string is the provider saying it
/// could not read the page, which is a scrape failure rather than a format
/// problem.
pub fn parse_summary(text: &str) -> Result<ArticleSummary> {
    let (_thinking, cleaned) = parsing::extract_thinking(text);
    let value = parsing::parse_value_defensively(&cleaned).map_err(PipelineError::SummaryFormat)?;

    if !value.is_object() {
        return Err(PipelineError::SummaryFormat(format!(
            "expected a JSON object, got: {}",
            parsing::truncate_chars(&value.to_string(), 200)
        )));
    }

    // Schema-following models keep the required keys but leave them blank.
    let has_posts = value
        .get("linkedin_post")
        .and_then(Value::as_str)
        .is_some_and(|post| !post.trim().is_empty());
    if !has_posts {
        if let Some(reason) = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
        {
            return Err(PipelineError::Scrape {
                reason: reason.to_string(),
                source: None,
            });
        }
    }

    let raw: RawSummary = serde_json::from_value(value)
        .map_err(|e| PipelineError::SummaryFormat(e.to_string()))?;
    validate(raw)
}

fn validate(raw: RawSummary) -> Result<ArticleSummary> {
    let linkedin_post = required(raw.linkedin_post, "linkedin_post")?;
    let twitter_post = required(raw.twitter_post, "twitter_post")?;
    let title = required(raw.article_title, "article_title")?;

    let short_len = twitter_post.chars().count();
    if short_len > SHORT_POST_MAX_CHARS {
        return Err(PipelineError::SummaryFormat(format!(
            "twitter_post is {} characters, limit is {}",
            short_len, SHORT_POST_MAX_CHARS
        )));
    }

    let key_insights: Vec<String> = raw
        .key_insights
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !KEY_INSIGHTS_RANGE.contains(&key_insights.len()) {
        return Err(PipelineError::SummaryFormat(format!(
            "expected {}-{} key insights, got {}",
            KEY_INSIGHTS_RANGE.start(),
            KEY_INSIGHTS_RANGE.end(),
            key_insights.len()
        )));
    }

    Ok(ArticleSummary {
        article: ArticleMeta {
            title,
            author: optional(raw.article_author),
            date: optional(raw.article_date),
        },
        linkedin_post,
        twitter_post,
        key_insights,
    })
}

fn required(value: String, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::SummaryFormat(format!("{} is empty", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !ABSENT_MARKERS.contains(&v.to_lowercase().as_str()))
}
