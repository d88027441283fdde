//! Pipeline coordinator.
//!
//! Runs summarize, then creative, then assemble, strictly in that order.
//! The first failing stage short-circuits the rest: later provider calls are
//! never issued and the envelope reports that stage's error. Every run
//! produces exactly one envelope.

use crate::assemble::{assemble, failure};
use crate::creative::CreativeStage;
use crate::error::{PipelineError, Result};
use crate::events::Event;
use crate::exec_ctx::ExecCtx;
use crate::stage::{Illustrated, Requested, Stage};
use crate::summarize::SummarizeStage;
use crate::types::{Envelope, StageName, StageRecord, StageStatus};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use url::Url;

/// Final disposition of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// Where a run is in its lifecycle.
///
/// ```text
/// Initial ─► SummarizeDone ─► CreativeDone ─► Assembled(Success)
///    │             │
///    └─────────────┴────────────────────────► Assembled(Failed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Initial,
    SummarizeDone,
    CreativeDone,
    Assembled(Outcome),
}

/// Result of [`Pipeline::run`]: the envelope plus the phases visited, in order.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub envelope: Envelope,
    pub phases: Vec<PipelinePhase>,
}

/// Sequential coordinator over the three stages.
///
/// Holds only immutable configuration, so one instance can serve any number
/// of concurrent requests; each run owns its own state.
///
/// # Example
///
/// ```no_run
/// use link_to_social::{ExecCtx, MockBackend, Pipeline};
/// use std::sync::Arc;
///
/// # async fn demo() {
/// let ctx = ExecCtx::builder(Arc::new(MockBackend::default())).build();
/// let pipeline = Pipeline::new(ctx);
/// let url = url::Url::parse("https://example.com/article").unwrap();
/// let envelope = pipeline.process(url).await;
/// println!("{}", serde_json::to_string_pretty(&envelope).unwrap());
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    ctx: ExecCtx,
    summarize: SummarizeStage,
    creative: CreativeStage,
}

impl Pipeline {
    pub fn new(ctx: ExecCtx) -> Self {
        Self {
            ctx,
            summarize: SummarizeStage::new(),
            creative: CreativeStage::new(),
        }
    }

    pub fn ctx(&self) -> &ExecCtx {
        &self.ctx
    }

    /// Run the pipeline for one article and return only the envelope.
    pub async fn process(&self, url: Url) -> Envelope {
        self.run(url).await.envelope
    }

    /// Run the pipeline for one article.
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn run(&self, url: Url) -> PipelineRun {
        let mut phases = vec![PipelinePhase::Initial];
        let mut trail = Vec::with_capacity(StageName::ALL.len());

        let outcome = self.advance(url.clone(), &mut trail, &mut phases).await;
        if let Err(ref e) = outcome {
            warn!(kind = e.kind(), error = %e, "pipeline failed");
        }

        // Stages never reached still appear in the trail.
        for stage in [StageName::Summarize, StageName::Creative] {
            if !trail.iter().any(|r| r.stage == stage) {
                trail.push(StageRecord::skipped(stage));
            }
        }

        let started_at = Utc::now();
        let started = Instant::now();
        let mut envelope = assemble(&url, outcome, trail);
        envelope.push_record(StageRecord {
            stage: StageName::Assemble,
            status: StageStatus::Success,
            started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            error: None,
        });

        let success = envelope.is_success();
        phases.push(PipelinePhase::Assembled(if success {
            Outcome::Success
        } else {
            Outcome::Failed
        }));
        self.ctx.emit(Event::Assembled { success });
        info!(success, "envelope assembled");

        PipelineRun { envelope, phases }
    }

    async fn advance(
        &self,
        url: Url,
        trail: &mut Vec<StageRecord>,
        phases: &mut Vec<PipelinePhase>,
    ) -> Result<Illustrated> {
        let summarized = self
            .run_stage(&self.summarize, Requested::new(url), trail)
            .await?;
        phases.push(PipelinePhase::SummarizeDone);

        let illustrated = self.run_stage(&self.creative, summarized, trail).await?;
        phases.push(PipelinePhase::CreativeDone);

        Ok(illustrated)
    }

    /// Run one stage, recording its timing and result.
    async fn run_stage<S: Stage>(
        &self,
        stage: &S,
        input: S::Input,
        trail: &mut Vec<StageRecord>,
    ) -> Result<S::Output> {
        let name = stage.name();
        self.ctx.emit(Event::StageStart { stage: name });
        info!(stage = %name, "stage started");

        let started_at = Utc::now();
        let started = Instant::now();
        let result = stage.run(&self.ctx, input).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (status, error) = match &result {
            Ok(_) => {
                info!(stage = %name, duration_ms, "stage finished");
                (StageStatus::Success, None)
            }
            Err(e) => {
                warn!(stage = %name, duration_ms, error = %e, "stage failed");
                (StageStatus::Error, Some(e.to_string()))
            }
        };
        trail.push(StageRecord {
            stage: name,
            status,
            started_at,
            duration_ms,
            error,
        });
        self.ctx.emit(Event::StageEnd {
            stage: name,
            ok: result.is_ok(),
            duration_ms,
        });
        result
    }
}

/// Parse and check an article URL from an incoming request.
///
/// Only absolute `http`/`https` URLs with a host are accepted.
pub fn parse_article_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PipelineError::InvalidRequest("url is required".into()));
    }
    let url = Url::parse(raw)
        .map_err(|e| PipelineError::InvalidRequest(format!("invalid url '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(PipelineError::InvalidRequest(format!(
            "url must be http or https: '{}'",
            raw
        )));
    }
    Ok(url)
}

/// Envelope for a request rejected before the pipeline started.
pub fn rejected(raw_url: &str, err: &PipelineError) -> Envelope {
    let trail = StageName::ALL.into_iter().map(StageRecord::skipped).collect();
    failure(raw_url, err, trail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::error::ProviderError;
    use crate::events::{EventHandler, FnEventHandler};
    use std::sync::{Arc, Mutex};

    const GOOD_REPLY: &str = r#"{
        "linkedin_post": "Cloud bills keep growing. Tagging fixes most of it. What is your tagging policy?",
        "twitter_post": "Untagged cloud spend is invisible spend. Tag it. 🏷️",
        "key_insights": ["Tag everything", "Review monthly", "Kill idle boxes"],
        "article_title": "Taming Cloud Costs",
        "article_author": "Jane Doe",
        "article_date": "null"
    }"#;

    fn url() -> Url {
        Url::parse("https://example.com/cloud-costs").unwrap()
    }

    fn pipeline(mock: Arc<MockBackend>) -> Pipeline {
        Pipeline::new(ExecCtx::builder(mock).build())
    }

    #[tokio::test]
    async fn test_success_run_visits_every_phase() {
        let mock = Arc::new(MockBackend::new(
            vec![GOOD_REPLY.into()],
            vec![b"info".to_vec(), b"social".to_vec()],
        ));
        let run = pipeline(mock.clone()).run(url()).await;

        assert_eq!(
            run.phases,
            vec![
                PipelinePhase::Initial,
                PipelinePhase::SummarizeDone,
                PipelinePhase::CreativeDone,
                PipelinePhase::Assembled(Outcome::Success),
            ]
        );
        assert!(run.envelope.is_success());
        assert_eq!(mock.text_calls(), 1);
        assert_eq!(mock.image_calls(), 2);

        let Envelope::Success(body) = run.envelope else {
            panic!("expected success envelope");
        };
        assert_eq!(body.article.title, "Taming Cloud Costs");
        assert_eq!(body.article.date, None);
        assert_eq!(body.posts.key_insights.len(), 3);
        let statuses: Vec<_> = body.audit_trail.iter().map(|r| (r.stage, r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (StageName::Summarize, StageStatus::Success),
                (StageName::Creative, StageStatus::Success),
                (StageName::Assemble, StageStatus::Success),
            ]
        );
    }

    #[tokio::test]
    async fn test_summarize_failure_skips_image_calls() {
        let mock = Arc::new(
            MockBackend::default()
                .with_text_replies(vec![Err(ProviderError::Http {
                    status: 403,
                    body: "blocked".into(),
                })])
                .with_image_replies(vec![Ok(b"x".to_vec())]),
        );
        let run = pipeline(mock.clone()).run(url()).await;

        assert_eq!(mock.image_calls(), 0);
        assert_eq!(
            run.phases,
            vec![
                PipelinePhase::Initial,
                PipelinePhase::Assembled(Outcome::Failed)
            ]
        );
        let Envelope::Error(body) = run.envelope else {
            panic!("expected error envelope");
        };
        assert_eq!(body.kind, "scrape");
        assert!(body.message.starts_with("Article retrieval failed"));
        assert_eq!(body.url, "https://example.com/cloud-costs");
        assert_eq!(body.audit_trail[0].status, StageStatus::Error);
        assert_eq!(body.audit_trail[1].stage, StageName::Creative);
        assert_eq!(body.audit_trail[1].status, StageStatus::Skipped);
        assert_eq!(body.audit_trail[2].stage, StageName::Assemble);
    }

    #[tokio::test]
    async fn test_malformed_summary_is_summary_format_error() {
        let mock = Arc::new(MockBackend::new(
            vec!["I could not do that.".into()],
            vec![b"x".to_vec()],
        ));
        let envelope = pipeline(mock.clone()).process(url()).await;
        let Envelope::Error(body) = envelope else {
            panic!("expected error envelope");
        };
        assert_eq!(body.kind, "summary_format");
        assert_eq!(mock.image_calls(), 0);
    }

    #[tokio::test]
    async fn test_single_image_failure_fails_the_run() {
        let mock = Arc::new(
            MockBackend::new(vec![GOOD_REPLY.into()], vec![])
                .with_image_replies(vec![
                    Ok(b"info".to_vec()),
                    Err(ProviderError::Timeout {
                        url: "http://provider/image/generate".into(),
                    }),
                ]),
        );
        let run = pipeline(mock).run(url()).await;
        assert_eq!(
            run.phases,
            vec![
                PipelinePhase::Initial,
                PipelinePhase::SummarizeDone,
                PipelinePhase::Assembled(Outcome::Failed),
            ]
        );
        let v = serde_json::to_value(&run.envelope).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["kind"], "image_generation");
        assert!(v.get("images").is_none());
        assert!(v.get("posts").is_none());
    }

    #[tokio::test]
    async fn test_events_follow_stage_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Arc<dyn EventHandler> =
            Arc::new(FnEventHandler(move |e: Event| sink.lock().unwrap().push(e)));
        let mock = Arc::new(MockBackend::new(
            vec![GOOD_REPLY.into()],
            vec![b"a".to_vec()],
        ));
        let ctx = ExecCtx::builder(mock).event_handler(handler).build();
        Pipeline::new(ctx).process(url()).await;

        let events = seen.lock().unwrap().clone();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0],
            Event::StageStart {
                stage: StageName::Summarize
            }
        );
        assert!(matches!(
            events[1],
            Event::StageEnd {
                stage: StageName::Summarize,
                ok: true,
                ..
            }
        ));
        assert_eq!(
            events[2],
            Event::StageStart {
                stage: StageName::Creative
            }
        );
        assert_eq!(events[4], Event::Assembled { success: true });
    }

    #[test]
    fn test_parse_article_url() {
        assert!(parse_article_url("https://example.com/a").is_ok());
        assert!(parse_article_url("  http://example.com  ").is_ok());
        for bad in ["", "   ", "example.com", "ftp://example.com/x", "mailto:a@b.c"] {
            let err = parse_article_url(bad).unwrap_err();
            assert_eq!(err.kind(), "invalid_request", "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_rejected_envelope_skips_every_stage() {
        let err = parse_article_url("nope").unwrap_err();
        let Envelope::Error(body) = rejected("nope", &err) else {
            panic!("expected error envelope");
        };
        assert_eq!(body.url, "nope");
        assert!(body
            .audit_trail
            .iter()
            .all(|r| r.status == StageStatus::Skipped));
    }
}
