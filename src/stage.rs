//! Stage trait and the immutable state values threaded between stages.
//!
//! Each stage consumes the previous state by value and either returns the
//! next state or a [`PipelineError`](crate::PipelineError). There is no
//! shared mutable record: a failed stage simply produces no next state, so
//! partial results cannot leak forward.
//!
//! ```text
//! Requested ──summarize──► Summarized ──creative──► Illustrated ──assemble──► Envelope
//! ```

use crate::error::Result;
use crate::exec_ctx::ExecCtx;
use crate::types::{ArticleSummary, ImagePair, StageName};
use std::future::Future;
use std::pin::Pin;
use url::Url;

/// A boxed, pinned, Send future -- the return type of [`Stage::run`].
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One asynchronous step of the pipeline.
pub trait Stage: Send + Sync {
    /// State consumed by this stage.
    type Input: Send;
    /// State produced on success.
    type Output: Send;

    fn name(&self) -> StageName;

    /// Execute the stage against the shared context.
    fn run<'a>(&'a self, ctx: &'a ExecCtx, input: Self::Input) -> BoxFut<'a, Result<Self::Output>>;
}

/// Initial state: only the article URL is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requested {
    pub url: Url,
}

impl Requested {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

/// After summarize: URL plus the validated summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Summarized {
    pub url: Url,
    pub summary: ArticleSummary,
}

/// After creative: everything the envelope needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Illustrated {
    pub url: Url,
    pub summary: ArticleSummary,
    pub images: ImagePair,
}
