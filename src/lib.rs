//! # Link to Social
//!
//! Turn an article URL into ready-to-post social content: a LinkedIn post,
//! an X/Twitter post, a short list of key insights, and two generated
//! images (an infographic and a square social card).
//!
//! A request flows through three stages, strictly in order:
//!
//! 1. **summarize** -- one text call with provider-side web retrieval
//!    reads the page and returns metadata, both posts and the insights.
//! 2. **creative** -- two image calls, issued concurrently, build prompts
//!    from the summary.
//! 3. **assemble** -- a pure step that packs everything into an
//!    [`Envelope`].
//!
//! The first failing stage ends the run; later provider calls are never
//! issued, and the envelope carries only that first error.
//!
//! ## Core Concepts
//!
//! - **[`Stage`]** -- one async step; consumes the previous state by value.
//! - **[`ExecCtx`]** -- shared, immutable context: backend, models, defaults,
//!   optional event handler.
//! - **[`Backend`]** -- the provider seam. [`VeniceBackend`] talks HTTP,
//!   [`MockBackend`] replays canned replies for tests.
//! - **[`Pipeline`]** -- the coordinator. Produces exactly one envelope per run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use link_to_social::{ExecCtx, Pipeline, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let pipeline = Pipeline::new(ExecCtx::from_settings(&settings)?);
//!
//!     let url = url::Url::parse("https://example.com/article")?;
//!     let envelope = pipeline.process(url).await;
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a provider
//!
//! ```
//! use link_to_social::{ExecCtx, MockBackend, Pipeline};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let mock = Arc::new(MockBackend::new(vec!["not json".into()], vec![b"img".to_vec()]));
//! let pipeline = Pipeline::new(ExecCtx::builder(mock.clone()).build());
//! let url = url::Url::parse("https://example.com/article").unwrap();
//!
//! let envelope = pipeline.process(url).await;
//! assert!(!envelope.is_success());
//! assert_eq!(mock.image_calls(), 0);
//! # });
//! ```

pub mod assemble;
pub mod backend;
pub mod client;
pub mod config;
pub mod creative;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod parsing;
pub mod pipeline;
pub mod prompt;
pub mod server;
pub mod stage;
pub mod summarize;
pub mod types;

pub use backend::{Backend, MockBackend, VeniceBackend};
pub use client::{ImageOptions, TextOptions};
pub use config::Settings;
pub use error::{PipelineError, ProviderError, ProviderResult, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use pipeline::{Outcome, Pipeline, PipelinePhase, PipelineRun};
pub use stage::{BoxFut, Illustrated, Requested, Stage, Summarized};
pub use types::{ArticleSummary, Envelope, ImageKind, ImagePair, StageRecord};
