//! Event system for pipeline lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe a pipeline run.
//! The coordinator emits events when each stage starts and finishes and
//! when the envelope is assembled. Implement [`EventHandler`] to receive
//! them for progress tracking or metrics.

use crate::types::StageName;
use std::sync::Arc;

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A stage has started executing.
    StageStart {
        stage: StageName,
    },
    /// A stage has finished executing.
    StageEnd {
        stage: StageName,
        /// Whether the stage succeeded.
        ok: bool,
        duration_ms: u64,
    },
    /// The envelope is ready; the run is over.
    Assembled {
        success: bool,
    },
}

/// Handler for pipeline lifecycle events.
///
/// This is entirely optional -- pipelines work without an event handler.
///
/// # Example
///
/// ```
/// use link_to_social::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StageStart { stage } => println!("[start] {}", stage),
///             Event::StageEnd { stage, ok, .. } => println!("[end] {} ok={}", stage, ok),
///             Event::Assembled { success } => println!("[done] success={}", success),
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the pipeline emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use link_to_social::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::StageEnd { stage, ok: false, .. } = event {
///         eprintln!("{} failed", stage);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
