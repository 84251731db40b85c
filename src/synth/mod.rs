//! Contract between the playback engine and an external speech synthesiser.
//!
//! The synthesiser speaks exactly one bounded fragment at a time. Every accepted
//! submission must end in exactly one terminal event, [`AdapterEvent::Done`] or
//! [`AdapterEvent::Failed`], carrying the [`SynthesisToken`] it was submitted
//! with, and that event must be delivered through the [`AdapterCallback`] the
//! adapter was built with. An empty fragment still gets its terminal event.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod mock;

/// Correlates one submission with its terminal callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynthesisToken(Uuid);

impl SynthesisToken {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SynthesisToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events an adapter reports back to the engine that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// Asynchronous initialisation finished; submissions are now accepted.
    Ready,
    Done(SynthesisToken),
    Failed {
        token: SynthesisToken,
        cause: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("synthesiser rejected the fragment: {0}")]
    Rejected(String),
    #[error("synthesiser has been released")]
    Released,
}

/// A speech synthesiser that accepts one fragment at a time.
///
/// Implementations run the actual synthesis off the engine thread and report
/// through their [`AdapterCallback`]. `submit` must not block until speech ends.
pub trait SynthesisAdapter {
    fn is_ready(&self) -> bool;

    /// Longest fragment, in characters, that `submit` accepts.
    fn max_fragment_length(&self) -> usize;

    /// Start speaking `fragment`. An `Err` means no terminal event will follow.
    fn submit(&mut self, fragment: &str, token: SynthesisToken) -> Result<(), SynthesisError>;

    /// Abandon whatever utterance is in flight. Safe to call when idle.
    fn cancel(&mut self);

    /// Free the underlying synthesis resource. Called once, after a final `cancel`.
    fn release(&mut self) {}
}

impl<A: SynthesisAdapter + ?Sized> SynthesisAdapter for Box<A> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn max_fragment_length(&self) -> usize {
        (**self).max_fragment_length()
    }

    fn submit(&mut self, fragment: &str, token: SynthesisToken) -> Result<(), SynthesisError> {
        (**self).submit(fragment, token)
    }

    fn cancel(&mut self) {
        (**self).cancel();
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// Handle an adapter uses to report events onto its engine's serialised context.
#[derive(Clone)]
pub struct AdapterCallback {
    sink: Arc<dyn Fn(AdapterEvent) + Send + Sync>,
}

impl AdapterCallback {
    pub fn new(sink: impl Fn(AdapterEvent) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    pub fn ready(&self) {
        (self.sink)(AdapterEvent::Ready);
    }

    pub fn done(&self, token: SynthesisToken) {
        (self.sink)(AdapterEvent::Done(token));
    }

    pub fn failed(&self, token: SynthesisToken, cause: impl Into<String>) {
        (self.sink)(AdapterEvent::Failed {
            token,
            cause: cause.into(),
        });
    }
}

impl fmt::Debug for AdapterCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterCallback").finish_non_exhaustive()
    }
}
