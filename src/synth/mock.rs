//! In-memory adapter that records what the engine asks of it.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AdapterCallback, SynthesisAdapter, SynthesisError, SynthesisToken};

#[derive(Debug, Default)]
struct Shared {
    ready: bool,
    max_len: usize,
    submissions: Vec<(String, SynthesisToken)>,
    cancels: usize,
    released: bool,
    reject_next: Option<String>,
    callback: Option<AdapterCallback>,
    auto_complete: bool,
}

/// Clones share one journal, so a test can keep a clone after handing the
/// adapter to an engine.
#[derive(Debug, Clone)]
pub struct RecordingAdapter {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingAdapter {
    pub fn new(max_len: usize) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                ready: true,
                max_len,
                ..Shared::default()
            })),
        }
    }

    pub fn not_ready(self) -> Self {
        self.set_ready(false);
        self
    }

    /// Report `done` through `callback` as soon as a fragment is submitted.
    pub fn auto_completing(self, callback: AdapterCallback) -> Self {
        {
            let mut shared = self.shared.lock();
            shared.callback = Some(callback);
            shared.auto_complete = true;
        }
        self
    }

    /// Keep `callback` for readiness notifications without completing anything.
    pub fn with_callback(self, callback: AdapterCallback) -> Self {
        self.shared.lock().callback = Some(callback);
        self
    }

    pub fn set_ready(&self, ready: bool) {
        let callback = {
            let mut shared = self.shared.lock();
            shared.ready = ready;
            shared.callback.clone()
        };
        if ready {
            if let Some(callback) = callback {
                callback.ready();
            }
        }
    }

    pub fn reject_next(&self, cause: &str) {
        self.shared.lock().reject_next = Some(cause.to_owned());
    }

    pub fn fragments(&self) -> Vec<String> {
        self.shared
            .lock()
            .submissions
            .iter()
            .map(|(fragment, _)| fragment.clone())
            .collect()
    }

    pub fn submission_count(&self) -> usize {
        self.shared.lock().submissions.len()
    }

    pub fn last_token(&self) -> SynthesisToken {
        self.shared
            .lock()
            .submissions
            .last()
            .map(|(_, token)| *token)
            .expect("no fragment has been submitted")
    }

    pub fn cancels(&self) -> usize {
        self.shared.lock().cancels
    }

    pub fn released(&self) -> bool {
        self.shared.lock().released
    }
}

impl SynthesisAdapter for RecordingAdapter {
    fn is_ready(&self) -> bool {
        self.shared.lock().ready
    }

    fn max_fragment_length(&self) -> usize {
        self.shared.lock().max_len
    }

    fn submit(&mut self, fragment: &str, token: SynthesisToken) -> Result<(), SynthesisError> {
        let callback = {
            let mut shared = self.shared.lock();
            if shared.released {
                return Err(SynthesisError::Released);
            }
            if let Some(cause) = shared.reject_next.take() {
                return Err(SynthesisError::Rejected(cause));
            }
            shared.submissions.push((fragment.to_owned(), token));
            shared
                .auto_complete
                .then(|| shared.callback.clone())
                .flatten()
        };
        if let Some(callback) = callback {
            callback.done(token);
        }
        Ok(())
    }

    fn cancel(&mut self) {
        self.shared.lock().cancels += 1;
    }

    fn release(&mut self) {
        self.shared.lock().released = true;
    }
}
