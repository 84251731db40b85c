//! Sequential speech playback on top of a one-fragment-at-a-time synthesiser.
//!
//! [`PlaybackEngine`] owns the track queue, the fragments of the current track
//! and the realised [`PlaybackState`]. It never blocks: waiting for speech is the
//! `Playing` state plus one outstanding [`SynthesisToken`]. Any adapter event
//! whose token does not match the outstanding one is dropped, which is what
//! keeps a cancelled fragment from advancing the queue.

mod state;

use log::{debug, error, info, warn};

use crate::{
    queue::{FragmentQueue, Track, TrackQueue},
    resumption::{ResumptionPayload, ResumptionProvider},
    synth::{AdapterEvent, SynthesisAdapter, SynthesisToken},
};

pub use state::{PlaybackError, PlaybackState, PlayerSnapshot};

/// Called with every snapshot the engine publishes.
pub type SnapshotObserver = Box<dyn FnMut(&PlayerSnapshot) + Send>;

pub struct PlaybackEngine<A: SynthesisAdapter> {
    adapter: Option<A>,
    fragment_cap: Option<usize>,
    queue: TrackQueue,
    fragments: FragmentQueue,
    state: PlaybackState,
    play_when_ready: bool,
    outstanding: Option<SynthesisToken>,
    error: Option<PlaybackError>,
    published: PlayerSnapshot,
    observer: Option<SnapshotObserver>,
}

impl<A: SynthesisAdapter> PlaybackEngine<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter: Some(adapter),
            fragment_cap: None,
            queue: TrackQueue::default(),
            fragments: FragmentQueue::Unbuilt,
            state: PlaybackState::Idle,
            play_when_ready: false,
            outstanding: None,
            error: None,
            published: PlayerSnapshot::default(),
            observer: None,
        }
    }

    /// Never submit fragments longer than `cap`, even if the adapter allows it.
    pub fn with_fragment_cap(mut self, cap: Option<usize>) -> Self {
        self.fragment_cap = cap;
        self
    }

    pub fn with_observer(mut self, observer: SnapshotObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.published.clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        self.error.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.adapter.is_none()
    }

    /// Replace the queue and position it at `start_index` (clamped).
    ///
    /// Any in-flight fragment is cancelled. If the host already wants playback,
    /// the new queue starts speaking right away.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        if self.ignore_when_released("set_queue") {
            return;
        }
        self.cancel_outstanding();
        self.fragments.clear();
        self.queue = TrackQueue::new(tracks, start_index);
        self.error = None;
        self.state = if self.queue.is_empty() {
            PlaybackState::Idle
        } else {
            PlaybackState::Ready
        };
        info!(
            "Queue set with {} track(s), current index {:?}",
            self.queue.len(),
            self.queue.current_index()
        );
        if self.play_when_ready && self.state == PlaybackState::Ready {
            self.start_chain();
        }
        self.publish();
    }

    /// Replay what a previous session described.
    pub fn restore(&mut self, payload: ResumptionPayload) {
        info!(
            "Restoring {} track(s) anchored at {}",
            payload.tracks.len(),
            payload.anchor_index
        );
        self.set_queue(payload.tracks, payload.anchor_index);
    }

    pub fn set_play_when_ready(&mut self, play_when_ready: bool) {
        if self.ignore_when_released("set_play_when_ready") {
            return;
        }
        self.play_when_ready = play_when_ready;
        if play_when_ready {
            match self.state {
                // Idle with a queue means the last chain failed; this is the retry.
                PlaybackState::Ready | PlaybackState::Idle => self.start_chain(),
                PlaybackState::Playing | PlaybackState::Ended => {}
            }
        } else {
            if self.state == PlaybackState::Playing {
                self.cancel_outstanding();
                self.state = PlaybackState::Ready;
                info!("Paused on track {:?}", self.queue.current_index());
            }
            if self.error == Some(PlaybackError::AdapterNotReady) {
                self.error = None;
            }
        }
        self.publish();
    }

    /// Jump to the start of track `index`, keeping the current intent.
    pub fn seek_to_track(&mut self, index: usize) {
        if self.ignore_when_released("seek_to_track") {
            return;
        }
        if !self.queue.seek(index) {
            warn!(
                "Ignoring seek to {index}: queue holds {} track(s)",
                self.queue.len()
            );
            return;
        }
        self.cancel_outstanding();
        self.fragments.clear();
        self.error = None;
        self.state = PlaybackState::Ready;
        info!("Seeked to track {index}");
        if self.play_when_ready {
            self.start_chain();
        }
        self.publish();
    }

    pub fn stop(&mut self) {
        if self.ignore_when_released("stop") {
            return;
        }
        self.cancel_outstanding();
        self.reset();
        info!("Playback stopped");
        self.publish();
    }

    /// Feed one event reported by the adapter.
    pub fn handle_adapter_event(&mut self, event: AdapterEvent) {
        if self.ignore_when_released("adapter event") {
            return;
        }
        match event {
            AdapterEvent::Ready => {
                debug!("Synthesiser reported ready");
                if self.state == PlaybackState::Ready && self.play_when_ready {
                    self.start_chain();
                }
            }
            AdapterEvent::Done(token) => {
                if !self.is_outstanding(token) {
                    debug!("Dropping stale completion for {token}");
                    return;
                }
                self.outstanding = None;
                if self.fragments.complete_front() {
                    self.submit_front();
                } else {
                    self.advance_track();
                }
            }
            AdapterEvent::Failed { token, cause } => {
                if !self.is_outstanding(token) {
                    debug!("Dropping stale failure for {token}: {cause}");
                    return;
                }
                self.fail(cause);
            }
        }
        self.publish();
    }

    /// Stop any in-flight work and hand the synthesiser back. Idempotent.
    pub fn release(&mut self) {
        let Some(mut adapter) = self.adapter.take() else {
            return;
        };
        self.outstanding = None;
        adapter.cancel();
        adapter.release();
        self.reset();
        self.play_when_ready = false;
        info!("Playback engine released");
        self.publish();
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.fragments.clear();
        self.state = PlaybackState::Idle;
        self.error = None;
    }

    fn ignore_when_released(&self, command: &str) -> bool {
        if self.is_released() {
            warn!("Ignoring {command}: engine already released");
            true
        } else {
            false
        }
    }

    fn is_outstanding(&self, token: SynthesisToken) -> bool {
        self.state == PlaybackState::Playing && self.outstanding == Some(token)
    }

    fn fragment_limit(&self) -> usize {
        let adapter_limit = self
            .adapter
            .as_ref()
            .map_or(1, SynthesisAdapter::max_fragment_length);
        self.fragment_cap
            .map_or(adapter_limit, |cap| cap.min(adapter_limit))
            .max(1)
    }

    fn cancel_outstanding(&mut self) {
        if let Some(token) = self.outstanding.take() {
            debug!("Cancelling outstanding fragment {token}");
            if let Some(adapter) = self.adapter.as_mut() {
                adapter.cancel();
            }
        }
    }

    /// Begin or resume speaking the current track if the adapter allows it.
    fn start_chain(&mut self) {
        let Some(index) = self.queue.current_index() else {
            debug!("Holding play intent: the queue is empty");
            return;
        };
        let ready = self.adapter.as_ref().is_some_and(SynthesisAdapter::is_ready);
        if !ready {
            debug!("Synthesiser not ready; play intent latched for track {index}");
            self.state = PlaybackState::Ready;
            self.error = Some(PlaybackError::AdapterNotReady);
            return;
        }
        if !self.fragments.is_built_for(index) {
            self.build_fragments(index);
        }
        self.error = None;
        self.state = PlaybackState::Playing;
        info!("Speaking track {index}");
        self.submit_front();
    }

    fn build_fragments(&mut self, index: usize) {
        let limit = self.fragment_limit();
        let body = self.queue.current().map_or("", |track| track.body.as_str());
        self.fragments = FragmentQueue::build(index, body, limit);
        debug!(
            "Track {index} split into {} fragment(s) of at most {limit} chars",
            self.fragments.remaining()
        );
    }

    fn submit_front(&mut self) {
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        let Some(fragment) = self.fragments.front() else {
            return;
        };
        let token = SynthesisToken::fresh();
        self.outstanding = Some(token);
        debug!(
            "Submitting {} char(s) as {token}",
            fragment.chars().count()
        );
        if let Err(err) = adapter.submit(fragment, token) {
            self.fail(err.to_string());
        }
    }

    fn advance_track(&mut self) {
        if self.queue.advance() {
            if let Some(index) = self.queue.current_index() {
                info!("Advancing to track {index}");
                self.build_fragments(index);
                self.submit_front();
            }
        } else {
            self.fragments.clear();
            self.state = PlaybackState::Ended;
            info!("Reached the end of the queue");
        }
    }

    fn fail(&mut self, cause: String) {
        let track_index = self.queue.current_index().unwrap_or_default();
        error!("Synthesis failed on track {track_index}: {cause}");
        self.outstanding = None;
        self.state = PlaybackState::Idle;
        self.error = Some(PlaybackError::SynthesisFailure { track_index, cause });
    }

    /// Re-publish the snapshot if anything observable changed.
    fn publish(&mut self) {
        let mut next = PlayerSnapshot {
            revision: self.published.revision,
            playback_state: self.state,
            play_when_ready: self.play_when_ready,
            queue: self.queue.tracks().clone(),
            current_index: self.queue.current_index(),
            error: self.error.clone(),
        };
        if next == self.published {
            return;
        }
        next.revision += 1;
        self.published = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.published);
        }
    }
}

impl<A: SynthesisAdapter> ResumptionProvider for PlaybackEngine<A> {
    fn describe_resumption(&self) -> Option<ResumptionPayload> {
        ResumptionPayload::describe(self.queue.tracks(), self.queue.current_index())
    }
}

impl<A: SynthesisAdapter> Drop for PlaybackEngine<A> {
    fn drop(&mut self) {
        self.release();
    }
}
