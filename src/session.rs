//! Host-facing handle that runs one [`PlaybackEngine`] on a dedicated thread.
//!
//! Commands from the host and events from the synthesiser travel over the same
//! channel, so the engine sees them strictly one after another. The latest
//! snapshot is mirrored into a shared cell the host can read at any time.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::{
    config::EngineConfig,
    engine::{PlaybackEngine, PlayerSnapshot},
    queue::Track,
    resumption::{ResumptionPayload, ResumptionProvider},
    synth::{AdapterCallback, AdapterEvent, SynthesisAdapter},
};

const ENGINE_THREAD: &str = "reader-playback-engine";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("playback engine thread has shut down")]
    Closed,
    #[error("failed to spawn playback engine thread: {0}")]
    Spawn(#[from] std::io::Error),
}

enum Message {
    SetQueue {
        tracks: Vec<Track>,
        start_index: usize,
    },
    SetPlayWhenReady(bool),
    SeekToTrack(usize),
    Stop,
    Restore(ResumptionPayload),
    DescribeResumption(Sender<Option<ResumptionPayload>>),
    Adapter(AdapterEvent),
    Release,
}

#[derive(Default)]
struct SnapshotCell {
    snapshot: Mutex<PlayerSnapshot>,
    changed: Condvar,
}

impl SnapshotCell {
    fn publish(&self, snapshot: &PlayerSnapshot) {
        *self.snapshot.lock() = snapshot.clone();
        self.changed.notify_all();
    }
}

pub struct EngineSession {
    tx: Sender<Message>,
    cell: Arc<SnapshotCell>,
    worker: Option<JoinHandle<()>>,
}

impl EngineSession {
    /// Build the adapter with a callback wired to this session and start the
    /// engine thread. The adapter is owned by that thread from then on.
    pub fn spawn<A, F>(config: &EngineConfig, build_adapter: F) -> Result<Self, SessionError>
    where
        A: SynthesisAdapter + Send + 'static,
        F: FnOnce(AdapterCallback) -> A,
    {
        let (tx, rx) = unbounded();
        let events = tx.clone();
        let callback = AdapterCallback::new(move |event| {
            if events.send(Message::Adapter(event)).is_err() {
                debug!("Dropping synthesiser event; engine thread is gone");
            }
        });
        let adapter = build_adapter(callback);

        let cell = Arc::new(SnapshotCell::default());
        let publisher = Arc::clone(&cell);
        let fragment_cap = config.max_fragment_chars;
        let worker = thread::Builder::new()
            .name(ENGINE_THREAD.to_string())
            .spawn(move || {
                let engine = PlaybackEngine::new(adapter)
                    .with_fragment_cap(fragment_cap)
                    .with_observer(Box::new(move |snapshot: &PlayerSnapshot| {
                        publisher.publish(snapshot);
                    }));
                run(engine, rx);
            })?;

        Ok(Self {
            tx,
            cell,
            worker: Some(worker),
        })
    }

    pub fn set_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<(), SessionError> {
        self.send(Message::SetQueue {
            tracks,
            start_index,
        })
    }

    pub fn set_play_when_ready(&self, play_when_ready: bool) -> Result<(), SessionError> {
        self.send(Message::SetPlayWhenReady(play_when_ready))
    }

    pub fn seek_to_track(&self, index: usize) -> Result<(), SessionError> {
        self.send(Message::SeekToTrack(index))
    }

    pub fn stop(&self) -> Result<(), SessionError> {
        self.send(Message::Stop)
    }

    pub fn restore(&self, payload: ResumptionPayload) -> Result<(), SessionError> {
        self.send(Message::Restore(payload))
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.cell.snapshot.lock().clone()
    }

    /// Block until a published snapshot satisfies `predicate` or `timeout` passes.
    pub fn wait_for(
        &self,
        timeout: Duration,
        mut predicate: impl FnMut(&PlayerSnapshot) -> bool,
    ) -> Option<PlayerSnapshot> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.cell.snapshot.lock();
        loop {
            if predicate(&guard) {
                return Some(guard.clone());
            }
            if self.cell.changed.wait_until(&mut guard, deadline).timed_out() {
                return predicate(&guard).then(|| guard.clone());
            }
        }
    }

    /// Cancel in-flight speech, release the synthesiser and join the engine thread.
    pub fn release(mut self) {
        self.shutdown();
    }

    fn send(&self, message: Message) -> Result<(), SessionError> {
        self.tx.send(message).map_err(|_| SessionError::Closed)
    }

    fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if self.tx.send(Message::Release).is_err() {
            debug!("Engine thread already stopped");
        }
        if worker.join().is_err() {
            warn!("Playback engine thread panicked");
        }
    }
}

impl ResumptionProvider for EngineSession {
    /// Asked of the engine thread itself, so every command sent before this call
    /// is reflected in the answer. A released session has nothing to resume.
    fn describe_resumption(&self) -> Option<ResumptionPayload> {
        let (reply_tx, reply_rx) = bounded(1);
        if self.send(Message::DescribeResumption(reply_tx)).is_err() {
            debug!("No resumption to describe; engine thread is gone");
            return None;
        }
        reply_rx.recv().ok().flatten()
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<A: SynthesisAdapter>(mut engine: PlaybackEngine<A>, rx: Receiver<Message>) {
    info!("Playback engine thread started");
    for message in rx.iter() {
        match message {
            Message::SetQueue {
                tracks,
                start_index,
            } => engine.set_queue(tracks, start_index),
            Message::SetPlayWhenReady(play_when_ready) => {
                engine.set_play_when_ready(play_when_ready)
            }
            Message::SeekToTrack(index) => engine.seek_to_track(index),
            Message::Stop => engine.stop(),
            Message::Restore(payload) => engine.restore(payload),
            Message::DescribeResumption(reply) => {
                if reply.send(engine.describe_resumption()).is_err() {
                    debug!("Resumption requester went away before the reply");
                }
            }
            Message::Adapter(event) => engine.handle_adapter_event(event),
            Message::Release => break,
        }
    }
    engine.release();
    info!("Playback engine thread finished");
}
