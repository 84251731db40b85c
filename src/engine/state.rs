use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::Track;

const ERROR_ADAPTER_NOT_READY: &str = "ADAPTER_NOT_READY";
const ERROR_SYNTHESIS_FAILURE: &str = "SYNTHESIS_FAILURE";

/// Realised playback state. The host's intent to play is tracked separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// Nothing to play, or the chain stopped on a synthesis failure.
    #[default]
    Idle,
    /// A queue is loaded but nothing is being spoken.
    Ready,
    /// A fragment is outstanding with the synthesiser.
    Playing,
    /// Every track has been spoken.
    Ended,
}

/// Failures surfaced through the snapshot rather than returned from commands.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaybackError {
    #[error("synthesiser is not ready yet")]
    AdapterNotReady,
    #[error("synthesis failed on track {track_index}: {cause}")]
    #[serde(rename_all = "camelCase")]
    SynthesisFailure { track_index: usize, cause: String },
}

impl PlaybackError {
    /// Stable identifier a host can match on.
    pub fn code(&self) -> &'static str {
        match self {
            PlaybackError::AdapterNotReady => ERROR_ADAPTER_NOT_READY,
            PlaybackError::SynthesisFailure { .. } => ERROR_SYNTHESIS_FAILURE,
        }
    }
}

/// What the host sees of the engine after each transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub revision: u64,
    pub playback_state: PlaybackState,
    pub play_when_ready: bool,
    pub queue: Arc<[Track]>,
    pub current_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PlaybackError>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            revision: 0,
            playback_state: PlaybackState::Idle,
            play_when_ready: false,
            queue: Vec::<Track>::new().into(),
            current_index: None,
            error: None,
        }
    }
}

impl PlayerSnapshot {
    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|idx| self.queue.get(idx))
    }

    /// True while the host wants sound and the engine is producing it.
    pub fn is_playing(&self) -> bool {
        self.play_when_ready && self.playback_state == PlaybackState::Playing
    }
}
