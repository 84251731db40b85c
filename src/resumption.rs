//! What a freshly spawned session needs to pick up where the last one stopped.
//!
//! Synthesis is not time-seekable, so resumption is track-granular: the anchor
//! track restarts from its first fragment and `anchor_position_ms` is always 0.

use serde::{Deserialize, Serialize};

use crate::queue::Track;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumptionPayload {
    /// The whole queue, including tracks before the anchor.
    pub tracks: Vec<Track>,
    pub anchor_index: usize,
    pub anchor_position_ms: u64,
}

impl ResumptionPayload {
    /// `None` when there is no queue to resume.
    pub fn describe(tracks: &[Track], current_index: Option<usize>) -> Option<Self> {
        if tracks.is_empty() {
            return None;
        }
        Some(Self {
            tracks: tracks.to_vec(),
            anchor_index: current_index.unwrap_or_default().min(tracks.len() - 1),
            anchor_position_ms: 0,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

/// Implemented by anything that can describe the session to resume.
pub trait ResumptionProvider {
    fn describe_resumption(&self) -> Option<ResumptionPayload>;
}
