use std::{collections::VecDeque, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::chunker;

/// Opaque identity of a track, supplied by whoever produced the content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One document to be spoken in full before the queue advances.
///
/// `body` is the only field handed to the synthesis adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    #[serde(default)]
    pub metadata: TrackMetadata,
    pub body: String,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(id),
            metadata: TrackMetadata {
                title: title.into(),
                ..TrackMetadata::default()
            },
            body: body.into(),
        }
    }
}

/// Ordered tracks plus the position of the current one.
///
/// Tracks are shared behind an `Arc` so snapshots can hand them out without
/// copying every body.
#[derive(Debug, Clone)]
pub struct TrackQueue {
    tracks: Arc<[Track]>,
    current: Option<usize>,
}

impl Default for TrackQueue {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl TrackQueue {
    /// Build a queue positioned at `start_index`, clamped into range.
    pub fn new(tracks: Vec<Track>, start_index: usize) -> Self {
        let current = if tracks.is_empty() {
            None
        } else {
            Some(start_index.min(tracks.len() - 1))
        };
        Self {
            tracks: tracks.into(),
            current,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &Arc<[Track]> {
        &self.tracks
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|idx| self.tracks.get(idx))
    }

    /// Move to `index` if it names a track. Returns whether the move happened.
    pub fn seek(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Step to the next track. On exhaustion the position stays on the last
    /// track and `false` is returned.
    pub fn advance(&mut self) -> bool {
        match self.current {
            Some(idx) if idx + 1 < self.tracks.len() => {
                self.current = Some(idx + 1);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Fragments of the current track still waiting to be spoken.
///
/// The front fragment stays queued while it is being synthesised and is only
/// popped once its completion arrives, so an interrupted fragment is spoken
/// again from its start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FragmentQueue {
    #[default]
    Unbuilt,
    Pending {
        track_index: usize,
        fragments: VecDeque<String>,
    },
}

impl FragmentQueue {
    pub fn build(track_index: usize, body: &str, max_len: usize) -> Self {
        Self::Pending {
            track_index,
            fragments: chunker::split(body, max_len).into(),
        }
    }

    /// Whether this queue holds the remaining fragments of `track_index`.
    pub fn is_built_for(&self, track_index: usize) -> bool {
        matches!(
            self,
            Self::Pending { track_index: built, fragments } if *built == track_index && !fragments.is_empty()
        )
    }

    pub fn front(&self) -> Option<&str> {
        match self {
            Self::Unbuilt => None,
            Self::Pending { fragments, .. } => fragments.front().map(String::as_str),
        }
    }

    /// Drop the fragment that just finished and report whether another remains.
    pub fn complete_front(&mut self) -> bool {
        match self {
            Self::Unbuilt => false,
            Self::Pending { fragments, .. } => {
                fragments.pop_front();
                !fragments.is_empty()
            }
        }
    }

    pub fn remaining(&self) -> usize {
        match self {
            Self::Unbuilt => 0,
            Self::Pending { fragments, .. } => fragments.len(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::Unbuilt;
    }
}
