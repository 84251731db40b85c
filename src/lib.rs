//! Sequential speech playback for text documents.
//!
//! A [`PlaybackEngine`] turns an ordered queue of [`Track`]s into continuous
//! speech on top of a [`SynthesisAdapter`] that can only speak one bounded
//! fragment at a time. [`EngineSession`] runs an engine on its own thread and is
//! what a host audio session normally holds.

pub mod chunker;
pub mod config;
pub mod engine;
pub mod queue;
pub mod resumption;
pub mod session;
pub mod synth;
pub mod util;

pub use config::{ConfigError, EngineConfig, LoggingConfig};
pub use engine::{PlaybackEngine, PlaybackError, PlaybackState, PlayerSnapshot};
pub use queue::{Track, TrackId, TrackMetadata};
pub use resumption::{ResumptionPayload, ResumptionProvider};
pub use session::{EngineSession, SessionError};
pub use synth::{AdapterCallback, AdapterEvent, SynthesisAdapter, SynthesisError, SynthesisToken};
