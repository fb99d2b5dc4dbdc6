//! Host media-element boundary.
//!
//! The playback facade drives exactly one native playback primitive at a
//! time. Hosts supply it behind [`MediaElement`]; events come back through an
//! attached sink carrying their payloads, so handlers never have to query the
//! element from inside an event dispatch.

use std::sync::{Arc, Mutex};

use url::Url;

/// Events the element reports to an attached sink.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position progressed.
    TimeUpdate { current_time: f64, duration: f64 },
    /// Playback started.
    Play,
    /// Playback paused.
    Pause,
    /// Media metadata became available.
    LoadedMetadata { duration: f64 },
    /// The element hit a playback error.
    Error(String),
}

/// Callback receiving element events.
pub type EventSink = Box<dyn FnMut(MediaEvent) + Send>;

/// A shareable handle to an element implementation.
pub type SharedElement = Arc<Mutex<dyn MediaElement>>;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// A play request was rejected by the host (autoplay policy, decode
    /// failure, and similar).
    #[error("playback request rejected: {0}")]
    PlaybackRejected(String),
}

/// The native playback primitive.
///
/// Commands are synchronous from the caller's point of view; anything the
/// host completes later is reported through the event sink.
pub trait MediaElement: Send {
    /// Assign the media source.
    fn set_source(&mut self, src: &Url);

    /// Begin (re)loading the current source.
    fn load(&mut self);

    /// Request playback.
    fn play(&mut self) -> Result<(), MediaError>;

    /// Request pause.
    fn pause(&mut self);

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Media duration in seconds; 0 or non-finite while unknown.
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn set_volume(&mut self, volume: f64);

    fn muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    /// Attach the event sink, replacing any previous one.
    fn attach_sink(&mut self, sink: EventSink);

    /// Detach the event sink; further events are dropped by the element.
    fn detach_sink(&mut self);
}
