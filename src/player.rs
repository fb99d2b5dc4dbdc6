//! Playback facade.
//!
//! Single point of contact between callers and at most one bound media
//! element. Commands are translated into element operations; element events
//! are re-broadcast on three independent streams (position percentage,
//! playback state, connection state). Playback failures are logged and
//! reflected in state, never returned to the caller, and every command is a
//! silent no-op while no element is bound.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::catalog::{Catalog, CatalogError, Video};
use crate::media::{EventSink, MediaEvent, SharedElement};
use crate::subscription::{Registry, Subscription};
use crate::ticker::Ticker;

/// Interval of the maintenance tick that runs while playing. Reserved for a
/// future server round-trip; today it only logs.
const SYNC_INTERVAL: Duration = Duration::from_secs(5);

struct PlayerInner {
    element: Option<SharedElement>,
    catalog: Catalog,
    current_video: Option<Video>,
    is_playing: bool,
    sync_ticker: Option<Ticker>,
}

/// Facade over one native media element.
///
/// Cheap to clone; clones share the same state and streams.
#[derive(Clone)]
pub struct PlaybackService {
    inner: Arc<Mutex<PlayerInner>>,
    position: Registry<f64>,
    connection: Registry<bool>,
    playback: Registry<bool>,
}

impl PlaybackService {
    /// Build a fresh service. The current video defaults to the first
    /// featured entry.
    pub fn new() -> Self {
        let catalog = Catalog::new();
        let current_video = catalog.first_featured().cloned();
        log::info!("Playback service initialized");

        PlaybackService {
            inner: Arc::new(Mutex::new(PlayerInner {
                element: None,
                catalog,
                current_video,
                is_playing: false,
                sync_ticker: None,
            })),
            position: Registry::new(),
            connection: Registry::new(),
            playback: Registry::new(),
        }
    }

    /// Associate (or clear) the media element, replacing any previous
    /// binding's event sink.
    pub fn bind(&self, element: Option<SharedElement>) {
        let previous = crate::lock(&self.inner).element.take();
        if let Some(previous) = previous {
            crate::lock(&previous).detach_sink();
        }

        if let Some(element) = element {
            let sink = self.event_sink();
            crate::lock(&element).attach_sink(sink);
            crate::lock(&self.inner).element = Some(element);
            log::debug!("Media element bound");
        } else {
            log::debug!("Media element cleared");
        }
    }

    fn event_sink(&self) -> EventSink {
        let inner = Arc::downgrade(&self.inner);
        let position = self.position.clone();
        let playback = self.playback.clone();
        Box::new(move |event| handle_element_event(&inner, &position, &playback, event))
    }

    /// Point the element at `video` and reload it. Position resets to 0 and
    /// subscribers are told so immediately.
    pub fn load_video(&self, video: &Video) {
        let element = {
            let mut inner = crate::lock(&self.inner);
            inner.current_video = Some(video.clone());
            inner.element.clone()
        };

        let Some(element) = element else { return };
        {
            let mut element = crate::lock(&element);
            element.set_source(&video.src);
            element.load();
        }
        log::info!("Video loaded: id={}, src={}", video.id, video.src);
        self.position.notify(&0.0);
    }

    /// Request playback. On success the maintenance tick starts; failures
    /// are logged, never propagated.
    pub fn play(&self) {
        let element = crate::lock(&self.inner).element.clone();
        let Some(element) = element else { return };

        let result = crate::lock(&element).play();
        match result {
            Ok(()) => {
                let mut inner = crate::lock(&self.inner);
                if inner.sync_ticker.is_none() {
                    inner.sync_ticker = Some(Ticker::spawn(
                        "playback-sync",
                        SYNC_INTERVAL,
                        SYNC_INTERVAL,
                        || {
                            // Placeholder for the eventual server position
                            // round-trip.
                            log::trace!("Playback sync tick");
                        },
                    ));
                }
            }
            Err(e) => log::error!("Play request failed: {}", e),
        }
    }

    /// Request pause and stop the maintenance tick.
    pub fn pause(&self) {
        let element = crate::lock(&self.inner).element.clone();
        let Some(element) = element else { return };

        crate::lock(&element).pause();

        let ticker = crate::lock(&self.inner).sync_ticker.take();
        if let Some(mut ticker) = ticker {
            ticker.cancel();
        }
    }

    /// Seek to a position expressed as a percentage of the duration.
    ///
    /// No-op while the duration is unknown or zero; otherwise the element
    /// time is set and position subscribers are notified immediately, without
    /// waiting for the element's own event.
    pub fn seek_to(&self, percentage: f64) {
        if !percentage.is_finite() {
            return;
        }
        let pct = percentage.clamp(0.0, 100.0);

        let element = crate::lock(&self.inner).element.clone();
        let Some(element) = element else { return };

        {
            let mut element = crate::lock(&element);
            let duration = element.duration();
            if !duration.is_finite() || duration <= 0.0 {
                return;
            }
            element.set_current_time(pct / 100.0 * duration);
        }
        self.position.notify(&pct);
    }

    /// Set the element volume in [0,1].
    pub fn set_volume(&self, volume: f64) {
        let element = crate::lock(&self.inner).element.clone();
        let Some(element) = element else { return };

        let volume = volume.clamp(0.0, 1.0);
        let mut element = crate::lock(&element);
        element.set_volume(volume);
        element.set_muted(volume == 0.0);
    }

    /// Flip the mute state. Muting zeroes the volume; unmuting restores it
    /// to full.
    pub fn toggle_mute(&self) {
        let element = crate::lock(&self.inner).element.clone();
        let Some(element) = element else { return };

        let mut element = crate::lock(&element);
        if element.muted() {
            element.set_volume(1.0);
            element.set_muted(false);
        } else {
            element.set_volume(0.0);
            element.set_muted(true);
        }
    }

    pub fn video_by_id(&self, id: &str) -> Option<Video> {
        crate::lock(&self.inner).catalog.by_id(id).cloned()
    }

    pub fn all_videos(&self) -> Vec<Video> {
        crate::lock(&self.inner).catalog.all()
    }

    /// Upsert a custom video by id.
    pub fn add_custom_video(&self, video: Video) {
        crate::lock(&self.inner).catalog.upsert_custom(video);
    }

    /// Validate and add a user-submitted video URL.
    pub fn add_custom_video_url(&self, raw: &str) -> Result<Video, CatalogError> {
        crate::lock(&self.inner).catalog.add_custom_url(raw)
    }

    pub fn current_video(&self) -> Option<Video> {
        crate::lock(&self.inner).current_video.clone()
    }

    pub fn is_playing(&self) -> bool {
        crate::lock(&self.inner).is_playing
    }

    /// Subscribe to position updates (percentage of duration).
    pub fn on_position_change(
        &self,
        callback: impl FnMut(&f64) + Send + 'static,
    ) -> Subscription {
        self.position.subscribe(callback)
    }

    /// Subscribe to connection updates. There is no transport behind this
    /// stream; new subscribers get an immediate synthetic `true`.
    pub fn on_connection_change(
        &self,
        mut callback: impl FnMut(&bool) + Send + 'static,
    ) -> Subscription {
        callback(&true);
        self.connection.subscribe(callback)
    }

    /// Subscribe to play/pause state changes.
    pub fn on_playback_change(
        &self,
        callback: impl FnMut(&bool) + Send + 'static,
    ) -> Subscription {
        self.playback.subscribe(callback)
    }

    /// Detach the element, stop the maintenance tick, and drop every
    /// subscriber. Idempotent; later commands are silent no-ops.
    pub fn disconnect(&self) {
        let (element, ticker) = {
            let mut inner = crate::lock(&self.inner);
            (inner.element.take(), inner.sync_ticker.take())
        };
        if let Some(element) = element {
            crate::lock(&element).detach_sink();
        }
        if let Some(mut ticker) = ticker {
            ticker.cancel();
        }

        self.position.clear();
        self.connection.clear();
        self.playback.clear();
        log::info!("Playback service disconnected");
    }
}

impl Default for PlaybackService {
    fn default() -> Self {
        Self::new()
    }
}

fn handle_element_event(
    inner: &Weak<Mutex<PlayerInner>>,
    position: &Registry<f64>,
    playback: &Registry<bool>,
    event: MediaEvent,
) {
    match event {
        MediaEvent::TimeUpdate {
            current_time,
            duration,
        } => {
            if duration.is_finite() && duration > 0.0 {
                position.notify(&(current_time / duration * 100.0));
            }
        }
        MediaEvent::Play => {
            if let Some(inner) = inner.upgrade() {
                crate::lock(&inner).is_playing = true;
            }
            playback.notify(&true);
        }
        MediaEvent::Pause => {
            if let Some(inner) = inner.upgrade() {
                crate::lock(&inner).is_playing = false;
            }
            playback.notify(&false);
        }
        MediaEvent::LoadedMetadata { duration } => {
            log::debug!("Video metadata loaded: duration={}s", duration);
            let Some(inner) = inner.upgrade() else { return };
            let mut inner = crate::lock(&inner);
            // Custom videos start with duration 0; fill in the real value
            // once the element reports it.
            let pending = inner
                .current_video
                .as_ref()
                .filter(|video| video.duration == 0.0)
                .map(|video| video.id.clone());
            if let Some(id) = pending {
                if let Some(video) = inner.current_video.as_mut() {
                    video.duration = duration;
                }
                inner.catalog.set_duration(&id, duration);
            }
        }
        MediaEvent::Error(message) => {
            log::error!("Video playback error: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_the_first_featured_video() {
        let player = PlaybackService::new();
        assert_eq!(player.current_video().map(|v| v.id), Some("1".to_string()));
        assert!(!player.is_playing());
    }

    #[test]
    fn commands_without_an_element_are_silent_noops() {
        let player = PlaybackService::new();
        let video = player.video_by_id("1").expect("featured video");

        player.play();
        player.pause();
        player.seek_to(50.0);
        player.set_volume(0.5);
        player.toggle_mute();
        player.load_video(&video);

        assert_eq!(player.current_video().map(|v| v.id), Some("1".to_string()));
    }

    #[test]
    fn lookup_miss_yields_none() {
        let player = PlaybackService::new();
        assert!(player.video_by_id("missing").is_none());
    }

    #[test]
    fn catalog_surface_concatenates_featured_and_custom() {
        let player = PlaybackService::new();
        let added = player
            .add_custom_video_url("https://example.com/v.mp4")
            .expect("valid URL");

        let all = player.all_videos();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, "1");
        assert_eq!(all[3].id, added.id);
    }

    #[test]
    fn rejected_url_leaves_the_catalog_unchanged() {
        let player = PlaybackService::new();
        assert!(player.add_custom_video_url("not-a-url").is_err());
        assert_eq!(player.all_videos().len(), 3);
    }

    #[test]
    fn disconnect_is_idempotent_and_commands_stay_safe() {
        let player = PlaybackService::new();
        player.disconnect();
        player.disconnect();

        player.play();
        player.pause();
        player.seek_to(25.0);
        assert!(player.video_by_id("2").is_some());
    }

    #[test]
    fn connection_stream_reports_connected_immediately() {
        let player = PlaybackService::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let _sub = player.on_connection_change(move |connected| {
            sink.lock().unwrap().push(*connected);
        });

        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }
}
