//! Composition layer wiring the playback facade to the viewer simulation.
//!
//! One `SyncContext` owns both services for its lifetime: it forwards local
//! playback position into the simulation so the local user appears in the
//! crowd, keeps a snapshot read model fed by the four event streams, and owns
//! the persisted theme preference. `shutdown` releases every registration and
//! stops both services.

use std::sync::{Arc, Mutex};

use crate::catalog::{CatalogError, Video};
use crate::media::SharedElement;
use crate::player::PlaybackService;
use crate::prefs::{Prefs, system_prefers_dark};
use crate::subscription::Subscription;
use crate::timeline::{GlobalTimeline, ViewerPosition};

#[derive(Default)]
struct SharedState {
    is_connected: bool,
    current_position: f64,
    viewer_count: usize,
    viewer_positions: Vec<ViewerPosition>,
    is_playing: bool,
    dark_mode: bool,
}

/// Process-wide aggregator over the two facades.
pub struct SyncContext {
    player: PlaybackService,
    timeline: GlobalTimeline,
    state: Arc<Mutex<SharedState>>,
    prefs: Option<Prefs>,
    subscriptions: Vec<Subscription>,
}

impl SyncContext {
    /// Build fresh services and start them.
    pub fn new(prefs: Option<Prefs>) -> Self {
        Self::with_services(PlaybackService::new(), GlobalTimeline::new(), prefs)
    }

    /// Compose explicitly constructed services. Lets tests run multiple
    /// isolated instances side by side.
    pub fn with_services(
        player: PlaybackService,
        timeline: GlobalTimeline,
        prefs: Option<Prefs>,
    ) -> Self {
        let dark_mode = prefs
            .as_ref()
            .and_then(Prefs::dark_mode)
            .unwrap_or_else(system_prefers_dark);
        let state = Arc::new(Mutex::new(SharedState {
            dark_mode,
            ..SharedState::default()
        }));

        let subscriptions = vec![
            player.on_position_change({
                let state = state.clone();
                let timeline = timeline.clone();
                move |position| {
                    crate::lock(&state).current_position = *position;
                    timeline.report_local_position(*position);
                }
            }),
            timeline.on_viewers_update({
                let state = state.clone();
                move |update| {
                    let mut state = crate::lock(&state);
                    state.viewer_positions = update.positions.clone();
                    state.viewer_count = update.count;
                }
            }),
            player.on_connection_change({
                let state = state.clone();
                move |connected| crate::lock(&state).is_connected = *connected
            }),
            player.on_playback_change({
                let state = state.clone();
                move |playing| crate::lock(&state).is_playing = *playing
            }),
        ];

        timeline.start();
        log::info!("Sync context activated (dark_mode={})", dark_mode);

        SyncContext {
            player,
            timeline,
            state,
            prefs,
            subscriptions,
        }
    }

    // Read model ----------------------------------------------------------

    pub fn is_connected(&self) -> bool {
        crate::lock(&self.state).is_connected
    }

    pub fn current_position(&self) -> f64 {
        crate::lock(&self.state).current_position
    }

    pub fn viewer_count(&self) -> usize {
        crate::lock(&self.state).viewer_count
    }

    pub fn viewer_positions(&self) -> Vec<ViewerPosition> {
        crate::lock(&self.state).viewer_positions.clone()
    }

    pub fn current_video(&self) -> Option<Video> {
        self.player.current_video()
    }

    pub fn is_playing(&self) -> bool {
        crate::lock(&self.state).is_playing
    }

    pub fn dark_mode(&self) -> bool {
        crate::lock(&self.state).dark_mode
    }

    /// Id of the local user's record in the viewer list.
    pub fn local_viewer_id(&self) -> String {
        self.timeline.local_id()
    }

    // Commands ------------------------------------------------------------

    /// Bind or clear the media element on the playback facade.
    pub fn bind(&self, element: Option<SharedElement>) {
        self.player.bind(element);
    }

    /// Load the video with the given id. Unknown ids are a no-op.
    pub fn select_video(&self, id: &str) {
        match self.player.video_by_id(id) {
            Some(video) => {
                self.player.load_video(&video);
                crate::lock(&self.state).is_playing = false;
            }
            None => log::warn!("select_video: no such video '{}'", id),
        }
    }

    pub fn toggle_playback(&self) {
        let playing = crate::lock(&self.state).is_playing;
        if playing {
            self.player.pause();
        } else {
            self.player.play();
        }
    }

    pub fn seek_to(&self, percentage: f64) {
        self.player.seek_to(percentage);
    }

    /// Validate and add a user-submitted video URL.
    pub fn add_custom_video_url(&self, raw: &str) -> Result<Video, CatalogError> {
        self.player.add_custom_video_url(raw)
    }

    pub fn all_videos(&self) -> Vec<Video> {
        self.player.all_videos()
    }

    /// Flip the theme and persist it as `"true"`/`"false"`.
    pub fn toggle_dark_mode(&self) {
        let dark = {
            let mut state = crate::lock(&self.state);
            state.dark_mode = !state.dark_mode;
            state.dark_mode
        };
        if let Some(prefs) = &self.prefs {
            prefs.set_dark_mode(dark);
        }
        log::debug!("Dark mode toggled: {}", dark);
    }

    /// Release every stream registration and stop both facades. Idempotent.
    pub fn shutdown(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.player.disconnect();
        self.timeline.stop();
        log::info!("Sync context deactivated");
    }
}

impl Drop for SyncContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
