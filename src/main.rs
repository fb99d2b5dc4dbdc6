use std::thread;
use std::time::Duration;

use streamsync::timeline::TimelineConfig;
use streamsync::{GlobalTimeline, PlaybackService, Prefs, SyncContext};

/// Headless demo run: start the services, watch the simulated crowd for a
/// few ticks, shut down.
fn main() {
    env_logger::init();

    let timeline = GlobalTimeline::with_config(TimelineConfig {
        tick: Duration::from_secs(1),
        ..TimelineConfig::default()
    });
    let mut context =
        SyncContext::with_services(PlaybackService::new(), timeline, Prefs::open_default());

    if let Some(video) = context.current_video() {
        log::info!("Now featuring: {} ({})", video.title, video.src);
    }

    for _ in 0..5 {
        thread::sleep(Duration::from_secs(1));
        log::info!("{} viewers on the global timeline", context.viewer_count());
    }

    context.shutdown();
}
