//! Core services behind the StreamSync demo player.
//!
//! Three pieces cooperate inside one process, with no backend: a playback
//! facade over a host media element ([`PlaybackService`]), a synthetic
//! viewer simulation ([`GlobalTimeline`]), and a composition layer wiring
//! them together ([`SyncContext`]). All "live" behavior is generated on
//! timers in-process.

pub mod catalog;
pub mod context;
pub mod media;
pub mod player;
pub mod prefs;
pub mod subscription;
pub mod ticker;
pub mod timeline;

pub use catalog::{Catalog, CatalogError, Video};
pub use context::SyncContext;
pub use media::{EventSink, MediaElement, MediaError, MediaEvent, SharedElement};
pub use player::PlaybackService;
pub use prefs::Prefs;
pub use subscription::{Registry, Subscription};
pub use ticker::Ticker;
pub use timeline::{GlobalTimeline, TimelineConfig, ViewerPosition, ViewersUpdate};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering from poisoning. A poisoned lock only means a
/// subscriber callback panicked; the guarded state is still the freshest we
/// have.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
