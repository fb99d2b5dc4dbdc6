//! Global timeline viewer simulation.
//!
//! Produces a plausible-looking crowd of "other viewers" for display only:
//! a batch of synthetic records seeded at start, nudged forward by a bounded
//! random walk on every tick, with probabilistic churn. One record is
//! reserved for the local user; its position only moves when reported and it
//! is never picked by the random-removal path.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::subscription::{Registry, Subscription};
use crate::ticker::Ticker;

/// Seed timestamps fall within this window before start.
const SEED_TIMESTAMP_WINDOW_MS: u64 = 5 * 60 * 1000;

/// One viewer on the shared timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerPosition {
    pub id: String,
    /// Percentage of the media duration, in [0,100].
    pub position: f64,
    /// Milliseconds since the epoch; nondecreasing per record.
    pub timestamp: u64,
}

/// Payload delivered to viewer subscribers: the full list plus its count.
#[derive(Debug, Clone)]
pub struct ViewersUpdate {
    pub positions: Vec<ViewerPosition>,
    pub count: usize,
}

/// Simulation tuning knobs.
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Synthetic records seeded at start (the local record is extra).
    pub seed_viewers: usize,
    /// Mutation interval.
    pub tick: Duration,
    /// Delay before the first (mutation-free) notification.
    pub first_notify_delay: Duration,
    /// Chance per tick of a new viewer arriving.
    pub add_probability: f64,
    /// Chance per tick of one viewer leaving, population permitting.
    pub remove_probability: f64,
    /// Random removal never shrinks the population below this.
    pub population_floor: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            seed_viewers: 50,
            tick: Duration::from_secs(5),
            first_notify_delay: Duration::from_millis(100),
            add_probability: 0.3,
            remove_probability: 0.2,
            population_floor: 30,
        }
    }
}

struct TimelineInner {
    config: TimelineConfig,
    local_id: String,
    viewers: Vec<ViewerPosition>,
    rng: StdRng,
    ticker: Option<Ticker>,
}

impl TimelineInner {
    /// Replace the population with a fresh seed batch plus the local record.
    fn seed(&mut self) {
        let now = now_ms();
        self.viewers = (0..self.config.seed_viewers)
            .map(|i| ViewerPosition {
                id: format!("user-{}", i),
                position: self.rng.gen_range(0.0..100.0),
                timestamp: now.saturating_sub(self.rng.gen_range(0..SEED_TIMESTAMP_WINDOW_MS)),
            })
            .collect();
        self.viewers.push(ViewerPosition {
            id: self.local_id.clone(),
            position: 0.0,
            timestamp: now,
        });
    }

    /// One mutation pass: random walk, probabilistic arrival and departure.
    fn advance(&mut self) {
        let now = now_ms();

        for viewer in &mut self.viewers {
            if viewer.id == self.local_id {
                continue;
            }
            viewer.position = (viewer.position + self.rng.gen_range(0.0..1.0)).min(100.0);
            viewer.timestamp = now;
        }

        if self.rng.gen_range(0.0..1.0) < self.config.add_probability {
            let id = format!("user-{}", self.rng.gen_range(0..10_000u32));
            // One record per id; a colliding arrival is skipped this tick.
            if !self.viewers.iter().any(|v| v.id == id) {
                self.viewers.push(ViewerPosition {
                    id,
                    position: self.rng.gen_range(0.0..20.0),
                    timestamp: now,
                });
            }
        }

        if self.rng.gen_range(0.0..1.0) < self.config.remove_probability
            && self.viewers.len() > self.config.population_floor
        {
            let candidates: Vec<usize> = self
                .viewers
                .iter()
                .enumerate()
                .filter(|(_, v)| v.id != self.local_id)
                .map(|(i, _)| i)
                .collect();
            if !candidates.is_empty() {
                let victim = candidates[self.rng.gen_range(0..candidates.len())];
                self.viewers.remove(victim);
            }
        }

        log::trace!("Timeline tick: {} viewers", self.viewers.len());
    }

    fn snapshot(&self) -> ViewersUpdate {
        ViewersUpdate {
            positions: self.viewers.clone(),
            count: self.viewers.len(),
        }
    }
}

/// Facade over the synthetic viewer population.
///
/// Cheap to clone; clones share the same state and stream.
#[derive(Clone)]
pub struct GlobalTimeline {
    inner: Arc<Mutex<TimelineInner>>,
    viewers: Registry<ViewersUpdate>,
}

impl GlobalTimeline {
    pub fn new() -> Self {
        Self::with_config(TimelineConfig::default())
    }

    pub fn with_config(config: TimelineConfig) -> Self {
        Self::build(config, StdRng::from_entropy())
    }

    /// Deterministic simulation for tests.
    pub fn seeded(config: TimelineConfig, seed: u64) -> Self {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: TimelineConfig, mut rng: StdRng) -> Self {
        // Seeded synthetic ids occupy the low range, so the local id is
        // drawn above it to keep ids unique.
        let local_id = format!(
            "user-{}",
            rng.gen_range(config.seed_viewers as u32..10_000u32)
        );
        GlobalTimeline {
            inner: Arc::new(Mutex::new(TimelineInner {
                config,
                local_id,
                viewers: Vec::new(),
                rng,
                ticker: None,
            })),
            viewers: Registry::new(),
        }
    }

    /// Seed the population and begin ticking. Idempotent while running.
    pub fn start(&self) {
        let mut inner = crate::lock(&self.inner);
        if inner.ticker.is_some() {
            return;
        }
        inner.seed();
        log::info!(
            "Global timeline started: {} viewers (local id {})",
            inner.viewers.len(),
            inner.local_id
        );

        let state = Arc::clone(&self.inner);
        let registry = self.viewers.clone();
        let (first_delay, tick) = (inner.config.first_notify_delay, inner.config.tick);
        let mut first = true;
        inner.ticker = Some(Ticker::spawn("viewer-sim", first_delay, tick, move || {
            let update = {
                let mut state = crate::lock(&state);
                if first {
                    // The initial delivery shows the seeded crowd untouched.
                    first = false;
                } else {
                    state.advance();
                }
                state.snapshot()
            };
            registry.notify(&update);
        }));
    }

    /// Overwrite the local record's position and timestamp.
    ///
    /// Subscribers see the change on the next tick, not immediately.
    pub fn report_local_position(&self, percentage: f64) {
        if !percentage.is_finite() {
            return;
        }
        let mut inner = crate::lock(&self.inner);
        let local_id = inner.local_id.clone();
        let now = now_ms();
        if let Some(local) = inner.viewers.iter_mut().find(|v| v.id == local_id) {
            local.position = percentage.clamp(0.0, 100.0);
            local.timestamp = now;
        }
    }

    /// Subscribe to population updates.
    pub fn on_viewers_update(
        &self,
        callback: impl FnMut(&ViewersUpdate) + Send + 'static,
    ) -> Subscription {
        self.viewers.subscribe(callback)
    }

    /// The reserved local-user record id.
    pub fn local_id(&self) -> String {
        crate::lock(&self.inner).local_id.clone()
    }

    /// Cancel the tick and drop every subscriber. Idempotent.
    pub fn stop(&self) {
        let ticker = crate::lock(&self.inner).ticker.take();
        if let Some(mut ticker) = ticker {
            ticker.cancel();
            log::info!("Global timeline stopped");
        }
        self.viewers.clear();
    }
}

impl Default for GlobalTimeline {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seeded_inner(seed: u64) -> GlobalTimeline {
        let timeline = GlobalTimeline::seeded(TimelineConfig::default(), seed);
        crate::lock(&timeline.inner).seed();
        timeline
    }

    #[test]
    fn seeding_yields_the_batch_plus_the_local_record() {
        let timeline = seeded_inner(42);
        let inner = crate::lock(&timeline.inner);

        assert_eq!(inner.viewers.len(), 51);
        let local = inner
            .viewers
            .iter()
            .find(|v| v.id == inner.local_id)
            .expect("local record");
        assert_eq!(local.position, 0.0);
    }

    #[test]
    fn seeded_positions_are_in_range_with_recent_past_timestamps() {
        let timeline = seeded_inner(7);
        let inner = crate::lock(&timeline.inner);
        let now = now_ms();

        for viewer in &inner.viewers {
            assert!((0.0..=100.0).contains(&viewer.position));
            assert!(viewer.timestamp <= now);
            assert!(now - viewer.timestamp <= SEED_TIMESTAMP_WINDOW_MS);
        }
    }

    #[test]
    fn local_record_survives_heavy_churn() {
        let timeline = seeded_inner(1);
        let mut inner = crate::lock(&timeline.inner);
        let local_id = inner.local_id.clone();

        for _ in 0..500 {
            inner.advance();
        }

        assert!(inner.viewers.iter().any(|v| v.id == local_id));
    }

    #[test]
    fn ids_stay_unique_across_many_ticks() {
        let timeline = seeded_inner(2);
        let mut inner = crate::lock(&timeline.inner);

        for _ in 0..500 {
            inner.advance();
        }

        let ids: HashSet<&str> = inner.viewers.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids.len(), inner.viewers.len());
    }

    #[test]
    fn positions_never_exceed_the_cap() {
        let timeline = seeded_inner(3);
        let mut inner = crate::lock(&timeline.inner);

        for _ in 0..300 {
            inner.advance();
        }

        assert!(inner.viewers.iter().all(|v| v.position <= 100.0));
    }

    #[test]
    fn population_never_drops_below_the_floor() {
        let config = TimelineConfig {
            remove_probability: 1.0,
            add_probability: 0.0,
            ..TimelineConfig::default()
        };
        let timeline = GlobalTimeline::seeded(config, 4);
        let mut inner = crate::lock(&timeline.inner);
        inner.seed();

        for _ in 0..200 {
            inner.advance();
        }

        assert_eq!(inner.viewers.len(), inner.config.population_floor);
    }

    #[test]
    fn local_position_is_only_moved_by_reports() {
        let timeline = seeded_inner(5);
        timeline.report_local_position(42.0);

        {
            let mut inner = crate::lock(&timeline.inner);
            for _ in 0..50 {
                inner.advance();
            }
        }

        let inner = crate::lock(&timeline.inner);
        let local_id = inner.local_id.clone();
        let local = inner
            .viewers
            .iter()
            .find(|v| v.id == local_id)
            .expect("local record");
        assert_eq!(local.position, 42.0);
    }

    #[test]
    fn report_clamps_out_of_range_values() {
        let timeline = seeded_inner(6);
        timeline.report_local_position(250.0);

        let inner = crate::lock(&timeline.inner);
        let local_id = inner.local_id.clone();
        let local = inner
            .viewers
            .iter()
            .find(|v| v.id == local_id)
            .expect("local record");
        assert_eq!(local.position, 100.0);
    }

    #[test]
    fn stop_is_idempotent_and_later_commands_are_safe() {
        let timeline = GlobalTimeline::seeded(TimelineConfig::default(), 8);
        timeline.start();
        timeline.stop();
        timeline.stop();
        timeline.report_local_position(10.0);
    }

    #[test]
    fn first_notification_carries_the_seeded_crowd() {
        let config = TimelineConfig {
            tick: Duration::from_millis(20),
            first_notify_delay: Duration::from_millis(1),
            ..TimelineConfig::default()
        };
        let timeline = GlobalTimeline::seeded(config, 9);
        let counts = Arc::new(Mutex::new(Vec::new()));
        let sink = counts.clone();
        let _sub = timeline.on_viewers_update(move |update| {
            sink.lock().unwrap().push(update.count);
        });

        timeline.start();
        std::thread::sleep(Duration::from_millis(60));
        timeline.stop();

        let counts = counts.lock().unwrap();
        assert_eq!(counts.first().copied(), Some(51));
    }

    #[test]
    fn unsubscribed_callbacks_miss_every_later_tick() {
        let config = TimelineConfig {
            tick: Duration::from_millis(10),
            first_notify_delay: Duration::from_millis(1),
            ..TimelineConfig::default()
        };
        let timeline = GlobalTimeline::seeded(config, 10);
        let count = Arc::new(Mutex::new(0usize));
        let sink = count.clone();
        let sub = timeline.on_viewers_update(move |_| {
            *sink.lock().unwrap() += 1;
        });

        sub.unsubscribe();
        timeline.start();
        std::thread::sleep(Duration::from_millis(60));
        timeline.stop();

        assert_eq!(*count.lock().unwrap(), 0);
    }
}
