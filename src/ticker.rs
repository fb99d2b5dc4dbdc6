//! Fixed-interval background tasks with a cancellation handle.
//!
//! Both facades run their periodic work on a named thread, the same way the
//! position and watchdog threads do in a player build. Cancellation is a
//! structural guarantee: `cancel` flips a flag and joins the thread, so after
//! it returns the task can never run again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of the cancellation check while sleeping between runs.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// A repeating task on its own named thread.
pub struct Ticker {
    cancelled: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    name: String,
}

impl Ticker {
    /// Spawn a thread running `task` once after `first_delay`, then every
    /// `period` until cancelled.
    pub fn spawn<F>(name: &str, first_delay: Duration, period: Duration, mut task: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                log::debug!("Tick thread '{}' started", thread::current().name().unwrap_or("?"));

                let mut delay = first_delay;
                loop {
                    if sleep_until_cancelled(&flag, delay) {
                        break;
                    }
                    task();
                    delay = period;
                }

                log::debug!("Tick thread '{}' stopped", thread::current().name().unwrap_or("?"));
            })
            .expect("Failed to spawn tick thread");

        Ticker {
            cancelled,
            handle: Some(handle),
            name: name.to_string(),
        }
    }

    /// Stop the task and wait for the thread to exit. Idempotent.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Tick thread '{}' panicked", self.name);
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Sleep for `duration`, waking early if the flag is set. Returns true when
/// cancelled.
fn sleep_until_cancelled(flag: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if flag.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}
