//! Minimum-interval gate between provider calls.
//!
//! Polygon's free tier allows roughly five calls per second. Every request
//! goes through [`Pacer::wait`], which sleeps until at least `min_interval`
//! has passed since the previous call was let through.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// A pacer that never sleeps.
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time still to wait before the next call may go out.
    pub fn remaining(&self) -> Duration {
        let last = self.lock();
        match *last {
            Some(at) => self.min_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Block until the next call is allowed, then record it.
    pub fn wait(&self) {
        let mut last = self.lock();
        if let Some(at) = *last {
            let remaining = self.min_interval.saturating_sub(at.elapsed());
            if !remaining.is_zero() {
                std::thread::sleep(remaining);
            }
        }
        *last = Some(Instant::now());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        // The guarded value is a plain timestamp; a poisoned lock is still usable.
        self.last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_is_immediate() {
        let pacer = Pacer::new(Duration::from_secs(60));
        assert_eq!(pacer.remaining(), Duration::ZERO);
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn second_call_waits_for_interval() {
        let pacer = Pacer::new(Duration::from_millis(30));
        pacer.wait();
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn records_pending_interval() {
        let pacer = Pacer::new(Duration::from_secs(60));
        pacer.wait();
        assert!(pacer.remaining() > Duration::from_secs(50));
    }

    #[test]
    fn unpaced_never_sleeps() {
        let pacer = Pacer::unpaced();
        let start = Instant::now();
        for _ in 0..100 {
            pacer.wait();
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(Pacer::default().min_interval(), Duration::from_millis(200));
    }
}
