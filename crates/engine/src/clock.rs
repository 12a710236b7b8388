//! Commit timestamp source
//!
//! Wall-clock time forced monotonic non-decreasing across calls: a shared
//! atomic holds the highest epoch-millisecond handed out so far, and `now`
//! never returns less than it even if the OS clock steps backwards. Strict
//! per-key increase (two versions of one resource never share a timestamp)
//! is enforced on top of this by the facade's append path.

use chrono::{DateTime, TimeZone, Utc};
use chronicle_core::traits::Clock;
use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic wall-clock [`Clock`] implementation
#[derive(Debug, Default)]
pub struct SystemClock {
    last_millis: AtomicI64,
}

impl SystemClock {
    /// Create a new clock
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_millis();
        let previous = self.last_millis.fetch_max(wall, Ordering::SeqCst);
        let millis = wall.max(previous);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_now_is_monotonic() {
        let clock = SystemClock::new();
        let mut previous = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn test_monotonic_across_threads() {
        let clock = Arc::new(SystemClock::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let clock = Arc::clone(&clock);
            handles.push(std::thread::spawn(move || {
                let mut previous = clock.now();
                for _ in 0..500 {
                    let next = clock.now();
                    assert!(next >= previous);
                    previous = next;
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
