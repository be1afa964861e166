//! Wall-clock abstraction
//!
//! Nonce expiry is a plain comparison against "now", so every component that
//! needs the current time takes a [`SystemTimeSource`] instead of calling
//! `Utc::now()` directly. Tests swap in [`FakeSystemTimeSource`] and move the
//! clock by hand.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Abstracts the system time source
pub trait SystemTimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real clock backed by `Utc::now()`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSourceDefault;

impl SystemTimeSource for SystemTimeSourceDefault {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests
#[derive(Debug, Clone)]
pub struct FakeSystemTimeSource {
    t: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeSystemTimeSource {
    pub fn new() -> Self {
        Self::new_set(Utc::now())
    }

    pub fn new_set(t: DateTime<Utc>) -> Self {
        Self {
            t: Arc::new(Mutex::new(t)),
        }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        let mut current = self.t.lock().unwrap_or_else(|e| e.into_inner());

        if *current > t {
            panic!("The previous time [{}] is more than new time [{t}]", *current);
        }

        *current = t;
    }

    pub fn advance(&self, time_quantum: Duration) {
        let mut current = self.t.lock().unwrap_or_else(|e| e.into_inner());
        *current += time_quantum;
    }
}

impl Default for FakeSystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimeSource for FakeSystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.t.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_time_source_advance() {
        let start = Utc::now();
        let clock = FakeSystemTimeSource::new_set(start);

        clock.advance(Duration::seconds(301));
        assert_eq!(clock.now(), start + Duration::seconds(301));
    }

    #[test]
    #[should_panic]
    fn test_fake_time_source_rejects_going_back() {
        let start = Utc::now();
        let clock = FakeSystemTimeSource::new_set(start);

        clock.set(start - Duration::seconds(1));
    }
}
