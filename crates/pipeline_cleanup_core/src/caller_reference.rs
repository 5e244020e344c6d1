//! Caller references for CloudFront invalidation requests.
//!
//! CloudFront treats a repeated caller reference as a retry of the earlier
//! request, so every invalidation needs a fresh token. Tokens are the current
//! time in microseconds since the Unix epoch, bumped so they strictly increase
//! within a process, followed by a random suffix that separates containers
//! reading the same clock tick.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use rand::Rng;

#[derive(Debug, Default)]
pub struct CallerReferenceGenerator {
    last_micros: AtomicI64,
}

impl CallerReferenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_reference(&self, now: DateTime<Utc>) -> String {
        let micros = self.next_micros(now.timestamp_micros());
        let suffix: u32 = rand::thread_rng().gen();
        format!("{micros}-{suffix:08x}")
    }

    fn next_micros(&self, observed: i64) -> i64 {
        let mut last = self.last_micros.load(Ordering::Relaxed);
        loop {
            let candidate = observed.max(last + 1);
            match self.last_micros.compare_exchange_weak(
                last,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }
}

pub fn next_caller_reference() -> String {
    static GENERATOR: OnceLock<CallerReferenceGenerator> = OnceLock::new();
    GENERATOR
        .get_or_init(CallerReferenceGenerator::new)
        .next_reference(Utc::now())
}
