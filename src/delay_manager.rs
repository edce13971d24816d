use std::thread;
use std::time::Duration;

use log::info;

/// Pause between consecutive profile requests.
pub trait Throttle {
    fn pause(&self);
}

/// Static rate limiter: sleeps the same interval every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        FixedDelay { interval }
    }
}

impl Throttle for FixedDelay {
    fn pause(&self) {
        if self.interval.is_zero() {
            return;
        }
        info!("Waiting for {:.1} seconds (Rate Limit)...", self.interval.as_secs_f64());
        thread::sleep(self.interval);
    }
}

/// No pacing at all. For tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Throttle for NoDelay {
    fn pause(&self) {}
}

impl<T: Throttle + ?Sized> Throttle for &T {
    fn pause(&self) {
        (**self).pause()
    }
}
