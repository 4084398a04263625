#[cfg(test)]
use std::cell::Cell;
#[cfg(test)]
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock
{
    fn now(&self) -> Duration;
}

pub struct SystemClock
{
    origin: Instant,
}

impl SystemClock
{
    pub fn new() -> Self
    {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Clock for SystemClock
{
    fn now(&self) -> Duration
    {
        Instant::now().saturating_duration_since(self.origin)
    }
}

/// Hand-driven clock. Clones share the same reading.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct ManualClock
{
    now: Rc<Cell<Duration>>,
}

#[cfg(test)]
impl ManualClock
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn advance(&self, delta: Duration)
    {
        self.now.set(self.now.get() + delta);
    }

    pub fn advance_ms(&self, millis: u64)
    {
        self.advance(Duration::from_millis(millis));
    }
}

#[cfg(test)]
impl Clock for ManualClock
{
    fn now(&self) -> Duration
    {
        self.now.get()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn manual_clock_clones_share_time()
    {
        let clock = ManualClock::new();
        let handle = clock.clone();
        clock.advance_ms(250);
        assert_eq!(handle.now(), Duration::from_millis(250));
    }

    #[test]
    fn system_clock_never_goes_backwards()
    {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
