use std::cell::Cell;
use std::rc::Rc;

use time::{Duration, OffsetDateTime};

/// The source of "now" for relative expiries.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a [`Cookies`] facade and a [`MemoryStore`] can
/// be driven by the same clock.
///
/// ```rust
/// use amaretti::{Clock, FixedClock};
/// use amaretti::time::{Duration, macros::datetime};
///
/// let clock = FixedClock::new(datetime!(2013-01-01 00:00:00 UTC));
/// let shared = clock.clone();
/// clock.advance(Duration::seconds(5));
/// assert_eq!(shared.now(), datetime!(2013-01-01 00:00:05 UTC));
/// ```
///
/// [`Cookies`]: crate::Cookies
/// [`MemoryStore`]: crate::MemoryStore
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<OffsetDateTime>>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now.get()
    }
}
