//! Wall-clock capability used for the `buildTimestamp` field.

use chrono::{DateTime, Local, NaiveDateTime};

/// Source of the current local time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Clock pinned to a Unix timestamp (seconds, UTC).
    pub fn from_epoch_secs(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(|dt| Self(dt.naive_utc()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Environment variable from the reproducible-builds convention.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Clock pinned to `SOURCE_DATE_EPOCH` when it holds a valid timestamp,
/// otherwise the system clock.
pub fn from_env() -> Box<dyn Clock> {
    from_epoch_var(std::env::var(SOURCE_DATE_EPOCH).ok().as_deref())
}

fn from_epoch_var(value: Option<&str>) -> Box<dyn Clock> {
    let Some(raw) = value else {
        return Box::new(SystemClock);
    };
    match raw.trim().parse::<i64>().ok().and_then(FixedClock::from_epoch_secs) {
        Some(clock) => {
            tracing::debug!(epoch = raw, "using {SOURCE_DATE_EPOCH} for build time");
            Box::new(clock)
        }
        None => {
            tracing::warn!(value = raw, "ignoring invalid {SOURCE_DATE_EPOCH}");
            Box::new(SystemClock)
        }
    }
}
