use time::{Duration, OffsetDateTime};

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Hands out time-derived ids (epoch milliseconds). Two ids issued within the
/// same millisecond still differ, and ids reported as taken are skipped.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn next(&mut self, now: OffsetDateTime, taken: impl Fn(i64) -> bool) -> i64 {
        let millis = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        let mut candidate = millis.max(self.last + 1);
        while taken(candidate) {
            candidate += 1;
        }
        self.last = candidate;
        candidate
    }
}

/// Returns a modification stamp that is strictly later than `previous`.
pub fn next_stamp(previous: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
