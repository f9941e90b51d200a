use chrono::{DateTime, Utc};

/// Trait for wall-clock reads to enable testing
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now_utc(&self) -> DateTime<Utc>;

    /// Milliseconds since the UNIX epoch
    fn now_millis(&self) -> i64 {
        self.now_utc().timestamp_millis()
    }
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_millis_matches_utc() {
        let clock = SystemClock;
        let before = Utc::now().timestamp_millis();
        let now = clock.now_millis();
        let after = Utc::now().timestamp_millis();
        assert!(before <= now && now <= after);
    }
}
