use std::time::{Duration, Instant};

/// Default minimum spacing between two submissions of one session.
pub const MIN_SUBMIT_INTERVAL: Duration = Duration::from_secs(1);

/// Per-session submission pacing. Callers wait out the remaining delta
/// before handing an answer to the engine, so rapid double-submits are
/// serialized at least `min_interval` apart.
#[derive(Debug, Clone, Default)]
pub struct Throttle {
    last: Option<Instant>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time still to wait at `now`; zero for the first submission.
    pub fn remaining(&self, now: Instant, min_interval: Duration) -> Duration {
        match self.last {
            Some(last) => min_interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Sleep out the remaining delta, then mark this submission. The wait
    /// is not cancellable once started.
    pub async fn pace(&mut self, min_interval: Duration) {
        let wait = self.remaining(Instant::now(), min_interval);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        self.last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_submission_is_free() {
        let throttle = Throttle::new();
        assert_eq!(throttle.remaining(Instant::now(), MIN_SUBMIT_INTERVAL), Duration::ZERO);
    }

    #[test]
    fn test_remaining_delta() {
        let start = Instant::now();
        let throttle = Throttle { last: Some(start) };
        let wait = throttle.remaining(start + Duration::from_millis(300), MIN_SUBMIT_INTERVAL);
        assert_eq!(wait, Duration::from_millis(700));
        let wait = throttle.remaining(start + Duration::from_secs(2), MIN_SUBMIT_INTERVAL);
        assert_eq!(wait, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_pace_spaces_submissions() {
        let interval = Duration::from_millis(200);
        let mut throttle = Throttle::new();
        let start = Instant::now();
        throttle.pace(interval).await;
        throttle.pace(interval).await;
        assert!(start.elapsed() >= interval);
    }
}
