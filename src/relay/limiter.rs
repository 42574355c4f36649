use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Minimum spacing between accepted submissions, per sender key (email or peer address).
pub struct SubmissionLimiter {
    last_accepted: DashMap<String, Instant>,
    min_interval: Duration,
}

impl SubmissionLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_accepted: DashMap::new(),
            min_interval,
        }
    }

    fn normalize(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Claims the slot for `key`. Returns the remaining wait when it is taken.
    pub fn try_reserve(&self, key: &str, now: Instant) -> Result<(), Duration> {
        match self.last_accepted.entry(Self::normalize(key)) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                Ok(())
            }
            Entry::Occupied(mut slot) => {
                let elapsed = now.saturating_duration_since(*slot.get());
                if elapsed < self.min_interval {
                    return Err(self.min_interval - elapsed);
                }
                slot.insert(now);
                Ok(())
            }
        }
    }

    /// Gives back a slot reserved at `reserved_at`, unless a later reservation replaced it.
    pub fn release(&self, key: &str, reserved_at: Instant) {
        self.last_accepted
            .remove_if(&Self::normalize(key), |_, at| *at == reserved_at);
    }

    pub fn cleanup_old_entries(&self, now: Instant) {
        let min = self.min_interval;
        self.last_accepted
            .retain(|_, at| now.saturating_duration_since(*at) < min);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_submission_is_allowed() {
        let limiter = SubmissionLimiter::new(Duration::from_secs(60));
        assert!(limiter.try_reserve("nia@client.test", Instant::now()).is_ok());
    }

    #[test]
    fn second_submission_within_interval_is_refused() {
        let limiter = SubmissionLimiter::new(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.try_reserve("nia@client.test", t0).is_ok());

        let wait = limiter
            .try_reserve("NIA@client.test ", t0 + Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(wait, Duration::from_secs(50));

        assert!(limiter
            .try_reserve("nia@client.test", t0 + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn addresses_are_independent() {
        let limiter = SubmissionLimiter::new(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.try_reserve("a@client.test", t0).is_ok());
        assert!(limiter.try_reserve("b@client.test", t0).is_ok());
    }

    #[test]
    fn release_frees_the_slot() {
        let limiter = SubmissionLimiter::new(Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.try_reserve("nia@client.test", t0).unwrap();
        limiter.release("nia@client.test", t0);
        assert!(limiter
            .try_reserve("nia@client.test", t0 + Duration::from_secs(1))
            .is_ok());
    }

    #[test]
    fn cleanup_drops_expired_entries() {
        let limiter = SubmissionLimiter::new(Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.try_reserve("nia@client.test", t0).unwrap();
        limiter.cleanup_old_entries(t0 + Duration::from_secs(61));
        assert_eq!(limiter.len(), 0);
    }
}
