use chrono::{DateTime, Duration, Utc};

use crate::Clock;

/// Minimum spacing between accepted quiz starts.
///
/// The window is measured from the last *accepted* start; rejected attempts do
/// not push it back.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_accepted: Option<DateTime<Utc>>,
}

impl RequestThrottle {
    #[must_use]
    pub fn new(min_interval: std::time::Duration) -> Self {
        Self {
            min_interval: Duration::from_std(min_interval).unwrap_or(Duration::MAX),
            last_accepted: None,
        }
    }

    fn remaining(&self, clock: &Clock) -> Duration {
        match self.last_accepted {
            Some(at) => (self.min_interval - clock.elapsed_since(at)).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    /// Accept a start now, or report the remaining cool-down in whole seconds.
    ///
    /// # Errors
    ///
    /// Returns the remaining seconds (rounded up) when inside the window.
    pub fn try_acquire(&mut self, clock: &Clock) -> Result<(), u64> {
        let remaining = self.remaining(clock);
        if remaining > Duration::zero() {
            return Err(ceil_secs(remaining));
        }
        self.last_accepted = Some(clock.now());
        Ok(())
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let millis = d.num_milliseconds().max(0);
    u64::try_from((millis + 999) / 1000).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;

    #[test]
    fn first_start_is_always_allowed() {
        let clock = fixed_clock();
        let mut throttle = RequestThrottle::new(std::time::Duration::from_secs(5));
        assert_eq!(throttle.try_acquire(&clock), Ok(()));
    }

    #[test]
    fn second_start_inside_window_is_rejected() {
        let mut clock = fixed_clock();
        let mut throttle = RequestThrottle::new(std::time::Duration::from_secs(5));
        throttle.try_acquire(&clock).unwrap();

        clock.advance(Duration::milliseconds(1_500));
        assert_eq!(throttle.try_acquire(&clock), Err(4));

        clock.advance(Duration::milliseconds(3_500));
        assert_eq!(throttle.try_acquire(&clock), Ok(()));
    }

    #[test]
    fn rejected_attempts_do_not_reset_the_window() {
        let mut clock = fixed_clock();
        let mut throttle = RequestThrottle::new(std::time::Duration::from_secs(5));
        throttle.try_acquire(&clock).unwrap();

        for _ in 0..4 {
            clock.advance(Duration::seconds(1));
            assert!(throttle.try_acquire(&clock).is_err());
        }
        clock.advance(Duration::seconds(1));
        assert_eq!(throttle.try_acquire(&clock), Ok(()));
    }
}
