//! Per-activation send budget
//!
//! Pure policy deciding whether one more diagnostic record may be sent.
//! The budget counts send attempts since activation, not confirmed
//! deliveries.

/// Decides whether a record may be sent given the count already sent.
///
/// A ceiling of 0 never allows a send; otherwise the comparison is strict,
/// so the ceiling is never exceeded.
pub fn may_send(sent_count: u32, max_per_activation: u32) -> bool {
    sent_count < max_per_activation
}

/// Fixed ceiling on records sent per activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimiter {
    max_per_activation: u32,
}

impl RateLimiter {
    pub const fn new(max_per_activation: u32) -> Self {
        Self { max_per_activation }
    }

    pub fn max_per_activation(&self) -> u32 {
        self.max_per_activation
    }

    /// Returns whether budget remains after `sent_count` sends.
    pub fn allows(&self, sent_count: u32) -> bool {
        may_send(sent_count, self.max_per_activation)
    }

    /// Takes one slot from the budget.
    ///
    /// Increments `sent_count` exactly once and returns `true` when budget
    /// remains; leaves it untouched and returns `false` otherwise. Callers
    /// sharing the counter across threads must hold a lock around this call.
    pub fn try_acquire(&self, sent_count: &mut u32) -> bool {
        if self.allows(*sent_count) {
            *sent_count += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ceiling_never_sends() {
        assert!(!may_send(0, 0));
        let limiter = RateLimiter::new(0);
        let mut sent = 0;
        assert!(!limiter.try_acquire(&mut sent));
        assert_eq!(sent, 0);
    }

    #[test]
    fn test_strict_comparison() {
        assert!(may_send(0, 1));
        assert!(!may_send(1, 1));
        assert!(may_send(6, 7));
        assert!(!may_send(7, 7));
        assert!(!may_send(8, 7));
    }

    #[test]
    fn test_try_acquire_stops_at_ceiling() {
        let limiter = RateLimiter::new(3);
        let mut sent = 0;
        let granted = (0..10).filter(|_| limiter.try_acquire(&mut sent)).count();
        assert_eq!(granted, 3);
        assert_eq!(sent, 3);
    }

    #[test]
    fn test_default_is_fully_capped() {
        assert!(!RateLimiter::default().allows(0));
    }
}
