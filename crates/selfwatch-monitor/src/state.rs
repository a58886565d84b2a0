//! Monitoring lifecycle state
//!
//! [`MonitoringState`] is the single shared record a [`crate::Monitor`]
//! guards with a mutex: the active transport handle, the debug flag, and
//! the send budget for the current activation.

use std::sync::Arc;

use selfwatch_core::ports::ITransport;

use crate::rate_limit::RateLimiter;

/// Result of asking the state for permission to send one record
pub enum Reservation {
    /// A slot was taken; send through this transport
    Granted(Arc<dyn ITransport>),
    /// Monitoring is not active
    Inactive,
    /// The budget for this activation is exhausted
    RateLimited,
}

/// Lifecycle state of internal monitoring
///
/// Invariants: `transport` is `None` whenever monitoring is inactive, and
/// `sent_count` never exceeds the limiter's ceiling.
pub struct MonitoringState {
    transport: Option<Arc<dyn ITransport>>,
    debug_enabled: bool,
    sent_count: u32,
    limiter: RateLimiter,
}

impl MonitoringState {
    /// Creates an inactive state with debug mode off.
    pub const fn new() -> Self {
        Self {
            transport: None,
            debug_enabled: false,
            sent_count: 0,
            limiter: RateLimiter::new(0),
        }
    }

    /// Installs `transport` and a fresh budget of `max_per_activation`.
    ///
    /// The debug flag is kept. Returns the transport this one replaces so
    /// the caller can drop it outside any lock.
    pub fn activate(
        &mut self,
        transport: Arc<dyn ITransport>,
        max_per_activation: u32,
    ) -> Option<Arc<dyn ITransport>> {
        self.limiter = RateLimiter::new(max_per_activation);
        self.sent_count = 0;
        self.transport.replace(transport)
    }

    /// Clears the transport handle. A no-op when already inactive.
    pub fn deactivate(&mut self) -> Option<Arc<dyn ITransport>> {
        self.transport.take()
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug_enabled = enabled;
    }

    pub fn is_active(&self) -> bool {
        self.transport.is_some()
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn sent_count(&self) -> u32 {
        self.sent_count
    }

    pub fn max_per_activation(&self) -> u32 {
        self.limiter.max_per_activation()
    }

    /// Checks activation and budget, taking one slot when both allow.
    pub fn reserve(&mut self) -> Reservation {
        let Some(transport) = &self.transport else {
            return Reservation::Inactive;
        };
        if self.limiter.try_acquire(&mut self.sent_count) {
            Reservation::Granted(Arc::clone(transport))
        } else {
            Reservation::RateLimited
        }
    }
}

impl Default for MonitoringState {
    fn default() -> Self {
        Self::new()
    }
}
