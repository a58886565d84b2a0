//! Integration test: guards used from `Drop` while the host thread unwinds
//!
//! Runs in its own process so the panic hook has not been installed by any
//! other test before the host panic starts.

use std::sync::atomic::{AtomicU32, Ordering};

use selfwatch_monitor::Monitor;

static CLEANUP_RESULT: AtomicU32 = AtomicU32::new(0);

/// Host cleanup that calls into guarded SDK code
struct Cleanup;

impl Drop for Cleanup {
    fn drop(&mut self) {
        let value = Monitor::new().run(|| 1).unwrap_or(0);
        CLEANUP_RESULT.store(value, Ordering::SeqCst);
    }
}

#[test]
fn test_guard_runs_in_drop_during_unwind() {
    let result = std::panic::catch_unwind(|| {
        let _cleanup = Cleanup;
        panic!("host panic");
    });

    assert!(result.is_err());
    assert_eq!(CLEANUP_RESULT.load(Ordering::SeqCst), 1);

    // The hook is installed once the thread is no longer unwinding.
    let later = Monitor::new().run(|| -> u32 { panic!("later fault") });
    assert_eq!(later, None);
}
