//! Panic capture for guarded regions
//!
//! Installs a process-wide panic hook, chained with the existing one. While
//! the current thread is inside a guarded region, the hook records the
//! panic's message, location and backtrace in a thread-local slot instead
//! of printing them; the guard picks that up after `catch_unwind` returns.
//! Panics outside guarded regions go to the previous hook unchanged.

use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    panic,
    sync::Once,
};

use selfwatch_core::domain::{fault::panic_message, Fault};

/// Panic details recorded by the hook
#[derive(Debug, Clone)]
pub struct CapturedPanic {
    pub message: String,
    pub location: Option<String>,
    pub backtrace: String,
}

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<CapturedPanic>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Installs the capturing panic hook once per process.
///
/// Chains with the existing panic hook so default behavior (stderr output)
/// is preserved for panics outside guarded regions. The hook cannot be
/// replaced from a thread that is unwinding; such calls are skipped and a
/// later call installs it.
pub fn install_panic_capture() {
    if std::thread::panicking() {
        return;
    }
    INSTALL.call_once(|| {
        let previous_hook = panic::take_hook();

        panic::set_hook(Box::new(move |panic_info| {
            if !in_guarded_region() {
                previous_hook(panic_info);
                return;
            }

            let location = panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

            let captured = CapturedPanic {
                message: panic_message(panic_info.payload()),
                location,
                backtrace: Backtrace::force_capture().to_string(),
            };

            let _ = LAST_PANIC.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(captured);
                }
            });
        }));
    });
}

/// Whether the current thread is running inside a guarded region.
pub fn in_guarded_region() -> bool {
    GUARD_DEPTH.try_with(|depth| depth.get() > 0).unwrap_or(false)
}

/// Marks the current thread as guarded until dropped. Scopes nest.
pub(crate) struct GuardScope {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl GuardScope {
    pub(crate) fn enter() -> Self {
        let _ = GUARD_DEPTH.try_with(|depth| depth.set(depth.get() + 1));
        Self {
            _not_send: std::marker::PhantomData,
        }
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        let _ = GUARD_DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Takes the most recent panic captured on this thread.
pub fn take_captured() -> Option<CapturedPanic> {
    LAST_PANIC
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()))
        .ok()
        .flatten()
}

/// Turns a `catch_unwind` payload into a [`Fault`], enriched with whatever
/// the hook captured for it.
pub(crate) fn fault_from_panic(payload: Box<dyn Any + Send>) -> Fault {
    let mut fault = Fault::from_panic_payload(payload.as_ref());
    // Payload destructors may panic.
    let _ = panic::catch_unwind(panic::AssertUnwindSafe(move || drop(payload)));

    if let Some(captured) = take_captured() {
        if captured.message == fault.message() {
            if let Some(location) = captured.location {
                fault = fault.with_location(location);
            }
            fault = fault.with_backtrace(captured.backtrace);
        }
    }
    fault
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_nest() {
        assert!(!in_guarded_region());
        {
            let _outer = GuardScope::enter();
            assert!(in_guarded_region());
            {
                let _inner = GuardScope::enter();
                assert!(in_guarded_region());
            }
            assert!(in_guarded_region());
        }
        assert!(!in_guarded_region());
    }

    #[test]
    fn test_guarded_panic_is_captured() {
        install_panic_capture();

        let result = {
            let _scope = GuardScope::enter();
            panic::catch_unwind(|| panic!("captured boom"))
        };
        let payload = result.unwrap_err();
        let fault = fault_from_panic(payload);

        assert_eq!(fault.message(), "captured boom");
        let location = fault.location().unwrap_or_default();
        assert!(location.contains("panic_capture.rs"));
        assert!(fault.backtrace().is_some());
        assert!(take_captured().is_none());
    }

    #[test]
    fn test_payload_without_capture_keeps_message() {
        let payload: Box<dyn Any + Send> = Box::new("no hook ran");
        let fault = fault_from_panic(payload);
        assert_eq!(fault.message(), "no hook ran");
        assert!(fault.location().is_none());
    }
}
