//! Intercepted faults
//!
//! A fault is whatever abnormal outcome a guard intercepted: a panic
//! unwinding out of the wrapped operation, or an `Err` it returned.

use std::any::Any;

use serde::{Deserialize, Serialize};

/// How a fault was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The operation panicked
    Panic,
    /// The operation returned an error
    Error,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FaultKind::Panic => "panic",
            FaultKind::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// A fault intercepted by a guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    kind: FaultKind,
    message: String,
    /// `file:line:column` where a panic was raised
    location: Option<String>,
    /// Rendered backtrace captured at the panic site
    backtrace: Option<String>,
    /// Source chain of an error, outermost cause first (excludes `message`)
    chain: Vec<String>,
}

impl Fault {
    /// Creates a panic fault with the given message.
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Panic,
            message: message.into(),
            location: None,
            backtrace: None,
            chain: Vec::new(),
        }
    }

    /// Creates an error fault with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Error,
            ..Self::panic(message)
        }
    }

    /// Creates a panic fault from a `catch_unwind` payload.
    pub fn from_panic_payload(payload: &(dyn Any + Send)) -> Self {
        Self::panic(panic_message(payload))
    }

    /// Creates an error fault from any error, walking its `source()` chain.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self::error(err.to_string()).with_chain(chain)
    }

    /// Creates an error fault from an `anyhow::Error`, keeping its context chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let chain = err.chain().skip(1).map(ToString::to_string).collect();
        Self::error(err.to_string()).with_chain(chain)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }

    pub fn with_chain(mut self, chain: Vec<String>) -> Self {
        self.chain = chain;
        self
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref()
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        for cause in &self.chain {
            write!(f, "\ncaused by: {}", cause)?;
        }
        Ok(())
    }
}

/// Extracts the message of a panic payload (`&str` or `String`).
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "batch flush failed")
        }
    }

    impl std::fmt::Display for Inner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "connection reset")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    impl std::error::Error for Inner {}

    #[test]
    fn test_panic_payload_str() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let fault = Fault::from_panic_payload(payload.as_ref());
        assert_eq!(fault.kind(), FaultKind::Panic);
        assert_eq!(fault.message(), "boom");
    }

    #[test]
    fn test_panic_payload_string() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("index out of bounds"));
        let fault = Fault::from_panic_payload(payload.as_ref());
        assert_eq!(fault.message(), "index out of bounds");
    }

    #[test]
    fn test_panic_payload_unknown() {
        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        let fault = Fault::from_panic_payload(payload.as_ref());
        assert_eq!(fault.message(), "Unknown panic");
    }

    #[test]
    fn test_from_error_walks_source_chain() {
        let fault = Fault::from_error(&Outer(Inner));
        assert_eq!(fault.kind(), FaultKind::Error);
        assert_eq!(fault.message(), "batch flush failed");
        assert_eq!(fault.chain(), ["connection reset".to_string()]);
    }

    #[test]
    fn test_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("disk full").context("writing batch");
        let fault = Fault::from_anyhow(&err);
        assert_eq!(fault.message(), "writing batch");
        assert_eq!(fault.chain(), ["disk full".to_string()]);
    }

    #[test]
    fn test_display_includes_location_and_chain() {
        let fault = Fault::panic("boom")
            .with_location("src/lib.rs:10:5")
            .with_chain(vec!["root cause".into()]);
        assert_eq!(
            fault.to_string(),
            "panic: boom at src/lib.rs:10:5\ncaused by: root cause"
        );
    }
}
