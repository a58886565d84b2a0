//! Diagnostic records
//!
//! An [`ErrorRecord`] is the structured payload describing one intercepted
//! internal fault. It is built on the fault-handling path and handed to a
//! transport immediately; nothing keeps a reference to it afterwards.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::fault::FaultKind;

/// Record fields that ambient context may not overwrite.
const RESERVED_FIELDS: &[&str] = &[
    "id",
    "date",
    "entry_type",
    "message",
    "severity",
    "error",
    "trace",
];

/// Category tag of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Generated by the SDK about itself, not by the application
    Internal,
}

/// Log level of a record. Internal faults are always reported as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
}

/// One normalized stack frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let function = self.function.as_deref().unwrap_or("<unknown>");
        write!(f, "  at {}", function)?;
        if let Some(file) = &self.file {
            write!(f, " ({}", file)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
                if let Some(column) = self.column {
                    write!(f, ":{}", column)?;
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A normalized trace: message plus frames, innermost first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTrace {
    pub message: String,
    pub frames: Vec<Frame>,
}

impl StackTrace {
    /// Creates a trace with no frames.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
        }
    }

    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    /// Renders the frames one per line.
    pub fn format_frames(&self) -> String {
        self.frames
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fault summary folded into a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub kind: FaultKind,
    pub stack: String,
}

/// A structured diagnostic record for one internal fault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    /// Milliseconds since the Unix epoch
    pub date: i64,
    pub entry_type: EntryType,
    pub message: String,
    pub severity: Severity,
    pub error: ErrorDetails,
    pub trace: Vec<Frame>,
    /// Ambient fields, serialized at the top level of the record
    #[serde(flatten)]
    pub context: Map<String, Value>,
}

impl ErrorRecord {
    /// Creates an internal, error-level record from a trace and ambient context.
    ///
    /// Context keys that collide with record fields are discarded.
    pub fn new(kind: FaultKind, trace: StackTrace, mut context: Map<String, Value>) -> Self {
        context.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
        let stack = trace.format_frames();
        Self {
            id: Uuid::new_v4().to_string(),
            date: Utc::now().timestamp_millis(),
            entry_type: EntryType::Internal,
            message: trace.message,
            severity: Severity::Error,
            error: ErrorDetails { kind, stack },
            trace: trace.frames,
            context,
        }
    }

    /// Serializes the record as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn frame(function: &str, file: &str, line: u32) -> Frame {
        Frame {
            function: Some(function.into()),
            file: Some(file.into()),
            line: Some(line),
            column: None,
        }
    }

    #[test]
    fn test_record_creation() {
        let frames = vec![frame("sdk::flush", "src/flush.rs", 12)];
        let trace = StackTrace::new("boom").with_frames(frames);
        let mut context = Map::new();
        context.insert("service".into(), json!("checkout"));

        let record = ErrorRecord::new(FaultKind::Panic, trace, context);
        assert!(!record.id.is_empty());
        assert!(record.date > 0);
        assert_eq!(record.entry_type, EntryType::Internal);
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.message, "boom");
        assert_eq!(record.trace.len(), 1);
        assert_eq!(record.error.stack, "  at sdk::flush (src/flush.rs:12)");
        assert_eq!(record.context["service"], "checkout");
    }

    #[test]
    fn test_context_is_flattened_in_json() {
        let mut context = Map::new();
        context.insert("thread".into(), json!("worker-1"));
        let record = ErrorRecord::new(FaultKind::Error, StackTrace::new("bad state"), context);

        let value: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["entry_type"], "internal");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["message"], "bad state");
        assert_eq!(value["error"]["kind"], "error");
        assert_eq!(value["thread"], "worker-1");
        assert!(value.get("context").is_none());
    }

    #[test]
    fn test_context_cannot_override_record_fields() {
        let mut context = Map::new();
        context.insert("message".into(), json!("spoofed"));
        context.insert("severity".into(), json!("debug"));
        context.insert("version".into(), json!("1.2.3"));

        let record = ErrorRecord::new(FaultKind::Panic, StackTrace::new("real"), context);
        assert_eq!(record.message, "real");
        assert_eq!(record.context.len(), 1);
        assert_eq!(record.context["version"], "1.2.3");
    }

    #[test]
    fn test_frame_display_variants() {
        assert_eq!(Frame::default().to_string(), "  at <unknown>");
        let f = Frame {
            function: Some("main".into()),
            file: Some("src/main.rs".into()),
            line: Some(4),
            column: Some(9),
        };
        assert_eq!(f.to_string(), "  at main (src/main.rs:4:9)");
    }

    #[test]
    fn test_record_deserializes_with_context() {
        let json = r#"{
            "id": "abc",
            "date": 123456,
            "entry_type": "internal",
            "message": "message",
            "severity": "error",
            "error": {"kind": "panic", "stack": ""},
            "trace": [],
            "url": "app://main"
        }"#;
        let record: ErrorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.date, 123456);
        assert_eq!(record.context["url"], "app://main");
    }
}
