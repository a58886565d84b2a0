//! Default stack trace computation
//!
//! Parses the backtrace captured at the panic site into frames, dropping
//! the leading frames that belong to the panic machinery itself.

use selfwatch_core::{
    domain::{Fault, Frame, StackTrace},
    ports::ITraceComputer,
};

/// Default cap on frames kept per trace
const DEFAULT_MAX_FRAMES: usize = 50;

/// Function-name prefixes of frames that precede the faulting code.
const MACHINERY_PREFIXES: &[&str] = &[
    "std::backtrace",
    "std::panicking",
    "std::panic::",
    "std::sys",
    "core::panicking",
    "core::panic",
    "core::result::unwrap_failed",
    "core::option::expect_failed",
    "rust_begin_unwind",
    "__rust",
    "<alloc::boxed::Box<F,A> as core::ops::function::Fn",
    "selfwatch_monitor::panic_capture",
];

/// Builds a [`StackTrace`] from a fault's captured backtrace or location
#[derive(Debug, Clone)]
pub struct BacktraceComputer {
    max_frames: usize,
}

impl BacktraceComputer {
    pub fn new() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }
}

impl Default for BacktraceComputer {
    fn default() -> Self {
        Self::new()
    }
}

impl ITraceComputer for BacktraceComputer {
    fn compute(&self, fault: &Fault) -> anyhow::Result<StackTrace> {
        let mut frames = fault
            .backtrace()
            .map(|bt| strip_machinery(parse_backtrace(bt)))
            .unwrap_or_default();

        if frames.is_empty() {
            if let Some(location) = fault.location() {
                frames.push(parse_location(location));
            }
        }
        frames.truncate(self.max_frames);

        let message = if fault.chain().is_empty() {
            fault.message().to_string()
        } else {
            format!("{}: {}", fault.message(), fault.chain().join(": "))
        };

        Ok(StackTrace::new(message).with_frames(frames))
    }
}

/// Parses the `Display` output of [`std::backtrace::Backtrace`].
///
/// Frame lines look like `  3: crate::module::function`, optionally
/// followed by `      at ./src/file.rs:12:5`.
pub fn parse_backtrace(backtrace: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in backtrace.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let parsed = parse_location(location);
                frame.file = parsed.file;
                frame.line = parsed.line;
                frame.column = parsed.column;
            }
            continue;
        }

        let Some((index, function)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let function = function.trim();
        frames.push(Frame {
            function: (function != "<unknown>").then(|| function.to_string()),
            ..Frame::default()
        });
    }

    frames
}

/// Parses `file:line:column` (or `file:line`) into a frame without a function.
pub fn parse_location(location: &str) -> Frame {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let rest = parts.next();

    match (rest, middle, last) {
        (Some(file), Some(line), Some(column)) => match (line.parse(), column.parse()) {
            (Ok(line), Ok(column)) => Frame {
                file: Some(file.to_string()),
                line: Some(line),
                column: Some(column),
                ..Frame::default()
            },
            _ => file_and_line(location),
        },
        _ => file_and_line(location),
    }
}

fn file_and_line(location: &str) -> Frame {
    match location.rsplit_once(':') {
        Some((file, line)) if line.parse::<u32>().is_ok() => Frame {
            file: Some(file.to_string()),
            line: line.parse().ok(),
            ..Frame::default()
        },
        _ => Frame {
            file: Some(location.to_string()),
            ..Frame::default()
        },
    }
}

/// Drops leading frames from the panic/backtrace machinery.
fn strip_machinery(frames: Vec<Frame>) -> Vec<Frame> {
    let first_user = frames.iter().position(|frame| {
        let function = frame.function.as_deref().unwrap_or("");
        !MACHINERY_PREFIXES.iter().any(|p| function.starts_with(p))
    });
    match first_user {
        Some(index) => frames.into_iter().skip(index).collect(),
        None => frames,
    }
}
