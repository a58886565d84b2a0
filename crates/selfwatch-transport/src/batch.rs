//! Record batching
//!
//! [`Batch`] is the default [`ITransport`]. `add` serializes the record and
//! pushes it onto an unbounded channel, so the fault-handling path never
//! waits on I/O. A background tokio task owns the buffer and flushes it
//! through an [`IRequestSender`]:
//!
//! - when `max_batch_size` records are buffered,
//! - before a record that would push the body past `batch_bytes_limit`,
//! - on every `flush_interval` tick,
//! - when the `Batch` is dropped (the channel closes).
//!
//! The body is the buffered records joined by newlines.

use std::time::Duration;

use selfwatch_core::{config::TransportSettings, domain::ErrorRecord, ports::ITransport};
use tokio::{
    runtime::Handle,
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    error::TransportError,
    http::{HttpRequest, IRequestSender},
};

/// Transport that groups records and delivers them from a background task
pub struct Batch {
    sender: mpsc::UnboundedSender<String>,
    max_record_size: usize,
}

impl Batch {
    /// Starts a batch worker on the current tokio runtime.
    ///
    /// Returns [`TransportError::NoRuntime`] when called outside a runtime.
    pub fn spawn<S: IRequestSender>(
        request: S,
        settings: &TransportSettings,
    ) -> Result<Self, TransportError> {
        let handle = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = BatchWorker {
            request,
            receiver,
            buffer: BatchBuffer::new(settings.max_batch_size, settings.batch_bytes_limit),
            flush_interval: settings.flush_interval,
        };
        handle.spawn(worker.run());

        debug!(endpoint = %settings.endpoint, "Internal monitoring batch started");

        Ok(Self {
            sender,
            max_record_size: settings.max_record_size,
        })
    }

    /// Starts a batch worker that posts to `settings.endpoint` over HTTP.
    pub fn http(settings: &TransportSettings) -> Result<Self, TransportError> {
        let request = HttpRequest::new(settings.endpoint.clone(), settings.batch_bytes_limit)?;
        Self::spawn(request, settings)
    }

    fn enqueue(&self, record: &ErrorRecord) -> Result<(), TransportError> {
        let line = record.to_json()?;
        if line.len() > self.max_record_size {
            warn!(
                size = line.len(),
                limit = self.max_record_size,
                "Dropping internal monitoring record over size limit"
            );
            return Err(TransportError::RecordTooLarge {
                size: line.len(),
                limit: self.max_record_size,
            });
        }
        self.sender.send(line).map_err(|_| TransportError::Closed)
    }
}

impl ITransport for Batch {
    fn add(&self, record: ErrorRecord) -> anyhow::Result<()> {
        self.enqueue(&record)?;
        Ok(())
    }
}

/// Buffered record lines plus their running body size
struct BatchBuffer {
    lines: Vec<String>,
    bytes: usize,
    max_batch_size: usize,
    bytes_limit: usize,
}

impl BatchBuffer {
    fn new(max_batch_size: usize, bytes_limit: usize) -> Self {
        Self {
            lines: Vec::new(),
            bytes: 0,
            max_batch_size,
            bytes_limit,
        }
    }

    /// Body size after appending a line of `len` bytes (newline separator included).
    fn size_with(&self, len: usize) -> usize {
        if self.lines.is_empty() {
            len
        } else {
            self.bytes + 1 + len
        }
    }

    fn would_overflow(&self, len: usize) -> bool {
        !self.lines.is_empty() && self.size_with(len) > self.bytes_limit
    }

    fn push(&mut self, line: String) {
        self.bytes = self.size_with(line.len());
        self.lines.push(line);
    }

    fn is_full(&self) -> bool {
        self.lines.len() >= self.max_batch_size || self.bytes >= self.bytes_limit
    }

    fn take_body(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        let body = self.lines.join("\n");
        self.lines.clear();
        self.bytes = 0;
        Some(body)
    }
}

struct BatchWorker<S> {
    request: S,
    receiver: mpsc::UnboundedReceiver<String>,
    buffer: BatchBuffer,
    flush_interval: Duration,
}

impl<S: IRequestSender> BatchWorker<S> {
    async fn run(self) {
        let BatchWorker {
            request,
            mut receiver,
            mut buffer,
            flush_interval,
        } = self;

        let mut ticker = interval(flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                line = receiver.recv() => match line {
                    Some(line) => {
                        if buffer.would_overflow(line.len()) {
                            flush(&request, &mut buffer).await;
                        }
                        buffer.push(line);
                        if buffer.is_full() {
                            flush(&request, &mut buffer).await;
                        }
                    }
                    None => {
                        flush(&request, &mut buffer).await;
                        break;
                    }
                },
                _ = ticker.tick() => flush(&request, &mut buffer).await,
            }
        }

        debug!("Internal monitoring batch stopped");
    }
}

async fn flush<S: IRequestSender>(request: &S, buffer: &mut BatchBuffer) {
    let Some(body) = buffer.take_body() else {
        return;
    };
    if let Err(e) = request.send(body).await {
        warn!(error = %e, "Failed to send internal monitoring batch");
    }
}
