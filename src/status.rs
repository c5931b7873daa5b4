//! Deploy status events and the channel that carries them.
//!
//! A deploy attempt reports its progress as an append-only stream of
//! typed events. Exactly one terminal event (`end` or `error`) is
//! emitted per attempt, and it is always the last event; the channel
//! enforces that guarantee by dropping anything published after a
//! terminal event.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// A single status event in a deploy attempt's lifecycle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    /// The application is being auto-created on first use.
    AppCreate {
        /// Application name as configured.
        name: String,
    },
    /// Application creation finished.
    AppEnd {
        /// Identifier of the created application.
        application_id: String,
    },
    /// Build creation is starting.
    BuildStart,
    /// Build creation finished.
    BuildEnd {
        /// Identifier of the created build.
        build_id: String,
    },
    /// The sync engine is scanning and hashing the staged directory.
    HashingStart,
    /// The directory scan finished.
    HashingEnd,
    /// Total number of files the sync engine will process.
    FileCount {
        /// File count.
        count: usize,
    },
    /// A file's content was already present remotely.
    FileFound {
        /// Files resolved so far.
        count: usize,
    },
    /// A file's hash is being written to the local cache.
    FileCacheStart,
    /// A file's hash was written to the local cache.
    FileCacheSuccess,
    /// Uploading is starting.
    UploadStart {
        /// Total files to resolve.
        count: usize,
    },
    /// One unit of upload progress.
    UploadProgress {
        /// Files resolved by this step.
        count: usize,
    },
    /// A file finished uploading.
    UploadSuccess,
    /// A file upload failed permanently.
    UploadFailure {
        /// Description of the failure.
        message: String,
    },
    /// Uploading finished.
    UploadEnd,
    /// A transient failure was retried by the sync engine.
    ///
    /// Relayed only; the pipeline state does not change.
    Retry {
        /// Description of the transient failure.
        message: String,
    },
    /// Build finalization is starting.
    FinalizeStart,
    /// Build finalization finished.
    FinalizeEnd,
    /// The release call is starting.
    ReleaseStart {
        /// Target environment.
        environment: String,
    },
    /// The release call finished.
    ReleaseEnd,
    /// Terminal success.
    End {
        /// URL the application is served from.
        url: String,
        /// Environment that was released.
        environment: String,
    },
    /// Terminal failure.
    Error {
        /// Human-readable failure message.
        message: String,
    },
    /// Free-form diagnostic output, never required for correctness.
    Verbose {
        /// Diagnostic message.
        message: String,
    },
}

impl StatusEvent {
    /// The canonical event name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AppCreate { .. } => "app:create",
            Self::AppEnd { .. } => "app:end",
            Self::BuildStart => "build:start",
            Self::BuildEnd { .. } => "build:end",
            Self::HashingStart => "hashing:start",
            Self::HashingEnd => "hashing:end",
            Self::FileCount { .. } => "file:count",
            Self::FileFound { .. } => "file:found",
            Self::FileCacheStart => "file:cachestart",
            Self::FileCacheSuccess => "file:cachesuccess",
            Self::UploadStart { .. } => "upload:start",
            Self::UploadProgress { .. } => "upload:progress",
            Self::UploadSuccess => "upload:success",
            Self::UploadFailure { .. } => "upload:failure",
            Self::UploadEnd => "upload:end",
            Self::Retry { .. } => "retry",
            Self::FinalizeStart => "finalize:start",
            Self::FinalizeEnd => "finalize:end",
            Self::ReleaseStart { .. } => "release:start",
            Self::ReleaseEnd => "release:end",
            Self::End { .. } => "end",
            Self::Error { .. } => "error",
            Self::Verbose { .. } => "verbose",
        }
    }

    /// Returns true for the two terminal events.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::End { .. } | Self::Error { .. })
    }
}

/// Publish side of a deploy attempt's status stream.
///
/// Events are buffered by the underlying channel, so a caller that
/// subscribes right after starting a deploy observes the stream from the
/// first event. Cloning shares the same stream and terminal guard.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    tx: mpsc::UnboundedSender<StatusEvent>,
    terminated: Arc<AtomicBool>,
}

impl StatusChannel {
    /// Creates a channel and its subscriber end.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                terminated: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    /// Publishes an event.
    ///
    /// Events published after a terminal event are dropped, and the
    /// first terminal event seals the stream.
    pub fn emit(&self, event: StatusEvent) {
        if event.is_terminal() {
            if self.terminated.swap(true, Ordering::SeqCst) {
                trace!("Dropping {} after terminal event", event.kind());
                return;
            }
        } else if self.terminated.load(Ordering::SeqCst) {
            trace!("Dropping {} after terminal event", event.kind());
            return;
        }

        // A dropped receiver is not an error; the deploy runs to its
        // terminal event regardless of whether anyone is listening.
        let _ = self.tx.send(event);
    }

    /// Publishes a diagnostic message.
    pub fn verbose(&self, message: impl Into<String>) {
        self.emit(StatusEvent::Verbose {
            message: message.into(),
        });
    }

    /// Returns true once a terminal event has been published.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_events_are_delivered_in_order() {
        let (channel, mut rx) = StatusChannel::new();
        channel.emit(StatusEvent::BuildStart);
        channel.emit(StatusEvent::BuildEnd {
            build_id: String::from("b-1"),
        });

        let events = drain(&mut rx);
        assert_eq!(events[0].kind(), "build:start");
        assert_eq!(events[1].kind(), "build:end");
    }

    #[test]
    fn test_exactly_one_terminal_event() {
        let (channel, mut rx) = StatusChannel::new();
        channel.emit(StatusEvent::Error {
            message: String::from("first"),
        });
        channel.emit(StatusEvent::Error {
            message: String::from("second"),
        });
        channel.emit(StatusEvent::End {
            url: String::from("http://demo.airlift.sh"),
            environment: String::from("production"),
        });

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            StatusEvent::Error {
                message: String::from("first")
            }
        );
    }

    #[test]
    fn test_no_events_after_terminal() {
        let (channel, mut rx) = StatusChannel::new();
        channel.emit(StatusEvent::End {
            url: String::from("http://demo.airlift.sh"),
            environment: String::from("production"),
        });
        channel.emit(StatusEvent::BuildStart);
        channel.verbose("late diagnostics");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
        assert!(channel.is_terminated());
    }

    #[test]
    fn test_events_buffer_until_subscriber_polls() {
        let (channel, mut rx) = StatusChannel::new();
        channel.emit(StatusEvent::BuildStart);

        // Subscriber polls later and still sees everything.
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = StatusEvent::End {
            url: String::from("http://demo.airlift.sh"),
            environment: String::from("production"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "end");
        assert_eq!(json["url"], "http://demo.airlift.sh");
    }

    #[test]
    fn test_emit_without_subscriber_does_not_panic() {
        let (channel, rx) = StatusChannel::new();
        drop(rx);
        channel.emit(StatusEvent::BuildStart);
    }
}
