//! Progress reporting for scrape runs.
//!
//! A run emits a sequence of human-readable status lines followed by exactly
//! one terminal event. The orchestrator only sees [`ProgressReporter`];
//! frontends pick an adapter:
//!
//! - [`CallbackReporter`] calls a closure in-line (CLI).
//! - [`ChannelReporter`] forwards events over an mpsc channel, typically to
//!   an HTTP event stream framed with [`ProgressEvent::to_sse_frame`].
//! - [`NullReporter`] drops everything (background runs that only log).

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use ycjobs_core::CompanyScrapeResult;

/// Final outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub success: bool,
    pub companies_scraped: usize,
    pub jobs_found: usize,
    /// The run stopped early at a company boundary.
    pub cancelled: bool,
    pub output_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_file: Option<PathBuf>,
    pub results: Vec<CompanyScrapeResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A status line.
    Message(String),
    /// Terminal: the run finished.
    Complete(RunSummary),
    /// Terminal: the run aborted.
    Error(String),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Message(_))
    }

    /// One server-sent-events frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> String {
        // Serializing plain strings and paths cannot fail.
        let json = serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"));
        format!("data: {json}\n\n")
    }
}

/// Wire shape: `{message}` for status lines, `{type: "complete", ...summary}`
/// and `{type: "error", message}` for the terminal events.
impl Serialize for ProgressEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Line<'a> {
            message: &'a str,
        }

        #[derive(Serialize)]
        #[serde(tag = "type", rename_all = "lowercase")]
        enum Terminal<'a> {
            Complete(&'a RunSummary),
            Error { message: &'a str },
        }

        match self {
            Self::Message(message) => Line { message }.serialize(serializer),
            Self::Complete(summary) => Terminal::Complete(summary).serialize(serializer),
            Self::Error(message) => Terminal::Error { message }.serialize(serializer),
        }
    }
}

/// Receives run progress. Implementations must not block for long; they are
/// called from inside the run.
pub trait ProgressReporter: Send {
    fn report(&mut self, event: ProgressEvent);
}

/// Discards every event.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&mut self, _event: ProgressEvent) {}
}

/// Calls a closure for each event.
pub struct CallbackReporter<F> {
    callback: F,
}

impl<F> CallbackReporter<F>
where
    F: FnMut(&ProgressEvent) + Send,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for CallbackReporter<F>
where
    F: FnMut(&ProgressEvent) + Send,
{
    fn report(&mut self, event: ProgressEvent) {
        (self.callback)(&event);
    }
}

/// Sends each event down an unbounded channel.
///
/// When the receiving side is gone the events are dropped and, if a token
/// was attached with [`cancel_on_close`](Self::cancel_on_close), the run is
/// asked to stop.
pub struct ChannelReporter {
    tx: UnboundedSender<ProgressEvent>,
    cancel: Option<CancellationToken>,
}

impl ChannelReporter {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx, cancel: None }
    }

    pub fn cancel_on_close(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&mut self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            if let Some(token) = &self.cancel {
                if !token.is_cancelled() {
                    debug!("progress receiver closed, cancelling run");
                    token.cancel();
                }
            }
        }
    }
}
