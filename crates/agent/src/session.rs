//! Streaming sessions.
//!
//! The orchestrator task owns a [`SessionWriter`]; the client owns the
//! matching [`StreamSession`]. Cancelling is closing (or dropping) the
//! session: the writer observes it and the run stops without a terminal
//! event.

use crate::stream_event::{HotTakeResult, StreamEvent};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use uuid::Uuid;

/// Events buffered between the run and a slow client.
pub(crate) const STREAM_BUFFER: usize = 64;

/// Lifecycle of a streaming run. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Idle,
    Aggregating,
    Generating,
    Done,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// The client closed the session before the run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

/// Client half of a streaming run.
#[derive(Debug)]
pub struct StreamSession {
    id: Uuid,
    rx: mpsc::Receiver<StreamEvent>,
}

impl StreamSession {
    pub(crate) fn channel() -> (Self, SessionWriter) {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let session = Self {
            id: Uuid::new_v4(),
            rx,
        };
        (session, SessionWriter::new(tx))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once the run has ended.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Cancel the run. Already-buffered events can still be received, but
    /// the run emits nothing further and stores nothing in the cache.
    pub fn cancel(&mut self) {
        self.rx.close();
    }

    /// Drain the session to completion.
    pub async fn collect(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }

    /// Adapt into a `Stream` for transports; dropping it cancels the run.
    pub fn into_stream(self) -> ReceiverStream<StreamEvent> {
        ReceiverStream::new(self.rx)
    }
}

/// Producer half. Enforces forward-only state and a single terminal event.
pub(crate) struct SessionWriter {
    tx: mpsc::Sender<StreamEvent>,
    state: SessionState,
}

impl SessionWriter {
    fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            tx,
            state: SessionState::Idle,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next` if it lies ahead of the current state.
    pub(crate) fn advance(&mut self, next: SessionState) {
        if next > self.state && !self.state.is_terminal() {
            self.state = next;
        } else {
            warn!(from = ?self.state, to = ?next, "Ignoring backwards session transition");
        }
    }

    /// Resolves once the client has gone away.
    pub(crate) async fn closed(&self) {
        self.tx.closed().await
    }

    pub(crate) async fn send(&mut self, event: StreamEvent) -> Result<(), Cancelled> {
        if self.state.is_terminal() {
            warn!(event = event.event_type(), "Dropping event after terminal event");
            return Ok(());
        }
        self.tx.send(event).await.map_err(|_| Cancelled)
    }

    /// Emit `done`. Fails only if the client is already gone.
    pub(crate) async fn finish(&mut self, result: HotTakeResult) -> Result<(), Cancelled> {
        self.send(StreamEvent::Done { result }).await?;
        self.state = SessionState::Done;
        Ok(())
    }

    /// Emit the single `error` event.
    pub(crate) async fn fail(&mut self, detail: String) -> Result<(), Cancelled> {
        self.send(StreamEvent::Error { detail }).await?;
        self.state = SessionState::Failed;
        Ok(())
    }
}
