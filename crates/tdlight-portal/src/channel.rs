//! Progress channels and the per-job registry that owns them.

use std::collections::HashMap;

use tdlight_client::EventStream;
use tdlight_common::{JobKind, ProgressEvent, Result};
use tracing::debug;

/// An open server-push subscription for one job.
///
/// Closing drops the HTTP response and with it the connection. Closing is
/// idempotent; only the first call reports that something was closed.
#[derive(Debug)]
pub struct ProgressChannel {
    kind: JobKind,
    task_id: Option<String>,
    stream: Option<EventStream>,
    awaiting_snapshot: bool,
}

impl ProgressChannel {
    pub fn new(kind: JobKind, stream: EventStream) -> Self {
        Self { kind, task_id: None, stream: Some(stream), awaiting_snapshot: true }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.stream.as_ref().is_some_and(EventStream::is_open)
    }

    /// Whether the next event is the first on this connection. The backend
    /// opens every stream with a snapshot of its last known job state,
    /// which may belong to an earlier run.
    pub fn take_snapshot_flag(&mut self) -> bool {
        std::mem::take(&mut self.awaiting_snapshot)
    }

    /// Next event, or `None` once the channel is closed or exhausted.
    pub async fn next_event(&mut self) -> Option<Result<ProgressEvent>> {
        self.stream.as_mut()?.next_event().await
    }

    pub fn close(&mut self) -> bool {
        match self.stream.take() {
            Some(_) => {
                debug!(kind = %self.kind, task_id = ?self.task_id, "Progress channel closed");
                true
            }
            None => false,
        }
    }
}

impl Drop for ProgressChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// At most one channel per job kind.
#[derive(Debug, Default)]
pub struct ChannelSet {
    slots: HashMap<JobKind, ProgressChannel>,
    closures: HashMap<JobKind, u64>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `channel`, closing whatever was open for its kind.
    pub fn replace(&mut self, channel: ProgressChannel) {
        let kind = channel.kind();
        self.close(kind);
        self.slots.insert(kind, channel);
    }

    /// Close the channel for `kind`. Returns `false` if none was open.
    pub fn close(&mut self, kind: JobKind) -> bool {
        let Some(mut channel) = self.slots.remove(&kind) else {
            return false;
        };
        let closed = channel.close();
        if closed {
            *self.closures.entry(kind).or_default() += 1;
        }
        closed
    }

    pub fn close_all(&mut self) {
        for kind in JobKind::ALL {
            self.close(kind);
        }
    }

    /// Whether a channel is registered for `kind`.
    pub fn is_open(&self, kind: JobKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn get_mut(&mut self, kind: JobKind) -> Option<&mut ProgressChannel> {
        self.slots.get_mut(&kind)
    }

    /// How many times a channel of `kind` has been closed by this set.
    pub fn closures(&self, kind: JobKind) -> u64 {
        self.closures.get(&kind).copied().unwrap_or_default()
    }
}
