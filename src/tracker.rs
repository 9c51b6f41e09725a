//! Cursor tracking and checkpoint decisions for incremental streams.

use std::num::NonZeroU64;

use sync_core::{CursorValue, State, StreamState};

/// Tracks the highest emitted cursor of the stream being read and decides
/// when a STATE snapshot may be emitted.
///
/// Snapshots are taken at stream completion and, with a checkpoint
/// interval, after every N records. An interval checkpoint is deferred
/// until the next record whose cursor is strictly greater than the current
/// maximum, so rows sharing a cursor value are never split across a
/// checkpoint.
#[derive(Debug)]
pub struct StateTracker {
    state: State,
    checkpoint_interval: Option<NonZeroU64>,
    active: Option<ActiveStream>,
}

#[derive(Debug)]
struct ActiveStream {
    stream: String,
    cursor_field: String,
    /// Entry as of the last snapshot handed out, restored on abort
    committed: Option<StreamState>,
    since_checkpoint: u64,
    checkpoint_due: bool,
}

impl StateTracker {
    pub fn new(state: State, checkpoint_interval: Option<NonZeroU64>) -> Self {
        Self {
            state,
            checkpoint_interval,
            active: None,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }

    /// Start tracking an incremental stream read after `resume_from`.
    ///
    /// Without a resume point the stream is read from the beginning, so any
    /// entry it has is dropped; it is restored if the stream fails before
    /// a snapshot is handed out.
    pub fn begin(
        &mut self,
        stream: &str,
        cursor_field: &str,
        resume_from: Option<&CursorValue>,
    ) {
        let committed = self.state.get(stream).cloned();
        self.state.remove(stream);
        if let Some(cursor) = resume_from {
            self.state.advance(stream, cursor_field, cursor.clone());
        }
        self.active = Some(ActiveStream {
            stream: stream.to_string(),
            cursor_field: cursor_field.to_string(),
            committed,
            since_checkpoint: 0,
            checkpoint_due: false,
        });
    }

    /// Record the cursor of the next row, before that row is emitted.
    ///
    /// Returns a snapshot to emit ahead of the row when an interval
    /// checkpoint is due and the row starts a new cursor value.
    pub fn observe(&mut self, cursor: Option<&CursorValue>) -> Option<State> {
        let active = self.active.as_mut()?;
        let cursor = cursor?;

        let mut snapshot = None;
        if active.checkpoint_due {
            let current = self.state.cursor_for(&active.stream, &active.cursor_field);
            if current.is_some_and(|current| cursor.is_after(current)) {
                snapshot = Some(self.state.clone());
                active.committed = self.state.get(&active.stream).cloned();
                active.since_checkpoint = 0;
                active.checkpoint_due = false;
            }
        }

        self.state
            .advance(&active.stream, &active.cursor_field, cursor.clone());
        active.since_checkpoint += 1;
        if let Some(interval) = self.checkpoint_interval {
            if active.since_checkpoint >= interval.get() {
                active.checkpoint_due = true;
            }
        }

        snapshot
    }

    /// The stream finished; returns the final snapshot when a cursor is known.
    pub fn finish(&mut self) -> Option<State> {
        let active = self.active.take()?;
        self.state
            .cursor_for(&active.stream, &active.cursor_field)
            .map(|_| self.state.clone())
    }

    /// The stream failed; roll its entry back to the last snapshot handed out.
    pub fn abort(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        match active.committed {
            Some(entry) => {
                self.state.remove(&active.stream);
                self.state
                    .advance(&active.stream, &entry.cursor_field, entry.cursor);
            }
            None => {
                self.state.remove(&active.stream);
            }
        }
    }
}
