//! Resumable sync state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cursor::CursorValue;

/// Checkpoint of a single incremental stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamState {
    /// Field the cursor was taken from
    pub cursor_field: String,
    /// Largest cursor value fully emitted
    pub cursor: CursorValue,
}

/// Map of stream name to its last checkpoint.
///
/// A missing entry means the stream is read from the beginning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    streams: BTreeMap<String, StreamState>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Prior cursor for `stream`, but only if it was recorded for `cursor_field`.
    pub fn cursor_for(&self, stream: &str, cursor_field: &str) -> Option<&CursorValue> {
        self.streams
            .get(stream)
            .filter(|entry| entry.cursor_field == cursor_field)
            .map(|entry| &entry.cursor)
    }

    /// Record a cursor for `stream`.
    ///
    /// The stored cursor never regresses: a value that is not strictly after
    /// the current one is ignored. An entry recorded for a different cursor
    /// field, or holding a cursor that cannot be compared with the new one,
    /// is replaced. Returns whether the state changed.
    pub fn advance(&mut self, stream: &str, cursor_field: &str, cursor: CursorValue) -> bool {
        match self.streams.get_mut(stream) {
            Some(entry)
                if entry.cursor_field == cursor_field
                    && cursor.compare(&entry.cursor).is_some() =>
            {
                if cursor.is_after(&entry.cursor) {
                    entry.cursor = cursor;
                    true
                } else {
                    false
                }
            }
            _ => {
                self.streams.insert(
                    stream.to_string(),
                    StreamState {
                        cursor_field: cursor_field.to_string(),
                        cursor,
                    },
                );
                true
            }
        }
    }

    pub fn remove(&mut self, stream: &str) -> Option<StreamState> {
        self.streams.remove(stream)
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StreamState)> {
        self.streams.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
