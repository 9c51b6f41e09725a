//! Output protocol messages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::Catalog;
use crate::state::State;
use crate::values::Row;

/// One data row of a stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMessage {
    pub stream: String,
    pub data: Row,
    /// Wall-clock emission time, epoch milliseconds
    pub emitted_at: i64,
}

/// Snapshot of the state after the records emitted before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateMessage {
    pub data: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

/// A message of the output sequence.
///
/// Serialized as `{"type": "RECORD", "record": {...}}` and so on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    Record { record: RecordMessage },
    State { state: StateMessage },
    Catalog { catalog: Catalog },
    Log { log: LogMessage },
}

impl Message {
    pub fn record(stream: impl Into<String>, data: Row, emitted_at: i64) -> Self {
        Message::Record {
            record: RecordMessage {
                stream: stream.into(),
                data,
                emitted_at,
            },
        }
    }

    pub fn state(data: State) -> Self {
        Message::State {
            state: StateMessage { data },
        }
    }

    pub fn catalog(catalog: Catalog) -> Self {
        Message::Catalog { catalog }
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Message::Log {
            log: LogMessage {
                level,
                message: message.into(),
            },
        }
    }

    pub fn as_record(&self) -> Option<&RecordMessage> {
        match self {
            Message::Record { record } => Some(record),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<&State> {
        match self {
            Message::State { state } => Some(&state.data),
            _ => None,
        }
    }

    pub fn as_log(&self) -> Option<&LogMessage> {
        match self {
            Message::Log { log } => Some(log),
            _ => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Message::Record { .. })
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Message::State { .. })
    }
}
