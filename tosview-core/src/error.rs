//! Error types for target access, queue traversal and configuration.

use std::fmt;
use thiserror::Error;

use crate::task_queue;
use crate::types::TaskId;

/// A required symbol, element or field could not be read from the target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetAccessError {
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("'{symbol}' is not an array")]
    NotAnArray { symbol: String },

    #[error("index out of range: {symbol}[{index}] (length {len})")]
    IndexOutOfRange {
        symbol: String,
        index: usize,
        len: usize,
    },

    #[error("field '{field}' missing from {symbol}[{index}]")]
    MissingField {
        symbol: String,
        index: usize,
        field: String,
    },

    #[error("field '{field}' has unsupported width {width} bytes")]
    BadWidth { field: String, width: usize },

    #[error("value {value} of '{what}' does not fit in {ty}")]
    ValueOutOfRange {
        what: String,
        value: i64,
        ty: &'static str,
    },

    #[error("'{count}' claims {value} entries but '{array}' holds {len}")]
    CountExceedsArray {
        count: String,
        value: usize,
        array: String,
        len: usize,
    },

    #[error("target unavailable: {0}")]
    Unavailable(String),
}

/// Why a ready-queue walk gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionReason {
    /// More than `max_steps` ids visited without reaching the sentinel.
    StepLimit { max_steps: usize },
    /// An id was reached a second time.
    Cycle { at: TaskId },
    /// A link (or the head, when `from` is `None`) pointed outside the link
    /// table and was not the sentinel.
    LinkOutOfRange { from: Option<TaskId>, to: TaskId },
}

impl fmt::Display for CorruptionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptionReason::StepLimit { max_steps } => {
                write!(f, "no sentinel within {} steps", max_steps)
            }
            CorruptionReason::Cycle { at } => write!(f, "cycle at task {}", at),
            CorruptionReason::LinkOutOfRange { from: Some(from), to } => {
                write!(f, "link out of range: {} -> {}", from, to)
            }
            CorruptionReason::LinkOutOfRange { from: None, to } => {
                write!(f, "head out of range: {}", to)
            }
        }
    }
}

/// Ready-queue traversal stopped before reaching the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ready queue corrupted ({reason}); partial chain: {}", render_chain(.partial))]
pub struct CorruptedQueueError {
    pub head: TaskId,
    pub tail: TaskId,
    pub reason: CorruptionReason,
    /// Ids visited before the walk was abandoned, head first.
    pub partial: Vec<TaskId>,
}

fn render_chain(ids: &[TaskId]) -> String {
    if ids.is_empty() {
        return "(empty)".to_string();
    }
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Configuration or snapshot file could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid name override '{0}' (expected ID=LABEL)")]
    BadOverride(String),
}

/// Combined error for a command invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("target access error: {0}")]
    Target(#[from] TargetAccessError),

    #[error("{0}")]
    CorruptedQueue(#[from] CorruptedQueueError),

    /// A ring decode failed part-way; `decoded` holds the lines produced
    /// before the failing slot.
    #[error("{command} incomplete after {} of {total} records: {source}", .decoded.len())]
    Incomplete {
        command: &'static str,
        decoded: Vec<String>,
        total: usize,
        source: TargetAccessError,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

impl Error {
    /// Whether the invocation stopped part-way with some output to show
    pub fn is_partial(&self) -> bool {
        matches!(self, Error::Incomplete { .. } | Error::CorruptedQueue(_))
    }

    /// Lines that were produced before the invocation was aborted.
    ///
    /// For a corrupted ready queue these are the queue header and the chain
    /// walked before the walk gave up.
    pub fn partial_lines(&self) -> Vec<String> {
        match self {
            Error::Incomplete { decoded, .. } => decoded.clone(),
            Error::CorruptedQueue(c) => vec![
                task_queue::header(c.head, c.tail),
                task_queue::chain(&c.partial),
            ],
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupted_queue_message() {
        let err = CorruptedQueueError {
            head: 2,
            tail: 5,
            reason: CorruptionReason::Cycle { at: 2 },
            partial: vec![2, 5],
        };
        assert_eq!(
            err.to_string(),
            "ready queue corrupted (cycle at task 2); partial chain: 2 -> 5"
        );
    }

    #[test]
    fn test_corrupted_queue_partial_lines() {
        let err = Error::from(CorruptedQueueError {
            head: 2,
            tail: 5,
            reason: CorruptionReason::LinkOutOfRange { from: Some(5), to: 40 },
            partial: vec![2, 5],
        });
        assert!(err.is_partial());
        assert_eq!(err.partial_lines(), vec!["taskQ:  h: 002  t: 005", "   2 -> 5"]);

        let err = Error::UnknownCommand("nope".to_string());
        assert!(!err.is_partial());
        assert!(err.partial_lines().is_empty());
    }

    #[test]
    fn test_incomplete_keeps_partial_lines() {
        let err = Error::Incomplete {
            command: "task-trace",
            decoded: vec!["a".to_string(), "b".to_string()],
            total: 8,
            source: TargetAccessError::UnknownSymbol("x".to_string()),
        };
        assert!(err.is_partial());
        assert_eq!(err.partial_lines(), vec!["a", "b"]);
        assert!(err.to_string().starts_with("task-trace incomplete after 2 of 8 records"));
    }
}
