//! Core types shared by the decoders

use serde::{Deserialize, Serialize};

/// Scheduler task identifier
pub type TaskId = u16;

/// Virtual timer identifier
pub type TimerId = u16;

/// Target clock value (1/1024 s ticks for the scheduler trace)
pub type Ticks = u32;

/// Raw enum value of a trace tag as stored on the target
pub type RawTag = i64;

/// Scheduler clock ticks per second
pub const TICKS_PER_SECOND: u32 = 1024;

/// One entry of a circular trace buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Task or timer the event belongs to
    pub id: u16,
    /// Raw event kind
    pub tag: RawTag,
    /// Event-specific value (timestamp, duration or count)
    pub value: Ticks,
}

impl TraceRecord {
    pub fn new(id: u16, tag: RawTag, value: Ticks) -> Self {
        Self { id, tag, value }
    }
}

/// Task trace event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTag {
    /// Task was posted to the ready queue
    Post,
    /// Task began running
    Run,
    /// Task finished running
    End,
    /// Unrecognized tag value
    Oops(RawTag),
}

impl TaskTag {
    /// Column label used in trace output
    pub fn label(&self) -> String {
        match self {
            TaskTag::Post => "POST".to_string(),
            TaskTag::Run => "RUN".to_string(),
            TaskTag::End => "END".to_string(),
            TaskTag::Oops(raw) => raw.to_string(),
        }
    }
}

/// Tag constants of the scheduler trace, read from the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTagSet {
    pub post: RawTag,
    pub run: RawTag,
    pub end: RawTag,
}

impl TaskTagSet {
    pub fn classify(&self, raw: RawTag) -> TaskTag {
        if raw == self.post {
            TaskTag::Post
        } else if raw == self.run {
            TaskTag::Run
        } else if raw == self.end {
            TaskTag::End
        } else {
            TaskTag::Oops(raw)
        }
    }
}

/// Virtual timer trace event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTag {
    /// Armed against the local-time base
    StartLt,
    /// Armed against the microsecond base
    StartUsecs,
    /// Explicitly stopped
    Stopped,
    /// Fired
    Fired,
    /// Lifecycle ended
    End,
    /// Elapsed-time sample
    Delta,
    /// Unrecognized tag value
    Oops(RawTag),
}

/// Tag constants of the virtual timer trace, read from the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTagSet {
    pub start_lt: RawTag,
    pub start_usecs: RawTag,
    pub stopped: RawTag,
    pub fired: RawTag,
    pub end: RawTag,
    pub delta: RawTag,
}

impl TimerTagSet {
    pub fn classify(&self, raw: RawTag) -> TimerTag {
        match raw {
            r if r == self.start_lt => TimerTag::StartLt,
            r if r == self.start_usecs => TimerTag::StartUsecs,
            r if r == self.stopped => TimerTag::Stopped,
            r if r == self.fired => TimerTag::Fired,
            r if r == self.end => TimerTag::End,
            r if r == self.delta => TimerTag::Delta,
            r => TimerTag::Oops(r),
        }
    }
}

/// One virtual timer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerDescriptor {
    pub t0: Ticks,
    pub dt: Ticks,
    pub fired_max_us: Ticks,
    pub is_oneshot: bool,
    pub is_running: bool,
}

/// How END records find the RUN they are measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunTiming {
    /// One shared `last_run` for all tasks. An END for one task can consume
    /// the RUN of another; kept for output compatibility.
    #[default]
    Legacy,
    /// `last_run` tracked separately for every task id.
    PerTask,
}
