//! Scheduler task trace decoding
//!
//! The scheduler stamps a record into its trace ring whenever a task is
//! posted (POST), starts running (RUN) or returns (END). END records carry
//! no duration of their own; it is derived from the timestamp of the RUN
//! that preceded it.
//!
//! In [`RunTiming::Legacy`] there is a single `last_run` for all tasks, so an
//! END measures against the most recent RUN of *any* task. Interleaved
//! traces therefore report durations across task boundaries. That is what
//! existing tooling prints and it is kept as the default.
//! [`RunTiming::PerTask`] tracks `last_run` per task id instead.

use std::collections::HashMap;

use crate::config::{InspectorConfig, SchedulerSymbols};
use crate::error::Result;
use crate::names::NameResolver;
use crate::ring::render_ring;
use crate::target::MemoryReader;
use crate::types::*;

/// Width of the gap that pushes POST records into their own column
const POST_INDENT: usize = 40;

/// A decoded task trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskEvent {
    /// Ring slot the record was read from
    pub slot: usize,
    pub record: TraceRecord,
    pub tag: TaskTag,
    /// Run time in ticks, END records only
    pub duration: Option<i64>,
}

/// Where the decoder remembers RUN timestamps
#[derive(Debug, Clone)]
enum RunClock {
    Shared(Ticks),
    PerTask(HashMap<u16, Ticks>),
}

impl RunClock {
    fn new(mode: RunTiming) -> Self {
        match mode {
            RunTiming::Legacy => RunClock::Shared(0),
            RunTiming::PerTask => RunClock::PerTask(HashMap::new()),
        }
    }

    fn started(&mut self, id: u16, at: Ticks) {
        match self {
            RunClock::Shared(last) => *last = at,
            RunClock::PerTask(last) => {
                last.insert(id, at);
            }
        }
    }

    /// Duration of the run ending at `at`; 0 if no RUN is remembered
    fn finished(&mut self, id: u16, at: Ticks) -> i64 {
        let last = match self {
            RunClock::Shared(last) => std::mem::take(last),
            RunClock::PerTask(last) => last.remove(&id).unwrap_or(0),
        };
        if last == 0 {
            0
        } else {
            i64::from(at) - i64::from(last)
        }
    }
}

/// Stateful decoder for one pass over the task trace
#[derive(Debug, Clone)]
pub struct TaskTraceDecoder {
    tags: TaskTagSet,
    names: NameResolver,
    clock: RunClock,
}

impl TaskTraceDecoder {
    pub fn new(tags: TaskTagSet, names: NameResolver, mode: RunTiming) -> Self {
        Self {
            tags,
            names,
            clock: RunClock::new(mode),
        }
    }

    /// Apply one record, oldest first
    pub fn next_event(&mut self, slot: usize, record: TraceRecord) -> TaskEvent {
        let tag = self.tags.classify(record.tag);
        let duration = match tag {
            TaskTag::Run => {
                self.clock.started(record.id, record.value);
                None
            }
            TaskTag::End => Some(self.clock.finished(record.id, record.value)),
            TaskTag::Post | TaskTag::Oops(_) => None,
        };
        TaskEvent {
            slot,
            record,
            tag,
            duration,
        }
    }

    /// Decode a whole sequence of `(slot, record)` pairs
    pub fn decode<I>(&mut self, records: I) -> Vec<TaskEvent>
    where
        I: IntoIterator<Item = (usize, TraceRecord)>,
    {
        records
            .into_iter()
            .map(|(slot, record)| self.next_event(slot, record))
            .collect()
    }

    /// Display line for a decoded event
    pub fn render(&self, event: &TaskEvent) -> String {
        let name = self.names.resolve(event.record.id);
        let value = event.record.value;
        let label = event.tag.label();
        match event.tag {
            TaskTag::Post => format!(
                "{:3}{}{:08x} {:5} {}",
                event.slot,
                " ".repeat(POST_INDENT),
                value,
                label,
                name
            ),
            TaskTag::Run => format!("{:3}   {:08x}  {:5}  {}", event.slot, value, label, name),
            TaskTag::End => {
                let d = event.duration.unwrap_or(0);
                format!(
                    "{:3}   {:08x}  {:5}  {:18}  {} ({}, {:5.3})",
                    event.slot,
                    value,
                    label,
                    name,
                    signed_hex(d),
                    d,
                    scaled(d)
                )
            }
            TaskTag::Oops(_) => format!("{:3}   {:08x}  {:5}  {} oops", event.slot, value, label, name),
        }
    }
}

/// Ticks expressed in seconds
pub fn scaled(ticks: i64) -> f64 {
    ticks as f64 / f64::from(TICKS_PER_SECOND)
}

fn signed_hex(v: i64) -> String {
    if v < 0 {
        format!("-0x{:x}", v.unsigned_abs())
    } else {
        format!("0x{:x}", v)
    }
}

/// Read the scheduler's trace tag constants
pub fn read_task_tags(reader: &dyn MemoryReader, sym: &SchedulerSymbols) -> Result<TaskTagSet> {
    Ok(TaskTagSet {
        post: reader.read_scalar(&sym.tag_post)?,
        run: reader.read_scalar(&sym.tag_run)?,
        end: reader.read_scalar(&sym.tag_end)?,
    })
}

/// Decode the task trace ring on the target
pub fn task_trace(reader: &dyn MemoryReader, config: &InspectorConfig) -> Result<Vec<String>> {
    let sym = &config.symbols.scheduler;
    let tags = read_task_tags(reader, sym)?;
    let mut decoder = TaskTraceDecoder::new(tags, config.task_names(), config.run_timing);

    render_ring(reader, &sym.trace_next, &sym.trace, "task-trace", |slot, record| {
        let event = decoder.next_event(slot, record);
        decoder.render(&event)
    })
}
