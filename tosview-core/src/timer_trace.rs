//! Virtual timer trace decoding

use crate::config::{InspectorConfig, TimerSymbols};
use crate::error::Result;
use crate::names::NameResolver;
use crate::ring::render_ring;
use crate::target::MemoryReader;
use crate::types::{TimerTag, TimerTagSet, TraceRecord};

/// Renders timer trace records. Holds no state between records.
#[derive(Debug, Clone)]
pub struct TimerTraceDecoder {
    tags: TimerTagSet,
    names: NameResolver,
}

impl TimerTraceDecoder {
    pub fn new(tags: TimerTagSet, names: NameResolver) -> Self {
        Self { tags, names }
    }

    pub fn classify(&self, record: &TraceRecord) -> TimerTag {
        self.tags.classify(record.tag)
    }

    pub fn render(&self, record: &TraceRecord) -> String {
        let id = record.id;
        let v = record.value;
        let name = self.names.resolve(id);
        // Arming and stopping in the left column, firing and timing samples
        // in the right one.
        match self.classify(record) {
            TimerTag::StartLt => format!("{:4}  start {:8x}                       {}", id, v, name),
            TimerTag::StartUsecs => format!("{:4}  ustart{:8x}                       {}", id, v, name),
            TimerTag::Stopped => format!("{:4}  stop  {:8x}                       {}", id, v, name),
            TimerTag::Fired => format!("{:4}                    fired    {:8x}  {}", id, v, name),
            TimerTag::End => format!("{:4}                    end      {:8x}  {}", id, v, name),
            TimerTag::Delta => format!("{:4}                    delta    {:8x}  {}", id, v, name),
            TimerTag::Oops(raw) => format!("{:4}  oops  {:8x}  tag {}  {}", id, v, raw, name),
        }
    }
}

/// Read the timer layer's trace tag constants
pub fn read_timer_tags(reader: &dyn MemoryReader, sym: &TimerSymbols) -> Result<TimerTagSet> {
    Ok(TimerTagSet {
        start_lt: reader.read_scalar(&sym.tag_start_lt)?,
        start_usecs: reader.read_scalar(&sym.tag_start_usecs)?,
        stopped: reader.read_scalar(&sym.tag_stopped)?,
        fired: reader.read_scalar(&sym.tag_fired)?,
        end: reader.read_scalar(&sym.tag_end)?,
        delta: reader.read_scalar(&sym.tag_delta)?,
    })
}

/// Decode the timer trace ring on the target
pub fn timer_trace(reader: &dyn MemoryReader, config: &InspectorConfig) -> Result<Vec<String>> {
    let sym = &config.symbols.timers;
    let decoder = TimerTraceDecoder::new(read_timer_tags(reader, sym)?, config.timer_names());
    render_ring(reader, &sym.trace_next, &sym.trace, "timer-trace", |_, record| {
        decoder.render(&record)
    })
}
