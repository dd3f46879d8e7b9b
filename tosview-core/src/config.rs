//! Inspector configuration
//!
//! Everything the decoders need besides the target itself: display name
//! overrides for each id space, how task durations are measured, and the
//! symbol names to read. Loaded once at startup and passed into each command.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::names::{NameOverrides, NameResolver};
use crate::target::Symbol;
use crate::types::RunTiming;

/// Complete inspector configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Task id labels
    pub tasks: NameOverrides,

    /// Timer id labels
    pub timers: NameOverrides,

    /// END duration measurement
    pub run_timing: RunTiming,

    /// Target symbol names
    pub symbols: SymbolTable,
}

/// Symbols of the scheduler and the virtual timer layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolTable {
    pub scheduler: SchedulerSymbols,
    pub timers: TimerSymbols,
}

/// Scheduler symbols (`SchedulerBasicP`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSymbols {
    pub tag_post: Symbol,
    pub tag_run: Symbol,
    pub tag_end: Symbol,
    pub num_tasks: Symbol,
    pub no_task: Symbol,
    /// Next-write index of the task trace
    pub trace_next: Symbol,
    /// Task trace array, elements `{ num, ttype, val }`
    pub trace: Symbol,
    pub queue_head: Symbol,
    pub queue_tail: Symbol,
    /// Ready queue link array, elements `{ value }`
    pub queue_next: Symbol,
}

impl Default for SchedulerSymbols {
    fn default() -> Self {
        Self {
            tag_post: "SchedulerBasicP__TT_POST".into(),
            tag_run: "SchedulerBasicP__TT_RUN".into(),
            tag_end: "SchedulerBasicP__TT_END".into(),
            num_tasks: "SchedulerBasicP__NUM_TASKS".into(),
            no_task: "SchedulerBasicP__NO_TASK".into(),
            trace_next: "SchedulerBasicP__nxt_tt".into(),
            trace: "SchedulerBasicP__task_trace".into(),
            queue_head: "SchedulerBasicP__m_head".into(),
            queue_tail: "SchedulerBasicP__m_tail".into(),
            queue_next: "SchedulerBasicP__m_next".into(),
        }
    }
}

/// Virtual timer symbols (`VirtualizeTimerImplP__0`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSymbols {
    pub tag_start_lt: Symbol,
    pub tag_start_usecs: Symbol,
    pub tag_stopped: Symbol,
    pub tag_fired: Symbol,
    pub tag_end: Symbol,
    pub tag_delta: Symbol,
    /// Next-write index of the timer trace
    pub trace_next: Symbol,
    /// Timer trace array, elements `{ num, ttype, val }`
    pub trace: Symbol,
    pub num_timers: Symbol,
    /// Timer descriptors, elements `{ t0, dt, fired_max_us, isoneshot, isrunning }`
    pub descriptors: Symbol,
}

impl Default for TimerSymbols {
    fn default() -> Self {
        Self {
            tag_start_lt: "VirtualizeTimerImplP__0__TVT_START_LT".into(),
            tag_start_usecs: "VirtualizeTimerImplP__0__TVT_START_USECS".into(),
            tag_stopped: "VirtualizeTimerImplP__0__TVT_STOPPED".into(),
            tag_fired: "VirtualizeTimerImplP__0__TVT_FIRED".into(),
            tag_end: "VirtualizeTimerImplP__0__TVT_END".into(),
            tag_delta: "VirtualizeTimerImplP__0__TVT_DELTA".into(),
            trace_next: "VirtualizeTimerImplP__0__nxt_vt".into(),
            trace: "VirtualizeTimerImplP__0__vtimer_trace".into(),
            num_timers: "VirtualizeTimerImplP__0__NUM_TIMERS".into(),
            descriptors: "VirtualizeTimerImplP__0__m_timers".into(),
        }
    }
}

impl InspectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from JSON text; absent sections take defaults
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Label a task id
    pub fn with_task_name(mut self, id: u16, label: impl Into<String>) -> Self {
        self.tasks.insert(id, label);
        self
    }

    /// Label a timer id
    pub fn with_timer_name(mut self, id: u16, label: impl Into<String>) -> Self {
        self.timers.insert(id, label);
        self
    }

    /// Select how END durations are measured
    pub fn with_run_timing(mut self, mode: RunTiming) -> Self {
        self.run_timing = mode;
        self
    }

    /// Replace the symbol table
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn task_names(&self) -> NameResolver {
        NameResolver::new(self.tasks.clone())
    }

    pub fn timer_names(&self) -> NameResolver {
        NameResolver::new(self.timers.clone())
    }
}

/// Parse an `ID=LABEL` override as given on the command line
pub fn parse_override(text: &str) -> Result<(u16, String), ConfigError> {
    let bad = || ConfigError::BadOverride(text.to_string());
    let (id, label) = text.split_once('=').ok_or_else(bad)?;
    let id = id.trim().parse::<u16>().map_err(|_| bad())?;
    let label = label.trim();
    if label.is_empty() {
        return Err(bad());
    }
    Ok((id, label.to_string()))
}
