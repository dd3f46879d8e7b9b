//! # tosview core
//!
//! Decoders for the diagnostic structures a TinyOS-style cooperative
//! scheduler and its virtual timer layer keep in RAM:
//!
//! - the task trace ring (`POST`/`RUN`/`END` records)
//! - the ready queue linked through `m_next`
//! - the virtual timer trace ring
//! - the virtual timer descriptor table
//!
//! Target memory is reached only through [`MemoryReader`]. The target keeps
//! running while it is read, so every decode is a best-effort view: rings
//! may be torn and the queue may be caught mid-update. The queue walk is
//! bounded and reports corruption instead of looping.
//!
//! ## Usage
//!
//! ```no_run
//! use tosview_core::{CommandRegistry, InspectorConfig, Snapshot};
//!
//! let target = Snapshot::load("capture.json")?;
//! let config = InspectorConfig::new().with_task_name(3, "blink");
//! let registry = CommandRegistry::with_standard_commands(config);
//!
//! for line in registry.invoke("task-trace", &target)? {
//!     println!("{}", line);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod names;
pub mod ring;
pub mod snapshot;
pub mod target;
pub mod task_queue;
pub mod task_trace;
pub mod timer_dump;
pub mod timer_trace;
pub mod types;

pub use command::{Command, CommandRegistry, Decode};
pub use config::{InspectorConfig, SchedulerSymbols, SymbolTable, TimerSymbols};
pub use error::{ConfigError, CorruptedQueueError, CorruptionReason, Error, Result, TargetAccessError};
pub use names::{NameOverrides, NameResolver};
pub use ring::RingCursor;
pub use snapshot::Snapshot;
pub use target::{Element, Endian, Field, Fields, MemoryReader, Symbol};
pub use task_queue::QueueWalk;
pub use task_trace::{TaskEvent, TaskTraceDecoder};
pub use timer_trace::TimerTraceDecoder;
pub use types::*;

/// Version of the tosview core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
