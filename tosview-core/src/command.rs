//! Inspector commands
//!
//! Each decode is a value implementing [`Command`]. A host builds a
//! [`CommandRegistry`] at startup, registers the commands it wants to offer
//! and dispatches by name. Nothing is registered implicitly.

use std::sync::Arc;
use tracing::debug;

use crate::config::InspectorConfig;
use crate::error::{Error, Result};
use crate::target::MemoryReader;
use crate::{task_queue, task_trace, timer_dump, timer_trace};

/// A named, argument-less decode producing display lines
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Run the decode against `target`. Never modifies the target.
    fn invoke(&self, target: &dyn MemoryReader) -> Result<Vec<String>>;
}

/// Signature shared by the built-in decoders
type DecodeFn = fn(&dyn MemoryReader, &InspectorConfig) -> Result<Vec<String>>;

/// Built-in command bound to a configuration
pub struct Decode {
    name: &'static str,
    description: &'static str,
    config: Arc<InspectorConfig>,
    run: DecodeFn,
}

impl Decode {
    pub fn task_trace(config: Arc<InspectorConfig>) -> Self {
        Self {
            name: "task-trace",
            description: "Display the scheduler task trace, oldest first",
            config,
            run: task_trace::task_trace,
        }
    }

    pub fn task_queue(config: Arc<InspectorConfig>) -> Self {
        Self {
            name: "task-queue",
            description: "Display the scheduler ready queue",
            config,
            run: task_queue::task_queue,
        }
    }

    pub fn timer_trace(config: Arc<InspectorConfig>) -> Self {
        Self {
            name: "timer-trace",
            description: "Display the virtual timer trace, oldest first",
            config,
            run: timer_trace::timer_trace,
        }
    }

    pub fn timer_dump(config: Arc<InspectorConfig>) -> Self {
        Self {
            name: "timer-dump",
            description: "Display the virtual timer descriptors",
            config,
            run: timer_dump::timer_dump,
        }
    }
}

impl Command for Decode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn invoke(&self, target: &dyn MemoryReader) -> Result<Vec<String>> {
        debug!("invoking {}", self.name);
        (self.run)(target, &self.config)
    }
}

/// Commands offered by a host, in registration order
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four scheduler and timer decoders
    pub fn with_standard_commands(config: InspectorConfig) -> Self {
        let config = Arc::new(config);
        let mut registry = Self::new();
        registry.register(Decode::task_trace(config.clone()));
        registry.register(Decode::task_queue(config.clone()));
        registry.register(Decode::timer_trace(config.clone()));
        registry.register(Decode::timer_dump(config));
        registry
    }

    /// Add a command; a later command with the same name replaces the
    /// earlier one.
    pub fn register(&mut self, command: impl Command + 'static) {
        self.commands.retain(|c| c.name() != command.name());
        self.commands.push(Box::new(command));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Look up and run a command by name
    pub fn invoke(&self, name: &str, target: &dyn MemoryReader) -> Result<Vec<String>> {
        let command = self
            .get(name)
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))?;
        command.invoke(target)
    }
}
