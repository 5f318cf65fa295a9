//! Ordered log of commands awaiting the next flush.

use crate::command::Command;

/// Append-only command log, cleared as a whole on flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a command onto the tail. Operands are not validated here.
    pub fn append(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Buffered commands in append order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of buffered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove the command at `index`, e.g. one that failed to encode.
    pub fn remove(&mut self, index: usize) -> Option<Command> {
        (index < self.commands.len()).then(|| self.commands.remove(index))
    }

    /// Keep only the commands matching `keep`, preserving their order.
    pub fn retain(&mut self, keep: impl FnMut(&Command) -> bool) {
        self.commands.retain(keep);
    }

    /// Drop every buffered command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
