//! Command result codes.

/// Outcome of a command-surface operation.
///
/// Accompanies a human-readable reply; operational failures are reported
/// here rather than through `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandResult {
    /// Success.
    Ok,
    /// Succeeded, but the reply carries something the user should read.
    Warning,
    /// Failed.
    Error,
}

impl CommandResult {
    /// Check if result is success.
    pub fn is_ok(&self) -> bool {
        matches!(self, CommandResult::Ok)
    }

    /// Check if result is error.
    pub fn is_error(&self) -> bool {
        matches!(self, CommandResult::Error)
    }

    /// Combine two results, keeping the more severe.
    pub fn worst(self, other: CommandResult) -> CommandResult {
        self.max(other)
    }
}

impl Default for CommandResult {
    fn default() -> Self {
        CommandResult::Ok
    }
}
