//! Extension lifecycle states as seen by the callback core.

use std::fmt::{Display, Formatter};

/// Lifecycle state of one extension instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionState {
    Parsing,
    Starting,
    Running,
    Stopping,
    Stopped,
    Errored,
}

impl ExtensionState {
    /// Stable string id used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Errored => "errored",
        }
    }

    /// Whether handles owned by an instance in this state may be invoked.
    pub fn accepts_invocations(self) -> bool {
        matches!(self, Self::Parsing | Self::Starting | Self::Running)
    }
}

impl Display for ExtensionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
