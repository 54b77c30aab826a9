//! Runtime lifecycle states.

use std::fmt;

/// `Created -> Starting -> Running -> ShuttingDown -> Stopped`
///
/// A failed startup goes `Starting -> ShuttingDown -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RuntimeState {
    Created = 0,
    Starting = 1,
    Running = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl RuntimeState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => RuntimeState::Created,
            1 => RuntimeState::Starting,
            2 => RuntimeState::Running,
            3 => RuntimeState::ShuttingDown,
            _ => RuntimeState::Stopped,
        }
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeState::Created => "created",
            RuntimeState::Starting => "starting",
            RuntimeState::Running => "running",
            RuntimeState::ShuttingDown => "shutting_down",
            RuntimeState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
