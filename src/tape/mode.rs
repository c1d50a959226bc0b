//! Tape modes

use serde::{Deserialize, Serialize};

/// Controls whether a tape can be played, recorded to, and in which order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapeMode {
    /// Play back by content, never record
    ReadOnly,
    /// Record only
    WriteOnly,
    /// Play back by content, record new or replacing interactions
    #[default]
    ReadWrite,
    /// Play back strictly in recorded order
    ReadSequential,
    /// Append-only recording with in-order playback
    ReadWriteSequential,
    /// Append-only recording
    WriteSequential,
}

impl TapeMode {
    /// Whether `play` is allowed
    #[must_use]
    pub const fn is_readable(self) -> bool {
        matches!(
            self,
            Self::ReadOnly | Self::ReadWrite | Self::ReadSequential | Self::ReadWriteSequential
        )
    }

    /// Whether `record` is allowed
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            Self::WriteOnly | Self::ReadWrite | Self::ReadWriteSequential | Self::WriteSequential
        )
    }

    /// Whether interactions are consumed in order through a cursor
    #[must_use]
    pub const fn is_sequential(self) -> bool {
        matches!(
            self,
            Self::ReadSequential | Self::ReadWriteSequential | Self::WriteSequential
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_table() {
        let table = [
            (TapeMode::ReadOnly, true, false, false),
            (TapeMode::WriteOnly, false, true, false),
            (TapeMode::ReadWrite, true, true, false),
            (TapeMode::ReadSequential, true, false, true),
            (TapeMode::ReadWriteSequential, true, true, true),
            (TapeMode::WriteSequential, false, true, true),
        ];

        for (mode, readable, writable, sequential) in table {
            assert_eq!(mode.is_readable(), readable, "{mode:?} readable");
            assert_eq!(mode.is_writable(), writable, "{mode:?} writable");
            assert_eq!(mode.is_sequential(), sequential, "{mode:?} sequential");
        }
    }

    #[test]
    fn test_default_mode() {
        assert_eq!(TapeMode::default(), TapeMode::ReadWrite);
    }
}
