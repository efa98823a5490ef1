//! Host-to-sensor commands

use crate::types::Axis;

/// Command prefix shared by every host command
pub const COMMAND_PREFIX: u8 = 0x55;

/// Commands the host can send to the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start streaming the given axis
    Start(Axis),
    /// Stop streaming
    Stop,
}

impl Command {
    /// Bit-exact wire encoding
    ///
    /// `Start(Axis::None)` has no wire form of its own and encodes as STOP.
    pub fn to_bytes(&self) -> [u8; 2] {
        let code = match self {
            Command::Start(Axis::X) => 0xAA,
            Command::Start(Axis::Y) => 0xBB,
            Command::Start(Axis::Z) => 0xCC,
            Command::Start(Axis::None) | Command::Stop => 0xFF,
        };
        [COMMAND_PREFIX, code]
    }

    /// Parse a 2-byte command as the sensor would see it
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        if bytes[0] != COMMAND_PREFIX {
            return None;
        }
        match bytes[1] {
            0xAA => Some(Command::Start(Axis::X)),
            0xBB => Some(Command::Start(Axis::Y)),
            0xCC => Some(Command::Start(Axis::Z)),
            0xFF => Some(Command::Stop),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start(axis) => write!(f, "START {}", axis),
            Command::Stop => write!(f, "STOP"),
        }
    }
}
