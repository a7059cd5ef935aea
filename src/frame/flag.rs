//! Fin flag and opcode.

use crate::error::FrameError;

/// Fin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fin {
    /// a byte with its leading bit set
    Y = 0x80,

    /// a byte with its leading bit clear
    N = 0x00,
}

/// Frame opcode.
///
/// Binary frames and the other reserved data opcodes are refused,
/// this server only speaks text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// denotes a continuation frame, 0x00
    Continue = 0x00,
    /// denotes a text frame, 0x01
    Text = 0x01,

    /// denotes a connection close, 0x08
    Close = 0x08,
    /// denotes a ping, 0x09
    Ping = 0x09,
    /// denotes a pong, 0x0a
    Pong = 0x0a,
}

impl Fin {
    /// Parse from byte.
    ///
    /// No extension is ever negotiated, so any of RSV1, RSV2 or RSV3
    /// being set is a violation.
    #[inline]
    pub const fn from_flag(b: u8) -> Result<Self, FrameError> {
        if b & 0x70 != 0 {
            return Err(FrameError::ReservedBits);
        }
        let fin = match b & 0x80 {
            0x80 => Fin::Y,
            _ => Fin::N,
        };
        Ok(fin)
    }

    #[inline]
    pub const fn is_final(&self) -> bool { matches!(self, Fin::Y) }
}

impl OpCode {
    /// Parse from byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Result<Self, FrameError> {
        use OpCode::*;
        let opcode = match b & 0x0f {
            0x00 => Continue,
            0x01 => Text,
            0x02..=0x07 => return Err(FrameError::ReservedOpCode),
            0x08 => Close,
            0x09 => Ping,
            0x0a => Pong,
            _ => return Err(FrameError::IllegalOpCode),
        };
        Ok(opcode)
    }

    #[inline]
    pub const fn is_control(&self) -> bool { (*self as u8) & 0x08 != 0 }
}
