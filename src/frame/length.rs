//! Payload length.

use crate::error::FrameError;

/// Payload length.
///
/// Could be 7 bits, 7+16 bits, or 7+64 bits. The 64-bit form is only
/// recognized so that it can be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLen {
    /// 0 - 125
    Standard(u8),
    /// 126 - 65535
    Extended1(u16),
    /// over 65536
    Extended2,
}

impl PayloadLen {
    /// Parse from number.
    #[inline]
    pub const fn from_num(n: u64) -> Self {
        if n < 126 {
            PayloadLen::Standard(n as u8)
        } else if n < 65536 {
            PayloadLen::Extended1(n as u16)
        } else {
            PayloadLen::Extended2
        }
    }

    /// Convert to number.
    ///
    /// A [`FrameError::PayloadTooLarge`] error is returned for the 64-bit form.
    #[inline]
    pub const fn to_num(self) -> Result<usize, FrameError> {
        use PayloadLen::*;
        match self {
            Standard(v) => Ok(v as usize),
            Extended1(v) => Ok(v as usize),
            Extended2 => Err(FrameError::PayloadTooLarge),
        }
    }

    /// Read the flag which indicates the kind of length.
    ///
    /// If the 16-bit extended length is used, the caller should read
    /// the next 2 bytes to get the real length.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        match b & 0x7f {
            126 => PayloadLen::Extended1(0),
            127 => PayloadLen::Extended2,
            b => PayloadLen::Standard(b),
        }
    }

    /// Generate the flag byte.
    /// If `length <= 125`, it represents the real length.
    #[inline]
    pub const fn to_flag(&self) -> u8 {
        use PayloadLen::*;
        match self {
            Standard(b) => *b,
            Extended1(_) => 126,
            Extended2 => 127,
        }
    }

    /// Read as 16-bit length.
    #[inline]
    pub const fn from_byte2(buf: [u8; 2]) -> Self { PayloadLen::Extended1(u16::from_be_bytes(buf)) }

    /// Number of extended length bytes following the flag byte.
    #[inline]
    pub const fn extended_len(&self) -> usize {
        match self {
            PayloadLen::Standard(_) => 0,
            PayloadLen::Extended1(_) => 2,
            PayloadLen::Extended2 => 8,
        }
    }
}
