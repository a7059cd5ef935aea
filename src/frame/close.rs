//! Close codes.
//!
//! [RFC-6455 Section 7.4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-7.4.1)

use std::fmt::{Display, Formatter};

/// Status code attached to a closing connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CloseCode {
    NormalClose = 1000,
    GoingDown = 1001,
    ProtocolError = 1002,
    WrongFrameFormat = 1003,
    WrongDataFormat = 1007,
    PolicyViolation = 1008,
    MessageTooLarge = 1009,
    Unexpected = 1011,
}

impl CloseCode {
    #[inline]
    pub const fn to_num(self) -> u16 { self as u16 }

    #[inline]
    pub const fn from_num(n: u16) -> Option<Self> {
        use CloseCode::*;
        let code = match n {
            1000 => NormalClose,
            1001 => GoingDown,
            1002 => ProtocolError,
            1003 => WrongFrameFormat,
            1007 => WrongDataFormat,
            1008 => PolicyViolation,
            1009 => MessageTooLarge,
            1011 => Unexpected,
            _ => return None,
        };
        Some(code)
    }
}

impl Display for CloseCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.to_num()) }
}
