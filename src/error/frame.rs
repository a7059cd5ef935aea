use std::fmt::{Display, Formatter};

use crate::frame::CloseCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    // decode
    NotEnoughData,

    ReservedBits,

    ReservedOpCode,

    IllegalOpCode,

    IllegalControl,

    Close,

    PayloadTooLarge,

    // assemble
    IllegalSequence,

    IllegalData,
}

impl FrameError {
    /// Close code reported to the peer and the journal.
    /// `NotEnoughData` is not a violation, the caller should wait for more bytes.
    #[inline]
    pub const fn close_code(&self) -> Option<CloseCode> {
        use FrameError::*;
        let code = match self {
            NotEnoughData => return None,
            ReservedBits => CloseCode::PolicyViolation,
            ReservedOpCode => CloseCode::WrongFrameFormat,
            IllegalOpCode => CloseCode::PolicyViolation,
            IllegalControl => CloseCode::ProtocolError,
            Close => CloseCode::NormalClose,
            PayloadTooLarge => CloseCode::MessageTooLarge,
            IllegalSequence => CloseCode::ProtocolError,
            IllegalData => CloseCode::WrongDataFormat,
        };
        Some(code)
    }
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use FrameError::*;
        match self {
            NotEnoughData => write!(f, "Not enough data to parse"),
            ReservedBits => write!(f, "Reserved bits set without a negotiated extension"),
            ReservedOpCode => write!(f, "Reserved or unsupported data opcode"),
            IllegalOpCode => write!(f, "Illegal opcode value"),
            IllegalControl => write!(f, "Fragmented or oversized control frame"),
            Close => write!(f, "Close frame received"),
            PayloadTooLarge => write!(f, "Message larger than 65535 bytes"),
            IllegalSequence => write!(f, "Data frame out of fragmentation sequence"),
            IllegalData => write!(f, "Message is not valid json text"),
        }
    }
}

// use default impl
impl std::error::Error for FrameError {}
