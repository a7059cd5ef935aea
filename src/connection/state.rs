use crate::error::FrameError;
use crate::frame::CloseCode;

/// Why a connection is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a close frame.
    Request,
    /// The inbound stream broke a protocol rule.
    Protocol(CloseCode),
    /// Nothing was received within the idle timeout.
    Timeout,
    /// The server is going away.
    Shutdown,
    /// End of stream or an io error.
    Lost,
}

impl CloseReason {
    /// Close code recorded for the departure entry.
    pub const fn close_code(&self) -> Option<CloseCode> {
        match self {
            CloseReason::Request => Some(CloseCode::NormalClose),
            CloseReason::Protocol(code) => Some(*code),
            _ => None,
        }
    }

    /// Close code sent to the client before the socket is shut down.
    pub const fn wire_code(&self) -> Option<CloseCode> {
        match self {
            CloseReason::Shutdown => Some(CloseCode::GoingDown),
            _ => self.close_code(),
        }
    }

    #[inline]
    pub const fn is_timeout(&self) -> bool { matches!(self, CloseReason::Timeout) }
}

impl From<FrameError> for CloseReason {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Close => CloseReason::Request,
            e => match e.close_code() {
                Some(code) => CloseReason::Protocol(code),
                None => CloseReason::Lost,
            },
        }
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Open,
    Closing(CloseReason),
    Closed(CloseReason),
}

impl State {
    #[inline]
    pub const fn new() -> Self { State::Open }

    /// Reason recorded once closing has begun.
    pub const fn reason(&self) -> Option<CloseReason> {
        match self {
            State::Open => None,
            State::Closing(reason) | State::Closed(reason) => Some(*reason),
        }
    }
}
