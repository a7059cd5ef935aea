//! Fragmented message reassembly.
//!
//! [RFC-6455 Section 5.4](https://datatracker.ietf.org/doc/html/rfc6455#section-5.4)
//!
//! Every complete message is expected to carry one json value.
//! Json strings are chat content, any other json value is tolerated
//! and replaced with [`INVALID_MESSAGE_TYPE`].

use crate::error::FrameError;
use crate::frame::Frame;

/// Content broadcast in place of a json value that is not a string.
pub const INVALID_MESSAGE_TYPE: &str = "(invalid message type)";

/// Largest reassembled message, the same bound a single frame has.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Pending text of one connection.
#[derive(Debug, Default)]
pub struct Assembler {
    pending: Option<Vec<u8>>,
}

impl Assembler {
    #[inline]
    pub const fn new() -> Self { Self { pending: None } }

    /// Check if a fragmented message is waiting for continuation frames.
    #[inline]
    pub const fn is_pending(&self) -> bool { self.pending.is_some() }

    /// Drop the pending message, if any.
    #[inline]
    pub fn reset(&mut self) { self.pending = None; }

    /// Feed a data frame, returns the sanitized message once the final
    /// fragment arrives.
    ///
    /// A new message starting while another is pending, or a continuation
    /// without a started message, fails with [`FrameError::IllegalSequence`].
    /// A complete message that is not json text fails with
    /// [`FrameError::IllegalData`]. A message growing past
    /// [`MAX_MESSAGE_SIZE`] fails with [`FrameError::PayloadTooLarge`].
    /// The buffer is cleared on every error.
    pub fn push(&mut self, frame: Frame) -> Result<Option<String>, FrameError> {
        let (fin, continuation, payload) = match frame {
            Frame::Data {
                fin,
                continuation,
                payload,
            } => (fin, continuation, payload),
            Frame::Control(_) => return Ok(None),
        };

        match (&mut self.pending, continuation) {
            (pending @ None, false) => *pending = Some(payload),
            (Some(buf), true) if buf.len() + payload.len() <= MAX_MESSAGE_SIZE => {
                buf.extend_from_slice(&payload)
            }
            (pending @ Some(_), true) => {
                *pending = None;
                return Err(FrameError::PayloadTooLarge);
            }
            (pending, _) => {
                *pending = None;
                return Err(FrameError::IllegalSequence);
            }
        }

        if !fin.is_final() {
            return Ok(None);
        }

        let text = self.pending.take().unwrap_or_default();
        parse_message(&text).map(Some)
    }
}

/// Parse a complete message as json, and sanitize a json string.
pub fn parse_message(text: &[u8]) -> Result<String, FrameError> {
    let text = std::str::from_utf8(text).map_err(|_| FrameError::IllegalData)?;

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::String(s)) => Ok(sanitize(&s)),
        Ok(_) => Ok(INVALID_MESSAGE_TYPE.to_string()),
        Err(_) => Err(FrameError::IllegalData),
    }
}

/// Escape `\`, `"` and `'` with a backslash, and replace NUL with `\0`.
pub fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '"' | '\'' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}
