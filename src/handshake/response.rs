//! Server handshake.
//!
//! From [RFC-6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2):
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! Sec-WebSocket-Protocol: json
//! ```

use bytes::Bytes;

use super::{HTTP_STATUS_LINE, HTTP_LINE_BREAK};
use super::static_headers::*;

use crate::error::HandshakeError;

/// Http response presentation.
pub struct Response<'a> {
    pub sec_accept: &'a str,
    pub protocol: &'a str,
}

impl<'a> Response<'a> {
    #[inline]
    pub const fn new(sec_accept: &'a str, protocol: &'a str) -> Self {
        Self {
            sec_accept,
            protocol,
        }
    }

    /// Encode the `101` response, terminated by an empty line.
    pub fn encode(&self) -> Bytes {
        let mut w = String::with_capacity(160);

        macro_rules! write_header {
            ($name: expr, $value: expr) => {
                w.push_str($name);
                w.push_str(": ");
                w.push_str($value);
                w.push_str(HTTP_LINE_BREAK);
            };
        }

        // HTTP/1.1 101 Switching Protocols
        w.push_str(HTTP_STATUS_LINE);
        w.push_str(HTTP_LINE_BREAK);

        write_header!(HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE);
        write_header!(HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE);
        write_header!(HEADER_SEC_WEBSOCKET_ACCEPT_NAME, self.sec_accept);
        write_header!(HEADER_SEC_WEBSOCKET_PROTOCOL_NAME, self.protocol);

        // finish with CRLF
        w.push_str(HTTP_LINE_BREAK);

        Bytes::from(w)
    }
}

/// A `400` answer to a rejected upgrade request.
pub struct Reject<'a>(pub &'a HandshakeError);

impl<'a> Reject<'a> {
    pub fn encode(&self) -> Bytes {
        Bytes::from(format!(
            "HTTP/1.1 400 {}{}{}",
            self.0.reason(),
            HTTP_LINE_BREAK,
            HTTP_LINE_BREAK
        ))
    }
}
