//! Websocket handshake.
//!
//! The server reads one http upgrade request, checks it against the rules
//! of this chat server (origin, username, `json` subprotocol), then answers
//! with either `101 Switching Protocols` or a `400` status line.

pub mod key;
pub mod request;
pub mod response;
pub mod negotiate;

pub use request::{HttpHeader, Request};
pub use response::{Response, Reject};
pub use negotiate::{negotiate, Accepted};
pub use key::derive_accept_key;

/// 32
pub const MAX_ALLOW_HEADERS: usize = 32;

/// 8 KiB, upper bound of an upgrade request.
pub const MAX_REQUEST_SIZE: usize = 8192;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// GET
pub const HTTP_METHOD: &str = "GET";

/// CRLF
pub const HTTP_LINE_BREAK: &str = "\r\n";

/// HTTP/1.1 101 Switching Protocols
pub const HTTP_STATUS_LINE: &str = "HTTP/1.1 101 Switching Protocols";

/// The only subprotocol this server speaks.
pub const SUBPROTOCOL: &str = "json";

/// Static http headers
#[allow(unused)]
pub mod static_headers {
    // header name
    pub const HEADER_UPGRADE_NAME: &str = "Upgrade";

    pub const HEADER_CONNECTION_NAME: &str = "Connection";

    pub const HEADER_ORIGIN_NAME: &str = "Origin";

    pub const HEADER_SEC_WEBSOCKET_KEY_NAME: &str = "Sec-WebSocket-Key";

    pub const HEADER_SEC_WEBSOCKET_ACCEPT_NAME: &str = "Sec-WebSocket-Accept";

    pub const HEADER_SEC_WEBSOCKET_PROTOCOL_NAME: &str = "Sec-WebSocket-Protocol";

    // header value
    pub const HEADER_UPGRADE_VALUE: &str = "websocket";

    pub const HEADER_CONNECTION_VALUE: &str = "Upgrade";

    /// browsers send this for opaque origins
    pub const HEADER_ORIGIN_NULL: &str = "null";
}
