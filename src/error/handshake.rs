use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum HandshakeError {
    // http error
    HttpMethod,

    HttpVersion,

    // websocket error
    Upgrade,

    Origin,

    Username,

    SecWebSocketKey,

    SecWebSocketProtocol,

    // other error

    // read
    NotEnoughData,

    NotEnoughCapacity,

    // write
    Response,

    Httparse(httparse::Error),
}

impl HandshakeError {
    /// Reason phrase of the `400` status line sent back to the client.
    #[inline]
    pub const fn reason(&self) -> &'static str {
        use HandshakeError::*;
        match self {
            Origin => "Bad origin",
            Username => "Bad username",
            SecWebSocketProtocol => "Bad subprotocol",
            Response => "Bad handshake",
            HttpMethod | HttpVersion | Upgrade | SecWebSocketKey | NotEnoughData
            | NotEnoughCapacity | Httparse(_) => "Bad Request",
        }
    }
}

impl Display for HandshakeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use HandshakeError::*;
        match self {
            // http error
            HttpMethod => write!(f, "Illegal http method"),

            HttpVersion => write!(f, "Illegal http version"),

            // websocket error
            Upgrade => write!(f, "Missing or illegal upgrade header"),

            Origin => write!(f, "Missing or null origin header"),

            Username => write!(f, "Missing or already registered username"),

            SecWebSocketKey => write!(f, "Missing sec-websocket-key header"),

            SecWebSocketProtocol => {
                write!(f, "Missing json in sec-websocket-protocol header")
            }

            // other error
            NotEnoughData => write!(f, "Not enough data to parse"),

            NotEnoughCapacity => write!(f, "Request does not fit in the buffer"),

            Response => write!(f, "Failed to write the upgrade response"),

            Httparse(e) => write!(f, "Http parse error: {}", e),
        }
    }
}

impl From<httparse::Error> for HandshakeError {
    fn from(e: httparse::Error) -> Self { HandshakeError::Httparse(e) }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let HandshakeError::Httparse(e) = self {
            Some(e)
        } else {
            None
        }
    }
}
