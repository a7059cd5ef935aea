//! Client upgrade request.
//!
//! From [RFC-6455 Section 4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-4.1):
//!
//! Once the client's opening handshake has been sent, the client MUST
//! wait for a response from the server before sending any further data.
//!
//! Example:
//!
//! ```text
//! GET /?username=alice HTTP/1.1
//! Host: localhost:3210
//! Upgrade: websocket
//! Connection: Upgrade
//! Origin: http://localhost:3210
//! Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
//! Sec-WebSocket-Protocol: json
//! Sec-WebSocket-Version: 13
//! ```

use super::MAX_ALLOW_HEADERS;
use super::HTTP_METHOD;
use super::static_headers::*;

use crate::error::HandshakeError;

/// Http header, owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

/// Http request presentation.
///
/// Header values are kept exactly as received, header names are
/// matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub headers: Vec<HttpHeader>,
}

impl Request {
    /// Parse from a provided buffer, return the request and the number
    /// of bytes parsed.
    ///
    /// Only `GET` over `HTTP/1.1` is accepted. If the buffer does not
    /// contain a complete http request, a [`HandshakeError::NotEnoughData`]
    /// error will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), HandshakeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_ALLOW_HEADERS];
        let mut request = httparse::Request::new(&mut headers);

        // return value
        let decode_n = match request.parse(buf)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(HandshakeError::NotEnoughData),
        };

        // check method
        if request.method != Some(HTTP_METHOD) {
            return Err(HandshakeError::HttpMethod);
        }

        // check version, should be HTTP/1.1
        // ref: https://docs.rs/httparse/latest/src/httparse/lib.rs.html#581-596
        if request.version != Some(1_u8) {
            return Err(HandshakeError::HttpVersion);
        }

        // headers are shrunk to number of inited headers
        // ref: https://docs.rs/httparse/latest/src/httparse/lib.rs.html#757-765
        let headers = request
            .headers
            .iter()
            .map(|hdr| HttpHeader {
                name: hdr.name.to_string(),
                value: String::from_utf8_lossy(hdr.value).into_owned(),
            })
            .collect();

        let request = Request {
            path: request.path.unwrap_or("/").to_string(),
            headers,
        };

        Ok((request, decode_n))
    }

    /// Value of the first header named `name`, case insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|hdr| hdr.name.eq_ignore_ascii_case(name))
            .map(|hdr| hdr.value.as_str())
    }

    /// Check if the client asks for a protocol upgrade at all.
    #[inline]
    pub fn is_upgrade(&self) -> bool { self.header(HEADER_UPGRADE_NAME).is_some() }

    /// Path without the query string.
    pub fn route(&self) -> &str {
        match self.path.split_once('?') {
            Some((route, _)) => route,
            None => &self.path,
        }
    }

    /// Percent-decoded value of the query parameter `key`.
    pub fn query(&self, key: &str) -> Option<String> {
        let (_, query) = self.path.split_once('?')?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Entries of `Sec-WebSocket-Protocol`, split on commas and trimmed.
    pub fn protocols(&self) -> Vec<&str> {
        self.header(HEADER_SEC_WEBSOCKET_PROTOCOL_NAME)
            .map(|v| v.split(',').map(str::trim).collect())
            .unwrap_or_default()
    }
}
