//! Upgrade request validation.
//!
//! Checks run in a fixed order and the first failure ends the exchange:
//! upgrade header, origin, username, key, subprotocol.

use super::{Request, SUBPROTOCOL};
use super::key::derive_accept_key;
use super::static_headers::*;

use crate::error::HandshakeError;

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub username: String,
    pub sec_accept: String,
    pub protocol: &'static str,
}

/// Validate an upgrade request.
///
/// `is_registered` tells whether a username already belongs to a live
/// connection. The origin check only refuses a missing or `null` origin,
/// any other origin is accepted.
pub fn negotiate<F>(request: &Request, is_registered: F) -> Result<Accepted, HandshakeError>
where
    F: Fn(&str) -> bool,
{
    // upgrade: websocket, compared as received
    if request.header(HEADER_UPGRADE_NAME) != Some(HEADER_UPGRADE_VALUE) {
        return Err(HandshakeError::Upgrade);
    }

    match request.header(HEADER_ORIGIN_NAME) {
        Some(origin) if !origin.is_empty() && origin != HEADER_ORIGIN_NULL => {}
        _ => return Err(HandshakeError::Origin),
    }

    let username = match request.query("username") {
        Some(name) if !name.is_empty() && !is_registered(&name) => name,
        _ => return Err(HandshakeError::Username),
    };

    let sec_accept = match request.header(HEADER_SEC_WEBSOCKET_KEY_NAME) {
        Some(key) => derive_accept_key(key.as_bytes()),
        None => return Err(HandshakeError::SecWebSocketKey),
    };

    if !request.protocols().contains(&SUBPROTOCOL) {
        return Err(HandshakeError::SecWebSocketProtocol);
    }

    Ok(Accepted {
        username,
        sec_accept,
        protocol: SUBPROTOCOL,
    })
}
