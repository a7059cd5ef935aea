//! Lightweight websocket chat server.
//!
//! ## Features
//! - Hand-written RFC6455 frame codec, no protocol library.
//! - Fragmented text messages, 7/16-bit payload lengths.
//! - Named connections, every message is broadcast to everyone else.
//! - Idle timeout per connection, orderly shutdown.
//!
//! ## High-level API
//!
//! - [`server`]
//! - [`registry`]
//! - [`connection`]
//!
//! ```ignore
//! {
//!     let registry = Registry::new(Journal::null(), || {});
//!     let listener = TcpListener::bind("127.0.0.1:3210").await?;
//!     Server::new(listener, registry, Options::default())
//!         .run(tokio::signal::ctrl_c().map(|_| ()))
//!         .await?;
//! }
//! ```
//!
//! ## Low-level API
//!
//! - [`frame`]
//! - [`assemble`]
//! - [`handshake`]
//!
//! Frame:
//!
//! ```ignore
//! {
//!     // decode one client frame
//!     let (frame, n) = Frame::decode(&buf)?;
//!
//!     // reassemble fragments into a message
//!     if let Some(message) = assembler.push(frame)? {
//!         // ..
//!     }
//!
//!     // encode a server frame
//!     let bytes = encode_text(r#"{"message":"hi","from":null}"#)?;
//! }
//! ```
//!
//! Handshake:
//!
//! ```ignore
//! {
//!     let (request, n) = Request::decode(&buf)?;
//!     let accepted = negotiate(&request, |name| registry.contains(name))?;
//!     let response = Response::new(&accepted.sec_accept, accepted.protocol).encode();
//! }
//! ```

pub mod assemble;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod journal;
pub mod registry;
pub mod server;
