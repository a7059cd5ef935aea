//! Live connections and message fan-out.

use std::sync::Arc;

use ahash::AHashMap;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::frame::{encode_text, CloseCode};
use crate::journal::Journal;

/// Instruction delivered to one connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Write these frame bytes to the socket.
    Send(Bytes),
    /// Close the connection, no close code is recorded.
    Close,
}

/// The registry side of a connection.
pub type Peer = UnboundedSender<Signal>;

/// Json payload of every outbound frame.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    message: &'a str,
    from: Option<&'a str>,
}

struct Inner {
    peers: RwLock<AHashMap<String, Peer>>,
    journal: Journal,
}

/// Shared map from username to live connection.
///
/// A username present in the map identifies exactly one live connection.
#[derive(Clone)]
pub struct Registry(Arc<Inner>);

impl Registry {
    /// Create an empty registry writing to `journal`, then invoke `ready`.
    pub fn new<F: FnOnce()>(journal: Journal, ready: F) -> Self {
        let registry = Self(Arc::new(Inner {
            peers: RwLock::new(AHashMap::with_capacity(64)),
            journal,
        }));

        registry.0.journal.log("Server started", None, None);
        ready();
        registry
    }

    #[inline]
    pub fn journal(&self) -> &Journal { &self.0.journal }

    pub fn contains(&self, username: &str) -> bool { self.0.peers.read().contains_key(username) }

    pub fn len(&self) -> usize { self.0.peers.read().len() }

    pub fn is_empty(&self) -> bool { self.0.peers.read().is_empty() }

    pub fn usernames(&self) -> Vec<String> { self.0.peers.read().keys().cloned().collect() }

    /// Insert a connection that just completed its handshake, and announce
    /// it to everyone else.
    ///
    /// Returns `false` if the username was taken in the meantime, the
    /// registry is left untouched.
    pub fn register(&self, username: &str, peer: Peer) -> bool {
        {
            let mut peers = self.0.peers.write();
            if peers.contains_key(username) {
                return false;
            }
            peers.insert(username.to_string(), peer);
        }

        log::info!("connection registered: username={}", username);
        self.broadcast(&format!("{} has connected", username), None, &[username], None);
        true
    }

    /// Drop `username` from the registry. Removing an absent name is a no-op.
    pub fn remove(&self, username: &str) {
        if self.0.peers.write().remove(username).is_some() {
            log::info!("connection removed: username={}", username);
        }
    }

    /// Send `message` to every connection except `exclude` and the author.
    ///
    /// The message is journaled with its author and close code, then
    /// encoded once as `{"message": .., "from": ..}` and queued to each
    /// connection. Peers whose task is gone are dropped.
    pub fn broadcast(
        &self,
        message: &str,
        from: Option<&str>,
        exclude: &[&str],
        code: Option<CloseCode>,
    ) {
        self.0.journal.log(message, from, code);

        let frame = match serde_json::to_string(&Envelope { message, from })
            .map_err(|e| e.to_string())
            .and_then(|json| encode_text(&json).map_err(|e| e.to_string()))
        {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("broadcast dropped: from={:?}, err={}", from, e);
                return;
            }
        };

        let mut gone = Vec::new();

        {
            let peers = self.0.peers.read();
            for (username, peer) in peers.iter() {
                if from == Some(username.as_str()) || exclude.contains(&username.as_str()) {
                    continue;
                }

                if peer.send(Signal::Send(frame.clone())).is_err() {
                    gone.push(username.clone());
                }
            }
        }

        for username in gone {
            self.remove(&username);
        }
    }

    /// Ask every connection to close, then close the journal and invoke
    /// `callback`.
    ///
    /// This does not wait for any socket to be torn down.
    pub fn shutdown<F: FnOnce()>(&self, callback: F) {
        {
            let peers = self.0.peers.read();
            for peer in peers.values() {
                let _ = peer.send(Signal::Close);
            }
            log::info!("shutdown signaled: connections={}", peers.len());
        }

        self.0.journal.log("Server shutting down", None, None);
        self.0.journal.close();
        callback();
    }
}
