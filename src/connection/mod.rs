//! One registered websocket peer.
//!
//! A connection owns its socket after the handshake. It decodes inbound
//! frames, reassembles messages, forwards complete messages to the
//! [`Registry`], and writes whatever the registry queues for it. Closing
//! always ends with the same teardown: best-effort close frame, socket
//! shutdown, removal from the registry and a departure notice.

mod state;

pub use state::{CloseReason, State};

use std::io::Result;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Instant};

use crate::assemble::Assembler;
use crate::error::FrameError;
use crate::frame::{encode_close, CloseCode, Frame};
use crate::registry::{Registry, Signal};

/// Upper bound for a single frame write. A peer that stops reading is
/// dropped once it is reached.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

const READ_BUFFER_SIZE: usize = 4096;

pub struct Connection<IO> {
    io: IO,
    username: String,
    registry: Registry,
    signals: UnboundedReceiver<Signal>,
    idle_timeout: Duration,
    assembler: Assembler,
    buf: BytesMut,
    state: State,
}

impl<IO> Connection<IO> {
    /// `buf` holds bytes that arrived after the upgrade request, they are
    /// decoded before anything else is read.
    pub fn new(
        io: IO,
        username: String,
        registry: Registry,
        signals: UnboundedReceiver<Signal>,
        idle_timeout: Duration,
        mut buf: BytesMut,
    ) -> Self {
        buf.reserve(READ_BUFFER_SIZE);

        Self {
            io,
            username,
            registry,
            signals,
            idle_timeout,
            assembler: Assembler::new(),
            buf,
            state: State::new(),
        }
    }

    #[inline]
    pub fn username(&self) -> &str { &self.username }

    #[inline]
    pub const fn state(&self) -> &State { &self.state }

    /// Close code recorded for this connection, if any.
    pub fn close_code(&self) -> Option<CloseCode> {
        self.state.reason().and_then(|reason| reason.close_code())
    }

    /// Check if the connection was closed by the idle timer.
    pub fn timed_out(&self) -> bool {
        matches!(self.state.reason(), Some(reason) if reason.is_timeout())
    }

    fn departure(&self, reason: CloseReason) -> String {
        if reason.is_timeout() {
            format!("{} was disconnected due to inactivity", self.username)
        } else {
            format!("{} left (connection lost)", self.username)
        }
    }

    /// Decode every complete frame in the read buffer.
    fn process(&mut self) -> std::result::Result<(), CloseReason> {
        loop {
            let (frame, n) = match Frame::decode(&self.buf) {
                Ok(x) => x,
                Err(FrameError::NotEnoughData) => return Ok(()),
                Err(e) => {
                    log::debug!("frame rejected: username={}, err={}", self.username, e);
                    return Err(e.into());
                }
            };

            self.buf.advance(n);

            match self.assembler.push(frame) {
                Ok(Some(message)) if !message.is_empty() => {
                    self.registry
                        .broadcast(&message, Some(self.username.as_str()), &[], None);
                }
                Ok(_) => {}
                Err(e) => {
                    log::debug!("message rejected: username={}, err={}", self.username, e);
                    return Err(e.into());
                }
            }
        }
    }
}

impl<IO: AsyncRead + AsyncWrite + Unpin> Connection<IO> {
    /// Write raw bytes to the socket.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.io.write_all(bytes).await?;
        self.io.flush().await
    }

    /// Serve until the connection closes, then tear it down.
    pub async fn run(&mut self) -> CloseReason {
        log::info!("connection open: username={}", self.username);

        let reason = self.serve().await;
        self.close(reason).await;
        reason
    }

    async fn serve(&mut self) -> CloseReason {
        let idle = time::sleep(self.idle_timeout);
        tokio::pin!(idle);

        loop {
            if let Err(reason) = self.process() {
                return reason;
            }

            tokio::select! {
                res = self.io.read_buf(&mut self.buf) => match res {
                    Ok(0) => return CloseReason::Lost,
                    Ok(_) => idle.as_mut().reset(Instant::now() + self.idle_timeout),
                    Err(e) => {
                        log::debug!("read failed: username={}, err={}", self.username, e);
                        return CloseReason::Lost;
                    }
                },
                signal = self.signals.recv() => match signal {
                    Some(Signal::Send(frame)) => {
                        let deadline = idle.deadline().min(Instant::now() + WRITE_TIMEOUT);
                        match time::timeout_at(deadline, self.send_raw(&frame)).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                log::debug!("write failed: username={}, err={}", self.username, e);
                                return CloseReason::Lost;
                            }
                            Err(_) if deadline >= idle.deadline() => return CloseReason::Timeout,
                            Err(_) => {
                                log::debug!("write stalled: username={}", self.username);
                                return CloseReason::Lost;
                            }
                        }
                    }
                    // registry dropped us or the server is going down
                    Some(Signal::Close) | None => return CloseReason::Shutdown,
                },
                _ = &mut idle => return CloseReason::Timeout,
            }
        }
    }

    async fn close(&mut self, reason: CloseReason) {
        self.state = State::Closing(reason);
        self.assembler.reset();

        if let Some(code) = reason.wire_code() {
            let frame = encode_close(code);
            match time::timeout(WRITE_TIMEOUT, self.send_raw(&frame)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::debug!("close frame failed: username={}, err={}", self.username, e),
                Err(_) => log::debug!("close frame timed out: username={}", self.username),
            }
        }

        let _ = self.io.shutdown().await;

        self.registry.remove(&self.username);
        let notice = self.departure(reason);
        self.registry.broadcast(&notice, None, &[], reason.close_code());

        self.state = State::Closed(reason);
        log::info!("connection closed: username={}, reason={:?}", self.username, reason);
    }
}
