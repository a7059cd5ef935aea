//! Tcp accept loop.
//!
//! Every accepted socket runs in its own task: read the http request,
//! serve a static file or upgrade to websocket, then run the
//! [`Connection`](crate::connection::Connection) until it closes.

pub mod accept;
pub mod files;

use std::future::Future;
use std::io::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::error::Error;
use crate::registry::Registry;

/// Runtime knobs of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Close a connection after this long without inbound data.
    pub idle_timeout: Duration,
    /// Wait this long for connections to finish once shutdown begins.
    pub shutdown_grace: Duration,
    /// Serve plain http requests from these directories, first match wins.
    pub public_dirs: Vec<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(30000),
            shutdown_grace: Duration::from_millis(2000),
            public_dirs: Vec::new(),
        }
    }
}

pub struct Server {
    listener: TcpListener,
    registry: Registry,
    options: Arc<Options>,
}

impl Server {
    pub fn new(listener: TcpListener, registry: Registry, options: Options) -> Self {
        Self {
            listener,
            registry,
            options: Arc::new(options),
        }
    }

    #[inline]
    pub fn local_addr(&self) -> Result<SocketAddr> { self.listener.local_addr() }

    #[inline]
    pub fn registry(&self) -> &Registry { &self.registry }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Shutdown signals every connection, closes the journal, then waits
    /// at most [`Options::shutdown_grace`] for the connection tasks before
    /// the listener is dropped. Tasks still running are aborted.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Server {
            listener,
            registry,
            options,
        } = self;

        log::info!("server listening: addr={}", listener.local_addr()?);

        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                res = listener.accept() => match res {
                    Ok((socket, addr)) => {
                        log::debug!("tcp accepted: peer={}", addr);
                        tasks.spawn(handle(socket, addr, registry.clone(), options.clone()));
                    }
                    Err(e) => log::warn!("accept failed: err={}", e),
                },
                // reap finished tasks
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
                _ = &mut shutdown => break,
            }
        }

        registry.shutdown(|| log::info!("websocket server closed"));

        let pending = tasks.len();
        let drained = tokio::time::timeout(options.shutdown_grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            log::warn!("shutdown grace elapsed: aborting={}", tasks.len());
            tasks.shutdown().await;
        } else {
            log::debug!("connections drained: count={}", pending);
        }

        drop(listener);
        log::info!("http server closed");
        Ok(())
    }
}

async fn handle(mut socket: TcpStream, addr: SocketAddr, registry: Registry, options: Arc<Options>) {
    let _ = socket.set_nodelay(true);
    let mut buf = BytesMut::with_capacity(1024);

    let request = match accept::recv_request(&mut socket, &mut buf).await {
        Ok(request) => request,
        Err(Error::Handshake(e)) => {
            log::debug!("bad request: peer={}, err={}", addr, e);
            accept::reject(&mut socket, &e).await;
            return;
        }
        Err(e) => {
            log::debug!("request failed: peer={}, err={}", addr, e);
            return;
        }
    };

    if !request.is_upgrade() {
        if !options.public_dirs.is_empty() {
            if let Err(e) = files::serve(&mut socket, &request, &options.public_dirs).await {
                log::debug!("static file failed: peer={}, err={}", addr, e);
            }
            return;
        }
    }

    match accept::upgrade(socket, &request, buf, &registry, options.idle_timeout).await {
        Ok(mut conn) => {
            log::info!("websocket accepted: peer={}, username={}", addr, conn.username());
            conn.run().await;
        }
        Err(e) => log::info!("handshake rejected: peer={}, err={}", addr, e),
    }
}
