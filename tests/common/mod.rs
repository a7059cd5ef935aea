#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use lightchat::journal::Journal;
use lightchat::registry::Registry;
use lightchat::server::{Options, Server};

use log::debug;

const WAIT: Duration = Duration::from_secs(5);

pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Registry,
    stop: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

impl TestServer {
    pub async fn start(options: Options, journal: Journal) -> Self {
        let _ = env_logger::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let registry = Registry::new(journal, || debug!("server: ready"));
        let server = Server::new(listener, registry.clone(), options);
        let addr = server.local_addr().unwrap();
        debug!("server: listening on {}", addr);

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run(async {
            let _ = stopped.await;
        }));

        Self {
            addr,
            registry,
            stop,
            task,
        }
    }

    pub async fn stop(self) {
        let _ = self.stop.send(());
        tokio::time::timeout(WAIT, self.task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}

pub fn options(idle_timeout: Duration) -> Options {
    Options {
        idle_timeout,
        shutdown_grace: Duration::from_millis(500),
        public_dirs: Vec::new(),
    }
}

pub fn upgrade_request(path: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\n\
         Host: localhost\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Origin: http://localhost\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
         Sec-WebSocket-Protocol: json\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n",
        path
    )
}

/// Send `request`, return the stream and the response head.
///
/// The head is read byte by byte so no frame data is consumed.
pub async fn exchange(addr: SocketAddr, request: &str) -> (TcpStream, String) {
    let mut tcp = TcpStream::connect(addr).await.unwrap();
    tcp.write_all(request.as_bytes()).await.unwrap();

    let mut head = Vec::new();
    let mut byte = [0_u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let n = tokio::time::timeout(WAIT, tcp.read(&mut byte))
            .await
            .unwrap()
            .unwrap();
        if n == 0 {
            break;
        }
        head.push(byte[0]);
    }

    (tcp, String::from_utf8(head).unwrap())
}

pub async fn connect(addr: SocketAddr, username: &str) -> TcpStream {
    let (tcp, head) = exchange(addr, &upgrade_request(&format!("/?username={}", username))).await;
    assert!(
        head.starts_with("HTTP/1.1 101 Switching Protocols\r\n"),
        "unexpected response: {}",
        head
    );
    debug!("client[{}]: websocket connected!", username);
    tcp
}

/// Write one masked frame, the way a browser would.
pub async fn send_frame<W: AsyncWrite + Unpin>(w: &mut W, b1: u8, payload: &[u8]) {
    let key: [u8; 4] = rand::random();
    let mut buf = vec![b1];

    match payload.len() {
        n if n < 126 => buf.push(0x80 | n as u8),
        n => {
            buf.push(0x80 | 126);
            buf.extend_from_slice(&(n as u16).to_be_bytes());
        }
    }

    buf.extend_from_slice(&key);
    buf.extend(payload.iter().enumerate().map(|(i, b)| b ^ key[i & 3]));
    w.write_all(&buf).await.unwrap();
}

pub async fn send_text<W: AsyncWrite + Unpin>(w: &mut W, text: &str) {
    send_frame(w, 0x81, text.as_bytes()).await;
}

/// Opcode and payload of the next server frame.
pub async fn recv_frame<R: AsyncRead + Unpin>(r: &mut R) -> (u8, Vec<u8>) {
    tokio::time::timeout(WAIT, async {
        let mut head = [0_u8; 2];
        r.read_exact(&mut head).await.unwrap();
        assert_eq!(head[1] & 0x80, 0, "server frames are never masked");

        let len = match head[1] & 0x7f {
            126 => r.read_u16().await.unwrap() as usize,
            n => n as usize,
        };
        let mut payload = vec![0_u8; len];
        r.read_exact(&mut payload).await.unwrap();
        (head[0] & 0x0f, payload)
    })
    .await
    .unwrap()
}

pub async fn recv_json<R: AsyncRead + Unpin>(r: &mut R) -> serde_json::Value {
    let (opcode, payload) = recv_frame(r).await;
    assert_eq!(opcode, 0x01, "expect a text frame");
    serde_json::from_slice(&payload).unwrap()
}

/// Skip text frames until a close frame arrives, return its code.
pub async fn recv_close<R: AsyncRead + Unpin>(r: &mut R) -> u16 {
    loop {
        match recv_frame(r).await {
            (0x08, payload) => return u16::from_be_bytes([payload[0], payload[1]]),
            (_, payload) => debug!("client: skip {}", String::from_utf8_lossy(&payload)),
        }
    }
}

/// Wait until the server closes the stream.
pub async fn recv_eof<R: AsyncRead + Unpin>(r: &mut R) {
    let mut rest = Vec::new();
    // a reset counts as closed too
    let _ = tokio::time::timeout(WAIT, r.read_to_end(&mut rest))
        .await
        .unwrap();
}

pub fn message(message: &str, from: Option<&str>) -> serde_json::Value {
    serde_json::json!({ "message": message, "from": from })
}

pub fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "lightchat-{}-{}-{}",
        name,
        std::process::id(),
        rand::random::<u32>()
    ))
}
