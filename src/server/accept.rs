//! Upgrade sequence of one accepted socket.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::unbounded_channel;

use crate::connection::Connection;
use crate::error::{Error, HandshakeError};
use crate::handshake::{negotiate, Reject, Request, Response, MAX_REQUEST_SIZE};
use crate::registry::Registry;

/// Read until `buf` holds a complete http request, then parse it.
///
/// Bytes after the request stay in `buf`. The request must fit in
/// [`MAX_REQUEST_SIZE`] bytes, otherwise a
/// [`HandshakeError::NotEnoughCapacity`] error is returned.
pub async fn recv_request<IO>(io: &mut IO, buf: &mut BytesMut) -> Result<Request, Error>
where
    IO: AsyncRead + Unpin,
{
    loop {
        if !buf.is_empty() {
            match Request::decode(&buf[..]) {
                Ok((request, n)) => {
                    buf.advance(n);
                    return Ok(request);
                }
                Err(HandshakeError::NotEnoughData) => {}
                Err(e) => return Err(e.into()),
            }
        }

        // provided buffer is filled, however it could not accommodate the request.
        if buf.len() >= MAX_REQUEST_SIZE {
            return Err(HandshakeError::NotEnoughCapacity.into());
        }

        buf.reserve(MAX_REQUEST_SIZE - buf.len());
        let n = io.read_buf(buf).await?;

        // EOF, no more data
        if n == 0 {
            return Err(HandshakeError::NotEnoughData.into());
        }
    }
}

async fn send<IO: AsyncWrite + Unpin>(io: &mut IO, buf: &[u8]) -> std::io::Result<()> {
    io.write_all(buf).await?;
    io.flush().await
}

/// Answer a rejected request with `400 <reason>` and close the write side.
/// Failures are ignored.
pub async fn reject<IO: AsyncWrite + Unpin>(io: &mut IO, e: &HandshakeError) {
    let _ = io.write_all(&Reject(e).encode()).await;
    let _ = io.shutdown().await;
}

/// Validate `request`, send the `101` response, then register the user.
///
/// Registration happens only after the response is fully written. A
/// rejected request is answered before the error is returned. `buf` holds
/// whatever the client sent after the request.
pub async fn upgrade<IO>(
    mut io: IO,
    request: &Request,
    buf: BytesMut,
    registry: &Registry,
    idle_timeout: Duration,
) -> Result<Connection<IO>, Error>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let accepted = match negotiate(request, |name| registry.contains(name)) {
        Ok(accepted) => accepted,
        Err(e) => {
            reject(&mut io, &e).await;
            return Err(e.into());
        }
    };

    let response = Response::new(&accepted.sec_accept, accepted.protocol).encode();
    if let Err(e) = send(&mut io, &response).await {
        reject(&mut io, &HandshakeError::Response).await;
        return Err(e.into());
    }

    let (sender, signals) = unbounded_channel();
    if !registry.register(&accepted.username, sender) {
        // lost a race against another handshake with the same name
        let _ = io.shutdown().await;
        return Err(HandshakeError::Username.into());
    }

    Ok(Connection::new(
        io,
        accepted.username,
        registry.clone(),
        signals,
        idle_timeout,
        buf,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::journal::Journal;
    use tokio::io::duplex;

    const REQUEST: &str = "\
        GET /?username=alice HTTP/1.1\r\n\
        Host: localhost:3210\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Origin: http://localhost:3210\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Protocol: json\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n";

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn recv_in_pieces() {
        let (mut client, mut server) = duplex(1024);

        tokio::spawn(async move {
            for chunk in REQUEST.as_bytes().chunks(7) {
                client.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
            client.write_all(&[0x81, 0x80]).await.unwrap();
            // keep the pipe open
            let _ = client.read(&mut [0_u8; 1]).await;
        });

        let mut buf = BytesMut::new();
        let request = recv_request(&mut server, &mut buf).await.unwrap();
        assert_eq!(request.query("username").as_deref(), Some("alice"));

        // trailing bytes are kept for the frame decoder
        while buf.len() < 2 {
            server.read_buf(&mut buf).await.unwrap();
        }
        assert_eq!(&buf[..], &[0x81, 0x80]);
    }

    #[tokio::test]
    async fn recv_eof() {
        let (mut client, mut server) = duplex(1024);
        client.write_all(&REQUEST.as_bytes()[..20]).await.unwrap();
        drop(client);

        let mut buf = BytesMut::new();
        assert!(matches!(
            recv_request(&mut server, &mut buf).await,
            Err(Error::Handshake(HandshakeError::NotEnoughData))
        ));
    }

    #[tokio::test]
    async fn recv_overflow() {
        let (mut client, mut server) = duplex(1 << 16);

        let mut request = String::from("GET / HTTP/1.1\r\n");
        while request.len() <= MAX_REQUEST_SIZE {
            request.push_str("X-Padding: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n");
        }
        tokio::spawn(async move {
            let _ = client.write_all(request.as_bytes()).await;
            let _ = client.read(&mut [0_u8; 1]).await;
        });

        let mut buf = BytesMut::new();
        assert!(matches!(
            recv_request(&mut server, &mut buf).await,
            Err(Error::Handshake(
                HandshakeError::NotEnoughCapacity | HandshakeError::Httparse(_)
            ))
        ));
    }

    #[tokio::test]
    async fn upgrade_accept() {
        let registry = Registry::new(Journal::null(), || {});
        let (mut client, server) = duplex(1024);

        let (request, _) = Request::decode(REQUEST.as_bytes()).unwrap();
        let conn = upgrade(server, &request, BytesMut::new(), &registry, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(conn.username(), "alice");
        assert!(registry.contains("alice"));

        let mut buf = vec![0_u8; 1024];
        let n = client.read(&mut buf).await.unwrap();
        let response = std::str::from_utf8(&buf[..n]).unwrap();
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
        assert!(response.contains("Sec-WebSocket-Protocol: json\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn upgrade_reject_duplicate() {
        let registry = Registry::new(Journal::null(), || {});
        let (sender, _signals) = unbounded_channel();
        assert!(registry.register("alice", sender));

        let (mut client, server) = duplex(1024);
        let (request, _) = Request::decode(REQUEST.as_bytes()).unwrap();
        assert!(matches!(
            upgrade(server, &request, BytesMut::new(), &registry, TIMEOUT).await,
            Err(Error::Handshake(HandshakeError::Username))
        ));

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert_eq!(response, b"HTTP/1.1 400 Bad username\r\n\r\n");
        assert_eq!(registry.len(), 1);
    }
}
