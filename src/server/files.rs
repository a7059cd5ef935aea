//! Static files for plain http requests.

use std::io::Result;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::handshake::Request;

const INDEX: &str = "index.html";

const NOT_FOUND: &[u8] = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Map a request route onto a file under `root`.
///
/// Routes ending with `/` resolve to `index.html`. Any `.` or `..`
/// segment is refused.
pub fn resolve(root: &Path, route: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();

    for part in route.split('/').filter(|part| !part.is_empty()) {
        if part == "." || part == ".." || part.contains('\\') {
            return None;
        }
        path.push(part);
    }

    if route.ends_with('/') {
        path.push(INDEX);
    }

    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Read the first file `route` resolves to under `roots`.
async fn lookup(roots: &[PathBuf], route: &str) -> Option<(&'static str, Vec<u8>)> {
    for root in roots {
        let path = resolve(root, route)?;
        if let Ok(body) = tokio::fs::read(&path).await {
            return Some((content_type(&path), body));
        }
    }

    None
}

/// Answer `request` with a file from the first of `roots` holding it,
/// or `404`, then close the write side.
pub async fn serve<IO>(io: &mut IO, request: &Request, roots: &[PathBuf]) -> Result<()>
where
    IO: AsyncWrite + Unpin,
{
    let file = lookup(roots, request.route()).await;

    match file {
        Some((kind, body)) => {
            log::debug!("static file: route={}, size={}", request.route(), body.len());
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                kind,
                body.len()
            );
            io.write_all(head.as_bytes()).await?;
            io.write_all(&body).await?;
        }
        None => {
            log::debug!("static file not found: route={}", request.route());
            io.write_all(NOT_FOUND).await?;
        }
    }

    io.shutdown().await
}
