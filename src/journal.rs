//! Append-only event journal.
//!
//! Every broadcast, plus server startup and shutdown, is appended as one
//! timestamped line:
//!
//! ```text
//! [2024-05-01 12:00:00] alice: hello (CODE: 1000)
//! ```
//!
//! The journal is opened once, passed to whoever needs it, and closed
//! once. Entries after `close` are dropped.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use crate::frame::CloseCode;

#[derive(Debug)]
enum Sink {
    File(BufWriter<File>),
    // entries only go to the diagnostic log
    Null,
    Closed,
}

/// Shared handle to the journal.
#[derive(Debug, Clone)]
pub struct Journal {
    sink: Arc<Mutex<Sink>>,
    path: Option<PathBuf>,
}

impl Journal {
    /// Open a new journal file `Log-<time>.log` under `dir`, creating the
    /// directory if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            create_dir_all(dir)?;
        }

        let path = dir.join(format!("Log-{}.log", Local::now().format("%Y-%m-%d-%H%M%S")));
        let file = File::options().create(true).append(true).open(&path)?;

        log::info!("journal opened: path={:?}", path);

        Ok(Self {
            sink: Arc::new(Mutex::new(Sink::File(BufWriter::new(file)))),
            path: Some(path),
        })
    }

    /// A journal that keeps no file.
    pub fn null() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::Null)),
            path: None,
        }
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn is_closed(&self) -> bool { matches!(&*self.sink.lock(), Sink::Closed) }

    /// Append one entry. Write failures are reported to the diagnostic log
    /// and otherwise ignored.
    pub fn log(&self, message: &str, from: Option<&str>, code: Option<CloseCode>) {
        let entry = format_entry(message, from, code);
        log::debug!("journal: {}", entry.trim_end());

        let mut sink = self.sink.lock();
        if let Sink::File(w) = &mut *sink {
            if let Err(e) = w.write_all(entry.as_bytes()).and_then(|_| w.flush()) {
                log::warn!("journal write failed: err={}", e);
            }
        }
    }

    /// Flush and close the file, returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let mut sink = self.sink.lock();
        match std::mem::replace(&mut *sink, Sink::Closed) {
            Sink::File(mut w) => {
                if let Err(e) = w.flush() {
                    log::warn!("journal flush failed: err={}", e);
                }
                log::info!("journal closed");
                true
            }
            Sink::Null => true,
            Sink::Closed => false,
        }
    }
}

fn format_entry(message: &str, from: Option<&str>, code: Option<CloseCode>) -> String {
    let mut entry = format!("[{}] ", Local::now().format("%Y-%m-%d %H:%M:%S"));
    if let Some(from) = from {
        entry.push_str(from);
        entry.push_str(": ");
    }
    entry.push_str(message);
    if let Some(code) = code {
        entry.push_str(&format!(" (CODE: {})", code));
    }
    entry.push_str("\r\n");
    entry
}
