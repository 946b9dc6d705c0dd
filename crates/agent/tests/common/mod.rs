//! Shared test doubles for session and router tests.

#![allow(dead_code)]

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nsca_agent::transport::Transport;

/// What the in-memory transport observed.
#[derive(Debug, Default)]
pub struct Recorded {
    pub written: Vec<u8>,
    pub write_calls: usize,
    pub disconnects: usize,
}

/// An in-memory [`Transport`].
///
/// Reads come from a fixed input buffer; writes are recorded in a shared
/// [`Recorded`] the test keeps a handle to.
pub struct MemoryTransport {
    input: Cursor<Vec<u8>>,
    recorded: Arc<Mutex<Recorded>>,
    max_write: Option<usize>,
    fail_writes: bool,
}

impl MemoryTransport {
    pub fn new() -> (Self, Arc<Mutex<Recorded>>) {
        Self::with_input(Vec::new())
    }

    pub fn with_input(input: impl Into<Vec<u8>>) -> (Self, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let transport = Self {
            input: Cursor::new(input.into()),
            recorded: Arc::clone(&recorded),
            max_write: None,
            fail_writes: false,
        };
        (transport, recorded)
    }

    /// Accept at most `n` bytes per write call.
    pub fn limit_writes(mut self, n: usize) -> Self {
        self.max_write = Some(n);
        self
    }

    /// Fail every write with `BrokenPipe`.
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"));
        }
        let n = self.max_write.map_or(buf.len(), |max| max.min(buf.len()));
        let mut recorded = lock(&self.recorded);
        recorded.written.extend_from_slice(&buf[..n]);
        recorded.write_calls += 1;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn disconnect(&mut self) -> io::Result<()> {
        lock(&self.recorded).disconnects += 1;
        Ok(())
    }
}

/// Lock the shared record even after a failed assertion poisoned it, so a
/// session dropped during unwinding can still disconnect.
pub fn lock(recorded: &Mutex<Recorded>) -> MutexGuard<'_, Recorded> {
    recorded.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Forget everything recorded so far.
pub fn reset(recorded: &Mutex<Recorded>) {
    let mut recorded = lock(recorded);
    recorded.written.clear();
    recorded.write_calls = 0;
}

/// Written bytes as text.
pub fn written_text(recorded: &Arc<Mutex<Recorded>>) -> String {
    String::from_utf8(lock(recorded).written.clone()).expect("wire text is UTF-8")
}
