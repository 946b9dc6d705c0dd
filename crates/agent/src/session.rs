//! NSCA-ng client session.
//!
//! A session walks through `Disconnected -> Connected -> Closed`:
//!
//! 1. [`NscaSession::connect`] dials the server over PSK-TLS and sends the
//!    `MOIN 1 <session-id>` handshake line, optionally reading one reply
//!    line back.
//! 2. [`NscaSession::push_batch`] sends `PUSH <len>` followed by the raw
//!    check-result lines.
//! 3. [`NscaSession::close`] releases the connection. Closed is terminal;
//!    build a new session to reconnect.
//!
//! Sessions are blocking and not meant to be shared between threads. No
//! operation retries; recovering from a failure is up to the caller.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

use base64::Engine;
use rand::Rng;

use crate::error::{AgentError, AgentResult};
use crate::transport::{self, PskCredentials, TlsTransport, Transport, DEFAULT_CIPHERS};

/// Random bytes behind each session id (8 base64 characters).
const SESSION_ID_BYTES: usize = 6;

/// Longest handshake reply line accepted, newline excluded.
const MAX_REPLY_LEN: usize = 1024;

/// Connection lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Tunable parameters for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bound on TCP connect and TLS handshake. `None` blocks indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Read/write timeout on the established connection.
    pub io_timeout: Option<Duration>,
    /// Read and discard one reply line after `MOIN`. Some server
    /// deployments answer the handshake synchronously.
    pub await_handshake_reply: bool,
    /// OpenSSL cipher list; must select PSK suites.
    pub ciphers: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            io_timeout: Some(Duration::from_secs(10)),
            await_handshake_reply: false,
            ciphers: DEFAULT_CIPHERS.to_string(),
        }
    }
}

/// One NSCA-ng client connection.
///
/// Generic over the [`Transport`] so the protocol can run over any byte
/// stream; [`connect`](NscaSession::connect) produces the PSK-TLS one.
/// Dropping a session closes it.
pub struct NscaSession<T: Transport = TlsTransport> {
    options: SessionOptions,
    state: SessionState,
    stream: Option<T>,
    session_id: Option<String>,
}

impl NscaSession<TlsTransport> {
    /// Dial `address` (`host:port`), negotiate PSK-TLS with `credentials`
    /// and perform the handshake.
    ///
    /// Only valid on a `Disconnected` session. All failures are
    /// [`AgentError::Connection`]; nothing stays open after a failure.
    pub fn connect(&mut self, address: &str, credentials: &PskCredentials) -> AgentResult<()> {
        self.ensure_disconnected()?;
        tracing::info!(address, identity = credentials.identity(), "Connecting to NSCA-ng server");

        let stream = transport::dial(address, credentials, &self.options)?;
        self.attach(stream)
    }
}

impl<T: Transport> NscaSession<T> {
    /// Create a disconnected session.
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            state: SessionState::Disconnected,
            stream: None,
            session_id: None,
        }
    }

    /// Perform the handshake over an already established stream.
    ///
    /// On failure the stream is disconnected and dropped, and the session
    /// stays `Disconnected`.
    pub fn attach(&mut self, mut stream: T) -> AgentResult<()> {
        self.ensure_disconnected()?;

        let session_id = generate_session_id();
        if let Err(e) = handshake(&mut stream, &session_id, self.options.await_handshake_reply) {
            if let Err(close_err) = stream.disconnect() {
                tracing::debug!(error = %close_err, "Failed to release stream after handshake error");
            }
            return Err(AgentError::Connection(format!("handshake failed: {e}")));
        }

        tracing::info!(session_id = %session_id, "NSCA-ng session established");
        self.stream = Some(stream);
        self.session_id = Some(session_id);
        self.state = SessionState::Connected;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Id sent in the `MOIN` line, once connected.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Send one batch of check-result lines.
    ///
    /// Writes `PUSH <len>\n` followed by `payload` verbatim in a single
    /// write. The payload must already be newline-terminated per line. A
    /// short write, a timeout or any other write failure is an
    /// [`AgentError::Io`]; the session stays `Connected` and the caller
    /// decides whether to close it.
    pub fn push_batch(&mut self, payload: &[u8]) -> AgentResult<()> {
        let state = self.state;
        let stream = match (state, self.stream.as_mut()) {
            (SessionState::Connected, Some(stream)) => stream,
            _ => {
                return Err(AgentError::Io(io::Error::new(
                    io::ErrorKind::NotConnected,
                    format!("cannot push on a {state} session"),
                )))
            }
        };

        let header = format!("PUSH {}\n", payload.len());
        stream.write_all(header.as_bytes())?;

        if !payload.is_empty() {
            let written = stream.write(payload)?;
            if written != payload.len() {
                return Err(AgentError::Io(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short write: {written} of {} bytes sent", payload.len()),
                )));
            }
        }
        stream.flush()?;

        tracing::debug!(
            session_id = self.session_id.as_deref().unwrap_or_default(),
            bytes = payload.len(),
            "Pushed check results",
        );
        Ok(())
    }

    /// Release the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.disconnect() {
                tracing::warn!(error = %e, "Error while closing NSCA-ng connection");
            }
            tracing::info!(
                session_id = self.session_id.as_deref().unwrap_or_default(),
                "NSCA-ng session closed",
            );
        }
        self.state = SessionState::Closed;
    }

    fn ensure_disconnected(&self) -> AgentResult<()> {
        match self.state {
            SessionState::Disconnected => Ok(()),
            state => Err(AgentError::Connection(format!(
                "cannot connect a {state} session"
            ))),
        }
    }
}

impl<T: Transport> Default for NscaSession<T> {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl<T: Transport> Drop for NscaSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> fmt::Debug for NscaSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NscaSession")
            .field("state", &self.state)
            .field("session_id", &self.session_id)
            .field("options", &self.options)
            .finish()
    }
}

/// Fresh base64 session id from [`SESSION_ID_BYTES`] random bytes.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rng().fill(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn handshake<S: Read + Write>(stream: &mut S, session_id: &str, await_reply: bool) -> io::Result<()> {
    stream.write_all(format!("MOIN 1 {session_id}\n").as_bytes())?;
    stream.flush()?;

    if await_reply {
        let reply = read_line(stream)?;
        tracing::debug!(reply = %String::from_utf8_lossy(&reply), "Handshake reply");
    }
    Ok(())
}

/// Read up to and excluding the next `\n`, one byte at a time so nothing
/// past the line is consumed.
fn read_line<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before end of reply line",
                ))
            }
            Ok(_) if byte[0] == b'\n' => return Ok(line),
            Ok(_) => {
                if line.len() == MAX_REPLY_LEN {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("reply line longer than {MAX_REPLY_LEN} bytes"),
                    ));
                }
                line.push(byte[0]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_eight_base64_chars() {
        let id = generate_session_id();
        assert_eq!(id.len(), 8);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/'));
    }

    #[test]
    fn session_ids_differ() {
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn read_line_stops_at_newline() {
        let mut input: &[u8] = b"MOIN 1\nOKAY\n";
        assert_eq!(read_line(&mut input).unwrap(), b"MOIN 1");
        assert_eq!(input, b"OKAY\n");
    }

    #[test]
    fn read_line_fails_on_eof() {
        let mut input: &[u8] = b"MOIN";
        let err = read_line(&mut input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn read_line_bounds_length() {
        let long = vec![b'x'; MAX_REPLY_LEN + 10];
        let err = read_line(&mut long.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }
}
