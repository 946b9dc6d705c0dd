//! PSK-TLS transport for NSCA-ng sessions.
//!
//! NSCA-ng authenticates clients with a TLS pre-shared key instead of
//! certificates. [`dial`] opens a TCP connection and negotiates TLS 1.2
//! with a PSK cipher suite, where the identity and key come from the
//! [`PskCredentials`] passed in. Each call builds its own TLS context, so
//! sessions with different credentials can coexist in one process.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use nsca_core::error::CoreError;
use openssl::error::ErrorStack;
use openssl::ssl::{Ssl, SslContext, SslMethod, SslStream, SslVerifyMode, SslVersion};

use crate::error::{AgentError, AgentResult};
use crate::session::SessionOptions;

/// Cipher list used by stock nsca-ng deployments.
pub const DEFAULT_CIPHERS: &str = "PSK-AES256-CBC-SHA";

/// The concrete stream type produced by [`dial`].
pub type TlsTransport = SslStream<TcpStream>;

/// A byte stream a session can run over.
///
/// Implemented for the PSK-TLS stream returned by [`dial`]; tests provide
/// in-memory doubles.
pub trait Transport: Read + Write {
    /// Release the connection. Called at most once per stream.
    fn disconnect(&mut self) -> io::Result<()>;
}

impl Transport for TlsTransport {
    fn disconnect(&mut self) -> io::Result<()> {
        // The peer may already have gone away; close_notify is best effort.
        if let Err(e) = SslStream::shutdown(self) {
            tracing::debug!(error = %e, "TLS close_notify failed");
        }
        self.get_ref().shutdown(Shutdown::Both)
    }
}

/// PSK identity and key for one server.
#[derive(Clone)]
pub struct PskCredentials {
    identity: String,
    key: Vec<u8>,
}

impl PskCredentials {
    /// Both identity and key are required.
    pub fn new(identity: impl Into<String>, key: impl Into<Vec<u8>>) -> Result<Self, CoreError> {
        let identity = identity.into();
        let key = key.into();

        if identity.is_empty() {
            return Err(CoreError::Config("PSK identity must not be empty".into()));
        }
        if identity.as_bytes().contains(&0) {
            return Err(CoreError::Config("PSK identity must not contain NUL".into()));
        }
        if key.is_empty() {
            return Err(CoreError::Config("PSK key must not be empty".into()));
        }

        Ok(Self { identity, key })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for PskCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PskCredentials")
            .field("identity", &self.identity)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Dial `address` (`host:port`) and negotiate PSK-TLS.
///
/// The connect timeout bounds each TCP connection attempt and the TLS
/// handshake; afterwards the socket carries the I/O timeout. Every failure
/// is reported as [`AgentError::Connection`].
pub fn dial(
    address: &str,
    credentials: &PskCredentials,
    options: &SessionOptions,
) -> AgentResult<TlsTransport> {
    let tcp = connect_tcp(address, options.connect_timeout)?;

    set_timeouts(&tcp, options.connect_timeout).map_err(|e| {
        AgentError::Connection(format!("failed to configure socket for {address}: {e}"))
    })?;

    let context = psk_context(credentials, &options.ciphers).map_err(|e| {
        AgentError::Connection(format!("failed to build TLS context: {e}"))
    })?;
    let ssl = Ssl::new(&context)
        .map_err(|e| AgentError::Connection(format!("failed to create TLS session: {e}")))?;

    let stream = ssl.connect(tcp).map_err(|e| {
        AgentError::Connection(format!("TLS handshake with {address} failed: {e}"))
    })?;

    set_timeouts(stream.get_ref(), options.io_timeout).map_err(|e| {
        AgentError::Connection(format!("failed to configure socket for {address}: {e}"))
    })?;

    tracing::debug!(
        address,
        identity = credentials.identity(),
        cipher = stream.ssl().current_cipher().map(|c| c.name()).unwrap_or("none"),
        "PSK-TLS handshake complete",
    );

    Ok(stream)
}

/// Try every resolved address in turn, returning the first that connects.
fn connect_tcp(address: &str, timeout: Option<Duration>) -> AgentResult<TcpStream> {
    let addrs = address
        .to_socket_addrs()
        .map_err(|e| AgentError::Connection(format!("cannot resolve {address}: {e}")))?;

    let mut last_error = None;
    for addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!(%addr, error = %e, "TCP connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(AgentError::Connection(match last_error {
        Some(e) => format!("failed to connect to {address}: {e}"),
        None => format!("{address} did not resolve to any address"),
    }))
}

fn set_timeouts(stream: &TcpStream, timeout: Option<Duration>) -> io::Result<()> {
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)
}

/// Build a client context that answers the PSK callback from `credentials`.
fn psk_context(credentials: &PskCredentials, ciphers: &str) -> Result<SslContext, ErrorStack> {
    let mut builder = SslContext::builder(SslMethod::tls_client())?;
    builder.set_max_proto_version(Some(SslVersion::TLS1_2))?;
    builder.set_cipher_list(ciphers)?;
    builder.set_verify(SslVerifyMode::NONE);
    // SSL_MODE_ENABLE_PARTIAL_WRITE stays off on a bare context builder, so a
    // PUSH payload goes out in one write or fails as a whole.

    let identity = credentials.identity.clone().into_bytes();
    let key = credentials.key.clone();
    builder.set_psk_client_callback(move |_ssl, _hint, identity_out, psk_out| {
        // identity_out must receive a NUL-terminated string.
        if identity.len() >= identity_out.len() || key.len() > psk_out.len() {
            return Err(ErrorStack::get());
        }
        identity_out[..identity.len()].copy_from_slice(&identity);
        identity_out[identity.len()] = 0;
        psk_out[..key.len()].copy_from_slice(&key);
        Ok(key.len())
    });

    Ok(builder.build())
}
