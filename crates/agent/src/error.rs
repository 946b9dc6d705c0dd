use nsca_core::error::CoreError;

/// Agent-level error type.
///
/// Wraps [`CoreError`] for configuration and domain errors and adds the
/// transport failures of an NSCA-ng session.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A domain-level error from `nsca_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Dialing, TLS negotiation or the `MOIN` handshake failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A read or write on an established session failed or timed out.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
