#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
