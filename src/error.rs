use thiserror::Error;

/// Errors that may occur when configuring or using a password hasher
#[derive(Debug, Error)]
pub enum HasherError {
    /// Indicates that a caller passed an empty or otherwise unusable argument
    /// to a hash or verify operation. This is a programming error on the
    /// caller's side and is always propagated.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Indicates that cost parameters were out of range when a hasher was
    /// constructed. Surfaced at configuration time, never silently clamped.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Indicates that a stored hash did not match the expected encoded-hash
    /// grammar for its family. Inside verification this is folded into a
    /// failed outcome rather than propagated.
    #[error("malformed hash: {0}")]
    MalformedHash(&'static str),

    /// Indicates that a stored hash matched a known family but carried a
    /// version or revision tag this crate does not recognize.
    #[error("unsupported revision: {0}")]
    UnsupportedRevision(String),

    /// The underlying hashing primitive rejected an operation that had
    /// already passed configuration validation.
    #[error("hashing primitive failure: {0}")]
    Primitive(String),
}
