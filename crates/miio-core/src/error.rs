//! Error types for miio-core.
//!
//! Every variant names the phase of an exchange that produced it, so callers
//! can tell a discovery failure apart from a command or decode failure.

use thiserror::Error;

/// Error type for miio-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The token was not exactly 32 hexadecimal characters.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The hello handshake failed (socket, send, timeout or short reply).
    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),

    /// The JSON command could not be serialized.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// The cipher could not be built, or a ciphertext was not block aligned.
    #[error("crypto failed: {0}")]
    CryptoFailed(String),

    /// Opening, writing or reading the command socket failed.
    #[error("transport failed: {0}")]
    TransportFailed(String),

    /// A reply that must carry a payload was shorter than the packet header.
    #[error("response too short ({0} bytes)")]
    ReplyTooShort(usize),

    /// The decrypted reply was not the expected JSON document.
    #[error("parsing response: {0}")]
    DecodeFailed(String),

    /// The reply parsed but its `result` array was empty.
    #[error("no power state in response")]
    NoPowerState,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
