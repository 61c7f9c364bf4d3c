//! Device token handling.
//!
//! Every miIO device is provisioned with a 16-byte token. It is the root of
//! all key material: the AES key, the IV and the packet checksum are all
//! derived from it. Users usually copy it around as a 32-character hex
//! string, which [`Token::from_hex`] validates before any network activity.
//!
//! # Security
//!
//! The raw bytes are kept in a [`SecretBox`] from the `secrecy` crate and the
//! [`Debug`](fmt::Debug) implementation never prints them. Use
//! [`Token::expose`] only where the bytes feed the cipher or checksum.

use std::{fmt, str::FromStr};

use secrecy::{ExposeSecret, SecretBox};

use crate::error::Error;

/// Length of a raw token in bytes.
pub const TOKEN_LEN: usize = 16;

/// Length of a hex-encoded token.
pub const TOKEN_HEX_LEN: usize = TOKEN_LEN * 2;

/// A 16-byte miIO device token.
///
/// # Example
///
/// ```
/// use miio_core::Token;
///
/// let token = Token::from_hex("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4").unwrap();
/// assert_eq!(token.expose()[0], 0xa1);
///
/// assert!(Token::from_hex("abc").is_err());
/// ```
pub struct Token {
    bytes: SecretBox<[u8; TOKEN_LEN]>,
}

impl Token {
    /// Creates a token from its raw bytes.
    pub fn from_bytes(bytes: [u8; TOKEN_LEN]) -> Self {
        Self {
            bytes: SecretBox::new(Box::new(bytes)),
        }
    }

    /// Parses a token from exactly 32 hexadecimal characters.
    ///
    /// Upper and lower case digits are both accepted. Nothing is trimmed:
    /// surrounding whitespace counts towards the length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if the string has the wrong length or
    /// contains a non-hex character.
    pub fn from_hex(hex_token: &str) -> Result<Self, Error> {
        if hex_token.len() != TOKEN_HEX_LEN {
            return Err(Error::InvalidToken(format!(
                "expected {} hex characters, got {}",
                TOKEN_HEX_LEN,
                hex_token.len()
            )));
        }

        let mut bytes = [0u8; TOKEN_LEN];
        hex::decode_to_slice(hex_token, &mut bytes)
            .map_err(|e| Error::InvalidToken(format!("decoding token: {}", e)))?;

        Ok(Self::from_bytes(bytes))
    }

    /// Exposes the raw token bytes.
    ///
    /// Never log or display the returned value.
    pub fn expose(&self) -> &[u8; TOKEN_LEN] {
        self.bytes.expose_secret()
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Clone for Token {
    fn clone(&self) -> Self {
        Self::from_bytes(*self.expose())
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}
