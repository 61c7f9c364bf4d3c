//! Cryptographic primitives for the miIO protocol.
//!
//! - [`payload`]: AES-128-CBC payload cipher keyed from the device token
//! - [`md5`]: the 128-bit digest used for key derivation and packet checksums

pub mod payload;

pub use payload::{BLOCK_SIZE, decrypt, derive_key_iv, encrypt};

use ::md5::{Digest, Md5};

/// Computes the MD5 digest of the concatenation of `parts`.
pub fn md5(parts: &[&[u8]]) -> [u8; 16] {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
