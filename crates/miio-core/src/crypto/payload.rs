//! AES-128-CBC payload cipher for the miIO protocol.
//!
//! Key material is derived from the device token on every call:
//!
//! - `key = md5(token)`
//! - `iv  = md5(key || token)`
//!
//! Plaintext is padded with PKCS7, so a block-aligned plaintext gains a full
//! 16-byte block of padding.

use aes::Aes128;
use cbc::cipher::{
    BlockDecryptMut, BlockEncryptMut, KeyIvInit,
    block_padding::{NoPadding, Pkcs7},
};

use super::md5;
use crate::{error::Error, token::Token};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Derives the AES key and IV from the raw token bytes.
///
/// # Example
///
/// ```
/// use miio_core::crypto::derive_key_iv;
///
/// let (key, iv) = derive_key_iv(&[0x11; 16]);
/// assert_eq!((key, iv), derive_key_iv(&[0x11; 16]));
/// assert_ne!(key, iv);
/// ```
pub fn derive_key_iv(token: &[u8; 16]) -> ([u8; 16], [u8; 16]) {
    let key = md5(&[token]);
    let iv = md5(&[&key, token]);
    (key, iv)
}

/// Encrypts a payload with the key material derived from `token`.
///
/// # Errors
///
/// Returns [`Error::CryptoFailed`] if the cipher cannot be constructed.
pub fn encrypt(plaintext: &[u8], token: &Token) -> Result<Vec<u8>, Error> {
    let (key, iv) = derive_key_iv(token.expose());
    let cipher = Aes128CbcEnc::new_from_slices(&key, &iv)
        .map_err(|e| Error::CryptoFailed(format!("building cipher: {}", e)))?;

    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypts a payload with the key material derived from `token`.
///
/// Padding is removed only when the trailing byte is a plausible PKCS7 pad
/// length (`1..=16` and no longer than the plaintext). Otherwise the
/// decrypted bytes are returned as they are.
///
/// # Errors
///
/// Returns [`Error::CryptoFailed`] if the ciphertext is not a multiple of
/// the block size, which means the frame was truncated or corrupted.
pub fn decrypt(ciphertext: &[u8], token: &Token) -> Result<Vec<u8>, Error> {
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::CryptoFailed(format!(
            "encrypted data length {} is not a multiple of block size",
            ciphertext.len()
        )));
    }

    let (key, iv) = derive_key_iv(token.expose());
    let cipher = Aes128CbcDec::new_from_slices(&key, &iv)
        .map_err(|e| Error::CryptoFailed(format!("building cipher: {}", e)))?;

    let mut plaintext = cipher
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|e| Error::CryptoFailed(format!("decrypting: {}", e)))?;

    if let Some(&last) = plaintext.last() {
        let pad = last as usize;
        if (1..=BLOCK_SIZE).contains(&pad) && pad <= plaintext.len() {
            plaintext.truncate(plaintext.len() - pad);
        }
    }

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::from_hex("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4").unwrap()
    }

    #[test]
    fn test_derive_key_iv_deterministic() {
        for seed in [0x00u8, 0x42, 0xff] {
            let raw = [seed; 16];
            assert_eq!(derive_key_iv(&raw), derive_key_iv(&raw));
        }
    }

    #[test]
    fn test_derive_key_iv_known_vector() {
        // md5 of sixteen zero bytes
        let (key, _iv) = derive_key_iv(&[0u8; 16]);
        assert_eq!(hex::encode(key), "4ae71336e44bf9bf79d2752e234818a5");
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let token = token();
        for len in [0usize, 1, 15, 16, 17, 31, 32, 100, 255, 400] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
            let ciphertext = encrypt(&plaintext, &token).unwrap();
            assert_eq!(ciphertext.len() % BLOCK_SIZE, 0);
            assert_eq!(decrypt(&ciphertext, &token).unwrap(), plaintext, "len {}", len);
        }
    }

    #[test]
    fn test_block_aligned_plaintext_gets_full_pad_block() {
        let token = token();
        let plaintext = [0x61u8; 32];
        let ciphertext = encrypt(&plaintext, &token).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + BLOCK_SIZE);
    }

    #[test]
    fn test_empty_plaintext_is_one_block() {
        let ciphertext = encrypt(b"", &token()).unwrap();
        assert_eq!(ciphertext.len(), BLOCK_SIZE);
    }

    #[test]
    fn test_decrypt_rejects_unaligned_input() {
        let err = decrypt(&[0u8; 17], &token()).unwrap_err();
        assert!(matches!(err, Error::CryptoFailed(_)));
    }

    #[test]
    fn test_decrypt_empty_input() {
        assert!(decrypt(&[], &token()).unwrap().is_empty());
    }

    #[test]
    fn test_decrypt_leaves_invalid_padding_in_place() {
        let token = token();
        // A block whose last byte is 0x20, which is larger than the block size.
        let mut plaintext = [0x41u8; 16];
        plaintext[15] = 0x20;

        let (key, iv) = derive_key_iv(token.expose());
        let ciphertext = Aes128CbcEnc::new_from_slices(&key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<NoPadding>(&plaintext);

        assert_eq!(decrypt(&ciphertext, &token).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_token_does_not_recover_plaintext() {
        let plaintext = br#"{"id":1,"method":"get_prop","params":["power"]}"#;
        let ciphertext = encrypt(plaintext, &token()).unwrap();
        let other = Token::from_bytes([0x55; 16]);
        assert_ne!(decrypt(&ciphertext, &other).unwrap(), plaintext.to_vec());
    }
}
