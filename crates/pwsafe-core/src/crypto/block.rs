//! Twofish-256 in the two modes the file format uses.
//!
//! Keys K and L are wrapped with ECB (two independent blocks each) under the
//! stretched key. The field stream is encrypted with CBC under K. Neither
//! mode pads; every buffer handed in must already be a multiple of 16 bytes.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use twofish::Twofish;
use zeroize::Zeroizing;

use crate::crypto::key::{StretchedKey, KEY_LENGTH};
use crate::error::{PwsafeError, Result};

/// Twofish block size in bytes.
pub const BLOCK_SIZE: usize = 16;

type TwofishCbcEnc = cbc::Encryptor<Twofish>;
type TwofishCbcDec = cbc::Decryptor<Twofish>;

fn ensure_block_aligned(len: usize) -> Result<()> {
    if len % BLOCK_SIZE != 0 {
        return Err(PwsafeError::Crypto(format!(
            "Buffer length {} is not a multiple of {}",
            len, BLOCK_SIZE
        )));
    }
    Ok(())
}

/// Encrypt a 32-byte key under the stretched key (ECB, no padding).
pub fn wrap_key(stretched: &StretchedKey, key: &[u8; KEY_LENGTH]) -> [u8; KEY_LENGTH] {
    let cipher = Twofish::new(GenericArray::from_slice(stretched.as_bytes()));
    let mut wrapped = *key;
    for chunk in wrapped.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }
    wrapped
}

/// Decrypt a wrapped 32-byte key with the stretched key (ECB, no padding).
///
/// # Errors
///
/// Returns `PwsafeError::Crypto` if `wrapped` is not exactly 32 bytes.
pub fn unwrap_key(stretched: &StretchedKey, wrapped: &[u8]) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if wrapped.len() != KEY_LENGTH {
        return Err(PwsafeError::Crypto(format!(
            "Wrapped key must be {} bytes",
            KEY_LENGTH
        )));
    }

    let cipher = Twofish::new(GenericArray::from_slice(stretched.as_bytes()));
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    key.copy_from_slice(wrapped);
    for chunk in key.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }
    Ok(key)
}

/// Streaming CBC encryptor for the field stream.
///
/// Chaining state carries across calls, so fields can be encrypted one
/// block group at a time as they are serialized.
pub struct BodyEncryptor {
    inner: TwofishCbcEnc,
}

impl BodyEncryptor {
    pub fn new(key: &[u8; KEY_LENGTH], iv: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            inner: TwofishCbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(iv)),
        }
    }

    /// Encrypt `buffer` in place, continuing the CBC chain.
    ///
    /// # Errors
    ///
    /// Returns `PwsafeError::Crypto` if the buffer is not block aligned.
    pub fn encrypt_in_place(&mut self, buffer: &mut [u8]) -> Result<()> {
        ensure_block_aligned(buffer.len())?;
        for chunk in buffer.chunks_exact_mut(BLOCK_SIZE) {
            self.inner
                .encrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
        Ok(())
    }
}

/// Decrypt the whole field stream in place (CBC, no padding).
///
/// # Errors
///
/// Returns `PwsafeError::Crypto` if the buffer is not block aligned.
pub fn decrypt_body(key: &[u8; KEY_LENGTH], iv: &[u8; BLOCK_SIZE], buffer: &mut [u8]) -> Result<()> {
    ensure_block_aligned(buffer.len())?;
    let mut decryptor =
        TwofishCbcDec::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    for chunk in buffer.chunks_exact_mut(BLOCK_SIZE) {
        decryptor.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key::stretch_key;

    fn wiped_on_drop<T: zeroize::ZeroizeOnDrop>() {}

    #[test]
    fn test_key_schedules_are_wiped_on_drop() {
        wiped_on_drop::<Twofish>();
        wiped_on_drop::<TwofishCbcEnc>();
        wiped_on_drop::<TwofishCbcDec>();
    }

    #[test]
    fn test_wrap_unwrap_key() {
        let stretched = stretch_key(b"secret", &[3u8; 32], 8);
        let key = [0x5Au8; KEY_LENGTH];

        let wrapped = wrap_key(&stretched, &key);
        assert_ne!(wrapped, key);

        let unwrapped = unwrap_key(&stretched, &wrapped).unwrap();
        assert_eq!(*unwrapped, key);
    }

    #[test]
    fn test_wrap_is_ecb() {
        let stretched = stretch_key(b"secret", &[3u8; 32], 8);
        let wrapped = wrap_key(&stretched, &[0x11u8; KEY_LENGTH]);
        // identical plaintext blocks give identical ciphertext blocks
        assert_eq!(wrapped[..BLOCK_SIZE], wrapped[BLOCK_SIZE..]);
    }

    #[test]
    fn test_unwrap_rejects_short_input() {
        let stretched = stretch_key(b"secret", &[3u8; 32], 8);
        assert!(unwrap_key(&stretched, &[0u8; 16]).is_err());
    }

    #[test]
    fn test_streaming_encrypt_matches_whole_decrypt() {
        let key = [0x42u8; KEY_LENGTH];
        let iv = [0x24u8; BLOCK_SIZE];
        let plaintext: Vec<u8> = (0u8..64).collect();

        let mut buffer = plaintext.clone();
        let mut encryptor = BodyEncryptor::new(&key, &iv);
        encryptor.encrypt_in_place(&mut buffer[..16]).unwrap();
        encryptor.encrypt_in_place(&mut buffer[16..]).unwrap();
        assert_ne!(buffer, plaintext);

        decrypt_body(&key, &iv, &mut buffer).unwrap();
        assert_eq!(buffer, plaintext);
    }

    #[test]
    fn test_unaligned_buffer_rejected() {
        let key = [0x42u8; KEY_LENGTH];
        let iv = [0x24u8; BLOCK_SIZE];
        let mut buffer = vec![0u8; 17];
        assert!(decrypt_body(&key, &iv, &mut buffer).is_err());
        assert!(BodyEncryptor::new(&key, &iv)
            .encrypt_in_place(&mut buffer)
            .is_err());
    }
}
