//! Passphrase stretching using iterated SHA-256.
//!
//! The stretched key is `SHA-256(passphrase ‖ salt)` re-hashed `iterations`
//! times. It never encrypts data directly: it wraps the random keys K and L
//! and its own SHA-256 digest is stored in the file for verification.

use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::ZeroizeOnDrop;

/// Length of every key in the format (256 bits).
pub const KEY_LENGTH: usize = 32;

/// A key stretched from a passphrase and salt.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct StretchedKey {
    key: [u8; KEY_LENGTH],
}

impl StretchedKey {
    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate key wrapping.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// SHA-256 of the stretched key, as stored at offset 40 of the file.
    pub fn verification_hash(&self) -> [u8; KEY_LENGTH] {
        Sha256::digest(&self.key).into()
    }

    /// Constant-time comparison of the verification hash with `expected`.
    pub fn matches(&self, expected: &[u8]) -> bool {
        let hash = self.verification_hash();
        expected.len() == KEY_LENGTH && bool::from(hash[..].ct_eq(expected))
    }
}

impl std::fmt::Debug for StretchedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StretchedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Stretch a passphrase with the given salt and iteration count.
///
/// The iteration count is used as given; callers enforce the minimum.
///
/// # Examples
///
/// ```
/// use pwsafe_core::crypto::stretch_key;
///
/// let a = stretch_key(b"secret", &[7u8; 32], 2048);
/// let b = stretch_key(b"secret", &[7u8; 32], 2048);
/// assert_eq!(a.as_bytes(), b.as_bytes());
/// ```
pub fn stretch_key(passphrase: &[u8], salt: &[u8], iterations: u32) -> StretchedKey {
    let mut stretched = StretchedKey {
        key: [0u8; KEY_LENGTH],
    };

    let mut hasher = Sha256::new();
    hasher.update(passphrase);
    hasher.update(salt);
    hasher.finalize_into(GenericArray::from_mut_slice(&mut stretched.key));

    for _ in 0..iterations {
        let mut hasher = Sha256::new();
        hasher.update(&stretched.key);
        hasher.finalize_into(GenericArray::from_mut_slice(&mut stretched.key));
    }

    stretched
}
