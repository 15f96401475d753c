//! Cryptographic operations for Password Safe v3 files.
//!
//! This module provides the primitives the file format is built from,
//! using RustCrypto implementations:
//! - **SHA-256**: iterated key stretching of the passphrase
//! - **Twofish-256**: ECB key wrapping and CBC body encryption
//! - **HMAC-SHA256**: authentication tag over the plaintext field payloads
//!
//! ## Security Model
//!
//! - The stretched key only wraps the two random keys K (data) and L (HMAC)
//! - Key material lives in zeroize-on-drop containers on every exit path
//! - Passphrases and field payloads are kept sealed in memory between uses
//! - Hash and tag comparisons run in constant time
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the encrypted safe file
//! - Tampering with the encrypted body
//! - Plaintext secrets lingering in freed heap memory
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - A privileged attacker reading live process memory (the in-memory
//!   sealing key lives in the same process)

pub mod block;
pub mod key;
pub mod protect;

pub use block::{decrypt_body, unwrap_key, wrap_key, BodyEncryptor, BLOCK_SIZE};
pub use key::{stretch_key, StretchedKey, KEY_LENGTH};
pub use protect::ProtectedBytes;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// Fill a fresh 32-byte key from the operating system RNG.
pub(crate) fn random_key() -> Zeroizing<[u8; KEY_LENGTH]> {
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    OsRng.fill_bytes(&mut key[..]);
    key
}

/// Fill `buffer` with random bytes from the operating system RNG.
pub(crate) fn random_bytes(buffer: &mut [u8]) {
    OsRng.fill_bytes(buffer);
}
