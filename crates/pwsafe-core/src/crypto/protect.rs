//! In-memory sealing of sensitive buffers.
//!
//! Passphrases and field payloads are kept encrypted while they sit in the
//! heap between uses. The sealing key is random per process and never
//! leaves it; every sealed value gets its own random IV. This keeps
//! plaintext out of long-lived allocations. It is not a defence against an
//! attacker who can read the process memory.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use once_cell::sync::Lazy;
use twofish::Twofish;
use zeroize::Zeroizing;

use crate::crypto::block::BLOCK_SIZE;
use crate::crypto::key::KEY_LENGTH;
use crate::crypto::{random_bytes, random_key};

type TwofishCbcEnc = cbc::Encryptor<Twofish>;
type TwofishCbcDec = cbc::Decryptor<Twofish>;

static PROCESS_KEY: Lazy<Zeroizing<[u8; KEY_LENGTH]>> = Lazy::new(random_key);

/// A byte buffer kept sealed under the process key.
#[derive(Clone)]
pub struct ProtectedBytes {
    iv: [u8; BLOCK_SIZE],
    sealed: Vec<u8>,
    len: usize,
}

impl ProtectedBytes {
    /// Seal a copy of `plain`. The caller keeps ownership of (and should
    /// zeroize) its own buffer.
    pub fn seal(plain: &[u8]) -> Self {
        let mut iv = [0u8; BLOCK_SIZE];
        random_bytes(&mut iv);

        let padded_len = plain.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        let mut sealed = vec![0u8; padded_len];
        sealed[..plain.len()].copy_from_slice(plain);

        let mut encryptor = TwofishCbcEnc::new(
            GenericArray::from_slice(&PROCESS_KEY[..]),
            GenericArray::from_slice(&iv),
        );
        for chunk in sealed.chunks_exact_mut(BLOCK_SIZE) {
            encryptor.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }

        Self {
            iv,
            sealed,
            len: plain.len(),
        }
    }

    /// Decrypt into a fresh buffer that is zeroized when dropped.
    pub fn open(&self) -> Zeroizing<Vec<u8>> {
        let mut plain = Zeroizing::new(self.sealed.clone());
        let mut decryptor = TwofishCbcDec::new(
            GenericArray::from_slice(&PROCESS_KEY[..]),
            GenericArray::from_slice(&self.iv),
        );
        for chunk in plain.chunks_exact_mut(BLOCK_SIZE) {
            decryptor.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
        plain.truncate(self.len);
        plain
    }

    /// Plaintext length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ProtectedBytes {
    fn default() -> Self {
        Self::seal(&[])
    }
}

impl std::fmt::Debug for ProtectedBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectedBytes")
            .field("len", &self.len)
            .field("data", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let cases: [&[u8]; 4] = [b"", b"a", b"sixteen bytes!!!", b"a little longer than one block"];
        for plain in cases {
            let sealed = ProtectedBytes::seal(plain);
            assert_eq!(sealed.len(), plain.len());
            assert_eq!(sealed.open().as_slice(), plain);
        }
    }

    #[test]
    fn test_sealed_bytes_are_not_plaintext() {
        let plain = b"correct horse battery staple";
        let sealed = ProtectedBytes::seal(plain);
        assert!(!sealed
            .sealed
            .windows(plain.len())
            .any(|window| window == plain));
    }

    #[test]
    fn test_each_seal_uses_fresh_iv() {
        let a = ProtectedBytes::seal(b"same");
        let b = ProtectedBytes::seal(b"same");
        assert_ne!(a.sealed, b.sealed);
    }

    #[test]
    fn test_debug_redacts_data() {
        let sealed = ProtectedBytes::seal(b"secret");
        assert!(!format!("{:?}", sealed).contains("secret"));
    }
}
