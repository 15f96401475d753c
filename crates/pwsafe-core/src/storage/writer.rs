//! Encrypt headers and entries into a PWS3 buffer.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use super::format::{self, END_OF_ENTRY, FIELD_PREFIX_LENGTH, MIN_ITERATIONS, TAG};
use super::reader::split_key;
use crate::crypto::{
    random_bytes, random_key, stretch_key, wrap_key, BodyEncryptor, BLOCK_SIZE, KEY_LENGTH,
};
use crate::entry_collection::EntryCollection;
use crate::error::{PwsafeError, Result};
use crate::field::{Field, FieldType};
use crate::header_collection::HeaderCollection;

type HmacSha256 = Hmac<Sha256>;

/// Writes field blocks: length, type, payload and random padding,
/// CBC-encrypted as they go, with each payload fed to the HMAC.
struct FieldWriter {
    out: Vec<u8>,
    encryptor: BodyEncryptor,
    mac: HmacSha256,
    fields: usize,
}

impl FieldWriter {
    fn new(out: Vec<u8>, key_k: &[u8; KEY_LENGTH], key_l: &[u8; KEY_LENGTH], iv: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(key_l)
            .map_err(|e| PwsafeError::Crypto(format!("HMAC key rejected: {}", e)))?;
        Ok(Self {
            out,
            encryptor: BodyEncryptor::new(key_k, iv),
            mac,
            fields: 0,
        })
    }

    fn write_field<T: FieldType>(&mut self, field: &Field<T>) -> Result<()> {
        self.write_block(field.field_type().code(), &field.bytes())
    }

    fn write_end_of_entry(&mut self) -> Result<()> {
        self.write_block(END_OF_ENTRY, &[])
    }

    fn write_block(&mut self, code: u8, payload: &[u8]) -> Result<()> {
        let length = u32::try_from(payload.len())
            .map_err(|_| PwsafeError::InvalidArgument("Field is too large".to_string()))?;

        let mut block = Zeroizing::new(vec![0u8; format::padded_field_length(payload.len())]);
        random_bytes(&mut block[..]);
        block[..4].copy_from_slice(&length.to_le_bytes());
        block[4] = code;
        block[FIELD_PREFIX_LENGTH..FIELD_PREFIX_LENGTH + payload.len()].copy_from_slice(payload);

        self.encryptor.encrypt_in_place(&mut block[..])?;
        self.out.extend_from_slice(&block);
        self.mac.update(payload);
        self.fields += 1;
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        let mut out = self.out;
        out.extend_from_slice(&format::trailer_tags());
        out.extend_from_slice(&self.mac.finalize().into_bytes());
        out
    }
}

/// Encrypt a document.
///
/// A fresh salt and IV are drawn every time. K and L are random unless
/// `key` supplies them (64 bytes, K then L). Iterations below 2048 are
/// raised to 2048.
pub fn write_document(
    headers: &HeaderCollection,
    entries: &EntryCollection,
    passphrase: &[u8],
    key: Option<&[u8]>,
    iterations: u32,
) -> Result<Vec<u8>> {
    let iterations = iterations.max(MIN_ITERATIONS);
    let (key_k, key_l) = match key {
        Some(key) => split_key(key)?,
        None => (random_key(), random_key()),
    };

    let mut salt = [0u8; 32];
    random_bytes(&mut salt);
    let mut iv = [0u8; BLOCK_SIZE];
    random_bytes(&mut iv);
    let stretched = stretch_key(passphrase, &salt, iterations);

    let mut out = Vec::new();
    out.extend_from_slice(TAG);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iterations.to_le_bytes());
    out.extend_from_slice(&stretched.verification_hash());
    out.extend_from_slice(&wrap_key(&stretched, &key_k));
    out.extend_from_slice(&wrap_key(&stretched, &key_l));
    out.extend_from_slice(&iv);

    let mut writer = FieldWriter::new(out, &key_k, &key_l, &iv)?;
    for header in headers {
        writer.write_field(header)?;
    }
    writer.write_end_of_entry()?;
    for entry in entries {
        for record in entry.records() {
            writer.write_field(record)?;
        }
        writer.write_end_of_entry()?;
    }

    debug!(
        iterations,
        headers = headers.len(),
        entries = entries.len(),
        fields = writer.fields,
        "Wrote password safe"
    );
    Ok(writer.finish())
}
