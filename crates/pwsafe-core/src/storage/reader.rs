//! Decrypt and split a PWS3 buffer into headers and record groups.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::format::{
    self, BODY_START, END_OF_ENTRY, FIELD_PREFIX_LENGTH, HMAC_LENGTH, ITERATIONS, IV, KEY_HASH,
    MIN_FILE_LENGTH, SALT, TAG, TRAILER_LENGTH, WRAPPED_K, WRAPPED_L,
};
use crate::crypto::{decrypt_body, stretch_key, unwrap_key, BLOCK_SIZE, KEY_LENGTH};
use crate::error::{PwsafeError, Result};
use crate::field::decode_version;
use crate::header::{Header, HeaderType};
use crate::record::{Record, RecordType};

type HmacSha256 = Hmac<Sha256>;

/// Oldest format revision that can be read.
const MIN_VERSION: u16 = 0x0300;

/// What unlocks a file.
#[derive(Clone, Copy)]
pub enum Credentials<'a> {
    /// Passphrase bytes, stretched with the stored salt and iterations.
    Passphrase(&'a [u8]),
    /// Key K followed by key L, 64 bytes. The stored key hash is not checked.
    Key(&'a [u8]),
}

/// Plain fields of a decrypted file.
pub struct ParsedDocument {
    pub iterations: u32,
    pub headers: Vec<Header>,
    pub entries: Vec<Vec<Record>>,
}

enum Section {
    Headers,
    Records(Vec<Record>),
}

/// Split a 64-byte key buffer into K and L.
pub fn split_key(key: &[u8]) -> Result<(Zeroizing<[u8; KEY_LENGTH]>, Zeroizing<[u8; KEY_LENGTH]>)> {
    if key.len() != 2 * KEY_LENGTH {
        return Err(PwsafeError::InvalidArgument(format!(
            "Key must be {} bytes",
            2 * KEY_LENGTH
        )));
    }
    let mut k = Zeroizing::new([0u8; KEY_LENGTH]);
    let mut l = Zeroizing::new([0u8; KEY_LENGTH]);
    k.copy_from_slice(&key[..KEY_LENGTH]);
    l.copy_from_slice(&key[KEY_LENGTH..]);
    Ok((k, l))
}

fn check_framing(buffer: &[u8]) -> Result<()> {
    let unrecognized = || PwsafeError::Format("Unrecognized file format".to_string());
    if buffer.len() < MIN_FILE_LENGTH || &buffer[..TAG.len()] != TAG {
        return Err(unrecognized());
    }
    let trailer = buffer.len() - TRAILER_LENGTH;
    if buffer[trailer..trailer + 16] != format::trailer_tags() {
        return Err(unrecognized());
    }
    Ok(())
}

/// Decrypt `buffer` and parse its field stream.
///
/// # Errors
///
/// - `Format` for bad framing or an unsupported version.
/// - `Authentication` for a wrong passphrase, a body that does not split
///   into fields under the unlocked key, or a failed HMAC check.
/// - `InvalidArgument` for a key buffer that is not 64 bytes.
pub fn read_document(buffer: &[u8], credentials: Credentials<'_>) -> Result<ParsedDocument> {
    check_framing(buffer)?;

    let mut iterations = [0u8; 4];
    iterations.copy_from_slice(&buffer[ITERATIONS]);
    let iterations = u32::from_le_bytes(iterations);

    let (key_k, key_l) = match credentials {
        Credentials::Passphrase(passphrase) => {
            let stretched = stretch_key(passphrase, &buffer[SALT], iterations);
            if !stretched.matches(&buffer[KEY_HASH]) {
                return Err(PwsafeError::Authentication);
            }
            (
                unwrap_key(&stretched, &buffer[WRAPPED_K])?,
                unwrap_key(&stretched, &buffer[WRAPPED_L])?,
            )
        }
        Credentials::Key(key) => split_key(key)?,
    };

    let mut iv = [0u8; BLOCK_SIZE];
    iv.copy_from_slice(&buffer[IV]);

    let body_end = buffer.len() - TRAILER_LENGTH;
    if (body_end - BODY_START) % BLOCK_SIZE != 0 {
        return Err(PwsafeError::Format(
            "Encrypted body is not block aligned".to_string(),
        ));
    }
    let mut body = Zeroizing::new(buffer[BODY_START..body_end].to_vec());
    decrypt_body(&key_k, &iv, &mut body)?;

    let mut mac = HmacSha256::new_from_slice(&key_l[..])
        .map_err(|e| PwsafeError::Crypto(format!("HMAC key rejected: {}", e)))?;
    // Past the key check a malformed field stream means the body was altered.
    let (headers, entries) = parse_fields(&body, &mut mac).map_err(|e| {
        debug!(error = %e, "Decrypted body does not parse");
        PwsafeError::Authentication
    })?;

    mac.verify_slice(&buffer[buffer.len() - HMAC_LENGTH..])
        .map_err(|_| PwsafeError::Authentication)?;

    check_version(&headers)?;

    debug!(
        iterations,
        headers = headers.len(),
        entries = entries.len(),
        "Read password safe"
    );
    Ok(ParsedDocument {
        iterations,
        headers,
        entries,
    })
}

fn parse_fields(body: &[u8], mac: &mut HmacSha256) -> Result<(Vec<Header>, Vec<Vec<Record>>)> {
    let mut headers = Vec::new();
    let mut entries = Vec::new();
    let mut section = Section::Headers;
    let mut offset = 0;
    let mut fields = 0usize;

    while offset < body.len() {
        if body.len() - offset < FIELD_PREFIX_LENGTH {
            return Err(PwsafeError::Format("Truncated field".to_string()));
        }
        let mut length = [0u8; 4];
        length.copy_from_slice(&body[offset..offset + 4]);
        let length = u32::from_le_bytes(length) as usize;
        let code = body[offset + 4];

        let start = offset + FIELD_PREFIX_LENGTH;
        if length > body.len() - start {
            return Err(PwsafeError::Format(
                "Field length exceeds data".to_string(),
            ));
        }
        let payload = &body[start..start + length];
        mac.update(payload);
        offset += format::padded_field_length(length);
        fields += 1;

        section = match (section, code) {
            (Section::Headers, END_OF_ENTRY) => Section::Records(Vec::new()),
            (Section::Headers, code) => {
                headers.push(Header::with_bytes(HeaderType::from(code), payload));
                Section::Headers
            }
            (Section::Records(group), END_OF_ENTRY) => {
                if !group.is_empty() {
                    entries.push(group);
                }
                Section::Records(Vec::new())
            }
            (Section::Records(mut group), code) => {
                group.push(Record::with_bytes(RecordType::from(code), payload));
                Section::Records(group)
            }
        };
    }

    if let Section::Records(group) = section {
        if !group.is_empty() {
            entries.push(group);
        }
    }
    trace!(fields, "Parsed field stream");
    Ok((headers, entries))
}

fn check_version(headers: &[Header]) -> Result<()> {
    let version = headers
        .first()
        .filter(|header| header.field_type() == HeaderType::Version)
        .and_then(|header| decode_version(&header.bytes()));
    match version {
        Some(version) if version >= MIN_VERSION => Ok(()),
        _ => Err(PwsafeError::Format("Unrecognized file version".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_buffer_is_format_error() {
        let err = read_document(&[0u8; 100], Credentials::Passphrase(b"pw")).err();
        assert!(matches!(err, Some(PwsafeError::Format(_))));
    }

    #[test]
    fn test_missing_trailer_is_format_error() {
        let mut buffer = vec![0u8; MIN_FILE_LENGTH];
        buffer[..4].copy_from_slice(TAG);
        let err = read_document(&buffer, Credentials::Passphrase(b"pw")).err();
        assert!(matches!(err, Some(PwsafeError::Format(_))));
    }

    #[test]
    fn test_key_length_checked() {
        assert!(matches!(
            split_key(&[0u8; 63]),
            Err(PwsafeError::InvalidArgument(_))
        ));
        let mut key = [1u8; 64];
        key[32..].fill(2);
        let (k, l) = split_key(&key).unwrap();
        assert_eq!(*k, [1u8; 32]);
        assert_eq!(*l, [2u8; 32]);
    }

    #[test]
    fn test_parse_fields_groups() {
        fn block(code: u8, payload: &[u8]) -> Vec<u8> {
            let mut block = vec![0u8; format::padded_field_length(payload.len())];
            block[..4].copy_from_slice(&(payload.len() as u32).to_le_bytes());
            block[4] = code;
            block[5..5 + payload.len()].copy_from_slice(payload);
            block
        }
        let body: Vec<u8> = [
            block(0x00, &[0x0D, 0x03]),
            block(END_OF_ENTRY, &[]),
            block(0x03, b"one"),
            block(END_OF_ENTRY, &[]),
            block(END_OF_ENTRY, &[]),
            block(0x03, b"two"),
        ]
        .concat();

        let mut mac = HmacSha256::new_from_slice(&[0u8; 32]).unwrap();
        let (headers, entries) = parse_fields(&body, &mut mac).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1][0].text().unwrap(), "two");
        check_version(&headers).unwrap();
    }

    #[test]
    fn test_field_past_end_is_format_error() {
        let mut body = vec![0u8; 16];
        body[..4].copy_from_slice(&100u32.to_le_bytes());
        let mut mac = HmacSha256::new_from_slice(&[0u8; 32]).unwrap();
        assert!(matches!(
            parse_fields(&body, &mut mac),
            Err(PwsafeError::Format(_))
        ));
    }

    #[test]
    fn test_old_version_rejected() {
        let headers = vec![Header::with_bytes(HeaderType::Version, &[0x00, 0x02])];
        assert!(check_version(&headers).is_err());
        assert!(check_version(&[]).is_err());
    }
}
