//! Typed access to field payloads.
//!
//! Headers and records are both `Field`s: a type code plus a payload that
//! stays sealed in memory. The type code decides which interpretation
//! (version, UUID, text, time, binary) is valid; asking for another one is a
//! `FieldTypeMismatch` instead of a reinterpretation of the bytes.
//!
//! The accessors on `Field` itself are silent: they neither enforce the
//! owning document's read-only flag nor record access/modification. Fields
//! held by a collection are mutated through the collection's handles, which
//! add those rules.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::ProtectedBytes;
use crate::error::{PwsafeError, Result};

/// Interpretation of a field payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// No fixed interpretation; every accessor is attempted.
    Unknown,
    /// 2-byte little-endian integer.
    Version,
    /// 16-byte GUID.
    Uuid,
    /// UTF-8 text.
    Text,
    /// 4-byte little-endian seconds since the Unix epoch.
    Time,
    /// Opaque bytes.
    Binary,
}

/// A field type code (header or record) and what it stores.
pub trait FieldType: Copy + Eq + fmt::Debug {
    /// Data type the code stores.
    fn data_type(self) -> DataType;

    /// Raw type byte written to the file.
    fn code(self) -> u8;

    /// Payload a newly created field of this type starts with.
    fn default_data(self) -> &'static [u8] {
        &[]
    }
}

/// A typed, length-prefixed unit of stored data.
#[derive(Clone, Debug)]
pub struct Field<T> {
    field_type: T,
    data: ProtectedBytes,
}

impl<T: FieldType> Field<T> {
    /// Create a field holding the type's default payload.
    pub fn new(field_type: T) -> Self {
        Self::with_bytes(field_type, field_type.default_data())
    }

    /// Create a field from a raw payload (copied and sealed).
    pub fn with_bytes(field_type: T, bytes: &[u8]) -> Self {
        Self {
            field_type,
            data: ProtectedBytes::seal(bytes),
        }
    }

    pub fn field_type(&self) -> T {
        self.field_type
    }

    pub fn data_type(&self) -> DataType {
        self.field_type.data_type()
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy of the raw payload.
    pub fn bytes(&self) -> Zeroizing<Vec<u8>> {
        self.data.open()
    }

    /// Replace the raw payload. Returns false when the new payload is
    /// identical to the current one and nothing was written.
    pub fn set_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.data.len() == bytes.len() && self.data.open().as_slice() == bytes {
            return false;
        }
        self.data = ProtectedBytes::seal(bytes);
        true
    }

    fn expect(&self, wanted: DataType) -> Result<()> {
        match self.data_type() {
            DataType::Unknown => Ok(()),
            actual if actual == wanted => Ok(()),
            actual => Err(PwsafeError::FieldTypeMismatch {
                expected: wanted,
                actual,
            }),
        }
    }

    /// Version number, or `None` when the payload is not exactly 2 bytes.
    pub fn version(&self) -> Result<Option<u16>> {
        self.expect(DataType::Version)?;
        Ok(decode_version(&self.bytes()))
    }

    pub fn set_version(&mut self, version: u16) -> Result<bool> {
        self.expect(DataType::Version)?;
        Ok(self.set_bytes(&version.to_le_bytes()))
    }

    /// UUID, or `None` when the payload is not exactly 16 bytes.
    pub fn uuid(&self) -> Result<Option<Uuid>> {
        self.expect(DataType::Uuid)?;
        Ok(decode_uuid(&self.bytes()))
    }

    pub fn set_uuid(&mut self, uuid: Uuid) -> Result<bool> {
        self.expect(DataType::Uuid)?;
        Ok(self.set_bytes(&uuid.to_bytes_le()))
    }

    /// Payload decoded as UTF-8 (invalid sequences are replaced).
    pub fn text(&self) -> Result<String> {
        self.expect(DataType::Text)?;
        Ok(String::from_utf8_lossy(&self.bytes()).into_owned())
    }

    pub fn set_text(&mut self, text: &str) -> Result<bool> {
        self.expect(DataType::Text)?;
        Ok(self.set_bytes(text.as_bytes()))
    }

    /// Timestamp, or `None` when no time is set.
    pub fn time(&self) -> Result<Option<DateTime<Utc>>> {
        self.expect(DataType::Time)?;
        Ok(decode_time(&self.bytes()))
    }

    /// Store a timestamp as 4-byte seconds since the epoch.
    ///
    /// # Errors
    ///
    /// Returns `PwsafeError::InvalidArgument` for times before 1970 or past
    /// the 32-bit range.
    pub fn set_time(&mut self, time: DateTime<Utc>) -> Result<bool> {
        self.expect(DataType::Time)?;
        Ok(self.set_bytes(&encode_time(time)?))
    }
}

impl<T: FieldType> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.bytes();
        match self.data_type() {
            DataType::Version => match decode_version(&bytes) {
                Some(version) => write!(f, "{:04X}", version),
                None => write!(f, "?"),
            },
            DataType::Uuid => write!(f, "{}", decode_uuid(&bytes).unwrap_or_default()),
            DataType::Text => write!(f, "{}", String::from_utf8_lossy(&bytes)),
            DataType::Time => match decode_time(&bytes) {
                Some(time) => write!(f, "{}", time.to_rfc3339_opts(SecondsFormat::Secs, true)),
                None => Ok(()),
            },
            DataType::Unknown | DataType::Binary => {
                write!(f, "0x")?;
                for byte in bytes.iter() {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

pub(crate) fn decode_version(bytes: &[u8]) -> Option<u16> {
    let raw: [u8; 2] = bytes.try_into().ok()?;
    Some(u16::from_le_bytes(raw))
}

pub(crate) fn decode_uuid(bytes: &[u8]) -> Option<Uuid> {
    let raw: [u8; 16] = bytes.try_into().ok()?;
    Some(Uuid::from_bytes_le(raw))
}

pub(crate) fn decode_time(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let seconds = match bytes.len() {
        4 => u32::from_le_bytes(bytes.try_into().ok()?),
        // older writers stored the time as 8 hex digits
        8 => {
            let text = std::str::from_utf8(bytes).ok()?;
            u32::from_str_radix(text, 16).ok()?
        }
        _ => return None,
    };
    DateTime::from_timestamp(i64::from(seconds), 0)
}

pub(crate) fn encode_time(time: DateTime<Utc>) -> Result<[u8; 4]> {
    let seconds = u32::try_from(time.timestamp()).map_err(|_| {
        PwsafeError::InvalidArgument(format!("Time outside of allowable range: {}", time))
    })?;
    Ok(seconds.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Typed(DataType);

    impl FieldType for Typed {
        fn data_type(self) -> DataType {
            self.0
        }

        fn code(self) -> u8 {
            0x42
        }
    }

    #[test]
    fn test_text_round_trip() {
        let mut field = Field::new(Typed(DataType::Text));
        assert_eq!(field.text().unwrap(), "");
        assert!(field.set_text("Zürich").unwrap());
        assert_eq!(field.text().unwrap(), "Zürich");
        assert_eq!(field.bytes().as_slice(), "Zürich".as_bytes());
    }

    #[test]
    fn test_identical_write_reports_unchanged() {
        let mut field = Field::with_bytes(Typed(DataType::Text), b"same");
        assert!(!field.set_text("same").unwrap());
        assert!(field.set_text("other").unwrap());
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let field = Field::with_bytes(Typed(DataType::Text), b"abcd");
        assert!(matches!(
            field.time(),
            Err(PwsafeError::FieldTypeMismatch {
                expected: DataType::Time,
                actual: DataType::Text
            })
        ));
        let mut field = Field::new(Typed(DataType::Time));
        assert!(field.set_text("x").is_err());
    }

    #[test]
    fn test_unknown_type_accepts_all_accessors() {
        let field = Field::with_bytes(Typed(DataType::Unknown), &[0x0D, 0x03]);
        assert_eq!(field.version().unwrap(), Some(0x030D));
        assert_eq!(field.text().unwrap().len(), 2);
        assert_eq!(field.uuid().unwrap(), None);
    }

    #[test]
    fn test_version_requires_two_bytes() {
        let field = Field::with_bytes(Typed(DataType::Version), &[0x0D, 0x03, 0x00]);
        assert_eq!(field.version().unwrap(), None);
    }

    #[test]
    fn test_uuid_uses_guid_byte_order() {
        let uuid = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        let mut field = Field::new(Typed(DataType::Uuid));
        field.set_uuid(uuid).unwrap();
        assert_eq!(
            hex::encode(field.bytes().as_slice()),
            "33221100554477668899aabbccddeeff"
        );
        assert_eq!(field.uuid().unwrap(), Some(uuid));
    }

    #[test]
    fn test_time_binary_and_hex_forms() {
        let expected = Utc.with_ymd_and_hms(2017, 3, 1, 12, 0, 0).unwrap();
        let seconds = expected.timestamp() as u32;

        let binary = Field::with_bytes(Typed(DataType::Time), &seconds.to_le_bytes());
        assert_eq!(binary.time().unwrap(), Some(expected));

        let hex_text = format!("{:08x}", seconds);
        let hex = Field::with_bytes(Typed(DataType::Time), hex_text.as_bytes());
        assert_eq!(hex.time().unwrap(), Some(expected));

        let empty = Field::new(Typed(DataType::Time));
        assert_eq!(empty.time().unwrap(), None);

        let garbage = Field::with_bytes(Typed(DataType::Time), b"zzzzzzzz");
        assert_eq!(garbage.time().unwrap(), None);
    }

    #[test]
    fn test_time_out_of_range_rejected() {
        let mut field = Field::new(Typed(DataType::Time));
        let before_epoch = Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap();
        assert!(matches!(
            field.set_time(before_epoch),
            Err(PwsafeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_display_by_data_type() {
        let version = Field::with_bytes(Typed(DataType::Version), &[0x0D, 0x03]);
        assert_eq!(version.to_string(), "030D");
        let binary = Field::with_bytes(Typed(DataType::Binary), &[0xAB, 0x01]);
        assert_eq!(binary.to_string(), "0xAB01");
    }
}
