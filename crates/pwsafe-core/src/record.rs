//! Per-entry record fields.

use std::cmp::Ordering;

use crate::field::{DataType, Field, FieldType};

/// Autotype sequence a fresh Autotype record starts with.
pub const DEFAULT_AUTOTYPE: &str = "\\u\\t\\p\\n";

/// Record field type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Uuid,
    Group,
    Title,
    UserName,
    Notes,
    Password,
    CreationTime,
    PasswordModificationTime,
    LastAccessTime,
    PasswordExpiryTime,
    LastModificationTime,
    Url,
    Autotype,
    PasswordHistory,
    PasswordPolicy,
    PasswordExpiryInterval,
    RunCommand,
    DoubleClickAction,
    EmailAddress,
    ProtectedEntry,
    OwnSymbolsForPassword,
    ShiftDoubleClickAction,
    PasswordPolicyName,
    EntryKeyboardShortcut,
    TwoFactorKey,
    CreditCardNumber,
    CreditCardExpiration,
    CreditCardVerificationValue,
    CreditCardPin,
    QRCode,
    /// Group terminator; never stored in a collection.
    EndOfEntry,
    /// A code this library does not know; kept so it round-trips.
    Other(u8),
}

impl RecordType {
    /// Times maintained by the library itself. Writing them does not count
    /// as a modification and reading them does not count as an access.
    pub fn is_auto_time(self) -> bool {
        matches!(
            self,
            RecordType::CreationTime
                | RecordType::LastAccessTime
                | RecordType::LastModificationTime
                | RecordType::PasswordModificationTime
        )
    }
}

impl From<u8> for RecordType {
    fn from(code: u8) -> Self {
        match code {
            0x01 => RecordType::Uuid,
            0x02 => RecordType::Group,
            0x03 => RecordType::Title,
            0x04 => RecordType::UserName,
            0x05 => RecordType::Notes,
            0x06 => RecordType::Password,
            0x07 => RecordType::CreationTime,
            0x08 => RecordType::PasswordModificationTime,
            0x09 => RecordType::LastAccessTime,
            0x0A => RecordType::PasswordExpiryTime,
            0x0C => RecordType::LastModificationTime,
            0x0D => RecordType::Url,
            0x0E => RecordType::Autotype,
            0x0F => RecordType::PasswordHistory,
            0x10 => RecordType::PasswordPolicy,
            0x11 => RecordType::PasswordExpiryInterval,
            0x12 => RecordType::RunCommand,
            0x13 => RecordType::DoubleClickAction,
            0x14 => RecordType::EmailAddress,
            0x15 => RecordType::ProtectedEntry,
            0x16 => RecordType::OwnSymbolsForPassword,
            0x17 => RecordType::ShiftDoubleClickAction,
            0x18 => RecordType::PasswordPolicyName,
            0x19 => RecordType::EntryKeyboardShortcut,
            0x1B => RecordType::TwoFactorKey,
            0x1C => RecordType::CreditCardNumber,
            0x1D => RecordType::CreditCardExpiration,
            0x1E => RecordType::CreditCardVerificationValue,
            0x1F => RecordType::CreditCardPin,
            0x20 => RecordType::QRCode,
            0xFF => RecordType::EndOfEntry,
            other => RecordType::Other(other),
        }
    }
}

impl From<RecordType> for u8 {
    fn from(record_type: RecordType) -> u8 {
        match record_type {
            RecordType::Uuid => 0x01,
            RecordType::Group => 0x02,
            RecordType::Title => 0x03,
            RecordType::UserName => 0x04,
            RecordType::Notes => 0x05,
            RecordType::Password => 0x06,
            RecordType::CreationTime => 0x07,
            RecordType::PasswordModificationTime => 0x08,
            RecordType::LastAccessTime => 0x09,
            RecordType::PasswordExpiryTime => 0x0A,
            RecordType::LastModificationTime => 0x0C,
            RecordType::Url => 0x0D,
            RecordType::Autotype => 0x0E,
            RecordType::PasswordHistory => 0x0F,
            RecordType::PasswordPolicy => 0x10,
            RecordType::PasswordExpiryInterval => 0x11,
            RecordType::RunCommand => 0x12,
            RecordType::DoubleClickAction => 0x13,
            RecordType::EmailAddress => 0x14,
            RecordType::ProtectedEntry => 0x15,
            RecordType::OwnSymbolsForPassword => 0x16,
            RecordType::ShiftDoubleClickAction => 0x17,
            RecordType::PasswordPolicyName => 0x18,
            RecordType::EntryKeyboardShortcut => 0x19,
            RecordType::TwoFactorKey => 0x1B,
            RecordType::CreditCardNumber => 0x1C,
            RecordType::CreditCardExpiration => 0x1D,
            RecordType::CreditCardVerificationValue => 0x1E,
            RecordType::CreditCardPin => 0x1F,
            RecordType::QRCode => 0x20,
            RecordType::EndOfEntry => 0xFF,
            RecordType::Other(code) => code,
        }
    }
}

impl FieldType for RecordType {
    fn data_type(self) -> DataType {
        match self {
            RecordType::Uuid => DataType::Uuid,
            RecordType::Group
            | RecordType::Title
            | RecordType::UserName
            | RecordType::Notes
            | RecordType::Password
            | RecordType::Url
            | RecordType::Autotype
            | RecordType::PasswordHistory
            | RecordType::PasswordPolicy
            | RecordType::RunCommand
            | RecordType::EmailAddress
            | RecordType::OwnSymbolsForPassword
            | RecordType::PasswordPolicyName
            | RecordType::CreditCardNumber
            | RecordType::CreditCardExpiration
            | RecordType::CreditCardVerificationValue
            | RecordType::CreditCardPin
            | RecordType::QRCode => DataType::Text,
            RecordType::CreationTime
            | RecordType::PasswordModificationTime
            | RecordType::LastAccessTime
            | RecordType::PasswordExpiryTime
            | RecordType::LastModificationTime => DataType::Time,
            RecordType::TwoFactorKey => DataType::Binary,
            _ => DataType::Unknown,
        }
    }

    fn code(self) -> u8 {
        self.into()
    }

    fn default_data(self) -> &'static [u8] {
        match self {
            RecordType::Autotype => DEFAULT_AUTOTYPE.as_bytes(),
            _ => &[],
        }
    }
}

impl PartialOrd for RecordType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code())
    }
}

/// A record field.
pub type Record = Field<RecordType>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in 0u8..=255 {
            assert_eq!(u8::from(RecordType::from(code)), code);
        }
        assert_eq!(RecordType::from(0x0B), RecordType::Other(0x0B));
    }

    #[test]
    fn test_new_autotype_has_default_sequence() {
        let record = Record::new(RecordType::Autotype);
        assert_eq!(record.text().unwrap(), "\\u\\t\\p\\n");
        assert_eq!(Record::new(RecordType::Notes).len(), 0);
    }

    #[test]
    fn test_auto_time_types() {
        assert!(RecordType::CreationTime.is_auto_time());
        assert!(RecordType::LastAccessTime.is_auto_time());
        assert!(!RecordType::PasswordExpiryTime.is_auto_time());
        assert!(!RecordType::Password.is_auto_time());
    }

    #[test]
    fn test_two_factor_key_is_binary() {
        assert_eq!(RecordType::TwoFactorKey.data_type(), DataType::Binary);
        assert_eq!(RecordType::Other(0x40).data_type(), DataType::Unknown);
    }
}
