//! Document-level header fields.

use std::cmp::Ordering;

use crate::field::{DataType, Field, FieldType};

/// Version written into new documents (format 3.13).
pub const DEFAULT_VERSION: u16 = 0x030D;

/// Header field type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderType {
    Version,
    Uuid,
    NonDefaultPreferences,
    TreeDisplayStatus,
    TimestampOfLastSave,
    WhoPerformedLastSave,
    WhatPerformedLastSave,
    LastSavedByUser,
    LastSavedOnHost,
    DatabaseName,
    DatabaseDescription,
    DatabaseFilters,
    RecentlyUsedEntries,
    NamedPasswordPolicies,
    EmptyGroups,
    Yubico,
    /// Group terminator; never stored in a collection.
    EndOfEntry,
    /// A code this library does not know; kept so it round-trips.
    Other(u8),
}

impl From<u8> for HeaderType {
    fn from(code: u8) -> Self {
        match code {
            0x00 => HeaderType::Version,
            0x01 => HeaderType::Uuid,
            0x02 => HeaderType::NonDefaultPreferences,
            0x03 => HeaderType::TreeDisplayStatus,
            0x04 => HeaderType::TimestampOfLastSave,
            0x05 => HeaderType::WhoPerformedLastSave,
            0x06 => HeaderType::WhatPerformedLastSave,
            0x07 => HeaderType::LastSavedByUser,
            0x08 => HeaderType::LastSavedOnHost,
            0x09 => HeaderType::DatabaseName,
            0x0A => HeaderType::DatabaseDescription,
            0x0B => HeaderType::DatabaseFilters,
            0x0F => HeaderType::RecentlyUsedEntries,
            0x10 => HeaderType::NamedPasswordPolicies,
            0x11 => HeaderType::EmptyGroups,
            0x12 => HeaderType::Yubico,
            0xFF => HeaderType::EndOfEntry,
            other => HeaderType::Other(other),
        }
    }
}

impl From<HeaderType> for u8 {
    fn from(header_type: HeaderType) -> u8 {
        match header_type {
            HeaderType::Version => 0x00,
            HeaderType::Uuid => 0x01,
            HeaderType::NonDefaultPreferences => 0x02,
            HeaderType::TreeDisplayStatus => 0x03,
            HeaderType::TimestampOfLastSave => 0x04,
            HeaderType::WhoPerformedLastSave => 0x05,
            HeaderType::WhatPerformedLastSave => 0x06,
            HeaderType::LastSavedByUser => 0x07,
            HeaderType::LastSavedOnHost => 0x08,
            HeaderType::DatabaseName => 0x09,
            HeaderType::DatabaseDescription => 0x0A,
            HeaderType::DatabaseFilters => 0x0B,
            HeaderType::RecentlyUsedEntries => 0x0F,
            HeaderType::NamedPasswordPolicies => 0x10,
            HeaderType::EmptyGroups => 0x11,
            HeaderType::Yubico => 0x12,
            HeaderType::EndOfEntry => 0xFF,
            HeaderType::Other(code) => code,
        }
    }
}

impl FieldType for HeaderType {
    fn data_type(self) -> DataType {
        match self {
            HeaderType::Version => DataType::Version,
            HeaderType::Uuid => DataType::Uuid,
            HeaderType::NonDefaultPreferences
            | HeaderType::TreeDisplayStatus
            | HeaderType::WhoPerformedLastSave
            | HeaderType::WhatPerformedLastSave
            | HeaderType::LastSavedByUser
            | HeaderType::LastSavedOnHost
            | HeaderType::DatabaseName
            | HeaderType::DatabaseDescription
            | HeaderType::DatabaseFilters
            | HeaderType::RecentlyUsedEntries
            | HeaderType::NamedPasswordPolicies
            | HeaderType::EmptyGroups
            | HeaderType::Yubico => DataType::Text,
            HeaderType::TimestampOfLastSave => DataType::Time,
            HeaderType::EndOfEntry | HeaderType::Other(_) => DataType::Unknown,
        }
    }

    fn code(self) -> u8 {
        self.into()
    }

    fn default_data(self) -> &'static [u8] {
        const VERSION: [u8; 2] = DEFAULT_VERSION.to_le_bytes();
        match self {
            HeaderType::Version => &VERSION,
            _ => &[],
        }
    }
}

impl PartialOrd for HeaderType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeaderType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code())
    }
}

/// A header field.
pub type Header = Field<HeaderType>;
