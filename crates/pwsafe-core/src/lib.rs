//! # Pwsafe Core
//!
//! Reading and writing Password Safe v3 (`.psafe3`) databases.
//!
//! This crate holds the document model and the file engine, independent of
//! the CLI.
//!
//! ## Architecture
//!
//! - **document**: load/save, document properties and the passphrase
//! - **storage**: PWS3 framing, field stream reader and writer
//! - **crypto**: key stretching, Twofish key wrap and body cipher, in-memory
//!   sealing of secrets
//! - **field**, **header**, **record**: typed fields
//! - **header_collection**, **record_collection**, **entry**,
//!   **entry_collection**: the document tree and its change tracking
//! - **password_history**, **password_policy**, **named_password_policy**:
//!   structured values stored inside text fields
//! - **autotype**, **group_path**: entry helpers
//!
//! ## Example
//!
//! ```no_run
//! use pwsafe_core::{Document, Entry};
//!
//! # fn main() -> pwsafe_core::Result<()> {
//! let mut document = Document::with_passphrase("correct horse");
//! let mut entry = Entry::with_title("Mail");
//! entry.set_password("hunter2")?;
//! document.entries_mut().push(entry)?;
//! document.save_to_path("personal.psafe3")?;
//!
//! let document = Document::open("personal.psafe3", "correct horse")?;
//! assert_eq!(document.entries().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod autotype;
pub mod crypto;
pub mod document;
pub mod entry;
pub mod entry_collection;
pub mod error;
pub mod field;
pub mod fs;
pub mod group_path;
pub mod header;
pub mod header_collection;
mod hex_text;
pub mod named_password_policy;
mod owner;
pub mod password_history;
pub mod password_policy;
pub mod record;
pub mod record_collection;
pub mod storage;

pub use autotype::{AutotypeToken, AutotypeTokenKind};
pub use document::Document;
pub use entry::Entry;
pub use entry_collection::{EntryCollection, EntryMut};
pub use error::{PwsafeError, Result};
pub use field::{DataType, Field, FieldType};
pub use group_path::GroupPath;
pub use header::{Header, HeaderType};
pub use header_collection::{HeaderCollection, HeaderMut};
pub use named_password_policy::{NamedPasswordPolicy, NamedPasswordPolicyCollection};
pub use password_history::{PasswordHistory, PasswordHistoryCollection, PasswordHistoryItem};
pub use password_policy::{PasswordPolicy, PasswordPolicyStyle};
pub use record::{Record, RecordType};
pub use record_collection::{RecordCollection, RecordMut};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
