//! Previous passwords of an entry.
//!
//! The history lives in the entry's PasswordHistory record as one string:
//!
//! ```text
//! 1 05 02 5a0b3c1d 0003 abc 5a0b4e00 0004 abcd
//! ^ ^^ ^^ ^^^^^^^^ ^^^^ ^^^
//! | |  |  |        |    password
//! | |  |  |        length (characters)
//! | |  |  first used (unix seconds)
//! | |  item count
//! | maximum count
//! enabled ('0' is off)
//! ```
//!
//! (spaces added for readability; the stored form has none). Parsing stops at
//! the first malformed item and keeps what was read up to that point.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::crypto::ProtectedBytes;
use crate::error::{PwsafeError, Result};
use crate::hex_text::{char_len, HexReader};
use crate::record::RecordType;
use crate::record_collection::RecordCollection;

/// Maximum count used when none is stored.
pub const DEFAULT_MAXIMUM_COUNT: usize = 3;

/// A password the entry used before.
#[derive(Clone, Debug)]
pub struct PasswordHistoryItem {
    time_first_used: DateTime<Utc>,
    password: ProtectedBytes,
}

impl PasswordHistoryItem {
    pub fn new(time_first_used: DateTime<Utc>, password: &str) -> Self {
        Self {
            time_first_used,
            password: ProtectedBytes::seal(password.as_bytes()),
        }
    }

    pub fn time_first_used(&self) -> DateTime<Utc> {
        self.time_first_used
    }

    pub fn historical_password(&self) -> Zeroizing<String> {
        Zeroizing::new(String::from_utf8_lossy(&self.password.open()).into_owned())
    }
}

/// Decoded password history.
#[derive(Clone, Debug)]
pub struct PasswordHistory {
    enabled: bool,
    maximum_count: usize,
    items: Vec<PasswordHistoryItem>,
}

impl Default for PasswordHistory {
    fn default() -> Self {
        Self {
            enabled: false,
            maximum_count: DEFAULT_MAXIMUM_COUNT,
            items: Vec::new(),
        }
    }
}

impl PasswordHistory {
    /// Decode the stored form. Text shorter than the fixed prefix yields a
    /// disabled, empty history.
    pub fn parse(text: &str) -> Self {
        let mut history = Self::default();
        if char_len(text) < 5 {
            return history;
        }

        let mut reader = HexReader::new(text);
        history.enabled = reader.take(1) != Some("0");
        history.maximum_count = match reader.hex(2) {
            Some(count) if count > 0 => count as usize,
            Some(_) => DEFAULT_MAXIMUM_COUNT,
            None => {
                // skip the unreadable value and keep the default
                reader.take(2);
                DEFAULT_MAXIMUM_COUNT
            }
        };

        let Some(count) = reader.hex(2) else {
            return history;
        };
        for _ in 0..count {
            let Some(seconds) = reader.hex(8) else {
                break;
            };
            let Some(password) = reader.prefixed(4) else {
                break;
            };
            let time = DateTime::from_timestamp(i64::from(seconds), 0).unwrap_or_default();
            history
                .items
                .push(PasswordHistoryItem::new(time, password));
        }
        history
    }

    /// Encode into the stored form.
    pub fn to_text(&self) -> Zeroizing<String> {
        let mut text = Zeroizing::new(String::new());
        text.push(if self.enabled { '1' } else { '0' });
        text.push_str(&format!("{:02x}", self.maximum_count));
        text.push_str(&format!("{:02x}", self.items.len()));
        for item in &self.items {
            let seconds = item.time_first_used.timestamp().clamp(0, i64::from(u32::MAX));
            let password = item.historical_password();
            text.push_str(&format!("{:08x}", seconds));
            text.push_str(&format!("{:04x}", char_len(&password)));
            text.push_str(&password);
        }
        text
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn history on or off. Turning it off drops every stored password.
    /// Returns whether anything changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        if !enabled {
            self.items.clear();
        }
        true
    }

    pub fn maximum_count(&self) -> usize {
        self.maximum_count
    }

    /// Returns whether anything changed. Stored items beyond the new limit
    /// are only evicted on the next insert.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `1 <= count <= 255`.
    pub fn set_maximum_count(&mut self, count: usize) -> Result<bool> {
        if !(1..=255).contains(&count) {
            return Err(PwsafeError::InvalidArgument(
                "Maximum count must be between 1 and 255".to_string(),
            ));
        }
        if self.maximum_count == count {
            return Ok(false);
        }
        self.maximum_count = count;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PasswordHistoryItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PasswordHistoryItem> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Append a password, evicting the oldest beyond the maximum count.
    /// Does nothing (and returns false) when history is disabled or the
    /// password is empty.
    pub fn add_password(&mut self, time: DateTime<Utc>, password: &str) -> bool {
        if !self.enabled || password.is_empty() {
            return false;
        }
        self.items.push(PasswordHistoryItem::new(time, password));
        if self.items.len() > self.maximum_count {
            let excess = self.items.len() - self.maximum_count;
            self.items.drain(..excess);
        }
        true
    }
}

/// Editable password history of one entry.
///
/// Every change is written back to the PasswordHistory record right away.
pub struct PasswordHistoryCollection<'a> {
    records: &'a mut RecordCollection,
    history: PasswordHistory,
}

impl<'a> PasswordHistoryCollection<'a> {
    pub(crate) fn new(records: &'a mut RecordCollection) -> Self {
        let history = records.password_history();
        Self { records, history }
    }

    fn store(&mut self) -> Result<()> {
        self.records.store_password_history(&self.history)
    }

    pub fn is_enabled(&self) -> bool {
        self.history.is_enabled()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if self.history.set_enabled(enabled) {
            self.store()?;
        }
        Ok(())
    }

    pub fn maximum_count(&self) -> usize {
        self.history.maximum_count()
    }

    pub fn set_maximum_count(&mut self, count: usize) -> Result<()> {
        if self.history.set_maximum_count(count)? {
            self.store()?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.history.clear();
        self.store()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PasswordHistoryItem> {
        self.history.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PasswordHistoryItem> {
        self.history.iter()
    }
}

impl RecordCollection {
    /// Decoded history, or a disabled empty one when the record is missing.
    pub(crate) fn password_history(&self) -> PasswordHistory {
        match self.find(RecordType::PasswordHistory) {
            Some(record) => PasswordHistory::parse(&Zeroizing::new(
                record.text().unwrap_or_default(),
            )),
            None => PasswordHistory::default(),
        }
    }

    pub(crate) fn store_password_history(&mut self, history: &PasswordHistory) -> Result<()> {
        self.get_or_insert(RecordType::PasswordHistory)?
            .set_text(&history.to_text())
    }
}
