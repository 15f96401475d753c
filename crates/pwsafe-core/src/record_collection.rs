//! Records of one entry, with modification and access tracking.
//!
//! While the entry belongs to a document that tracks modifications, any
//! write to a record other than the automatic times stamps the entry:
//! CreationTime the first time, LastModificationTime afterwards, and
//! PasswordModificationTime as well when the password changes. Reads of
//! anything but the identifying fields (Uuid, Group, Title) and the
//! automatic times stamp LastAccessTime when access tracking is on.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::{PwsafeError, Result};
use crate::field::encode_time;
use crate::owner::Owner;
use crate::record::{Record, RecordType};

/// Record fields of one entry.
#[derive(Debug, Default)]
pub struct RecordCollection {
    owner: Owner,
    records: Vec<Record>,
}

impl Clone for RecordCollection {
    /// Deep copy that belongs to no document.
    fn clone(&self) -> Self {
        Self {
            owner: Owner::detached(),
            records: self.records.clone(),
        }
    }
}

impl RecordCollection {
    pub(crate) fn from_records(mut records: Vec<Record>) -> Self {
        records.retain(|record| record.field_type() != RecordType::EndOfEntry);
        Self {
            owner: Owner::detached(),
            records,
        }
    }

    pub(crate) fn set_owner(&mut self, owner: Owner) {
        self.owner = owner;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.owner.is_read_only()
    }

    /// Iterate without touching access times.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// First record of the given type, read silently.
    pub fn find(&self, record_type: RecordType) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.field_type() == record_type)
    }

    pub fn contains(&self, record_type: RecordType) -> bool {
        self.position(record_type).is_some()
    }

    fn position(&self, record_type: RecordType) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.field_type() == record_type)
    }

    /// The record of the given type, or a detached empty one. Never inserts.
    pub fn get_or_default(&self, record_type: RecordType) -> Cow<'_, Record> {
        match self.find(record_type) {
            Some(record) => Cow::Borrowed(record),
            None => Cow::Owned(Record::new(record_type)),
        }
    }

    /// Writable handle to the record of the given type, creating it at its
    /// sorted position when missing.
    ///
    /// # Errors
    ///
    /// `ReadOnly` if the record is missing and the document is read-only;
    /// `InvalidArgument` for `EndOfEntry`.
    pub fn get_or_insert(&mut self, record_type: RecordType) -> Result<RecordMut<'_>> {
        reject_end_of_entry(record_type)?;
        if !self.contains(record_type) {
            self.ensure_writable()?;
            self.insert_sorted(record_type);
        }
        Ok(RecordMut {
            collection: self,
            record_type,
            ordinal: 0,
        })
    }

    /// Writable handle to the record at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<RecordMut<'_>> {
        let record_type = self.records.get(index)?.field_type();
        let ordinal = self.records[..index]
            .iter()
            .filter(|record| record.field_type() == record_type)
            .count();
        Some(RecordMut {
            collection: self,
            record_type,
            ordinal,
        })
    }

    fn insert_sorted(&mut self, record_type: RecordType) -> usize {
        let index = self
            .records
            .iter()
            .position(|record| record.field_type() > record_type)
            .unwrap_or(self.records.len());
        self.records.insert(index, Record::new(record_type));
        index
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(PwsafeError::ReadOnly);
        }
        Ok(())
    }

    pub fn push(&mut self, record: Record) -> Result<()> {
        self.ensure_writable()?;
        reject_end_of_entry(record.field_type())?;
        let record_type = record.field_type();
        self.records.push(record);
        self.mark_as_changed(record_type)
    }

    pub fn insert(&mut self, index: usize, record: Record) -> Result<()> {
        self.ensure_writable()?;
        reject_end_of_entry(record.field_type())?;
        if index > self.records.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        let record_type = record.field_type();
        self.records.insert(index, record);
        self.mark_as_changed(record_type)
    }

    /// Replace the record at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, record: Record) -> Result<Record> {
        self.ensure_writable()?;
        reject_end_of_entry(record.field_type())?;
        if index >= self.records.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        let record_type = record.field_type();
        let old = std::mem::replace(&mut self.records[index], record);
        self.mark_as_changed(record_type)?;
        Ok(old)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Record> {
        self.ensure_writable()?;
        if index >= self.records.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        let removed = self.records.remove(index);
        self.mark_as_changed(removed.field_type())?;
        Ok(removed)
    }

    /// Remove the first record of the given type. Returns whether one was
    /// found.
    pub fn remove(&mut self, record_type: RecordType) -> Result<bool> {
        self.ensure_writable()?;
        match self.position(record_type) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.records.clear();
        self.owner.mark_changed();
        Ok(())
    }

    // Tracked shortcuts used by Entry. Missing records read as empty and are
    // not created by a read.

    pub(crate) fn text(&mut self, record_type: RecordType) -> Result<String> {
        let text = self.get_or_default(record_type).text()?;
        self.mark_as_accessed(record_type)?;
        Ok(text)
    }

    pub(crate) fn bytes(&mut self, record_type: RecordType) -> Result<Zeroizing<Vec<u8>>> {
        let bytes = self.get_or_default(record_type).bytes();
        self.mark_as_accessed(record_type)?;
        Ok(bytes)
    }

    pub(crate) fn time(&mut self, record_type: RecordType) -> Result<Option<DateTime<Utc>>> {
        let time = self.get_or_default(record_type).time()?;
        self.mark_as_accessed(record_type)?;
        Ok(time)
    }

    pub(crate) fn set_text(&mut self, record_type: RecordType, text: &str) -> Result<()> {
        self.get_or_insert(record_type)?.set_text(text)
    }

    pub(crate) fn set_bytes(&mut self, record_type: RecordType, bytes: &[u8]) -> Result<()> {
        self.get_or_insert(record_type)?.set_bytes(bytes)
    }

    pub(crate) fn set_time(&mut self, record_type: RecordType, time: DateTime<Utc>) -> Result<()> {
        self.get_or_insert(record_type)?.set_time(time)
    }

    /// Notify the document and apply the timestamp rules for a change to
    /// `record_type`.
    pub(crate) fn mark_as_changed(&mut self, record_type: RecordType) -> Result<()> {
        self.owner.mark_changed();

        if self.records.is_empty()
            || self.owner.is_read_only()
            || !self.owner.tracks_modify()
            || record_type.is_auto_time()
        {
            return Ok(());
        }

        let now = Utc::now();
        if self.contains(RecordType::CreationTime) {
            self.stamp(RecordType::LastModificationTime, now)?;
        } else {
            self.stamp(RecordType::CreationTime, now)?;
        }
        if record_type == RecordType::Password {
            self.stamp(RecordType::PasswordModificationTime, now)?;
        }
        Ok(())
    }

    /// Apply the access rule for a read of `record_type`.
    pub(crate) fn mark_as_accessed(&mut self, record_type: RecordType) -> Result<()> {
        if self.owner.is_read_only() || !self.owner.tracks_access() {
            return Ok(());
        }
        match record_type {
            RecordType::Uuid | RecordType::Group | RecordType::Title => Ok(()),
            t if t.is_auto_time() => Ok(()),
            _ => self.stamp(RecordType::LastAccessTime, Utc::now()),
        }
    }

    /// Set the automatic time `record_type` to `now`, adding the record when
    /// missing. Nothing is added when `now` cannot be stored.
    fn stamp(&mut self, record_type: RecordType, now: DateTime<Utc>) -> Result<()> {
        encode_time(now)?;
        let index = match self.position(record_type) {
            Some(index) => index,
            None => self.insert_sorted(record_type),
        };
        if self.records[index].set_time(now)? {
            self.owner.mark_changed();
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn reject_end_of_entry(record_type: RecordType) -> Result<()> {
    if record_type == RecordType::EndOfEntry {
        return Err(PwsafeError::InvalidArgument(
            "End-of-entry marker cannot be stored".to_string(),
        ));
    }
    Ok(())
}

/// Writable, tracked view of one record inside its collection.
///
/// Reads stamp the access time and writes stamp the modification times as
/// described in the module docs. Writing a Password record first moves the
/// current password into the history when history is enabled.
pub struct RecordMut<'a> {
    collection: &'a mut RecordCollection,
    record_type: RecordType,
    // n-th record of this type; automatic stamps may shift raw indices
    ordinal: usize,
}

impl RecordMut<'_> {
    fn index(&self) -> usize {
        self.collection
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.field_type() == self.record_type)
            .nth(self.ordinal)
            .map(|(index, _)| index)
            .unwrap_or_default()
    }

    /// The record itself, read silently.
    pub fn record(&self) -> &Record {
        &self.collection.records[self.index()]
    }

    fn read<T>(&mut self, read: impl FnOnce(&Record) -> Result<T>) -> Result<T> {
        let value = read(self.record())?;
        self.collection.mark_as_accessed(self.record_type)?;
        Ok(value)
    }

    fn write(&mut self, apply: impl FnOnce(&mut Record) -> Result<bool>) -> Result<()> {
        self.collection.ensure_writable()?;
        let index = self.index();
        if apply(&mut self.collection.records[index])? {
            self.collection.mark_as_changed(self.record_type)?;
        }
        Ok(())
    }

    pub fn field_type(&self) -> RecordType {
        self.record_type
    }

    pub fn bytes(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        self.read(|record| Ok(record.bytes()))
    }

    pub fn uuid(&mut self) -> Result<Option<Uuid>> {
        self.read(|record| record.uuid())
    }

    pub fn text(&mut self) -> Result<String> {
        self.read(|record| record.text())
    }

    pub fn time(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.read(|record| record.time())
    }

    pub fn set_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(|record| Ok(record.set_bytes(bytes)))
    }

    pub fn set_uuid(&mut self, uuid: Uuid) -> Result<()> {
        self.write(|record| record.set_uuid(uuid))
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.collection.ensure_writable()?;
        if self.record_type == RecordType::Password {
            self.capture_password_history(text)?;
        }
        self.write(|record| record.set_text(text))
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.write(|record| record.set_time(time))
    }

    fn capture_password_history(&mut self, new_password: &str) -> Result<()> {
        if !self.collection.contains(RecordType::PasswordHistory) {
            return Ok(());
        }
        let current = Zeroizing::new(self.record().text()?);
        if current.as_str() == new_password {
            return Ok(());
        }

        let mut history = self.collection.password_history();
        let time = self
            .collection
            .find(RecordType::PasswordModificationTime)
            .and_then(|record| record.time().ok().flatten())
            .unwrap_or_else(Utc::now);
        if history.add_password(time, &current) {
            self.collection.store_password_history(&history)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::DocumentState;
    use std::sync::Arc;

    fn attached(records: Vec<Record>) -> (Arc<DocumentState>, RecordCollection) {
        let state = DocumentState::new();
        let mut collection = RecordCollection::from_records(records);
        collection.set_owner(Owner::attached(&state));
        (state, collection)
    }

    #[test]
    fn test_sorted_insert_keeps_existing_order() {
        let mut records = RecordCollection::from_records(vec![
            Record::new(RecordType::Password),
            Record::new(RecordType::Title),
        ]);
        records.get_or_insert(RecordType::UserName).unwrap();
        records.get_or_insert(RecordType::Uuid).unwrap();
        let types: Vec<_> = records.iter().map(|r| r.field_type()).collect();
        assert_eq!(
            types,
            vec![
                RecordType::Uuid,
                RecordType::Password,
                RecordType::Title,
                RecordType::UserName
            ]
        );
    }

    #[test]
    fn test_detached_writes_do_not_stamp() {
        let mut records = RecordCollection::from_records(vec![Record::new(RecordType::Title)]);
        records.set_text(RecordType::Notes, "hello").unwrap();
        assert!(!records.contains(RecordType::CreationTime));
        assert_eq!(records.text(RecordType::Notes).unwrap(), "hello");
        assert!(!records.contains(RecordType::LastAccessTime));
    }

    #[test]
    fn test_first_change_sets_creation_time_once() {
        let (state, mut records) = attached(vec![Record::new(RecordType::Title)]);
        records.set_text(RecordType::Title, "Site").unwrap();
        assert!(state.has_changed());
        let created = records.find(RecordType::CreationTime).unwrap().time().unwrap();
        assert!(created.is_some());
        assert!(!records.contains(RecordType::LastModificationTime));

        records.set_text(RecordType::UserName, "me").unwrap();
        assert!(records.contains(RecordType::LastModificationTime));
        assert_eq!(
            records.find(RecordType::CreationTime).unwrap().time().unwrap(),
            created
        );
    }

    #[test]
    fn test_password_change_stamps_password_time() {
        let (_state, mut records) = attached(vec![Record::new(RecordType::Title)]);
        records.set_text(RecordType::Password, "abc").unwrap();
        assert!(records.contains(RecordType::PasswordModificationTime));
    }

    #[test]
    fn test_track_modify_off() {
        let (state, mut records) = attached(vec![Record::new(RecordType::Title)]);
        state.set_track_modify(false);
        records.set_text(RecordType::Notes, "x").unwrap();
        assert!(state.has_changed());
        assert!(!records.contains(RecordType::CreationTime));
    }

    #[test]
    fn test_access_tracking_exemptions() {
        let (_state, mut records) = attached(vec![
            Record::new(RecordType::Title),
            Record::new(RecordType::UserName),
        ]);
        records.text(RecordType::Title).unwrap();
        assert!(!records.contains(RecordType::LastAccessTime));

        records.text(RecordType::UserName).unwrap();
        assert!(records.contains(RecordType::LastAccessTime));
    }

    #[test]
    fn test_read_does_not_create_record() {
        let (_state, mut records) = attached(vec![Record::new(RecordType::Title)]);
        assert_eq!(records.text(RecordType::Url).unwrap(), "");
        assert!(!records.contains(RecordType::Url));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let (state, mut records) = attached(vec![Record::with_bytes(RecordType::Title, b"t")]);
        state.set_read_only(true);
        assert!(matches!(
            records.set_text(RecordType::Title, "x"),
            Err(PwsafeError::ReadOnly)
        ));
        assert!(matches!(
            records.get_or_insert(RecordType::Notes),
            Err(PwsafeError::ReadOnly)
        ));
        // reads still work and leave no trace
        assert_eq!(records.text(RecordType::Notes).unwrap(), "");
        assert!(!records.contains(RecordType::LastAccessTime));
    }

    #[test]
    fn test_handle_survives_stamp_insertions() {
        let (_state, mut records) = attached(vec![
            Record::new(RecordType::Title),
            Record::new(RecordType::Url),
        ]);
        let mut url = records.get_or_insert(RecordType::Url).unwrap();
        url.set_text("https://example.com").unwrap();
        url.set_text("https://example.org").unwrap();
        assert_eq!(url.text().unwrap(), "https://example.org");
    }

    #[test]
    fn test_password_history_capture() {
        let (_state, mut records) = attached(vec![
            Record::with_bytes(RecordType::Password, b"first"),
            Record::with_bytes(RecordType::PasswordHistory, b"10300"),
        ]);
        records.set_text(RecordType::Password, "second").unwrap();
        records.set_text(RecordType::Password, "second").unwrap();
        records.set_text(RecordType::Password, "third").unwrap();

        let history = records.password_history();
        let passwords: Vec<String> = history
            .iter()
            .map(|item| item.historical_password().to_string())
            .collect();
        assert_eq!(passwords, vec!["first", "second"]);
    }

    #[test]
    fn test_clone_is_detached() {
        let (state, records) = attached(vec![Record::new(RecordType::Title)]);
        let mut copy = records.clone();
        copy.set_text(RecordType::Title, "copy").unwrap();
        assert!(!state.has_changed());
        assert!(!copy.contains(RecordType::CreationTime));
    }

    #[test]
    fn test_unstorable_stamp_is_reported() {
        use chrono::TimeZone;

        let (state, mut records) = attached(vec![Record::new(RecordType::Title)]);
        let too_late = Utc.with_ymd_and_hms(2200, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            records.stamp(RecordType::LastAccessTime, too_late),
            Err(PwsafeError::InvalidArgument(_))
        ));
        assert!(!records.contains(RecordType::LastAccessTime));
        assert!(!state.has_changed());

        let now = Utc::now();
        records.stamp(RecordType::LastAccessTime, now).unwrap();
        assert!(state.has_changed());
        assert_eq!(
            records.find(RecordType::LastAccessTime).unwrap().time().unwrap(),
            Some(Utc.timestamp_opt(now.timestamp(), 0).unwrap())
        );
    }

    #[test]
    fn test_end_of_entry_rejected() {
        let mut records = RecordCollection::default();
        assert!(records.push(Record::new(RecordType::EndOfEntry)).is_err());
    }
}
