//! Ordered header fields of a document.
//!
//! Index 0 always holds the Version header. Lookups by type return the first
//! match; `get_or_insert` creates a missing header at its type-sorted
//! position without moving existing ones.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::{PwsafeError, Result};
use crate::header::{Header, HeaderType};
use crate::owner::Owner;

/// Header fields of one document.
#[derive(Debug)]
pub struct HeaderCollection {
    owner: Owner,
    headers: Vec<Header>,
}

impl HeaderCollection {
    /// Build from parsed headers. An existing Version header is moved to the
    /// front, or a default one is inserted.
    pub(crate) fn from_headers(owner: Owner, mut headers: Vec<Header>) -> Self {
        headers.retain(|header| header.field_type() != HeaderType::EndOfEntry);
        match headers
            .iter()
            .position(|header| header.field_type() == HeaderType::Version)
        {
            Some(0) => {}
            Some(index) => {
                let version = headers.remove(index);
                headers.insert(0, version);
            }
            None => headers.insert(0, Header::new(HeaderType::Version)),
        }
        Self { owner, headers }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Always false; the Version header cannot be removed.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.owner.is_read_only()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.headers.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Header> {
        self.headers.get(index)
    }

    /// First header of the given type.
    pub fn find(&self, header_type: HeaderType) -> Option<&Header> {
        self.headers
            .iter()
            .find(|header| header.field_type() == header_type)
    }

    pub fn contains(&self, header_type: HeaderType) -> bool {
        self.position(header_type).is_some()
    }

    fn position(&self, header_type: HeaderType) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.field_type() == header_type)
    }

    /// The header of the given type, or a detached empty one. Never inserts.
    pub fn get_or_default(&self, header_type: HeaderType) -> Cow<'_, Header> {
        match self.find(header_type) {
            Some(header) => Cow::Borrowed(header),
            None => Cow::Owned(Header::new(header_type)),
        }
    }

    /// Writable handle to the header of the given type, creating it at its
    /// sorted position when missing. Creating a header alone does not mark
    /// the document as changed.
    ///
    /// # Errors
    ///
    /// `ReadOnly` if the header is missing and the document is read-only;
    /// `InvalidArgument` for `EndOfEntry`.
    pub fn get_or_insert(&mut self, header_type: HeaderType) -> Result<HeaderMut<'_>> {
        reject_end_of_entry(header_type)?;
        let index = match self.position(header_type) {
            Some(index) => index,
            None => {
                if self.is_read_only() {
                    return Err(PwsafeError::ReadOnly);
                }
                let index = self
                    .headers
                    .iter()
                    .position(|header| header.field_type() > header_type)
                    .unwrap_or(self.headers.len());
                self.headers.insert(index, Header::new(header_type));
                index
            }
        };
        Ok(HeaderMut {
            collection: self,
            index,
        })
    }

    /// Writable handle to the header at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<HeaderMut<'_>> {
        if index >= self.headers.len() {
            return None;
        }
        Some(HeaderMut {
            collection: self,
            index,
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(PwsafeError::ReadOnly);
        }
        Ok(())
    }

    /// Append a header.
    pub fn push(&mut self, header: Header) -> Result<()> {
        self.ensure_writable()?;
        reject_end_of_entry(header.field_type())?;
        self.headers.push(header);
        self.owner.mark_changed();
        Ok(())
    }

    /// Insert a header at `index`. Only a Version header may go to index 0.
    pub fn insert(&mut self, index: usize, header: Header) -> Result<()> {
        self.ensure_writable()?;
        reject_end_of_entry(header.field_type())?;
        if index > self.headers.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        if index == 0 && header.field_type() != HeaderType::Version {
            return Err(PwsafeError::InvalidArgument(
                "Version must be the first field".to_string(),
            ));
        }
        self.headers.insert(index, header);
        self.owner.mark_changed();
        Ok(())
    }

    /// Replace the header at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, header: Header) -> Result<Header> {
        self.ensure_writable()?;
        reject_end_of_entry(header.field_type())?;
        if index >= self.headers.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        if index == 0 && header.field_type() != HeaderType::Version {
            return Err(PwsafeError::InvalidArgument(
                "Version must be the first field".to_string(),
            ));
        }
        let old = std::mem::replace(&mut self.headers[index], header);
        self.owner.mark_changed();
        Ok(old)
    }

    /// Remove the header at `index`. The first Version header stays.
    pub fn remove_at(&mut self, index: usize) -> Result<Header> {
        self.ensure_writable()?;
        if index == 0 {
            return Err(PwsafeError::InvalidArgument(
                "Cannot remove the first version field".to_string(),
            ));
        }
        if index >= self.headers.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        let removed = self.headers.remove(index);
        self.owner.mark_changed();
        Ok(removed)
    }

    /// Remove the first header of the given type. Returns whether one was
    /// found.
    pub fn remove(&mut self, header_type: HeaderType) -> Result<bool> {
        self.ensure_writable()?;
        match self.position(header_type) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Remove every header except the leading Version.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.headers.truncate(1);
        self.owner.mark_changed();
        Ok(())
    }

    // Shortcuts for the document properties. Header reads are never tracked.

    pub(crate) fn text(&self, header_type: HeaderType) -> Result<String> {
        self.get_or_default(header_type).text()
    }

    pub(crate) fn time(&self, header_type: HeaderType) -> Result<Option<DateTime<Utc>>> {
        self.get_or_default(header_type).time()
    }

    pub(crate) fn set_text(&mut self, header_type: HeaderType, text: &str) -> Result<()> {
        self.get_or_insert(header_type)?.set_text(text)
    }

    pub(crate) fn set_time(&mut self, header_type: HeaderType, time: DateTime<Utc>) -> Result<()> {
        self.get_or_insert(header_type)?.set_time(time)
    }
}

impl<'a> IntoIterator for &'a HeaderCollection {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

fn reject_end_of_entry(header_type: HeaderType) -> Result<()> {
    if header_type == HeaderType::EndOfEntry {
        return Err(PwsafeError::InvalidArgument(
            "End-of-entry marker cannot be stored".to_string(),
        ));
    }
    Ok(())
}

/// Writable view of one header inside its collection.
///
/// Setters refuse to run while the document is read-only and mark the
/// document as changed when the stored bytes actually change.
pub struct HeaderMut<'a> {
    collection: &'a mut HeaderCollection,
    index: usize,
}

impl HeaderMut<'_> {
    fn header(&self) -> &Header {
        &self.collection.headers[self.index]
    }

    fn write(&mut self, apply: impl FnOnce(&mut Header) -> Result<bool>) -> Result<()> {
        self.collection.ensure_writable()?;
        if apply(&mut self.collection.headers[self.index])? {
            self.collection.owner.mark_changed();
        }
        Ok(())
    }

    pub fn field_type(&self) -> HeaderType {
        self.header().field_type()
    }

    pub fn bytes(&self) -> Zeroizing<Vec<u8>> {
        self.header().bytes()
    }

    pub fn version(&self) -> Result<Option<u16>> {
        self.header().version()
    }

    pub fn uuid(&self) -> Result<Option<Uuid>> {
        self.header().uuid()
    }

    pub fn text(&self) -> Result<String> {
        self.header().text()
    }

    pub fn time(&self) -> Result<Option<DateTime<Utc>>> {
        self.header().time()
    }

    pub fn set_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(|header| Ok(header.set_bytes(bytes)))
    }

    pub fn set_version(&mut self, version: u16) -> Result<()> {
        self.write(|header| header.set_version(version))
    }

    pub fn set_uuid(&mut self, uuid: Uuid) -> Result<()> {
        self.write(|header| header.set_uuid(uuid))
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.write(|header| header.set_text(text))
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.write(|header| header.set_time(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::DEFAULT_VERSION;
    use crate::owner::DocumentState;

    fn attached() -> (std::sync::Arc<DocumentState>, HeaderCollection) {
        let state = DocumentState::new();
        let headers = HeaderCollection::from_headers(Owner::attached(&state), Vec::new());
        (state, headers)
    }

    #[test]
    fn test_version_inserted_when_missing() {
        let headers = HeaderCollection::from_headers(
            Owner::detached(),
            vec![Header::with_bytes(HeaderType::DatabaseName, b"db")],
        );
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get(0).unwrap().field_type(), HeaderType::Version);
        assert_eq!(
            headers.get(0).unwrap().version().unwrap(),
            Some(DEFAULT_VERSION)
        );
    }

    #[test]
    fn test_version_moved_to_front() {
        let headers = HeaderCollection::from_headers(
            Owner::detached(),
            vec![
                Header::with_bytes(HeaderType::DatabaseName, b"db"),
                Header::with_bytes(HeaderType::Version, &[0x00, 0x03]),
            ],
        );
        let types: Vec<_> = headers.iter().map(|h| h.field_type()).collect();
        assert_eq!(types, vec![HeaderType::Version, HeaderType::DatabaseName]);
        assert_eq!(headers.get(0).unwrap().version().unwrap(), Some(0x0300));
    }

    #[test]
    fn test_get_or_insert_keeps_sorted_position() {
        let (state, mut headers) = attached();
        headers.get_or_insert(HeaderType::DatabaseName).unwrap();
        headers.get_or_insert(HeaderType::Uuid).unwrap();
        headers.get_or_insert(HeaderType::TimestampOfLastSave).unwrap();
        let types: Vec<_> = headers.iter().map(|h| h.field_type()).collect();
        assert_eq!(
            types,
            vec![
                HeaderType::Version,
                HeaderType::Uuid,
                HeaderType::TimestampOfLastSave,
                HeaderType::DatabaseName
            ]
        );
        // creation alone is not a change
        assert!(!state.has_changed());
    }

    #[test]
    fn test_set_marks_changed_only_on_difference() {
        let (state, mut headers) = attached();
        headers
            .get_or_insert(HeaderType::DatabaseName)
            .unwrap()
            .set_text("")
            .unwrap();
        assert!(!state.has_changed());

        headers.set_text(HeaderType::DatabaseName, "Mine").unwrap();
        assert!(state.has_changed());
        assert_eq!(headers.text(HeaderType::DatabaseName).unwrap(), "Mine");
    }

    #[test]
    fn test_read_only_lookup_returns_dummy() {
        let (state, mut headers) = attached();
        state.set_read_only(true);

        let dummy = headers.get_or_default(HeaderType::DatabaseDescription);
        assert_eq!(dummy.text().unwrap(), "");
        assert!(!headers.contains(HeaderType::DatabaseDescription));

        assert!(matches!(
            headers.get_or_insert(HeaderType::DatabaseDescription),
            Err(PwsafeError::ReadOnly)
        ));
        assert!(matches!(headers.clear(), Err(PwsafeError::ReadOnly)));
    }

    #[test]
    fn test_index_zero_rules() {
        let (_state, mut headers) = attached();
        assert!(matches!(
            headers.insert(0, Header::new(HeaderType::Uuid)),
            Err(PwsafeError::InvalidArgument(_))
        ));
        assert!(matches!(
            headers.replace(0, Header::new(HeaderType::Uuid)),
            Err(PwsafeError::InvalidArgument(_))
        ));
        assert!(matches!(
            headers.remove_at(0),
            Err(PwsafeError::InvalidArgument(_))
        ));
        assert!(headers.remove(HeaderType::Version).is_err());
        headers
            .replace(0, Header::with_bytes(HeaderType::Version, &[0x0E, 0x03]))
            .unwrap();
        assert_eq!(headers.get(0).unwrap().version().unwrap(), Some(0x030E));
    }

    #[test]
    fn test_clear_keeps_version() {
        let (state, mut headers) = attached();
        headers.push(Header::new(HeaderType::Uuid)).unwrap();
        headers.push(Header::new(HeaderType::DatabaseName)).unwrap();
        headers.clear().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get(0).unwrap().field_type(), HeaderType::Version);
        assert!(state.has_changed());
    }

    #[test]
    fn test_remove_by_type() {
        let (_state, mut headers) = attached();
        headers.set_text(HeaderType::DatabaseName, "x").unwrap();
        assert!(headers.remove(HeaderType::DatabaseName).unwrap());
        assert!(!headers.remove(HeaderType::DatabaseName).unwrap());
    }

    #[test]
    fn test_end_of_entry_rejected() {
        let (_state, mut headers) = attached();
        assert!(headers.push(Header::new(HeaderType::EndOfEntry)).is_err());
        assert!(headers.get_or_insert(HeaderType::EndOfEntry).is_err());
    }
}
