//! Entries of a document.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::autotype::AutotypeToken;
use crate::entry::Entry;
use crate::error::{PwsafeError, Result};
use crate::group_path::{eq_ignore_case, GroupPath};
use crate::owner::Owner;
use crate::password_history::PasswordHistoryCollection;
use crate::password_policy::PasswordPolicy;
use crate::record::{Record, RecordType};
use crate::record_collection::RecordMut;

/// Ordered entries of a document.
///
/// Titles and groups are matched without regard to case. Entries added here
/// join the document's change tracking; entries taken out leave it.
#[derive(Debug)]
pub struct EntryCollection {
    owner: Owner,
    entries: Vec<Entry>,
}

impl EntryCollection {
    pub(crate) fn from_entries(owner: Owner, mut entries: Vec<Entry>) -> Self {
        for entry in &mut entries {
            entry.set_owner(owner.clone());
        }
        Self { owner, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.owner.is_read_only()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = EntryMut<'_>> {
        self.entries.iter_mut().map(EntryMut::new)
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<EntryMut<'_>> {
        self.entries.get_mut(index).map(EntryMut::new)
    }

    fn position(&self, group: Option<&GroupPath>, title: &str) -> Option<usize> {
        self.entries.iter().position(|entry| {
            let title_matches = entry
                .title()
                .map(|t| eq_ignore_case(&t, title))
                .unwrap_or(false);
            let group_matches = match group {
                Some(group) => entry.group().map(|g| &g == group).unwrap_or(false),
                None => true,
            };
            title_matches && group_matches
        })
    }

    /// First entry with the given title, in any group.
    pub fn find(&self, title: &str) -> Option<&Entry> {
        self.position(None, title).map(|index| &self.entries[index])
    }

    pub fn find_mut(&mut self, title: &str) -> Option<EntryMut<'_>> {
        self.position(None, title)
            .map(move |index| EntryMut::new(&mut self.entries[index]))
    }

    /// First entry with the given group and title.
    pub fn find_in_group(&self, group: &GroupPath, title: &str) -> Option<&Entry> {
        self.position(Some(group), title)
            .map(|index| &self.entries[index])
    }

    pub fn find_in_group_mut(&mut self, group: &GroupPath, title: &str) -> Option<EntryMut<'_>> {
        self.position(Some(group), title)
            .map(move |index| EntryMut::new(&mut self.entries[index]))
    }

    /// Entry with the given title, appending a new one when none matches.
    ///
    /// # Errors
    ///
    /// `ReadOnly` if no entry matches and the document is read-only.
    pub fn get_or_create(&mut self, title: &str) -> Result<EntryMut<'_>> {
        let index = self.position_or_append(None, title)?;
        Ok(EntryMut::new(&mut self.entries[index]))
    }

    /// Entry with the given group and title, appending a new one when none
    /// matches.
    pub fn get_or_create_in_group(
        &mut self,
        group: &GroupPath,
        title: &str,
    ) -> Result<EntryMut<'_>> {
        let index = self.position_or_append(Some(group), title)?;
        Ok(EntryMut::new(&mut self.entries[index]))
    }

    fn position_or_append(&mut self, group: Option<&GroupPath>, title: &str) -> Result<usize> {
        match self.position(group, title) {
            Some(index) => Ok(index),
            None => {
                let entry = match group {
                    Some(group) => Entry::with_group_and_title(group.clone(), title),
                    None => Entry::with_title(title),
                };
                self.append(entry)
            }
        }
    }

    /// Record of the entry with the given title, read silently.
    pub fn record(&self, title: &str, record_type: RecordType) -> Option<&Record> {
        self.find(title)?.records().find(record_type)
    }

    pub fn record_in_group(
        &self,
        group: &GroupPath,
        title: &str,
        record_type: RecordType,
    ) -> Option<&Record> {
        self.find_in_group(group, title)?
            .records()
            .find(record_type)
    }

    /// Writable record of the entry with the given title, creating the
    /// entry and the record as needed.
    pub fn record_mut(&mut self, title: &str, record_type: RecordType) -> Result<RecordMut<'_>> {
        let index = self.position_or_append(None, title)?;
        self.entries[index].records_mut().get_or_insert(record_type)
    }

    pub fn record_in_group_mut(
        &mut self,
        group: &GroupPath,
        title: &str,
        record_type: RecordType,
    ) -> Result<RecordMut<'_>> {
        let index = self.position_or_append(Some(group), title)?;
        self.entries[index].records_mut().get_or_insert(record_type)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(PwsafeError::ReadOnly);
        }
        Ok(())
    }

    fn attach(&self, entry: &mut Entry) {
        entry.set_owner(self.owner.clone());
    }

    fn append(&mut self, mut entry: Entry) -> Result<usize> {
        self.ensure_writable()?;
        self.attach(&mut entry);
        self.entries.push(entry);
        self.owner.mark_changed();
        Ok(self.entries.len() - 1)
    }

    pub fn push(&mut self, entry: Entry) -> Result<()> {
        self.append(entry).map(|_| ())
    }

    pub fn insert(&mut self, index: usize, mut entry: Entry) -> Result<()> {
        self.ensure_writable()?;
        if index > self.entries.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        self.attach(&mut entry);
        self.entries.insert(index, entry);
        self.owner.mark_changed();
        Ok(())
    }

    /// Replace the entry at `index`, returning the old one detached.
    pub fn replace(&mut self, index: usize, mut entry: Entry) -> Result<Entry> {
        self.ensure_writable()?;
        if index >= self.entries.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        self.attach(&mut entry);
        let mut old = std::mem::replace(&mut self.entries[index], entry);
        old.set_owner(Owner::detached());
        self.owner.mark_changed();
        Ok(old)
    }

    /// Remove the entry at `index`, returning it detached.
    pub fn remove_at(&mut self, index: usize) -> Result<Entry> {
        self.ensure_writable()?;
        if index >= self.entries.len() {
            return Err(PwsafeError::InvalidArgument(format!(
                "Index {} is out of range",
                index
            )));
        }
        let mut removed = self.entries.remove(index);
        removed.set_owner(Owner::detached());
        self.owner.mark_changed();
        Ok(removed)
    }

    /// Remove the first entry with the given title. Returns whether one was
    /// found.
    pub fn remove(&mut self, title: &str) -> Result<bool> {
        self.ensure_writable()?;
        match self.position(None, title) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn remove_in_group(&mut self, group: &GroupPath, title: &str) -> Result<bool> {
        self.ensure_writable()?;
        match self.position(Some(group), title) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Remove one record from the entry with the given title. A missing
    /// entry is not created.
    pub fn remove_record(&mut self, title: &str, record_type: RecordType) -> Result<bool> {
        self.ensure_writable()?;
        match self.position(None, title) {
            Some(index) => self.entries[index].remove(record_type),
            None => Ok(false),
        }
    }

    pub fn remove_record_in_group(
        &mut self,
        group: &GroupPath,
        title: &str,
        record_type: RecordType,
    ) -> Result<bool> {
        self.ensure_writable()?;
        match self.position(Some(group), title) {
            Some(index) => self.entries[index].remove(record_type),
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        for entry in &mut self.entries {
            entry.set_owner(Owner::detached());
        }
        self.entries.clear();
        self.owner.mark_changed();
        Ok(())
    }

    /// Order entries by group, then title, ignoring case. Equal keys keep
    /// their relative order.
    pub fn sort(&mut self) {
        self.entries.sort_by_cached_key(|entry| {
            (
                entry.group().map(|g| g.as_str().to_lowercase()).unwrap_or_default(),
                entry.title().map(|t| t.to_lowercase()).unwrap_or_default(),
            )
        });
    }
}

impl<'a> IntoIterator for &'a EntryCollection {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

macro_rules! forward_to_entry {
    ($($(#[$meta:meta])* fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self $(, $arg: $ty)*) -> $ret {
                self.entry.$name($($arg),*)
            }
        )*
    };
}

/// Writable view of an entry that belongs to a collection.
///
/// Reads go through `Deref`. The entry itself is never handed out mutably,
/// so it cannot be moved out of the collection while still tracked by it.
pub struct EntryMut<'a> {
    entry: &'a mut Entry,
}

impl<'a> EntryMut<'a> {
    fn new(entry: &'a mut Entry) -> Self {
        Self { entry }
    }

    /// Writable record of the given type, inserted when missing.
    pub fn record_mut(&mut self, record_type: RecordType) -> Result<RecordMut<'_>> {
        self.entry.records_mut().get_or_insert(record_type)
    }

    /// Append a record as-is.
    pub fn push_record(&mut self, record: Record) -> Result<()> {
        self.entry.records_mut().push(record)
    }

    forward_to_entry! {
        fn remove(&mut self, record_type: RecordType) -> Result<bool>;
        fn set_uuid(&mut self, uuid: uuid::Uuid) -> Result<()>;
        fn set_group(&mut self, group: impl Into<GroupPath>) -> Result<()>;
        fn set_title(&mut self, title: &str) -> Result<()>;
        fn user_name(&mut self) -> Result<String>;
        fn set_user_name(&mut self, user_name: &str) -> Result<()>;
        fn password(&mut self) -> Result<Zeroizing<String>>;
        fn set_password(&mut self, password: &str) -> Result<()>;
        fn notes(&mut self) -> Result<String>;
        fn set_notes(&mut self, notes: &str) -> Result<()>;
        fn url(&mut self) -> Result<String>;
        fn set_url(&mut self, url: &str) -> Result<()>;
        fn email(&mut self) -> Result<String>;
        fn set_email(&mut self, email: &str) -> Result<()>;
        fn run_command(&mut self) -> Result<String>;
        fn set_run_command(&mut self, command: &str) -> Result<()>;
        fn credit_card_number(&mut self) -> Result<String>;
        fn set_credit_card_number(&mut self, number: &str) -> Result<()>;
        fn credit_card_expiration(&mut self) -> Result<String>;
        fn set_credit_card_expiration(&mut self, expiration: &str) -> Result<()>;
        fn credit_card_verification_value(&mut self) -> Result<String>;
        fn set_credit_card_verification_value(&mut self, value: &str) -> Result<()>;
        fn credit_card_pin(&mut self) -> Result<String>;
        fn set_credit_card_pin(&mut self, pin: &str) -> Result<()>;
        fn qr_code(&mut self) -> Result<String>;
        fn set_qr_code(&mut self, code: &str) -> Result<()>;
        fn two_factor_key(&mut self) -> Result<Zeroizing<Vec<u8>>>;
        fn set_two_factor_key(&mut self, key: &[u8]) -> Result<()>;
        fn autotype(&mut self) -> Result<String>;
        fn set_autotype(&mut self, template: &str) -> Result<()>;
        fn autotype_tokens(&mut self) -> Result<Vec<AutotypeToken>>;
        fn password_policy_name(&mut self) -> Result<String>;
        fn set_password_policy_name(&mut self, name: &str) -> Result<()>;
        fn password_policy(&mut self) -> Result<PasswordPolicy>;
        fn set_password_policy(&mut self, policy: &PasswordPolicy) -> Result<()>;
        fn password_history(&mut self) -> PasswordHistoryCollection<'_>;
        fn set_creation_time(&mut self, time: DateTime<Utc>) -> Result<()>;
        fn set_last_access_time(&mut self, time: DateTime<Utc>) -> Result<()>;
        fn set_last_modification_time(&mut self, time: DateTime<Utc>) -> Result<()>;
        fn set_password_modification_time(&mut self, time: DateTime<Utc>) -> Result<()>;
        fn password_expiry_time(&mut self) -> Result<Option<DateTime<Utc>>>;
        fn set_password_expiry_time(&mut self, time: DateTime<Utc>) -> Result<()>;
    }
}

impl Deref for EntryMut<'_> {
    type Target = Entry;

    fn deref(&self) -> &Entry {
        self.entry
    }
}

impl std::fmt::Debug for EntryMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EntryMut").field(&self.entry).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::DocumentState;

    fn collection(state: &std::sync::Arc<DocumentState>) -> EntryCollection {
        EntryCollection::from_entries(
            Owner::attached(state),
            vec![
                Entry::with_group_and_title("Work", "Mail"),
                Entry::with_group_and_title("Home", "Mail"),
                Entry::with_title("Bank"),
            ],
        )
    }

    #[test]
    fn test_lookup_ignores_case() {
        let state = DocumentState::new();
        let entries = collection(&state);
        assert!(entries.find("MAIL").is_some());
        let home = entries
            .find_in_group(&GroupPath::from("home"), "mail")
            .unwrap();
        assert_eq!(home.group().unwrap(), "Home");
        assert!(entries.find_in_group(&GroupPath::from("Other"), "Mail").is_none());
    }

    #[test]
    fn test_get_or_create_appends_once() {
        let state = DocumentState::new();
        let mut entries = collection(&state);
        entries.get_or_create("New").unwrap();
        entries.get_or_create("new").unwrap();
        assert_eq!(entries.len(), 4);
        assert!(state.has_changed());
    }

    #[test]
    fn test_read_only_blocks_creation() {
        let state = DocumentState::new();
        let mut entries = collection(&state);
        state.set_read_only(true);
        assert!(matches!(entries.get_or_create("New"), Err(PwsafeError::ReadOnly)));
        assert!(entries.get_or_create("bank").is_ok());
        assert!(matches!(entries.remove("Bank"), Err(PwsafeError::ReadOnly)));
    }

    #[test]
    fn test_record_removal_never_creates_entry() {
        let state = DocumentState::new();
        let mut entries = collection(&state);
        assert!(!entries.remove_record("Missing", RecordType::Notes).unwrap());
        assert_eq!(entries.len(), 3);
        assert!(entries.remove_record("Bank", RecordType::Password).unwrap());
        assert!(entries.record("Bank", RecordType::Password).is_none());
    }

    #[test]
    fn test_record_mut_creates_entry_and_record() {
        let state = DocumentState::new();
        let mut entries = collection(&state);
        entries
            .record_in_group_mut(&GroupPath::from("Home"), "Router", RecordType::UserName)
            .unwrap()
            .set_text("admin")
            .unwrap();
        let router = entries
            .record_in_group(&GroupPath::from("home"), "router", RecordType::UserName)
            .unwrap();
        assert_eq!(router.text().unwrap(), "admin");
    }

    #[test]
    fn test_sort_by_group_then_title() {
        let state = DocumentState::new();
        let mut entries = collection(&state);
        entries.push(Entry::with_group_and_title("home", "alarm")).unwrap();
        entries.sort();
        let order: Vec<(String, String)> = entries
            .iter()
            .map(|e| (e.group().unwrap().to_string(), e.title().unwrap()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("".to_string(), "Bank".to_string()),
                ("home".to_string(), "alarm".to_string()),
                ("Home".to_string(), "Mail".to_string()),
                ("Work".to_string(), "Mail".to_string()),
            ]
        );
    }

    #[test]
    fn test_removed_entry_is_detached() {
        let state = DocumentState::new();
        let mut entries = collection(&state);
        let mut removed = entries.remove_at(0).unwrap();
        state.set_changed(false);
        removed.set_title("Elsewhere").unwrap();
        assert!(!state.has_changed());
    }

    #[test]
    fn test_entry_views_keep_tracking_with_collection() {
        let state = DocumentState::new();
        let mut entries = collection(&state);
        let mut outside = entries.replace(2, Entry::with_title("Vault")).unwrap();
        state.set_changed(false);

        outside.set_notes("kept elsewhere").unwrap();
        assert!(!state.has_changed());

        let mut vault = entries.get_mut(2).unwrap();
        assert_eq!(vault.title().unwrap(), "Vault");
        vault.set_notes("inside").unwrap();
        assert!(state.has_changed());

        state.set_changed(false);
        for mut entry in entries.iter_mut() {
            entry.set_url("https://example.com").unwrap();
        }
        assert!(state.has_changed());
        assert_eq!(
            entries.record("vault", RecordType::Url).unwrap().text().unwrap(),
            "https://example.com"
        );
        assert!(entries.find("Bank").is_none());
    }
}
