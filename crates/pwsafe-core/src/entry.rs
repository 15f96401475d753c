//! A password entry: one record group of the document.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::autotype::{self, AutotypeToken};
use crate::error::Result;
use crate::group_path::GroupPath;
use crate::owner::Owner;
use crate::password_history::PasswordHistoryCollection;
use crate::password_policy::PasswordPolicy;
use crate::record::{Record, RecordType};
use crate::record_collection::RecordCollection;

/// A password entry.
///
/// Identifying fields (UUID, group, title) and the automatic times are read
/// through `&self` and never count as an access. Every other getter takes
/// `&mut self` because reading it may stamp LastAccessTime. Missing records
/// read as empty without being created.
///
/// Cloning gives a copy that belongs to no document.
#[derive(Debug, Clone)]
pub struct Entry {
    records: RecordCollection,
}

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

impl Entry {
    /// A new entry with a random UUID, an empty title and an empty password.
    pub fn new() -> Self {
        Self::with_group_and_title(GroupPath::default(), "")
    }

    pub fn with_title(title: &str) -> Self {
        Self::with_group_and_title(GroupPath::default(), title)
    }

    pub fn with_group_and_title(group: impl Into<GroupPath>, title: &str) -> Self {
        let group = group.into();
        let mut records = vec![Record::with_bytes(
            RecordType::Uuid,
            &Uuid::new_v4().to_bytes_le(),
        )];
        if !group.is_empty() {
            records.push(Record::with_bytes(RecordType::Group, group.as_str().as_bytes()));
        }
        records.push(Record::with_bytes(RecordType::Title, title.as_bytes()));
        records.push(Record::new(RecordType::Password));
        Self::from_records(records)
    }

    pub(crate) fn from_records(records: Vec<Record>) -> Self {
        Self {
            records: RecordCollection::from_records(records),
        }
    }

    pub(crate) fn set_owner(&mut self, owner: Owner) {
        self.records.set_owner(owner);
    }

    /// All records, read silently.
    pub fn records(&self) -> &RecordCollection {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut RecordCollection {
        &mut self.records
    }

    /// Remove the record of the given type. Returns whether one existed.
    pub fn remove(&mut self, record_type: RecordType) -> Result<bool> {
        self.records.remove(record_type)
    }

    fn silent_text(&self, record_type: RecordType) -> Result<String> {
        self.records.get_or_default(record_type).text()
    }

    fn silent_time(&self, record_type: RecordType) -> Result<Option<DateTime<Utc>>> {
        self.records.get_or_default(record_type).time()
    }

    /// Entry UUID; nil when the record is missing or malformed.
    pub fn uuid(&self) -> Result<Uuid> {
        Ok(self
            .records
            .get_or_default(RecordType::Uuid)
            .uuid()?
            .unwrap_or_else(Uuid::nil))
    }

    pub fn set_uuid(&mut self, uuid: Uuid) -> Result<()> {
        self.records.get_or_insert(RecordType::Uuid)?.set_uuid(uuid)
    }

    pub fn group(&self) -> Result<GroupPath> {
        Ok(GroupPath::from(self.silent_text(RecordType::Group)?))
    }

    pub fn set_group(&mut self, group: impl Into<GroupPath>) -> Result<()> {
        self.records
            .set_text(RecordType::Group, group.into().as_str())
    }

    pub fn title(&self) -> Result<String> {
        self.silent_text(RecordType::Title)
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.records.set_text(RecordType::Title, title)
    }

    pub fn user_name(&mut self) -> Result<String> {
        self.records.text(RecordType::UserName)
    }

    pub fn set_user_name(&mut self, user_name: &str) -> Result<()> {
        self.records.set_text(RecordType::UserName, user_name)
    }

    pub fn password(&mut self) -> Result<Zeroizing<String>> {
        self.records.text(RecordType::Password).map(Zeroizing::new)
    }

    /// Set the password. With history enabled, a different previous
    /// password moves into the history first.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.records.set_text(RecordType::Password, password)
    }

    pub fn notes(&mut self) -> Result<String> {
        self.records.text(RecordType::Notes)
    }

    pub fn set_notes(&mut self, notes: &str) -> Result<()> {
        self.records.set_text(RecordType::Notes, notes)
    }

    pub fn url(&mut self) -> Result<String> {
        self.records.text(RecordType::Url)
    }

    pub fn set_url(&mut self, url: &str) -> Result<()> {
        self.records.set_text(RecordType::Url, url)
    }

    pub fn email(&mut self) -> Result<String> {
        self.records.text(RecordType::EmailAddress)
    }

    pub fn set_email(&mut self, email: &str) -> Result<()> {
        self.records.set_text(RecordType::EmailAddress, email)
    }

    pub fn run_command(&mut self) -> Result<String> {
        self.records.text(RecordType::RunCommand)
    }

    pub fn set_run_command(&mut self, command: &str) -> Result<()> {
        self.records.set_text(RecordType::RunCommand, command)
    }

    pub fn credit_card_number(&mut self) -> Result<String> {
        self.records.text(RecordType::CreditCardNumber)
    }

    pub fn set_credit_card_number(&mut self, number: &str) -> Result<()> {
        self.records.set_text(RecordType::CreditCardNumber, number)
    }

    pub fn credit_card_expiration(&mut self) -> Result<String> {
        self.records.text(RecordType::CreditCardExpiration)
    }

    pub fn set_credit_card_expiration(&mut self, expiration: &str) -> Result<()> {
        self.records.set_text(RecordType::CreditCardExpiration, expiration)
    }

    pub fn credit_card_verification_value(&mut self) -> Result<String> {
        self.records.text(RecordType::CreditCardVerificationValue)
    }

    pub fn set_credit_card_verification_value(&mut self, value: &str) -> Result<()> {
        self.records
            .set_text(RecordType::CreditCardVerificationValue, value)
    }

    pub fn credit_card_pin(&mut self) -> Result<String> {
        self.records.text(RecordType::CreditCardPin)
    }

    pub fn set_credit_card_pin(&mut self, pin: &str) -> Result<()> {
        self.records.set_text(RecordType::CreditCardPin, pin)
    }

    pub fn qr_code(&mut self) -> Result<String> {
        self.records.text(RecordType::QRCode)
    }

    pub fn set_qr_code(&mut self, code: &str) -> Result<()> {
        self.records.set_text(RecordType::QRCode, code)
    }

    /// Raw two-factor secret.
    pub fn two_factor_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        self.records.bytes(RecordType::TwoFactorKey)
    }

    pub fn set_two_factor_key(&mut self, key: &[u8]) -> Result<()> {
        self.records.set_bytes(RecordType::TwoFactorKey, key)
    }

    /// Autotype template; the default template when none is stored.
    pub fn autotype(&mut self) -> Result<String> {
        self.records.text(RecordType::Autotype)
    }

    pub fn set_autotype(&mut self, template: &str) -> Result<()> {
        self.records.set_text(RecordType::Autotype, template)
    }

    /// The autotype template parsed and expanded against this entry.
    pub fn autotype_tokens(&mut self) -> Result<Vec<AutotypeToken>> {
        let template = self.autotype()?;
        let tokens = autotype::parse_template(&template);
        autotype::expand(&tokens, self)
    }

    pub fn password_policy_name(&mut self) -> Result<String> {
        self.records.text(RecordType::PasswordPolicyName)
    }

    pub fn set_password_policy_name(&mut self, name: &str) -> Result<()> {
        self.records.set_text(RecordType::PasswordPolicyName, name)
    }

    /// Entry-specific policy from the PasswordPolicy and
    /// OwnSymbolsForPassword records.
    pub fn password_policy(&mut self) -> Result<PasswordPolicy> {
        let settings = self
            .records
            .find(RecordType::PasswordPolicy)
            .map(Record::text)
            .transpose()?;
        let symbols = self
            .records
            .find(RecordType::OwnSymbolsForPassword)
            .map(Record::text)
            .transpose()?;
        self.records.mark_as_accessed(RecordType::PasswordPolicy)?;
        Ok(PasswordPolicy::from_record_texts(
            settings.as_deref(),
            symbols.as_deref(),
        ))
    }

    /// Store an entry-specific policy. An empty symbol set removes the
    /// OwnSymbolsForPassword record.
    pub fn set_password_policy(&mut self, policy: &PasswordPolicy) -> Result<()> {
        self.records
            .set_text(RecordType::PasswordPolicy, &policy.encode_settings())?;
        if policy.special_symbol_set().is_empty() {
            self.records.remove(RecordType::OwnSymbolsForPassword)?;
        } else {
            self.records.set_text(
                RecordType::OwnSymbolsForPassword,
                &policy.special_symbols_text(),
            )?;
        }
        Ok(())
    }

    /// Editable password history.
    pub fn password_history(&mut self) -> PasswordHistoryCollection<'_> {
        PasswordHistoryCollection::new(&mut self.records)
    }

    pub fn creation_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.silent_time(RecordType::CreationTime)
    }

    pub fn set_creation_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.records.set_time(RecordType::CreationTime, time)
    }

    pub fn last_access_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.silent_time(RecordType::LastAccessTime)
    }

    pub fn set_last_access_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.records.set_time(RecordType::LastAccessTime, time)
    }

    pub fn last_modification_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.silent_time(RecordType::LastModificationTime)
    }

    pub fn set_last_modification_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.records.set_time(RecordType::LastModificationTime, time)
    }

    pub fn password_modification_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.silent_time(RecordType::PasswordModificationTime)
    }

    pub fn set_password_modification_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.records
            .set_time(RecordType::PasswordModificationTime, time)
    }

    pub fn password_expiry_time(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.records.time(RecordType::PasswordExpiryTime)
    }

    pub fn set_password_expiry_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.records.set_time(RecordType::PasswordExpiryTime, time)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::DocumentState;
    use crate::password_policy::PasswordPolicyStyle;
    use crate::record::DEFAULT_AUTOTYPE;
    use chrono::TimeZone;

    #[test]
    fn test_new_entry_records() {
        let entry = Entry::with_group_and_title("Work.Mail", "Inbox");
        let types: Vec<RecordType> = entry.records().iter().map(|r| r.field_type()).collect();
        assert_eq!(
            types,
            vec![
                RecordType::Uuid,
                RecordType::Group,
                RecordType::Title,
                RecordType::Password
            ]
        );
        assert!(!entry.uuid().unwrap().is_nil());
        assert_eq!(entry.group().unwrap(), "work.mail");
        assert_eq!(entry.to_string(), "Inbox");
    }

    #[test]
    fn test_missing_records_read_as_empty_without_insert() {
        let mut entry = Entry::new();
        let before = entry.records().len();
        assert_eq!(entry.user_name().unwrap(), "");
        assert!(entry.two_factor_key().unwrap().is_empty());
        assert_eq!(entry.autotype().unwrap(), DEFAULT_AUTOTYPE);
        assert_eq!(entry.records().len(), before);
    }

    #[test]
    fn test_reads_stamp_access_time_when_attached() {
        let state = DocumentState::new();
        let mut entry = Entry::with_title("Site");
        entry.set_owner(Owner::attached(&state));

        entry.title().unwrap();
        assert!(entry.last_access_time().unwrap().is_none());

        entry.user_name().unwrap();
        assert!(entry.last_access_time().unwrap().is_some());
    }

    #[test]
    fn test_password_policy_round_trip() {
        let mut policy = PasswordPolicy::new(24).unwrap();
        policy.set_style(PasswordPolicyStyle::USE_UPPERCASE | PasswordPolicyStyle::USE_SYMBOLS);
        policy.set_special_symbol_set("*&".chars()).unwrap();

        let mut entry = Entry::with_title("Site");
        entry.set_password_policy(&policy).unwrap();
        assert_eq!(entry.password_policy().unwrap(), policy);

        policy.set_special_symbol_set(std::iter::empty()).unwrap();
        entry.set_password_policy(&policy).unwrap();
        assert!(!entry.records().contains(RecordType::OwnSymbolsForPassword));
    }

    #[test]
    fn test_clone_is_detached() {
        let state = DocumentState::new();
        let mut entry = Entry::with_title("Site");
        entry.set_owner(Owner::attached(&state));

        let mut copy = entry.clone();
        copy.set_title("Copy").unwrap();
        assert!(!state.has_changed());
        assert_eq!(entry.title().unwrap(), "Site");
    }

    #[test]
    fn test_password_history_view() {
        let mut entry = Entry::with_title("Site");
        entry.set_password_modification_time(Utc.timestamp_opt(100, 0).unwrap())
            .unwrap();
        entry.set_password("one").unwrap();
        entry.password_history().set_enabled(true).unwrap();
        entry.set_password("two").unwrap();

        let history = entry.password_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history.get(0).unwrap().historical_password().as_str(), "one");
        assert_eq!(
            history.get(0).unwrap().time_first_used(),
            Utc.timestamp_opt(100, 0).unwrap()
        );
    }
}
