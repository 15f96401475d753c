//! A password safe: headers, entries and the passphrase that protects them.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use secrecy::SecretSlice;
use subtle::ConstantTimeEq;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::{ProtectedBytes, KEY_LENGTH};
use crate::entry::Entry;
use crate::entry_collection::EntryCollection;
use crate::error::{PwsafeError, Result};
use crate::fs::write_atomic;
use crate::header::{Header, HeaderType, DEFAULT_VERSION};
use crate::header_collection::HeaderCollection;
use crate::named_password_policy::{
    read_policies, NamedPasswordPolicy, NamedPasswordPolicyCollection,
};
use crate::owner::{DocumentState, Owner};
use crate::storage::format::MIN_ITERATIONS;
use crate::storage::{read_document, write_document, Credentials, ParsedDocument};

/// Value written to WhatPerformedLastSave.
static SAVE_APPLICATION: Lazy<String> = Lazy::new(|| {
    let minor: u32 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0);
    format!(
        "{} V{}.{:02}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION_MAJOR"),
        minor
    )
});

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}

fn current_host() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
        })
        .unwrap_or_default()
}

fn check_key_length(key: &[u8]) -> Result<()> {
    if key.len() != 2 * KEY_LENGTH {
        return Err(PwsafeError::InvalidArgument(format!(
            "Key must be {} bytes",
            2 * KEY_LENGTH
        )));
    }
    Ok(())
}

fn read_all<R: Read>(mut reader: R) -> Result<Zeroizing<Vec<u8>>> {
    let mut buffer = Zeroizing::new(Vec::new());
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// An open password safe.
///
/// Headers and entries share the document's switches: read-only blocks
/// every mutation, and access/modify tracking drive the automatic entry
/// times. `has_changed` turns true on any mutation and false again after a
/// load or save.
pub struct Document {
    state: Arc<DocumentState>,
    headers: HeaderCollection,
    entries: EntryCollection,
    iterations: u32,
    passphrase: Option<ProtectedBytes>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("headers", &self.headers.len())
            .field("entries", &self.entries.len())
            .field("iterations", &self.iterations)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Document {
    /// An empty document with a random UUID and no passphrase.
    pub fn new() -> Self {
        let uuid = Header::with_bytes(HeaderType::Uuid, &Uuid::new_v4().to_bytes_le());
        Self::assemble(vec![uuid], Vec::new(), MIN_ITERATIONS, None)
    }

    /// An empty document protected by `passphrase`.
    pub fn with_passphrase(passphrase: &str) -> Self {
        let mut document = Self::new();
        document.passphrase = Some(ProtectedBytes::seal(passphrase.as_bytes()));
        document
    }

    fn assemble(
        headers: Vec<Header>,
        entries: Vec<Entry>,
        iterations: u32,
        passphrase: Option<&[u8]>,
    ) -> Self {
        let state = DocumentState::new();
        let headers = HeaderCollection::from_headers(Owner::attached(&state), headers);
        let entries = EntryCollection::from_entries(Owner::attached(&state), entries);
        state.set_changed(false);
        Self {
            state,
            headers,
            entries,
            iterations,
            passphrase: passphrase.map(ProtectedBytes::seal),
        }
    }

    fn from_parsed(parsed: ParsedDocument, passphrase: Option<&[u8]>) -> Self {
        let entries = parsed.entries.into_iter().map(Entry::from_records).collect();
        Self::assemble(parsed.headers, entries, parsed.iterations, passphrase)
    }

    // --- Load ---

    /// Read a safe from `reader` with a UTF-8 passphrase.
    ///
    /// # Errors
    ///
    /// `Format` for an unreadable file, `Authentication` for a wrong
    /// passphrase or a tampered file, `Storage` for I/O errors.
    pub fn load<R: Read>(reader: R, passphrase: &str) -> Result<Self> {
        Self::load_with_passphrase_bytes(reader, passphrase.as_bytes())
    }

    pub fn load_with_passphrase_bytes<R: Read>(reader: R, passphrase: &[u8]) -> Result<Self> {
        let buffer = read_all(reader)?;
        let parsed = read_document(&buffer, Credentials::Passphrase(passphrase))?;
        Ok(Self::from_parsed(parsed, Some(passphrase)))
    }

    /// Read a safe with its raw keys (K then L, 64 bytes). No passphrase is
    /// kept, so a later save needs one supplied.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` before anything is read when `key` is not 64 bytes.
    pub fn load_with_key<R: Read>(reader: R, key: &[u8]) -> Result<Self> {
        check_key_length(key)?;
        let buffer = read_all(reader)?;
        let parsed = read_document(&buffer, Credentials::Key(key))?;
        Ok(Self::from_parsed(parsed, None))
    }

    pub fn open(path: impl AsRef<Path>, passphrase: &str) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening password safe");
        Self::load(BufReader::new(File::open(path)?), passphrase)
    }

    pub fn open_with_key(path: impl AsRef<Path>, key: &[u8]) -> Result<Self> {
        check_key_length(key)?;
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening password safe with key");
        Self::load_with_key(BufReader::new(File::open(path)?), key)
    }

    // --- Save ---

    fn stored_passphrase(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.passphrase
            .as_ref()
            .map(ProtectedBytes::open)
            .ok_or(PwsafeError::MissingPassphrase)
    }

    fn stamp_save_metadata(&mut self) -> Result<()> {
        if self.state.is_read_only() || !self.state.track_modify() {
            return Ok(());
        }
        self.headers
            .set_time(HeaderType::TimestampOfLastSave, Utc::now())?;
        self.headers
            .set_text(HeaderType::WhatPerformedLastSave, &SAVE_APPLICATION)?;
        self.headers
            .set_text(HeaderType::LastSavedByUser, &current_user())?;
        self.headers
            .set_text(HeaderType::LastSavedOnHost, &current_host())?;
        Ok(())
    }

    fn encode(&mut self, passphrase: &[u8], key: Option<&[u8]>) -> Result<Vec<u8>> {
        if let Some(key) = key {
            check_key_length(key)?;
        }
        self.stamp_save_metadata()?;
        write_document(
            &self.headers,
            &self.entries,
            passphrase,
            key,
            self.iterations,
        )
    }

    fn save_encoded<W: Write>(
        &mut self,
        mut writer: W,
        passphrase: &[u8],
        key: Option<&[u8]>,
    ) -> Result<()> {
        let buffer = self.encode(passphrase, key)?;
        writer.write_all(&buffer)?;
        writer.flush()?;
        self.state.set_changed(false);
        Ok(())
    }

    /// Write the safe with the stored passphrase.
    ///
    /// # Errors
    ///
    /// `MissingPassphrase` when the document has none (e.g. it was loaded
    /// with a key).
    pub fn save<W: Write>(&mut self, writer: W) -> Result<()> {
        let passphrase = self.stored_passphrase()?;
        self.save_encoded(writer, &passphrase, None)
    }

    /// Write the safe under `passphrase`. The stored passphrase is unchanged.
    pub fn save_with_passphrase<W: Write>(&mut self, writer: W, passphrase: &str) -> Result<()> {
        self.save_encoded(writer, passphrase.as_bytes(), None)
    }

    pub fn save_with_passphrase_bytes<W: Write>(
        &mut self,
        writer: W,
        passphrase: &[u8],
    ) -> Result<()> {
        self.save_encoded(writer, passphrase, None)
    }

    /// Write the safe with the stored passphrase, reusing keys K and L from
    /// `key` (64 bytes) instead of fresh random ones.
    pub fn save_with_key<W: Write>(&mut self, writer: W, key: &[u8]) -> Result<()> {
        check_key_length(key)?;
        let passphrase = self.stored_passphrase()?;
        self.save_encoded(writer, &passphrase, Some(key))
    }

    /// Save to `path` through a temp file and rename.
    pub fn save_to_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let passphrase = self.stored_passphrase()?;
        self.save_to_path_inner(path.as_ref(), &passphrase, None)
    }

    pub fn save_to_path_with_passphrase(
        &mut self,
        path: impl AsRef<Path>,
        passphrase: &str,
    ) -> Result<()> {
        self.save_to_path_inner(path.as_ref(), passphrase.as_bytes(), None)
    }

    /// Save to `path` with the stored passphrase, reusing keys K and L from
    /// `key`.
    pub fn save_to_path_with_key(&mut self, path: impl AsRef<Path>, key: &[u8]) -> Result<()> {
        check_key_length(key)?;
        let passphrase = self.stored_passphrase()?;
        self.save_to_path_inner(path.as_ref(), &passphrase, Some(key))
    }

    fn save_to_path_inner(
        &mut self,
        path: &Path,
        passphrase: &[u8],
        key: Option<&[u8]>,
    ) -> Result<()> {
        let buffer = self.encode(passphrase, key)?;
        write_atomic(path, &buffer)?;
        self.state.set_changed(false);
        info!(path = %path.display(), entries = self.entries.len(), "Saved password safe");
        Ok(())
    }

    // --- Collections ---

    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderCollection {
        &mut self.headers
    }

    pub fn entries(&self) -> &EntryCollection {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut EntryCollection {
        &mut self.entries
    }

    /// Named policies as currently stored.
    pub fn named_password_policies(&self) -> Vec<NamedPasswordPolicy> {
        read_policies(&self.headers)
    }

    pub fn named_password_policies_mut(&mut self) -> NamedPasswordPolicyCollection<'_> {
        NamedPasswordPolicyCollection::new(&mut self.headers)
    }

    // --- Properties ---

    pub fn version(&self) -> u16 {
        self.headers
            .find(HeaderType::Version)
            .and_then(|header| header.version().ok().flatten())
            .unwrap_or(DEFAULT_VERSION)
    }

    pub fn set_version(&mut self, version: u16) -> Result<()> {
        self.headers
            .get_or_insert(HeaderType::Version)?
            .set_version(version)
    }

    /// Document UUID; nil when the header is missing.
    pub fn uuid(&self) -> Uuid {
        self.headers
            .find(HeaderType::Uuid)
            .and_then(|header| header.uuid().ok().flatten())
            .unwrap_or_else(Uuid::nil)
    }

    pub fn set_uuid(&mut self, uuid: Uuid) -> Result<()> {
        self.headers.get_or_insert(HeaderType::Uuid)?.set_uuid(uuid)
    }

    pub fn last_save_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.headers.time(HeaderType::TimestampOfLastSave)
    }

    pub fn set_last_save_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.headers.set_time(HeaderType::TimestampOfLastSave, time)
    }

    pub fn last_save_application(&self) -> Result<String> {
        self.headers.text(HeaderType::WhatPerformedLastSave)
    }

    pub fn set_last_save_application(&mut self, application: &str) -> Result<()> {
        self.headers
            .set_text(HeaderType::WhatPerformedLastSave, application)
    }

    pub fn last_save_user(&self) -> Result<String> {
        self.headers.text(HeaderType::LastSavedByUser)
    }

    pub fn set_last_save_user(&mut self, user: &str) -> Result<()> {
        self.headers.set_text(HeaderType::LastSavedByUser, user)
    }

    pub fn last_save_host(&self) -> Result<String> {
        self.headers.text(HeaderType::LastSavedOnHost)
    }

    pub fn set_last_save_host(&mut self, host: &str) -> Result<()> {
        self.headers.set_text(HeaderType::LastSavedOnHost, host)
    }

    pub fn name(&self) -> Result<String> {
        self.headers.text(HeaderType::DatabaseName)
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.headers.set_text(HeaderType::DatabaseName, name)
    }

    pub fn description(&self) -> Result<String> {
        self.headers.text(HeaderType::DatabaseDescription)
    }

    pub fn set_description(&mut self, description: &str) -> Result<()> {
        self.headers
            .set_text(HeaderType::DatabaseDescription, description)
    }

    /// Stretching iterations used by the next save. A loaded document keeps
    /// the stored count until it is set.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Set the iteration count, raising it to at least 2048.
    pub fn set_iterations(&mut self, iterations: u32) -> Result<()> {
        if self.state.is_read_only() {
            return Err(PwsafeError::ReadOnly);
        }
        let iterations = iterations.max(MIN_ITERATIONS);
        if iterations != self.iterations {
            self.iterations = iterations;
            self.state.set_changed(true);
        }
        Ok(())
    }

    pub fn is_read_only(&self) -> bool {
        self.state.is_read_only()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.state.set_read_only(read_only);
    }

    pub fn track_access(&self) -> bool {
        self.state.track_access()
    }

    pub fn set_track_access(&mut self, track: bool) {
        self.state.set_track_access(track);
    }

    pub fn track_modify(&self) -> bool {
        self.state.track_modify()
    }

    pub fn set_track_modify(&mut self, track: bool) {
        self.state.set_track_modify(track);
    }

    /// True after any change since the last load or save.
    pub fn has_changed(&self) -> bool {
        self.state.has_changed()
    }

    // --- Passphrase ---

    pub fn has_passphrase(&self) -> bool {
        self.passphrase.is_some()
    }

    /// A copy of the stored passphrase, zeroized when dropped.
    pub fn passphrase(&self) -> Option<SecretSlice<u8>> {
        self.passphrase.as_ref().map(|sealed| {
            let plain = sealed.open();
            SecretSlice::new(plain.as_slice().into())
        })
    }

    /// Replace the passphrase used by later saves.
    pub fn change_passphrase(&mut self, passphrase: &str) -> Result<()> {
        if self.state.is_read_only() {
            return Err(PwsafeError::ReadOnly);
        }
        self.passphrase = Some(ProtectedBytes::seal(passphrase.as_bytes()));
        self.state.set_changed(true);
        Ok(())
    }

    /// Change the passphrase if `old` matches the stored one.
    pub fn try_change_passphrase(&mut self, old: &str, new: &str) -> Result<bool> {
        if !self.validate_passphrase(old) {
            return Ok(false);
        }
        self.change_passphrase(new)?;
        Ok(true)
    }

    /// Constant-time comparison with the stored passphrase. True when no
    /// passphrase is stored.
    pub fn validate_passphrase(&self, candidate: &str) -> bool {
        match &self.passphrase {
            Some(sealed) => bool::from(sealed.open().as_slice().ct_eq(candidate.as_bytes())),
            None => true,
        }
    }
}
