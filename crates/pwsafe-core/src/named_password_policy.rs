//! Document-wide named password policies.
//!
//! All policies share the NamedPasswordPolicies header, encoded as a 2-digit
//! hex count followed by, per policy: 2-digit name length, name, 4-digit
//! style, five 3-digit counts, 2-digit symbol count, symbols. A policy that
//! cannot be decoded is skipped and the rest are still read.

use tracing::warn;

use crate::error::{PwsafeError, Result};
use crate::header::HeaderType;
use crate::header_collection::HeaderCollection;
use crate::hex_text::{char_len, HexReader};
use crate::password_policy::PasswordPolicy;

/// A password policy with a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPasswordPolicy {
    name: String,
    policy: PasswordPolicy,
}

fn check_name(name: &str) -> Result<()> {
    match char_len(name) {
        0 => Err(PwsafeError::InvalidArgument(
            "Name cannot be empty".to_string(),
        )),
        n if n > 255 => Err(PwsafeError::InvalidArgument(
            "Name cannot be longer than 255 characters".to_string(),
        )),
        _ => Ok(()),
    }
}

impl NamedPasswordPolicy {
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name, a name over 255 characters, or
    /// a length outside `1..=4095`.
    pub fn new(name: &str, total_password_length: u16) -> Result<Self> {
        check_name(name)?;
        Ok(Self {
            name: name.to_string(),
            policy: PasswordPolicy::new(total_password_length)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        check_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut PasswordPolicy {
        &mut self.policy
    }

    fn encode_into(&self, text: &mut String) {
        let symbols = self.policy.special_symbols_text();
        text.push_str(&format!("{:02X}", char_len(&self.name)));
        text.push_str(&self.name);
        text.push_str(&self.policy.encode_settings());
        text.push_str(&format!("{:02X}", char_len(&symbols)));
        text.push_str(&symbols);
    }

    fn read(reader: &mut HexReader<'_>) -> Option<Self> {
        let name = reader.prefixed(2)?;
        let mut policy = PasswordPolicy::default();
        if !policy.read_settings(reader) {
            return None;
        }
        let symbols = reader.prefixed(2)?;
        policy.set_special_symbol_set(symbols.chars()).ok()?;
        check_name(name).ok()?;
        Some(Self {
            name: name.to_string(),
            policy,
        })
    }
}

impl std::fmt::Display for NamedPasswordPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Decode the header text. Malformed policies are dropped.
pub fn parse_policies(text: &str) -> Vec<NamedPasswordPolicy> {
    let mut reader = HexReader::new(text);
    let Some(count) = reader.hex(2) else {
        return Vec::new();
    };
    let mut policies = Vec::with_capacity(count as usize);
    for index in 0..count {
        match NamedPasswordPolicy::read(&mut reader) {
            Some(policy) => policies.push(policy),
            None => warn!(index, "Skipping malformed named password policy"),
        }
    }
    policies
}

/// Encode policies into the header text.
pub fn encode_policies(policies: &[NamedPasswordPolicy]) -> String {
    let mut text = format!("{:02X}", policies.len());
    for policy in policies {
        policy.encode_into(&mut text);
    }
    text
}

/// Editable named policies of a document.
///
/// Every change is written back to the NamedPasswordPolicies header right
/// away.
pub struct NamedPasswordPolicyCollection<'a> {
    headers: &'a mut HeaderCollection,
    policies: Vec<NamedPasswordPolicy>,
}

impl<'a> NamedPasswordPolicyCollection<'a> {
    pub(crate) fn new(headers: &'a mut HeaderCollection) -> Self {
        let policies = read_policies(headers);
        Self { headers, policies }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.headers.is_read_only() {
            return Err(PwsafeError::ReadOnly);
        }
        Ok(())
    }

    fn store(&mut self) -> Result<()> {
        self.headers
            .set_text(HeaderType::NamedPasswordPolicies, &encode_policies(&self.policies))
    }

    fn ensure_unique<'p>(&self, names: impl IntoIterator<Item = &'p str>) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        for name in names {
            if seen.contains(&name) || self.policies.iter().any(|p| p.name == name) {
                return Err(PwsafeError::InvalidArgument(format!(
                    "Password policy with the name '{}' already exists",
                    name
                )));
            }
            seen.push(name);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NamedPasswordPolicy> {
        self.policies.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&NamedPasswordPolicy> {
        self.policies.iter().find(|policy| policy.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedPasswordPolicy> {
        self.policies.iter()
    }

    /// # Errors
    ///
    /// `InvalidArgument` when a policy with the same name (case-sensitive)
    /// exists; nothing is added then.
    pub fn add(&mut self, policy: NamedPasswordPolicy) -> Result<()> {
        self.ensure_writable()?;
        self.ensure_unique([policy.name()])?;
        self.policies.push(policy);
        self.store()
    }

    /// Add several policies. A name clash with an existing policy or within
    /// `policies` rejects the whole batch.
    pub fn add_range(&mut self, policies: Vec<NamedPasswordPolicy>) -> Result<()> {
        self.ensure_writable()?;
        self.ensure_unique(policies.iter().map(NamedPasswordPolicy::name))?;
        self.policies.extend(policies);
        self.store()
    }

    /// Change the policy at `index` in place. The edit is discarded if it
    /// fails or produces a duplicate name.
    pub fn update(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut NamedPasswordPolicy) -> Result<()>,
    ) -> Result<()> {
        self.ensure_writable()?;
        let mut policy = self
            .policies
            .get(index)
            .cloned()
            .ok_or_else(|| PwsafeError::InvalidArgument(format!("Index {} is out of range", index)))?;
        edit(&mut policy)?;
        let clash = self
            .policies
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && other.name == policy.name);
        if clash {
            return Err(PwsafeError::InvalidArgument(format!(
                "Password policy with the name '{}' already exists",
                policy.name
            )));
        }
        self.policies[index] = policy;
        self.store()
    }

    /// Remove the policy with `name`. Returns whether one was found.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        self.ensure_writable()?;
        let before = self.policies.len();
        self.policies.retain(|policy| policy.name != name);
        if self.policies.len() == before {
            return Ok(false);
        }
        self.store()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.policies.clear();
        self.store()
    }
}

/// Policies currently stored in the headers.
pub(crate) fn read_policies(headers: &HeaderCollection) -> Vec<NamedPasswordPolicy> {
    match headers.find(HeaderType::NamedPasswordPolicies) {
        Some(header) => parse_policies(&header.text().unwrap_or_default()),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::{DocumentState, Owner};
    use crate::password_policy::PasswordPolicyStyle;

    fn sample(name: &str) -> NamedPasswordPolicy {
        let mut policy = NamedPasswordPolicy::new(name, 12).unwrap();
        policy
            .policy_mut()
            .set_style(PasswordPolicyStyle::USE_LOWERCASE | PasswordPolicyStyle::USE_DIGITS);
        policy.policy_mut().set_minimum_digit_count(2).unwrap();
        policy
            .policy_mut()
            .set_special_symbol_set("!@".chars())
            .unwrap();
        policy
    }

    #[test]
    fn test_encode_layout() {
        let text = encode_policies(&[sample("Web")]);
        assert_eq!(text, "0103WebA00000C00000000200002!@");
    }

    #[test]
    fn test_parse_round_trip() {
        let policies = vec![sample("Web"), sample("PIN")];
        let parsed = parse_policies(&encode_policies(&policies));
        assert_eq!(parsed, policies);
    }

    #[test]
    fn test_malformed_policy_skipped() {
        // second policy has length 0, which is out of range
        let text = "0203WebA00000C00000000200002!@03PINA00000000000000000000000";
        let parsed = parse_policies(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name(), "Web");
        assert!(parse_policies("zz").is_empty());
    }

    #[test]
    fn test_name_rules() {
        assert!(NamedPasswordPolicy::new("", 8).is_err());
        assert!(NamedPasswordPolicy::new(&"x".repeat(256), 8).is_err());
        assert!(NamedPasswordPolicy::new(&"x".repeat(255), 8).is_ok());
    }

    #[test]
    fn test_collection_persists_and_rejects_duplicates() {
        let state = DocumentState::new();
        let mut headers = HeaderCollection::from_headers(Owner::attached(&state), Vec::new());
        {
            let mut policies = NamedPasswordPolicyCollection::new(&mut headers);
            policies.add(sample("Web")).unwrap();
            assert!(policies.add(sample("Web")).is_err());
            assert!(policies
                .add_range(vec![sample("A"), sample("A")])
                .is_err());
            assert_eq!(policies.len(), 1);
            policies.add_range(vec![sample("A"), sample("web")]).unwrap();
        }
        assert!(state.has_changed());

        let stored = read_policies(&headers);
        let names: Vec<&str> = stored.iter().map(NamedPasswordPolicy::name).collect();
        assert_eq!(names, vec!["Web", "A", "web"]);
    }

    #[test]
    fn test_update_and_remove() {
        let mut headers = HeaderCollection::from_headers(Owner::detached(), Vec::new());
        let mut policies = NamedPasswordPolicyCollection::new(&mut headers);
        policies.add_range(vec![sample("A"), sample("B")]).unwrap();
        assert!(policies.update(1, |p| p.set_name("A")).is_err());
        policies
            .update(1, |p| p.policy_mut().set_total_password_length(30))
            .unwrap();
        assert_eq!(policies.get(1).unwrap().policy().total_password_length(), 30);
        assert!(policies.remove("A").unwrap());
        assert!(!policies.remove("A").unwrap());
        drop(policies);
        assert_eq!(read_policies(&headers).len(), 1);
    }

    #[test]
    fn test_read_only_rejects_changes() {
        let state = DocumentState::new();
        let mut headers = HeaderCollection::from_headers(Owner::attached(&state), Vec::new());
        state.set_read_only(true);
        let mut policies = NamedPasswordPolicyCollection::new(&mut headers);
        assert!(matches!(policies.add(sample("A")), Err(PwsafeError::ReadOnly)));
    }
}
