//! Password generation policies.
//!
//! Policies are stored metadata only; nothing here generates or checks
//! passwords. An entry keeps its own policy in the PasswordPolicy record
//! (style and counts as `XXXX` plus five `XXX` hex fields) and its symbol set
//! in OwnSymbolsForPassword.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::error::{PwsafeError, Result};
use crate::hex_text::HexReader;

/// Largest length or count a policy can store (3 hex digits).
pub const MAX_POLICY_COUNT: u16 = 4095;

/// Character classes and options of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PasswordPolicyStyle(u16);

impl PasswordPolicyStyle {
    pub const NONE: Self = Self(0);
    pub const USE_LOWERCASE: Self = Self(0x8000);
    pub const USE_UPPERCASE: Self = Self(0x4000);
    pub const USE_DIGITS: Self = Self(0x2000);
    pub const USE_SYMBOLS: Self = Self(0x1000);
    pub const USE_HEX_DIGITS: Self = Self(0x0800);
    pub const USE_EASY_VISION: Self = Self(0x0400);
    pub const MAKE_PRONOUNCEABLE: Self = Self(0x0200);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Hex digits exclude every other class.
    fn normalized(self) -> Self {
        if self.contains(Self::USE_HEX_DIGITS) {
            Self::USE_HEX_DIGITS
        } else {
            self
        }
    }
}

impl BitOr for PasswordPolicyStyle {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PasswordPolicyStyle {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PasswordPolicyStyle {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for PasswordPolicyStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(PasswordPolicyStyle, &str); 7] = [
            (PasswordPolicyStyle::USE_LOWERCASE, "lowercase"),
            (PasswordPolicyStyle::USE_UPPERCASE, "uppercase"),
            (PasswordPolicyStyle::USE_DIGITS, "digits"),
            (PasswordPolicyStyle::USE_SYMBOLS, "symbols"),
            (PasswordPolicyStyle::USE_HEX_DIGITS, "hex"),
            (PasswordPolicyStyle::USE_EASY_VISION, "easy-vision"),
            (PasswordPolicyStyle::MAKE_PRONOUNCEABLE, "pronounceable"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(","))
        }
    }
}

/// Style, length, minimum counts and symbol set of a password policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PasswordPolicy {
    style: PasswordPolicyStyle,
    total_password_length: u16,
    minimum_lowercase_count: u16,
    minimum_uppercase_count: u16,
    minimum_digit_count: u16,
    minimum_symbol_count: u16,
    special_symbol_set: Vec<char>,
}

fn check_count(value: u16) -> Result<u16> {
    if value > MAX_POLICY_COUNT {
        return Err(PwsafeError::InvalidArgument(format!(
            "Count must be between 0 and {}",
            MAX_POLICY_COUNT
        )));
    }
    Ok(value)
}

impl PasswordPolicy {
    /// A policy with the given length and nothing else set.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `1 <= length <= 4095`.
    pub fn new(total_password_length: u16) -> Result<Self> {
        let mut policy = Self::default();
        policy.set_total_password_length(total_password_length)?;
        Ok(policy)
    }

    pub fn style(&self) -> PasswordPolicyStyle {
        self.style
    }

    /// Setting UseHexDigits drops every other flag.
    pub fn set_style(&mut self, style: PasswordPolicyStyle) {
        self.style = style.normalized();
    }

    /// Zero when no length was ever stored.
    pub fn total_password_length(&self) -> u16 {
        self.total_password_length
    }

    pub fn set_total_password_length(&mut self, length: u16) -> Result<()> {
        if !(1..=MAX_POLICY_COUNT).contains(&length) {
            return Err(PwsafeError::InvalidArgument(format!(
                "Length must be between 1 and {}",
                MAX_POLICY_COUNT
            )));
        }
        self.total_password_length = length;
        Ok(())
    }

    pub fn minimum_lowercase_count(&self) -> u16 {
        self.minimum_lowercase_count
    }

    pub fn set_minimum_lowercase_count(&mut self, count: u16) -> Result<()> {
        self.minimum_lowercase_count = check_count(count)?;
        Ok(())
    }

    pub fn minimum_uppercase_count(&self) -> u16 {
        self.minimum_uppercase_count
    }

    pub fn set_minimum_uppercase_count(&mut self, count: u16) -> Result<()> {
        self.minimum_uppercase_count = check_count(count)?;
        Ok(())
    }

    pub fn minimum_digit_count(&self) -> u16 {
        self.minimum_digit_count
    }

    pub fn set_minimum_digit_count(&mut self, count: u16) -> Result<()> {
        self.minimum_digit_count = check_count(count)?;
        Ok(())
    }

    pub fn minimum_symbol_count(&self) -> u16 {
        self.minimum_symbol_count
    }

    pub fn set_minimum_symbol_count(&mut self, count: u16) -> Result<()> {
        self.minimum_symbol_count = check_count(count)?;
        Ok(())
    }

    /// Symbols, sorted and without duplicates.
    pub fn special_symbol_set(&self) -> &[char] {
        &self.special_symbol_set
    }

    /// Store `symbols` sorted and de-duplicated.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when more than 255 distinct symbols remain.
    pub fn set_special_symbol_set(&mut self, symbols: impl IntoIterator<Item = char>) -> Result<()> {
        let mut symbols: Vec<char> = symbols.into_iter().collect();
        symbols.sort_unstable();
        symbols.dedup();
        if symbols.len() > 255 {
            return Err(PwsafeError::InvalidArgument(
                "Symbol set cannot hold more than 255 characters".to_string(),
            ));
        }
        self.special_symbol_set = symbols;
        Ok(())
    }

    pub(crate) fn special_symbols_text(&self) -> String {
        self.special_symbol_set.iter().collect()
    }

    /// Style and counts as `XXXX` followed by five `XXX` fields.
    pub(crate) fn encode_settings(&self) -> String {
        format!(
            "{:04X}{:03X}{:03X}{:03X}{:03X}{:03X}",
            self.style.bits(),
            self.total_password_length,
            self.minimum_lowercase_count,
            self.minimum_uppercase_count,
            self.minimum_digit_count,
            self.minimum_symbol_count
        )
    }

    /// Read settings in the `encode_settings` layout, one field at a time.
    /// Stops at the first field that is missing or invalid and returns
    /// whether all six were read.
    pub(crate) fn read_settings(&mut self, reader: &mut HexReader<'_>) -> bool {
        let Some(style) = reader.hex(4) else {
            return false;
        };
        self.set_style(PasswordPolicyStyle::from_bits(style as u16));

        type Setter = fn(&mut PasswordPolicy, u16) -> Result<()>;
        let setters: [Setter; 5] = [
            PasswordPolicy::set_total_password_length,
            PasswordPolicy::set_minimum_lowercase_count,
            PasswordPolicy::set_minimum_uppercase_count,
            PasswordPolicy::set_minimum_digit_count,
            PasswordPolicy::set_minimum_symbol_count,
        ];
        for setter in setters {
            let Some(value) = reader.hex(3) else {
                return false;
            };
            if setter(self, value as u16).is_err() {
                return false;
            }
        }
        true
    }

    /// Decode an entry's PasswordPolicy and OwnSymbolsForPassword texts.
    /// Unreadable parts keep their defaults.
    pub fn from_record_texts(settings: Option<&str>, symbols: Option<&str>) -> Self {
        let mut policy = Self::default();
        if let Some(settings) = settings {
            policy.read_settings(&mut HexReader::new(settings));
        }
        if let Some(symbols) = symbols {
            if policy.set_special_symbol_set(symbols.chars()).is_err() {
                tracing::warn!("Ignoring oversized symbol set in entry policy");
            }
        }
        policy
    }
}
