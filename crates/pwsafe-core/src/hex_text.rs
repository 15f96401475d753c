//! Reader for the compact text encodings stored inside single fields.
//!
//! Password history and password policies pack numbers as fixed-width hex
//! digits followed by length-prefixed strings. Widths and lengths count
//! characters, not bytes. A failed read leaves the position unchanged.

/// Cursor over hex-packed text.
pub(crate) struct HexReader<'a> {
    rest: &'a str,
}

impl<'a> HexReader<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    /// Next `count` characters, or `None` if fewer remain.
    pub(crate) fn take(&mut self, count: usize) -> Option<&'a str> {
        let mut end = 0;
        let mut chars = self.rest.chars();
        for _ in 0..count {
            end += chars.next()?.len_utf8();
        }
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(head)
    }

    /// Next `digits` characters parsed as a hex number.
    pub(crate) fn hex(&mut self, digits: usize) -> Option<u32> {
        let saved = self.rest;
        let value = self
            .take(digits)
            .filter(|text| !text.is_empty() && text.chars().all(|c| c.is_ascii_hexdigit()))
            .and_then(|text| u32::from_str_radix(text, 16).ok());
        if value.is_none() {
            self.rest = saved;
        }
        value
    }

    /// A hex length prefix of `digits` characters followed by that many
    /// characters of text.
    pub(crate) fn prefixed(&mut self, digits: usize) -> Option<&'a str> {
        let saved = self.rest;
        let text = self
            .hex(digits)
            .and_then(|length| self.take(length as usize));
        if text.is_none() {
            self.rest = saved;
        }
        text
    }
}

/// Number of characters in `text` (the unit all length prefixes use).
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
