//! Hierarchical entry groups.
//!
//! A group is stored as one string with `.` between levels. A literal dot
//! inside a level is written `\.`.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Dot-separated group path. Comparison ignores case.
#[derive(Debug, Clone, Default)]
pub struct GroupPath {
    group: String,
}

impl GroupPath {
    /// Build from levels, escaping dots. Empty levels are skipped.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let escaped: Vec<String> = segments
            .into_iter()
            .filter(|segment| !segment.as_ref().is_empty())
            .map(|segment| segment.as_ref().replace('.', "\\."))
            .collect();
        Self {
            group: escaped.join("."),
        }
    }

    /// The stored form.
    pub fn as_str(&self) -> &str {
        &self.group
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    /// Levels with escapes removed. An empty path has one empty level.
    pub fn segments(&self) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = self.group.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' if chars.peek() == Some(&'.') => {
                    current.push('.');
                    chars.next();
                }
                '.' => segments.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
        segments.push(current);
        segments
    }

    /// Level at `index`, if any.
    pub fn segment(&self, index: usize) -> Option<String> {
        self.segments().into_iter().nth(index)
    }

    /// Path one level deeper. An empty `segment` returns the path unchanged.
    pub fn append(&self, segment: &str) -> Self {
        if segment.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return Self::from_segments([segment]);
        }
        let mut segments = self.segments();
        segments.push(segment.to_string());
        Self::from_segments(segments)
    }

    /// Parent path; the parent of a top-level group is the empty path.
    pub fn up(&self) -> Self {
        let mut segments = self.segments();
        if segments.len() <= 1 {
            return Self::default();
        }
        segments.pop();
        Self::from_segments(segments)
    }
}

impl From<&str> for GroupPath {
    /// Takes `group` as already in stored form.
    fn from(group: &str) -> Self {
        Self {
            group: group.to_string(),
        }
    }
}

impl From<String> for GroupPath {
    fn from(group: String) -> Self {
        Self { group }
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.group)
    }
}

impl PartialEq for GroupPath {
    fn eq(&self, other: &Self) -> bool {
        eq_ignore_case(&self.group, &other.group)
    }
}

impl Eq for GroupPath {}

impl PartialEq<str> for GroupPath {
    fn eq(&self, other: &str) -> bool {
        eq_ignore_case(&self.group, other)
    }
}

impl PartialEq<&str> for GroupPath {
    fn eq(&self, other: &&str) -> bool {
        eq_ignore_case(&self.group, other)
    }
}

impl Hash for GroupPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for ch in self.group.chars().flat_map(char::to_lowercase) {
            ch.hash(state);
        }
    }
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_split_on_unescaped_dots() {
        let path = GroupPath::from("Work.Servers\\.old.DB");
        assert_eq!(path.segments(), vec!["Work", "Servers.old", "DB"]);
        assert_eq!(path.segment(1).as_deref(), Some("Servers.old"));
        assert_eq!(path.segment(3), None);
    }

    #[test]
    fn test_backslash_without_dot_is_literal() {
        let path = GroupPath::from("C:\\temp.x");
        assert_eq!(path.segments(), vec!["C:\\temp", "x"]);
    }

    #[test]
    fn test_from_segments_escapes() {
        let path = GroupPath::from_segments(["a.b", "", "c"]);
        assert_eq!(path.as_str(), "a\\.b.c");
        assert_eq!(path.segments(), vec!["a.b", "c"]);
    }

    #[test]
    fn test_append_and_up() {
        let root = GroupPath::default();
        let child = root.append("Home").append("v1.2");
        assert_eq!(child.as_str(), "Home.v1\\.2");
        assert_eq!(child.up().as_str(), "Home");
        assert!(child.up().up().is_empty());
        assert_eq!(child.append(""), child);
    }

    #[test]
    fn test_case_insensitive_equality() {
        let path = GroupPath::from("Work.Mail");
        assert_eq!(path, GroupPath::from("work.MAIL"));
        assert!(path == "WORK.mail");
        assert!(path != "Work");
    }

    #[test]
    fn test_equal_paths_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(GroupPath::from("Work"));
        assert!(set.contains(&GroupPath::from("WORK")));
    }
}
