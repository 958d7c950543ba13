//! Keyboard-wedge badge input.
//!
//! The reader "types" the badge id followed by Enter. Characters accumulate in
//! a [`ScanBuffer`] until the terminator arrives, then the raw text is cleaned
//! with the configured [`TrimPolicy`] and looked up in the registry.

use crate::registry::{UserRecord, UserRegistry};

#[derive(Debug, Default)]
pub struct ScanBuffer {
    buf: String,
}

impl ScanBuffer {
    pub fn push(&mut self, c: char) {
        self.buf.push(c);
    }

    pub fn backspace(&mut self) {
        self.buf.pop();
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Terminator seen: hand back the whitespace-stripped text and go idle
    pub fn take(&mut self) -> String {
        let raw = std::mem::take(&mut self.buf);
        raw.trim().to_string()
    }
}

/// Fixed prefix/suffix framing added by the reader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimPolicy {
    pub leading: String,
    pub trailing: String,
}

impl TrimPolicy {
    /// Strip the prefix and suffix once each. Case-sensitive.
    pub fn apply<'a>(&self, input: &'a str) -> &'a str {
        let mut out = input;
        if !self.leading.is_empty() {
            if let Some(rest) = out.strip_prefix(self.leading.as_str()) {
                out = rest;
            }
        }
        if !self.trailing.is_empty() {
            if let Some(rest) = out.strip_suffix(self.trailing.as_str()) {
                out = rest;
            }
        }
        out
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Nothing left after trimming
    Empty,
    Known(&'a UserRecord),
    Unknown(String),
}

pub fn resolve<'a>(registry: &'a UserRegistry, badge_id: &str) -> Resolution<'a> {
    if badge_id.is_empty() {
        return Resolution::Empty;
    }
    match registry.get(badge_id) {
        Some(record) => Resolution::Known(record),
        None => Resolution::Unknown(badge_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(leading: &str, trailing: &str) -> TrimPolicy {
        TrimPolicy {
            leading: leading.to_string(),
            trailing: trailing.to_string(),
        }
    }

    #[test]
    fn test_trim_removes_single_prefix_and_suffix() {
        let p = policy("AB", "CD");
        assert_eq!(p.apply("ABxyzCD"), "xyz");
        assert_eq!(p.apply("ABABxyzCD"), "ABxyz");
        assert_eq!(p.apply("xyzCDCD"), "xyzCD");
    }

    #[test]
    fn test_trim_is_case_sensitive() {
        let p = policy("ab", "");
        assert_eq!(p.apply("ABxyz"), "ABxyz");
        assert_eq!(p.apply("abxyz"), "xyz");
    }

    #[test]
    fn test_empty_policy_is_noop() {
        assert_eq!(TrimPolicy::default().apply("0012345"), "0012345");
    }

    #[test]
    fn test_prefix_consuming_whole_input() {
        let p = policy("AB", "B");
        assert_eq!(p.apply("AB"), "");
    }

    #[test]
    fn test_buffer_take_strips_and_resets() {
        let mut buffer = ScanBuffer::default();
        for c in " 00123\t".chars() {
            buffer.push(c);
        }
        buffer.push('9');
        buffer.backspace();
        assert_eq!(buffer.take(), "00123");
        assert_eq!(buffer.as_str(), "");
    }

    #[test]
    fn test_resolve() {
        let mut registry = UserRegistry::new();
        registry.add("42", "Ada", "hacking").unwrap();

        assert_eq!(resolve(&registry, ""), Resolution::Empty);
        assert!(matches!(resolve(&registry, "42"), Resolution::Known(r) if r.display_name == "Ada"));
        assert_eq!(
            resolve(&registry, "43"),
            Resolution::Unknown("43".to_string())
        );
    }
}
