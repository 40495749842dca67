//! KeyValues document tree
//!
//! Gamedata files are written in Valve's KeyValues text format: a tree of
//! named nodes where each node is either a string value or a braced list of
//! child nodes.
//!
//! ```text
//! "Games"
//! {
//!     "csgo"
//!     {
//!         "Offsets"
//!         {
//!             "Teleport" { "windows" "148"  "linux" "147" }
//!         }
//!     }
//! }
//! ```
//!
//! Key lookup is case-insensitive, matching how the engine resolves keys.

mod parser;

use crate::error::Result;

pub use parser::parse;

/// A node in a KeyValues document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValues {
    name: String,
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    String(String),
    Section(Vec<KeyValues>),
}

impl KeyValues {
    /// Create a leaf node holding a string value
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::String(value.into()),
        }
    }

    /// Create a section node holding child nodes
    pub fn section(name: impl Into<String>, children: Vec<KeyValues>) -> Self {
        Self {
            name: name.into(),
            value: Value::Section(children),
        }
    }

    /// Parse a document from text
    pub fn parse(text: &str) -> Result<Self> {
        parse(text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// String value of a leaf node, `None` for sections
    pub fn value(&self) -> Option<&str> {
        match &self.value {
            Value::String(s) => Some(s),
            Value::Section(_) => None,
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self.value, Value::Section(_))
    }

    /// Child nodes in document order (empty for leaves)
    pub fn children(&self) -> std::slice::Iter<'_, KeyValues> {
        match &self.value {
            Value::Section(children) => children.iter(),
            Value::String(_) => Default::default(),
        }
    }

    /// Find the first direct child whose name matches `key` (ASCII case-insensitive)
    pub fn find_key(&self, key: &str) -> Option<&KeyValues> {
        self.children()
            .find(|child| child.name.eq_ignore_ascii_case(key))
    }

    /// String value of the child `key`.
    ///
    /// Returns `None` when the child is missing or is itself a section.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.find_key(key).and_then(KeyValues::value)
    }

    /// Integer value of the child `key`, or `default` when the child is missing.
    ///
    /// Values are read the way `atoi` reads them: leading whitespace, an
    /// optional sign and the leading run of decimal digits. Text with no
    /// leading digits reads as 0.
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.get_string(key) {
            Some(text) => leading_int(text),
            None => default,
        }
    }
}

fn leading_int(text: &str) -> i32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeyValues {
        KeyValues::section(
            "Teleport",
            vec![
                KeyValues::leaf("windows", "148"),
                KeyValues::leaf("linux", "147"),
                KeyValues::section("nested", vec![]),
            ],
        )
    }

    #[test]
    fn test_find_key_is_case_insensitive() {
        let kv = sample();
        assert_eq!(kv.find_key("LINUX").unwrap().value(), Some("147"));
        assert!(kv.find_key("mac").is_none());
    }

    #[test]
    fn test_get_int_default_only_when_missing() {
        let kv = sample();
        assert_eq!(kv.get_int("windows", -1), 148);
        assert_eq!(kv.get_int("mac", -1), -1);
        // sections have no string value and read as missing
        assert_eq!(kv.get_string("nested"), None);
        assert_eq!(kv.get_int("nested", -1), -1);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("42"), 42);
        assert_eq!(leading_int("  -7"), -7);
        assert_eq!(leading_int("12abc"), 12);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int("99999999999"), i32::MAX);
        assert_eq!(leading_int("-99999999999"), i32::MIN);
    }

    #[test]
    fn test_children_of_leaf_is_empty() {
        let leaf = KeyValues::leaf("linux", "1");
        assert_eq!(leaf.children().count(), 0);
        assert!(!leaf.is_section());
    }
}
