//! String-encoded property bags layered on a block.
//!
//! Each bag keeps its entries in insertion order so that parse → mutate →
//! serialize leaves untouched entries exactly where they were.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn declaration_regex() -> &'static Regex {
    static DECLARATION: OnceLock<Regex> = OnceLock::new();
    DECLARATION.get_or_init(|| {
        Regex::new(r"^\s*([-A-Za-z0-9_]+)\s*:\s*(.*?)\s*$").expect("Invalid declaration regex")
    })
}

/// Split on `;` outside of parentheses and quotes, so `url(data:a;b)` stays whole.
fn split_declarations(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// CSS-like declarations: `color: red; text-align: center`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StyleMap(Vec<(String, String)>);

impl StyleMap {
    pub fn parse(input: &str) -> Self {
        let mut map = Self::default();
        for part in split_declarations(input) {
            if let Some(caps) = declaration_regex().captures(part) {
                map.set(&caps[1], &caps[2]);
            }
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true when the stored value changed.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if key.is_empty() {
            return false;
        }
        if value.is_empty() {
            return self.remove(&key);
        }
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) if v == value => false,
            Some((_, v)) => {
                *v = value.to_string();
                true
            }
            None => {
                self.0.push((key, value.to_string()));
                true
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        let before = self.0.len();
        self.0.retain(|(k, _)| *k != key);
        self.0.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

impl From<String> for StyleMap {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<StyleMap> for String {
    fn from(map: StyleMap) -> Self {
        map.to_string()
    }
}

/// Space-separated class tokens, deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClassList(Vec<String>);

impl ClassList {
    pub fn parse(input: &str) -> Self {
        let mut list = Self::default();
        for token in input.split_whitespace() {
            list.add(token);
        }
        list
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    pub fn add(&mut self, class: &str) -> bool {
        let class = class.trim();
        if class.is_empty() || self.contains(class) {
            return false;
        }
        self.0.push(class.to_string());
        true
    }

    pub fn remove(&mut self, class: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != class);
        self.0.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl From<String> for ClassList {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ClassList> for String {
    fn from(list: ClassList) -> Self {
        list.to_string()
    }
}

/// Key/value attributes, encoded as they appear in a start tag:
/// `width="300" data-caption="Sunset"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AttributeMap(Vec<(String, String)>);

impl AttributeMap {
    pub fn parse(input: &str) -> Self {
        Self::from_pairs(blockdoc_syntax::parse_attributes(input))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut map = Self::default();
        for (k, v) in pairs {
            map.set(&k, &v);
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            return false;
        }
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) if v == value => false,
            Some((_, v)) => {
                *v = value.to_string();
                true
            }
            None => {
                self.0.push((key, value.to_string()));
                true
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|(k, _)| k != key);
        self.0.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

impl fmt::Display for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = blockdoc_syntax::serialize_attributes(&self.0);
        f.write_str(encoded.trim_start())
    }
}

impl From<String> for AttributeMap {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<AttributeMap> for String {
    fn from(map: AttributeMap) -> Self {
        map.to_string()
    }
}
