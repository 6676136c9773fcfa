//! The decoded configuration of one source: an insertion ordered string map
//! plus typed accessors for the reserved keys.

use std::fmt;
use std::path::PathBuf;

use crate::error::{FacadeError, Result};
use crate::vocab;

pub const LOCATION: &str = "location";
pub const ROOT: &str = "root";
pub const BLANK_NODES: &str = "blank-nodes";
pub const NAMESPACE: &str = "namespace";
pub const CONTENT: &str = "content";
pub const MEDIA_TYPE: &str = "media-type";
pub const TRIPLIFIER: &str = "triplifier";
pub const NULL_STRING: &str = "null-string";
pub const USE_RDFS_MEMBER: &str = "use-rdfs-member";
pub const ONDISK: &str = "ondisk";
pub const HTTP_HEADER: &str = "http.header.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }
    /// Sets `key`, keeping the position of an earlier entry with the same key.
    /// Returns the value that was replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Entries whose key starts with `prefix`, with the prefix removed.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|suffix| (suffix, v)))
    }

    pub fn location(&self) -> Option<&str> {
        self.get(LOCATION)
    }
    pub fn root(&self) -> Option<&str> {
        self.get(ROOT)
    }
    pub fn content(&self) -> Option<&str> {
        self.get(CONTENT)
    }
    pub fn media_type(&self) -> Option<&str> {
        self.get(MEDIA_TYPE)
    }
    pub fn triplifier(&self) -> Option<&str> {
        self.get(TRIPLIFIER)
    }
    pub fn null_string(&self) -> Option<&str> {
        self.get(NULL_STRING)
    }
    pub fn ondisk(&self) -> Option<PathBuf> {
        self.get(ONDISK).map(PathBuf::from)
    }
    pub fn namespace(&self) -> &str {
        self.get(NAMESPACE).unwrap_or(vocab::XYZ)
    }
    pub fn blank_nodes(&self) -> Result<bool> {
        self.flag(BLANK_NODES, true)
    }
    pub fn use_rdfs_member(&self) -> Result<bool> {
        self.flag(USE_RDFS_MEMBER, false)
    }
    /// Id of the main source: the location, else the explicit root, else empty
    /// (inline content without either).
    pub fn source_id(&self) -> &str {
        self.location().or(self.root()).unwrap_or("")
    }
    /// Reads a boolean adapter option such as `txt.trim`.
    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(FacadeError::Config(format!(
                "'{key}' expects true or false, got '{v}'"
            ))),
        }
    }
    /// Reads an unsigned adapter option such as `txt.group`.
    pub fn number(&self, key: &str) -> Result<Option<usize>> {
        self.get(key)
            .map(|v| {
                v.trim().parse::<usize>().map_err(|_| {
                    FacadeError::Config(format!("'{key}' expects a non-negative integer, got '{v}'"))
                })
            })
            .transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (k, v) in iter {
            properties.insert(k, v);
        }
        properties
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", crate::locator::format(self))
    }
}
