//! The adapter contract and the registry dispatch resolves adapters from.
//!
//! A triplifier is a plain callable plus the media types and file extensions it
//! claims. It reads its source through a [`Resource`] and writes exclusively
//! through the [`FacadeXGraphBuilder`]; faults are returned, never panicked.

pub mod json;
pub mod text;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::builder::FacadeXGraphBuilder;
use crate::construct::OtherHasher;
use crate::error::{FacadeError, Result};
use crate::fetch::{Fetched, Fetcher, media_type_essence};
use crate::properties::Properties;

pub type TriplifyFn = dyn Fn(&Resource, &mut FacadeXGraphBuilder) -> Result<()> + Send + Sync;

pub struct TriplifierEntry {
    name: String,
    media_types: Vec<String>,
    extensions: Vec<String>,
    triplify: Arc<TriplifyFn>,
}

impl TriplifierEntry {
    pub fn new<F>(name: &str, media_types: &[&str], extensions: &[&str], triplify: F) -> Self
    where
        F: Fn(&Resource, &mut FacadeXGraphBuilder) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            media_types: media_types.iter().map(|m| media_type_essence(m)).collect(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            triplify: Arc::new(triplify),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
    pub fn triplify(&self, resource: &Resource, builder: &mut FacadeXGraphBuilder) -> Result<()> {
        (self.triplify)(resource, builder)
    }
}

impl std::fmt::Debug for TriplifierEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriplifierEntry")
            .field("name", &self.name)
            .field("media_types", &self.media_types)
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Capability tables: name, media type and extension each map to one entry.
/// A later registration takes over any capability an earlier one claimed.
#[derive(Default, Debug)]
pub struct TriplifierRegistry {
    entries: HashMap<String, Arc<TriplifierEntry>, OtherHasher>,
    by_media_type: HashMap<String, String, OtherHasher>,
    by_extension: HashMap<String, String, OtherHasher>,
}

impl TriplifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    /// A registry holding the text, JSON and JSON Lines triplifiers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(text::entry());
        registry.register(json::entry());
        registry.register(json::lines_entry());
        registry
    }
    /// Returns the entry previously registered under the same name.
    pub fn register(&mut self, entry: TriplifierEntry) -> Option<Arc<TriplifierEntry>> {
        let name = entry.name.clone();
        let replaced = self.entries.remove(&name);
        if replaced.is_some() {
            self.by_media_type.retain(|_, owner| *owner != name);
            self.by_extension.retain(|_, owner| *owner != name);
        }
        for media_type in &entry.media_types {
            if let Some(previous) = self.by_media_type.insert(media_type.clone(), name.clone()) {
                debug!(media_type = media_type.as_str(), previous = previous.as_str(), triplifier = name.as_str(), "media type reassigned");
            }
        }
        for extension in &entry.extensions {
            if let Some(previous) = self.by_extension.insert(extension.clone(), name.clone()) {
                debug!(extension = extension.as_str(), previous = previous.as_str(), triplifier = name.as_str(), "extension reassigned");
            }
        }
        self.entries.insert(name, Arc::new(entry));
        replaced
    }
    pub fn by_name(&self, name: &str) -> Option<Arc<TriplifierEntry>> {
        self.entries.get(name).cloned()
    }
    pub fn by_media_type(&self, media_type: &str) -> Option<Arc<TriplifierEntry>> {
        self.by_media_type
            .get(&media_type_essence(media_type))
            .and_then(|name| self.by_name(name))
    }
    pub fn by_extension(&self, extension: &str) -> Option<Arc<TriplifierEntry>> {
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .and_then(|name| self.by_name(name))
    }
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a triplifier gets to read: the configuration and the source bytes,
/// fetched lazily unless dispatch already fetched them.
pub struct Resource {
    properties: Properties,
    triplifier: String,
    fetcher: Fetcher,
    prefetched: Option<Fetched>,
}

impl Resource {
    pub fn new(properties: Properties, triplifier: &str, fetcher: Fetcher, prefetched: Option<Fetched>) -> Self {
        Self {
            properties,
            triplifier: triplifier.to_string(),
            fetcher,
            prefetched,
        }
    }
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
    pub fn triplifier(&self) -> &str {
        &self.triplifier
    }
    pub fn bytes(&self) -> Result<Arc<[u8]>> {
        match &self.prefetched {
            Some(fetched) => Ok(Arc::clone(&fetched.body)),
            None => Ok(self.fetcher.fetch(&self.properties)?.body),
        }
    }
    /// The source as UTF-8; invalid UTF-8 is malformed content.
    pub fn text(&self) -> Result<String> {
        let bytes = self.bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| FacadeError::adapter(&self.triplifier, e))
    }
    /// The source as UTF-8, replacing invalid sequences.
    pub fn text_lossy(&self) -> Result<String> {
        let bytes = self.bytes()?;
        let text = String::from_utf8_lossy(&bytes);
        if let std::borrow::Cow::Owned(_) = text {
            warn!(triplifier = self.triplifier.as_str(), "invalid UTF-8 replaced");
        }
        Ok(text.into_owned())
    }
    /// An adapter fault attributed to this resource's triplifier.
    pub fn malformed(&self, message: impl ToString) -> FacadeError {
        FacadeError::adapter(&self.triplifier, message)
    }
}
