//! The incremental write API every triplifier targets.
//!
//! A triplifier never creates terms or triples itself. It names containers by
//! logical ids (strings meaningful to the format, such as a JSON pointer) and
//! tells the builder how they nest; the builder decides whether a container
//! becomes an IRI or a blank node, numbers positional slots, and writes the
//! resulting quads into its sink.
//!
//! Writing to a container id that was never registered through
//! [`FacadeXGraphBuilder::add_root`] or as the child of
//! [`FacadeXGraphBuilder::add_container`] materializes it on the spot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bimap::BiMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use crate::construct::{BlankNodeGenerator, DatasetGraph, DatasetView, OtherHasher, Quad, Term, Triple};
use crate::datatype::Value;
use crate::error::{FacadeError, Result};
use crate::properties::Properties;
use crate::vocab;

// only unreserved characters stay as they are
const SLOT_KEY: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Percent-encodes a key for use in an IRI, as a predicate local name or as a
/// path step of a container id.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, SLOT_KEY).to_string()
}

/// Where a child goes inside its parent container.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The next free position of the container, counted from 1.
    Next,
    /// An explicit position; taken verbatim and never renumbered.
    Position(u64),
    /// A named slot.
    Key(String),
}
impl From<u64> for Slot {
    fn from(position: u64) -> Self {
        Slot::Position(position)
    }
}
impl From<usize> for Slot {
    fn from(position: usize) -> Self {
        Slot::Position(position as u64)
    }
}
impl From<&str> for Slot {
    fn from(key: &str) -> Self {
        Slot::Key(key.to_string())
    }
}
impl From<String> for Slot {
    fn from(key: String) -> Self {
        Slot::Key(key)
    }
}

/// Anything the builder can write quads into.
pub trait QuadSink: DatasetView {
    /// Returns false when the quad was already present.
    fn insert(&mut self, quad: Quad) -> Result<bool>;
    fn into_view(self: Box<Self>) -> Arc<dyn DatasetView>;
}

impl QuadSink for DatasetGraph {
    fn insert(&mut self, quad: Quad) -> Result<bool> {
        Ok(DatasetGraph::insert(self, quad))
    }
    fn into_view(self: Box<Self>) -> Arc<dyn DatasetView> {
        Arc::new(*self)
    }
}

#[derive(Clone, Debug)]
pub struct BuilderOptions {
    pub blank_nodes: bool,
    pub namespace: String,
    pub root: Option<String>,
    pub main_source: String,
    pub null_string: Option<String>,
    pub use_rdfs_member: bool,
    /// Prepended to every generated blank node label.
    pub blank_prefix: String,
}

impl BuilderOptions {
    pub fn from_properties(properties: &Properties) -> Result<Self> {
        Ok(Self {
            blank_nodes: properties.blank_nodes()?,
            namespace: properties.namespace().to_string(),
            root: properties.root().map(str::to_string),
            main_source: properties.source_id().to_string(),
            null_string: properties.null_string().map(str::to_string),
            use_rdfs_member: properties.use_rdfs_member()?,
            blank_prefix: String::new(),
        })
    }
    pub fn with_blank_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blank_prefix = prefix.into();
        self
    }
}

// (source id, container id)
type ContainerKey = (String, String);

pub struct FacadeXGraphBuilder {
    options: BuilderOptions,
    sink: Box<dyn QuadSink>,
    // the same container id under another source may map to the same IRI,
    // in which case the newer pair replaces the older one in the bimap
    identities: BiMap<ContainerKey, Term>,
    blank_nodes: BlankNodeGenerator,
    roots: HashMap<String, String, OtherHasher>,
    anonymous: HashSet<ContainerKey, OtherHasher>,
    counters: HashMap<ContainerKey, u64, OtherHasher>,
    written: usize,
}

impl FacadeXGraphBuilder {
    pub fn new(options: BuilderOptions, sink: Box<dyn QuadSink>) -> Self {
        let blank_nodes = BlankNodeGenerator::new(options.blank_prefix.clone());
        Self {
            options,
            sink,
            identities: BiMap::new(),
            blank_nodes,
            roots: HashMap::default(),
            anonymous: HashSet::default(),
            counters: HashMap::default(),
            written: 0,
        }
    }
    /// A builder writing into a fresh in-memory dataset.
    pub fn in_memory(properties: &Properties) -> Result<Self> {
        Ok(Self::new(
            BuilderOptions::from_properties(properties)?,
            Box::new(DatasetGraph::new()),
        ))
    }
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }
    pub fn main_source_id(&self) -> &str {
        &self.options.main_source
    }

    /// Registers the root container of `source_id` and asserts it as a
    /// Facade-X root. Repeated calls return the root registered first and write
    /// nothing.
    pub fn add_root(&mut self, source_id: &str, root_id: Option<&str>) -> Result<String> {
        if let Some(existing) = self.roots.get(source_id) {
            if root_id.is_some_and(|r| r != existing) {
                debug!(source = source_id, root = existing.as_str(), "root already registered");
            }
            return Ok(existing.clone());
        }
        let (root, anonymous) = match root_id {
            Some(r) => (r.to_string(), false),
            None => self.default_root(source_id),
        };
        if anonymous {
            self.anonymous.insert((source_id.to_string(), root.clone()));
        }
        let node = self.node(source_id, &root, true);
        self.emit(source_id, node, Term::iri(vocab::RDF_TYPE), Term::iri(vocab::FX_ROOT))?;
        self.roots.insert(source_id.to_string(), root.clone());
        Ok(root)
    }

    /// Asserts `type_iri` on a container. Types are independent of slots.
    pub fn add_type(&mut self, source_id: &str, container_id: &str, type_iri: &str) -> Result<()> {
        let node = self.node(source_id, container_id, false);
        self.emit(source_id, node, Term::iri(vocab::RDF_TYPE), Term::iri(type_iri))
    }

    /// Places `child_id` in `slot` of `parent_id` and returns the child's node.
    pub fn add_container(
        &mut self,
        source_id: &str,
        parent_id: &str,
        slot: impl Into<Slot>,
        child_id: &str,
    ) -> Result<Term> {
        let predicate = self.predicate(source_id, parent_id, slot.into())?;
        let parent = self.node(source_id, parent_id, false);
        // below an anonymous root there is no base to resolve ids against
        if self.anonymous.contains(&(source_id.to_string(), parent_id.to_string())) {
            self.anonymous.insert((source_id.to_string(), child_id.to_string()));
        }
        let child = self.node(source_id, child_id, true);
        self.emit(source_id, parent, predicate, child.clone())?;
        Ok(child)
    }

    /// Places a literal in `slot` of `container_id`. Null values, and strings
    /// equal to the configured null string, write nothing and consume no
    /// position. Returns whether a slot was written.
    pub fn add_value(
        &mut self,
        source_id: &str,
        container_id: &str,
        slot: impl Into<Slot>,
        value: impl Into<Value>,
    ) -> Result<bool> {
        let value = value.into();
        let object = match (&value, &self.options.null_string) {
            (Value::String(s), Some(null)) if s == null => None,
            _ => value.to_term(),
        };
        let Some(object) = object else {
            return Ok(false);
        };
        let predicate = self.predicate(source_id, container_id, slot.into())?;
        let subject = self.node(source_id, container_id, false);
        self.emit(source_id, subject, predicate, object)?;
        Ok(true)
    }

    /// The node a container id resolved to, if it has been referenced.
    pub fn container_node(&self, source_id: &str, container_id: &str) -> Option<&Term> {
        self.identities
            .get_by_left(&(source_id.to_string(), container_id.to_string()))
    }
    /// Reverse of [`Self::container_node`]: (source id, container id).
    pub fn container_of(&self, node: &Term) -> Option<(&str, &str)> {
        self.identities
            .get_by_right(node)
            .map(|(s, c)| (s.as_str(), c.as_str()))
    }
    pub fn root_of(&self, source_id: &str) -> Option<&str> {
        self.roots.get(source_id).map(String::as_str)
    }

    /// The default graph written so far.
    pub fn graph(&self) -> Result<Vec<Triple>> {
        self.sink.find(None, None, None, None)
    }
    /// Everything written so far, named graphs included.
    pub fn dataset_graph(&self) -> &dyn QuadSink {
        self.sink.as_ref()
    }
    /// Number of quads that were new when written.
    pub fn len(&self) -> usize {
        self.written
    }
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }
    /// Hands the accumulated dataset over; the builder cannot be written after.
    pub fn finish(self) -> Arc<dyn DatasetView> {
        self.sink.into_view()
    }

    fn default_root(&self, source_id: &str) -> (String, bool) {
        if source_id != self.options.main_source {
            return (format!("{source_id}#"), false);
        }
        if let Some(root) = &self.options.root {
            return (root.clone(), false);
        }
        if source_id.is_empty() {
            return ("#".to_string(), true);
        }
        (format!("{source_id}#"), false)
    }

    fn node(&mut self, source_id: &str, container_id: &str, registering: bool) -> Term {
        let key = (source_id.to_string(), container_id.to_string());
        if let Some(node) = self.identities.get_by_left(&key) {
            return node.clone();
        }
        if !registering {
            debug!(source = source_id, container = container_id, "implicit container materialized");
        }
        let node = if self.options.blank_nodes || self.anonymous.contains(&key) {
            self.blank_nodes.generate()
        } else {
            Term::iri(container_id)
        };
        self.identities.insert(key, node.clone());
        node
    }

    fn predicate(&mut self, source_id: &str, container_id: &str, slot: Slot) -> Result<Term> {
        let position = match slot {
            Slot::Key(key) => {
                return Ok(Term::iri(format!("{}{}", self.options.namespace, encode_key(&key))));
            }
            Slot::Position(0) => {
                return Err(FacadeError::Contract(format!(
                    "position 0 in container '{container_id}', positions start at 1"
                )));
            }
            Slot::Position(position) => position,
            Slot::Next => {
                let counter = self
                    .counters
                    .entry((source_id.to_string(), container_id.to_string()))
                    .or_insert(0);
                *counter += 1;
                *counter
            }
        };
        Ok(if self.options.use_rdfs_member {
            Term::iri(vocab::RDFS_MEMBER)
        } else {
            Term::iri(vocab::slot_iri(position))
        })
    }

    // Named graph writes are mirrored into the default graph.
    fn emit(&mut self, source_id: &str, subject: Term, predicate: Term, object: Term) -> Result<()> {
        let triple = Triple::new(subject, predicate, object);
        if source_id != self.options.main_source {
            let named = Quad::new(Some(Term::iri(source_id)), triple.clone());
            if self.sink.insert(named)? {
                self.written += 1;
            }
        }
        if self.sink.insert(Quad::new(None, triple))? {
            self.written += 1;
        }
        Ok(())
    }
}
