use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

// graphs and memo tables use a fast hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

// used to print out readable forms of a construct
use std::fmt;

// our own stuff that we need
use crate::error::Result;
use crate::vocab;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Term -------------
// Literals keep the lexical form alongside the datatype IRI, so that two
// literals are the same term exactly when they print the same way.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Arc<str>,
    language: Option<Arc<str>>,
}

impl Literal {
    pub fn new(lexical: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Arc::from(datatype.as_ref()),
            language: None,
        }
    }
    pub fn with_language(lexical: impl AsRef<str>, language: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Arc::from(vocab::RDF_LANG_STRING),
            language: Some(Arc::from(language.as_ref())),
        }
    }
    pub fn lexical(&self) -> &str {
        &self.lexical
    }
    pub fn datatype(&self) -> &str {
        &self.datatype
    }
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Term {
    Iri(Arc<str>),
    Blank(Arc<str>),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Term::Iri(Arc::from(iri.as_ref()))
    }
    pub fn blank(label: impl AsRef<str>) -> Self {
        Term::Blank(Arc::from(label.as_ref()))
    }
    pub fn literal(lexical: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        Term::Literal(Literal::new(lexical, datatype))
    }
    pub fn string(lexical: impl AsRef<str>) -> Self {
        Term::Literal(Literal::new(lexical, vocab::XSD_STRING))
    }
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }
    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            _ => None,
        }
    }
    /// The IRI, blank label or lexical form, without any N-Triples decoration.
    pub fn lexical(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::Blank(label) => label,
            Term::Literal(literal) => literal.lexical(),
        }
    }
}

fn escape_literal(lexical: &str) -> String {
    let mut escaped = String::with_capacity(lexical.len());
    for c in lexical.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Blank(label) => write!(f, "_:{}", label),
            Term::Literal(literal) => match literal.language() {
                Some(language) => write!(f, "\"{}\"@{}", escape_literal(literal.lexical()), language),
                None if literal.datatype() == vocab::XSD_STRING => {
                    write!(f, "\"{}\"", escape_literal(literal.lexical()))
                }
                None => write!(
                    f,
                    "\"{}\"^^<{}>",
                    escape_literal(literal.lexical()),
                    literal.datatype()
                ),
            },
        }
    }
}

// ------------- Triple / Quad -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}
impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
    fn matches(&self, subject: Option<&Term>, predicate: Option<&Term>, object: Option<&Term>) -> bool {
        subject.is_none_or(|s| *s == self.subject)
            && predicate.is_none_or(|p| *p == self.predicate)
            && object.is_none_or(|o| *o == self.object)
    }
}
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A triple placed in a graph; `graph == None` is the default graph.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Quad {
    pub graph: Option<Term>,
    pub triple: Triple,
}
impl Quad {
    pub fn new(graph: Option<Term>, triple: Triple) -> Self {
        Self { graph, triple }
    }
}
impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let t = &self.triple;
        match &self.graph {
            Some(g) => write!(f, "{} {} {} {} .", t.subject, t.predicate, t.object, g),
            None => write!(f, "{}", t),
        }
    }
}

// ------------- Graph -------------
// Insertion ordered and duplicate free.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    triples: Vec<Triple>,
    kept: HashSet<Triple, OtherHasher>,
}
impl Graph {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.kept.contains(&triple) {
            return false;
        }
        self.kept.insert(triple.clone());
        self.triples.push(triple);
        true
    }
    pub fn contains(&self, triple: &Triple) -> bool {
        self.kept.contains(triple)
    }
    pub fn find(&self, subject: Option<&Term>, predicate: Option<&Term>, object: Option<&Term>) -> Vec<Triple> {
        self.triples
            .iter()
            .filter(|t| t.matches(subject, predicate, object))
            .cloned()
            .collect()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Triple> {
        self.triples.iter()
    }
    pub fn len(&self) -> usize {
        self.triples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

// ------------- Dataset -------------
/// Read access to a materialized source, in memory or on disk.
pub trait DatasetView: Send + Sync {
    /// Names of the named graphs, excluding the default graph.
    fn graph_names(&self) -> Result<Vec<Term>>;
    /// Triples of one graph (`None` is the default graph) matching the pattern.
    fn find(
        &self,
        graph: Option<&Term>,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Vec<Triple>>;
    /// Number of quads across all graphs.
    fn len(&self) -> Result<usize>;
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
    /// Every quad, default graph first.
    fn quads(&self) -> Result<Vec<Quad>> {
        let mut quads: Vec<Quad> = self
            .find(None, None, None, None)?
            .into_iter()
            .map(|t| Quad::new(None, t))
            .collect();
        for name in self.graph_names()? {
            for t in self.find(Some(&name), None, None, None)? {
                quads.push(Quad::new(Some(name.clone()), t));
            }
        }
        Ok(quads)
    }
}

impl std::fmt::Debug for dyn DatasetView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DatasetView")
    }
}

#[derive(Debug, Default, Clone)]
pub struct DatasetGraph {
    default: Graph,
    named: BTreeMap<Term, Graph>,
}
impl DatasetGraph {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, quad: Quad) -> bool {
        match quad.graph {
            None => self.default.insert(quad.triple),
            Some(name) => self.named.entry(name).or_default().insert(quad.triple),
        }
    }
    pub fn default_graph(&self) -> &Graph {
        &self.default
    }
    pub fn named_graph(&self, name: &Term) -> Option<&Graph> {
        self.named.get(name)
    }
}
impl DatasetView for DatasetGraph {
    fn graph_names(&self) -> Result<Vec<Term>> {
        Ok(self.named.keys().cloned().collect())
    }
    fn find(
        &self,
        graph: Option<&Term>,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Vec<Triple>> {
        Ok(match graph {
            None => self.default.find(subject, predicate, object),
            Some(name) => self
                .named
                .get(name)
                .map(|g| g.find(subject, predicate, object))
                .unwrap_or_default(),
        })
    }
    fn len(&self) -> Result<usize> {
        Ok(self.default.len() + self.named.values().map(Graph::len).sum::<usize>())
    }
}

// ------------- Blank nodes -------------
// Labels are only generated, never released, so a label is never handed
// out twice within one run.
#[derive(Debug)]
pub struct BlankNodeGenerator {
    prefix: String,
    lower_bound: u64,
}

impl BlankNodeGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            lower_bound: 0,
        }
    }
    pub fn generate(&mut self) -> Term {
        self.lower_bound += 1;
        Term::blank(format!("{}b{}", self.prefix, self.lower_bound))
    }
}
