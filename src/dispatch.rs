//! Source resolution: picks one triplifier for a configuration, runs it at most
//! once per fingerprint and evaluation context, and publishes the result.
//!
//! Resolution order: an explicit `triplifier` or `media-type` override, the
//! extension of the location, the content type a network fetch reports, and
//! finally the unsupported format policy.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::builder::{BuilderOptions, FacadeXGraphBuilder, QuadSink};
use crate::construct::{DatasetGraph, DatasetView, OtherHasher, Term, Triple};
use crate::error::{FacadeError, Result};
use crate::fetch::{self, Fetched, Fetcher};
use crate::locator;
use crate::ordering::SerialCounter;
use crate::persist::Persistor;
use crate::properties::Properties;
use crate::settings::{Settings, UnsupportedFormat};
use crate::triplifier::{Resource, TriplifierEntry, TriplifierRegistry};

// ------------- Fingerprint -------------
/// BLAKE3 digest of a configuration's key sorted, length prefixed pairs.
/// Equal maps give equal fingerprints regardless of the order they were
/// written in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    pub fn of(properties: &Properties) -> Self {
        let mut pairs: Vec<(&str, &str)> = properties.iter().collect();
        pairs.sort_unstable();
        let mut hasher = blake3::Hasher::new();
        for (key, value) in pairs {
            for part in [key, value] {
                hasher.update(&(part.len() as u64).to_le_bytes());
                hasher.update(part.as_bytes());
            }
        }
        Self(hasher.finalize())
    }
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
    /// First twelve hex digits, enough to keep blank labels of different
    /// sources apart.
    pub fn short(&self) -> String {
        self.0.to_hex().as_str()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0.to_hex().as_str())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

// ------------- Graph space -------------
/// A graph addressable by name: the default graph of a dataset, or one of
/// its named graphs.
#[derive(Clone)]
pub struct PublishedGraph {
    dataset: Arc<dyn DatasetView>,
    graph: Option<Term>,
}

impl PublishedGraph {
    pub fn dataset(&self) -> &Arc<dyn DatasetView> {
        &self.dataset
    }
    pub fn graph_name(&self) -> Option<&Term> {
        self.graph.as_ref()
    }
    pub fn find(&self, subject: Option<&Term>, predicate: Option<&Term>, object: Option<&Term>) -> Result<Vec<Triple>> {
        self.dataset.find(self.graph.as_ref(), subject, predicate, object)
    }
}

#[derive(Default)]
pub struct GraphSpace {
    published: Mutex<HashMap<String, PublishedGraph, OtherHasher>>,
}

impl GraphSpace {
    /// The default graph goes under `name`, every named graph under its own
    /// IRI.
    fn publish(&self, name: &str, dataset: &Arc<dyn DatasetView>) -> Result<()> {
        let graph_names = dataset.graph_names()?;
        let mut published = self.published.lock()?;
        published.insert(
            name.to_string(),
            PublishedGraph {
                dataset: Arc::clone(dataset),
                graph: None,
            },
        );
        for graph in graph_names {
            published.insert(
                graph.lexical().to_string(),
                PublishedGraph {
                    dataset: Arc::clone(dataset),
                    graph: Some(graph),
                },
            );
        }
        Ok(())
    }
    pub fn get(&self, name: &str) -> Result<Option<PublishedGraph>> {
        Ok(self.published.lock()?.get(name).cloned())
    }
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.published.lock()?.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }
}

// ------------- Evaluation context -------------
type Outcome = Result<Arc<dyn DatasetView>>;

static CONTEXTS: AtomicU64 = AtomicU64::new(0);

/// Everything that lives as long as one evaluation: the fingerprint cache,
/// the published graphs and the `serial` counters. Dropping it releases all
/// of them.
pub struct EvaluationContext {
    id: u64,
    cache: Mutex<HashMap<Fingerprint, Arc<OnceLock<Outcome>>, OtherHasher>>,
    graphs: GraphSpace,
    serial: SerialCounter,
    invocations: AtomicUsize,
}

impl EvaluationContext {
    pub fn new() -> Self {
        let id = CONTEXTS.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(context = id, "evaluation context opened");
        Self {
            id,
            cache: Mutex::new(HashMap::default()),
            graphs: GraphSpace::default(),
            serial: SerialCounter::new(),
            invocations: AtomicUsize::new(0),
        }
    }
    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn graphs(&self) -> &GraphSpace {
        &self.graphs
    }
    pub fn serial(&self, args: &[Term]) -> Result<u64> {
        self.serial.serial(args)
    }
    /// How many times a triplifier ran in this context.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
    pub fn is_cached(&self, fingerprint: &Fingerprint) -> Result<bool> {
        Ok(self
            .cache
            .lock()?
            .get(fingerprint)
            .is_some_and(|cell| cell.get().is_some()))
    }

    // The map lock only guards finding the cell; the cell itself serializes
    // the one run per fingerprint.
    fn cell(&self, fingerprint: Fingerprint) -> Result<Arc<OnceLock<Outcome>>> {
        let mut cache = self.cache.lock()?;
        Ok(Arc::clone(cache.entry(fingerprint).or_default()))
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EvaluationContext {
    fn drop(&mut self) {
        debug!(
            context = self.id,
            invocations = self.invocations.load(Ordering::SeqCst),
            "evaluation context closed"
        );
    }
}

// ------------- Dispatcher -------------
pub struct Dispatcher {
    registry: Arc<TriplifierRegistry>,
    settings: Settings,
    fetcher: Fetcher,
}

impl Dispatcher {
    pub fn new(registry: TriplifierRegistry, settings: Settings) -> Result<Self> {
        Ok(Self {
            registry: Arc::new(registry),
            settings,
            fetcher: Fetcher::new()?,
        })
    }
    pub fn registry(&self) -> &TriplifierRegistry {
        &self.registry
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn context(&self) -> EvaluationContext {
        EvaluationContext::new()
    }

    /// Parses `locator`, materializes it and publishes it under the locator
    /// text.
    pub fn resolve(&self, context: &EvaluationContext, locator: &str) -> Result<Arc<dyn DatasetView>> {
        let properties = locator::parse(locator)?;
        self.resolve_properties(context, locator, &properties)
    }

    /// Materializes an already decoded configuration and publishes it under
    /// `name`.
    pub fn resolve_properties(
        &self,
        context: &EvaluationContext,
        name: &str,
        properties: &Properties,
    ) -> Result<Arc<dyn DatasetView>> {
        let fingerprint = Fingerprint::of(properties);
        let cell = context.cell(fingerprint)?;
        let mut ran = false;
        let outcome = cell.get_or_init(|| {
            ran = true;
            self.materialize(context, properties, fingerprint)
        });
        if !ran {
            debug!(context = context.id, %fingerprint, "reusing materialized source");
        }
        let dataset = outcome.clone()?;
        context.graphs.publish(name, &dataset)?;
        Ok(dataset)
    }

    /// The triplifier dispatch would pick, without running it. `Ok(None)`
    /// means no triplifier matches.
    pub fn select(&self, properties: &Properties) -> Result<Option<Arc<TriplifierEntry>>> {
        let mut prefetched = None;
        self.choose(properties, &mut prefetched)
    }

    fn choose(&self, properties: &Properties, prefetched: &mut Option<Fetched>) -> Result<Option<Arc<TriplifierEntry>>> {
        if let Some(name) = properties.triplifier() {
            return self
                .registry
                .by_name(name)
                .map(Some)
                .ok_or_else(|| FacadeError::Config(format!("unknown triplifier '{name}'")));
        }
        if let Some(media_type) = properties.media_type() {
            return self
                .registry
                .by_media_type(media_type)
                .map(Some)
                .ok_or_else(|| FacadeError::Config(format!("no triplifier handles media type '{media_type}'")));
        }
        let Some(location) = properties.location() else {
            return Ok(None);
        };
        if let Some(entry) = fetch::extension(location).and_then(|e| self.registry.by_extension(&e)) {
            return Ok(Some(entry));
        }
        if Fetcher::is_remote(location) {
            let fetched = self.fetcher.fetch(properties)?;
            let entry = fetched
                .content_type
                .as_deref()
                .and_then(|t| self.registry.by_media_type(t));
            *prefetched = Some(fetched);
            return Ok(entry);
        }
        Ok(None)
    }

    fn sink(&self, properties: &Properties, fingerprint: Fingerprint) -> Result<Box<dyn QuadSink>> {
        match properties.ondisk().or_else(|| self.settings.ondisk.clone()) {
            Some(directory) => {
                std::fs::create_dir_all(&directory)
                    .map_err(|e| FacadeError::io(directory.display().to_string(), e))?;
                // one file per materialization; contexts resolving the same
                // fingerprint concurrently never share a store
                let store = Persistor::scratch_in(&directory, &format!("{fingerprint}-"))?;
                debug!(mode = ?store.mode(), "materializing on disk");
                Ok(Box::new(store))
            }
            None => Ok(Box::new(DatasetGraph::new())),
        }
    }

    fn materialize(&self, context: &EvaluationContext, properties: &Properties, fingerprint: Fingerprint) -> Outcome {
        let mut prefetched = None;
        let Some(entry) = self.choose(properties, &mut prefetched)? else {
            return match self.settings.unsupported_format {
                UnsupportedFormat::Fail => Err(FacadeError::UnsupportedFormat(properties.to_string())),
                UnsupportedFormat::Empty => {
                    warn!(source = properties.source_id(), "no triplifier matches, using an empty dataset");
                    Ok(Arc::new(DatasetGraph::new()))
                }
            };
        };
        let options = BuilderOptions::from_properties(properties)?
            .with_blank_prefix(format!("c{}f{}", context.id, fingerprint.short()));
        let mut builder = FacadeXGraphBuilder::new(options, self.sink(properties, fingerprint)?);
        let resource = Resource::new(properties.clone(), entry.name(), self.fetcher.clone(), prefetched);

        context.invocations.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        if let Err(e) = entry.triplify(&resource, &mut builder) {
            warn!(triplifier = entry.name(), source = properties.source_id(), error = %e, "triplification failed");
            return Err(e);
        }
        info!(
            triplifier = entry.name(),
            source = properties.source_id(),
            %fingerprint,
            quads = builder.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "source materialized"
        );
        Ok(builder.finish())
    }
}
