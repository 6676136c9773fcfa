//! Facadex – query heterogeneous sources as graphs, triplified on demand.
//!
//! Every source (a JSON file, a text document, a web resource) is presented
//! through one generic RDF shape, *Facade-X*:
//! * A *container* is a node. Each source has one root container, typed
//!   `fx:root`.
//! * Children sit in *slots* of their container: positional slots are the
//!   `rdf:_1`, `rdf:_2`, ... membership predicates, named slots are predicates
//!   in the configured namespace.
//! * Leaf values are typed literals.
//!
//! ## Modules
//! * [`locator`] – Decoder for the `x-sparql-anything:` configuration strings.
//! * [`properties`] – The decoded configuration and its reserved keys.
//! * [`builder`] – [`builder::FacadeXGraphBuilder`], the only way triplifiers write.
//! * [`construct`] – Terms, triples, quads and the in-memory dataset.
//! * [`datatype`] – Literal kinds and the [`datatype::Value`] a slot holds.
//! * [`triplifier`] – The adapter registry plus the text and JSON triplifiers.
//! * [`dispatch`] – Adapter selection, the per-evaluation fingerprint cache and
//!   the graph space results are published into.
//! * [`fetch`] – Inline content, files and http(s) locations.
//! * [`persist`] – SQLite scratch store for large sources.
//! * [`ordering`] – `cardinal`, `before`, `backward`, `serial` and friends.
//! * [`settings`] – Process settings read through the `config` crate.
//!
//! ## Quick Start
//! ```
//! use facadex::dispatch::Dispatcher;
//! use facadex::settings::Settings;
//! use facadex::triplifier::TriplifierRegistry;
//! let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).unwrap();
//! let context = dispatcher.context();
//! let dataset = dispatcher
//!     .resolve(&context, "x-sparql-anything:content={\"name\":\"Alice\"},media-type=application/json")
//!     .unwrap();
//! assert_eq!(dataset.len().unwrap(), 2);
//! ```

pub mod builder;
pub mod construct;
pub mod datatype;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod ordering;
pub mod persist;
pub mod properties;
pub mod settings;
pub mod triplifier;
pub mod vocab;

pub use builder::{FacadeXGraphBuilder, Slot};
pub use construct::{DatasetView, Quad, Term, Triple};
pub use dispatch::{Dispatcher, EvaluationContext};
pub use error::{FacadeError, FaultKind, Result};
pub use properties::Properties;
