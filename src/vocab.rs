//! IRIs of the vocabularies the Facade-X model is expressed in.

pub const FX: &str = "http://sparql.xyz/facade-x/ns/";
pub const XYZ: &str = "http://sparql.xyz/facade-x/data/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

pub const FX_ROOT: &str = "http://sparql.xyz/facade-x/ns/root";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_MEMBER: &str = "http://www.w3.org/2000/01/rdf-schema#member";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_HEX_BINARY: &str = "http://www.w3.org/2001/XMLSchema#hexBinary";

/// The reserved scheme that marks a Facade-X source locator.
pub const LOCATOR_SCHEME: &str = "x-sparql-anything";

/// IRI of the positional slot predicate `rdf:_n`.
pub fn slot_iri(position: u64) -> String {
    format!("{RDF}_{position}")
}
