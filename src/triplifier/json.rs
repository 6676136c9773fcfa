//! JSON and JSON Lines. Objects become containers with named slots, arrays
//! containers with positional slots, scalars typed literals; `null` writes
//! nothing.

use serde_json::Value as Json;
use tracing::warn;

use crate::builder::{FacadeXGraphBuilder, Slot, encode_key};
use crate::datatype::Value;
use crate::error::Result;
use crate::triplifier::{Resource, TriplifierEntry};

pub const NAME: &str = "json";
pub const LINES_NAME: &str = "json-lines";

pub fn entry() -> TriplifierEntry {
    TriplifierEntry::new(NAME, &["application/json"], &["json"], triplify)
}

pub fn lines_entry() -> TriplifierEntry {
    TriplifierEntry::new(
        LINES_NAME,
        &["application/x-ndjson", "application/jsonl"],
        &["jsonl", "ndjson"],
        triplify_lines,
    )
}

pub fn triplify(resource: &Resource, builder: &mut FacadeXGraphBuilder) -> Result<()> {
    let bytes = resource.bytes()?;
    let document: Json = serde_json::from_slice(&bytes).map_err(|e| resource.malformed(e))?;
    let source = builder.main_source_id().to_string();
    let root = builder.add_root(&source, None)?;
    match &document {
        Json::Object(_) | Json::Array(_) => children(builder, &source, &root, &document),
        scalar => builder.add_value(&source, &root, Slot::Next, scalar_value(scalar)).map(|_| ()),
    }
}

/// One document per line. A line that does not parse is skipped and takes no
/// position.
pub fn triplify_lines(resource: &Resource, builder: &mut FacadeXGraphBuilder) -> Result<()> {
    let text = resource.text_lossy()?;
    let source = builder.main_source_id().to_string();
    let root = builder.add_root(&source, None)?;
    let mut position = 0;
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Json>(line) {
            Ok(document) => {
                if !document.is_null() {
                    position += 1;
                }
                let id = format!("{root}/_{position}");
                attach(builder, &source, &root, Slot::Next, &id, &document)?;
            }
            Err(e) => {
                warn!(triplifier = LINES_NAME, line = number + 1, error = %e, "skipping malformed line");
            }
        }
    }
    Ok(())
}

fn children(builder: &mut FacadeXGraphBuilder, source: &str, container: &str, value: &Json) -> Result<()> {
    match value {
        Json::Object(members) => {
            for (key, member) in members {
                // container ids are paths below the root id
                let id = format!("{container}/{}", encode_key(key));
                attach(builder, source, container, Slot::Key(key.clone()), &id, member)?;
            }
        }
        Json::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let id = format!("{container}/_{}", index + 1);
                attach(builder, source, container, Slot::Next, &id, item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn attach(
    builder: &mut FacadeXGraphBuilder,
    source: &str,
    parent: &str,
    slot: Slot,
    id: &str,
    value: &Json,
) -> Result<()> {
    match value {
        Json::Object(_) | Json::Array(_) => {
            builder.add_container(source, parent, slot, id)?;
            children(builder, source, id, value)
        }
        scalar => builder.add_value(source, parent, slot, scalar_value(scalar)).map(|_| ()),
    }
}

fn scalar_value(value: &Json) -> Value {
    match value {
        Json::Bool(b) => Value::from(*b),
        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::from(i),
            (None, Some(f)) => Value::from(f),
            (None, None) => Value::from(n.to_string()),
        },
        Json::String(s) => Value::from(s.as_str()),
        _ => Value::Null,
    }
}
