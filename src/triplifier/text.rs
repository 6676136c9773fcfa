//! Plain text: the whole document, or its regex matches or chunks, as
//! positional values of the root container.

use regex::Regex;

use crate::builder::{FacadeXGraphBuilder, Slot};
use crate::error::{FacadeError, Result};
use crate::triplifier::{Resource, TriplifierEntry};

pub const NAME: &str = "text";
pub const REGEX: &str = "txt.regex";
pub const GROUP: &str = "txt.group";
pub const SPLIT: &str = "txt.split";

pub fn entry() -> TriplifierEntry {
    TriplifierEntry::new(NAME, &["text/plain"], &["txt", "text"], triplify)
}

fn pattern(key: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FacadeError::Config(format!("'{key}' is not a valid pattern: {e}")))
}

pub fn triplify(resource: &Resource, builder: &mut FacadeXGraphBuilder) -> Result<()> {
    let properties = resource.properties();
    let text = resource.text_lossy()?;
    let source = builder.main_source_id().to_string();
    let root = builder.add_root(&source, None)?;

    if let Some(expression) = properties.get(REGEX) {
        let regex = pattern(REGEX, expression)?;
        let group = properties.number(GROUP)?.unwrap_or(0);
        if group >= regex.captures_len() {
            return Err(FacadeError::Config(format!(
                "'{GROUP}' is {group} but the pattern has {} groups",
                regex.captures_len() - 1
            )));
        }
        for captures in regex.captures_iter(&text) {
            // a group that did not take part in the match is a null
            let matched = captures.get(group).map(|m| m.as_str());
            builder.add_value(&source, &root, Slot::Next, matched)?;
        }
    } else if let Some(expression) = properties.get(SPLIT) {
        let regex = pattern(SPLIT, expression)?;
        for chunk in regex.split(&text) {
            builder.add_value(&source, &root, Slot::Next, chunk)?;
        }
    } else {
        builder.add_value(&source, &root, Slot::Next, text)?;
    }
    Ok(())
}
