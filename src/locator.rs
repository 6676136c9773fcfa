//! Decoder for the `x-sparql-anything:key=value,...` locator mini-language.
//!
//! A locator is either a bareword (the whole text is the `location`) or a
//! comma separated list of `key=value` pairs. Literal commas and equal signs in
//! values are written `\,` and `\=`. The value of `location` is special: URLs
//! routinely carry unescaped `=`, `&`, `#` and `,`, so it is read greedily and
//! a comma only ends it when it is followed by `<identifier>=` and does not
//! continue the URL's own `&` separated query or fragment parameters.
//!
//! ```
//! use facadex::locator;
//! let p = locator::parse("x-sparql-anything:location=data.json?a=1&b=2,blank-nodes=false").unwrap();
//! assert_eq!(p.location(), Some("data.json?a=1&b=2"));
//! assert_eq!(p.get("blank-nodes"), Some("false"));
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{FacadeError, Result};
use crate::properties::{LOCATION, Properties};
use crate::vocab::LOCATOR_SCHEME;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap();
    static ref LEADING_KEY: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*=").unwrap();
    static ref KEY_BOUNDARY: Regex = Regex::new(r"^,[A-Za-z_][A-Za-z0-9_.\-]*=").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingKey,
    InValue,
    InLocationValue,
    Escape(Resume),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Value,
    Location,
}
impl Resume {
    fn state(self) -> State {
        match self {
            Resume::Value => State::InValue,
            Resume::Location => State::InLocationValue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlPart {
    Path,
    Query,
    Fragment,
}

/// Strips the reserved scheme, if present.
pub fn strip_scheme(locator: &str) -> &str {
    locator
        .strip_prefix(LOCATOR_SCHEME)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(locator)
}

pub fn parse(locator: &str) -> Result<Properties> {
    let rest = strip_scheme(locator);
    let base = locator.len() - rest.len();
    if rest.is_empty() {
        return Err(FacadeError::Locator {
            message: "empty locator".into(),
            offset: base,
        });
    }
    if !LEADING_KEY.is_match(rest) {
        let mut properties = Properties::new();
        properties.insert(LOCATION, rest);
        return Ok(properties);
    }
    Tokenizer::new(rest, base).run()
}

struct Tokenizer<'a> {
    text: &'a str,
    base: usize,
    properties: Properties,
    key: String,
    key_offset: usize,
    value: String,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str, base: usize) -> Self {
        Self {
            text,
            base,
            properties: Properties::new(),
            key: String::new(),
            key_offset: 0,
            value: String::new(),
        }
    }

    fn fault(&self, message: impl Into<String>, offset: usize) -> FacadeError {
        FacadeError::Locator {
            message: message.into(),
            offset: self.base + offset,
        }
    }

    fn run(mut self) -> Result<Properties> {
        let mut state = State::SeekingKey;
        let mut url_part = UrlPart::Path;
        for (offset, c) in self.text.char_indices() {
            state = match state {
                State::SeekingKey => match c {
                    '=' => {
                        self.check_key(offset)?;
                        if self.key == LOCATION {
                            url_part = UrlPart::Path;
                            State::InLocationValue
                        } else {
                            State::InValue
                        }
                    }
                    ',' if self.key.is_empty() => {
                        return Err(self.fault("empty key", offset));
                    }
                    ',' => {
                        return Err(self.fault(format!("key '{}' has no value", self.key), offset));
                    }
                    _ => {
                        if self.key.is_empty() {
                            self.key_offset = offset;
                        }
                        self.key.push(c);
                        State::SeekingKey
                    }
                },
                State::InValue => match c {
                    '\\' => State::Escape(Resume::Value),
                    ',' => {
                        self.commit();
                        State::SeekingKey
                    }
                    _ => {
                        self.value.push(c);
                        State::InValue
                    }
                },
                State::InLocationValue => match c {
                    '\\' => State::Escape(Resume::Location),
                    ',' if self.is_boundary(offset, url_part) => {
                        self.commit();
                        State::SeekingKey
                    }
                    _ => {
                        if c == '?' && url_part == UrlPart::Path {
                            url_part = UrlPart::Query;
                        } else if c == '#' && url_part != UrlPart::Fragment {
                            url_part = UrlPart::Fragment;
                        }
                        self.value.push(c);
                        State::InLocationValue
                    }
                },
                State::Escape(resume) => {
                    if c != ',' && c != '=' {
                        self.value.push('\\');
                    }
                    self.value.push(c);
                    resume.state()
                }
            };
        }
        match state {
            State::SeekingKey if self.key.is_empty() => {
                return Err(self.fault("dangling separator", self.text.len()));
            }
            State::SeekingKey => {
                return Err(self.fault(format!("key '{}' has no value", self.key), self.text.len()));
            }
            State::Escape(_) => {
                self.value.push('\\');
                self.commit();
            }
            State::InValue | State::InLocationValue => self.commit(),
        }
        Ok(self.properties)
    }

    fn check_key(&self, offset: usize) -> Result<()> {
        if self.key.is_empty() {
            return Err(self.fault("empty key", offset));
        }
        if !IDENTIFIER.is_match(&self.key) {
            return Err(self.fault(format!("'{}' is not a valid key", self.key), self.key_offset));
        }
        Ok(())
    }

    // A comma inside the location ends it only before `<identifier>=`, and in
    // the query or fragment only when the candidate value carries no `&`.
    fn is_boundary(&self, offset: usize, url_part: UrlPart) -> bool {
        let rest = &self.text[offset..];
        let Some(boundary) = KEY_BOUNDARY.find(rest) else {
            return false;
        };
        if url_part == UrlPart::Path {
            return true;
        }
        let candidate = &rest[boundary.end()..];
        let mut previous = ' ';
        for c in candidate.chars() {
            if c == ',' && previous != '\\' {
                break;
            }
            if c == '&' {
                return false;
            }
            previous = c;
        }
        true
    }

    fn commit(&mut self) {
        let key = std::mem::take(&mut self.key);
        let value = std::mem::take(&mut self.value);
        self.properties.insert(key, value);
    }
}

/// Writes properties back as a locator that [`parse`] decodes to the same map,
/// as long as no value has a backslash directly before a comma or equal sign.
pub fn format(properties: &Properties) -> String {
    let mut locator = format!("{LOCATOR_SCHEME}:");
    let mut first = true;
    for (key, value) in properties.iter() {
        if !first {
            locator.push(',');
        }
        first = false;
        locator.push_str(key);
        locator.push('=');
        for c in value.chars() {
            match c {
                ',' => locator.push_str("\\,"),
                '=' if key != LOCATION => locator.push_str("\\="),
                _ => locator.push(c),
            }
        }
    }
    locator
}
