//! Functions over positional slots (`rdf:_N`) and the per-context `serial`
//! counter.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::construct::{OtherHasher, Term};
use crate::error::{FacadeError, Result};
use crate::vocab;

fn not_a_slot(term: &Term) -> FacadeError {
    FacadeError::Type(format!("{term} is not a positional slot"))
}

/// `rdf:_n`. There is no slot 0.
pub fn slot(position: u64) -> Result<Term> {
    if position == 0 {
        return Err(FacadeError::Type("positions start at 1".into()));
    }
    Ok(Term::iri(vocab::slot_iri(position)))
}

/// The position of a slot predicate: `cardinal(rdf:_3) == 3`.
pub fn cardinal(p: &Term) -> Result<u64> {
    let digits = p
        .as_iri()
        .and_then(|iri| iri.strip_prefix(vocab::RDF))
        .and_then(|local| local.strip_prefix('_'))
        .ok_or_else(|| not_a_slot(p))?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_a_slot(p));
    }
    digits.parse::<u64>().map_err(|_| not_a_slot(p))
}

pub fn before(p: &Term, q: &Term) -> Result<bool> {
    Ok(cardinal(p)? < cardinal(q)?)
}

pub fn after(p: &Term, q: &Term) -> Result<bool> {
    Ok(cardinal(p)? > cardinal(q)?)
}

/// The slot `n` positions earlier; `backward(rdf:_5, 2) == rdf:_3`.
pub fn backward(p: &Term, n: i64) -> Result<Term> {
    shift(p, -(n as i128))
}

pub fn forward(p: &Term, n: i64) -> Result<Term> {
    shift(p, n as i128)
}

pub fn previous(p: &Term) -> Result<Term> {
    backward(p, 1)
}

pub fn next(p: &Term) -> Result<Term> {
    forward(p, 1)
}

fn shift(p: &Term, delta: i128) -> Result<Term> {
    let target = cardinal(p)? as i128 + delta;
    if target < 1 || target > u64::MAX as i128 {
        return Err(FacadeError::Type(format!(
            "moving {p} by {delta} leaves the positional range"
        )));
    }
    slot(target as u64)
}

/// An IRI made of the lexical forms of the arguments, in order.
pub fn entity(args: &[Term]) -> Result<Term> {
    let iri: String = args.iter().map(Term::lexical).collect();
    if iri.is_empty() {
        return Err(FacadeError::Type("entity needs a non-empty argument".into()));
    }
    Ok(Term::iri(iri))
}

/// Occurrence counters keyed by argument tuple. Owned by one evaluation
/// context; increments are atomic across threads sharing it.
#[derive(Debug, Default)]
pub struct SerialCounter {
    counters: Mutex<HashMap<Vec<Term>, u64, OtherHasher>>,
}

impl SerialCounter {
    pub fn new() -> Self {
        Self::default()
    }
    /// 1 for the first occurrence of `args`, then 2, 3 and so on.
    pub fn serial(&self, args: &[Term]) -> Result<u64> {
        let mut counters = self.counters.lock()?;
        let counter = counters.entry(args.to_vec()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
    /// Number of distinct tuples seen.
    pub fn len(&self) -> Result<usize> {
        Ok(self.counters.lock()?.len())
    }
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
