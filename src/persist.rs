// used for persistence
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempPath;
use tracing::debug;

use crate::builder::QuadSink;
use crate::construct::{DatasetView, Literal, Quad, Term, Triple};
use crate::error::{FacadeError, Result};

/// Where a [`Persistor`] keeps its quads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(PathBuf),
}

// term kinds as stored in the Kind columns
const IRI: i64 = 0;
const BLANK: i64 = 1;
const LITERAL: i64 = 2;

/// SQLite backed scratch store for sources too large to keep in memory. It is
/// a drop-in sink for the graph builder and answers the same pattern queries
/// as the in-memory dataset.
pub struct Persistor {
    db: Mutex<Connection>,
    mode: PersistenceMode,
    // declared after the connection so the file is removed once it is closed
    scratch: Option<TempPath>,
}

impl Persistor {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        let connection = match &mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        // The default graph is stored under the empty graph name, since null
        // values would escape the uniqueness constraint.
        connection.execute_batch(
            "
            create table if not exists Quad (
                Graph text not null,
                Subject_Kind integer not null,
                Subject text not null,
                Predicate text not null,
                Object_Kind integer not null,
                Object text not null,
                Object_Datatype text not null,
                Object_Language text not null,
                constraint unique_Quad unique (
                    Graph,
                    Subject_Kind,
                    Subject,
                    Predicate,
                    Object_Kind,
                    Object,
                    Object_Datatype,
                    Object_Language
                )
            );
            ",
        )?;
        debug!(?mode, "persistor ready");
        Ok(Self {
            db: Mutex::new(connection),
            mode,
            scratch: None,
        })
    }
    /// A store in a new, uniquely named file under `directory`, starting with
    /// `prefix`. The file is deleted when the persistor is dropped.
    pub fn scratch_in(directory: &Path, prefix: &str) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".sqlite")
            .tempfile_in(directory)
            .map_err(|e| FacadeError::io(directory.display().to_string(), e))?
            .into_temp_path();
        let mut persistor = Self::new(PersistenceMode::File(path.to_path_buf()))?;
        persistor.scratch = Some(path);
        Ok(persistor)
    }
    pub fn mode(&self) -> &PersistenceMode {
        &self.mode
    }
    pub fn persist_quad(&self, quad: &Quad) -> Result<bool> {
        let graph = quad.graph.as_ref().map(Term::lexical).unwrap_or("");
        let (subject_kind, subject) = encode(&quad.triple.subject);
        let (object_kind, object) = encode(&quad.triple.object);
        let (datatype, language) = match quad.triple.object.as_literal() {
            Some(l) => (l.datatype(), l.language().unwrap_or("")),
            None => ("", ""),
        };
        let db = self.db.lock()?;
        let mut add_quad = db.prepare_cached(
            "
            insert or ignore into Quad (
                Graph,
                Subject_Kind,
                Subject,
                Predicate,
                Object_Kind,
                Object,
                Object_Datatype,
                Object_Language
            ) values (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )?;
        let inserted = add_quad.execute(params![
            graph,
            subject_kind,
            subject,
            quad.triple.predicate.lexical(),
            object_kind,
            object,
            datatype,
            language
        ])?;
        Ok(inserted > 0)
    }
}

fn encode(term: &Term) -> (i64, &str) {
    match term {
        Term::Iri(iri) => (IRI, iri),
        Term::Blank(label) => (BLANK, label),
        Term::Literal(literal) => (LITERAL, literal.lexical()),
    }
}

fn decode(kind: i64, value: String, datatype: String, language: String) -> Result<Term> {
    match kind {
        IRI => Ok(Term::iri(value)),
        BLANK => Ok(Term::blank(value)),
        LITERAL if !language.is_empty() => Ok(Term::Literal(Literal::with_language(value, language))),
        LITERAL => Ok(Term::literal(value, datatype)),
        _ => Err(FacadeError::Persistence(format!("unknown term kind {kind}"))),
    }
}

impl DatasetView for Persistor {
    fn graph_names(&self) -> Result<Vec<Term>> {
        let db = self.db.lock()?;
        let mut all_graphs = db.prepare_cached(
            "
            select distinct Graph
                from Quad
                where Graph <> ''
                order by Graph
            ",
        )?;
        let names = all_graphs
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|name| name.map(Term::iri).map_err(FacadeError::from))
            .collect::<Result<Vec<_>>>()?;
        Ok(names)
    }

    fn find(
        &self,
        graph: Option<&Term>,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Vec<Triple>> {
        let mut sql = String::from(
            "
            select Subject_Kind, Subject, Predicate, Object_Kind, Object, Object_Datatype, Object_Language
                from Quad
                where Graph = ?",
        );
        let mut values = vec![SqlValue::Text(graph.map(Term::lexical).unwrap_or("").to_string())];
        if let Some(s) = subject {
            let (kind, value) = encode(s);
            sql.push_str(" and Subject_Kind = ? and Subject = ?");
            values.push(SqlValue::Integer(kind));
            values.push(SqlValue::Text(value.to_string()));
        }
        if let Some(p) = predicate {
            sql.push_str(" and Predicate = ?");
            values.push(SqlValue::Text(p.lexical().to_string()));
        }
        if let Some(o) = object {
            let (kind, value) = encode(o);
            let (datatype, language) = match o.as_literal() {
                Some(l) => (l.datatype(), l.language().unwrap_or("")),
                None => ("", ""),
            };
            sql.push_str(" and Object_Kind = ? and Object = ? and Object_Datatype = ? and Object_Language = ?");
            values.push(SqlValue::Integer(kind));
            values.push(SqlValue::Text(value.to_string()));
            values.push(SqlValue::Text(datatype.to_string()));
            values.push(SqlValue::Text(language.to_string()));
        }
        sql.push_str(" order by rowid");
        let db = self.db.lock()?;
        let mut statement = db.prepare_cached(&sql)?;
        let rows = statement.query_map(params_from_iter(values), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;
        let mut triples = Vec::new();
        for row in rows {
            let (subject_kind, subject, predicate, object_kind, object, datatype, language) = row?;
            triples.push(Triple::new(
                decode(subject_kind, subject, String::new(), String::new())?,
                Term::iri(predicate),
                decode(object_kind, object, datatype, language)?,
            ));
        }
        Ok(triples)
    }

    fn len(&self) -> Result<usize> {
        let db = self.db.lock()?;
        let count: i64 = db.query_row("select count(*) from Quad", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl QuadSink for Persistor {
    fn insert(&mut self, quad: Quad) -> Result<bool> {
        self.persist_quad(&quad)
    }
    fn into_view(self: Box<Self>) -> Arc<dyn DatasetView> {
        Arc::new(*self)
    }
}
