use facadex::builder::{BuilderOptions, FacadeXGraphBuilder, QuadSink, Slot};
use facadex::construct::{DatasetGraph, DatasetView, Literal, Quad, Term, Triple};
use facadex::locator;
use facadex::persist::{PersistenceMode, Persistor};
use facadex::vocab;

fn sample() -> Vec<Quad> {
    let s = Term::iri("http://example.com/s");
    let g = Term::iri("http://example.com/g");
    vec![
        Quad::new(None, Triple::new(s.clone(), Term::iri(vocab::RDF_TYPE), Term::iri(vocab::FX_ROOT))),
        Quad::new(None, Triple::new(s.clone(), Term::iri(vocab::slot_iri(1)), Term::string("one"))),
        Quad::new(None, Triple::new(s.clone(), Term::iri(vocab::slot_iri(2)), Term::literal("2", vocab::XSD_LONG))),
        Quad::new(
            None,
            Triple::new(Term::blank("b1"), Term::iri(vocab::slot_iri(1)), Term::Literal(Literal::with_language("hej", "sv"))),
        ),
        Quad::new(Some(g.clone()), Triple::new(s, Term::iri(vocab::slot_iri(1)), Term::string("one"))),
    ]
}

fn fill(sink: &mut dyn QuadSink) {
    for quad in sample() {
        assert!(sink.insert(quad.clone()).expect("insert"));
        assert!(!sink.insert(quad).expect("insert again"));
    }
}

#[test]
fn sqlite_sink_answers_like_the_in_memory_one() {
    let mut memory = DatasetGraph::new();
    let mut sqlite = Persistor::new(PersistenceMode::InMemory).expect("persistor");
    fill(&mut memory);
    fill(&mut sqlite);

    assert_eq!(memory.len().expect("len"), 5);
    assert_eq!(sqlite.len().expect("len"), 5);
    assert_eq!(sqlite.graph_names().expect("names"), memory.graph_names().expect("names"));

    let one = Term::string("one");
    let lexically_equal = Term::literal("one", vocab::XSD_LONG);
    let s = Term::iri("http://example.com/s");
    let first = Term::iri(vocab::slot_iri(1));
    for (subject, predicate, object) in [
        (None, None, None),
        (Some(&s), None, None),
        (None, Some(&first), None),
        (None, None, Some(&one)),
        (None, None, Some(&lexically_equal)),
        (Some(&Term::blank("b1")), None, None),
    ] {
        assert_eq!(
            sqlite.find(None, subject, predicate, object).expect("find"),
            memory.find(None, subject, predicate, object).expect("find"),
        );
    }
    let g = Term::iri("http://example.com/g");
    assert_eq!(sqlite.find(Some(&g), None, None, None).expect("find").len(), 1);
    assert_eq!(sqlite.quads().expect("quads"), memory.quads().expect("quads"));
}

#[test]
fn scratch_files_are_unique_and_removed_on_drop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut first = Persistor::scratch_in(dir.path(), "source-").expect("persistor");
    let second = Persistor::scratch_in(dir.path(), "source-").expect("persistor");
    fill(&mut first);
    assert_eq!(first.len().expect("len"), 5);
    assert!(second.is_empty().expect("is_empty"));

    let (PersistenceMode::File(first_path), PersistenceMode::File(second_path)) = (first.mode().clone(), second.mode().clone())
    else {
        panic!("scratch stores are file backed");
    };
    assert_ne!(first_path, second_path);
    for path in [&first_path, &second_path] {
        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
        assert!(name.starts_with("source-") && name.ends_with(".sqlite"), "{name}");
        assert!(path.exists());
    }
    drop(first);
    assert!(!first_path.exists());
    assert!(second_path.exists());
    drop(second);
    assert!(!second_path.exists());
}

#[test]
fn builder_writes_through_the_sqlite_sink() {
    let properties = locator::parse("location=doc.txt").expect("parses");
    let options = BuilderOptions::from_properties(&properties).expect("options");
    let sink = Persistor::new(PersistenceMode::InMemory).expect("persistor");
    let mut builder = FacadeXGraphBuilder::new(options, Box::new(sink));
    let root = builder.add_root("doc.txt", None).expect("root");
    builder.add_value("doc.txt", &root, Slot::Next, "a").expect("value");
    builder.add_value("doc.txt", &root, Slot::Next, 7i64).expect("value");
    let dataset = builder.finish();
    assert_eq!(dataset.len().expect("len"), 3);
    let values = dataset
        .find(None, None, None, Some(&Term::literal("7", vocab::XSD_LONG)))
        .expect("find");
    assert_eq!(values.len(), 1);
}
