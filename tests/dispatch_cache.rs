use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use facadex::builder::{FacadeXGraphBuilder, Slot};
use facadex::construct::{DatasetView, Term};
use facadex::dispatch::{Dispatcher, Fingerprint};
use facadex::error::{FacadeError, FaultKind};
use facadex::locator;
use facadex::settings::{Settings, UnsupportedFormat};
use facadex::triplifier::{Resource, TriplifierEntry, TriplifierRegistry};

fn counting(name: &str, calls: Arc<AtomicUsize>) -> TriplifierEntry {
    TriplifierEntry::new(name, &["application/x-counting"], &["count"], move |resource: &Resource, builder: &mut FacadeXGraphBuilder| {
        calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        let source = builder.main_source_id().to_string();
        let root = builder.add_root(&source, None)?;
        builder.add_value(&source, &root, Slot::Next, resource.text()?)?;
        Ok(())
    })
}

fn dispatcher_with(entry: TriplifierEntry, settings: Settings) -> Dispatcher {
    let mut registry = TriplifierRegistry::with_builtins();
    registry.register(entry);
    Dispatcher::new(registry, settings).expect("dispatcher")
}

fn counting_dispatcher() -> (Dispatcher, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher_with(counting("counting", Arc::clone(&calls)), Settings::default());
    (dispatcher, calls)
}

#[test]
fn identical_configurations_run_the_adapter_once() {
    let (dispatcher, calls) = counting_dispatcher();
    let context = dispatcher.context();
    let fingerprint = Fingerprint::of(&locator::parse("content=hello,triplifier=counting").expect("parses"));
    assert!(!context.is_cached(&fingerprint).expect("lock"));
    let first = dispatcher.resolve(&context, "content=hello,triplifier=counting").expect("first");
    assert!(context.is_cached(&fingerprint).expect("lock"));
    let second = dispatcher.resolve(&context, "triplifier=counting,content=hello").expect("second");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(context.invocations(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len().expect("len"), 2);
}

#[test]
fn concurrent_resolution_runs_the_adapter_once() {
    let (dispatcher, calls) = counting_dispatcher();
    let context = dispatcher.context();
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                dispatcher
                    .resolve(&context, "content=shared,triplifier=counting")
                    .expect("resolves");
            });
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn different_configurations_each_run() {
    let (dispatcher, calls) = counting_dispatcher();
    let context = dispatcher.context();
    dispatcher.resolve(&context, "content=one,triplifier=counting").expect("one");
    dispatcher.resolve(&context, "content=two,triplifier=counting").expect("two");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn a_fresh_context_runs_the_adapter_again() {
    let (dispatcher, calls) = counting_dispatcher();
    {
        let context = dispatcher.context();
        dispatcher.resolve(&context, "content=hello,triplifier=counting").expect("first");
    }
    let context = dispatcher.context();
    dispatcher.resolve(&context, "content=hello,triplifier=counting").expect("second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn failures_are_cached_without_retry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let failing = TriplifierEntry::new("failing", &[], &[], move |resource: &Resource, _: &mut FacadeXGraphBuilder| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(resource.malformed("always broken"))
    });
    let dispatcher = dispatcher_with(failing, Settings::default());
    let context = dispatcher.context();
    for _ in 0..2 {
        let e = dispatcher
            .resolve(&context, "content=x,triplifier=failing")
            .expect_err("fails");
        assert_eq!(e.kind(), FaultKind::Adapter);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unknown_triplifier_is_a_configuration_fault() {
    let (dispatcher, calls) = counting_dispatcher();
    let context = dispatcher.context();
    let e = dispatcher
        .resolve(&context, "content=x,triplifier=nope")
        .expect_err("unknown");
    assert_eq!(e.kind(), FaultKind::Configuration);
    let e = dispatcher
        .resolve(&context, "content=x,media-type=application/x-nope")
        .expect_err("unknown media type");
    assert_eq!(e.kind(), FaultKind::Configuration);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_file_is_an_io_fault() {
    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).expect("dispatcher");
    let context = dispatcher.context();
    let e = dispatcher
        .resolve(&context, "location=/definitely/not/here/missing.json")
        .expect_err("missing");
    assert_eq!(e.kind(), FaultKind::Io);
    assert!(matches!(e, FacadeError::Io { ref location, .. } if location == "/definitely/not/here/missing.json"));
}

#[test]
fn unmatched_extension_follows_the_policy() {
    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).expect("dispatcher");
    let context = dispatcher.context();
    let e = dispatcher.resolve(&context, "data.unknownformat").expect_err("unsupported");
    assert_eq!(e.kind(), FaultKind::Resolution);

    let settings = Settings {
        unsupported_format: UnsupportedFormat::Empty,
        ..Settings::default()
    };
    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), settings).expect("dispatcher");
    let context = dispatcher.context();
    let dataset = dispatcher.resolve(&context, "data.unknownformat").expect("empty");
    assert!(dataset.is_empty().expect("is_empty"));
}

#[test]
fn selection_prefers_overrides_then_extensions() {
    let (dispatcher, _) = counting_dispatcher();
    let pick = |text: &str| {
        dispatcher
            .select(&locator::parse(text).expect("parses"))
            .expect("selects")
            .map(|entry| entry.name().to_string())
    };
    assert_eq!(pick("location=a.json,triplifier=text"), Some("text".into()));
    assert_eq!(pick("location=a.txt,media-type=application/json; charset=utf-8"), Some("json".into()));
    assert_eq!(pick("location=a.COUNT"), Some("counting".into()));
    assert_eq!(pick("location=http://example.com/a.jsonl?page=2"), Some("json-lines".into()));
    assert_eq!(pick("location=http://example.com/a.json#k=v&w=z,c=1&d=2"), Some("json".into()));
    assert_eq!(pick("location=notes"), None);
}

#[test]
fn resolved_graphs_are_published_by_locator() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("people.json");
    std::fs::write(&path, r#"{"name": "Ada"}"#).expect("write");
    let locator = format!("location={}", path.display());

    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).expect("dispatcher");
    let context = dispatcher.context();
    dispatcher.resolve(&context, &locator).expect("resolves");
    let published = context.graphs().get(&locator).expect("lock").expect("published");
    assert!(published.graph_name().is_none());
    let values = published.find(None, None, Some(&Term::string("Ada"))).expect("find");
    assert_eq!(values.len(), 1);
    assert!(context.graphs().get("something else").expect("lock").is_none());
}

#[test]
fn blank_nodes_of_different_sources_do_not_collide() {
    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).expect("dispatcher");
    let context = dispatcher.context();
    let a = dispatcher.resolve(&context, "content=[1],media-type=application/json").expect("a");
    let b = dispatcher.resolve(&context, "content=[2],media-type=application/json").expect("b");
    let subjects = |d: &Arc<dyn DatasetView>| -> Vec<Term> {
        d.find(None, None, None, None).expect("find").into_iter().map(|t| t.subject).collect()
    };
    let (a, b) = (subjects(&a), subjects(&b));
    assert!(a.iter().all(|s| s.is_blank()));
    assert!(a.iter().all(|s| !b.contains(s)));
}

fn scratch_files(store: &std::path::Path, fingerprint: &Fingerprint) -> Vec<std::path::PathBuf> {
    let prefix = format!("{fingerprint}-");
    std::fs::read_dir(store)
        .expect("read store")
        .map(|entry| entry.expect("entry").path())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.starts_with(&prefix) && name.ends_with(".sqlite")
        })
        .collect()
}

#[test]
fn on_disk_sources_live_in_a_scratch_store_while_in_use() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = dir.path().join("stores");
    let text = format!("content=[1\\,2\\,3],media-type=application/json,ondisk={}", store.display());
    let fingerprint = Fingerprint::of(&locator::parse(&text).expect("parses"));

    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).expect("dispatcher");
    let context = dispatcher.context();
    let dataset = dispatcher.resolve(&context, &text).expect("resolves");
    assert_eq!(dataset.len().expect("len"), 4);
    assert_eq!(scratch_files(&store, &fingerprint).len(), 1);

    drop(dataset);
    drop(context);
    assert!(scratch_files(&store, &fingerprint).is_empty());
}

#[test]
fn concurrent_contexts_materialize_the_same_on_disk_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = dir.path().join("stores");
    let numbers: Vec<String> = (0..2000).map(|i| i.to_string()).collect();
    let text = format!(
        "content=[{}],media-type=application/json,ondisk={}",
        numbers.join("\\,"),
        store.display()
    );
    let fingerprint = Fingerprint::of(&locator::parse(&text).expect("parses"));

    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).expect("dispatcher");
    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let context = dispatcher.context();
                    let dataset = dispatcher.resolve(&context, &text)?;
                    dataset.len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread"), Ok(2001));
        }
    });
    assert!(scratch_files(&store, &fingerprint).is_empty());
}

#[test]
fn fingerprints_ignore_key_order() {
    let a = Fingerprint::of(&locator::parse("a=1,b=2").expect("parses"));
    let b = Fingerprint::of(&locator::parse("b=2,a=1").expect("parses"));
    let c = Fingerprint::of(&locator::parse("a=12").expect("parses"));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string().len(), 64);
    assert!(a.to_string().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert!(a.to_string().starts_with(&a.short()));
    assert_eq!(a.short().len(), 12);
}

#[test]
fn serial_counters_stay_in_their_context() {
    let dispatcher = Dispatcher::new(TriplifierRegistry::with_builtins(), Settings::default()).expect("dispatcher");
    let tuple = [Term::string("x")];
    let first = dispatcher.context();
    assert_eq!(first.serial(&tuple), Ok(1));
    assert_eq!(first.serial(&tuple), Ok(2));
    let second = dispatcher.context();
    assert_eq!(second.serial(&tuple), Ok(1));
    assert_ne!(first.id(), second.id());
}
