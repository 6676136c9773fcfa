use facadex::builder::FacadeXGraphBuilder;
use facadex::triplifier::{Resource, TriplifierEntry, TriplifierRegistry};

fn noop(_: &Resource, _: &mut FacadeXGraphBuilder) -> facadex::Result<()> {
    Ok(())
}

#[test]
fn builtins_are_registered() {
    let registry = TriplifierRegistry::with_builtins();
    assert_eq!(registry.names(), vec!["json", "json-lines", "text"]);
    assert_eq!(registry.by_extension("JSON").map(|e| e.name().to_string()), Some("json".into()));
    assert_eq!(registry.by_extension("ndjson").map(|e| e.name().to_string()), Some("json-lines".into()));
    assert_eq!(
        registry.by_media_type("Text/Plain; charset=utf-8").map(|e| e.name().to_string()),
        Some("text".into())
    );
    assert!(registry.by_extension("csv").is_none());
}

#[test]
fn later_registrations_take_over_capabilities() {
    let mut registry = TriplifierRegistry::with_builtins();
    assert!(registry.register(TriplifierEntry::new("custom", &["application/x-custom"], &["json"], noop)).is_none());
    assert_eq!(registry.by_extension("json").map(|e| e.name().to_string()), Some("custom".into()));
    assert_eq!(registry.by_media_type("application/json").map(|e| e.name().to_string()), Some("json".into()));

    let replaced = registry.register(TriplifierEntry::new("custom", &["application/x-custom"], &["cst"], noop));
    assert_eq!(replaced.map(|e| e.extensions().to_vec()), Some(vec!["json".to_string()]));
    assert!(registry.by_extension("json").is_none());
    assert_eq!(registry.by_extension("cst").map(|e| e.name().to_string()), Some("custom".into()));
    assert_eq!(registry.len(), 4);
}
