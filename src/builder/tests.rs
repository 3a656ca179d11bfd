use std::io;
use std::sync::Arc;

use super::*;
use crate::bundle::build_id;
use crate::config::{BundlingConfig, ProjectStage};
use crate::document::Document;
use crate::integrity::IntegrityCache;
use crate::store::{ByteStream, ResourceStore, StoredResource};

/// The builder never reads content
struct EmptyStore;

impl ResourceStore for EmptyStore {
    fn resolve(&self, _id: &ResourceIdentifier) -> Option<StoredResource> {
        None
    }

    fn open(&self, _resource: &StoredResource) -> io::Result<Box<dyn ByteStream>> {
        Err(io::Error::from(io::ErrorKind::NotFound))
    }
}

fn id(s: &str) -> ResourceIdentifier {
    ResourceIdentifier::parse(s).unwrap()
}

fn ids(raw: &[&str]) -> Vec<ResourceIdentifier> {
    raw.iter().map(|s| id(s)).collect()
}

fn registry() -> BundleRegistry {
    BundleRegistry::new(
        Arc::new(EmptyStore),
        Arc::new(IntegrityCache::new()),
        ProjectStage::Production,
    )
}

fn compiled(config_yaml: &str) -> CompiledConfig {
    CompiledConfig::compile(&BundlingConfig::from_yaml(config_yaml).unwrap()).unwrap()
}

fn build_with(
    registry: &BundleRegistry,
    config_yaml: &str,
    doc_yaml: &str,
) -> (Document, BuildReport) {
    let config = compiled(config_yaml);
    let mut doc = Document::from_yaml(doc_yaml).unwrap();
    let report = BundleBuilder::new(registry, &config, &config)
        .build(&mut doc)
        .unwrap();
    (doc, report)
}

fn build(config_yaml: &str, doc_yaml: &str) -> (Document, BuildReport) {
    build_with(&registry(), config_yaml, doc_yaml)
}

/// `library:name` of every node in a region, in order
fn refs(doc: &Document, region: &str) -> Vec<String> {
    doc.region(region)
        .iter()
        .map(|node| match node.identifier() {
            Some(id) => id.to_string(),
            None => format!("<{:?}>", node.kind),
        })
        .collect()
}

fn bundle_ref(kind: BundleKind, members: &[&str]) -> String {
    let id = build_id(&ids(members)).unwrap();
    kind.identifier(&id).unwrap().to_string()
}

#[test]
fn test_excluded_first_script_stays_before_bundle() {
    let (doc, report) = build(
        "exclude: [\"lib:a.js\"]",
        r#"
head:
  - { kind: script, library: lib, name: a.js }
  - { kind: script, library: lib, name: b.js }
  - { kind: script, library: lib, name: c.js }
"#,
    );

    assert_eq!(
        refs(&doc, "head"),
        vec![
            "lib:a.js".to_string(),
            bundle_ref(BundleKind::Script, &["lib:b.js", "lib:c.js"]),
        ]
    );
    assert_eq!(report.excluded, ids(&["lib:a.js"]));
    assert_eq!(report.bundles.len(), 1);
}

#[test]
fn test_kinds_are_grouped_separately_at_first_position() {
    let (doc, _) = build(
        "",
        r#"
head:
  - { kind: stylesheet, library: libA, name: a.css }
  - { kind: script, library: libA, name: x.js }
  - { kind: stylesheet, library: libB, name: b.css }
  - { kind: foreign }
  - { kind: script, library: libB, name: y.js }
"#,
    );

    assert_eq!(
        refs(&doc, "head"),
        vec![
            bundle_ref(BundleKind::Stylesheet, &["libA:a.css", "libB:b.css"]),
            bundle_ref(BundleKind::Script, &["libA:x.js", "libB:y.js"]),
            "<Foreign>".to_string(),
        ]
    );
}

#[test]
fn test_regions_are_bundled_independently() {
    let (doc, report) = build(
        "",
        r#"
head:
  - { kind: script, name: a.js }
body:
  - { kind: script, name: b.js }
"#,
    );

    assert_eq!(refs(&doc, "head"), vec![bundle_ref(BundleKind::Script, &["a.js"])]);
    assert_eq!(refs(&doc, "body"), vec![bundle_ref(BundleKind::Script, &["b.js"])]);
    let regions: Vec<&str> = report.bundles.iter().map(|b| b.region.as_str()).collect();
    assert_eq!(regions, vec!["head", "body"]);
}

#[test]
fn test_suppressed_nodes_are_removed() {
    let (doc, report) = build(
        "suppress: [\"lib:b.js\"]",
        r#"
head:
  - { kind: script, library: lib, name: a.js }
  - { kind: script, library: lib, name: b.js }
  - { kind: script, library: lib, name: c.js }
"#,
    );

    assert_eq!(
        refs(&doc, "head"),
        vec![bundle_ref(BundleKind::Script, &["lib:a.js", "lib:c.js"])]
    );
    assert_eq!(report.suppressed, ids(&["lib:b.js"]));
}

#[test]
fn test_fully_suppressed_group_creates_no_bundle() {
    let (doc, report) = build(
        "suppress: [\"lib:*\"]",
        r#"
head:
  - { kind: script, library: lib, name: a.js }
  - { kind: script, library: lib, name: b.js }
"#,
    );

    assert!(doc.region("head").is_empty());
    assert!(report.bundles.is_empty());
}

#[test]
fn test_duplicates_keep_first_position() {
    let (doc, report) = build(
        "",
        r#"
head:
  - { kind: script, name: a.js }
  - { kind: script, name: b.js }
  - { kind: script, name: a.js }
"#,
    );

    assert_eq!(report.bundles[0].members, ids(&["a.js", "b.js"]));
    assert_eq!(doc.region("head").len(), 1);
}

#[test]
fn test_exclusion_only_affects_excluded_identifier() {
    let doc = r#"
head:
  - { kind: stylesheet, library: lib, name: a.css }
  - { kind: stylesheet, library: lib, name: b.css }
  - { kind: stylesheet, library: lib, name: c.css }
"#;
    let (_, all) = build("", doc);
    let (_, without_b) = build("exclude: [\"lib:b.css\"]", doc);

    assert_eq!(
        all.bundles[0].members,
        ids(&["lib:a.css", "lib:b.css", "lib:c.css"])
    );
    assert_eq!(without_b.bundles[0].members, ids(&["lib:a.css", "lib:c.css"]));
}

#[test]
fn test_cdn_mapped_resources_are_not_bundled() {
    let (doc, report) = build(
        "cdn: [\"jquery:*=https://code.jquery.com/*\"]",
        r#"
head:
  - { kind: script, library: jquery, name: jquery.js }
  - { kind: script, library: app, name: app.js }
"#,
    );

    assert_eq!(
        refs(&doc, "head"),
        vec![
            "jquery:jquery.js".to_string(),
            bundle_ref(BundleKind::Script, &["app:app.js"]),
        ]
    );
    assert_eq!(report.excluded, ids(&["jquery:jquery.js"]));
}

#[test]
fn test_callbacks_are_merged_onto_anchor() {
    let (doc, _) = build(
        "",
        r#"
head:
  - { kind: script, name: a.js, on_success: "one()" }
  - { kind: script, name: b.js, on_success: "two()", on_error: "oops()" }
"#,
    );

    let anchor = &doc.region("head")[0];
    assert_eq!(anchor.callbacks.on_success.as_deref(), Some("one();two()"));
    assert_eq!(anchor.callbacks.on_error.as_deref(), Some("oops()"));
}

#[test]
fn test_deferred_scripts_are_grouped_by_group() {
    let (doc, report) = build(
        "inline_js: true",
        r#"
body:
  - { kind: deferred-script, name: x.js, group: g1 }
  - { kind: deferred-script, name: y.js, group: g2 }
  - { kind: deferred-script, name: z.js, group: g1 }
  - { kind: script, name: s.js }
"#,
    );

    let nodes = doc.region("body");
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].group.as_deref(), Some("g1"));
    assert_eq!(nodes[1].group.as_deref(), Some("g2"));
    assert_eq!(nodes[0].kind, NodeKind::DeferredScript);
    assert!(!nodes[0].inline, "deferred scripts are never inlined");
    assert!(nodes[2].inline);

    assert_eq!(report.bundles[0].members, ids(&["x.js", "z.js"]));
    assert_eq!(report.bundles[1].members, ids(&["y.js"]));
}

#[test]
fn test_inline_stylesheet_toggle() {
    let (doc, _) = build(
        "inline_css: true",
        "head:\n  - { kind: stylesheet, name: a.css }\n  - { kind: script, name: a.js }\n",
    );
    let nodes = doc.region("head");
    assert!(nodes[0].inline);
    assert!(!nodes[1].inline);
}

#[test]
fn test_unrendered_and_nameless_nodes_are_untouched() {
    let (doc, report) = build(
        "",
        r#"
head:
  - { kind: script, name: hidden.js, rendered: false }
  - { kind: script }
"#,
    );
    assert_eq!(doc.region("head").len(), 2);
    assert!(!doc.region("head")[0].rendered);
    assert!(report.bundles.is_empty());
}

#[test]
fn test_previous_bundles_are_flattened() {
    let registry = registry();
    let (first, _) = build_with(
        &registry,
        "",
        "head:\n  - { kind: script, name: a.js }\n  - { kind: script, name: b.js }\n",
    );
    let earlier = refs(&first, "head").remove(0);
    let (library, name) = earlier.split_once(':').unwrap();

    let (doc, report) = build_with(
        &registry,
        "",
        &format!(
            "head:\n  - {{ kind: script, library: {library}, name: \"{name}\" }}\n  - {{ kind: script, name: c.js }}\n"
        ),
    );

    assert_eq!(report.bundles[0].members, ids(&["a.js", "b.js", "c.js"]));
    assert_eq!(
        refs(&doc, "head"),
        vec![bundle_ref(BundleKind::Script, &["a.js", "b.js", "c.js"])]
    );
}

#[test]
fn test_flattened_excluded_member_becomes_standalone_node() {
    let earlier = bundle_ref(BundleKind::Stylesheet, &["lib:a.css", "lib:b.css"]);
    let (library, name) = earlier.split_once(':').unwrap();

    let (doc, _) = build(
        "exclude: [\"lib:a.css\"]",
        &format!("head:\n  - {{ kind: stylesheet, library: {library}, name: \"{name}\" }}\n"),
    );

    assert_eq!(
        refs(&doc, "head"),
        vec![
            "lib:a.css".to_string(),
            bundle_ref(BundleKind::Stylesheet, &["lib:b.css"]),
        ]
    );
}

#[test]
fn test_bundle_nesting_beyond_limit_is_dropped() {
    // Innermost reference sits MAX_FLATTEN_DEPTH levels below the document's node
    let mut nested = bundle_ref(BundleKind::Script, &["lib:lost.js"]);
    let mut expected = Vec::new();
    for level in (0..MAX_FLATTEN_DEPTH).rev() {
        let member = format!("lib:m{level}.js");
        nested = bundle_ref(BundleKind::Script, &[nested.as_str(), member.as_str()]);
        expected.push(member);
    }
    expected.push("lib:c.js".to_string());
    let (library, name) = nested.split_once(':').unwrap();

    let (doc, report) = build(
        "",
        &format!(
            "head:\n  - {{ kind: script, library: {library}, name: \"{name}\" }}\n  - {{ kind: script, library: lib, name: c.js }}\n"
        ),
    );

    let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
    assert_eq!(report.bundles.len(), 1);
    assert_eq!(report.bundles[0].members, ids(&expected));
    assert!(!report.bundles[0].members.contains(&id("lib:lost.js")));
    assert_eq!(
        refs(&doc, "head"),
        vec![bundle_ref(BundleKind::Script, &expected)]
    );
}

#[test]
fn test_malformed_bundle_reference_is_left_alone() {
    let (doc, report) = build(
        "",
        "head:\n  - { kind: script, library: combres, name: \"bogus!.js\" }\n",
    );
    assert_eq!(refs(&doc, "head"), vec!["combres:bogus!.js"]);
    assert!(report.bundles.is_empty());
}

#[test]
fn test_library_nodes_expand_in_place() {
    let (doc, report) = build(
        r#"
libraries:
  "vendor:all": ["vendor:core.css", "vendor:core.js", "vendor:logo.png"]
"#,
        r#"
head:
  - { kind: stylesheet, library: app, name: site.css }
  - { kind: library, library: vendor, name: all }
  - { kind: script, library: app, name: app.js }
"#,
    );

    assert_eq!(
        refs(&doc, "head"),
        vec![
            bundle_ref(BundleKind::Stylesheet, &["app:site.css", "vendor:core.css"]),
            bundle_ref(BundleKind::Script, &["vendor:core.js", "app:app.js"]),
            "vendor:logo.png".to_string(),
        ]
    );
    assert_eq!(report.bundles.len(), 2);
}

#[test]
fn test_unknown_library_node_is_left_alone() {
    let (doc, _) = build("", "head:\n  - { kind: library, library: vendor, name: all }\n");
    assert_eq!(refs(&doc, "head"), vec!["vendor:all"]);
    assert_eq!(doc.region("head")[0].kind, NodeKind::Library);
}

#[test]
fn test_bundles_are_registered() {
    let registry = registry();
    let (_, report) = build_with(
        &registry,
        "",
        "head:\n  - { kind: script, name: a.js }\n  - { kind: script, name: b.js }\n",
    );

    let (bundle_id, _) = BundleKind::split_name(report.bundles[0].identifier.name()).unwrap();
    let bundle = registry.get(bundle_id).unwrap();
    assert_eq!(
        bundle.members().iter().cloned().collect::<Vec<_>>(),
        ids(&["a.js", "b.js"])
    );
    assert_eq!(registry.len(), 1);
}
