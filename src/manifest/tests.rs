//! Manifest parsing and dependency tests

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use super::io::{from_store, to_store};
use super::rdf::TripleStore;
use super::*;
use crate::domain::Platform;
use crate::error::AebError;
use crate::test_fixtures::{host, manifest_text};

fn parse(text: &str) -> crate::error::Result<Manifest> {
    let store = TripleStore::parse(text).unwrap();
    from_store(&store, &Platform::new("linux-x86_64"))
}

fn manifest(id: &str, version: &str, extra: &str) -> Manifest {
    parse(&manifest_text(id, version, extra)).unwrap()
}

fn registry(manifests: Vec<Manifest>) -> BTreeMap<Identifier, Manifest> {
    manifests.into_iter().map(|m| (m.id.clone(), m)).collect()
}

#[test]
fn test_parse_minimal_manifest() {
    let m = manifest("viewer@example.com", "1.2", "");
    assert_eq!(m.id.as_str(), "viewer@example.com");
    assert_eq!(m.version.to_string(), "1.2");
    assert_eq!(m.name, "Extension viewer@example.com");
    assert_eq!(m.target_applications.len(), 1);
    assert!(m.validate(&host()));
    assert!(m.validation_error(&host()).is_none());
}

#[test]
fn test_parse_optional_metadata() {
    let m = manifest(
        "viewer@example.com",
        "1.2",
        r#"<urn:aebl:install-manifest> aebl:description "Views things" .
<urn:aebl:install-manifest> aebl:developer "Ann" .
<urn:aebl:install-manifest> aebl:developer "Bob" .
<urn:aebl:install-manifest> aebl:hidden "true" .
<urn:aebl:install-manifest> aebl:updateKey "first" .
<urn:aebl:install-manifest> aebl:updateKey "second" .
<urn:aebl:install-manifest> ext:splashScreenURL "aeb:///splash.png" .
<urn:aebl:install-manifest> ext:helpEntry _:help .
_:help ext:name "Viewer Guide" .
_:help ext:url "aeb:///Help/viewer/index.html" .
"#,
    );
    assert_eq!(m.description.as_deref(), Some("Views things"));
    assert_eq!(m.developers, vec!["Ann", "Bob"]);
    assert!(m.hidden);
    assert_eq!(m.update_key.as_deref(), Some("first"));
    assert_eq!(m.splash_screen_urls, vec!["aeb:///splash.png"]);
    assert_eq!(
        m.help_entries.get("Viewer Guide").map(String::as_str),
        Some("aeb:///Help/viewer/index.html")
    );
}

#[test]
fn test_missing_id_is_parse_error() {
    let text = manifest_text("viewer@example.com", "1.0", "")
        .replace("<urn:aebl:install-manifest> aebl:id \"viewer@example.com\" .\n", "");
    let err = parse(&text).unwrap_err();
    assert!(matches!(err, AebError::ManifestParse { .. }));
}

#[test]
fn test_duplicate_description_is_parse_error() {
    let err = parse(&manifest_text(
        "viewer@example.com",
        "1.0",
        r#"<urn:aebl:install-manifest> aebl:description "a" .
<urn:aebl:install-manifest> aebl:description "b" .
"#,
    ))
    .unwrap_err();
    assert!(err.to_string().contains("description"), "{err}");
}

#[test]
fn test_multi_bundle_type_is_unsupported() {
    let text = manifest_text("viewer@example.com", "1.0", "").replace("aebl:type \"2\"", "aebl:type \"32\"");
    let err = parse(&text).unwrap_err();
    assert!(matches!(err, AebError::UnsupportedBundleType { .. }));
}

#[test]
fn test_target_platform_filtering() {
    let m = manifest(
        "viewer@example.com",
        "1.0",
        r#"<urn:aebl:install-manifest> aebl:targetPlatform "windows-x86_64" .
<urn:aebl:install-manifest> aebl:targetPlatform "Linux-x86_64" .
"#,
    );
    assert_eq!(m.platforms, vec!["Linux-x86_64"]);

    let err = parse(&manifest_text(
        "viewer@example.com",
        "1.0",
        "<urn:aebl:install-manifest> aebl:targetPlatform \"windows-x86_64\" .\n",
    ))
    .unwrap_err();
    assert!(err.to_string().contains("platform"), "{err}");
}

#[test]
fn test_wrong_host_version_explains_range() {
    let mut host = host();
    host.version = Version::parse("5.0");
    let m = manifest("viewer@example.com", "1.0", "");
    assert!(!m.validate(&host));
    let reason = m.validation_error(&host).unwrap();
    assert!(reason.contains("4.0 through 4.*"), "{reason}");
    assert!(reason.contains("5.0"), "{reason}");
}

#[test]
fn test_license_count_must_match() {
    let mut m = manifest(
        "viewer@example.com",
        "1.0",
        "<urn:aebl:install-manifest> aebl:licenseURL \"aeb:///license.txt\" .\n",
    );
    assert!(!m.validate(&host()));
    m.licenses.push("MIT".to_string());
    assert!(m.validate(&host()));
}

#[test]
fn test_requirement_gating() {
    let dependent = manifest(
        "app@example.com",
        "1.0",
        r#"<urn:aebl:install-manifest> aebl:requires _:dep .
_:dep aebl:id "lib@example.com" .
_:dep aebl:minVersion "1.0" .
_:dep aebl:maxVersion "2.0" .
"#,
    );

    let err = dependent
        .meets_requirements(&host(), &BTreeMap::new())
        .unwrap_err();
    assert!(err.contains("lib@example.com"), "{err}");

    let too_new = manifest("lib@example.com", "2.1", "");
    let err = dependent
        .meets_requirements(&host(), &registry(vec![too_new]))
        .unwrap_err();
    assert!(err.contains("2.1"), "{err}");

    let lib = manifest("lib@example.com", "1.5", "");
    assert!(dependent.meets_requirements(&host(), &registry(vec![lib.clone()])).is_ok());
    assert!(dependent.requires_extension(&host(), &lib));
}

#[test]
fn test_host_filtered_requirement_is_skipped_on_other_hosts() {
    let dependent = manifest(
        "app@example.com",
        "1.0",
        r#"<urn:aebl:install-manifest> aebl:requires _:dep .
_:dep aebl:id "lib@example.com" .
_:dep aebl:minVersion "1.0" .
_:dep aebl:maxVersion "2.0" .
_:dep aebl:targetApplication _:only .
_:only aebl:id "other-host@example.com" .
_:only aebl:minVersion "1" .
_:only aebl:maxVersion "*" .
"#,
    );
    assert_eq!(dependent.requires.len(), 1);
    assert!(dependent.requires[0].0.is_some());
    assert!(dependent.meets_requirements(&host(), &BTreeMap::new()).is_ok());
}

#[test]
fn test_incompatibility() {
    let picky = manifest(
        "picky@example.com",
        "1.0",
        r#"<urn:aebl:install-manifest> aebl:incompatible _:bad .
_:bad aebl:id "legacy@example.com" .
_:bad aebl:minVersion "0" .
_:bad aebl:maxVersion "1.*" .
"#,
    );
    assert!(picky.is_incompatible(&host(), &manifest("legacy@example.com", "1.3", "")));
    assert!(!picky.is_incompatible(&host(), &manifest("legacy@example.com", "2.0", "")));
    assert!(!picky.is_incompatible(&host(), &manifest("other@example.com", "1.0", "")));
}

#[test]
fn test_to_store_then_from_store_keeps_relations() {
    let original = manifest(
        "app@example.com",
        "1.0",
        r#"<urn:aebl:install-manifest> aebl:requires _:dep .
_:dep aebl:id "lib@example.com" .
_:dep aebl:minVersion "1.0" .
_:dep aebl:maxVersion "2.0" .
<urn:aebl:install-manifest> ext:helpEntry _:h .
_:h ext:name "Guide" .
_:h ext:url "aeb:///Help/guide.html" .
"#,
    );
    let text = to_store(&original).serialize();
    assert!(text.contains("_:n1"), "{text}");

    let reparsed = parse(&text).unwrap();
    assert_eq!(reparsed.id, original.id);
    assert_eq!(reparsed.requires, original.requires);
    assert_eq!(reparsed.help_entries, original.help_entries);
    assert!(reparsed.validate(&host()));
}
