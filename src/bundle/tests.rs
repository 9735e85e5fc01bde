#![allow(clippy::unwrap_used)]

use std::fs;

use super::*;
use crate::error::AebError;
use crate::test_fixtures::{create_temp_dir, manifest_text, write_loose_bundle, write_zip_bundle};

fn platform_entry(path: &str) -> String {
    format!("{}/{path}", Platform::current().content_prefix())
}

#[test]
fn test_open_missing_bundle() {
    let temp = create_temp_dir();
    let err = BundleReader::open(&temp.path().join("nope.aeb"), &Platform::current()).unwrap_err();
    assert!(matches!(err, AebError::BundleNotFound { .. }));
}

#[test]
fn test_zip_content_entries() {
    let temp = create_temp_dir();
    let other_platform = "platform/other-os-arch/Bin/foreign";
    let native = platform_entry("Bin/native");
    let path = write_zip_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", ""),
        &[
            ("content/PlugIns/viewer.so", b"plugin"),
            ("content/Help/viewer/index.html", b"<html/>"),
            (other_platform, b"skip"),
            (native.as_str(), b"native"),
            ("icon.png", b"png"),
        ],
    );
    let reader = BundleReader::open(&path, &Platform::current()).unwrap();
    assert!(reader.is_archive());

    let entries = reader.content_entries().unwrap();
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["PlugIns/viewer.so", "Help/viewer/index.html", "Bin/native"]);
    assert_eq!(entries[0].size, 6);
    assert!(matches!(entries[0].locator, ContentLocator::Zip(_)));
}

#[test]
fn test_loose_content_entries_are_breadth_first() {
    let temp = create_temp_dir();
    let rdf = write_loose_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", ""),
        &[
            ("content/PlugIns/deep/nested.so", b"n"),
            ("content/Bin/tool", b"t"),
            ("content/PlugIns/top.so", b"p"),
        ],
    );
    let reader = BundleReader::open(&rdf, &Platform::current()).unwrap();
    assert!(!reader.is_archive());

    let entries = reader.content_entries().unwrap();
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["Bin/tool", "PlugIns/top.so", "PlugIns/deep/nested.so"]);
    assert!(matches!(entries[0].locator, ContentLocator::File(_)));
}

#[test]
fn test_manifest_loads_licenses() {
    let temp = create_temp_dir();
    let extra = "<urn:aebl:install-manifest> aebl:licenseURL \"aeb:///license.txt\" .\n";
    let path = write_zip_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", extra),
        &[("license.txt", b"Permission is granted")],
    );
    let reader = BundleReader::open(&path, &Platform::current()).unwrap();
    let manifest = reader.manifest().unwrap();
    assert_eq!(manifest.licenses, vec!["Permission is granted"]);
    assert_eq!(manifest.source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_empty_license_is_rejected() {
    let temp = create_temp_dir();
    let extra = "<urn:aebl:install-manifest> aebl:licenseURL \"aeb:///license.txt\" .\n";
    let rdf = write_loose_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", extra),
        &[("license.txt", b"")],
    );
    let reader = BundleReader::open(&rdf, &Platform::current()).unwrap();
    let err = reader.manifest().unwrap_err();
    assert!(err.to_string().contains("license"), "{err}");
}

#[test]
fn test_missing_license_file() {
    let temp = create_temp_dir();
    let extra = "<urn:aebl:install-manifest> aebl:licenseURL \"aeb:///gone.txt\" .\n";
    let path = write_zip_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", extra),
        &[],
    );
    let reader = BundleReader::open(&path, &Platform::current()).unwrap();
    assert!(matches!(
        reader.manifest().unwrap_err(),
        AebError::MissingBundleFile { .. }
    ));
}

#[test]
fn test_install_and_compare_file() {
    let temp = create_temp_dir();
    let path = write_zip_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", ""),
        &[("content/PlugIns/viewer.so", b"plugin bytes")],
    );
    let reader = BundleReader::open(&path, &Platform::current()).unwrap();
    let entry = reader.content_entries().unwrap().remove(0);

    let dest = temp.path().join("app/PlugIns/viewer.so");
    assert!(!reader.compare_file(&entry, &dest).unwrap());

    reader.install_file(&entry, &dest).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), b"plugin bytes");
    assert!(reader.compare_file(&entry, &dest).unwrap());

    fs::write(&dest, b"plugin BYTES").unwrap();
    assert!(!reader.compare_file(&entry, &dest).unwrap());
    fs::write(&dest, b"short").unwrap();
    assert!(!reader.compare_file(&entry, &dest).unwrap());
}

#[test]
fn test_compare_spans_multiple_buffers() {
    let temp = create_temp_dir();
    let mut big = vec![7u8; BUFFER_SIZE * 2 + 17];
    let rdf = write_loose_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", ""),
        &[("content/Bin/big", &big[..])],
    );
    let reader = BundleReader::open(&rdf, &Platform::current()).unwrap();
    let entry = reader.content_entries().unwrap().remove(0);

    let dest = temp.path().join("out/big");
    reader.install_file(&entry, &dest).unwrap();
    assert!(reader.compare_file(&entry, &dest).unwrap());

    let last = big.len() - 1;
    big[last] = 8;
    fs::write(&dest, &big).unwrap();
    assert!(!reader.compare_file(&entry, &dest).unwrap());
}

#[test]
fn test_resolve_url() {
    assert_eq!(resolve_url("aeb:///license.txt").unwrap(), "license.txt");
    assert_eq!(resolve_url("aeb:///Help/my%20guide.html").unwrap(), "Help/my guide.html");
    assert!(matches!(
        resolve_url("http://example.com/x").unwrap_err(),
        AebError::MissingBundleFile { .. }
    ));
    assert!(matches!(
        resolve_url("aeb:///").unwrap_err(),
        AebError::InvalidContentPath { .. }
    ));
}

#[test]
fn test_entry_by_url() {
    let temp = create_temp_dir();
    let rdf = write_loose_bundle(
        temp.path(),
        "viewer",
        &manifest_text("viewer@example.com", "1.0", ""),
        &[("images/icon.png", b"png")],
    );
    let reader = BundleReader::open(&rdf, &Platform::current()).unwrap();
    let entry = reader.entry("aeb:///images/icon.png").unwrap();
    assert_eq!(entry.size, 3);
    assert_eq!(reader.read_entry(&entry).unwrap(), b"png");
    assert!(matches!(
        reader.entry("aeb:///images/missing.png").unwrap_err(),
        AebError::MissingBundleFile { .. }
    ));
}
