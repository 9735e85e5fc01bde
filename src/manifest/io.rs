//! Reading and writing manifests as `install.rdf` triples

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::rdf::{Term, TripleStore};
use super::{Manifest, Relation};
use crate::domain::{Identifier, Platform, Requirement, Version};
use crate::error::{AebError, Result, bundle, fs as fs_error};

/// Namespace of the standard bundle manifest keys
pub const AEBL_NS: &str = "urn:2008:03:aebl-syntax-ns#";
/// Namespace of the host application's manifest extensions
pub const EXTENSION_NS: &str = "urn:2008:03:opticks-aebl-extension-ns#";
/// Subject all top level manifest statements hang off
pub const TOP_SUBJECT: &str = "urn:aebl:install-manifest";

/// `type` value of a bundle holding exactly one extension
pub const TYPE_EXTENSION: &str = "2";
/// `type` value of a bundle of bundles, which is not supported
pub const TYPE_MULTI: &str = "32";

fn key(name: &str) -> String {
    format!("{AEBL_NS}{name}")
}

fn ext_key(name: &str) -> String {
    format!("{EXTENSION_NS}{name}")
}

/// Typed lookups that turn cardinality violations into parse errors
struct Reader<'a> {
    store: &'a TripleStore,
}

impl<'a> Reader<'a> {
    fn single(&self, subject: &str, predicate: &str, message: &str) -> Result<&'a str> {
        match self.store.objects(subject, predicate).as_slice() {
            [value] => Ok(*value),
            _ => Err(bundle::parse_failed(message)),
        }
    }

    fn optional(&self, subject: &str, predicate: &str, message: &str) -> Result<Option<String>> {
        match self.store.objects(subject, predicate).as_slice() {
            [] => Ok(None),
            [value] => Ok(Some((*value).to_string())),
            _ => Err(bundle::parse_failed(message)),
        }
    }

    fn all(&self, subject: &str, predicate: &str) -> Vec<String> {
        self.store
            .objects(subject, predicate)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// `id`/`minVersion`/`maxVersion` triple hanging off `node`
    fn requirement(&self, node: &str, what: &str) -> Result<Requirement> {
        let id = self.single(node, &key("id"), &format!("Invalid {what} id."))?;
        let min = self.single(node, &key("minVersion"), &format!("Invalid {what} minVersion."))?;
        let max = self.single(node, &key("maxVersion"), &format!("Invalid {what} maxVersion."))?;
        let requirement = Requirement::new(Identifier::new(id), Version::parse(min), Version::parse(max));
        if requirement.is_valid() {
            Ok(requirement)
        } else {
            Err(bundle::parse_failed(format!("Invalid {what}.")))
        }
    }

    fn relations(&self, predicate: &str, what: &str) -> Result<Vec<Relation>> {
        let mut relations = Vec::new();
        for node in self.store.objects(TOP_SUBJECT, &key(predicate)) {
            let target = self.requirement(node, what)?;
            let filter = match self.store.objects(node, &key("targetApplication")).as_slice() {
                [] => None,
                [app] => Some(self.requirement(app, &format!("{what} target application"))?),
                _ => {
                    return Err(bundle::parse_failed(format!(
                        "Invalid {what} target application."
                    )));
                }
            };
            relations.push((filter, target));
        }
        Ok(relations)
    }
}

/// Build a manifest from parsed triples
///
/// License texts are not part of the triples; the bundle reader fills them
/// in from the license URLs.
pub fn from_store(store: &TripleStore, platform: &Platform) -> Result<Manifest> {
    let r = Reader { store };
    let mut manifest = Manifest::default();

    let id = r.single(TOP_SUBJECT, &key("id"), "Invalid extension id.")?;
    manifest.id = Identifier::new(id);
    if !manifest.id.is_valid() {
        return Err(bundle::parse_failed("Invalid extension id."));
    }

    manifest.version = Version::parse(r.single(TOP_SUBJECT, &key("version"), "Invalid extension version.")?);

    let kind = r.single(TOP_SUBJECT, &key("type"), "Invalid bundle type.")?;
    if kind == TYPE_MULTI {
        return Err(AebError::UnsupportedBundleType {
            kind: "multi-extension bundles are not yet supported".to_string(),
        });
    }
    if kind != TYPE_EXTENSION {
        return Err(AebError::UnsupportedBundleType {
            kind: kind.to_string(),
        });
    }

    manifest.name = r
        .single(TOP_SUBJECT, &key("name"), "Invalid extension name.")?
        .to_string();
    if manifest.name.is_empty() {
        return Err(bundle::parse_failed("Invalid extension name."));
    }

    for app in store.objects(TOP_SUBJECT, &key("targetApplication")) {
        manifest
            .target_applications
            .push(r.requirement(app, "target application")?);
    }

    manifest.description = r.optional(TOP_SUBJECT, &key("description"), "Invalid extension description.")?;
    manifest.creator = r.optional(TOP_SUBJECT, &key("creator"), "Invalid extension creator.")?;
    manifest.developers = r.all(TOP_SUBJECT, &key("developer"));
    manifest.translators = r.all(TOP_SUBJECT, &key("translator"));
    manifest.contributors = r.all(TOP_SUBJECT, &key("contributor"));
    manifest.homepage_url = r.optional(TOP_SUBJECT, &key("homepageURL"), "Invalid extension homepage URL.")?;
    manifest.icon_url = r.optional(TOP_SUBJECT, &key("iconURL"), "Invalid extension icon.")?;
    manifest.license_urls = r.all(TOP_SUBJECT, &key("licenseURL"));

    manifest.hidden = match r
        .optional(TOP_SUBJECT, &key("hidden"), "Invalid hidden specification.")?
        .as_deref()
    {
        None | Some("false" | "0") => false,
        Some("true" | "1") => true,
        Some(_) => return Err(bundle::parse_failed("Invalid hidden specification.")),
    };

    let targets = r.all(TOP_SUBJECT, &key("targetPlatform"));
    manifest.platforms = targets
        .iter()
        .filter(|target| platform.accepts(target))
        .cloned()
        .collect();
    if !targets.is_empty() && manifest.platforms.is_empty() {
        return Err(bundle::parse_failed(
            "The current platform is not supported by this extension.",
        ));
    }

    manifest.requires = r.relations("requires", "requirement")?;
    manifest.incompatible = r.relations("incompatible", "incompatible")?;

    manifest.update_key = r.all(TOP_SUBJECT, &key("updateKey")).into_iter().next();
    manifest.update_url = r.all(TOP_SUBJECT, &key("updateURL")).into_iter().next();
    manifest.splash_screen_urls = r.all(TOP_SUBJECT, &ext_key("splashScreenURL"));

    let mut help_entries = BTreeMap::new();
    for node in store.objects(TOP_SUBJECT, &ext_key("helpEntry")) {
        let name = r.single(node, &ext_key("name"), "Invalid help entry name.")?;
        let url = r.single(node, &ext_key("url"), "Invalid help entry URL.")?;
        help_entries.insert(name.to_string(), url.to_string());
    }
    manifest.help_entries = help_entries;

    Ok(manifest)
}

/// Convert a manifest back into triples
pub fn to_store(manifest: &Manifest) -> TripleStore {
    let mut store = TripleStore::new();
    let mut counter = 0usize;
    let mut node = || {
        counter += 1;
        format!("_:n{counter}")
    };

    fn add_requirement(store: &mut TripleStore, subject: &str, requirement: &Requirement) {
        store.add_literal(subject, &key("id"), requirement.id().as_str());
        store.add_literal(subject, &key("minVersion"), requirement.min().to_string());
        store.add_literal(subject, &key("maxVersion"), requirement.max().to_string());
    }

    store.add_literal(TOP_SUBJECT, &key("id"), manifest.id.as_str());
    store.add_literal(TOP_SUBJECT, &key("version"), manifest.version.to_string());
    store.add_literal(TOP_SUBJECT, &key("type"), TYPE_EXTENSION);
    store.add_literal(TOP_SUBJECT, &key("name"), manifest.name.as_str());

    for app in &manifest.target_applications {
        let subject = node();
        store.add(TOP_SUBJECT, &key("targetApplication"), Term::Blank(subject.clone()));
        add_requirement(&mut store, &subject, app);
    }

    let optional = [
        ("description", &manifest.description),
        ("creator", &manifest.creator),
        ("homepageURL", &manifest.homepage_url),
        ("iconURL", &manifest.icon_url),
        ("updateKey", &manifest.update_key),
        ("updateURL", &manifest.update_url),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            store.add_literal(TOP_SUBJECT, &key(name), value.as_str());
        }
    }

    let lists = [
        ("developer", &manifest.developers),
        ("translator", &manifest.translators),
        ("contributor", &manifest.contributors),
        ("licenseURL", &manifest.license_urls),
        ("targetPlatform", &manifest.platforms),
    ];
    for (name, values) in lists {
        for value in values {
            store.add_literal(TOP_SUBJECT, &key(name), value.as_str());
        }
    }

    if manifest.hidden {
        store.add_literal(TOP_SUBJECT, &key("hidden"), "true");
    }

    for (predicate, relations) in [
        ("requires", &manifest.requires),
        ("incompatible", &manifest.incompatible),
    ] {
        for (filter, target) in relations {
            let subject = node();
            store.add(TOP_SUBJECT, &key(predicate), Term::Blank(subject.clone()));
            add_requirement(&mut store, &subject, target);
            if let Some(filter) = filter {
                let app = node();
                store.add(&subject, &key("targetApplication"), Term::Blank(app.clone()));
                add_requirement(&mut store, &app, filter);
            }
        }
    }

    for url in &manifest.splash_screen_urls {
        store.add_literal(TOP_SUBJECT, &ext_key("splashScreenURL"), url.as_str());
    }
    for (name, url) in &manifest.help_entries {
        let subject = node();
        store.add(TOP_SUBJECT, &ext_key("helpEntry"), Term::Blank(subject.clone()));
        store.add_literal(&subject, &ext_key("name"), name.as_str());
        store.add_literal(&subject, &ext_key("url"), url.as_str());
    }

    store
}

/// Write the manifest to `path`, replacing any existing file atomically
pub fn write_to_file(manifest: &Manifest, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| fs_error::write_failed(path, "no parent directory"))?;
    let mut file = NamedTempFile::new_in(dir).map_err(|e| fs_error::write_failed(path, e))?;
    file.write_all(to_store(manifest).serialize().as_bytes())
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| fs_error::write_failed(path, e))?;
    file.persist(path)
        .map_err(|e| fs_error::write_failed(path, e.error))?;
    Ok(())
}
