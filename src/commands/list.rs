//! List command implementation
//!
//! This command lists installed extensions with their versions, and marks
//! the ones scheduled for removal.

use console::Style;
use serde_json::{Value, json};

use super::helpers::{GlobalOptions, open_coordinator};
use crate::cli::ListArgs;
use crate::error::Result;
use crate::manifest::Manifest;

/// Run list command
pub fn run(options: &GlobalOptions, args: ListArgs) -> Result<()> {
    let coordinator = open_coordinator(options)?;
    let extensions: Vec<(&Manifest, bool)> = coordinator
        .extensions()
        .map(|m| (m, coordinator.is_pending_uninstall(&m.id)))
        .collect();

    if args.json {
        let items: Vec<Value> = extensions
            .iter()
            .map(|(manifest, pending)| manifest_json(manifest, *pending))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if extensions.is_empty() {
        println!("No extensions installed.");
        return Ok(());
    }

    println!("Installed extensions ({}):", extensions.len());
    println!();
    for (manifest, pending) in extensions {
        display_manifest(manifest, pending, args.detailed);
        println!();
    }
    Ok(())
}

/// JSON view of a manifest
pub fn manifest_json(manifest: &Manifest, pending_uninstall: bool) -> Value {
    let relations = |relations: &[crate::manifest::Relation]| -> Vec<Value> {
        relations
            .iter()
            .map(|(filter, target)| {
                json!({
                    "id": target.id().as_str(),
                    "min_version": target.min().to_string(),
                    "max_version": target.max().to_string(),
                    "target_application": filter.as_ref().map(ToString::to_string),
                })
            })
            .collect()
    };

    json!({
        "id": manifest.id.as_str(),
        "name": manifest.name,
        "version": manifest.version.to_string(),
        "description": manifest.description,
        "creator": manifest.creator,
        "developers": manifest.developers,
        "translators": manifest.translators,
        "contributors": manifest.contributors,
        "homepage_url": manifest.homepage_url,
        "hidden": manifest.hidden,
        "platforms": manifest.platforms,
        "target_applications": manifest
            .target_applications
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        "requires": relations(manifest.requires.as_slice()),
        "incompatible": relations(manifest.incompatible.as_slice()),
        "help_entries": manifest.help_entries,
        "pending_uninstall": pending_uninstall,
    })
}

/// Display a manifest, briefly or with every field
pub fn display_manifest(manifest: &Manifest, pending_uninstall: bool, detailed: bool) {
    let label = Style::new().bold();
    let mut heading = format!(
        "  {} {}",
        Style::new().bold().yellow().apply_to(manifest.display_name()),
        Style::new().dim().apply_to(&manifest.version)
    );
    if pending_uninstall {
        heading.push_str(&format!(" {}", Style::new().red().apply_to("(pending removal)")));
    }
    println!("{heading}");
    println!("    {} {}", label.apply_to("Id:"), manifest.id);
    if let Some(description) = &manifest.description {
        println!("    {} {description}", label.apply_to("Description:"));
    }
    if !detailed {
        return;
    }

    if let Some(creator) = &manifest.creator {
        println!("    {} {creator}", label.apply_to("Creator:"));
    }
    for (title, people) in [
        ("Developers:", &manifest.developers),
        ("Translators:", &manifest.translators),
        ("Contributors:", &manifest.contributors),
    ] {
        if !people.is_empty() {
            println!("    {} {}", label.apply_to(title), people.join(", "));
        }
    }
    if let Some(url) = &manifest.homepage_url {
        println!("    {} {url}", label.apply_to("Homepage:"));
    }
    if !manifest.platforms.is_empty() {
        println!("    {} {}", label.apply_to("Platforms:"), manifest.platforms.join(", "));
    }
    println!("    {}", label.apply_to("Target applications:"));
    for app in &manifest.target_applications {
        println!("      {app}");
    }
    for (title, relations) in [
        ("Requires:", &manifest.requires),
        ("Incompatible with:", &manifest.incompatible),
    ] {
        if relations.is_empty() {
            continue;
        }
        println!("    {}", label.apply_to(title));
        for (filter, target) in relations {
            match filter {
                Some(app) => println!("      {target} {}", Style::new().dim().apply_to(format!("(on {app})"))),
                None => println!("      {target}"),
            }
        }
    }
    if !manifest.help_entries.is_empty() {
        println!("    {}", label.apply_to("Help:"));
        for (name, url) in &manifest.help_entries {
            println!("      {name}: {url}");
        }
    }
    if manifest.hidden {
        println!("    {} yes", label.apply_to("Hidden:"));
    }
}
