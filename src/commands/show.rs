//! Show command implementation
//!
//! Shows an installed extension by id, or a bundle on disk by path without
//! installing it.

use std::path::Path;

use console::Style;

use super::helpers::{GlobalOptions, open_coordinator};
use super::list::{display_manifest, manifest_json};
use crate::bundle::BundleReader;
use crate::cli::ShowArgs;
use crate::domain::Identifier;
use crate::error::{Result, bundle, deps};

/// Run show command
pub fn run(options: &GlobalOptions, args: ShowArgs) -> Result<()> {
    let coordinator = open_coordinator(options)?;
    let path = Path::new(&args.target);

    let mut source = None;
    let (manifest, pending, installed) = if path.exists() {
        let reader = BundleReader::open(path, &coordinator.host().platform)?;
        let manifest = reader.manifest()?;
        let kind = if reader.is_archive() { "archive" } else { "directory" };
        source = Some(format!("{} ({kind})", reader.path().display()));
        let installed = coordinator.extension(&manifest.id).is_some();
        let pending = coordinator.is_pending_uninstall(&manifest.id) && installed;
        (manifest, pending, installed)
    } else {
        let id = Identifier::new(&args.target);
        if !id.is_valid() {
            return Err(bundle::not_found(args.target.as_str()));
        }
        let manifest = coordinator
            .extension(&id)
            .cloned()
            .ok_or_else(|| deps::not_installed(id.as_str()))?;
        let pending = coordinator.is_pending_uninstall(&id);
        (manifest, pending, true)
    };

    if args.json {
        let mut value = manifest_json(&manifest, pending);
        value["installed"] = installed.into();
        value["bundle"] = source.into();
        value["valid"] = manifest.validate(coordinator.host()).into();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    display_manifest(&manifest, pending, true);
    if let Some(source) = &source {
        println!("    {} {source}", Style::new().bold().apply_to("Bundle:"));
    }
    if !installed {
        println!("    {} no", Style::new().bold().apply_to("Installed:"));
    }
    if let Some(reason) = manifest.validation_error(coordinator.host()) {
        println!(
            "    {} {reason}",
            Style::new().bold().red().apply_to("Invalid:")
        );
    }
    for (url, text) in manifest.license_urls.iter().zip(&manifest.licenses) {
        println!();
        println!("    {} {url}", Style::new().bold().apply_to("License:"));
        for line in text.lines() {
            println!("      {line}");
        }
    }
    Ok(())
}
