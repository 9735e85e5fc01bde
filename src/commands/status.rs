//! Status command implementation
//!
//! Prints what the host application picks up from the installation when it
//! starts: scheduled removals, bundles offered for installation, splash
//! screens and the merged help entries.

use console::Style;
use serde_json::{Value, json};

use super::helpers::{GlobalOptions, open_coordinator};
use super::list::manifest_json;
use crate::cli::StatusArgs;
use crate::error::Result;

/// Run status command
pub fn run(options: &GlobalOptions, args: StatusArgs) -> Result<()> {
    let mut coordinator = open_coordinator(options)?;
    coordinator.set_pending_install(&args.bundles);

    let scheduled = coordinator.pending_uninstalls()?;
    let splash_screens: Vec<String> = coordinator
        .splash_screen_paths()
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    let help = coordinator.help_entries();

    if args.json {
        let offered: Vec<Value> = coordinator
            .pending_install()
            .map(|manifest| {
                let mut value = manifest_json(manifest, false);
                value["installed"] = coordinator.extension(&manifest.id).is_some().into();
                value
            })
            .collect();
        let value = json!({
            "installed": coordinator.extensions().count(),
            "pending_uninstall": scheduled,
            "pending_install": offered,
            "splash_screens": splash_screens,
            "help_entries": help,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let label = Style::new().bold();
    let dim = Style::new().dim();

    println!("{} {}", label.apply_to("Installed extensions:"), coordinator.extensions().count());
    for manifest in coordinator.extensions() {
        let offered = coordinator
            .pending_install_extension(&manifest.id)
            .map(|bundle| format!(" (bundle {} offered)", bundle.version))
            .unwrap_or_default();
        let pending = if coordinator.is_pending_uninstall(&manifest.id) {
            " (pending removal)"
        } else {
            ""
        };
        println!(
            "  {} {}{}",
            manifest.display_name(),
            dim.apply_to(&manifest.version),
            dim.apply_to(format!("{offered}{pending}"))
        );
    }

    let new_bundles: Vec<_> = coordinator
        .pending_install()
        .filter(|manifest| coordinator.extension(&manifest.id).is_none())
        .collect();
    if !new_bundles.is_empty() {
        println!("{}", label.apply_to("Offered for installation:"));
        for manifest in new_bundles {
            println!("  {} {}", manifest.display_name(), dim.apply_to(&manifest.version));
        }
    }

    if !scheduled.is_empty() {
        println!("{}", label.apply_to("Scheduled for removal:"));
        for entry in &scheduled {
            println!("  {entry}");
        }
    }

    if !splash_screens.is_empty() {
        println!("{}", label.apply_to("Splash screens:"));
        for path in &splash_screens {
            println!("  {path}");
        }
    }

    if !help.is_empty() {
        println!("{}", label.apply_to("Help entries:"));
        for (name, location) in &help {
            println!("  {name}: {location}");
        }
    }
    Ok(())
}
