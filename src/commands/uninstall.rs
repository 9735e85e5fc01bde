//! Uninstall command implementation
//!
//! Uninstalling schedules a removal. The files go away on the next
//! `process-pending`, or immediately with `--now`.

use console::Style;
use inquire::Confirm;

use super::helpers::{GlobalOptions, open_coordinator, progress_display};
use crate::cli::UninstallArgs;
use crate::domain::Identifier;
use crate::error::{Result, deps};
use crate::installer::InstallCoordinator;

/// Run uninstall command
pub fn run(options: &GlobalOptions, args: UninstallArgs) -> Result<()> {
    let mut coordinator = open_coordinator(options)?;

    let targets: Vec<String> = if args.all {
        coordinator
            .extensions()
            .map(|m| m.display_name().to_string())
            .collect()
    } else {
        let raw = args.id.as_deref().unwrap_or_default();
        let id = Identifier::new(raw);
        let manifest = coordinator
            .extension(&id)
            .ok_or_else(|| deps::not_installed(raw))?;
        vec![manifest.display_name().to_string()]
    };

    if targets.is_empty() {
        println!("No extensions installed.");
        return Ok(());
    }
    if !args.yes && !confirm_uninstall(&targets)? {
        println!("Uninstall cancelled.");
        return Ok(());
    }

    if args.all {
        coordinator.uninstall_all()?;
    } else {
        let id = Identifier::new(args.id.as_deref().unwrap_or_default());
        coordinator.uninstall_extension(&id)?;
    }

    if args.now {
        process(options, &mut coordinator)?;
        for name in &targets {
            println!("{} {name}", Style::new().green().bold().apply_to("Removed"));
        }
    } else {
        for name in &targets {
            println!(
                "{} {name} {}",
                Style::new().yellow().bold().apply_to("Scheduled"),
                Style::new().dim().apply_to("(run 'aeb process-pending' to finish)")
            );
        }
    }
    Ok(())
}

fn process(options: &GlobalOptions, coordinator: &mut InstallCoordinator) -> Result<()> {
    let mut progress = progress_display(options);
    match coordinator.process_pending(&mut progress) {
        Ok(()) => {
            progress.finish();
            Ok(())
        }
        Err(err) => {
            progress.abandon();
            Err(err)
        }
    }
}

/// Confirm uninstallation with user, showing what would be done
fn confirm_uninstall(names: &[String]) -> Result<bool> {
    println!("\nThe following extension(s) will be uninstalled:");
    for name in names {
        println!("  - {name}");
    }
    println!();

    Ok(Confirm::new("Proceed with uninstall?")
        .with_default(true)
        .with_help_message("Press Enter to confirm, or 'n' to cancel")
        .prompt()?)
}
