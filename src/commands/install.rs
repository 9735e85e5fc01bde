//! Install command implementation
//!
//! Bundles are installed one at a time, in the order given, so a later
//! bundle may require an earlier one. The first failure stops the command;
//! bundles installed before it stay installed.

use console::Style;

use super::helpers::{GlobalOptions, open_coordinator, progress_display};
use crate::cli::InstallArgs;
use crate::error::Result;

/// Run install command
pub fn run(options: &GlobalOptions, args: InstallArgs) -> Result<()> {
    let mut coordinator = open_coordinator(options)?;

    for path in &args.bundles {
        let mut progress = progress_display(options);
        match coordinator.install_extension(path, &mut progress) {
            Ok(id) => {
                progress.finish();
                if let Some(manifest) = coordinator.extension(&id) {
                    println!(
                        "{} {} {}",
                        Style::new().green().bold().apply_to("Installed"),
                        Style::new().bold().apply_to(manifest.display_name()),
                        Style::new().dim().apply_to(&manifest.version)
                    );
                }
            }
            Err(err) => {
                progress.abandon();
                return Err(err);
            }
        }
    }

    Ok(())
}
