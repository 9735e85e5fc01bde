//! Process-pending command implementation

use console::Style;

use super::helpers::{GlobalOptions, open_coordinator, progress_display};
use crate::error::Result;

/// Run process-pending command
pub fn run(options: &GlobalOptions) -> Result<()> {
    let mut coordinator = open_coordinator(options)?;
    let scheduled = coordinator.pending_uninstalls()?;
    if scheduled.is_empty() {
        println!("Nothing to process.");
        return Ok(());
    }

    let mut progress = progress_display(options);
    if let Err(err) = coordinator.process_pending(&mut progress) {
        progress.abandon();
        return Err(err);
    }
    progress.finish();

    for entry in &scheduled {
        println!("{} {entry}", Style::new().green().bold().apply_to("Processed"));
    }
    Ok(())
}
