//! Command helper utilities

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::InstallerConfig;
use crate::error::Result;
use crate::installer::InstallCoordinator;
use crate::progress::ProgressDisplay;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub home: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub quiet: bool,
}

/// Default configuration file location (`<config dir>/aeb/aeb.yaml`)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("aeb").join("aeb.yaml"))
}

/// Load the configuration named on the command line, else the default one
///
/// An explicitly named file must exist. The default file is optional.
pub fn load_config(options: &GlobalOptions) -> Result<InstallerConfig> {
    let config = match &options.config {
        Some(path) => InstallerConfig::load(path)?,
        None => match default_config_path().filter(|path| path.is_file()) {
            Some(path) => load_from(&path)?,
            None => InstallerConfig::default(),
        },
    };
    Ok(config.with_home(options.home.clone()))
}

fn load_from(path: &Path) -> Result<InstallerConfig> {
    debug!(path = %path.display(), "loading configuration");
    InstallerConfig::load(path)
}

/// Open the installation the options point at
pub fn open_coordinator(options: &GlobalOptions) -> Result<InstallCoordinator> {
    let config = load_config(options)?;
    InstallCoordinator::new(&config)
}

/// Progress bar for one operation, hidden with `--quiet`
pub fn progress_display(options: &GlobalOptions) -> ProgressDisplay {
    if options.quiet {
        ProgressDisplay::hidden()
    } else {
        ProgressDisplay::new()
    }
}
