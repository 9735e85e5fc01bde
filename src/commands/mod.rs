//! Command implementations for the aeb CLI

pub mod completions;
pub mod helpers;
pub mod install;
pub mod list;
pub mod process_pending;
pub mod show;
pub mod status;
pub mod uninstall;
pub mod version;
