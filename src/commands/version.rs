//! Version command implementation

use crate::config::{DEFAULT_HOST_ID, DEFAULT_HOST_VERSION};
use crate::domain::Platform;
use crate::error::Result;

/// Run version command
pub fn run() -> Result<()> {
    println!("aeb {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("  Profile: {}", build_profile());
    println!("  Platform: {}", Platform::current());
    println!();
    println!("Default host:");
    println!("  Id: {{{DEFAULT_HOST_ID}}}");
    println!("  Version: {DEFAULT_HOST_VERSION}");

    Ok(())
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
