//! # CLI Behavior
//!
//! This is **one possible client** for memora, not the application itself.
//!
//! ## Commands
//!
//! - `memora vocab list|add|remove|tag|image`
//! - `memora writing list|add|remove`
//! - `memora classical list|add|remove`
//! - `memora export [--out DIR]`: write a dated backup file
//! - `memora import FILE [--yes]`: merge a backup into the library
//! - `memora config`: show the resolved configuration
//!
//! ## Import Needs Consent
//!
//! Without `--yes`, `import` prints what a restore will do and stops. Restore
//! merges and never deletes, but the user should know that before it runs.
//!
//! ## Exit Codes
//!
//! Failures print `Error: ...` to stderr and exit 1. A restore that applied
//! only some collections prints one warning per failed collection and also
//! exits 1.
//!
//! ## Logging
//!
//! Library diagnostics go to stderr through `tracing`. The filter comes from
//! `MEMORA_LOG`; `-v` raises the default from `warn` to `debug`.
//!
//! ## Module Structure
//!
//! - `commands`: entry point, logging, config and runtime wiring
//! - `handlers`: one async function per command
//! - `render`: output formatting
//! - `setup`: argument parsing via clap

mod commands;
mod handlers;
mod render;
pub mod setup;

pub use commands::run;
