//! # Memora CLI
//!
//! A thin terminal client over `memoraapp`. The binary only invokes
//! `cli::run()` and turns an error into a message and exit code 1.
//!
//! ## Workspace Structure
//!
//! - `crates/memoraapp/`: the persistence core (stores, repositories,
//!   backup and restore), UI agnostic
//! - `crates/memora/`: this client
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/memora/src/cli/)                         │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - logging, config and runtime wiring (commands.rs)         │
//! │  - per-command handlers (handlers.rs)                       │
//! │  - terminal rendering (render.rs)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/memoraapp/src/api.rs)                    │
//! │  - Returns structured results, never prints                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CLI is the only place that writes to stdout, prompts for
//! confirmation or chooses an exit code.
//!
//! ## Testing Approach
//!
//! Argument parsing is unit tested in `setup.rs` and rendering in
//! `render.rs`. End-to-end runs of the built binary live in `tests/`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
