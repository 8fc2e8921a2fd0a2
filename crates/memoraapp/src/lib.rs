//! # Memora Architecture
//!
//! Memora is the **client-side persistence core** of a language-learning
//! assistant. It stores three collections (vocabulary cards, writing-analysis
//! logs and classical-text logs), moves them in and out of one backup file,
//! and keeps a small cache of in-progress generation state.
//!
//! It is a library that happens to have a CLI client. Generators and UIs are
//! collaborators: they hand us plain records and render what we return.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client (the `memora` CLI, or any other UI)                 │
//! │  - The ONLY place that prints, prompts or sets exit codes   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Single entry point, owns the shared store                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs) and Backup (backup/*.rs)          │
//! │  - Business logic, merge-by-key restore                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Repositories (repo.rs)                                     │
//! │  - One typed collection per key, whole-collection writes    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - KvStore adapter with legacy migration                    │
//! │  - FsBackend, BlobBackend, MemBackend                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes Rust values and returns Rust values. It
//! never writes to stdout or stderr and never exits the process. Diagnostics
//! go through `tracing`; installing a subscriber is the client's job.
//!
//! ## Single-threaded Async
//!
//! Every storage call is `async` so the same code drives the synchronous
//! single-file store and the asynchronous blob store. Futures are not `Send`
//! and shared state uses `Rc`; run the API on a current-thread runtime.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Collection commands with structured results
//! - [`backup`]: Snapshot export and merge restore
//! - [`repo`]: Typed collection repositories
//! - [`session`]: Ephemeral session cache
//! - [`store`]: Key-value adapter and backends
//! - [`model`]: Record types and validation
//! - [`config`]: Configuration
//! - [`error`]: Error types

pub mod api;
pub mod backup;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod repo;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod test_utils;
