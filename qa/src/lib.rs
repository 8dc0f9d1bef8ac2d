//! qa - federated quality-check orchestrator
//!
//! qa composes `.qa.yml` files across a monorepo into a single set of
//! format and check commands, runs the format phase to completion, then
//! runs the checks phase concurrently, skipping any check whose git
//! subtree is unchanged since it last passed.
//!
//! # Modules
//!
//! - [`domain`] - Core value types and the `Cache`/`CommandRunner` traits
//! - [`events`] - Typed event stream emitted during a run
//! - [`config`] - Recursive `.qa.yml` composition
//! - [`cache`] - Git-tree-hash-addressed result cache
//! - [`executor`] - Two-phase concurrent executor
//! - [`runner`] - Shell command runner
//! - [`presenter`] - Terminal rendering of the event stream
//! - [`init`] - One-time project setup helpers
//! - [`cli`] - Command-line interface

pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod executor;
pub mod init;
pub mod presenter;
pub mod runner;
