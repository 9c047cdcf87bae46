//! Release Process-O-Tron.
//!
//! Generates a hierarchical release plan (the Task Document) and files it on
//! an issue tracker as linked parent/child issues.
//!
//! - [`document`]: Task Document model, loading and ordering
//! - [`generate`]: release parameters to Task Document
//! - [`orchestrator`]: label gate, ordered issue creation, parent back-links
//! - [`state_machine`]: forward-only run states
//! - [`cli`]: command-line surface
//! - [`startup`]: logging and build metadata
//!
//! Tracker access lives in the `tracker` crate.

pub mod body;
pub mod cli;
pub mod document;
pub mod error;
pub mod generate;
pub mod orchestrator;
pub mod startup;
pub mod state_machine;

pub use document::{ReleaseType, Task, TaskDocument};
pub use error::{DocumentError, RunError};
pub use orchestrator::{IssueCreator, Orchestrator, RunMode, RunSummary};
