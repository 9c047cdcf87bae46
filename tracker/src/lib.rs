//! Issue tracker client for release planning.
//!
//! This crate provides:
//! - The [`IssueTracker`] trait: create/get/update issues and list labels
//! - [`GitHubTracker`]: the GitHub REST implementation, authenticated with a bearer token
//! - [`RetryPolicy`]: rate-limit aware retry with exponential backoff, applied to every call
//! - [`TrackerError`]: the failure taxonomy, classified for retry decisions
//!
//! # Usage
//!
//! ```rust,ignore
//! use tracker::{GitHubTracker, IssueTracker, NewIssue, TrackerConfig};
//!
//! let client = GitHubTracker::new(TrackerConfig::default(), "acme/rocket".parse()?, &token)?;
//! let issue = client
//!     .create_issue(&NewIssue::new("Cut release branch", "...").with_labels(["release"]))
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{classify_failure, GitHubTracker, IssueTracker, RepoSlug};
pub use config::TrackerConfig;
pub use error::{RetryCategory, TrackerError, TrackerResult};
pub use retry::RetryPolicy;
pub use types::{CreatedIssue, IssueUpdate, NewIssue, TrackerLabel};
