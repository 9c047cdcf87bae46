//! Run-level error types.
//!
//! Only two failures end a run: an unreadable document and a failed label
//! gate. Per-issue tracker failures never reach this level; they are
//! isolated by the orchestrator and reported in the run summary.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;
use tracker::{RepoSlug, TrackerError};

/// The Task Document could not be read or is structurally invalid.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Task document not found at {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read task document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed task document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Children may not carry children of their own.
    #[error("Task '{parent}' > '{child}' has nested children; only one level of sub-tasks is allowed")]
    NestedChildren { parent: String, child: String },

    #[error("Duplicate task title '{title}' {scope}")]
    DuplicateTitle { title: String, scope: String },
}

/// A fatal failure that aborts the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Required labels are missing on the tracker. No issue was created.
    #[error("{}", validation_message(.repo, .web_url, .missing))]
    Validation {
        repo: RepoSlug,
        /// Browser-facing root of the tracker that was checked.
        web_url: String,
        missing: BTreeSet<String>,
    },

    /// The label list could not be fetched, so the gate cannot be evaluated.
    #[error("Failed to fetch labels from {repo}: {source}")]
    LabelFetch {
        repo: RepoSlug,
        #[source]
        source: TrackerError,
    },
}

impl RunError {
    /// Missing tags, when this is a label validation failure.
    pub fn missing_labels(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Validation { missing, .. } => Some(missing),
            _ => None,
        }
    }
}

fn validation_message(repo: &RepoSlug, web_url: &str, missing: &BTreeSet<String>) -> String {
    let mut msg = format!(
        "{} label(s) required by the task document are missing from {repo}:\n",
        missing.len()
    );
    for tag in missing {
        let _ = writeln!(msg, "  - {tag}");
    }
    msg.push_str("\nCreate them before running again, for example:\n");
    let gh_repo = repo.gh_repo_arg(web_url);
    for tag in missing {
        let _ = writeln!(msg, "  gh label create \"{tag}\" --repo {gh_repo}");
    }
    let _ = write!(msg, "\nOr manage labels at {}", repo.labels_page(web_url));
    msg
}
