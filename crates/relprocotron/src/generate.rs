//! Document generation: release parameters in, Task Document out.
//!
//! The task hierarchy is taken verbatim from an optional tasks file; this
//! module only attaches release metadata and decides where the result goes.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::document::{self, Release, ReleaseType, Task, TaskDocument};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Release metadata as collected from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseParams {
    pub name: String,
    pub tag: String,
    pub release_type: ReleaseType,
    pub date: String,
    pub project_url: String,
    pub software_name: String,
    pub software_version: String,
    pub comments: Vec<String>,
}

impl ReleaseParams {
    /// Reject dates that are not `YYYY-MM-DD`.
    pub fn validated_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).with_context(|| {
            format!(
                "invalid release date '{}', expected YYYY-MM-DD",
                self.date
            )
        })
    }

    pub fn to_release(&self) -> Release {
        Release {
            name: self.name.clone(),
            tag: self.tag.clone(),
            release_type: self.release_type,
            date: self.date.clone(),
            project_url: self.project_url.clone(),
            software_name: self.software_name.clone(),
            software_version: self.software_version.clone(),
            comments: self.comments.clone(),
        }
    }

    /// Human-readable echo of every parameter.
    pub fn verification_report(&self, dry_run: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Release Process-O-Tron - Parameter Verification");
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "Release Name: {}", self.name);
        let _ = writeln!(out, "Release Tag: {}", self.tag);
        let _ = writeln!(out, "Release Type: {}", self.release_type);
        let _ = writeln!(out, "Release Date: {}", self.date);
        let _ = writeln!(out, "Project URL: {}", self.project_url);
        let _ = writeln!(out, "Dry Run: {dry_run}");
        let _ = writeln!(out, "Software Name: {}", self.software_name);
        let _ = writeln!(out, "Software Version: {}", self.software_version);
        let _ = writeln!(out, "Comments: {:?}", self.comments);
        out
    }
}

/// Where a generated document ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Print the JSON, write nothing.
    DryRun,
    File(PathBuf),
}

/// Build a validated document from release parameters and a task list.
pub fn build_document(params: &ReleaseParams, tasks: Vec<Task>) -> Result<TaskDocument> {
    params.validated_date()?;
    let document = TaskDocument {
        release: params.to_release(),
        tasks,
    };
    document
        .validate()
        .context("generated task hierarchy is invalid")?;
    Ok(document)
}

/// Read a JSON array of tasks to use as the hierarchy.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tasks file {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("malformed tasks file {}", path.display()))
}

/// Generate a document and either write it or return its JSON for printing.
///
/// Returns the JSON text in both cases.
pub fn generate(params: &ReleaseParams, tasks: Vec<Task>, output: &Output) -> Result<String> {
    let document = build_document(params, tasks)?;
    let json = document.to_json()?;

    match output {
        Output::DryRun => {
            info!(tasks = document.total_tasks(), "Dry run; document not written");
        }
        Output::File(path) => {
            document::save(&document, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(
                path = %path.display(),
                tasks = document.total_tasks(),
                "Wrote task document"
            );
        }
    }
    Ok(json)
}
