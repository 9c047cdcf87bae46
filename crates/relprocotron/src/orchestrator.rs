//! Issue Creation Orchestrator.
//!
//! Turns a Task Document into linked tracker issues. A run is dispatched to
//! one of two procedures by its mode:
//!
//! ```text
//! Loading ─┬─ DryRun ─▶ DryRunPreview ─▶ Done
//!          └─ Live ───▶ Validating ─┬─▶ Failed (missing labels)
//!                                   └─▶ CreatingParents ─▶ CreatingChildren
//!                                       ─▶ PatchingParents ─▶ Done
//! ```
//!
//! Only document and label-gate failures are fatal. Once creation starts,
//! every tracker failure is isolated to the task it belongs to.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info, warn};
use tracker::{CreatedIssue, IssueTracker, IssueUpdate, NewIssue, RepoSlug};

use crate::body;
use crate::document::{self, Task, TaskDocument};
use crate::error::RunError;
use crate::state_machine::{RunState, RunStateMachine};

/// Which procedure a run follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    DryRun,
    Live,
}

/// What an issue would look like, without creating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuePreview {
    pub title: String,
    pub body_excerpt: String,
    pub labels: BTreeSet<String>,
    /// 0 for top-level tasks, 1 for children.
    pub depth: u8,
}

/// A task whose issue could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTask {
    pub title: String,
    pub reason: String,
}

/// Non-fatal failure to add the sub-task checklist to a parent issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchWarning {
    pub parent: u64,
    pub reason: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub total_tasks: usize,
    /// Issues created, in creation order.
    pub created: Vec<CreatedIssue>,
    pub failed: Vec<FailedTask>,
    pub patch_warnings: Vec<PatchWarning>,
    pub previews: Vec<IssuePreview>,
    pub states: Vec<RunState>,
}

impl RunSummary {
    fn new(mode: RunMode, document: &TaskDocument) -> Self {
        Self {
            mode,
            total_tasks: document.total_tasks(),
            created: Vec::new(),
            failed: Vec::new(),
            patch_warnings: Vec::new(),
            previews: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    /// Whether every task landed on the tracker.
    pub fn is_complete(&self) -> bool {
        self.mode == RunMode::Live && self.created.len() == self.total_tasks
    }
}

/// Live issue creation against a tracker.
pub struct IssueCreator<T> {
    tracker: T,
    repo: RepoSlug,
}

/// Entry point for a run: either a preview or live creation.
pub enum Orchestrator<T> {
    DryRun,
    Live(IssueCreator<T>),
}

impl<T: IssueTracker> Orchestrator<T> {
    /// Preview only. No tracker is constructed or contacted.
    pub fn dry_run() -> Self {
        Self::DryRun
    }

    pub fn live(tracker: T, repo: RepoSlug) -> Self {
        Self::Live(IssueCreator { tracker, repo })
    }

    pub fn mode(&self) -> RunMode {
        match self {
            Self::DryRun => RunMode::DryRun,
            Self::Live(_) => RunMode::Live,
        }
    }

    /// Load the document at `path` and run it.
    pub async fn run(&self, path: &Path) -> Result<RunSummary, RunError> {
        let mut sm = RunStateMachine::new();
        let document = match document::load(path) {
            Ok(document) => document,
            Err(err) => {
                fail(&mut sm, &err.to_string());
                return Err(err.into());
            }
        };
        self.dispatch(&document, sm).await
    }

    /// Run an already loaded document.
    pub async fn run_document(&self, document: &TaskDocument) -> Result<RunSummary, RunError> {
        self.dispatch(document, RunStateMachine::new()).await
    }

    async fn dispatch(
        &self,
        document: &TaskDocument,
        sm: RunStateMachine,
    ) -> Result<RunSummary, RunError> {
        match self {
            Self::DryRun => Ok(preview(document, sm)),
            Self::Live(creator) => creator.create_all(document, sm).await,
        }
    }
}

/// Dry-run procedure: previews for every task and child, zero tracker calls.
pub fn preview(document: &TaskDocument, mut sm: RunStateMachine) -> RunSummary {
    transition(&mut sm, RunState::DryRunPreview, None);
    let mut summary = RunSummary::new(RunMode::DryRun, document);

    for task in document.tasks_in_order() {
        summary.previews.push(IssuePreview {
            title: task.title.clone(),
            body_excerpt: body::excerpt(&body::parent_body(task)),
            labels: task.tags.iter().cloned().collect(),
            depth: 0,
        });
        for child in task.children_in_order() {
            summary.previews.push(IssuePreview {
                title: child.title.clone(),
                body_excerpt: body::excerpt(&body::child_body(child, None)),
                labels: child.tags.iter().cloned().collect(),
                depth: 1,
            });
        }
    }

    transition(&mut sm, RunState::Done, None);
    summary.states = sm.path();
    info!(
        previews = summary.previews.len(),
        states = %sm.summary(),
        "Dry run complete; no issues created"
    );
    summary
}

impl<T: IssueTracker> IssueCreator<T> {
    /// Fail fast unless every tag in the document exists as a tracker label.
    pub async fn validate_labels(&self, document: &TaskDocument) -> Result<(), RunError> {
        let required = document.collect_tags();
        let existing: BTreeSet<String> = self
            .tracker
            .list_labels()
            .await
            .map_err(|source| RunError::LabelFetch {
                repo: self.repo.clone(),
                source,
            })?
            .into_iter()
            .map(|l| l.name)
            .collect();

        let missing: BTreeSet<String> = required.difference(&existing).cloned().collect();
        if !missing.is_empty() {
            return Err(RunError::Validation {
                repo: self.repo.clone(),
                web_url: self.tracker.web_url(),
                missing,
            });
        }

        info!(
            required = required.len(),
            available = existing.len(),
            "All required labels present"
        );
        Ok(())
    }

    /// Live procedure: validate, create parents, create children, patch parents.
    async fn create_all(
        &self,
        document: &TaskDocument,
        mut sm: RunStateMachine,
    ) -> Result<RunSummary, RunError> {
        transition(&mut sm, RunState::Validating, None);
        if let Err(err) = self.validate_labels(document).await {
            fail(&mut sm, &err.to_string());
            return Err(err);
        }

        let mut summary = RunSummary::new(RunMode::Live, document);

        transition(&mut sm, RunState::CreatingParents, None);
        let mut parents: Vec<(&Task, Option<u64>)> = Vec::new();
        for task in document.tasks_in_order() {
            let issue = NewIssue::new(&task.title, body::parent_body(task))
                .with_labels(task.tags.iter().cloned());
            let created = self.create_one(issue, None, &mut summary).await;
            parents.push((task, created.map(|c| c.number)));
        }

        transition(&mut sm, RunState::CreatingChildren, None);
        let mut links: Vec<(u64, Vec<CreatedIssue>)> = Vec::new();
        for (task, parent_number) in parents {
            let Some(parent_number) = parent_number else {
                for child in task.children_in_order() {
                    warn!(
                        parent = %task.title,
                        child = %child.title,
                        "Skipping sub-task: parent issue was not created"
                    );
                    summary.failed.push(FailedTask {
                        title: child.title.clone(),
                        reason: format!("parent issue '{}' was not created", task.title),
                    });
                }
                continue;
            };

            let mut children = Vec::new();
            for child in task.children_in_order() {
                let body = body::child_body(child, Some(parent_number));
                let issue =
                    NewIssue::new(&child.title, body).with_labels(child.tags.iter().cloned());
                if let Some(created) = self
                    .create_one(issue, Some(parent_number), &mut summary)
                    .await
                {
                    children.push(created);
                }
            }
            if !children.is_empty() {
                links.push((parent_number, children));
            }
        }

        transition(&mut sm, RunState::PatchingParents, None);
        for (parent_number, children) in &links {
            if let Err(reason) = self.link_children(*parent_number, children).await {
                warn!(
                    parent = parent_number,
                    children = children.len(),
                    error = %reason,
                    "Failed to add sub-task checklist to parent issue"
                );
                summary.patch_warnings.push(PatchWarning {
                    parent: *parent_number,
                    reason,
                });
            }
        }

        transition(&mut sm, RunState::Done, None);
        summary.states = sm.path();

        info!(
            created = summary.created_count(),
            total = summary.total_tasks,
            failed = summary.failed.len(),
            patch_warnings = summary.patch_warnings.len(),
            states = %sm.summary(),
            "Issue creation finished"
        );
        Ok(summary)
    }

    /// Create one issue, recording success or failure in the summary.
    async fn create_one(
        &self,
        issue: NewIssue,
        parent: Option<u64>,
        summary: &mut RunSummary,
    ) -> Option<CreatedIssue> {
        match self.tracker.create_issue(&issue).await {
            Ok(created) => {
                info!(
                    number = created.number,
                    title = %created.title,
                    parent = ?parent,
                    "Created issue"
                );
                summary.created.push(created.clone());
                Some(created)
            }
            Err(err) => {
                error!(
                    title = %issue.title,
                    parent = ?parent,
                    error = %err,
                    "Failed to create issue"
                );
                summary.failed.push(FailedTask {
                    title: issue.title,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    /// Append the sub-task checklist to the parent's current body.
    async fn link_children(&self, parent: u64, children: &[CreatedIssue]) -> Result<(), String> {
        let current = self
            .tracker
            .get_issue(parent)
            .await
            .map_err(|e| format!("fetching parent #{parent}: {e}"))?;

        let body = body::append_checklist(&current.body, children);
        self.tracker
            .update_issue(parent, &IssueUpdate::body(body))
            .await
            .map_err(|e| format!("updating parent #{parent}: {e}"))?;

        info!(parent, children = children.len(), "Linked sub-tasks to parent");
        Ok(())
    }
}

fn transition(sm: &mut RunStateMachine, to: RunState, reason: Option<&str>) {
    if let Err(err) = sm.advance(to, reason) {
        error!(error = %err, "Run state machine rejected transition");
    }
}

fn fail(sm: &mut RunStateMachine, reason: &str) {
    match sm.fail(reason) {
        Ok(()) => error!(states = %sm.summary(), "Run failed"),
        Err(err) => error!(error = %err, "Run state machine rejected transition"),
    }
}
