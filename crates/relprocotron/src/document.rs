//! Task Document: the hierarchical release plan.
//!
//! Produced by `generate`, consumed by the issue orchestrator. Once loaded it
//! is never mutated; ordering helpers return sorted views instead.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DocumentError;

/// Release flavour. Serialized exactly as the CLI accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReleaseType {
    #[serde(rename = "LTS")]
    #[value(name = "LTS")]
    Lts,
    #[serde(rename = "dev")]
    #[value(name = "dev")]
    Dev,
    #[serde(rename = "experimental")]
    #[value(name = "experimental")]
    Experimental,
    #[serde(rename = "early-access")]
    #[value(name = "early-access")]
    EarlyAccess,
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lts => write!(f, "LTS"),
            Self::Dev => write!(f, "dev"),
            Self::Experimental => write!(f, "experimental"),
            Self::EarlyAccess => write!(f, "early-access"),
        }
    }
}

/// Release metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub tag: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    pub date: String,
    pub project_url: String,
    pub software_name: String,
    pub software_version: String,
    #[serde(default)]
    pub comments: Vec<String>,
}

/// One work item. Top-level tasks may have children; children may not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Task>,
}

impl Task {
    /// Children in creation order: priority ascending, document order on ties.
    pub fn children_in_order(&self) -> Vec<&Task> {
        in_priority_order(&self.children)
    }
}

/// The full release plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDocument {
    pub release: Release,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskDocument {
    /// Parse and structurally validate a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Pretty JSON as written to disk.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check nesting depth and sibling title uniqueness.
    pub fn validate(&self) -> Result<(), DocumentError> {
        ensure_unique_titles(&self.tasks, "among top-level tasks")?;
        for task in &self.tasks {
            if let Some(child) = task.children.iter().find(|c| !c.children.is_empty()) {
                return Err(DocumentError::NestedChildren {
                    parent: task.title.clone(),
                    child: child.title.clone(),
                });
            }
            ensure_unique_titles(&task.children, &format!("under '{}'", task.title))?;
        }
        Ok(())
    }

    /// Top-level tasks in creation order.
    pub fn tasks_in_order(&self) -> Vec<&Task> {
        in_priority_order(&self.tasks)
    }

    /// Number of tasks including children.
    pub fn total_tasks(&self) -> usize {
        self.tasks.iter().map(|t| 1 + t.children.len()).sum()
    }

    /// Every distinct tag used by any task or child.
    pub fn collect_tags(&self) -> BTreeSet<String> {
        self.tasks
            .iter()
            .flat_map(|t| std::iter::once(t).chain(t.children.iter()))
            .flat_map(|t| t.tags.iter().cloned())
            .collect()
    }
}

/// Read and validate a Task Document from disk.
pub fn load(path: &Path) -> Result<TaskDocument, DocumentError> {
    let json = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DocumentError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            DocumentError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let document = TaskDocument::from_json(&json)?;
    debug!(
        path = %path.display(),
        tasks = document.tasks.len(),
        total = document.total_tasks(),
        "Loaded task document"
    );
    Ok(document)
}

/// Write a document as pretty JSON.
pub fn save(document: &TaskDocument, path: &Path) -> Result<(), DocumentError> {
    let json = document.to_json()?;
    std::fs::write(path, json + "\n").map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Stable sort by priority.
fn in_priority_order(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|t| t.priority);
    ordered
}

fn ensure_unique_titles(tasks: &[Task], scope: &str) -> Result<(), DocumentError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.title.as_str()) {
            return Err(DocumentError::DuplicateTitle {
                title: task.title.clone(),
                scope: scope.to_string(),
            });
        }
    }
    Ok(())
}
