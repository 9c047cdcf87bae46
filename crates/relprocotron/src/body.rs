//! Issue body text for parents, children and sub-task checklists.

use tracker::CreatedIssue;

use crate::document::Task;

/// Characters of body shown in a dry-run preview.
pub const PREVIEW_CHARS: usize = 100;

const CHECKLIST_HEADING: &str = "## Sub-tasks";

/// Category line, blank line, description lines.
pub fn parent_body(task: &Task) -> String {
    let mut body = category_line(task);
    if !task.description.is_empty() {
        body.push_str("\n\n");
        body.push_str(&task.description.join("\n"));
    }
    body
}

/// Back-reference, category, description, priority.
pub fn child_body(task: &Task, parent_number: Option<u64>) -> String {
    let mut sections = Vec::with_capacity(4);
    if let Some(number) = parent_number {
        sections.push(format!("Parent Issue: #{number}"));
    }
    sections.push(category_line(task));
    if !task.description.is_empty() {
        sections.push(task.description.join("\n"));
    }
    sections.push(format!("**Priority:** {}", task.priority));
    sections.join("\n\n")
}

/// One `- [ ] #<n> <title>` line per child.
pub fn checklist(children: &[CreatedIssue]) -> String {
    children
        .iter()
        .map(|c| format!("- [ ] #{} {}", c.number, c.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parent body with the sub-task checklist appended.
pub fn append_checklist(body: &str, children: &[CreatedIssue]) -> String {
    let body = body.trim_end();
    let list = checklist(children);
    if body.is_empty() {
        format!("{CHECKLIST_HEADING}\n\n{list}")
    } else {
        format!("{body}\n\n{CHECKLIST_HEADING}\n\n{list}")
    }
}

/// First [`PREVIEW_CHARS`] characters, with `...` when cut.
pub fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn category_line(task: &Task) -> String {
    format!("**Category:** {}", task.category)
}
