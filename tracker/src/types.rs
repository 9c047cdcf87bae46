//! Issue and label records exchanged with the tracker.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An issue as returned by the tracker after a create, get or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
}

/// A label defined on the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerLabel {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Payload for `POST /repos/{repo}/issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl NewIssue {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update for `PATCH /repos/{repo}/issues/{n}`.
///
/// Fields left as `None` are not sent, so the tracker keeps their current
/// values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl IssueUpdate {
    /// Update that replaces only the body.
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }
}

/// Issue shape on the wire: nullable body, labels as objects.
#[derive(Debug, Deserialize)]
pub(crate) struct RawIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLabel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<RawIssue> for CreatedIssue {
    fn from(raw: RawIssue) -> Self {
        Self {
            number: raw.number,
            title: raw.title,
            body: raw.body.unwrap_or_default(),
            labels: raw.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

impl From<RawLabel> for TrackerLabel {
    fn from(raw: RawLabel) -> Self {
        Self {
            name: raw.name,
            description: raw.description.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_serializes_only_set_fields() {
        let json = serde_json::to_value(IssueUpdate::body("new body")).unwrap();
        assert_eq!(json, serde_json::json!({ "body": "new body" }));
    }

    #[test]
    fn empty_update_sends_nothing() {
        let json = serde_json::to_value(IssueUpdate::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn new_issue_omits_empty_labels() {
        let json = serde_json::to_value(NewIssue::new("Title", "Body")).unwrap();
        assert!(json.get("labels").is_none());

        let json =
            serde_json::to_value(NewIssue::new("Title", "Body").with_labels(["bug"])).unwrap();
        assert_eq!(json["labels"], serde_json::json!(["bug"]));
    }

    #[test]
    fn raw_issue_with_null_body_and_label_objects() {
        let raw: RawIssue = serde_json::from_value(serde_json::json!({
            "number": 17,
            "title": "Cut release branch",
            "body": null,
            "labels": [
                { "id": 1, "name": "release", "description": null },
                { "id": 2, "name": "bug", "description": "Something is broken" }
            ],
            "state": "open"
        }))
        .unwrap();

        let issue = CreatedIssue::from(raw);
        assert_eq!(issue.number, 17);
        assert_eq!(issue.body, "");
        assert!(issue.labels.contains("release"));
        assert!(issue.labels.contains("bug"));
    }

    #[test]
    fn raw_label_null_description() {
        let raw: RawLabel =
            serde_json::from_value(serde_json::json!({ "name": "docs", "description": null }))
                .unwrap();
        let label = TrackerLabel::from(raw);
        assert_eq!(label.name, "docs");
        assert_eq!(label.description, "");
    }
}
