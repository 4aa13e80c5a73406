use serde::{Deserialize, Deserializer, Serialize};

/// Named state of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

impl Status {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive, whitespace-trimmed name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        normalize_name(&self.name) == normalize_name(name)
    }
}

/// Transition as reported by the issue transition listing or a workflow layout.
///
/// Issue listings fill `id`, `name` and `to`; layouts fill the source/target ids
/// and the flags. Everything else defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default)]
    pub action_id: u32,
    #[serde(default)]
    pub initial: bool,
    #[serde(default, rename = "globalTransition")]
    pub global: bool,
    #[serde(default, rename = "loopedTransition")]
    pub looped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Status>,
}

impl Transition {
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn between(
        id: impl Into<String>,
        name: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_id: Some(source_id.into()),
            target_id: Some(target_id.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TransitionList {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// Status and transition layout of a tracker workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowLayout {
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl WorkflowLayout {
    /// Decode a saved layout, either bare or wrapped as `{"layout": ...}`.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.get("layout").is_some() {
            Ok(serde_json::from_value::<WorkflowLayoutResponse>(value)?.layout)
        } else {
            serde_json::from_value(value)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WorkflowLayoutResponse {
    pub layout: WorkflowLayout,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fix_versions: Vec<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
    #[serde(
        default,
        rename = "issuetype",
        skip_serializing_if = "Option::is_none"
    )]
    pub issue_type: Option<IssueType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueType {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub project_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    pub id: String,
    #[serde(default, rename = "timeSpentSeconds")]
    pub time_spent: u64,
    #[serde(default)]
    pub author: Author,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorklogList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub name: String,
}

/// Trim and lowercase a status or transition name for comparison.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
