use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use regex::Regex;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::errors::TrackerError;
use super::models::{
    Fields, Issue, IssueList, IssueType, Project, ProjectRef, SessionUser, Status, Transition,
    TransitionList, Version, WorkflowLayout, WorkflowLayoutResponse, Worklog, WorklogList,
};
use super::worklog::NewWorklog;
use crate::config::JiraCliConfig;
use crate::workflows::dispatcher::BatchCounter;

static ISSUE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z][a-z0-9_]*)-\d+$").expect("issue key pattern is valid")
});

/// Tracker operations the transition engine depends on.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Current status of an issue.
    async fn get_issue_status(&self, issue_key: &str) -> Result<Status, TrackerError>;

    /// Transitions the tracker currently offers for an issue.
    async fn get_available_transitions(
        &self,
        issue_key: &str,
    ) -> Result<Vec<Transition>, TrackerError>;

    /// Execute one transition on an issue.
    async fn execute_transition(
        &self,
        issue_key: &str,
        transition_id: &str,
    ) -> Result<(), TrackerError>;
}

/// Rate-limited Jira REST client using basic authentication.
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl JiraClient {
    pub fn new(
        server_url: &str,
        user: &str,
        password: &str,
        timeout: Duration,
        requests_per_second: u32,
    ) -> Result<Self, TrackerError> {
        let server_url = server_url.trim();
        if server_url.is_empty() {
            return Err(TrackerError::Config(
                "Jira server URL is not set (JIRA_SERVER_URL)".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent("jira-cli")
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Config(e.to_string()))?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(per_second);

        Ok(Self {
            http,
            base_url: server_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn from_config(config: &JiraCliConfig) -> Result<Self, TrackerError> {
        Self::new(
            config.server_url.as_deref().unwrap_or_default(),
            config.user.as_deref().unwrap_or_default(),
            config.password.as_deref().unwrap_or_default(),
            Duration::from_secs(config.timeout_seconds),
            config.requests_per_second,
        )
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.http
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, path: &str, request: RequestBuilder) -> Result<String, TrackerError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(path, status = status.as_u16(), "tracker response");
        trace!(path, %body, "tracker response body");

        match status {
            StatusCode::NOT_FOUND => Err(TrackerError::NotFound(path.to_string())),
            s if s.is_client_error() || s.is_server_error() => Err(TrackerError::Server {
                status: s.as_u16(),
                body,
            }),
            StatusCode::NO_CONTENT => Ok(String::new()),
            _ => Ok(body),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TrackerError> {
        let body = self.send(path, self.request(Method::GET, path)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TrackerError> {
        let body = self
            .send(path, self.request(Method::GET, path).query(query))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_json<P: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: &P,
    ) -> Result<T, TrackerError> {
        let body = self
            .send(path, self.request(method, path).json(payload))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_no_content<P: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<(), TrackerError> {
        let mut request = self.request(method, path);
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        self.send(path, request).await.map(|_| ())
    }

    /// Check credentials against the session endpoint.
    pub async fn current_session(&self) -> Result<SessionUser, TrackerError> {
        self.get_json("rest/auth/1/session").await
    }

    pub async fn get_issue(&self, issue_key: &str) -> Result<Issue, TrackerError> {
        self.get_json(&format!("rest/api/2/issue/{issue_key}")).await
    }

    pub async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: &str,
        issue_type: &str,
    ) -> Result<Issue, TrackerError> {
        let payload = Issue {
            fields: Fields {
                summary: Some(summary.to_string()),
                description: Some(description.to_string()).filter(|d| !d.is_empty()),
                project: Some(ProjectRef {
                    key: project_key.to_string(),
                }),
                issue_type: Some(IssueType {
                    name: issue_type.to_string(),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let created: Issue = self
            .send_json(Method::POST, "rest/api/2/issue", &payload)
            .await?;
        info!(issue = %created.key, project = project_key, "created issue");
        Ok(created)
    }

    pub async fn list_worklogs(&self, issue_key: &str) -> Result<WorklogList, TrackerError> {
        self.get_json(&format!("rest/api/2/issue/{issue_key}/worklog"))
            .await
    }

    pub async fn add_worklog(
        &self,
        issue_key: &str,
        worklog: &NewWorklog,
    ) -> Result<Worklog, TrackerError> {
        info!(
            issue = issue_key,
            seconds = worklog.time_spent_seconds,
            started = %worklog.started,
            "adding worklog"
        );
        self.send_json(
            Method::POST,
            &format!("rest/api/2/issue/{issue_key}/worklog"),
            worklog,
        )
        .await
    }

    pub async fn delete_worklog(&self, issue_key: &str, worklog_id: &str) -> Result<(), TrackerError> {
        self.send_no_content::<()>(
            Method::DELETE,
            &format!("rest/api/2/issue/{issue_key}/worklog/{worklog_id}"),
            None,
        )
        .await
    }

    /// Delete every worklog of `user` on an issue, counting per-entry outcomes.
    pub async fn delete_worklogs_for_user(
        &self,
        user: &str,
        issue_key: &str,
    ) -> Result<BatchCounter, TrackerError> {
        let worklogs = self.list_worklogs(issue_key).await?;
        let mut counter = BatchCounter::default();

        for worklog in worklogs.worklogs.iter().filter(|w| w.author.name == user) {
            match self.delete_worklog(issue_key, &worklog.id).await {
                Ok(()) => {
                    info!(issue = issue_key, worklog = %worklog.id, "worklog deleted");
                    counter.record_success();
                }
                Err(e) => {
                    warn!(issue = issue_key, worklog = %worklog.id, error = %e, "failed to delete worklog");
                    counter.record_failure();
                }
            }
        }

        Ok(counter)
    }

    pub async fn get_projects(&self) -> Result<Vec<Project>, TrackerError> {
        self.get_json("rest/api/2/project").await
    }

    pub async fn get_project(&self, project_key: &str) -> Result<Project, TrackerError> {
        self.get_json(&format!("rest/api/2/project/{project_key}"))
            .await
    }

    pub async fn get_versions(&self, project_key: &str) -> Result<Vec<Version>, TrackerError> {
        self.get_json(&format!("rest/api/2/project/{project_key}/versions"))
            .await
    }

    pub async fn find_version(
        &self,
        project_key: &str,
        name: &str,
    ) -> Result<Option<Version>, TrackerError> {
        Ok(self
            .get_versions(project_key)
            .await?
            .into_iter()
            .find(|v| v.name == name))
    }

    /// Create a version unless it exists. The flag is true when it was created.
    pub async fn create_version(
        &self,
        project_key: &str,
        name: &str,
    ) -> Result<(Version, bool), TrackerError> {
        if let Some(existing) = self.find_version(project_key, name).await? {
            return Ok((existing, false));
        }
        let payload = json!({ "name": name, "project": project_key });
        let version: Version = self
            .send_json(Method::POST, "rest/api/2/version", &payload)
            .await?;
        info!(project = project_key, version = name, "created version");
        Ok((version, true))
    }

    pub async fn release_version(&self, project_key: &str, name: &str) -> Result<Version, TrackerError> {
        let version = self
            .find_version(project_key, name)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("version {name} in {project_key}")))?;
        self.send_json(
            Method::PUT,
            &format!("rest/api/2/version/{}", version.id),
            &json!({ "released": true }),
        )
        .await
    }

    /// Set the fix version of an issue. An already set fix version is left alone.
    pub async fn set_fix_version(&self, issue_key: &str, version: &str) -> Result<(), TrackerError> {
        let issue = self.get_issue(issue_key).await?;
        if !issue.fields.fix_versions.is_empty() {
            let versions: Vec<String> = issue
                .fields
                .fix_versions
                .iter()
                .map(|v| v.name.clone())
                .collect();
            warn!(issue = issue_key, ?versions, "fix version is already set");
            return Err(TrackerError::FixVersionAlreadySet {
                issue_key: issue_key.to_string(),
                versions,
            });
        }
        let payload = json!({ "update": { "fixVersions": [ { "set": [ { "name": version } ] } ] } });
        self.send_no_content(Method::PUT, &format!("rest/api/2/issue/{issue_key}"), Some(&payload))
            .await
    }

    pub async fn search_issues_in_version(
        &self,
        project_key: &str,
        version: &str,
        issue_types: &str,
    ) -> Result<IssueList, TrackerError> {
        let types = issue_types
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let mut jql = format!("project = \"{project_key}\" AND fixVersion = \"{version}\"");
        if !types.is_empty() {
            jql.push_str(&format!(" AND issuetype in ({types})"));
        }
        self.get_json_with_query(
            "rest/api/2/search",
            &[("jql", jql.as_str()), ("fields", "summary,status"), ("maxResults", "1000")],
        )
        .await
    }

    /// Status/transition layout of a named workflow, used to build a graph.
    pub async fn get_workflow_layout(
        &self,
        workflow_name: &str,
        project_key: Option<&str>,
    ) -> Result<WorkflowLayout, TrackerError> {
        let mut query = vec![("workflowName", workflow_name)];
        if let Some(project) = project_key {
            query.push(("projectKey", project));
        }
        let response: WorkflowLayoutResponse = self
            .get_json_with_query("rest/projectconfig/1/workflow", &query)
            .await?;
        Ok(response.layout)
    }
}

#[async_trait]
impl TrackerClient for JiraClient {
    async fn get_issue_status(&self, issue_key: &str) -> Result<Status, TrackerError> {
        let issue: Issue = self
            .get_json_with_query(&format!("rest/api/2/issue/{issue_key}"), &[("fields", "status")])
            .await?;
        issue
            .fields
            .status
            .ok_or_else(|| TrackerError::InvalidResponse(format!("issue {issue_key} has no status")))
    }

    async fn get_available_transitions(
        &self,
        issue_key: &str,
    ) -> Result<Vec<Transition>, TrackerError> {
        let list: TransitionList = self
            .get_json(&format!("rest/api/2/issue/{issue_key}/transitions"))
            .await?;
        Ok(list.transitions)
    }

    async fn execute_transition(
        &self,
        issue_key: &str,
        transition_id: &str,
    ) -> Result<(), TrackerError> {
        let payload = json!({ "transition": { "id": transition_id } });
        self.send_no_content(
            Method::POST,
            &format!("rest/api/2/issue/{issue_key}/transitions"),
            Some(&payload),
        )
        .await
    }
}

/// Project part of an issue key, `ABC` for `ABC-123`.
pub fn project_key(issue_key: &str) -> Result<&str, TrackerError> {
    ISSUE_KEY
        .captures(issue_key.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| TrackerError::Validation(format!("invalid issue key: {issue_key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_hides_password() {
        let client = JiraClient::new(
            "https://jira.example.com",
            "bot",
            "hunter2",
            Duration::from_secs(5),
            10,
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("bot"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_project_key_extraction() {
        assert_eq!(project_key("ABC-123").unwrap(), "ABC");
        assert_eq!(project_key("data_2-7").unwrap(), "data_2");
        assert!(project_key("ABC").is_err());
        assert!(project_key("-12").is_err());
    }

    #[test]
    fn test_empty_server_url_is_config_error() {
        let err = JiraClient::new(" ", "u", "p", Duration::from_secs(1), 1).unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            JiraClient::new("https://jira.example.com/", "u", "p", Duration::from_secs(1), 5)
                .unwrap();
        assert_eq!(client.base_url, "https://jira.example.com");
        assert_eq!(client.user(), "u");
    }
}
