//! services/client/src/adapters/http.rs
//!
//! This module contains the adapter for the project-management REST API.
//! It implements every remote port from the `core` crate on top of a single
//! `reqwest::Client`, attaching the bearer token of the stored session to
//! each request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use taskboard_core::domain::{
    Comment, CommentId, InviteMember, Project, ProjectDraft, ProjectId, Session, Task, TaskDraft,
    TaskId, Workspace, WorkspaceDraft, WorkspaceId,
};
use taskboard_core::ports::{
    AuthService, CommentService, LocalStorage, PortError, PortResult, ProjectService,
    TaskService, WorkspaceService, SESSION_KEY,
};
use tracing::debug;
use url::Url;

pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const BAD_REQUEST_MESSAGE: &str = "Invalid request. Please check your input.";
pub const CONFLICT_MESSAGE: &str = "This email is already registered.";
pub const FALLBACK_MESSAGE: &str = "Request failed";

//=========================================================================================
// Error Message Extraction
//=========================================================================================

fn entry_message(entry: &Value) -> String {
    match entry {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

/// Pulls a message out of a JSON error body: `errors[]` joined by ", ",
/// then `message`, then `error`.
fn body_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    if let Some(errors) = value.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let joined = errors.iter().map(entry_message).collect::<Vec<_>>().join(", ");
            return Some(joined);
        }
    }
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Turns a non-2xx response (other than 401) into the single message shown to the user.
pub fn error_message(status: u16, reason: Option<&str>, body: &str) -> String {
    if status == 500 {
        return SERVER_ERROR_MESSAGE.to_string();
    }
    if let Some(message) = body_message(body).filter(|m| !m.trim().is_empty()) {
        return message;
    }
    match status {
        400 => BAD_REQUEST_MESSAGE.to_string(),
        409 => CONFLICT_MESSAGE.to_string(),
        _ => reason
            .filter(|r| !r.is_empty())
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string(),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the remote ports over HTTP.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn LocalStorage>,
}

impl HttpApi {
    /// Creates a new `HttpApi`. `base_url` is the normalized `.../api` root.
    pub fn new(base_url: Url, storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            storage,
        }
    }

    /// The token of the stored session, if a readable one exists.
    fn token(&self) -> Option<String> {
        let record = self.storage.get(SESSION_KEY)?;
        serde_json::from_str::<Session>(&record)
            .ok()
            .map(|session| session.token)
    }

    fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PortError::Transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> PortResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "Sending request");
        let builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        Ok(match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Sends the request and returns the body of a 2xx response, or `None`
    /// for `204` and empty bodies.
    async fn execute(&self, request: RequestBuilder) -> PortResult<Option<String>> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            let message = body_message(&body).unwrap_or_else(|| "Unauthorized".to_string());
            return Err(PortError::Unauthorized(message));
        }
        if !status.is_success() {
            return Err(PortError::Request {
                status: status.as_u16(),
                message: error_message(status.as_u16(), status.canonical_reason(), &body),
            });
        }
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let body = self
            .execute(request)
            .await?
            .ok_or_else(|| PortError::Decode("empty response body".to_string()))?;
        serde_json::from_str(&body).map_err(|e| PortError::Decode(e.to_string()))
    }

    async fn fire(&self, request: RequestBuilder) -> PortResult<()> {
        self.execute(request).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> PortResult<T> {
        self.fetch(self.request(Method::GET, segments)?).await
    }

    async fn send_json<B, T>(&self, method: Method, segments: &[&str], body: &B) -> PortResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.fetch(self.request(method, segments)?.json(body)).await
    }

    async fn delete(&self, segments: &[&str]) -> PortResult<()> {
        self.fire(self.request(Method::DELETE, segments)?).await
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpApi {
    async fn login(&self, email: &str, password: &str) -> PortResult<Session> {
        let body = json!({ "email": email, "password": password });
        self.send_json(Method::POST, &["auth", "login"], &body).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<Session> {
        let body = json!({ "name": name, "email": email, "password": password });
        self.send_json(Method::POST, &["auth", "register"], &body)
            .await
    }
}

//=========================================================================================
// `WorkspaceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl WorkspaceService for HttpApi {
    async fn list_workspaces(&self) -> PortResult<Vec<Workspace>> {
        self.get(&["workspaces"]).await
    }

    async fn get_workspace(&self, id: &WorkspaceId) -> PortResult<Workspace> {
        self.get(&["workspaces", id.as_str()]).await
    }

    async fn create_workspace(&self, draft: &WorkspaceDraft) -> PortResult<Workspace> {
        self.send_json(Method::POST, &["workspaces"], draft).await
    }

    async fn update_workspace(
        &self,
        id: &WorkspaceId,
        draft: &WorkspaceDraft,
    ) -> PortResult<Workspace> {
        self.send_json(Method::PUT, &["workspaces", id.as_str()], draft)
            .await
    }

    async fn delete_workspace(&self, id: &WorkspaceId) -> PortResult<()> {
        self.delete(&["workspaces", id.as_str()]).await
    }

    async fn add_workspace_member(
        &self,
        id: &WorkspaceId,
        invite: &InviteMember,
    ) -> PortResult<()> {
        let request = self
            .request(Method::POST, &["workspaces", id.as_str(), "members"])?
            .json(invite);
        self.fire(request).await
    }
}

//=========================================================================================
// `ProjectService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProjectService for HttpApi {
    async fn list_projects(&self) -> PortResult<Vec<Project>> {
        self.get(&["projects"]).await
    }

    async fn list_workspace_projects(&self, workspace_id: &WorkspaceId) -> PortResult<Vec<Project>> {
        self.get(&["projects", "workspace", workspace_id.as_str()])
            .await
    }

    async fn get_project(&self, id: &ProjectId) -> PortResult<Project> {
        self.get(&["projects", id.as_str()]).await
    }

    async fn create_project(&self, draft: &ProjectDraft) -> PortResult<Project> {
        self.send_json(Method::POST, &["projects"], draft).await
    }

    async fn update_project(&self, id: &ProjectId, draft: &ProjectDraft) -> PortResult<Project> {
        self.send_json(Method::PUT, &["projects", id.as_str()], draft)
            .await
    }

    async fn delete_project(&self, id: &ProjectId) -> PortResult<()> {
        self.delete(&["projects", id.as_str()]).await
    }

    async fn add_project_member(&self, id: &ProjectId, email: &str) -> PortResult<()> {
        let request = self
            .request(Method::POST, &["projects", id.as_str(), "members"])?
            .json(&json!({ "email": email }));
        self.fire(request).await
    }
}

//=========================================================================================
// `TaskService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TaskService for HttpApi {
    async fn list_tasks(&self) -> PortResult<Vec<Task>> {
        self.get(&["tasks"]).await
    }

    async fn list_project_tasks(&self, project_id: &ProjectId) -> PortResult<Vec<Task>> {
        self.get(&["tasks", "project", project_id.as_str()]).await
    }

    async fn get_task(&self, id: &TaskId) -> PortResult<Task> {
        self.get(&["tasks", id.as_str()]).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> PortResult<Task> {
        self.send_json(Method::POST, &["tasks"], draft).await
    }

    async fn update_task(&self, id: &TaskId, draft: &TaskDraft) -> PortResult<Task> {
        self.send_json(Method::PUT, &["tasks", id.as_str()], draft)
            .await
    }

    async fn delete_task(&self, id: &TaskId) -> PortResult<()> {
        self.delete(&["tasks", id.as_str()]).await
    }
}

//=========================================================================================
// `CommentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CommentService for HttpApi {
    async fn list_comments(&self, task_id: &TaskId) -> PortResult<Vec<Comment>> {
        self.get(&["comments", "task", task_id.as_str()]).await
    }

    async fn create_comment(&self, task_id: &TaskId, content: &str) -> PortResult<Comment> {
        let body = json!({ "content": content });
        self.send_json(Method::POST, &["comments", "task", task_id.as_str()], &body)
            .await
    }

    async fn delete_comment(&self, id: &CommentId) -> PortResult<()> {
        self.delete(&["comments", id.as_str()]).await
    }
}
